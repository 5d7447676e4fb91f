// test of the DOS 2.x file system module
use a8kit::img::{SectorStore,atr::Atr};
use std::str::FromStr;
use a8kit::fs::dos2::{self,Disk,DosVariant,BootType,PicoNameMode,ROOT};
use a8kit::fs::dos2::types::Error;

type DYNERR = Box<dyn std::error::Error>;

fn blank(dos: DosVariant,sectors: u32,sector_len: usize) -> Disk {
    let img = Atr::create(sectors,sector_len).expect("could not create image");
    let mut disk = Disk::new(Box::new(img),dos).expect("bad geometry");
    disk.format().expect("format failed");
    disk
}

fn dos_err(e: &DYNERR) -> Option<&Error> {
    e.downcast_ref::<Error>()
}

fn check_popcount(disk: &mut Disk) {
    let vtoc = disk.vtoc().expect("could not load VTOC");
    let (primary,secondary) = vtoc.bitmap_popcounts();
    assert_eq!(primary,vtoc.primary_free() as u32);
    assert_eq!(secondary,vtoc.secondary_free().map(|x| x as u32));
}

#[test]
fn format_is_repeatable() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    let first = disk.get_img().to_bytes();
    disk.format().expect("format failed");
    assert_eq!(disk.get_img().to_bytes(),first);
    assert_eq!(disk.free_sectors().unwrap(),707);
    let vtoc = disk.vtoc().unwrap();
    assert_eq!(vtoc.total_sectors(),707);
    check_popcount(&mut disk);
}

#[test]
fn standard_free_counts() {
    assert_eq!(blank(DosVariant::Dos2x,720,256).free_sectors().unwrap(),707);
    assert_eq!(blank(DosVariant::MyDos,720,128).free_sectors().unwrap(),708);
    let mut ed = blank(DosVariant::Dos2x,1040,128);
    let vtoc = ed.vtoc().unwrap();
    assert_eq!(vtoc.primary_free(),707);
    assert_eq!(vtoc.secondary_free(),Some(303));
    assert_eq!(vtoc.free_count(),1010);
    check_popcount(&mut ed);
}

#[test]
fn round_trip_sizes() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    let lengths = [0,1,125,126,65536];
    let expected_sectors = [1,1,1,2,525];
    for (i,len) in lengths.iter().enumerate() {
        let dat: Vec<u8> = (0..*len).map(|x| (x % 251) as u8).collect();
        let name = format!("FILE{}.DAT",i);
        disk.add_buffer(ROOT,&name,&dat).expect("add failed");
        assert_eq!(disk.read_file(ROOT,&name).expect("read failed"),dat);
        check_popcount(&mut disk);
    }
    let listing = disk.catalog(ROOT).unwrap();
    assert_eq!(listing.entries.len(),5);
    for (i,e) in listing.entries.iter().enumerate() {
        assert_eq!(e.slot,i);
        assert_eq!(e.entry.sector_count,expected_sectors[i]);
        assert_eq!(e.entry.status,0x42);
    }
    assert_eq!(disk.free_sectors().unwrap(),707 - 530);
}

#[test]
fn colliding_names_fill_directory() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    for i in 0..64 {
        disk.add_buffer(ROOT,&format!("longfilename{}.txt",i),&[i as u8]).expect("add failed");
    }
    let listing = disk.catalog(ROOT).unwrap();
    assert_eq!(listing.entries.len(),64);
    let mut names: Vec<[u8;11]> = listing.entries.iter().map(|e| e.entry.name).collect();
    assert!(names.contains(b"LONGFILETXT"));
    assert!(names.contains(b"LONGFI63TXT"));
    names.sort();
    names.dedup();
    assert_eq!(names.len(),64);
    let free = disk.free_sectors().unwrap();
    match disk.add_buffer(ROOT,"one.more",&[0]) {
        Err(e) => assert!(matches!(dos_err(&e),Some(Error::DirectoryFull))),
        Ok(_) => panic!("65th entry was accepted")
    }
    assert_eq!(disk.free_sectors().unwrap(),free);
    check_popcount(&mut disk);
}

#[test]
fn capacity_boundary() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    let snapshot = disk.get_img().to_bytes();
    match disk.add_buffer(ROOT,"TOOBIG.DAT",&vec![0xaa;707*125+1]) {
        Err(e) => assert!(matches!(dos_err(&e),Some(Error::DiskFull))),
        Ok(_) => panic!("oversized file was accepted")
    }
    assert_eq!(disk.get_img().to_bytes(),snapshot);
    disk.add_buffer(ROOT,"JUSTFITS.DAT",&vec![0x55;707*125]).expect("full disk file rejected");
    assert_eq!(disk.free_sectors().unwrap(),0);
    match disk.add_buffer(ROOT,"EMPTY",&[]) {
        Err(e) => assert!(matches!(dos_err(&e),Some(Error::DiskFull))),
        Ok(_) => panic!("empty file got a sector on a full disk")
    }
    assert_eq!(disk.catalog(ROOT).unwrap().entries.len(),1);
    check_popcount(&mut disk);
}

#[test]
fn enhanced_density_split() {
    let mut disk = blank(DosVariant::Dos2x,1040,128);
    let dat: Vec<u8> = (0..800*125).map(|x| (x % 253) as u8).collect();
    disk.add_buffer(ROOT,"BIG.DAT",&dat).expect("add failed");
    let vtoc = disk.vtoc().unwrap();
    assert_eq!(vtoc.primary_free(),0);
    assert_eq!(vtoc.secondary_free(),Some(210));
    assert!(!vtoc.is_free(721));
    assert!(vtoc.is_free(1023));
    check_popcount(&mut disk);
    let listing = disk.catalog(ROOT).unwrap();
    assert_eq!(listing.entries[0].entry.status,0x03);
    assert_eq!(listing.free_sectors,210);
    assert_eq!(disk.read_file(ROOT,"BIG.DAT").expect("read failed"),dat);
}

#[test]
fn broken_chains() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    // sector 10 links to itself as file 0
    let mut buf = vec![0;128];
    buf[125] = 0;
    buf[126] = 10;
    buf[127] = 125;
    disk.get_img().write_sector(10,&buf).unwrap();
    let e = disk.read_chain(10,false,Some(0)).expect_err("loop not detected");
    assert!(matches!(dos_err(&e),Some(Error::ChainLoop)));
    let e = disk.read_chain(10,false,Some(1)).expect_err("file number not checked");
    assert!(matches!(dos_err(&e),Some(Error::FileNumberMismatch)));
    // link beyond the disk
    buf[125] = 0x03;
    buf[126] = 0x20;
    disk.get_img().write_sector(10,&buf).unwrap();
    let e = disk.read_chain(10,false,Some(0)).expect_err("range not checked");
    assert!(matches!(dos_err(&e),Some(Error::LinkRange)));
    // byte count too large
    buf[125] = 0;
    buf[126] = 0;
    buf[127] = 126;
    disk.get_img().write_sector(10,&buf).unwrap();
    let e = disk.read_chain(10,false,Some(0)).expect_err("byte count not checked");
    assert!(matches!(dos_err(&e),Some(Error::ByteCount)));
}

#[test]
fn boot_sectors_find_dos() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    disk.write_boot_sectors(BootType::Dos20,false).expect("boot failed");
    let sec1 = disk.get_img().read_sector(1).unwrap();
    assert_eq!(sec1[0x0e],0);
    disk.add_buffer(ROOT,"README.TXT",&[0x9b;10]).unwrap();
    disk.add_buffer(ROOT,"DOS.SYS",&vec![0x60;5000]).unwrap();
    disk.write_boot_sectors(BootType::Dos20,false).expect("boot failed");
    let sec1 = disk.get_img().read_sector(1).unwrap();
    assert_eq!(sec1[1],3);
    assert_eq!(sec1[0x0e],1);
    assert_eq!(sec1[0x0f..0x11],[5,0]);
    assert_eq!(sec1[0x11],125);
    // the DOS 2.0S loader follows
    assert_eq!(sec1[0x14..0x19],[0xac,0x0e,0x07,0xf0,0x36]);
}

#[test]
fn boot_library() -> Result<(),DYNERR> {
    let mut disk = blank(DosVariant::Dos2x,1040,128);
    disk.add_buffer(ROOT,"DOS.SYS",&vec![0x60;5000])?;
    // without a library DOS 2.5 falls back to the default boot sectors
    disk.write_boot_sectors(BootType::Dos25,false)?;
    let sec1 = disk.get_img().read_sector(1)?;
    assert_eq!(sec1[0x0e],0);
    assert_eq!(sec1[0x14..0x19],[0xac,0x0e,0x07,0xf0,0x36]);
    let lib = tempfile::tempdir()?;
    let mut image = vec![0;384];
    image[0..4].copy_from_slice(&[0x00,0x03,0x00,0x07]);
    image[0x14..0x17].copy_from_slice(&[0x4c,0x00,0x08]);
    std::fs::write(lib.path().join("dos25.boot"),&image)?;
    disk.set_boot_library(Some(lib.path()));
    disk.write_boot_sectors(BootType::Dos25,false)?;
    let sec1 = disk.get_img().read_sector(1)?;
    assert_eq!(sec1[0x0e],1);
    assert_eq!(sec1[0x0f..0x11],[4,0]);
    assert_eq!(sec1[0x11],125);
    assert_eq!(sec1[0x14..0x17],[0x4c,0x00,0x08]);
    Ok(())
}

#[test]
fn option_names() {
    assert_eq!(DosVariant::from_str("mydos").unwrap(),DosVariant::MyDos);
    assert!(matches!(DosVariant::from_str("cpm"),Err(Error::InvalidOption)));
    assert_eq!(PicoNameMode::from_str("never").unwrap(),PicoNameMode::Never);
    assert!(matches!(PicoNameMode::from_str("sometimes"),Err(Error::InvalidOption)));
    assert!(matches!(BootType::from_str("dos99"),Err(Error::InvalidOption)));
}

#[test]
fn detect_file_systems() -> Result<(),DYNERR> {
    let cases = [
        (DosVariant::Dos2x,720,128),
        (DosVariant::Dos2x,1040,128),
        (DosVariant::Dos2x,720,256),
        (DosVariant::MyDos,720,128),
        (DosVariant::MyDos,1040,128),
        (DosVariant::MyDos,4000,256)
    ];
    for (dos,sectors,len) in cases {
        let mut disk = blank(dos,sectors,len);
        disk.add_buffer(ROOT,"HELLO.TXT",b"HELLO")?;
        let bytes = disk.get_img().to_bytes();
        let img = a8kit::create_img_from_bytestream(&bytes,Some("atr"))?;
        let mut copy = Disk::from_img(img)?;
        assert_eq!(copy.dos_format().dos,dos);
        assert_eq!(copy.dos_format().sector_count,sectors);
        assert_eq!(copy.read_file(ROOT,"HELLO.TXT")?,b"HELLO");
    }
    let raw = Atr::create(720,128)?;
    match Disk::from_img(Box::new(raw)) {
        Err(e) => assert!(matches!(dos_err(&e),Some(Error::NotDos))),
        Ok(_) => panic!("blank image accepted as DOS 2")
    }
    Ok(())
}

#[test]
fn resolve_and_listing() {
    let mut disk = blank(DosVariant::Dos2x,720,128);
    disk.add_buffer(ROOT,"DOS.SYS",&vec![0;4000]).unwrap();
    disk.add_buffer(ROOT,"AUTORUN.SYS",&[0;10]).unwrap();
    let (h,name) = disk.resolve("AUTORUN.SYS").unwrap();
    assert_eq!(h,ROOT);
    assert_eq!(name,"AUTORUN.SYS");
    let listing = disk.catalog(ROOT).unwrap();
    let text = listing.to_string();
    assert!(text.contains("  DOS      SYS 032"));
    assert!(text.contains("  AUTORUN  SYS 001"));
    assert!(text.ends_with("674 FREE SECTORS"));
    let e = disk.read_file(ROOT,"MISSING.TXT").expect_err("missing file was read");
    assert!(matches!(dos_err(&e),Some(Error::FileNotFound)));
    assert_eq!(disk.dir_sector(ROOT).unwrap(),dos2::types::DIR_SECTOR);
}
