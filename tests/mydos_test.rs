// test of MyDOS extensions: subdirectories, big disks, 16-bit links
use std::path::Path;
use a8kit::img::{SectorStore,atr::Atr};
use a8kit::fs::dos2::{Disk,DosVariant,BootType,PicoNameMode,ROOT};
use a8kit::fs::dos2::types::Error;
use a8kit::fs::dos2::estimate::{estimate_disk_size,estimate_content_sectors};
use a8kit::vdrive::{self,Density,MountOptions};

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn blank(sectors: u32,sector_len: usize) -> Disk {
    let img = Atr::create(sectors,sector_len).expect("could not create image");
    let mut disk = Disk::new(Box::new(img),DosVariant::MyDos).expect("bad geometry");
    disk.format().expect("format failed");
    disk
}

fn populate(root: &Path) -> STDRESULT {
    std::fs::write(root.join("README.TXT"),b"READ ME")?;
    std::fs::create_dir(root.join("GAMES"))?;
    std::fs::write(root.join("GAMES").join("FROGS.COM"),vec![0xa5;1000])?;
    std::fs::create_dir(root.join("GAMES").join("ACTION"))?;
    std::fs::write(root.join("GAMES").join("ACTION").join("ZAP.COM"),vec![0x5a;300])?;
    Ok(())
}

fn mydos_opts() -> MountOptions {
    MountOptions {
        dos: DosVariant::MyDos,
        density: Density::Single,
        piconame: PicoNameMode::Never,
        ..MountOptions::default()
    }
}

#[test]
fn subdirectories_from_host() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    populate(dir.path())?;
    let mut disk = vdrive::build_disk(dir.path(),&mydos_opts())?;
    let listing = disk.catalog(ROOT)?;
    let games = listing.find(b"GAMES      ").expect("no GAMES entry");
    assert!(games.entry.is_dir());
    assert_eq!(games.entry.sector_count,8);
    assert_eq!(games.entry.start_sector % 8,0);
    let (h,name) = disk.resolve("GAMES/FROGS.COM")?;
    assert_ne!(h,ROOT);
    assert_eq!(disk.read_file(h,&name)?,vec![0xa5;1000]);
    let (h,name) = disk.resolve("GAMES/ACTION/ZAP.COM")?;
    assert_eq!(disk.read_file(h,&name)?,vec![0x5a;300]);
    assert_eq!(disk.host_path(h),Some(dir.path().join("GAMES").join("ACTION")));
    let vtoc = disk.vtoc()?;
    assert_eq!(vtoc.bitmap_popcounts().0,vtoc.primary_free() as u32);
    Ok(())
}

#[test]
fn subdirectories_survive_reopen() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    populate(dir.path())?;
    let mut disk = vdrive::build_disk(dir.path(),&mydos_opts())?;
    let bytes = disk.get_img().to_bytes();
    let mut copy = Disk::from_img(a8kit::create_img_from_bytestream(&bytes,None)?)?;
    assert_eq!(copy.dos_format().dos,DosVariant::MyDos);
    let games = copy.subdir(ROOT,"GAMES")?;
    let listing = copy.catalog(games)?;
    assert!(listing.find(b"FROGS   COM").is_some());
    assert!(listing.find(b"ACTION     ").map(|e| e.entry.is_dir()).unwrap_or(false));
    // lazily created managers are reused
    assert_eq!(copy.subdir(ROOT,"GAMES")?,games);
    match copy.subdir(ROOT,"README.TXT") {
        Err(e) => assert!(matches!(e.downcast_ref::<Error>(),Some(Error::FileNotFound))),
        Ok(_) => panic!("file opened as directory")
    }
    Ok(())
}

#[test]
fn dos2_skips_subdirectories() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    populate(dir.path())?;
    let opts = MountOptions { dos: DosVariant::Dos2x, ..mydos_opts() };
    let mut disk = vdrive::build_disk(dir.path(),&opts)?;
    let listing = disk.catalog(ROOT)?;
    assert_eq!(listing.entries.len(),1);
    assert!(listing.find(b"README  TXT").is_some());
    match disk.add_directory(ROOT,&dir.path().join("GAMES"),PicoNameMode::Never) {
        Err(e) => assert!(matches!(e.downcast_ref::<Error>(),Some(Error::RequiresMyDos))),
        Ok(_) => panic!("DOS 2 made a subdirectory")
    }
    Ok(())
}

#[test]
fn sixteen_bit_links() -> STDRESULT {
    let mut disk = blank(4000,256);
    assert!(disk.dos_format().use_16bit_sector_links);
    // push the file above sector 1023
    disk.add_buffer(ROOT,"FILLER.DAT",&vec![0;1100*253])?;
    let dat: Vec<u8> = (0..10000).map(|x| (x % 199) as u8).collect();
    let (slot,_) = disk.add_buffer(ROOT,"HIGH.DAT",&dat)?;
    assert_eq!(slot,1);
    let listing = disk.catalog(ROOT)?;
    let entry = listing.find(b"HIGH    DAT").expect("entry missing").entry;
    assert_eq!(entry.status,0x46);
    assert!(entry.start_sector > 1023);
    let first = disk.get_img().read_sector(entry.start_sector as u32)?;
    let next = ((first[253] as u16) << 8) | first[254] as u16;
    assert_eq!(next,entry.start_sector + 1);
    assert_eq!(first[255],253);
    assert_eq!(disk.read_file(ROOT,"HIGH.DAT")?,dat);
    Ok(())
}

#[test]
fn multi_vtoc_layout() -> STDRESULT {
    let mut disk = blank(65535,256);
    let fmt = *disk.dos_format();
    assert!(fmt.vtoc_count > 1);
    let vtoc = disk.vtoc()?;
    assert_eq!(vtoc.free_count() as u32,fmt.data_sector_total());
    assert_eq!(vtoc.bitmap_popcounts().0,vtoc.primary_free() as u32);
    assert!(!vtoc.is_free(360 - fmt.vtoc_count + 1));
    assert!(vtoc.is_free(360 - fmt.vtoc_count));
    assert!(vtoc.is_free(65535));
    let sec = disk.get_img().read_sector(360)?;
    assert_eq!(sec[0] as u32,fmt.vtoc_count + 1);
    Ok(())
}

#[test]
fn estimates() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    for name in ["a.bin","b.bin","c.bin"] {
        std::fs::write(dir.path().join(name),vec![0;300])?;
    }
    assert_eq!(estimate_content_sectors(dir.path(),256,PicoNameMode::Never,DosVariant::MyDos)?,6);
    assert_eq!(estimate_disk_size(dir.path(),256,PicoNameMode::Never,BootType::NoDos,DosVariant::MyDos)?,720);
    std::fs::write(dir.path().join("big.bin"),vec![0;200000])?;
    // 791 + 6 for the files, 3 boot, 8 directory, 1 VTOC
    assert_eq!(estimate_disk_size(dir.path(),256,PicoNameMode::Never,BootType::NoDos,DosVariant::MyDos)?,809);
    std::fs::create_dir(dir.path().join("sub"))?;
    std::fs::write(dir.path().join("sub").join("x.bin"),vec![0;10])?;
    assert_eq!(estimate_content_sectors(dir.path(),256,PicoNameMode::Never,DosVariant::MyDos)?,797 + 9);
    assert_eq!(estimate_content_sectors(dir.path(),256,PicoNameMode::Never,DosVariant::Dos2x)?,797);
    Ok(())
}

#[test]
fn auto_sizing_fits_content() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    populate(dir.path())?;
    std::fs::write(dir.path().join("big.bin"),vec![0x11;400000])?;
    let opts = MountOptions { density: Density::Auto, ..mydos_opts() };
    let (sectors,len) = vdrive::choose_geometry(dir.path(),&opts)?;
    assert_eq!(len,256);
    assert!(sectors > 1023);
    let mut disk = vdrive::build_disk(dir.path(),&opts)?;
    assert_eq!(disk.read_file(ROOT,"BIG.BIN")?,vec![0x11;400000]);
    Ok(())
}

#[test]
fn piconame_for_lossy_names() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("My Long Name.txt"),b"HI")?;
    std::fs::write(dir.path().join("SHORT.TXT"),b"HI")?;
    let opts = MountOptions { piconame: PicoNameMode::Auto, ..mydos_opts() };
    let mut disk = vdrive::build_disk(dir.path(),&opts)?;
    let pico = disk.read_file(ROOT,"PICONAME.TXT")?;
    let text = String::from_utf8_lossy(&pico).to_string();
    assert!(text.contains("MYLONGNATXT My Long Name.txt"));
    assert!(text.contains("SHORT   TXT SHORT.TXT"));
    assert_eq!(pico.iter().filter(|b| **b==0x9b).count(),3);
    // nothing lossy, nothing written
    let plain = tempfile::tempdir()?;
    std::fs::write(plain.path().join("SHORT.TXT"),b"HI")?;
    let mut disk = vdrive::build_disk(plain.path(),&opts)?;
    assert!(disk.read_file(ROOT,"PICONAME.TXT").is_err());
    Ok(())
}

#[test]
fn host_piconame_kept_unless_regenerated() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("PICONAME.TXT"),b"MY OWN INDEX")?;
    std::fs::write(dir.path().join("SHORT.TXT"),b"HI")?;
    assert_eq!(estimate_content_sectors(dir.path(),256,PicoNameMode::Never,DosVariant::MyDos)?,2);
    for mode in [PicoNameMode::Never,PicoNameMode::Auto] {
        let opts = MountOptions { piconame: mode, ..mydos_opts() };
        let mut disk = vdrive::build_disk(dir.path(),&opts)?;
        assert_eq!(disk.read_file(ROOT,"PICONAME.TXT")?,b"MY OWN INDEX");
        assert_eq!(disk.catalog(ROOT)?.entries.len(),2);
    }
    let opts = MountOptions { piconame: PicoNameMode::Always, ..mydos_opts() };
    let mut disk = vdrive::build_disk(dir.path(),&opts)?;
    let text = String::from_utf8_lossy(&disk.read_file(ROOT,"PICONAME.TXT")?).to_string();
    assert!(text.contains("SHORT   TXT SHORT.TXT"));
    assert!(!text.contains("MY OWN INDEX"));
    assert_eq!(disk.catalog(ROOT)?.entries.len(),2);
    Ok(())
}
