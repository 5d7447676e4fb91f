//! ### Boot sectors
//!
//! Boot sectors are built from a closed table of templates.  The DOS 2.0S boot record
//! is built in.  The other DOS variants boot from images taken off real disks, kept
//! in a boot library directory, either as `<name>.boot` holding the 384 bytes of
//! sectors 1-3, or as `<name>.atr`, a disk image whose first three sectors are used.
//! A template whose autorun setting differs is kept beside it as `<name>.autorun.boot`
//! or `<name>.autorun.atr`.
//!
//! What changes from disk to disk is a list of `(offset,Patch)` pairs, applied when the
//! boot sectors are written, that fill in values only known once the disk is built,
//! such as the start sector of `DOS.SYS`.
//!
//! DOS 2 boot record, offsets relative to the first boot sector:
//! * 0x00 flag, 0x01 boot sector count, 0x02 load address, 0x04 init address
//! * 0x06 JMP to loader, 0x09 max open files, 0x0A drive bits
//! * 0x0C buffer base, 0x0E DOS flag
//! * 0x0F DOS file start sector, 0x11 bytes per data sector, 0x12 DOS load address

use std::fmt;
use std::path::{Path,PathBuf};
use std::str::FromStr;
use log::{debug,warn};
use super::format::{DiskFormat,DosVariant};
use super::types::*;
use crate::img::SectorStore;
use crate::img::atr::Atr;
use crate::DYNERR;

/// Length of the three boot sectors together
pub const BOOT_LEN: usize = BOOT_SECTORS as usize * BOOT_SECTOR_LEN;

const OFF_DOS_FLAG: usize = 0x0E;
const OFF_START: usize = 0x0F;
const OFF_DATA_BYTES: usize = 0x11;

/// Atari DOS 2.0S boot record, $0700-$07CA.  DOS.SYS loads right behind it at $07CB,
/// so the rest of the three sectors is overwritten at boot, and is left zero here.
const DOS20_RECORD: [u8;0xcb] = [
    // header
    0x00,0x03,0x00,0x07,0x40,0x15,0x4c,0x14,0x07,0x03,0x03,0x00,0x7c,0x1a,0x00,0x04,
    0x00,0x7d,0xcb,0x07,
    // $0714 LDY DFSFLG, BEQ NOFILE, point ZBUF and DBUF at DFLADR
    0xac,0x0e,0x07,0xf0,0x36,0xad,0x12,0x07,0x85,0x43,0x8d,0x04,
    0x03,0xad,0x13,0x07,0x85,0x44,0x8d,0x05,0x03,0xad,0x10,0x07,0xac,0x0f,0x07,
    // $072F read a sector, follow the 10-bit link
    0x18,0xae,0x0e,0x07,0x20,0x6c,0x07,0x30,0x17,0xac,0x11,0x07,0xb1,0x43,0x29,0x03,0x48,
    0xc8,0x11,0x43,0xf0,0x0e,0xb1,0x43,0xa8,0x20,0x57,0x07,0x68,0x4c,0x2f,0x07,
    // $074F NOFILE / BADDSK
    0xa9,0xc0,0xd0,0x01,0x68,0x0a,0xa8,0x60,
    // $0757 advance the buffer by BLDISP
    0x18,0xa5,0x43,0x6d,0x11,0x07,0x8d,0x04,0x03,
    0x85,0x43,0xa5,0x44,0x69,0x00,0x8d,0x05,0x03,0x85,0x44,0x60,
    // $076C sector I/O through SIOV with retries
    0x8d,0x0b,0x03,0x8c,
    0x0a,0x03,0xa9,0x52,0xa0,0x40,0x90,0x04,0xa9,0x57,0xa0,0x80,0x8d,0x02,0x03,0x8c,
    0x03,0x03,0xa9,0x31,0xa0,0x0f,0x8d,0x00,0x03,0x8c,0x06,0x03,0xa9,0x03,0x8d,0xff,
    0x12,0xa9,0x00,0xa0,0x80,0xca,0xf0,0x04,0xa9,0x01,0xa0,0x00,0x8d,0x09,0x03,0x8c,
    0x08,0x03,0x20,0x59,0xe4,0x10,0x1d,0xce,0xff,0x12,0x30,0x18,0xa2,0x40,0xa9,0x52,
    0xcd,0x02,0x03,0xf0,0x09,0xa9,0x21,0xcd,0x02,0x03,0xf0,0x02,0xa2,0x80,0x8e,0x03,
    0x03,0x4c,0xa2,0x07,0xae,0x01,0x13,0xad,0x03,0x03,0x60
];

/// Values that are filled in when the boot sectors are written
#[derive(Clone,Copy,PartialEq,Debug)]
pub enum Patch {
    /// 0 if there is no DOS file, 1 for 128 byte sectors, 2 for 256 byte sectors
    DosFlag,
    StartLo,
    StartHi,
    /// payload bytes per data sector, also the offset of the link
    DataBytes
}

/// Where the template bytes come from
#[derive(Clone,Copy,PartialEq)]
enum Image {
    Dos20,
    Library
}

/// Formats a template can boot from
#[derive(Clone,Copy,PartialEq)]
enum Fits {
    /// loaders that follow 10-bit links
    TenBit,
    SingleOnly,
    MyDos,
    Any
}

struct Template {
    name: &'static str,
    label: &'static str,
    dos_file: Option<&'static [u8;11]>,
    fits: Fits,
    image: Image,
    patches: &'static [(usize,Patch)]
}

const DOS2_PATCHES: &[(usize,Patch)] = &[
    (OFF_DOS_FLAG,Patch::DosFlag),
    (OFF_START,Patch::StartLo),
    (OFF_START+1,Patch::StartHi),
    (OFF_DATA_BYTES,Patch::DataBytes)
];

/// Closed set of boot sector layouts
#[derive(Clone,Copy,PartialEq,Eq,Debug,Default)]
pub enum BootType {
    /// DOS 2.0S boot record with no DOS file, boots to "BOOT ERROR"
    #[default]
    NoDos,
    Dos20,
    Dos25,
    MyDos4533,
    MyDos4534,
    MyDos455,
    Turbo21,
    Xdos243F,
    Xdos243N,
    SmartDos62,
    MyPicoDos403,
    MyPicoDos404,
    MyPicoDos404N,
    MyPicoDos404R,
    MyPicoDos404B,
    MyPicoDos405,
    MyPicoDos405A,
    MyPicoDos405N,
    MyPicoDos405R,
    MyPicoDos405B,
    MyPicoDos406
}

const DOS_SYS: &[u8;11] = b"DOS     SYS";
const PICO_SYS: &[u8;11] = b"PICODOS SYS";

fn pico(name: &'static str,label: &'static str) -> Template {
    Template { name, label, dos_file: Some(PICO_SYS), fits: Fits::Any, image: Image::Library, patches: DOS2_PATCHES }
}

/// Read one boot library file, giving the 384 bytes of the boot sectors
fn read_library_file(path: &Path) -> Result<Vec<u8>,DYNERR> {
    let dat = std::fs::read(path)?;
    if path.extension().map(|x| x=="atr").unwrap_or(false) {
        let mut img = Atr::from_bytes(&dat)?;
        let mut ans = Vec::new();
        for sec in 1..=BOOT_SECTORS {
            let buf = img.read_sector(sec)?;
            ans.extend_from_slice(&buf[0..BOOT_SECTOR_LEN]);
        }
        return Ok(ans);
    }
    if dat.len()!=BOOT_LEN {
        warn!("{} has {} bytes, expected {}",path.display(),dat.len(),BOOT_LEN);
        return Err(Box::new(Error::BootImageMissing));
    }
    Ok(dat)
}

impl BootType {
    pub const ALL: [BootType;21] = [
        Self::NoDos,Self::Dos20,Self::Dos25,Self::MyDos4533,Self::MyDos4534,Self::MyDos455,
        Self::Turbo21,Self::Xdos243F,Self::Xdos243N,Self::SmartDos62,
        Self::MyPicoDos403,Self::MyPicoDos404,Self::MyPicoDos404N,Self::MyPicoDos404R,Self::MyPicoDos404B,
        Self::MyPicoDos405,Self::MyPicoDos405A,Self::MyPicoDos405N,Self::MyPicoDos405R,Self::MyPicoDos405B,
        Self::MyPicoDos406
    ];
    fn template(&self) -> Template {
        let dos2 = |name,label,fits| Template { name, label, dos_file: Some(DOS_SYS), fits, image: Image::Library, patches: DOS2_PATCHES };
        match self {
            Self::NoDos => Template { dos_file: None, image: Image::Dos20, ..dos2("none","no DOS",Fits::Any) },
            Self::Dos20 => Template { image: Image::Dos20, ..dos2("dos20","Atari DOS 2.0S",Fits::SingleOnly) },
            Self::Dos25 => dos2("dos25","Atari DOS 2.5",Fits::TenBit),
            Self::MyDos4533 => dos2("mydos4533","MyDOS 4.53/3",Fits::MyDos),
            Self::MyDos4534 => dos2("mydos4534","MyDOS 4.53/4",Fits::MyDos),
            Self::MyDos455 => dos2("mydos455","MyDOS 4.55 beta 4",Fits::MyDos),
            Self::Turbo21 => dos2("turbo21","Turbo-DOS 2.1",Fits::TenBit),
            Self::Xdos243F => dos2("xdos243f","XDOS 2.43F",Fits::TenBit),
            Self::Xdos243N => dos2("xdos243n","XDOS 2.43N",Fits::SingleOnly),
            Self::SmartDos62 => Template { dos_file: Some(b"SMARTDOSSYS"), ..dos2("smartdos62","SmartDOS 6.1D",Fits::TenBit) },
            Self::MyPicoDos403 => pico("picodos403","MyPicoDos 4.03"),
            Self::MyPicoDos404 => pico("picodos404","MyPicoDos 4.04"),
            Self::MyPicoDos404N => pico("picodos404n","MyPicoDos 4.04 no high speed"),
            Self::MyPicoDos404R => pico("picodos404r","MyPicoDos 4.04 reset to DOS"),
            Self::MyPicoDos404B => pico("picodos404b","MyPicoDos 4.04 barebone"),
            Self::MyPicoDos405 => pico("picodos405","MyPicoDos 4.05"),
            Self::MyPicoDos405A => pico("picodos405a","MyPicoDos 4.05 auto high speed"),
            Self::MyPicoDos405N => pico("picodos405n","MyPicoDos 4.05 no high speed"),
            Self::MyPicoDos405R => pico("picodos405r","MyPicoDos 4.05 reset to DOS"),
            Self::MyPicoDos405B => pico("picodos405b","MyPicoDos 4.05 barebone"),
            Self::MyPicoDos406 => pico("picodos406","MyPicoDos 4.06")
        }
    }
    /// 8.3 name of the file the boot sectors load, if any
    pub fn dos_file(&self) -> Option<[u8;11]> {
        self.template().dos_file.copied()
    }
    pub fn is_pico(&self) -> bool {
        self.template().dos_file==Some(PICO_SYS)
    }
    /// Is the template built in, or does it need the boot library
    pub fn is_built_in(&self) -> bool {
        self.template().image==Image::Dos20
    }
    /// Can this boot sector start a DOS on the given format
    pub fn fits(&self,fmt: &DiskFormat) -> bool {
        let t = self.template();
        if t.dos_file.is_none() {
            return true;
        }
        match t.fits {
            Fits::Any => true,
            Fits::TenBit => !fmt.use_16bit_sector_links,
            Fits::SingleOnly => fmt.dos==DosVariant::Dos2x && fmt.sector_len==128 && !fmt.is_dos25_enhanced_density,
            Fits::MyDos => fmt.dos==DosVariant::MyDos
        }
    }
    /// Paths searched in the boot library, best match first
    pub fn library_paths(&self,library: &Path,autorun: bool) -> Vec<PathBuf> {
        let name = self.template().name;
        let mut ans = Vec::new();
        if autorun {
            ans.push(library.join([name,".autorun.boot"].concat()));
            ans.push(library.join([name,".autorun.atr"].concat()));
        }
        ans.push(library.join([name,".boot"].concat()));
        ans.push(library.join([name,".atr"].concat()));
        ans
    }
    /// Unpatched bytes of the three boot sectors.  Templates outside the built in set
    /// are read from `library`, the autorun version is preferred if `autorun` is set.
    pub fn template_bytes(&self,library: Option<&Path>,autorun: bool) -> Result<Vec<u8>,DYNERR> {
        let t = self.template();
        if t.image==Image::Dos20 {
            let mut ans = vec![0;BOOT_LEN];
            ans[0..DOS20_RECORD.len()].copy_from_slice(&DOS20_RECORD);
            if autorun {
                warn!("{} has no autorun setting",t.label);
            }
            return Ok(ans);
        }
        let library = match library {
            Some(dir) => dir,
            None => {
                warn!("{} needs a boot library",t.label);
                return Err(Box::new(Error::BootImageMissing));
            }
        };
        for (i,path) in self.library_paths(library,autorun).iter().enumerate() {
            if path.is_file() {
                if autorun && i > 1 {
                    warn!("no autorun version of {}, using {}",t.label,path.display());
                }
                debug!("boot sectors for {} from {}",t.label,path.display());
                return read_library_file(path);
            }
        }
        warn!("{} not found in {}",t.name,library.display());
        Err(Box::new(Error::BootImageMissing))
    }
    /// Build the three boot sectors.  `start` is the first sector of the DOS file,
    /// or `None` to leave the disk unbootable.
    pub fn render(&self,fmt: &DiskFormat,start: Option<u32>,autorun: bool,library: Option<&Path>) -> Result<Vec<u8>,DYNERR> {
        let t = self.template();
        let mut ans = self.template_bytes(library,autorun)?;
        let start = match t.dos_file {
            Some(_) => start,
            None => None
        };
        for (offset,patch) in t.patches {
            let val = match (patch,start) {
                (Patch::DosFlag,None) => 0,
                (Patch::DosFlag,Some(_)) => match fmt.sector_len { 128 => 1, _ => 2 },
                (Patch::StartLo,Some(sec)) => (sec & 0xff) as u8,
                (Patch::StartHi,Some(sec)) => (sec >> 8) as u8,
                (Patch::DataBytes,_) => fmt.data_len() as u8,
                // an unbootable disk keeps the template's link
                (_,None) => continue
            };
            ans[*offset] = val;
        }
        debug!("boot sectors for {}, DOS file at {:?}",t.label,start);
        Ok(ans)
    }
    pub fn label(&self) -> &'static str {
        self.template().label
    }
}

impl FromStr for BootType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        for b in Self::ALL {
            if b.template().name==s {
                return Ok(b);
            }
        }
        Err(Error::InvalidOption)
    }
}

impl fmt::Display for BootType {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{}",self.template().name)
    }
}
