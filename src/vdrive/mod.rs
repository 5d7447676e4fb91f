//! # Virtual Drives
//!
//! A virtual drive is an emulated disk built from a host directory, whose directory
//! tree is kept in step with the host while the Atari writes to it.
//!
//! `mount_virtual_drive` sizes a disk for the host directory, formats it, copies the
//! host files in, installs boot sectors, and starts the observer.  After that the SIO
//! layer should write through `Drive::write_sector`, or at least call the before and
//! after hooks around every sector write.
//!
//! Everything here is single threaded, a drive and its directory tree belong to one
//! command loop.

pub mod observer;

use std::path::{Path,PathBuf};
use log::{info,error};
use crate::fs::dos2::{self,Disk,DosVariant,BootType,DiskFormat};
use crate::fs::dos2::estimate::{estimate_disk_size,estimate_content_sectors};
use crate::img::{SectorStore,atr::Atr};
use crate::{STDRESULT,DYNERR};
pub use dos2::PicoNameMode;

/// Disk geometry of a virtual drive
#[derive(Clone,Copy,PartialEq,Eq,Debug,Default)]
pub enum Density {
    /// smallest disk that holds the host directory
    #[default]
    Auto,
    /// 720 sectors of 128 bytes
    Single,
    /// 1040 sectors of 128 bytes, DOS 2.5
    Enhanced,
    /// 720 sectors of 256 bytes
    Double,
    Custom { sectors: u32, sector_len: usize }
}

impl std::str::FromStr for Density {
    type Err = dos2::types::Error;
    /// `auto`, `sd`, `ed`, `dd`, or `<sectors>x<length>`
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "sd" | "single" => Ok(Self::Single),
            "ed" | "enhanced" => Ok(Self::Enhanced),
            "dd" | "double" => Ok(Self::Double),
            custom => {
                let mut parts = custom.split('x');
                match (parts.next().and_then(|x| x.parse().ok()),parts.next().and_then(|x| x.parse().ok()),parts.next()) {
                    (Some(sectors),Some(sector_len),None) => Ok(Self::Custom { sectors, sector_len }),
                    _ => Err(dos2::types::Error::Geometry)
                }
            }
        }
    }
}

/// Options for building a virtual drive
#[derive(Clone,Debug)]
pub struct MountOptions {
    pub dos: DosVariant,
    pub density: Density,
    pub boot: BootType,
    /// directory of boot sector images, see `fs::dos2::boot`
    pub boot_library: Option<PathBuf>,
    /// MyPicoDos autorun
    pub autorun: bool,
    pub piconame: PicoNameMode
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            dos: DosVariant::Dos2x,
            density: Density::Auto,
            boot: BootType::default(),
            boot_library: None,
            autorun: false,
            piconame: PicoNameMode::Auto
        }
    }
}

/// Work out the geometry, (sector count, sector length), for a host directory
pub fn choose_geometry(host_dir: &Path,opts: &MountOptions) -> Result<(u32,usize),DYNERR> {
    Ok(match opts.density {
        Density::Single => (720,128),
        Density::Enhanced => (1040,128),
        Density::Double => (720,256),
        Density::Custom { sectors, sector_len } => (sectors,sector_len),
        Density::Auto if opts.dos==DosVariant::MyDos => {
            (estimate_disk_size(host_dir,256,opts.piconame,opts.boot,opts.dos)?,256)
        },
        Density::Auto => {
            let mut ans = None;
            for (sectors,len) in [(720,128),(1040,128),(720,256)] {
                let need = estimate_content_sectors(host_dir,len,opts.piconame,opts.dos)?;
                if DiskFormat::new(opts.dos,len,sectors)?.data_sector_total() >= need {
                    ans = Some((sectors,len));
                    break;
                }
            }
            match ans {
                Some(g) => g,
                None => {
                    error!("{} does not fit on any DOS 2 disk, try MyDOS",host_dir.display());
                    return Err(Box::new(dos2::types::Error::DiskFull));
                }
            }
        }
    })
}

/// Build a disk image from a host directory, the root directory stays bound to `host_dir`.
pub fn build_disk(host_dir: &Path,opts: &MountOptions) -> Result<Disk,DYNERR> {
    if !host_dir.is_dir() {
        error!("{} is not a directory",host_dir.display());
        return Err(Box::new(dos2::types::Error::NoHostPath));
    }
    let (sectors,sector_len) = choose_geometry(host_dir,opts)?;
    info!("building {} x {} {} disk from {}",sectors,sector_len,opts.dos,host_dir.display());
    let img = Atr::create(sectors,sector_len)?;
    let mut disk = Disk::new(Box::new(img),opts.dos)?;
    disk.format()?;
    disk.set_host_root(host_dir)?;
    disk.set_boot_library(opts.boot_library.as_deref());
    disk.add_files(dos2::ROOT,opts.piconame)?;
    disk.write_boot_sectors(opts.boot,opts.autorun)?;
    Ok(disk)
}

/// Build a virtual drive and start watching it
pub fn mount_virtual_drive(host_dir: &Path,opts: &MountOptions) -> Result<Drive,DYNERR> {
    let mut disk = build_disk(host_dir,opts)?;
    disk.attach_observer()?;
    info!("mounted {}",host_dir.display());
    Ok(Drive {
        disk,
        host_dir: host_dir.to_path_buf()
    })
}

/// A mounted virtual drive
pub struct Drive {
    disk: Disk,
    host_dir: PathBuf
}

impl Drive {
    pub fn host_dir(&self) -> &Path {
        &self.host_dir
    }
    pub fn disk(&mut self) -> &mut Disk {
        &mut self.disk
    }
    pub fn sector_count(&mut self) -> u32 {
        self.disk.get_img().sector_count()
    }
    pub fn sector_length(&mut self,sector: u32) -> usize {
        self.disk.get_img().sector_length(sector)
    }
    pub fn before_sector_write(&mut self,sector: u32) -> STDRESULT {
        self.disk.before_sector_write(sector)
    }
    pub fn after_sector_write(&mut self,sector: u32) -> STDRESULT {
        self.disk.after_sector_write(sector)
    }
    pub fn read_sector(&mut self,sector: u32) -> Result<Vec<u8>,DYNERR> {
        self.disk.get_img().read_sector(sector)
    }
    /// Write a sector the way the SIO layer does, with the observer hooks around it.
    /// A failure to mirror onto the host is reported, but the sector stays written.
    pub fn write_sector(&mut self,sector: u32,dat: &[u8]) -> STDRESULT {
        self.disk.before_sector_write(sector)?;
        self.disk.get_img().write_sector(sector,dat)?;
        self.disk.after_sector_write(sector)
    }
    /// Stop watching and hand back the image
    pub fn unmount(mut self) -> Box<dyn SectorStore> {
        self.disk.detach_observer();
        info!("unmounted {}",self.host_dir.display());
        self.disk.into_img()
    }
}
