//! ### Disk format descriptor
//!
//! Captures the handful of parameters that decide how the directory, VTOC, and
//! sector links are laid out.  Everything is derived from the DOS variant and the
//! sector geometry, so this must be settled before the VTOC is built.

use std::fmt;
use std::str::FromStr;
use log::{debug,error};
use super::types::*;
use super::vtoc::vtoc_sectors_needed;

/// The DOS variants whose on-disk layout we reproduce.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum DosVariant {
    /// Atari DOS 2.0 and 2.5, including 2.5 enhanced density
    Dos2x,
    /// MyDOS 4.5, adds subdirectories, large disks, and 16-bit sector links
    MyDos
}

impl FromStr for DosVariant {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "dos2" | "dos20" | "dos25" | "dos2x" => Ok(Self::Dos2x),
            "mydos" => Ok(Self::MyDos),
            _ => Err(Error::InvalidOption)
        }
    }
}

impl fmt::Display for DosVariant {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dos2x => write!(f,"DOS 2.x"),
            Self::MyDos => write!(f,"MyDOS")
        }
    }
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct DiskFormat {
    pub dos: DosVariant,
    pub sector_len: usize,
    pub sector_count: u32,
    /// DOS 2.5 1040 sector disk with the secondary VTOC at 1024
    pub is_dos25_enhanced_density: bool,
    /// MyDOS disk with sectors beyond the reach of 10-bit links
    pub use_16bit_sector_links: bool,
    /// number of primary VTOC sectors, counting down from 360
    pub vtoc_count: u32
}

impl DiskFormat {
    /// Derive the layout from the DOS variant and geometry, or refuse a geometry
    /// the variant cannot represent.
    pub fn new(dos: DosVariant,sector_len: usize,sector_count: u32) -> Result<Self,Error> {
        if sector_len!=128 && sector_len!=256 {
            error!("{} cannot use {} byte sectors",dos,sector_len);
            return Err(Error::Geometry);
        }
        if sector_count < MIN_SECTORS || sector_count > MAX_SECTORS {
            error!("sector count {} out of range",sector_count);
            return Err(Error::Geometry);
        }
        let ans = match dos {
            DosVariant::Dos2x => {
                if sector_count > ED_SECTORS {
                    error!("DOS 2.x cannot address {} sectors, use MyDOS",sector_count);
                    return Err(Error::Geometry);
                }
                Self {
                    dos,
                    sector_len,
                    sector_count,
                    is_dos25_enhanced_density: sector_len==128 && sector_count==ED_SECTORS,
                    use_16bit_sector_links: false,
                    vtoc_count: 1
                }
            },
            DosVariant::MyDos => Self {
                dos,
                sector_len,
                sector_count,
                is_dos25_enhanced_density: false,
                use_16bit_sector_links: sector_count > MAX_10BIT_SECTOR,
                vtoc_count: vtoc_sectors_needed(sector_count,sector_len)
            }
        };
        debug!("format {} x {} bytes, ED {}, 16-bit {}, {} VTOC sectors",sector_count,sector_len,
            ans.is_dos25_enhanced_density,ans.use_16bit_sector_links,ans.vtoc_count);
        Ok(ans)
    }
    /// Bytes of payload in each data sector
    pub fn data_len(&self) -> usize {
        self.sector_len - 3
    }
    /// Primary VTOC sectors in bitmap order, the first one holds the header
    pub fn vtoc_sectors(&self) -> Vec<u32> {
        (0..self.vtoc_count).map(|i| VTOC_SECTOR - i).collect()
    }
    /// Highest sector number the DOS will ever allocate
    pub fn highest_data_sector(&self) -> u32 {
        match self.dos {
            DosVariant::MyDos => self.sector_count,
            DosVariant::Dos2x if self.is_dos25_enhanced_density => MAX_10BIT_SECTOR,
            DosVariant::Dos2x => {
                // DOS 2 leaves the last sector alone, and one VTOC sector bounds the bitmap
                let bitmap_limit = ((self.sector_len - VTOC_BITMAP_OFFSET) * 8 - 1) as u32;
                (self.sector_count - 1).min(MAX_10BIT_SECTOR).min(bitmap_limit)
            }
        }
    }
    /// Is this sector available for file data and subdirectories
    pub fn is_data_sector(&self,sector: u32) -> bool {
        if sector <= BOOT_SECTORS || sector > self.highest_data_sector() {
            return false;
        }
        if sector > VTOC_SECTOR - self.vtoc_count && sector < DIR_SECTOR + DIR_SECTORS {
            return false;
        }
        if self.is_dos25_enhanced_density && sector==ED_SPLIT {
            return false;
        }
        true
    }
    /// Number of sectors available for data on a freshly formatted disk
    pub fn data_sector_total(&self) -> u32 {
        (1..=self.sector_count).filter(|s| self.is_data_sector(*s)).count() as u32
    }
}
