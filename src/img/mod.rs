//! # Disk Image Module
//!
//! Disk images are represented by objects implementing the `SectorStore` trait.
//! The object type is usually named for the disk image type that it handles, e.g., `Atr`.
//!
//! ## Basic Functions
//!
//! The trait includes reading and writing sectors, plus enough geometry to let
//! a file system lay itself out.  Sectors are numbered from 1, as the Atari does.
//! The length of a sector can vary with its number: on double density images the
//! first three (boot) sectors are only 128 bytes.
//!
//! ## Relation to File Systems
//!
//! The `SectorStore` trait object serves as the underlying storage for `fs` modules.
//! The `fs` modules work by reading sectors from, or writing sectors to, the disk image,
//! and never look at how the image packs its sectors.

pub mod atr;

use std::fmt;
use crate::{STDRESULT,DYNERR};

/// Enumerates disk image errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("unknown image type")]
    UnknownImageType,
    #[error("geometric coordinate out of range")]
    GeometryMismatch,
	#[error("image size did not match the request")]
	ImageSizeMismatch,
    #[error("image header is invalid")]
    BadHeader,
    #[error("unable to access sector")]
    SectorAccess
}

/// Enumerates the disk image types we can handle.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum ImageType {
    Atr
}

impl fmt::Display for ImageType {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atr => write!(f,"atr")
        }
    }
}

/// Sector addressable storage, the only view of a disk that the file system needs.
/// The SIO layer also talks to the drive through this interface.
pub trait SectorStore {
    /// Number of sectors, the highest valid sector number
    fn sector_count(&self) -> u32;
    /// Length of the given sector in bytes, 0 if the sector does not exist
    fn sector_length(&self,sector: u32) -> usize;
    /// Nominal sector length of the image, i.e., the length of sector 4 and above
    fn nominal_sector_length(&self) -> usize;
    /// Get a copy of the sector data, the length is always `sector_length(sector)`
    fn read_sector(&mut self,sector: u32) -> Result<Vec<u8>,DYNERR>;
    /// Write the sector, data is zero padded or truncated to the sector length
    fn write_sector(&mut self,sector: u32,dat: &[u8]) -> STDRESULT;
    /// Flag the image as changed, or clear the flag after saving
    fn set_changed(&mut self,changed: bool);
    fn is_changed(&self) -> bool;
    fn what_am_i(&self) -> ImageType;
    /// Serialize the image for storage on the host
    fn to_bytes(&self) -> Vec<u8>;
}

/// Pad or truncate a buffer to exactly `len` bytes.
pub fn quantize_sector(dat: &[u8],len: usize) -> Vec<u8> {
    let mut ans = dat.to_vec();
    ans.resize(len,0);
    ans
}
