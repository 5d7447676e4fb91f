//! # `a8kit` main library
//!
//! This library manipulates Atari 8-bit disk images, and keeps emulated disks in step
//! with directories on the host ("virtual drives").
//!
//! ## Architecture
//!
//! Disk operations are built around two layers:
//! * `img::SectorStore` reads and writes numbered sectors, does not try to interpret a file system
//! * `fs::dos2::Disk` imposes the DOS 2 file system on the sectors
//!
//! When a `Disk` is created it takes ownership of some `SectorStore`.
//! It then uses this owned image as storage.  Any changes are not permanent until the
//! image is saved to whatever file system is hosting a8kit.
//!
//! ## File Systems
//!
//! As of this writing `a8kit` supports
//! * Atari DOS 2.0 (single and double density)
//! * Atari DOS 2.5 (including enhanced density)
//! * MyDOS 4.5 (subdirectories, multi-VTOC, 16-bit sector links)
//!
//! ## Disk Images
//!
//! As of this writing `a8kit` supports ATR images.
//!
//! ## Virtual Drives
//!
//! The `vdrive` module builds a disk from a host directory and watches the directory
//! sectors as they are written, so that files the Atari creates, deletes, or renames
//! show up on the host.

pub mod fs;
pub mod img;
pub mod vdrive;
pub mod commands;

use std::fmt::Write;
use log::info;
use fs::dos2::Disk;
use img::SectorStore;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const KNOWN_FILE_EXTENSIONS: &str = "atr";

/// Save the image file (make changes permanent)
pub fn save_img(disk: &mut Disk,img_path: &str) -> STDRESULT {
    let img = disk.get_img();
    std::fs::write(img_path,img.to_bytes())?;
    img.set_changed(false);
    Ok(())
}

/// Given a bytestream return a disk image without any file system.
/// Optional `maybe_ext` restricts the image types that will be tried based on file extension.
pub fn create_img_from_bytestream(disk_img_data: &[u8],maybe_ext: Option<&str>) -> Result<Box<dyn SectorStore>,DYNERR> {
    let ext = match maybe_ext {
        Some(x) => x.to_lowercase(),
        None => "".to_string()
    };
    if img::atr::file_extensions().contains(&ext) || ext.is_empty() {
        if let Ok(img) = img::atr::Atr::from_bytes(disk_img_data) {
            info!("identified ATR image");
            return Ok(Box::new(img));
        }
    }
    Err(Box::new(img::Error::UnknownImageType))
}

/// Calls `create_img_from_bytestream` getting the bytes from a file.
/// File extension will be used to restrict image types that are tried,
/// unless the extension is unknown, in which case all will be tried.
pub fn create_img_from_file(img_path: &str) -> Result<Box<dyn SectorStore>,DYNERR> {
    let disk_img_data = std::fs::read(img_path)?;
    let mut maybe_ext = img_path.split('.').last();
    if let Some(ext) = maybe_ext {
        if !KNOWN_FILE_EXTENSIONS.split(',').any(|k| k==ext.to_lowercase()) {
            maybe_ext = None;
        }
    }
    create_img_from_bytestream(&disk_img_data,maybe_ext)
}

/// Open an image file and find the file system on it
pub fn create_fs_from_file(img_path: &str) -> Result<Disk,DYNERR> {
    let img = create_img_from_file(img_path)?;
    let disk = Disk::from_img(img)?;
    info!("identified {} file system",disk.dos_format().dos);
    Ok(disk)
}

/// Display binary to stdout in columns of hex and ascii
pub fn display_block(start_addr: u16,block: &[u8]) {
    let mut slice_start = 0;
    loop {
        let row_label = start_addr as usize + slice_start;
        let slice_end = usize::min(slice_start + 16,block.len());
        let slice = &block[slice_start..slice_end];
        let txt: Vec<u8> = slice.iter().map(|c| match *c {
            x if x<32 => b'.',
            x if x<127 => x,
            _ => b'.'
        }).collect();
        print!("{:04X} : ",row_label);
        for byte in slice {
            print!("{:02X} ",byte);
        }
        for _blank in slice_end..slice_start+16 {
            print!("   ");
        }
        println!("| {}",String::from_utf8_lossy(&txt));
        slice_start += 16;
        if slice_end==block.len() {
            break;
        }
    }
}

/// This takes any bytes and makes an ascii friendly string
/// by using hex escapes, e.g., `\xFF`.
/// if `escape_cc` is true, ascii control characters are also escaped.
/// This is intended for directory strings.
pub fn escaped_ascii_from_bytes(bytes: &Vec<u8>,escape_cc: bool) -> String {
    let mut result = String::new();
    let (lb,ub) = match escape_cc {
        true => (0x20,0x7e),
        false => (0x00,0x7f)
    };
    for b in bytes {
        if *b>=lb && *b<=ub {
            result.push(*b as char);
        } else {
            // writing to a String cannot fail
            let _ = write!(&mut result,"\\x{:02X}",b);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(escaped_ascii_from_bytes(&b"AB C".to_vec(),true),"AB C");
        assert_eq!(escaped_ascii_from_bytes(&vec![0x41,0x9b,0x01],true),"A\\x9B\\x01");
        assert_eq!(escaped_ascii_from_bytes(&vec![0x41,0x01],false),"A\x01");
    }
}
