//! ### Disk size estimate
//!
//! Works out how many sectors a host directory will need once it is copied to a disk,
//! so that a virtual drive can be sized before it is built.  The estimate follows the
//! same rules as the real allocation, but nothing stops the content from growing
//! afterwards, so the real allocation can still fail.

use std::path::Path;
use log::{debug,warn};
use super::{PicoNameMode,BootType};
use super::format::DosVariant;
use super::pack::{build_atari_name,file_name_to_string,piconame_bytes};
use super::vtoc::size_with_vtoc;
use super::types::*;
use crate::DYNERR;

/// Sectors taken by a file of `len` bytes, an empty file still takes one
pub fn sectors_for(len: usize,sector_len: usize) -> u32 {
    let len = usize::min(len,MAX_FILE_LEN);
    let dlen = sector_len - 3;
    usize::max(1,(len + dlen - 1) / dlen) as u32
}

/// Sectors needed by the content of a host directory, not counting its own directory sectors.
pub fn estimate_content_sectors(host_dir: &Path,sector_len: usize,pico: PicoNameMode,dos: DosVariant) -> Result<u32,DYNERR> {
    let mut paths: Vec<std::path::PathBuf> = std::fs::read_dir(host_dir)?.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();
    let mut ans = 0;
    let mut names: Vec<(String,[u8;11])> = Vec::new();
    let mut existing: Vec<[u8;11]> = Vec::new();
    let mut host_pico = None;
    for path in paths {
        let long = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => continue
        };
        if long==PICONAME && path.is_file() {
            host_pico = Some(sectors_for(std::fs::metadata(&path)?.len() as usize,sector_len));
            continue;
        }
        let sectors = if path.is_dir() {
            if dos!=DosVariant::MyDos {
                continue;
            }
            DIR_SECTORS + estimate_content_sectors(&path,sector_len,pico,dos)?
        } else if path.is_file() {
            sectors_for(std::fs::metadata(&path)?.len() as usize,sector_len)
        } else {
            continue;
        };
        ans += sectors;
        if let Ok(short) = build_atari_name(&long,dos,&existing) {
            existing.push(short);
            names.push((long,short));
        }
    }
    let lossy = names.iter().any(|(long,short)| *long!=file_name_to_string(*short));
    let pico_needed = match pico {
        PicoNameMode::Never => false,
        PicoNameMode::Auto => lossy,
        PicoNameMode::Always => true
    };
    if pico_needed {
        let title = host_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        ans += sectors_for(piconame_bytes(&title,&names).len(),sector_len);
    } else if let Some(sectors) = host_pico {
        ans += sectors;
    }
    debug!("{} needs {} sectors",host_dir.display(),ans);
    Ok(ans)
}

/// Total sector count of a disk that can hold the host directory, including boot sectors,
/// root directory, and VTOC, clamped to the range DOS can format.
pub fn estimate_disk_size(host_dir: &Path,sector_len: usize,pico: PicoNameMode,boot: BootType,dos: DosVariant) -> Result<u32,DYNERR> {
    if let Some(dos_file) = boot.dos_file() {
        let present = std::fs::read_dir(host_dir)?.filter_map(|e| e.ok()).any(|e| {
            let long = e.file_name().to_string_lossy().to_string();
            build_atari_name(&long,dos,&[]).map(|n| n==dos_file).unwrap_or(false)
        });
        if !present {
            warn!("{} expects {} which is not in {}",boot.label(),file_name_to_string(dos_file),host_dir.display());
        }
    }
    let content = estimate_content_sectors(host_dir,sector_len,pico,dos)?;
    let total = size_with_vtoc(content + BOOT_SECTORS + DIR_SECTORS,sector_len);
    Ok(total.clamp(MIN_SECTORS,MAX_SECTORS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sectors() {
        assert_eq!(sectors_for(0,128),1);
        assert_eq!(sectors_for(125,128),1);
        assert_eq!(sectors_for(126,128),2);
        assert_eq!(sectors_for(254,256),2);
        assert_eq!(sectors_for(usize::MAX,256),0xffff);
    }
}
