//! ### VTOC allocator
//!
//! The VTOC is a bitmap with one bit per sector number, set when the sector is free.
//! The free count in the header is adjusted with every bit that flips, so it always
//! agrees with the bitmap.
//!
//! Three layouts are handled:
//! * one VTOC sector (DOS 2.0, single and double density)
//! * DOS 2.5 enhanced density, where sector 1024 maps sectors 721 through 1023
//!   with its own free count, and mirrors the primary map from sector 48 up
//! * MyDOS multi-VTOC, where the bitmap runs on into sectors 359, 358, ...

use log::{debug,trace,warn};
use super::format::{DiskFormat,DosVariant};
use super::types::*;
use crate::img::SectorStore;
use crate::{STDRESULT,DYNERR};

/// Number of primary VTOC sectors needed to map sectors 0 through `sector_count`.
pub fn vtoc_sectors_needed(sector_count: u32,sector_len: usize) -> u32 {
    let bytes = sector_count as usize / 8 + 1;
    let first = sector_len - VTOC_BITMAP_OFFSET;
    if bytes <= first {
        return 1;
    }
    1 + ((bytes - first + sector_len - 1) / sector_len) as u32
}

/// Total sector count of a disk whose content, apart from the VTOC, needs `payload` sectors.
/// The VTOC size depends on the total, which depends on the VTOC size, so iterate to a fixed point.
pub fn size_with_vtoc(payload: u32,sector_len: usize) -> u32 {
    let mut vtocs = 1;
    loop {
        let total = payload.saturating_add(vtocs);
        let needed = vtoc_sectors_needed(total.min(MAX_SECTORS),sector_len);
        if needed <= vtocs {
            return total;
        }
        vtocs = needed;
    }
}

/// Where the bit for a sector lives
#[derive(Clone,Copy)]
enum Bit {
    /// index into the primary VTOC sectors, byte, mask
    Primary(usize,usize,u8),
    /// byte within the DOS 2.5 secondary VTOC, mask
    Secondary(usize,u8)
}

/// Working copy of the VTOC sector(s) of one disk.
#[derive(Clone)]
pub struct Vtoc {
    fmt: DiskFormat,
    primary: Vec<Vec<u8>>,
    secondary: Option<Vec<u8>>
}

impl Vtoc {
    /// Create an empty VTOC with headers filled in and every sector in use.
    pub fn blank(fmt: &DiskFormat) -> Self {
        let mut primary = vec![vec![0;fmt.sector_len];fmt.vtoc_count as usize];
        primary[0][0] = match fmt.dos {
            DosVariant::Dos2x => 2,
            DosVariant::MyDos => fmt.vtoc_count as u8 + 1
        };
        let total = fmt.data_sector_total() as u16;
        primary[0][1..3].copy_from_slice(&u16::to_le_bytes(total));
        Self {
            fmt: *fmt,
            primary,
            secondary: match fmt.is_dos25_enhanced_density {
                true => Some(vec![0;fmt.sector_len]),
                false => None
            }
        }
    }
    /// Read the VTOC sector(s) from the image.
    pub fn load(img: &mut dyn SectorStore,fmt: &DiskFormat) -> Result<Self,DYNERR> {
        let mut primary = Vec::new();
        for sec in fmt.vtoc_sectors() {
            primary.push(img.read_sector(sec)?);
        }
        let secondary = match fmt.is_dos25_enhanced_density {
            true => Some(img.read_sector(VTOC2_SECTOR)?),
            false => None
        };
        Ok(Self {
            fmt: *fmt,
            primary,
            secondary
        })
    }
    /// Write the VTOC sector(s) to the image.
    pub fn save(&self,img: &mut dyn SectorStore) -> STDRESULT {
        for (buf,sec) in self.primary.iter().zip(self.fmt.vtoc_sectors()) {
            img.write_sector(sec,buf)?;
        }
        if let Some(buf) = &self.secondary {
            img.write_sector(VTOC2_SECTOR,buf)?;
        }
        Ok(())
    }
    fn primary_bit(&self,sector: u32) -> Bit {
        let len = self.fmt.sector_len;
        let i = sector as usize / 8;
        let mask = 0x80 >> (sector % 8);
        let first = len - VTOC_BITMAP_OFFSET;
        if i < first {
            Bit::Primary(0,VTOC_BITMAP_OFFSET + i,mask)
        } else {
            let k = i - first;
            Bit::Primary(1 + k/len,k%len,mask)
        }
    }
    fn secondary_bit(sector: u32) -> Bit {
        Bit::Secondary(((sector - VTOC2_BASE)/8) as usize,0x80 >> (sector % 8))
    }
    fn owner_bit(&self,sector: u32) -> Bit {
        match self.fmt.is_dos25_enhanced_density && sector > ED_SPLIT {
            true => Self::secondary_bit(sector),
            false => self.primary_bit(sector)
        }
    }
    fn get_bit(&self,bit: Bit) -> bool {
        match bit {
            Bit::Primary(s,b,m) => self.primary.get(s).map_or(false,|v| v[b] & m > 0),
            Bit::Secondary(b,m) => self.secondary.as_ref().map_or(false,|v| v[b] & m > 0)
        }
    }
    fn put_bit(&mut self,bit: Bit,free: bool) {
        let byte = match bit {
            Bit::Primary(s,b,m) => self.primary.get_mut(s).map(|v| (&mut v[b],m)),
            Bit::Secondary(b,m) => self.secondary.as_mut().map(|v| (&mut v[b],m))
        };
        if let Some((byte,mask)) = byte {
            match free {
                true => *byte |= mask,
                false => *byte &= mask ^ 0xff
            }
        }
    }
    fn adjust_count(&mut self,bit: Bit,delta: i32) {
        let (buf,offset) = match bit {
            Bit::Primary(..) => (&mut self.primary[0],3),
            Bit::Secondary(..) => match self.secondary.as_mut() {
                Some(v) => (v,VTOC2_FREE_OFFSET),
                None => return
            }
        };
        let old = u16::from_le_bytes([buf[offset],buf[offset+1]]) as i32;
        let new = (old + delta).clamp(0,u16::MAX as i32) as u16;
        buf[offset..offset+2].copy_from_slice(&u16::to_le_bytes(new));
    }
    /// Flip the bit for one sector, keeping the counts and the DOS 2.5 mirror in step
    fn set_free(&mut self,sector: u32,free: bool) {
        let bit = self.owner_bit(sector);
        if self.get_bit(bit)==free {
            return;
        }
        self.put_bit(bit,free);
        self.adjust_count(bit,match free { true => 1, false => -1 });
        if self.fmt.is_dos25_enhanced_density && sector >= VTOC2_BASE && sector <= ED_SPLIT {
            self.put_bit(Self::secondary_bit(sector),free);
        }
    }
    pub fn is_free(&self,sector: u32) -> bool {
        if sector==0 || sector > self.fmt.sector_count {
            return false;
        }
        self.get_bit(self.owner_bit(sector))
    }
    /// Mark every data sector in the range free, used when seeding a fresh bitmap.
    pub fn mark_sectors_free(&mut self,first: u32,last: u32) {
        for sec in first..=last {
            if self.fmt.is_data_sector(sec) {
                self.set_free(sec,true);
            }
        }
    }
    /// Give sectors back, used to undo an allocation that could not be completed.
    pub fn release_sectors(&mut self,sectors: &[u32]) {
        for sec in sectors {
            if self.fmt.is_data_sector(*sec) {
                self.set_free(*sec,true);
            }
        }
    }
    /// Harvest `count` free sectors from low to high sector number.
    /// Either every requested sector is returned and marked used, or `None` is returned
    /// and the bitmap is untouched.  `want_contiguous_8` asks for one byte aligned run of 8,
    /// which is how MyDOS places a subdirectory.
    pub fn alloc_sectors(&mut self,count: usize,want_contiguous_8: bool) -> Option<Vec<u32>> {
        let highest = self.fmt.highest_data_sector();
        let mut ans: Vec<u32> = Vec::new();
        if want_contiguous_8 {
            if self.fmt.dos!=DosVariant::MyDos || count!=8 {
                warn!("contiguous allocation is only for MyDOS directories");
                return None;
            }
            let mut base = 0;
            while base + 7 <= highest {
                if (base..base+8).all(|s| self.is_free(s)) {
                    ans = (base..base+8).collect();
                    break;
                }
                base += 8;
            }
        } else {
            for sec in 1..=highest {
                if ans.len()==count {
                    break;
                }
                if self.is_free(sec) {
                    ans.push(sec);
                }
            }
        }
        if ans.len() < count {
            debug!("wanted {} sectors, only {} free",count,ans.len());
            return None;
        }
        for sec in &ans {
            self.set_free(*sec,false);
        }
        trace!("allocated {:?}",ans);
        Some(ans)
    }
    /// Free count field of the primary VTOC
    pub fn primary_free(&self) -> u16 {
        u16::from_le_bytes([self.primary[0][3],self.primary[0][4]])
    }
    /// Free count field of the DOS 2.5 secondary VTOC, if there is one
    pub fn secondary_free(&self) -> Option<u16> {
        self.secondary.as_ref().map(|v| u16::from_le_bytes([v[VTOC2_FREE_OFFSET],v[VTOC2_FREE_OFFSET+1]]))
    }
    /// Free sectors according to the count fields
    pub fn free_count(&self) -> usize {
        self.primary_free() as usize + self.secondary_free().unwrap_or(0) as usize
    }
    /// Usable sector total recorded in the header
    pub fn total_sectors(&self) -> u16 {
        u16::from_le_bytes([self.primary[0][1],self.primary[0][2]])
    }
    /// Count the set bits of each map, to be compared with the count fields.
    /// The mirrored part of the secondary map is not counted.
    pub fn bitmap_popcounts(&self) -> (u32,Option<u32>) {
        let mut primary = 0;
        for (i,buf) in self.primary.iter().enumerate() {
            let start = match i { 0 => VTOC_BITMAP_OFFSET, _ => 0 };
            primary += buf[start..].iter().map(|b| b.count_ones()).sum::<u32>();
        }
        let secondary = self.secondary.as_ref().map(|v| {
            let start = ((ED_SPLIT - VTOC2_BASE)/8) as usize;
            v[start..VTOC2_FREE_OFFSET].iter().map(|b| b.count_ones()).sum::<u32>()
        });
        (primary,secondary)
    }
}
