//! ## Support for ATR disk images
//!
//! ATR images are a 16 byte header followed by a sequential dump of the sector data.
//! On images with sectors longer than 128 bytes, the three boot sectors are normally
//! stored with only 128 bytes each.  Some tools pad them out to the full sector length,
//! such images are accepted on read and written back the same way.
//! The header is handled with `binrw`.

use binrw::{BinRead,BinWrite};
use binrw::io::Cursor;
use log::{trace,debug,error};
use crate::img;
use crate::{STDRESULT,DYNERR};

const HEADER_LEN: usize = 16;
const BOOT_SECTORS: u32 = 3;
const BOOT_SECTOR_LEN: usize = 128;
const MAX_SECTORS: u32 = 65535;

pub fn file_extensions() -> Vec<String> {
    vec!["atr".to_string()]
}

#[derive(BinRead,BinWrite,Debug,Clone)]
#[brw(little, magic = 0x0296u16)]
struct Header {
    /// image size in 16 byte paragraphs, low word
    paragraphs: u16,
    sector_len: u16,
    /// image size in paragraphs, high byte
    paragraphs_hi: u8,
    crc: u32,
    unused: u32,
    flags: u8
}

/// Wrapper for ATR data.
pub struct Atr {
    sector_len: usize,
    sector_count: u32,
    /// stride of the boot sectors within `data`, either 128 or `sector_len`
    boot_stride: usize,
    data: Vec<u8>,
    changed: bool
}

impl Atr {
    /// Create a blank image, all sectors zeroed.
    pub fn create(sector_count: u32,sector_len: usize) -> Result<Self,DYNERR> {
        if ![128,256,512].contains(&sector_len) {
            error!("sector length {} is not supported",sector_len);
            return Err(Box::new(img::Error::GeometryMismatch));
        }
        if sector_count < BOOT_SECTORS || sector_count > MAX_SECTORS {
            error!("sector count {} is out of range",sector_count);
            return Err(Box::new(img::Error::GeometryMismatch));
        }
        let len = BOOT_SECTORS as usize * BOOT_SECTOR_LEN + (sector_count - BOOT_SECTORS) as usize * sector_len;
        Ok(Self {
            sector_len,
            sector_count,
            boot_stride: BOOT_SECTOR_LEN,
            data: vec![0;len],
            changed: false
        })
    }
    pub fn from_bytes(dat: &[u8]) -> Result<Self,DYNERR> {
        if dat.len() < HEADER_LEN {
            debug!("too short to be an ATR");
            return Err(Box::new(img::Error::ImageSizeMismatch));
        }
        let header = match Header::read(&mut Cursor::new(&dat[0..HEADER_LEN])) {
            Ok(h) => h,
            Err(e) => {
                debug!("ATR header rejected: {}",e);
                return Err(Box::new(img::Error::BadHeader));
            }
        };
        let sector_len = header.sector_len as usize;
        if ![128,256,512].contains(&sector_len) {
            debug!("ATR sector length {} is not supported",sector_len);
            return Err(Box::new(img::Error::BadHeader));
        }
        let size = (((header.paragraphs_hi as usize) << 16) + header.paragraphs as usize) * 16;
        if dat.len() < HEADER_LEN + size {
            error!("ATR header claims {} bytes, but only {} are present",size,dat.len()-HEADER_LEN);
            return Err(Box::new(img::Error::ImageSizeMismatch));
        }
        let short_boot = BOOT_SECTORS as usize * BOOT_SECTOR_LEN;
        let (boot_stride,sector_count) = match sector_len {
            128 => (128,size/128),
            _ if size >= short_boot && (size - short_boot) % sector_len == 0 => (BOOT_SECTOR_LEN, 3 + (size - short_boot) / sector_len),
            _ if size % sector_len == 0 => (sector_len, size / sector_len),
            _ => {
                error!("ATR size {} is not consistent with sector length {}",size,sector_len);
                return Err(Box::new(img::Error::ImageSizeMismatch));
            }
        };
        if sector_count < BOOT_SECTORS as usize || sector_count > MAX_SECTORS as usize {
            error!("ATR sector count {} out of range",sector_count);
            return Err(Box::new(img::Error::ImageSizeMismatch));
        }
        Ok(Self {
            sector_len,
            sector_count: sector_count as u32,
            boot_stride,
            data: dat[HEADER_LEN..HEADER_LEN+size].to_vec(),
            changed: false
        })
    }
    fn offset(&self,sector: u32) -> usize {
        match sector {
            s if s <= BOOT_SECTORS => (s as usize - 1) * self.boot_stride,
            s => BOOT_SECTORS as usize * self.boot_stride + (s - BOOT_SECTORS - 1) as usize * self.sector_len
        }
    }
    fn check_bounds(&self,sector: u32) -> STDRESULT {
        if sector==0 || sector > self.sector_count {
            error!("sector {} is outside 1..{}",sector,self.sector_count);
            return Err(Box::new(img::Error::SectorAccess));
        }
        Ok(())
    }
}

impl img::SectorStore for Atr {
    fn sector_count(&self) -> u32 {
        self.sector_count
    }
    fn sector_length(&self,sector: u32) -> usize {
        match sector {
            0 => 0,
            s if s > self.sector_count => 0,
            s if s <= BOOT_SECTORS => BOOT_SECTOR_LEN,
            _ => self.sector_len
        }
    }
    fn nominal_sector_length(&self) -> usize {
        self.sector_len
    }
    fn read_sector(&mut self,sector: u32) -> Result<Vec<u8>,DYNERR> {
        trace!("read sector {}",sector);
        self.check_bounds(sector)?;
        let offset = self.offset(sector);
        let len = self.sector_length(sector);
        Ok(self.data[offset..offset+len].to_vec())
    }
    fn write_sector(&mut self,sector: u32,dat: &[u8]) -> STDRESULT {
        trace!("write sector {}",sector);
        self.check_bounds(sector)?;
        let offset = self.offset(sector);
        let len = self.sector_length(sector);
        self.data[offset..offset+len].copy_from_slice(&img::quantize_sector(dat,len));
        self.changed = true;
        Ok(())
    }
    fn set_changed(&mut self,changed: bool) {
        self.changed = changed;
    }
    fn is_changed(&self) -> bool {
        self.changed
    }
    fn what_am_i(&self) -> img::ImageType {
        img::ImageType::Atr
    }
    fn to_bytes(&self) -> Vec<u8> {
        let paragraphs = self.data.len() / 16;
        let header = Header {
            paragraphs: (paragraphs & 0xffff) as u16,
            sector_len: self.sector_len as u16,
            paragraphs_hi: (paragraphs >> 16) as u8,
            crc: 0,
            unused: 0,
            flags: 0
        };
        let mut cur = Cursor::new(Vec::with_capacity(HEADER_LEN + self.data.len()));
        // writing into a Vec cannot fail
        let _ = header.write(&mut cur);
        let mut ans = cur.into_inner();
        ans.extend_from_slice(&self.data);
        ans
    }
}
