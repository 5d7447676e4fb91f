//! # Atari DOS 2.x and MyDOS file system module
//! This manipulates disk images containing a DOS 2.0, DOS 2.5, or MyDOS volume.
//! Sector lengths of 128 or 256 bytes are allowed, sector counts from 720 up to 65535,
//! the upper reaches requiring MyDOS.
//!
//! * `Disk` owns the image and an arena of directory levels, addressed by `DirHandle`
//! * host side operations (format, add files, add directories) go through `Disk`
//! * Atari side writes are seen through `before_sector_write` and `after_sector_write`,
//!   which mirror directory changes onto the host, see the `sync` module
//! * The module tries to lay out sectors the way DOS would, so that images can be
//!   used by real Atari DOS software

pub mod types;
pub mod format;
pub mod vtoc;
pub mod directory;
pub mod pack;
pub mod boot;
pub mod display;
pub mod estimate;
mod sync;

use std::path::{Path,PathBuf};
use std::str::FromStr;
use log::{trace,debug,info,warn,error};

use types::*;
use directory::{Directory,Entry,Slot};
use vtoc::Vtoc;
use pack::*;
pub use format::{DosVariant,DiskFormat};
pub use boot::BootType;
pub use directory::{DirHandle,ROOT};
pub use display::DirListing;
pub use sync::{Transition,classify};
use crate::img::SectorStore;
use crate::vdrive::observer::Observer;
use crate::{STDRESULT,DYNERR};

/// When to write PICONAME.TXT, the long name index read by MyPicoDos
#[derive(Clone,Copy,PartialEq,Eq,Debug,Default)]
pub enum PicoNameMode {
    Never,
    /// only if some host name did not survive the trip to 8.3
    #[default]
    Auto,
    Always
}

impl FromStr for PicoNameMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            _ => Err(Error::InvalidOption)
        }
    }
}

fn host_name(path: &Path) -> String {
    match path.file_name() {
        Some(n) => n.to_string_lossy().to_string(),
        None => path.to_string_lossy().to_string()
    }
}

/// The primary interface for disk operations.
pub struct Disk {
    fmt: DiskFormat,
    img: Box<dyn SectorStore>,
    dirs: Vec<Option<Directory>>,
    observer: Option<Observer>,
    boot_library: Option<PathBuf>
}

impl Disk {
    /// Create a file system using the given image as storage, the image is not touched
    /// until `format` is called.  The Disk takes ownership of the image.
    pub fn new(img: Box<dyn SectorStore>,dos: DosVariant) -> Result<Self,DYNERR> {
        let fmt = DiskFormat::new(dos,img.nominal_sector_length(),img.sector_count())?;
        Ok(Self {
            fmt,
            img,
            dirs: vec![Some(Directory::new(DIR_SECTOR,ENTRIES_PER_SECTOR,None))],
            observer: None,
            boot_library: None
        })
    }
    /// Open an image that already holds a DOS 2.x or MyDOS volume.
    pub fn from_img(mut img: Box<dyn SectorStore>) -> Result<Self,DYNERR> {
        let dos = match Self::test_img(img.as_mut()) {
            Some(dos) => dos,
            None => return Err(Box::new(Error::NotDos))
        };
        let mut ans = Self::new(img,dos)?;
        let per_sector = ans.detect_per_sector(DIR_SECTOR)?;
        ans.dirs = vec![Some(Directory::new(DIR_SECTOR,per_sector,None))];
        Ok(ans)
    }
    /// Test an image to see if it holds a DOS 2.x or MyDOS volume, and which.
    pub fn test_img(img: &mut dyn SectorStore) -> Option<DosVariant> {
        let count = img.sector_count();
        let len = img.nominal_sector_length();
        if count < MIN_SECTORS || (len!=128 && len!=256) {
            debug!("geometry {} x {} is not DOS 2",count,len);
            return None;
        }
        let vtoc = img.read_sector(VTOC_SECTOR).ok()?;
        let total = u16::from_le_bytes([vtoc[1],vtoc[2]]) as u32;
        match vtoc[0] {
            2 => {},
            code if code > 2 => {
                if code as u32 - 1 != vtoc::vtoc_sectors_needed(count,len) {
                    debug!("VTOC count {} does not match disk size",code-1);
                    return None;
                }
                return Some(DosVariant::MyDos);
            },
            code => {
                debug!("VTOC code {} is not DOS 2",code);
                return None;
            }
        }
        if count > ED_SECTORS || (len==256 && count > MIN_SECTORS) {
            return Some(DosVariant::MyDos);
        }
        for sec in DIR_SECTOR..DIR_SECTOR+DIR_SECTORS {
            if let Ok(buf) = img.read_sector(sec) {
                if buf.chunks(ENTRY_SIZE).take(ENTRIES_PER_SECTOR).any(|e| e[0] & status::DELETED==0 && e[0] & status::SUBDIR > 0) {
                    return Some(DosVariant::MyDos);
                }
            }
        }
        let dos2 = DiskFormat::new(DosVariant::Dos2x,len,count).ok()?.data_sector_total();
        let mydos = DiskFormat::new(DosVariant::MyDos,len,count).ok()?.data_sector_total();
        if total==mydos && total!=dos2 {
            return Some(DosVariant::MyDos);
        }
        Some(DosVariant::Dos2x)
    }
    /// Recompute the format for a different DOS, must be followed by `format`.
    pub fn set_dos_format(&mut self,dos: DosVariant) -> STDRESULT {
        self.fmt = DiskFormat::new(dos,self.img.nominal_sector_length(),self.img.sector_count())?;
        self.reset_tree();
        Ok(())
    }
    pub fn dos_format(&self) -> &DiskFormat {
        &self.fmt
    }
    pub fn get_img(&mut self) -> &mut dyn SectorStore {
        self.img.as_mut()
    }
    pub fn into_img(self) -> Box<dyn SectorStore> {
        self.img
    }
    /// Directory holding boot sector images for the DOS variants that are not built in
    pub fn set_boot_library(&mut self,path: Option<&Path>) {
        self.boot_library = path.map(|p| p.to_path_buf());
    }
    /// Bind the root directory to a host directory
    pub fn set_host_root(&mut self,path: &Path) -> STDRESULT {
        self.dir_mut(ROOT)?.host_root = Some(path.to_path_buf());
        Ok(())
    }
    /// Discard every directory but a fresh root, keeping the root's host binding
    fn reset_tree(&mut self) {
        let host_root = self.dirs.first().and_then(|d| d.as_ref()).and_then(|d| d.host_root.clone());
        let mut root = Directory::new(DIR_SECTOR,ENTRIES_PER_SECTOR,None);
        root.host_root = host_root;
        self.dirs = vec![Some(root)];
        if let Some(obs) = self.observer.as_mut() {
            obs.clear();
            obs.register(ROOT,DIR_SECTOR..DIR_SECTOR+DIR_SECTORS);
        }
    }
    /// Zero the VTOC and root directory, write the VTOC headers, free the data region,
    /// and install the default boot sectors.  Destroys existing content.
    pub fn format(&mut self) -> STDRESULT {
        let zeros = vec![0;self.fmt.sector_len];
        for sec in self.fmt.vtoc_sectors() {
            self.img.write_sector(sec,&zeros)?;
        }
        if self.fmt.is_dos25_enhanced_density {
            self.img.write_sector(VTOC2_SECTOR,&zeros)?;
        }
        for sec in DIR_SECTOR..DIR_SECTOR+DIR_SECTORS {
            self.img.write_sector(sec,&zeros)?;
        }
        let mut vtoc = Vtoc::blank(&self.fmt);
        vtoc.mark_sectors_free(1,self.fmt.sector_count);
        vtoc.save(self.img.as_mut())?;
        self.reset_tree();
        self.write_boot_sectors(BootType::default(),false)?;
        info!("formatted {} disk, {} sectors of {} bytes, {} free",self.fmt.dos,self.fmt.sector_count,
            self.fmt.sector_len,vtoc.free_count());
        Ok(())
    }
    fn dir(&self,h: DirHandle) -> Result<&Directory,Error> {
        match self.dirs.get(h.0) {
            Some(Some(d)) => Ok(d),
            _ => Err(Error::FileNotFound)
        }
    }
    fn dir_mut(&mut self,h: DirHandle) -> Result<&mut Directory,Error> {
        match self.dirs.get_mut(h.0) {
            Some(Some(d)) => Ok(d),
            _ => Err(Error::FileNotFound)
        }
    }
    /// Add a directory level to the arena and let the observer know about it
    fn new_dir(&mut self,first_sector: u32,per_sector: usize,parent: Option<(DirHandle,usize)>) -> DirHandle {
        let dir = Directory::new(first_sector,per_sector,parent);
        let h = DirHandle(self.dirs.len());
        if let Some(obs) = self.observer.as_mut() {
            obs.register(h,dir.sectors());
        }
        self.dirs.push(Some(dir));
        h
    }
    /// Forget a directory and all its subdirectories
    fn drop_directory(&mut self,h: DirHandle) {
        let children: Vec<DirHandle> = match self.dir(h) {
            Ok(d) => d.slots.iter().filter_map(|s| s.child).collect(),
            Err(_) => return
        };
        for child in children {
            self.drop_directory(child);
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.unregister(h);
        }
        self.dirs[h.0] = None;
        trace!("dropped directory {}",h.0);
    }
    /// Host directory bound to a directory level, if any
    pub fn host_path(&self,h: DirHandle) -> Option<PathBuf> {
        let dir = self.dir(h).ok()?;
        if let Some(root) = &dir.host_root {
            return Some(root.clone());
        }
        let (parent,slot) = dir.parent?;
        let name = self.dir(parent).ok()?.slots.get(slot)?.host_name.clone()?;
        Some(self.host_path(parent)?.join(name))
    }
    /// Entries per sector, 16 on MyDOS big images
    fn detect_per_sector(&mut self,first_sector: u32) -> Result<usize,DYNERR> {
        let buf = self.img.read_sector(first_sector)?;
        Ok(match self.fmt.sector_len==256 && buf.len() > BIG_DIR_SENTINEL && buf[BIG_DIR_SENTINEL]!=0 {
            true => BIG_ENTRIES_PER_SECTOR,
            false => ENTRIES_PER_SECTOR
        })
    }
    fn read_entry(&mut self,h: DirHandle,slot: usize) -> Result<Entry,DYNERR> {
        let (sec,offset) = self.dir(h)?.locate(slot);
        let buf = self.img.read_sector(sec)?;
        Ok(Entry::from_bytes(&buf[offset..])?)
    }
    fn write_entry(&mut self,h: DirHandle,slot: usize,entry: &Entry) -> STDRESULT {
        let (sec,offset) = self.dir(h)?.locate(slot);
        let mut buf = self.img.read_sector(sec)?;
        buf[offset..offset+ENTRY_SIZE].copy_from_slice(&entry.to_bytes()?);
        self.img.write_sector(sec,&buf)
    }
    /// Every slot of a directory, in order
    fn entries(&mut self,h: DirHandle) -> Result<Vec<Entry>,DYNERR> {
        let dir = self.dir(h)?;
        let (sectors,per_sector) = (dir.sectors(),dir.per_sector);
        let mut ans = Vec::new();
        for sec in sectors {
            let buf = self.img.read_sector(sec)?;
            for i in 0..per_sector {
                ans.push(Entry::from_bytes(&buf[i*ENTRY_SIZE..])?);
            }
        }
        Ok(ans)
    }
    /// Find a live entry by its 8.3 name, DOS stops looking at the first never used slot
    fn find_entry(&mut self,h: DirHandle,fname: &[u8;11]) -> Result<Option<(usize,Entry)>,DYNERR> {
        let ed = self.fmt.is_dos25_enhanced_density;
        Ok(self.entries(h)?.into_iter().enumerate()
            .take_while(|(_,e)| e.status!=0)
            .find(|(_,e)| e.is_in_use(ed) && e.name==*fname))
    }
    /// Claim the first free slot and write a placeholder entry with the new short name.
    /// Returns the slot, the name, and the prior entry for rollback.
    fn claim_slot(&mut self,h: DirHandle,long_name: &str) -> Result<(usize,[u8;11],Entry),DYNERR> {
        let ed = self.fmt.is_dos25_enhanced_density;
        let entries = self.entries(h)?;
        let existing: Vec<[u8;11]> = entries.iter()
            .take_while(|e| e.status!=0)
            .filter(|e| e.is_in_use(ed))
            .map(|e| e.name).collect();
        let slot = match entries.iter().position(|e| e.is_free()) {
            Some(s) => s,
            None => {
                error!("no room for {} in directory",long_name);
                return Err(Box::new(Error::DirectoryFull));
            }
        };
        let name = build_atari_name(long_name,self.fmt.dos,&existing)?;
        let placeholder = Entry {
            status: status::OPENING,
            sector_count: 0,
            start_sector: 0,
            name
        };
        self.write_entry(h,slot,&placeholder)?;
        Ok((slot,name,entries[slot]))
    }
    /// Add an entry for `long_name` to the directory, returns the slot and short name.
    /// The entry is left in the opening state.
    pub fn add_entry(&mut self,h: DirHandle,long_name: &str) -> Result<(usize,[u8;11]),DYNERR> {
        let (slot,name,_) = self.claim_slot(h,long_name)?;
        Ok((slot,name))
    }
    /// Write `dat` as a new file named after `long_name`.  On failure nothing is left
    /// behind, neither the entry nor the sectors.
    pub fn add_buffer(&mut self,h: DirHandle,long_name: &str,dat: &[u8]) -> Result<(usize,[u8;11]),DYNERR> {
        let mut dat = dat;
        if dat.len() > MAX_FILE_LEN {
            warn!("{} truncated from {} to {} bytes",long_name,dat.len(),MAX_FILE_LEN);
            dat = &dat[0..MAX_FILE_LEN];
        }
        let dlen = self.fmt.data_len();
        let count = usize::max(1,(dat.len() + dlen - 1) / dlen);
        let mut vtoc = Vtoc::load(self.img.as_mut(),&self.fmt)?;
        if vtoc.free_count() < count {
            error!("{} needs {} sectors, {} free",long_name,count,vtoc.free_count());
            return Err(Box::new(Error::DiskFull));
        }
        let (slot,name,prev) = self.claim_slot(h,long_name)?;
        let sectors = match vtoc.alloc_sectors(count,false) {
            Some(s) => s,
            None => {
                self.write_entry(h,slot,&prev)?;
                return Err(Box::new(Error::DiskFull));
            }
        };
        vtoc.save(self.img.as_mut())?;
        if let Err(e) = self.write_chain(&sectors,dat,slot) {
            error!("could not write {}, rolling back",long_name);
            vtoc.release_sectors(&sectors);
            vtoc.save(self.img.as_mut())?;
            self.write_entry(h,slot,&prev)?;
            return Err(e);
        }
        let mut stat = status::CLOSED;
        if self.fmt.use_16bit_sector_links {
            stat |= status::LINK16;
        }
        if self.fmt.is_dos25_enhanced_density && sectors.iter().any(|s| *s >= ED_SPLIT) {
            stat = status::CLOSED_ED;
        }
        self.write_entry(h,slot,&Entry {
            status: stat,
            sector_count: count as u16,
            start_sector: sectors[0] as u16,
            name
        })?;
        info!("added {} as {}, {} sectors from {}",long_name,file_name_to_string(name),count,sectors[0]);
        Ok((slot,name))
    }
    /// Copy a host file into the directory
    pub fn add_file(&mut self,h: DirHandle,path: &Path) -> Result<(usize,[u8;11]),DYNERR> {
        let long_name = host_name(path);
        let dat = std::fs::read(path)?;
        let (slot,name) = self.add_buffer(h,&long_name,&dat)?;
        self.dir_mut(h)?.slots[slot] = Slot {
            host_name: Some(long_name),
            child: None
        };
        Ok((slot,name))
    }
    /// Create a MyDOS subdirectory for the host directory at `path` and fill it
    pub fn add_directory(&mut self,h: DirHandle,path: &Path,pico: PicoNameMode) -> Result<DirHandle,DYNERR> {
        let (_,_,child) = self.add_directory_entry(h,path,pico)?;
        Ok(child)
    }
    fn add_directory_entry(&mut self,h: DirHandle,path: &Path,pico: PicoNameMode) -> Result<(usize,[u8;11],DirHandle),DYNERR> {
        if self.fmt.dos!=DosVariant::MyDos {
            error!("subdirectories need MyDOS");
            return Err(Box::new(Error::RequiresMyDos));
        }
        let long_name = host_name(path);
        let mut vtoc = Vtoc::load(self.img.as_mut(),&self.fmt)?;
        if vtoc.free_count() < DIR_SECTORS as usize {
            error!("no room for directory {}",long_name);
            return Err(Box::new(Error::DiskFull));
        }
        let (slot,name,prev) = self.claim_slot(h,&long_name)?;
        let sectors = match vtoc.alloc_sectors(DIR_SECTORS as usize,true) {
            Some(s) => s,
            None => {
                error!("no run of {} free sectors for directory {}",DIR_SECTORS,long_name);
                self.write_entry(h,slot,&prev)?;
                return Err(Box::new(Error::DiskFull));
            }
        };
        vtoc.save(self.img.as_mut())?;
        let zeros = vec![0;self.fmt.sector_len];
        for sec in &sectors {
            if let Err(e) = self.img.write_sector(*sec,&zeros) {
                vtoc.release_sectors(&sectors);
                vtoc.save(self.img.as_mut())?;
                self.write_entry(h,slot,&prev)?;
                return Err(e);
            }
        }
        self.write_entry(h,slot,&Entry {
            status: status::SUBDIR,
            sector_count: DIR_SECTORS as u16,
            start_sector: sectors[0] as u16,
            name
        })?;
        let unbound = self.host_path(h).is_none();
        self.dir_mut(h)?.slots[slot] = Slot {
            host_name: Some(long_name.clone()),
            child: None
        };
        let child = self.new_dir(sectors[0],ENTRIES_PER_SECTOR,Some((h,slot)));
        self.dir_mut(h)?.slots[slot].child = Some(child);
        if unbound {
            self.dir_mut(child)?.host_root = Some(path.to_path_buf());
        }
        info!("added directory {} as {} at sector {}",long_name,file_name_to_string(name),sectors[0]);
        self.add_files(child,pico)?;
        Ok((slot,name,child))
    }
    /// Copy everything in the bound host directory, in name order.  Problems with
    /// individual files are logged and skipped.
    pub fn add_files(&mut self,h: DirHandle,pico: PicoNameMode) -> STDRESULT {
        let host = match self.host_path(h) {
            Some(p) => p,
            None => return Err(Box::new(Error::NoHostPath))
        };
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&host)?.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();
        let mut names: Vec<(String,[u8;11])> = Vec::new();
        let mut host_pico = None;
        for path in paths {
            let long_name = host_name(&path);
            if long_name==PICONAME && path.is_file() {
                host_pico = Some(path);
                continue;
            }
            if path.is_dir() {
                if self.fmt.dos!=DosVariant::MyDos {
                    debug!("skipping directory {}",long_name);
                    continue;
                }
                match self.add_directory_entry(h,&path,pico) {
                    Ok((_,name,_)) => names.push((long_name,name)),
                    Err(e) => error!("{}: {}",long_name,e)
                }
            } else if path.is_file() {
                match self.add_file(h,&path) {
                    Ok((_,name)) => names.push((long_name,name)),
                    Err(e) => error!("{}: {}",long_name,e)
                }
            }
        }
        let lossy = names.iter().any(|(long,short)| *long!=file_name_to_string(*short));
        let write_pico = match pico {
            PicoNameMode::Never => false,
            PicoNameMode::Auto => lossy,
            PicoNameMode::Always => true
        };
        if write_pico {
            if host_pico.is_some() {
                debug!("host {} is regenerated",PICONAME);
            }
            let dat = piconame_bytes(&host_name(&host),&names);
            self.add_buffer(h,PICONAME,&dat)?;
        } else if let Some(path) = host_pico {
            if let Err(e) = self.add_file(h,&path) {
                error!("{}: {}",PICONAME,e);
            }
        }
        Ok(())
    }
    /// Write the sector chain of a file, `slot` becomes the file number on 10-bit link disks
    fn write_chain(&mut self,sectors: &[u32],dat: &[u8],slot: usize) -> STDRESULT {
        let len = self.fmt.sector_len;
        let dlen = self.fmt.data_len();
        for (i,sec) in sectors.iter().enumerate() {
            let beg = usize::min(i*dlen,dat.len());
            let end = usize::min((i+1)*dlen,dat.len());
            let next = sectors.get(i+1).copied().unwrap_or(0);
            let mut buf = vec![0;len];
            buf[0..end-beg].copy_from_slice(&dat[beg..end]);
            buf[len-3] = match self.fmt.use_16bit_sector_links {
                true => (next >> 8) as u8,
                false => (((slot & 0x3f) as u8) << 2) | ((next >> 8) & 0x03) as u8
            };
            buf[len-2] = (next & 0xff) as u8;
            buf[len-1] = (end-beg) as u8;
            self.img.write_sector(*sec,&buf)?;
        }
        Ok(())
    }
    /// Follow a sector chain and gather the payload.  `file_no` is checked against
    /// each sector when 10-bit links are in use.
    pub fn read_chain(&mut self,start: u32,use_16bit_links: bool,file_no: Option<usize>) -> Result<Vec<u8>,DYNERR> {
        let count = self.img.sector_count();
        let mut visited = bit_vec::BitVec::from_elem(count as usize + 1,false);
        let mut ans = Vec::new();
        let mut sec = start;
        while sec!=0 {
            if sec > count || sec <= BOOT_SECTORS {
                error!("link to sector {} is out of range",sec);
                return Err(Box::new(Error::LinkRange));
            }
            if visited.get(sec as usize)==Some(true) {
                error!("sector {} appears twice in chain starting at {}",sec,start);
                return Err(Box::new(Error::ChainLoop));
            }
            visited.set(sec as usize,true);
            let buf = self.img.read_sector(sec)?;
            let len = buf.len();
            let (hi,lo,bytes) = (buf[len-3] as u32,buf[len-2] as u32,buf[len-1] as usize);
            let next = match use_16bit_links {
                true => (hi << 8) | lo,
                false => {
                    if let Some(n) = file_no {
                        if ((hi >> 2) as usize) != (n & 0x3f) {
                            error!("sector {} belongs to file {}, expected {}",sec,hi >> 2,n);
                            return Err(Box::new(Error::FileNumberMismatch));
                        }
                    }
                    ((hi & 0x03) << 8) | lo
                }
            };
            if bytes > len - 3 {
                error!("sector {} claims {} bytes",sec,bytes);
                return Err(Box::new(Error::ByteCount));
            }
            ans.extend_from_slice(&buf[0..bytes]);
            sec = next;
        }
        Ok(ans)
    }
    /// Read a file by its display name, e.g. `DOS.SYS`
    pub fn read_file(&mut self,h: DirHandle,name: &str) -> Result<Vec<u8>,DYNERR> {
        let fname = string_to_file_name(name).ok_or(Error::FileNotFound)?;
        let (slot,entry) = match self.find_entry(h,&fname)? {
            Some((slot,entry)) if !entry.is_dir() => (slot,entry),
            _ => return Err(Box::new(Error::FileNotFound))
        };
        let use16 = entry.uses_16bit_links();
        self.read_chain(entry.start_sector as u32,use16,match use16 { true => None, false => Some(slot) })
    }
    /// Manager of an existing subdirectory, created on first access
    pub fn subdir(&mut self,parent: DirHandle,name: &str) -> Result<DirHandle,DYNERR> {
        let fname = string_to_file_name(name).ok_or(Error::FileNotFound)?;
        match self.find_entry(parent,&fname)? {
            Some((slot,entry)) if entry.is_dir() => self.open_child(parent,slot,&entry),
            _ => Err(Box::new(Error::FileNotFound))
        }
    }
    fn open_child(&mut self,parent: DirHandle,slot: usize,entry: &Entry) -> Result<DirHandle,DYNERR> {
        if let Some(child) = self.dir(parent)?.slots[slot].child {
            return Ok(child);
        }
        let per_sector = self.detect_per_sector(entry.start_sector as u32)?;
        let binding = self.dir_mut(parent)?;
        if binding.slots[slot].host_name.is_none() {
            binding.slots[slot].host_name = Some(file_name_to_string(entry.name));
        }
        let child = self.new_dir(entry.start_sector as u32,per_sector,Some((parent,slot)));
        self.dir_mut(parent)?.slots[slot].child = Some(child);
        debug!("opened subdirectory {} at sector {}",file_name_to_string(entry.name),entry.start_sector);
        Ok(child)
    }
    /// Open every subdirectory below `h`.  A subdirectory that cannot be read, or that
    /// points back into the tree, is logged and left closed.
    pub fn open_tree(&mut self,h: DirHandle) -> STDRESULT {
        let mut visited = bit_vec::BitVec::from_elem(self.fmt.sector_count as usize + 1,false);
        for dir in self.dirs.iter().flatten() {
            if (dir.first_sector as usize) < visited.len() {
                visited.set(dir.first_sector as usize,true);
            }
        }
        self.open_tree_from(h,&mut visited)
    }
    fn open_tree_from(&mut self,h: DirHandle,visited: &mut bit_vec::BitVec) -> STDRESULT {
        let first = self.dir_sector(h)?;
        let subdirs: Vec<(usize,Entry)> = self.get_dos2_directory(first)?.entries.iter()
            .filter(|e| e.entry.is_dir())
            .map(|e| (e.slot,e.entry))
            .collect();
        for (slot,entry) in subdirs {
            let start = entry.start_sector as usize;
            let known = self.dir(h)?.slots.get(slot).and_then(|s| s.child).is_some();
            if !known {
                match visited.get(start) {
                    Some(false) => visited.set(start,true),
                    Some(true) => {
                        error!("subdirectory {} at sector {} is already in the tree",file_name_to_string(entry.name),start);
                        continue;
                    },
                    None => {
                        error!("subdirectory {} starts at sector {} which is not on the disk",file_name_to_string(entry.name),start);
                        continue;
                    }
                }
            }
            match self.open_child(h,slot,&entry) {
                Ok(child) => self.open_tree_from(child,visited)?,
                Err(e) => error!("could not open subdirectory {}: {}",file_name_to_string(entry.name),e)
            }
        }
        Ok(())
    }
    /// Resolve a path like `GAMES/ACTION/FROGS.COM` into the directory and the final name
    pub fn resolve(&mut self,path: &str) -> Result<(DirHandle,String),DYNERR> {
        let parts: Vec<&str> = path.split(['/','>',':']).filter(|s| !s.is_empty()).collect();
        let mut h = ROOT;
        match parts.split_last() {
            Some((last,dirs)) => {
                for d in dirs {
                    h = self.subdir(h,d)?;
                }
                Ok((h,last.to_string()))
            },
            None => Ok((ROOT,String::new()))
        }
    }
    /// First sector of a directory level
    pub fn dir_sector(&self,h: DirHandle) -> Result<u32,DYNERR> {
        Ok(self.dir(h)?.first_sector)
    }
    /// Working copy of the VTOC as it is on the disk
    pub fn vtoc(&mut self) -> Result<Vtoc,DYNERR> {
        Vtoc::load(self.img.as_mut(),&self.fmt)
    }
    pub fn free_sectors(&mut self) -> Result<usize,DYNERR> {
        Ok(self.vtoc()?.free_count())
    }
    /// Install boot sectors, pointing them at the DOS file in the root directory.
    /// Falls back to the default boot sectors if the DOS file is missing, the
    /// boot type does not fit this disk, or its image is not in the boot library.
    pub fn write_boot_sectors(&mut self,boot: BootType,autorun: bool) -> STDRESULT {
        let mut boot = boot;
        if !boot.fits(&self.fmt) {
            warn!("{} cannot boot this {} disk, using default boot sectors",boot.label(),self.fmt.dos);
            boot = BootType::default();
        }
        let mut start = None;
        if let Some(fname) = boot.dos_file() {
            let listing = self.get_dos2_directory(DIR_SECTOR)?;
            match listing.find(&fname) {
                Some(e) if !e.entry.is_dir() => start = Some(e.entry.start_sector as u32),
                _ => {
                    warn!("{} not found, using default boot sectors",file_name_to_string(fname));
                    boot = BootType::default();
                }
            }
        }
        let dat = match boot.render(&self.fmt,start,autorun,self.boot_library.as_deref()) {
            Ok(dat) => dat,
            Err(e) => {
                warn!("{} boot sectors unavailable ({}), using default boot sectors",boot.label(),e);
                boot = BootType::default();
                BootType::default().render(&self.fmt,None,false,None)?
            }
        };
        for (i,chunk) in dat.chunks(BOOT_SECTOR_LEN).enumerate() {
            self.img.write_sector(i as u32 + 1,chunk)?;
        }
        info!("boot sectors set up for {}",boot.label());
        Ok(())
    }
    /// Parse the directory starting at `dir_sector` into a listing
    pub fn get_dos2_directory(&mut self,dir_sector: u32) -> Result<DirListing,DYNERR> {
        let ed = self.fmt.is_dos25_enhanced_density;
        let per_sector = self.detect_per_sector(dir_sector)?;
        let mut entries = Vec::new();
        'scan: for i in 0..DIR_SECTORS {
            let buf = self.img.read_sector(dir_sector + i)?;
            for j in 0..per_sector {
                let entry = Entry::from_bytes(&buf[j*ENTRY_SIZE..])?;
                if entry.status==0 {
                    break 'scan;
                }
                if entry.status & status::DELETED > 0 {
                    continue;
                }
                if !entry.is_in_use(ed) {
                    warn!("skipping slot {} with status {:02X}",i as usize*per_sector + j,entry.status);
                    continue;
                }
                entries.push(display::ListEntry {
                    slot: i as usize*per_sector + j,
                    entry
                });
            }
        }
        Ok(DirListing {
            dir_sector,
            big_dir: per_sector==BIG_ENTRIES_PER_SECTOR,
            entries,
            free_sectors: self.free_sectors()?
        })
    }
    /// Listing of a directory level
    pub fn catalog(&mut self,h: DirHandle) -> Result<DirListing,DYNERR> {
        let sec = self.dir_sector(h)?;
        self.get_dos2_directory(sec)
    }
    /// Start watching directory sectors.  Every subdirectory on the disk is opened
    /// first, so that each directory level is registered.
    pub fn attach_observer(&mut self) -> STDRESULT {
        if self.fmt.dos==DosVariant::MyDos {
            self.open_tree(ROOT)?;
        }
        let mut obs = Observer::new(self.img.sector_count());
        for (i,dir) in self.dirs.iter().enumerate() {
            if let Some(d) = dir {
                obs.register(DirHandle(i),d.sectors());
            }
        }
        self.observer = Some(obs);
        Ok(())
    }
    pub fn detach_observer(&mut self) {
        self.observer = None;
    }
    pub fn observer(&self) -> Option<&Observer> {
        self.observer.as_ref()
    }
}
