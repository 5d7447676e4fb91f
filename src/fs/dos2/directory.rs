//! ### Directory structures
//!
//! The 16 byte directory entry is handled with `binrw`.  The `Directory` is the
//! bookkeeping for one directory level: where its 8 sectors are, how entries are
//! packed into them, and which host file or subtree goes with each slot.
//! Directory objects live in an arena owned by `Disk` and refer to each other by
//! `DirHandle`, the observer only ever holds handles.

use binrw::{BinRead,BinWrite};
use binrw::io::Cursor;
use log::debug;
use super::types::*;

/// Index of a directory level within the arena of its `Disk`
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug)]
pub struct DirHandle(pub usize);

/// The root directory is always the first directory created
pub const ROOT: DirHandle = DirHandle(0);

#[derive(BinRead,BinWrite,Clone,Copy,PartialEq,Eq,Debug,Default)]
#[brw(little)]
pub struct Entry {
    pub status: u8,
    pub sector_count: u16,
    pub start_sector: u16,
    pub name: [u8;11]
}

impl Entry {
    pub fn from_bytes(dat: &[u8]) -> Result<Self,Error> {
        if dat.len() < ENTRY_SIZE {
            return Err(Error::BadEntry);
        }
        Self::read(&mut Cursor::new(&dat[0..ENTRY_SIZE])).map_err(|e| {
            debug!("entry rejected: {}",e);
            Error::BadEntry
        })
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>,Error> {
        let mut cur = Cursor::new(Vec::with_capacity(ENTRY_SIZE));
        self.write(&mut cur).map_err(|e| {
            debug!("entry not written: {}",e);
            Error::BadEntry
        })?;
        Ok(cur.into_inner())
    }
    /// Slot can be claimed by a new entry
    pub fn is_free(&self) -> bool {
        self.status==0 || self.status & status::DELETED > 0
    }
    pub fn is_dir(&self) -> bool {
        self.status & status::DELETED == 0 && self.status & status::SUBDIR > 0
    }
    /// Entry refers to a live file or directory, the DOS 2.5 pattern is only honored on ED disks
    pub fn is_in_use(&self,enhanced: bool) -> bool {
        if self.status & status::DELETED > 0 {
            return false;
        }
        self.status & (status::IN_USE | status::SUBDIR) > 0 || (enhanced && self.status==status::CLOSED_ED)
    }
    pub fn is_locked(&self) -> bool {
        self.status & status::LOCKED > 0
    }
    /// Chain of this file uses 16-bit links
    pub fn uses_16bit_links(&self) -> bool {
        self.status & status::LINK16 > 0
    }
}

/// Host side bindings of one directory slot
#[derive(Clone,Default,Debug)]
pub struct Slot {
    /// host file or directory name, relative to the directory's host path
    pub host_name: Option<String>,
    /// manager of the subdirectory in this slot, once it has been created
    pub child: Option<DirHandle>
}

/// One directory level of the disk, root or subdirectory.
#[derive(Clone,Debug)]
pub struct Directory {
    pub first_sector: u32,
    /// entries per directory sector, 8 except on MyDOS big images
    pub per_sector: usize,
    /// host directory of the root, subdirectories derive theirs through `parent`
    pub host_root: Option<std::path::PathBuf>,
    /// parent directory and the slot within it that holds this directory
    pub parent: Option<(DirHandle,usize)>,
    pub slots: Vec<Slot>
}

impl Directory {
    pub fn new(first_sector: u32,per_sector: usize,parent: Option<(DirHandle,usize)>) -> Self {
        Self {
            first_sector,
            per_sector,
            host_root: None,
            parent,
            slots: vec![Slot::default();per_sector * DIR_SECTORS as usize]
        }
    }
    pub fn sectors(&self) -> std::ops::Range<u32> {
        self.first_sector..self.first_sector + DIR_SECTORS
    }
    /// Number of entries this directory can hold
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    /// sector and byte offset of a slot
    pub fn locate(&self,slot: usize) -> (u32,usize) {
        (self.first_sector + (slot / self.per_sector) as u32,(slot % self.per_sector) * ENTRY_SIZE)
    }
}
