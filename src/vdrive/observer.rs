//! ### Sector write observer
//!
//! Maps each sector of a virtual drive to the directory that owns it, if any, and
//! holds the before and after images of the sector being written.  The observer never
//! owns a directory, it only holds handles into the arena of the `Disk`.
//! Directories register when they are created and unregister when they are dropped.

use log::{trace,warn};
use crate::fs::dos2::directory::DirHandle;

pub struct Observer {
    sector_count: u32,
    owner_of_sector: Vec<Option<DirHandle>>,
    old_snapshot: Vec<u8>,
    new_snapshot: Vec<u8>,
    /// sector captured by the last `before` call, cleared by `after`
    pending: Option<u32>
}

impl Observer {
    pub fn new(sector_count: u32) -> Self {
        Self {
            sector_count,
            owner_of_sector: vec![None;sector_count as usize + 1],
            old_snapshot: Vec::new(),
            new_snapshot: Vec::new(),
            pending: None
        }
    }
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }
    /// Claim the sectors of a directory.  A sector already claimed is taken over,
    /// which happens when a subdirectory is recreated in the same place.
    pub fn register(&mut self,handle: DirHandle,sectors: std::ops::Range<u32>) {
        for sec in sectors {
            match self.owner_of_sector.get_mut(sec as usize) {
                Some(owner) => {
                    if let Some(prev) = owner {
                        if *prev!=handle {
                            warn!("sector {} moves from directory {} to {}",sec,prev.0,handle.0);
                        }
                    }
                    *owner = Some(handle);
                },
                None => warn!("directory sector {} is beyond the disk",sec)
            }
        }
        trace!("registered directory {}",handle.0);
    }
    /// Release every sector owned by the directory
    pub fn unregister(&mut self,handle: DirHandle) {
        for owner in self.owner_of_sector.iter_mut() {
            if *owner==Some(handle) {
                *owner = None;
            }
        }
        trace!("unregistered directory {}",handle.0);
    }
    pub fn clear(&mut self) {
        self.owner_of_sector.iter_mut().for_each(|o| *o = None);
        self.pending = None;
    }
    pub fn owner(&self,sector: u32) -> Option<DirHandle> {
        self.owner_of_sector.get(sector as usize).copied().flatten()
    }
    /// Keep the contents of an owned sector before it is overwritten
    pub fn snapshot_before(&mut self,sector: u32,dat: &[u8]) {
        self.old_snapshot.clear();
        self.old_snapshot.extend_from_slice(dat);
        self.pending = Some(sector);
    }
    /// Keep the new contents, returns the before and after images,
    /// or `None` if the before image of this sector was never taken.
    pub fn snapshot_after(&mut self,sector: u32,dat: &[u8]) -> Option<(&[u8],&[u8])> {
        self.new_snapshot.clear();
        self.new_snapshot.extend_from_slice(dat);
        match self.pending.take() {
            Some(s) if s==sector => Some((&self.old_snapshot,&self.new_snapshot)),
            _ => {
                warn!("no before image of sector {}",sector);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership() {
        let mut obs = Observer::new(720);
        obs.register(DirHandle(0),361..369);
        obs.register(DirHandle(1),400..408);
        assert_eq!(obs.owner(361),Some(DirHandle(0)));
        assert_eq!(obs.owner(407),Some(DirHandle(1)));
        assert_eq!(obs.owner(408),None);
        assert_eq!(obs.owner(9999),None);
        obs.unregister(DirHandle(1));
        assert_eq!(obs.owner(400),None);
        assert_eq!(obs.owner(368),Some(DirHandle(0)));
    }

    #[test]
    fn snapshots_pair_up() {
        let mut obs = Observer::new(720);
        obs.snapshot_before(361,&[1,2,3]);
        let (old,new) = obs.snapshot_after(361,&[1,2,4]).expect("no snapshot");
        assert_eq!(old,&[1,2,3]);
        assert_eq!(new,&[1,2,4]);
        assert!(obs.snapshot_after(361,&[0]).is_none());
    }
}
