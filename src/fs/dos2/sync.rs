//! ### Mirroring Atari writes onto the host
//!
//! The SIO layer calls `before_sector_write` and `after_sector_write` around every
//! sector it writes, without knowing what the sector is.  If the sector belongs to a
//! directory, each entry in it is compared before and after, and the change in status
//! tells us what DOS just did:
//!
//! * in use → free: delete the host file or tree
//! * opening → closed: copy the file's sector chain to the host
//! * not a directory → directory: create the host directory
//! * same status, new name: rename the host file
//!
//! Anything else is logged and ignored.

use std::path::PathBuf;
use log::{debug,info,warn,error};
use super::Disk;
use super::directory::{DirHandle,Entry,Slot};
use super::pack::file_name_to_string;
use super::types::*;
use crate::{STDRESULT,DYNERR};

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum Transition {
    Unchanged,
    Delete,
    Close,
    MakeDir,
    Rename,
    Ignore
}

fn is_closed(stat: u8,enhanced: bool) -> bool {
    stat & !status::LINK16==status::CLOSED || (enhanced && stat==status::CLOSED_ED)
}

/// Decide what happened to one directory slot
pub fn classify(old: &Entry,new: &Entry,enhanced: bool) -> Transition {
    if old==new {
        return Transition::Unchanged;
    }
    let was_in_use = old.is_in_use(enhanced);
    if was_in_use && (new.status==0 || new.status & status::DELETED > 0) {
        return Transition::Delete;
    }
    if old.status & !status::LINK16==status::OPENING && is_closed(new.status,enhanced) {
        return Transition::Close;
    }
    if new.is_dir() && !old.is_dir() {
        return Transition::MakeDir;
    }
    if was_in_use && old.status==new.status && old.name!=new.name && (is_closed(new.status,enhanced) || new.is_dir()) {
        return Transition::Rename;
    }
    Transition::Ignore
}

impl Disk {
    /// Call before the Atari side writes a sector
    pub fn before_sector_write(&mut self,sector: u32) -> STDRESULT {
        let owned = match &self.observer {
            Some(obs) => obs.owner(sector).is_some(),
            None => false
        };
        if !owned {
            return Ok(());
        }
        let dat = self.img.read_sector(sector)?;
        if let Some(obs) = self.observer.as_mut() {
            obs.snapshot_before(sector,&dat);
        }
        Ok(())
    }
    /// Call after the Atari side wrote a sector, the host is brought in line with any
    /// change to the directory that owns it.
    pub fn after_sector_write(&mut self,sector: u32) -> STDRESULT {
        let owner = match &self.observer {
            Some(obs) => obs.owner(sector),
            None => None
        };
        let h = match owner {
            Some(h) => h,
            None => return Ok(())
        };
        let dat = self.img.read_sector(sector)?;
        let (old,new) = match self.observer.as_mut().and_then(|obs| obs.snapshot_after(sector,&dat)) {
            Some((old,new)) => (old.to_vec(),new.to_vec()),
            None => return Ok(())
        };
        self.indicate_sector_write(h,sector,&old,&new)
    }
    /// Compare the slots of a directory sector and act on each change.
    /// All slots are processed, the first failure is returned.
    pub fn indicate_sector_write(&mut self,h: DirHandle,sector: u32,old: &[u8],new: &[u8]) -> STDRESULT {
        let enhanced = self.fmt.is_dos25_enhanced_density;
        let (first,per_sector) = {
            let dir = self.dir(h)?;
            (dir.first_sector,dir.per_sector)
        };
        if sector < first || sector >= first + DIR_SECTORS {
            warn!("sector {} is not part of directory {}",sector,h.0);
            return Ok(());
        }
        let mut ans: STDRESULT = Ok(());
        for i in 0..per_sector {
            let offset = i*ENTRY_SIZE;
            if offset + ENTRY_SIZE > old.len() || offset + ENTRY_SIZE > new.len() {
                break;
            }
            let slot = (sector - first) as usize * per_sector + i;
            let before = Entry::from_bytes(&old[offset..])?;
            let after = Entry::from_bytes(&new[offset..])?;
            let result = match classify(&before,&after,enhanced) {
                Transition::Unchanged => Ok(()),
                Transition::Delete => self.mirror_delete(h,slot,&before),
                Transition::Close => self.mirror_close(h,slot,&before,&after),
                Transition::MakeDir => self.mirror_mkdir(h,slot,&after),
                Transition::Rename => self.mirror_rename(h,slot,&before,&after),
                Transition::Ignore => {
                    debug!("ignoring slot {} going from {:02X} to {:02X}",slot,before.status,after.status);
                    Ok(())
                }
            };
            if let Err(e) = result {
                error!("could not mirror slot {}: {}",slot,e);
                if ans.is_ok() {
                    ans = Err(e);
                }
            }
        }
        ans
    }
    /// Host path of whatever is in the slot, falling back to the 8.3 name
    fn slot_path(&self,h: DirHandle,slot: usize,entry: &Entry) -> Result<PathBuf,DYNERR> {
        let base = match self.host_path(h) {
            Some(p) => p,
            None => return Err(Box::new(Error::NoHostPath))
        };
        let name = match self.dir(h)?.slots.get(slot).and_then(|s| s.host_name.clone()) {
            Some(n) => n,
            None => file_name_to_string(entry.name)
        };
        Ok(base.join(name))
    }
    fn mirror_delete(&mut self,h: DirHandle,slot: usize,old: &Entry) -> STDRESULT {
        let path = self.slot_path(h,slot,old)?;
        let child = self.dir(h)?.slots[slot].child;
        if let Some(child) = child {
            self.drop_directory(child);
        }
        self.dir_mut(h)?.slots[slot] = Slot::default();
        if path.is_dir() {
            info!("removing host directory {}",path.display());
            std::fs::remove_dir_all(&path)?;
        } else if path.exists() {
            info!("removing host file {}",path.display());
            std::fs::remove_file(&path)?;
        } else {
            warn!("{} was already gone",path.display());
        }
        Ok(())
    }
    fn mirror_close(&mut self,h: DirHandle,slot: usize,old: &Entry,new: &Entry) -> STDRESULT {
        // keep the long name if the file is being rewritten under the same short name
        if old.name!=new.name {
            self.dir_mut(h)?.slots[slot].host_name = None;
        }
        let path = self.slot_path(h,slot,new)?;
        self.write_atari_file_to_disk(&path,new.start_sector as u32,new.uses_16bit_links(),slot)?;
        self.dir_mut(h)?.slots[slot].host_name = path.file_name().map(|n| n.to_string_lossy().to_string());
        Ok(())
    }
    fn mirror_mkdir(&mut self,h: DirHandle,slot: usize,new: &Entry) -> STDRESULT {
        let old_child = self.dir(h)?.slots[slot].child;
        if let Some(old_child) = old_child {
            self.drop_directory(old_child);
        }
        self.dir_mut(h)?.slots[slot] = Slot {
            host_name: Some(file_name_to_string(new.name)),
            child: None
        };
        let path = self.slot_path(h,slot,new)?;
        info!("creating host directory {}",path.display());
        std::fs::create_dir_all(&path)?;
        let child = self.new_dir(new.start_sector as u32,ENTRIES_PER_SECTOR,Some((h,slot)));
        self.dir_mut(h)?.slots[slot].child = Some(child);
        Ok(())
    }
    fn mirror_rename(&mut self,h: DirHandle,slot: usize,old: &Entry,new: &Entry) -> STDRESULT {
        let from = self.slot_path(h,slot,old)?;
        let name = file_name_to_string(new.name);
        let to = from.with_file_name(&name);
        info!("renaming {} to {}",from.display(),to.display());
        std::fs::rename(&from,&to)?;
        self.dir_mut(h)?.slots[slot].host_name = Some(name);
        Ok(())
    }
    /// Walk the chain starting at `start` and write its payload to a host file.
    /// The host file is only written if the whole chain could be read.
    pub fn write_atari_file_to_disk(&mut self,host_path: &std::path::Path,start: u32,use_16bit_links: bool,slot: usize) -> STDRESULT {
        let file_no = match use_16bit_links {
            true => None,
            false => Some(slot)
        };
        let dat = self.read_chain(start,use_16bit_links,file_no)?;
        info!("writing {} bytes to {}",dat.len(),host_path.display());
        std::fs::write(host_path,&dat)?;
        Ok(())
    }
}
