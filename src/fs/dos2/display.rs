//! ### Directory listing
//!
//! Holds a parsed directory and renders it either the way DOS shows it on screen,
//! or as JSON for other programs.

use std::fmt;
use globset::GlobMatcher;
use super::directory::Entry;
use super::pack::file_name_to_string;

pub struct ListEntry {
    pub slot: usize,
    pub entry: Entry
}

impl ListEntry {
    /// Name in `BASE.EXT` form
    pub fn display_name(&self) -> String {
        file_name_to_string(self.entry.name)
    }
}

pub struct DirListing {
    pub dir_sector: u32,
    /// MyDOS big image directory, 16 entries per sector
    pub big_dir: bool,
    pub entries: Vec<ListEntry>,
    pub free_sectors: usize
}

impl DirListing {
    pub fn find(&self,fname: &[u8;11]) -> Option<&ListEntry> {
        self.entries.iter().find(|e| e.entry.name==*fname)
    }
    /// Keep only the entries whose display name matches the glob
    pub fn filter(&mut self,glob: &GlobMatcher) {
        self.entries.retain(|e| glob.is_match(e.display_name()));
    }
    pub fn to_json(&self,indent: Option<u16>) -> String {
        let mut files = json::JsonValue::new_array();
        for e in &self.entries {
            let mut obj = json::JsonValue::new_object();
            obj["name"] = json::JsonValue::String(e.display_name());
            obj["slot"] = e.slot.into();
            obj["status"] = format!("{:02X}",e.entry.status).into();
            obj["type"] = match e.entry.is_dir() { true => "dir", false => "file" }.into();
            obj["locked"] = e.entry.is_locked().into();
            obj["sectors"] = e.entry.sector_count.into();
            obj["start"] = e.entry.start_sector.into();
            // pushing onto an array cannot fail
            let _ = files.push(obj);
        }
        let mut root = json::JsonValue::new_object();
        root["dir_sector"] = self.dir_sector.into();
        root["big_dir"] = self.big_dir.into();
        root["free_sectors"] = self.free_sectors.into();
        root["files"] = files;
        match indent {
            Some(spaces) => json::stringify_pretty(root,spaces),
            None => json::stringify(root)
        }
    }
}

impl fmt::Display for DirListing {
    /// DOS style, e.g. `* DOS      SYS 039`, subdirectories marked with a colon
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            let lock = match e.entry.is_locked() { true => "*", false => " " };
            let dir = match e.entry.is_dir() { true => ":", false => " " };
            let base = String::from_utf8_lossy(&e.entry.name[0..8]).to_string();
            let ext = String::from_utf8_lossy(&e.entry.name[8..11]).to_string();
            writeln!(f,"{}{}{} {} {:03}",lock,dir,base,ext,e.entry.sector_count)?;
        }
        write!(f,"{:03} FREE SECTORS",self.free_sectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::dos2::types::status;

    fn listing() -> DirListing {
        DirListing {
            dir_sector: 361,
            big_dir: false,
            entries: vec![
                ListEntry { slot: 0, entry: Entry { status: status::CLOSED | status::LOCKED, sector_count: 39, start_sector: 4, name: *b"DOS     SYS" } },
                ListEntry { slot: 1, entry: Entry { status: status::SUBDIR, sector_count: 8, start_sector: 48, name: *b"GAMES      " } }
            ],
            free_sectors: 660
        }
    }

    #[test]
    fn dos_style() {
        let s = listing().to_string();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0],"* DOS      SYS 039");
        assert_eq!(lines[1]," :GAMES        008");
        assert_eq!(lines[2],"660 FREE SECTORS");
    }

    #[test]
    fn json_and_filter() {
        let mut l = listing();
        let parsed = json::parse(&l.to_json(None)).expect("bad json");
        assert_eq!(parsed["files"][1]["type"],"dir");
        assert_eq!(parsed["free_sectors"],660);
        l.filter(&globset::Glob::new("*.SYS").unwrap().compile_matcher());
        assert_eq!(l.entries.len(),1);
        assert!(l.find(b"DOS     SYS").is_some());
    }
}
