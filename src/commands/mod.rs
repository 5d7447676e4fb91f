//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod mkdsk;
pub mod mkatr;
pub mod estimate;
pub mod put;
pub mod get;
pub mod catalog;
pub mod completions;

use std::str::FromStr;
use log::error;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Item type is unknown")]
    UnknownItemType,
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("One of the parameters was out of range")]
    OutOfRange,
    #[error("Destination already exists")]
    AlreadyExists
}

/// Kinds of things `get` and `put` can move
#[derive(PartialEq,Clone,Copy,Debug)]
pub enum ItemType {
    File,
    Sector
}

impl FromStr for ItemType {
    type Err = CommandError;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "sec" => Ok(Self::Sector),
            _ => Err(CommandError::UnknownItemType)
        }
    }
}

/// Parse a sector request such as `360`, `361..369`, or `1,360..362`.
/// Ranges exclude the upper bound.
pub fn parse_sector_request(req: &str) -> Result<Vec<u32>,CommandError> {
    let mut ans = Vec::new();
    for part in req.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        match part.split_once("..") {
            Some((beg,end)) => {
                let (beg,end) = match (u32::from_str(beg),u32::from_str(end)) {
                    (Ok(b),Ok(e)) if b < e => (b,e),
                    _ => {
                        error!("bad sector range {}",part);
                        return Err(CommandError::OutOfRange);
                    }
                };
                ans.extend(beg..end);
            },
            None => match u32::from_str(part) {
                Ok(s) => ans.push(s),
                Err(_) => {
                    error!("bad sector {}",part);
                    return Err(CommandError::InvalidCommand);
                }
            }
        }
    }
    if ans.is_empty() {
        return Err(CommandError::InvalidCommand);
    }
    Ok(ans)
}

/// Refuse to clobber an existing image unless forced
pub fn check_destination(path: &str,force: bool) -> Result<(),CommandError> {
    if !force && std::path::Path::new(path).exists() {
        error!("{} already exists, use --force to overwrite",path);
        return Err(CommandError::AlreadyExists);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_requests() {
        assert_eq!(parse_sector_request("360").unwrap(),vec![360]);
        assert_eq!(parse_sector_request("361..364").unwrap(),vec![361,362,363]);
        assert_eq!(parse_sector_request("1,360..362").unwrap(),vec![1,360,361]);
        assert!(parse_sector_request("5..5").is_err());
        assert!(parse_sector_request("abc").is_err());
        assert!(parse_sector_request("").is_err());
    }
}
