use clap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use log::{info,error};
use super::{ItemType,CommandError};
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn put(cmd: &clap::ArgMatches) -> STDRESULT {
    if atty::is(atty::Stream::Stdin) {
        error!("cannot use `put` with console input, please pipe something in");
        return Err(Box::new(CommandError::InvalidCommand));
    }
    let dest_path = cmd.get_one::<String>("file").expect(RCH);
    let img_path = cmd.get_one::<String>("dimg").expect(RCH);
    let typ = ItemType::from_str(cmd.get_one::<String>("type").expect(RCH))?;
    let mut file_data = Vec::new();
    std::io::stdin().read_to_end(&mut file_data)?;
    let mut disk = crate::create_fs_from_file(img_path)?;
    match typ {
        ItemType::Sector => {
            if let Some(mirror) = cmd.get_one::<String>("mirror") {
                disk.set_host_root(Path::new(mirror))?;
                disk.attach_observer()?;
            }
            let sectors = super::parse_sector_request(dest_path)?;
            for sec in &sectors {
                if *sec < 1 || *sec > disk.get_img().sector_count() {
                    error!("sector {} is not on this disk",sec);
                    return Err(Box::new(CommandError::OutOfRange));
                }
            }
            // the sectors are written even if the host cannot keep up
            let mut mirror_err = None;
            let mut offset = 0;
            for sec in sectors {
                let len = disk.get_img().sector_length(sec);
                let end = usize::min(offset + len,file_data.len());
                let chunk = crate::img::quantize_sector(&file_data[usize::min(offset,end)..end],len);
                disk.before_sector_write(sec)?;
                disk.get_img().write_sector(sec,&chunk)?;
                if let Err(e) = disk.after_sector_write(sec) {
                    error!("host mirror failed after sector {}: {}",sec,e);
                    mirror_err.get_or_insert(e);
                }
                offset += len;
            }
            crate::save_img(&mut disk,img_path)?;
            return match mirror_err {
                Some(e) => Err(e),
                None => Ok(())
            };
        },
        ItemType::File => {
            if cmd.get_one::<String>("mirror").is_some() {
                error!("--mirror only applies to sector writes");
                return Err(Box::new(CommandError::InvalidCommand));
            }
            let (h,name) = disk.resolve(dest_path)?;
            let (_,short) = disk.add_buffer(h,&name,&file_data)?;
            info!("stored as {}",crate::fs::dos2::pack::file_name_to_string(short));
        }
    }
    crate::save_img(&mut disk,img_path)
}
