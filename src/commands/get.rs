use clap;
use std::io::Write;
use std::str::FromStr;
use log::{debug,error};
use super::{ItemType,CommandError};
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

fn output_get(dat: &[u8],console: bool) -> STDRESULT {
    if console || atty::is(atty::Stream::Stdout) {
        crate::display_block(0,dat);
    } else {
        std::io::stdout().write_all(dat)?;
    }
    Ok(())
}

pub fn get(cmd: &clap::ArgMatches) -> STDRESULT {
    let src_path = cmd.get_one::<String>("file").expect(RCH);
    let img_path = cmd.get_one::<String>("dimg").expect(RCH);
    let typ = ItemType::from_str(cmd.get_one::<String>("type").expect(RCH))?;
    let console = cmd.get_flag("console");
    match typ {
        ItemType::Sector => {
            let mut img = crate::create_img_from_file(img_path)?;
            let mut cum = Vec::new();
            for sec in super::parse_sector_request(src_path)? {
                if sec < 1 || sec > img.sector_count() {
                    error!("sector {} is not on this disk",sec);
                    return Err(Box::new(CommandError::OutOfRange));
                }
                cum.append(&mut img.read_sector(sec)?);
            }
            output_get(&cum,console)
        },
        ItemType::File => {
            let mut disk = crate::create_fs_from_file(img_path)?;
            let (h,name) = disk.resolve(src_path)?;
            debug!("reading {} from directory at sector {}",name,disk.dir_sector(h)?);
            let dat = disk.read_file(h,&name)?;
            output_get(&dat,console)
        }
    }
}
