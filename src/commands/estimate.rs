use clap;
use std::path::Path;
use std::str::FromStr;
use crate::fs::dos2::estimate::estimate_disk_size;
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn estimate(cmd: &clap::ArgMatches) -> STDRESULT {
    let src = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let sector_len = usize::from_str(cmd.get_one::<String>("len").expect(RCH))?;
    let opts = super::mkatr::mount_options(cmd)?;
    let sectors = estimate_disk_size(src,sector_len,opts.piconame,opts.boot,opts.dos)?;
    println!("{}",sectors);
    Ok(())
}
