use clap;
use std::path::Path;
use std::str::FromStr;
use log::{info,error};
use crate::fs::dos2::{Disk,DosVariant,BootType};
use crate::img::atr::Atr;
use crate::vdrive::Density;
use super::CommandError;
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn mkdsk(cmd: &clap::ArgMatches) -> STDRESULT {
    let dos = DosVariant::from_str(cmd.get_one::<String>("os").expect(RCH))?;
    let boot = BootType::from_str(cmd.get_one::<String>("boot").expect(RCH))?;
    let img_path = cmd.get_one::<String>("dimg").expect(RCH);
    super::check_destination(img_path,cmd.get_flag("force"))?;
    let (sectors,sector_len) = match Density::from_str(cmd.get_one::<String>("kind").expect(RCH))? {
        Density::Single => (720,128),
        Density::Enhanced => (1040,128),
        Density::Double => (720,256),
        Density::Custom { sectors, sector_len } => (sectors,sector_len),
        Density::Auto => {
            error!("a blank disk needs an explicit kind");
            return Err(Box::new(CommandError::InvalidCommand));
        }
    };
    let img = Atr::create(sectors,sector_len)?;
    let mut disk = Disk::new(Box::new(img),dos)?;
    if let Some(dir) = cmd.get_one::<String>("bootlib") {
        disk.set_boot_library(Some(Path::new(dir)));
    }
    disk.format()?;
    if boot!=BootType::NoDos {
        disk.write_boot_sectors(boot,false)?;
    }
    crate::save_img(&mut disk,img_path)?;
    info!("wrote {} with {} free sectors",img_path,disk.free_sectors()?);
    Ok(())
}
