use clap;
use std::path::{Path,PathBuf};
use std::str::FromStr;
use log::info;
use crate::fs::dos2::{DosVariant,BootType};
use crate::vdrive::{self,Density,MountOptions,PicoNameMode};
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

/// Gather the mount options shared by `mkatr` and `estimate`
pub fn mount_options(cmd: &clap::ArgMatches) -> Result<MountOptions,crate::DYNERR> {
    let mut opts = MountOptions {
        dos: DosVariant::from_str(cmd.get_one::<String>("os").expect(RCH))?,
        boot: BootType::from_str(cmd.get_one::<String>("boot").expect(RCH))?,
        piconame: PicoNameMode::from_str(cmd.get_one::<String>("piconame").expect(RCH))?,
        ..MountOptions::default()
    };
    if let Ok(Some(kind)) = cmd.try_get_one::<String>("kind") {
        opts.density = Density::from_str(kind)?;
    }
    if let Ok(Some(dir)) = cmd.try_get_one::<String>("bootlib") {
        opts.boot_library = Some(PathBuf::from(dir));
    }
    if let Ok(Some(autorun)) = cmd.try_get_one::<bool>("autorun") {
        opts.autorun = *autorun;
    }
    Ok(opts)
}

pub fn mkatr(cmd: &clap::ArgMatches) -> STDRESULT {
    let src = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let img_path = cmd.get_one::<String>("dimg").expect(RCH);
    super::check_destination(img_path,cmd.get_flag("force"))?;
    let opts = mount_options(cmd)?;
    let mut disk = vdrive::build_disk(src,&opts)?;
    crate::save_img(&mut disk,img_path)?;
    info!("wrote {}, {} sectors free",img_path,disk.free_sectors()?);
    Ok(())
}
