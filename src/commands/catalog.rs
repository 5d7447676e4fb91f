use clap;
use log::debug;
use crate::fs::dos2::ROOT;
use crate::STDRESULT;

const RCH: &str = "unreachable was reached";

pub fn catalog(cmd: &clap::ArgMatches) -> STDRESULT {
    let img_path = cmd.get_one::<String>("dimg").expect(RCH);
    let mut disk = crate::create_fs_from_file(img_path)?;
    let h = match cmd.get_one::<String>("file") {
        Some(path) => match disk.resolve(path)? {
            (_,last) if last.is_empty() => ROOT,
            (parent,last) => disk.subdir(parent,&last)?
        },
        None => ROOT
    };
    debug!("listing directory at sector {}",disk.dir_sector(h)?);
    let mut listing = disk.catalog(h)?;
    if let Some(patt) = cmd.get_one::<String>("filter") {
        let matcher = globset::Glob::new(&patt.to_uppercase())?.compile_matcher();
        listing.filter(&matcher);
    }
    if cmd.get_flag("json") {
        println!("{}",listing.to_json(cmd.get_one::<u16>("indent").copied()));
    } else {
        println!("{}",listing);
    }
    Ok(())
}
