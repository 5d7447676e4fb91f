use clap_complete::shells;
use crate::STDRESULT;
use super::CommandError;

pub fn generate(mut main_cmd: clap::Command,cmd: &clap::ArgMatches) -> STDRESULT {
    let mut stdout = std::io::stdout();
    match cmd.get_one::<String>("shell").map(|s| s.as_str()) {
        Some("bash") => clap_complete::generate(shells::Bash,&mut main_cmd,"a8kit",&mut stdout),
        Some("elv") => clap_complete::generate(shells::Elvish,&mut main_cmd,"a8kit",&mut stdout),
        Some("fish") => clap_complete::generate(shells::Fish,&mut main_cmd,"a8kit",&mut stdout),
        Some("ps1") => clap_complete::generate(shells::PowerShell,&mut main_cmd,"a8kit",&mut stdout),
        Some("zsh") => clap_complete::generate(shells::Zsh,&mut main_cmd,"a8kit",&mut stdout),
        _ => return Err(Box::new(CommandError::InvalidCommand))
    }
    Ok(())
}
