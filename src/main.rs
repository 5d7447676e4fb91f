//! # Command Line Interface
//!
//! The argument layout is built in `cli.rs`, the subcommands run from the `commands` module.

mod cli;

use env_logger;
use log::error;
use a8kit::commands;
use a8kit::commands::CommandError;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let main_cmd = cli::build_cli();
    let matches = main_cmd.clone().get_matches();

    if let Some(cmd) = matches.subcommand_matches("completions") {
        return commands::completions::generate(main_cmd,cmd);
    }

    // Create a blank disk image
    if let Some(cmd) = matches.subcommand_matches("mkdsk") {
        return commands::mkdsk::mkdsk(cmd);
    }

    // Build a disk image from a host directory
    if let Some(cmd) = matches.subcommand_matches("mkatr") {
        return commands::mkatr::mkatr(cmd);
    }

    if let Some(cmd) = matches.subcommand_matches("estimate") {
        return commands::estimate::estimate(cmd);
    }

    // List a directory
    if let Some(cmd) = matches.subcommand_matches("catalog") {
        return commands::catalog::catalog(cmd);
    }

    // Put file or sectors inside disk image
    if let Some(cmd) = matches.subcommand_matches("put") {
        return commands::put::put(cmd);
    }

    // Get file or sectors from inside a disk image
    if let Some(cmd) = matches.subcommand_matches("get") {
        return commands::get::get(cmd);
    }

    error!("No subcommand was found, try `a8kit --help`");
    Err(Box::new(CommandError::InvalidCommand))
}
