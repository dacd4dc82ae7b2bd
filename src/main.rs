use std::process::ExitCode;

use clap::Parser;

use rasterly::settings::EditorSettings;
use rasterly::{cli, logger};

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let settings = EditorSettings::load();
    let args = cli::CliArgs::parse();
    cli::run(args, settings.jpeg_quality)
}
