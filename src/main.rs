use std::path::PathBuf;

use anyhow::Result;
use beefweb_mpris::app::{run, RunOptions};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "beefweb-mpris",
    version,
    about = "Expose a beefweb-controlled player over MPRIS"
)]
struct Cli {
    #[arg(long, help = "Enable verbose debug logs")]
    debug: bool,

    #[arg(long, value_name = "PATH", help = "Config file to load instead of the default")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "URL", help = "beefweb base URL, e.g. http://localhost:8880")]
    base_url: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(RunOptions {
        debug: cli.debug,
        config_path: cli.config,
        base_url: cli.base_url,
    })
}
