//! apirun - run HTTP API scenarios from a workbook

use apirun::{cli, commands::Commands, common::logging};
use clap::Parser;

#[derive(Parser)]
#[command(name = "apirun", about = "Sequential HTTP API scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (verbose, log_file) = cli.command.logging();
    let _guard = match logging::init_cli(verbose, log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
