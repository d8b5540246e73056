//! Tierup CLI - End-to-end provisioning of a three-tier cloud application

use clap::Parser;

use tierup_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
