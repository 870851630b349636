//! quake-cli - earthquake dashboard pipeline and HTTP endpoints.

use clap::Parser;
use log::debug;

#[derive(Parser)]
#[command(
    name = "quake-cli",
    version,
    about = "Earthquake feed aggregation for dashboards"
)]
struct Cli {
    #[command(subcommand)]
    command: quake_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("quake-cli {}", env!("CARGO_PKG_VERSION"));
    quake_cmd::run(cli.command).await
}
