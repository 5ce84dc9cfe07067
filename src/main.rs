mod cli;

use anyhow::Result;
use clap::Parser;
use cli::args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);
    cli::app::run(cli).await
}
