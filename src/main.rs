use clap::Parser;
use ghcn_processor::cli::{run, Cli};
use ghcn_processor::error::Result;
use ghcn_processor::utils::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    run(cli).await
}
