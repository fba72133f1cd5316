use anyhow::Result;
use clap::Parser;
use fintrack::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    fintrack::logging::init(cli.verbose);
    cli.run().await
}
