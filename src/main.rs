use clap::Parser;
use extractor_harness::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::List(args) => cli::list::run(args).await,
        Command::Check(args) => cli::check::run(args).await,
        Command::Run(args) => cli::run::run(args).await,
    }
}
