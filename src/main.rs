use clap::Parser;
use user_lifecycle_api::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Openapi(args) => cli::openapi::run(args),
    }
}
