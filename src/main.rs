use anyhow::Context;
use clap::Parser;
use trawl::cli::{Cli, Commands};
use trawl::config::Paths;
use trawl::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let paths = match &cli.config_dir {
        Some(dir) => Paths::with_root(dir),
        None => Paths::new().context("failed to locate configuration directory")?,
    };

    match &cli.command {
        Commands::Scan(cmd) => cmd
            .execute(&paths, cli.quiet)
            .await
            .with_context(|| format!("scan of '{}' failed", cmd.target))?,
        Commands::Resolve(cmd) => cmd
            .execute()
            .await
            .with_context(|| format!("could not resolve '{}'", cmd.domain))?,
        Commands::Config(cmd) => cmd.execute(&paths).context("config command failed")?,
    }

    Ok(())
}
