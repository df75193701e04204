use anyhow::Result;
use clap::Parser;
use fusionnet_reader::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fusionnet_reader=info".parse()?),
        )
        .init();

    Cli::parse().run()
}
