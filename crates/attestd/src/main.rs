use std::env::var;
use std::io::stderr;

use clap::Parser;
use eyre::Result as EyreResult;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

mod cli;
mod defaults;

use cli::RootCommand;

#[tokio::main]
async fn main() -> EyreResult<()> {
    setup()?;

    let command = RootCommand::parse();

    command.run().await
}

fn setup() -> EyreResult<()> {
    let directives = match var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => "attestd=info,gatt_attest_=info".to_owned(),
    };

    // stdout carries evidence and verification results
    registry()
        .with(EnvFilter::builder().parse(directives)?)
        .with(layer().with_writer(stderr))
        .init();

    color_eyre::install()?;

    Ok(())
}
