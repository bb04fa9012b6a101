//! aq-train - Main Entry Point
//!
//! Train, inspect and query the air-quality regression models.

use aq_regression::cli::{cmd_inspect, cmd_inspect_data, cmd_predict, cmd_train, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aq_regression=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { preset, config, data, output, name } => {
            cmd_train(
                preset.as_deref(),
                config.as_deref(),
                data.as_deref(),
                output.as_deref(),
                name.as_deref(),
            )?;
        }
        Commands::Predict { registry, name, version, features } => {
            cmd_predict(&registry, &name, version.as_deref(), &features)?;
        }
        Commands::Inspect { registry, name } => {
            cmd_inspect(&registry, &name)?;
        }
        Commands::InspectData { data, preset } => {
            cmd_inspect_data(&data, preset.as_deref())?;
        }
    }

    Ok(())
}
