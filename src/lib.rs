pub mod cli;
pub mod config;
pub mod format;
pub mod generate;
pub mod io_utils;
pub mod plan;
pub mod schema;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{cli::Cli, config::Config, generate::ScriptGenerator};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("populate_gen", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("Loading configuration from {path:?}"))?
        }
        None => Config::rental(),
    };
    info!(
        "Loaded configuration: {} source(s), {} table schema(s)",
        config.sources.sources.len(),
        config.tables.len()
    );

    if cli.print_config {
        let yaml = config.to_yaml_string()?;
        std::io::stdout()
            .write_all(yaml.as_bytes())
            .context("Writing configuration to stdout")?;
        return Ok(());
    }

    let encoding = io_utils::resolve_encoding(cli.input_encoding.as_deref())?;
    let generator = ScriptGenerator::new(config)
        .with_mode(cli.mode())
        .with_encoding(encoding);
    info!(
        "Generating {:?} from {:?} ({:?} mode)",
        cli.output,
        cli.input_dir,
        cli.mode()
    );
    let report = generator.generate_to_path(&cli.input_dir, &cli.output)?;
    info!(
        "Successfully generated {:?}: {} table(s) populated, {} skipped, {} row(s) inserted",
        cli.output,
        report.populated(),
        report.skipped(),
        report.total_rows()
    );
    Ok(())
}
