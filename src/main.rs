use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

mod cli;
mod collector;
mod config;
mod constants;
mod error;
mod index;
mod limits;
mod models;
mod naming;
mod pipeline;
mod registry;
mod scan;
mod sink;
mod stream;

use cli::{Args, Commands};
use collector::{Collector, CollectorOptions};
use config::{load_or_default_config, CollectionConfig, OutputFormat};
use scan::FsScanner;
use sink::{ArchiveSink, DirectorySink, OutputSink};

fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    info!("Starting sample collection");

    let config = load_and_override_config(&args)?;
    let summary = run_collection(&config, &args)?;

    if let Some(path) = &args.summary {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        std::fs::write(path, json)
            .context(format!("Failed to write summary to {}", path.display()))?;
        info!("Run summary written to {}", path.display());
    }

    info!(
        "Done: {} samples admitted, {} off-limits, {} duplicates, {} index rows",
        summary.samples_admitted,
        summary.samples_off_limits,
        summary.duplicates,
        summary.rows_written
    );
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands (init-config)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            CollectionConfig::create_default_config_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}

/// Load configuration and apply command-line overrides
fn load_and_override_config(args: &Args) -> Result<CollectionConfig> {
    let mut config = load_or_default_config(args.config.as_deref())?;

    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(format) = &args.format {
        config.output.format = match format.as_str() {
            "archive" => OutputFormat::Archive,
            "directory" => OutputFormat::Directory,
            other => return Err(anyhow!("unknown output format '{}'", other)),
        };
    }
    if args.report_all {
        config.report_all = true;
    }
    if args.no_limits {
        config.limits.ignore_all = true;
    }
    if config.samples.is_empty() {
        return Err(anyhow!("configuration defines no sample specs"));
    }
    Ok(config)
}

/// Build the scanner, sink, and collector, then run the scan
fn run_collection(config: &CollectionConfig, args: &Args) -> Result<collector::CollectionSummary> {
    let mut scanner = FsScanner::new(
        config.locations.clone(),
        &config.all_terms(),
        !args.no_recurse,
    )?;

    let mut sink = build_sink(config);

    let options = CollectorOptions {
        report_all: config.report_all,
        crypto: config.crypto_algs(),
        fuzzy: config.fuzzy_algs(),
        default_min_chars: config.content.min_chars,
        default_max_chars: config.content.max_chars,
        computer_name: String::new(),
        collection_date: None,
    };
    let mut collector = Collector::new(config.limits.clone(), config.samples.clone(), options);

    let summary = collector
        .run(&mut scanner, sink.as_mut())
        .context("Collection run failed")?;
    report_reached_ceilings(&collector);
    Ok(summary)
}

fn build_sink(config: &CollectionConfig) -> Box<dyn OutputSink> {
    match config.output.format {
        OutputFormat::Archive => Box::new(ArchiveSink::new(
            Path::new(&config.output.path),
            config.output.compression,
            config.output.password.clone(),
        )),
        OutputFormat::Directory => Box::new(DirectorySink::new(Path::new(&config.output.path))),
    }
}

/// Say which configured ceilings turned samples away during the run
fn report_reached_ceilings(collector: &Collector) {
    let global = collector.global_limits();
    if global.max_sample_count_reached {
        info!("Global sample count ceiling was reached");
    }
    if global.max_bytes_per_sample_reached {
        info!("Global per-sample size ceiling turned samples away");
    }
    if global.max_bytes_total_reached {
        info!("Global total size ceiling was reached");
    }
    for spec in collector.specs() {
        let limits = &spec.per_sample_limits;
        if limits.max_sample_count_reached
            || limits.max_bytes_per_sample_reached
            || limits.max_bytes_total_reached
        {
            info!("Spec '{}' hit at least one of its ceilings", spec.name);
        }
    }
}
