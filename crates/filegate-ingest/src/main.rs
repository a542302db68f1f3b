//! Filegate Ingest - local upload checker

use anyhow::{Context, Result};
use clap::Parser;
use filegate_common::logging::{init_logging, LogConfig, LogLevel};
use filegate_ingest::{normalizer, parser, payload, validator, ProfileRegistry, SinkTarget};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "filegate-ingest")]
#[command(author, version, about = "Check upload files against Filegate document profiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Parse, validate and normalize a file, then print what would be sent
    Check {
        /// Document type tag or alias, e.g. `price`
        #[arg(short, long)]
        document_type: String,

        /// File to check (.csv, .xlsx or .xls)
        #[arg(short, long)]
        file: PathBuf,

        /// Request parameter stamped on every record, e.g. `client_id=7`
        #[arg(short, long = "context", value_parser = parse_key_val)]
        context: Vec<(String, String)>,
    },

    /// Print the built-in document profiles
    Profiles,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("filegate-ingest")
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let registry = ProfileRegistry::builtin();

    match cli.command {
        Command::Check {
            document_type,
            file,
            context,
        } => {
            let profile = registry.get(&document_type)?;
            let params: HashMap<String, String> = context.into_iter().collect();
            let context = normalizer::bind_context(profile, &params)?;

            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("File path has no usable file name")?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let grid = parser::parse(&bytes, filename)?;
            validator::validate(&grid, profile)?;
            let batch = normalizer::normalize(&grid, profile, &context)?;
            info!(
                document_type = %profile.document_type,
                records = batch.len(),
                sink = profile.sink.kind(),
                "File is valid"
            );

            let output = match &profile.sink {
                SinkTarget::Remote { shape, .. } => payload::remote_payload(&batch, shape),
                SinkTarget::Table { .. } => serde_json::to_value(&batch.records)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        },
        Command::Profiles => {
            println!("{}", serde_json::to_string_pretty(&registry)?);
        },
    }

    Ok(())
}
