//! karyotype-analyzer CLI: counts chromosomes in a karyotype spread image.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, error::ErrorKind};
use karyotype_analyzer::{AnalysisError, AnalyzerConfig, KaryotypeAnalyzer};

/// Environment variable naming an optional JSON configuration file.
const CONFIG_ENV: &str = "KARYOTYPE_ANALYZER_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "karyotype-analyzer")]
#[command(version, about = "Estimate the chromosome count of a karyotype spread image", long_about = None)]
struct Cli {
    /// Path to the input image.
    #[arg(allow_hyphen_values = true)]
    image_path: PathBuf,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            println!("Usage: karyotype-analyzer <image_path>");
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => AnalyzerConfig::from_json_file(Path::new(&path))
            .with_context(|| format!("loading configuration from {CONFIG_ENV}"))?,
        None => AnalyzerConfig::default(),
    };
    let analyzer = KaryotypeAnalyzer::new(config)?;

    match analyzer.run(&cli.image_path) {
        Ok(summary) => {
            println!("{summary}");
            println!("Visualization saved as 'detected_chromosomes.png'");
            println!(
                "Intermediate images saved as 'gray.png', 'binary.png', 'sure_fg.png', and 'watershed.png'"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ AnalysisError::ImageLoad { .. }) => {
            println!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
