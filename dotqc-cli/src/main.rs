//! dotqc CLI
//!
//! Analyses dot pattern images and reports a quality label with metrics.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use dotqc_algorithms::{analyse, AnalysisResult, AnalysisSummary};
use dotqc_core::AnalysisConfig;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis error: {0}")]
    Core(#[from] dotqc_core::Error),

    #[error("{}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: Box<CliError>,
    },
}

/// Dot pattern quality control.
#[derive(Parser)]
#[command(name = "dotqc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse images and print a JSON report per image
    Analyse {
        /// Input image file(s)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSON configuration file; missing fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for annotated PNG copies
        #[arg(short, long)]
        annotated_dir: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// DBSCAN neighborhood radius (pixels)
        #[arg(long)]
        eps: Option<f64>,

        /// DBSCAN core point threshold, the point itself included
        #[arg(long)]
        min_samples: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default configuration as JSON
    Config,
}

/// One line of the analysis report.
#[derive(Debug, Serialize)]
struct Report {
    input: PathBuf,
    #[serde(flatten)]
    summary: AnalysisSummary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyse {
            inputs,
            config,
            annotated_dir,
            output,
            eps,
            min_samples,
            verbose,
        } => {
            init_logging(verbose);

            let mut analysis = match &config {
                Some(path) => load_config(path)?,
                None => AnalysisConfig::default(),
            };
            if let Some(eps) = eps {
                analysis = analysis.with_eps(eps);
            }
            if let Some(min_samples) = min_samples {
                analysis = analysis.with_min_samples(min_samples);
            }
            analysis.validate()?;

            if let Some(dir) = &annotated_dir {
                fs::create_dir_all(dir)?;
            }

            let start = Instant::now();
            let results = inputs
                .par_iter()
                .map(|path| {
                    analyse_file(path, &analysis).map_err(|e| CliError::Input {
                        path: path.clone(),
                        source: Box::new(e),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut reports = Vec::with_capacity(results.len());
            for (path, result) in inputs.iter().zip(&results) {
                if let Some(dir) = &annotated_dir {
                    let target = annotated_path(dir, path);
                    result.annotated.save(&target)?;
                    log::debug!("annotated image written to {}", target.display());
                }
                reports.push(Report {
                    input: path.clone(),
                    summary: result.summary(),
                });
            }

            let json = serde_json::to_string_pretty(&reports)?;
            match &output {
                Some(path) => {
                    let mut file = fs::File::create(path)?;
                    writeln!(file, "{}", json)?;
                }
                None => println!("{}", json),
            }

            let accepted = reports
                .iter()
                .filter(|r| r.summary.label.is_acceptable())
                .count();
            log::info!(
                "Analysed {} image(s) in {:.2}s: {} A, {} B",
                reports.len(),
                start.elapsed().as_secs_f64(),
                accepted,
                reports.len() - accepted
            );
        }

        Commands::Config => {
            let json = serde_json::to_string_pretty(&AnalysisConfig::default())?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // RUST_LOG still wins when set.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text = fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_json::from_str(&text)?;
    log::debug!("configuration loaded from {}", path.display());
    Ok(config)
}

fn analyse_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let image = image::open(path)?.to_rgb8();
    log::debug!("{}: {}x{}", path.display(), image.width(), image.height());
    Ok(analyse(&image, config)?)
}

/// `<dir>/<stem>_annotated.png`
fn annotated_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    dir.join(format!("{}_annotated.png", stem))
}
