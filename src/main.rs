//! Bio-AD CLI
//!
//! Entry point for the dementia severity classification experiment: a
//! single end-to-end run over a directory of brain MRI scans using the
//! Burn framework.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use bioad::backend::{backend_name, TrainingBackend};
use bioad::dataset::MriDataset;
use bioad::training::pipeline::{run_pipeline, PipelineConfig};
use bioad::utils::logging::{init_logging, LogConfig};

/// Bio-AD Dementia Severity Classification
///
/// Trains an image classifier that assigns brain MRI scans to one of four
/// dementia severity categories, using transfer learning from a frozen
/// convolutional backbone.
#[derive(Parser, Debug)]
#[command(name = "bioad")]
#[command(version = bioad::VERSION)]
#[command(about = "Dementia severity classification from brain MRI scans", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full experiment: load, balance, split, train, evaluate
    Train {
        /// Path to the dataset directory (one subdirectory per class)
        #[arg(short, long, default_value = "data/mri")]
        data_dir: String,

        /// Output directory for the model, charts, and history
        #[arg(short, long, default_value = "output")]
        output_dir: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "25")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Initial learning rate for SGD
        #[arg(short, long, default_value = "0.01")]
        learning_rate: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Pre-trained backbone weights (Burn record file)
        #[arg(long)]
        backbone: Option<PathBuf>,

        /// Keep per-class proportions in the splits
        #[arg(long, default_value = "false")]
        stratified: bool,

        /// Skip SMOTE class balancing
        #[arg(long, default_value = "false")]
        no_balance: bool,

        /// Quick smoke mode - use only 500 samples
        #[arg(long, default_value = "false")]
        quick: bool,
    },

    /// Show dataset statistics
    Stats {
        /// Path to the dataset directory
        #[arg(short, long, default_value = "data/mri")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            seed,
            backbone,
            stratified,
            no_balance,
            quick,
        } => {
            info!("Starting experiment on backend: {}", backend_name());

            let max_samples = if quick {
                println!(
                    "{}",
                    "Quick smoke mode: using only 500 samples".yellow().bold()
                );
                Some(500usize)
            } else {
                None
            };

            let config = PipelineConfig {
                data_dir,
                output_dir,
                epochs,
                batch_size,
                learning_rate,
                seed,
                backbone_weights: backbone,
                stratified,
                balance: !no_balance,
                max_samples,
            };

            run_pipeline::<TrainingBackend>(config)?;
        }

        Commands::Stats { data_dir } => {
            cmd_stats(&data_dir)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 +----------------------------------------------------------+
 |   Bio-AD: Dementia Severity Classification               |
 |   Brain MRI Transfer Learning with Burn + Rust           |
 +----------------------------------------------------------+
  "#
        .green()
    );
}

fn cmd_stats(data_dir: &str) -> Result<()> {
    info!("Computing dataset statistics for: {}", data_dir);

    if !std::path::Path::new(data_dir).exists() {
        println!(
            "{} Dataset directory not found: {}",
            "Error:".red(),
            data_dir
        );
        println!();
        println!("Expected structure: {}/{{class_name}}/*.jpg", data_dir);
        return Ok(());
    }

    match MriDataset::new(data_dir) {
        Ok(dataset) => {
            let stats = dataset.stats();
            stats.print();

            println!();
            println!("{}", "Simulated Split Configuration:".yellow().bold());
            let total = stats.total_samples;
            let val_size = (total as f64 * 0.10).round() as usize;
            let test_size = ((total - val_size) as f64 * 0.10).round() as usize;
            let train_size = total - val_size - test_size;

            println!(
                "  Train:      {} ({:.1}%)",
                train_size,
                100.0 * train_size as f64 / total.max(1) as f64
            );
            println!(
                "  Validation: {} ({:.1}%)",
                val_size,
                100.0 * val_size as f64 / total.max(1) as f64
            );
            println!(
                "  Test:       {} ({:.1}%)",
                test_size,
                100.0 * test_size as f64 / total.max(1) as f64
            );
        }
        Err(e) => {
            println!("{} Failed to load dataset: {}", "Error:".red(), e);
        }
    }

    Ok(())
}
