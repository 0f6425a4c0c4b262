//! # Bio-AD: Dementia Severity Classification from Brain MRI Scans
//!
//! A Rust pipeline for classifying brain MRI scans into four dementia
//! severity categories using the Burn framework. The pipeline runs a single
//! end-to-end experiment: load the scan directory into memory, balance the
//! classes with SMOTE oversampling, split into train/validation/test, train
//! a frozen convolutional backbone with a small dense head, then evaluate,
//! plot, and persist the model.
//!
//! ## Modules
//!
//! - `dataset`: Scan loading, SMOTE class balancing, and split strategies
//! - `model`: MobileNetV2-style backbone and dense classification head
//! - `training`: Training loop, reduce-on-plateau scheduling, history
//! - `utils`: Logging, metrics, ROC analysis, chart rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bioad::backend::TrainingBackend;
//! use bioad::training::pipeline::{run_pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("data/mri", "output");
//! run_pipeline::<TrainingBackend>(config)?;
//! ```

pub mod backend;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::balance::{oversample, SmoteConfig};
pub use dataset::loader::{DatasetStats, ImageSample, MriDataset};
pub use dataset::split::{DatasetSplits, SplitConfig};
pub use dataset::{MriBatch, MriBatcher, MriBurnDataset, MriItem};
pub use model::classifier::DementiaClassifier;
pub use model::config::ModelConfig;
pub use training::history::{EpochMetrics, TrainingHistory};
pub use utils::error::{BioAdError, Result};
pub use utils::metrics::{ClassMetrics, ConfusionMatrix, Metrics};
pub use utils::roc::{RocAnalysis, RocCurve};

/// Dementia severity classes (4 total)
pub const NUM_CLASSES: usize = 4;

/// MRI scan width in pixels
pub const IMG_WIDTH: usize = 176;

/// MRI scan height in pixels
pub const IMG_HEIGHT: usize = 208;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
