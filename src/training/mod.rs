//! Training module
//!
//! This module provides:
//! - The supervised training loop with SGD and cross-entropy loss
//! - Reduce-on-plateau learning rate scheduling keyed to validation loss
//! - Per-epoch metric history for the training-curve charts
//! - The end-to-end experiment pipeline

pub mod history;
pub mod pipeline;
pub mod scheduler;
pub mod trainer;

// Re-export main types for convenience
pub use history::{EpochMetrics, TrainingHistory};
pub use pipeline::{run_pipeline, PipelineConfig};
pub use scheduler::{PlateauMode, ReduceOnPlateau};
pub use trainer::{evaluate, fit, EvalOutput, TrainerConfig};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 25;

/// Default batch size for training
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default batch size for evaluation
pub const DEFAULT_EVAL_BATCH_SIZE: usize = 32;

/// Default learning rate for SGD
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
