//! Utilities module for logging, metrics, and chart rendering
//!
//! This module provides:
//! - Structured logging with tracing
//! - Evaluation metrics (accuracy, precision/recall/F1, confusion matrix)
//! - ROC curve and AUC analysis
//! - SVG chart generation and sample-image montages

pub mod charts;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod montage;
pub mod roc;

pub use error::{BioAdError, Result};
pub use metrics::{ClassMetrics, ConfusionMatrix, Metrics};
pub use roc::{RocAnalysis, RocCurve};
