//! Model module
//!
//! A MobileNetV2-style convolutional backbone used as a frozen feature
//! extractor, with a small trainable dense head on top for the four
//! dementia severity classes.

pub mod backbone;
pub mod classifier;
pub mod config;

pub use backbone::MobileNetV2;
pub use classifier::DementiaClassifier;
pub use config::ModelConfig;
