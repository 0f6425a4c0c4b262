//! Training History
//!
//! Per-epoch metric records for both the training and validation sets,
//! persisted as JSON alongside the model so the training-curve charts can
//! be regenerated without retraining.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{BioAdError, Result};

/// Metrics for a single epoch on one dataset split
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Average cross-entropy loss
    pub loss: f64,
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// Micro-average ROC AUC
    pub auc: f64,
    /// Macro-average F1 score
    pub f1: f64,
}

/// Full per-epoch history of a training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Training metrics per epoch
    pub train: Vec<EpochMetrics>,
    /// Validation metrics per epoch
    pub validation: Vec<EpochMetrics>,
    /// Learning rate used for each epoch
    pub learning_rates: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed epoch
    pub fn push(&mut self, train: EpochMetrics, validation: EpochMetrics, lr: f64) {
        self.train.push(train);
        self.validation.push(validation);
        self.learning_rates.push(lr);
    }

    /// Number of recorded epochs
    pub fn epochs(&self) -> usize {
        self.train.len()
    }

    /// Extract one metric as a per-epoch series for plotting
    pub fn series<F: Fn(&EpochMetrics) -> f64>(&self, metrics: &[EpochMetrics], f: F) -> Vec<f64> {
        metrics.iter().map(f).collect()
    }

    /// Best (lowest) validation loss seen
    pub fn best_validation_loss(&self) -> Option<f64> {
        self.validation
            .iter()
            .map(|m| m.loss)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BioAdError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| BioAdError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(loss: f64, accuracy: f64) -> EpochMetrics {
        EpochMetrics {
            loss,
            accuracy,
            auc: 0.9,
            f1: 0.8,
        }
    }

    #[test]
    fn test_push_and_epochs() {
        let mut history = TrainingHistory::new();
        history.push(metrics(1.0, 0.5), metrics(1.1, 0.45), 0.01);
        history.push(metrics(0.8, 0.6), metrics(0.9, 0.55), 0.01);

        assert_eq!(history.epochs(), 2);
        assert_eq!(history.learning_rates, vec![0.01, 0.01]);
    }

    #[test]
    fn test_best_validation_loss() {
        let mut history = TrainingHistory::new();
        history.push(metrics(1.0, 0.5), metrics(1.1, 0.45), 0.01);
        history.push(metrics(0.8, 0.6), metrics(0.7, 0.55), 0.01);
        history.push(metrics(0.6, 0.7), metrics(0.9, 0.6), 0.001);

        assert_eq!(history.best_validation_loss(), Some(0.7));
    }

    #[test]
    fn test_series_extraction() {
        let mut history = TrainingHistory::new();
        history.push(metrics(1.0, 0.5), metrics(1.1, 0.45), 0.01);
        history.push(metrics(0.8, 0.6), metrics(0.9, 0.55), 0.01);

        let train_acc = history.series(&history.train, |m| m.accuracy);
        assert_eq!(train_acc, vec![0.5, 0.6]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut history = TrainingHistory::new();
        history.push(metrics(1.0, 0.5), metrics(1.1, 0.45), 0.01);

        let path = std::env::temp_dir().join("bioad_test_history.json");
        history.save(&path).unwrap();

        let loaded = TrainingHistory::load(&path).unwrap();
        assert_eq!(loaded.epochs(), 1);
        assert!((loaded.train[0].loss - 1.0).abs() < 1e-12);

        std::fs::remove_file(&path).ok();
    }
}
