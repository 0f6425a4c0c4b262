//! Dataset split strategies
//!
//! Partitions the balanced dataset into three pools:
//! 1. **Validation Set (10% of all samples)** - used for the per-epoch
//!    metrics that drive the reduce-on-plateau schedule
//! 2. **Test Set (10% of the remainder)** - held out, never seen during
//!    training, for the final evaluation
//! 3. **Training Set (the rest)** - fed to the optimizer
//!
//! The split is deterministic and reproducible using a fixed random seed.
//! An optional stratified mode keeps per-class proportions in every pool.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{BioAdError, Result};

use super::batch::MriItem;

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of all samples for the validation set
    pub validation_fraction: f64,
    /// Fraction of the post-validation remainder for the test set
    pub test_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Keep per-class proportions in every split
    pub stratified: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.10,
            test_fraction: 0.10,
            seed: 42,
            stratified: false,
        }
    }
}

impl SplitConfig {
    /// Create a new split configuration with custom fractions
    pub fn new(validation_fraction: f64, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(BioAdError::Config(
                "Validation fraction must be in [0.0, 1.0)".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(BioAdError::Config(
                "Test fraction must be in [0.0, 1.0)".to_string(),
            ));
        }

        Ok(Self {
            validation_fraction,
            test_fraction,
            seed,
            stratified: false,
        })
    }

    /// Enable stratified splitting
    pub fn with_stratified(mut self, stratified: bool) -> Self {
        self.stratified = stratified;
        self
    }
}

/// Complete train/validation/test partition of the dataset
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    /// Training set
    pub train: Vec<MriItem>,
    /// Validation set, drives the learning-rate schedule
    pub validation: Vec<MriItem>,
    /// Test set, held out for the final evaluation
    pub test: Vec<MriItem>,
    /// Configuration used to create these splits
    pub config: SplitConfig,
}

impl DatasetSplits {
    /// Partition loaded items according to the configuration
    ///
    /// Consumes the input so each sample lives in exactly one pool.
    pub fn from_items(items: Vec<MriItem>, config: SplitConfig) -> Result<Self> {
        if items.is_empty() {
            return Err(BioAdError::Dataset(
                "No samples provided for splitting".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let (train, validation, test) = if config.stratified {
            Self::stratified_split(items, &config, &mut rng)
        } else {
            Self::random_split(items, &config, &mut rng)
        };

        Ok(Self {
            train,
            validation,
            test,
            config,
        })
    }

    fn random_split(
        mut items: Vec<MriItem>,
        config: &SplitConfig,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<MriItem>, Vec<MriItem>, Vec<MriItem>) {
        items.shuffle(rng);

        let n = items.len();
        let n_val = (n as f64 * config.validation_fraction).round() as usize;
        let remainder = n - n_val;
        let n_test = (remainder as f64 * config.test_fraction).round() as usize;

        let validation = items.split_off(n - n_val);
        let test = items.split_off(items.len() - n_test);
        let train = items;

        (train, validation, test)
    }

    fn stratified_split(
        items: Vec<MriItem>,
        config: &SplitConfig,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<MriItem>, Vec<MriItem>, Vec<MriItem>) {
        let num_classes = items.iter().map(|i| i.label + 1).max().unwrap_or(0);

        let mut by_class: Vec<Vec<MriItem>> = (0..num_classes).map(|_| Vec::new()).collect();
        for item in items {
            by_class[item.label].push(item);
        }

        let mut train = Vec::new();
        let mut validation = Vec::new();
        let mut test = Vec::new();

        for mut class_items in by_class {
            class_items.shuffle(rng);

            let n = class_items.len();
            let n_val = (n as f64 * config.validation_fraction).round() as usize;
            let remainder = n - n_val;
            let n_test = (remainder as f64 * config.test_fraction).round() as usize;

            validation.extend(class_items.split_off(n - n_val));
            test.extend(class_items.split_off(class_items.len() - n_test));
            train.extend(class_items);
        }

        train.shuffle(rng);
        validation.shuffle(rng);
        test.shuffle(rng);

        (train, validation, test)
    }

    /// Per-split class counts
    pub fn stats(&self, num_classes: usize) -> SplitStats {
        SplitStats {
            train_counts: class_counts(&self.train, num_classes),
            validation_counts: class_counts(&self.validation, num_classes),
            test_counts: class_counts(&self.test, num_classes),
        }
    }

    /// Total number of samples across all splits
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

fn class_counts(items: &[MriItem], num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; num_classes];
    for item in items {
        if item.label < num_classes {
            counts[item.label] += 1;
        }
    }
    counts
}

/// Per-split class counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitStats {
    pub train_counts: Vec<usize>,
    pub validation_counts: Vec<usize>,
    pub test_counts: Vec<usize>,
}

impl std::fmt::Display for SplitStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples per class after splitting:")?;
        writeln!(f, "  Train      {:?}", self.train_counts)?;
        writeln!(f, "  Validation {:?}", self.validation_counts)?;
        writeln!(f, "  Test       {:?}", self.test_counts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(per_class: usize, num_classes: usize) -> Vec<MriItem> {
        let mut items = Vec::new();
        for class in 0..num_classes {
            for i in 0..per_class {
                items.push(MriItem::new(vec![class as f32, i as f32], class));
            }
        }
        items
    }

    #[test]
    fn test_split_sizes() {
        let splits = DatasetSplits::from_items(fixture(100, 4), SplitConfig::default()).unwrap();

        // 400 total: 40 validation, 36 test, 324 train
        assert_eq!(splits.validation.len(), 40);
        assert_eq!(splits.test.len(), 36);
        assert_eq!(splits.train.len(), 324);
        assert_eq!(splits.total(), 400);
    }

    #[test]
    fn test_no_sample_loss() {
        let items = fixture(33, 3);
        let total = items.len();

        let splits = DatasetSplits::from_items(items, SplitConfig::default()).unwrap();
        assert_eq!(splits.total(), total);
    }

    #[test]
    fn test_reproducibility() {
        let config = SplitConfig::default();
        let a = DatasetSplits::from_items(fixture(50, 4), config.clone()).unwrap();
        let b = DatasetSplits::from_items(fixture(50, 4), config).unwrap();

        assert_eq!(a.train.len(), b.train.len());
        for (x, y) in a.train.iter().zip(b.train.iter()) {
            assert_eq!(x.image, y.image);
        }
    }

    #[test]
    fn test_stratified_represents_all_classes() {
        let config = SplitConfig::default().with_stratified(true);
        let splits = DatasetSplits::from_items(fixture(100, 4), config).unwrap();

        let stats = splits.stats(4);
        for class in 0..4 {
            assert!(stats.train_counts[class] > 0);
            assert!(stats.validation_counts[class] > 0);
            assert!(stats.test_counts[class] > 0);
        }

        // Balanced input keeps splits balanced per class
        assert!(stats.validation_counts.iter().all(|&c| c == 10));
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(SplitConfig::new(1.5, 0.1, 42).is_err());
        assert!(SplitConfig::new(0.1, -0.2, 42).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = DatasetSplits::from_items(Vec::new(), SplitConfig::default());
        assert!(result.is_err());
    }
}
