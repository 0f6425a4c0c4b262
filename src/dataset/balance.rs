//! SMOTE Class Balancing
//!
//! The dementia dataset is heavily imbalanced (the Moderate-Demented class
//! is a small fraction of the Non-Demented class). Training on the raw
//! distribution biases the classifier toward the majority class, so every
//! minority class is grown to the majority count with SMOTE: each synthetic
//! scan is a convex interpolation between a real class member and one of its
//! k nearest in-class neighbors in pixel space.
//!
//! Synthetic samples are appended after the originals, so the tail region of
//! the returned collection can be inspected separately.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::utils::error::{BioAdError, Result};

use super::batch::MriItem;

/// Configuration for SMOTE oversampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoteConfig {
    /// Number of nearest in-class neighbors considered per base sample
    pub k_neighbors: usize,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

/// Statistics about a balancing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoteStats {
    /// Per-class counts before balancing
    pub counts_before: Vec<usize>,
    /// Per-class counts after balancing
    pub counts_after: Vec<usize>,
    /// Total samples before balancing
    pub samples_before: usize,
    /// Total samples after balancing
    pub samples_after: usize,
}

impl SmoteStats {
    /// Number of synthesized samples
    pub fn synthesized(&self) -> usize {
        self.samples_after - self.samples_before
    }
}

/// Balance class counts by synthesizing minority-class samples
///
/// Every class is grown to the size of the largest class. The original
/// items are preserved verbatim at the front of the returned vector;
/// synthesized items follow, flagged with `synthetic = true`.
pub fn oversample(
    items: Vec<MriItem>,
    num_classes: usize,
    config: &SmoteConfig,
) -> Result<(Vec<MriItem>, SmoteStats)> {
    if items.is_empty() {
        return Err(BioAdError::Dataset(
            "Cannot balance an empty dataset".to_string(),
        ));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (idx, item) in items.iter().enumerate() {
        if item.label >= num_classes {
            return Err(BioAdError::Dataset(format!(
                "Label {} out of range for {} classes",
                item.label, num_classes
            )));
        }
        by_class[item.label].push(idx);
    }

    let counts_before: Vec<usize> = by_class.iter().map(|v| v.len()).collect();
    let max_count = counts_before.iter().copied().max().unwrap_or(0);
    let samples_before = items.len();

    info!(
        "Balancing classes to {} samples each (largest class)",
        max_count
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut synthesized: Vec<MriItem> = Vec::new();

    for (class_idx, members) in by_class.iter().enumerate() {
        let deficit = max_count - members.len();
        if deficit == 0 || members.is_empty() {
            continue;
        }

        // Neighbor lists are computed lazily per base sample and cached,
        // since only the bases actually drawn need them
        let mut neighbor_cache: HashMap<usize, Vec<usize>> = HashMap::new();

        for _ in 0..deficit {
            let base_idx = members[rng.gen_range(0..members.len())];

            let neighbors = neighbor_cache.entry(base_idx).or_insert_with(|| {
                nearest_neighbors(&items, base_idx, members, config.k_neighbors)
            });

            let new_image = if neighbors.is_empty() {
                // Single-member class: duplication is the only option
                items[base_idx].image.clone()
            } else {
                let neighbor_idx = neighbors[rng.gen_range(0..neighbors.len())];
                let gap: f32 = rng.gen();
                interpolate(&items[base_idx].image, &items[neighbor_idx].image, gap)
            };

            synthesized.push(MriItem {
                image: new_image,
                label: class_idx,
                synthetic: true,
            });
        }

        info!(
            "Class {}: synthesized {} samples ({} -> {})",
            class_idx,
            deficit,
            members.len(),
            max_count
        );
    }

    let mut balanced = items;
    balanced.extend(synthesized);

    let mut counts_after = vec![0usize; num_classes];
    for item in &balanced {
        counts_after[item.label] += 1;
    }

    let stats = SmoteStats {
        counts_before,
        counts_after,
        samples_before,
        samples_after: balanced.len(),
    };

    Ok((balanced, stats))
}

/// Find the k nearest in-class neighbors of a base sample
///
/// Distances are squared Euclidean over the flattened pixel vector; the
/// base sample itself is excluded.
fn nearest_neighbors(items: &[MriItem], base_idx: usize, members: &[usize], k: usize) -> Vec<usize> {
    let base = &items[base_idx].image;

    let mut distances: Vec<(usize, f32)> = members
        .iter()
        .filter(|&&idx| idx != base_idx)
        .map(|&idx| (idx, squared_distance(base, &items[idx].image)))
        .collect();

    distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    distances.into_iter().take(k).map(|(idx, _)| idx).collect()
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Convex interpolation: base + gap * (neighbor - base), gap in [0, 1)
fn interpolate(base: &[f32], neighbor: &[f32], gap: f32) -> Vec<f32> {
    base.iter()
        .zip(neighbor.iter())
        .map(|(b, n)| b + gap * (n - b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pixels: &[f32], label: usize) -> MriItem {
        MriItem::new(pixels.to_vec(), label)
    }

    fn fixture() -> Vec<MriItem> {
        vec![
            item(&[0.0, 0.0], 0),
            item(&[1.0, 0.0], 0),
            item(&[0.0, 1.0], 0),
            item(&[1.0, 1.0], 0),
            item(&[5.0, 5.0], 1),
            item(&[6.0, 5.0], 1),
        ]
    }

    #[test]
    fn test_counts_balanced() {
        let (balanced, stats) = oversample(fixture(), 2, &SmoteConfig::default()).unwrap();

        assert_eq!(stats.counts_before, vec![4, 2]);
        assert_eq!(stats.counts_after, vec![4, 4]);
        assert_eq!(stats.synthesized(), 2);
        assert_eq!(balanced.len(), 8);
    }

    #[test]
    fn test_originals_preserved() {
        let original = fixture();
        let (balanced, stats) = oversample(original.clone(), 2, &SmoteConfig::default()).unwrap();

        for (before, after) in original.iter().zip(balanced.iter()) {
            assert_eq!(before.image, after.image);
            assert_eq!(before.label, after.label);
        }
        assert!(balanced[stats.samples_before..]
            .iter()
            .all(|i| i.synthetic));
    }

    #[test]
    fn test_synthetic_on_segment() {
        // Class-1 members sit on the segment y = 5, x in [5, 6]; every
        // interpolation must stay on it
        let (balanced, stats) = oversample(fixture(), 2, &SmoteConfig::default()).unwrap();

        for synthetic in &balanced[stats.samples_before..] {
            assert_eq!(synthetic.label, 1);
            assert!(synthetic.image[0] >= 5.0 && synthetic.image[0] <= 6.0);
            assert!((synthetic.image[1] - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_deterministic() {
        let config = SmoteConfig::default();
        let (a, _) = oversample(fixture(), 2, &config).unwrap();
        let (b, _) = oversample(fixture(), 2, &config).unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.image, y.image);
        }
    }

    #[test]
    fn test_single_member_class_duplicates() {
        let items = vec![
            item(&[0.0, 0.0], 0),
            item(&[1.0, 0.0], 0),
            item(&[9.0, 9.0], 1),
        ];

        let (balanced, stats) = oversample(items, 2, &SmoteConfig::default()).unwrap();

        assert_eq!(stats.counts_after, vec![2, 2]);
        assert_eq!(balanced[3].image, vec![9.0, 9.0]);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let result = oversample(Vec::new(), 2, &SmoteConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_label_rejected() {
        let items = vec![item(&[0.0], 7)];
        let result = oversample(items, 2, &SmoteConfig::default());
        assert!(result.is_err());
    }
}
