//! MRI Dataset Loader
//!
//! Loads the dementia MRI dataset from disk into memory. The dataset
//! directory holds one subdirectory per severity class:
//!
//! ```text
//! root_dir/
//! ├── Mild-Demented/
//! │   ├── scan1.jpg
//! │   └── scan2.jpg
//! ├── Moderate-Demented/
//! ├── Non-Demented/
//! └── VeryMild-Demented/
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::logging::ProgressLogger;
use crate::{IMG_HEIGHT, IMG_WIDTH};

use super::batch::MriItem;

/// A single scan with its label and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index (0-3)
    pub label: usize,
    /// Class name (e.g., "Non-Demented")
    pub class_name: String,
}

/// Dementia MRI dataset scanned from a class-per-directory layout
#[derive(Debug)]
pub struct MriDataset {
    /// Root directory of the dataset
    pub root_dir: PathBuf,
    /// All samples in the dataset
    pub samples: Vec<ImageSample>,
    /// Mapping from class name to label index
    pub class_to_idx: HashMap<String, usize>,
    /// Target image size (width, height)
    pub image_size: (u32, u32),
}

impl MriDataset {
    /// Scan a dataset directory and index every image file
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading MRI dataset from: {:?}", root_dir);

        if !root_dir.exists() {
            anyhow::bail!("Dataset directory does not exist: {:?}", root_dir);
        }

        // Discover all class directories; alphabetical order fixes the
        // label indices
        let mut class_dirs: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push(name.to_string());
                }
            }
        }
        class_dirs.sort();

        info!("Found {} classes", class_dirs.len());

        let class_to_idx: HashMap<String, usize> = class_dirs
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut samples = Vec::new();

        for class_name in &class_dirs {
            let class_dir = root_dir.join(class_name);
            let label = class_to_idx[class_name];

            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();

                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if ["jpg", "jpeg", "png", "bmp"].contains(&ext.as_str()) {
                        samples.push(ImageSample {
                            path,
                            label,
                            class_name: class_name.clone(),
                        });
                    }
                }
            }

            debug!("Class '{}' indexed (label {})", class_name, label);
        }

        info!("Indexed {} total samples", samples.len());

        Ok(Self {
            root_dir,
            samples,
            class_to_idx,
            image_size: (IMG_WIDTH as u32, IMG_HEIGHT as u32),
        })
    }

    /// Get the number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of classes
    pub fn num_classes(&self) -> usize {
        self.class_to_idx.len()
    }

    /// Load a scan from disk and resize it to the target geometry
    pub fn load_image(&self, sample: &ImageSample) -> Result<DynamicImage> {
        let img = ImageReader::open(&sample.path)
            .with_context(|| format!("Failed to open image: {:?}", sample.path))?
            .decode()
            .with_context(|| format!("Failed to decode image: {:?}", sample.path))?;

        Ok(img.resize_exact(
            self.image_size.0,
            self.image_size.1,
            image::imageops::FilterType::Triangle,
        ))
    }

    /// Load a scan as a normalized CHW float tensor
    ///
    /// Pixel values are rescaled to [0, 1].
    pub fn load_image_tensor(&self, sample: &ImageSample) -> Result<Vec<f32>> {
        let img = self.load_image(sample)?;
        let rgb = img.to_rgb8();

        let (width, height) = (self.image_size.0 as usize, self.image_size.1 as usize);
        let mut tensor = vec![0.0f32; 3 * height * width];

        for y in 0..height {
            for x in 0..width {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                tensor[y * width + x] = pixel[0] as f32 / 255.0;
                tensor[height * width + y * width + x] = pixel[1] as f32 / 255.0;
                tensor[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(tensor)
    }

    /// Bulk-load every scan into memory, shuffled with the given seed
    ///
    /// This mirrors the one-shot experiment design: the full dataset is
    /// materialized up front so the SMOTE balancing step can interpolate
    /// over raw pixel vectors.
    pub fn load_all(&self, seed: u64) -> Result<Vec<MriItem>> {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let mut progress = ProgressLogger::new("Loading scans", order.len());
        let mut items = Vec::with_capacity(order.len());

        for &idx in &order {
            let sample = &self.samples[idx];
            let image = self.load_image_tensor(sample)?;
            items.push(MriItem {
                image,
                label: sample.label,
                synthetic: false,
            });
            progress.increment();
        }
        progress.finish();

        Ok(items)
    }

    /// Get statistics about the dataset
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            class_counts[sample.label] += 1;
        }

        let mut class_names: Vec<String> = self.class_to_idx.keys().cloned().collect();
        class_names.sort();

        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names,
        }
    }
}

/// Statistics about the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Print statistics to the console
    pub fn print(&self) {
        println!("\nDataset Statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        for (idx, name) in self.class_names.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = (count as f32 / self.total_samples.max(1) as f32 * 40.0) as usize;
            let bar: String = "#".repeat(bar_len);
            println!("    {:3}. {:24} {:5} {}", idx, name, count, bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sample_creation() {
        let sample = ImageSample {
            path: PathBuf::from("/data/mri/Non-Demented/scan.jpg"),
            label: 2,
            class_name: "Non-Demented".to_string(),
        };

        assert_eq!(sample.label, 2);
        assert_eq!(sample.class_name, "Non-Demented");
    }

    #[test]
    fn test_missing_directory_fails() {
        let result = MriDataset::new("/nonexistent/mri/dataset");
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_counts() {
        let stats = DatasetStats {
            total_samples: 10,
            num_classes: 2,
            class_counts: vec![6, 4],
            class_names: vec!["A".to_string(), "B".to_string()],
        };

        assert_eq!(stats.class_counts.iter().sum::<usize>(), stats.total_samples);
    }
}
