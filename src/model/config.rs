//! Model Configuration Module

use burn::config::Config;

/// Configuration for the dementia classifier
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of output classes
    #[config(default = "4")]
    pub num_classes: usize,

    /// Input image height
    #[config(default = "208")]
    pub img_height: usize,

    /// Input image width
    #[config(default = "176")]
    pub img_width: usize,

    /// Width multiplier scaling every backbone channel count
    #[config(default = "1.0")]
    pub width_mult: f64,

    /// Units in the first dense head layer
    #[config(default = "100")]
    pub hidden1: usize,

    /// Units in the second dense head layer
    #[config(default = "40")]
    pub hidden2: usize,
}

impl ModelConfig {
    /// Spatial size of the backbone feature map for a given input extent
    ///
    /// The backbone downsamples five times with stride-2 convolutions, each
    /// producing ceil(n / 2).
    pub fn feature_extent(input: usize) -> usize {
        (0..5).fold(input, |n, _| (n + 1) / 2)
    }

    /// Height and width of the backbone feature map
    pub fn feature_map_size(&self) -> (usize, usize) {
        (
            Self::feature_extent(self.img_height),
            Self::feature_extent(self.img_width),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scan_geometry() {
        let config = ModelConfig::new();
        assert_eq!(config.num_classes, 4);
        assert_eq!(config.img_height, 208);
        assert_eq!(config.img_width, 176);
    }

    #[test]
    fn test_feature_extent() {
        // 208 -> 104 -> 52 -> 26 -> 13 -> 7
        assert_eq!(ModelConfig::feature_extent(208), 7);
        // 176 -> 88 -> 44 -> 22 -> 11 -> 6
        assert_eq!(ModelConfig::feature_extent(176), 6);
    }

    #[test]
    fn test_feature_map_size() {
        let config = ModelConfig::new();
        assert_eq!(config.feature_map_size(), (7, 6));
    }
}
