//! Dementia Classifier
//!
//! Combines the MobileNetV2 backbone with the dense classification head:
//! flatten -> Linear(100) + ReLU + BatchNorm -> Linear(40) + ReLU +
//! BatchNorm -> Linear(num_classes). The backbone is frozen for transfer
//! learning; only the head receives gradient updates.

use std::path::Path;

use burn::{
    module::Module,
    nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig},
    record::CompactRecorder,
    tensor::{activation::relu, backend::Backend, Tensor},
};
use tracing::{info, warn};

use super::backbone::MobileNetV2;
use super::config::ModelConfig;

/// Apply a BatchNorm layer to flat [batch, features] activations
///
/// BatchNorm expects a spatial layout, so the features are treated as a
/// 1x1 map for the duration of the call.
fn batch_norm_1d<B: Backend>(bn: &BatchNorm<B, 2>, x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, features] = x.dims();
    bn.forward(x.reshape([batch, features, 1, 1]))
        .reshape([batch, features])
}

/// MobileNetV2 backbone with a dense head for dementia severity
#[derive(Module, Debug)]
pub struct DementiaClassifier<B: Backend> {
    pub backbone: MobileNetV2<B>,
    fc1: Linear<B>,
    bn1: BatchNorm<B, 2>,
    fc2: Linear<B>,
    bn2: BatchNorm<B, 2>,
    fc3: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> DementiaClassifier<B> {
    /// Create a new classifier from configuration
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let backbone = MobileNetV2::new(config.width_mult, device);

        let (feat_h, feat_w) = config.feature_map_size();
        let flatten_dim = backbone.out_channels() * feat_h * feat_w;

        let fc1 = LinearConfig::new(flatten_dim, config.hidden1).init(device);
        let bn1 = BatchNormConfig::new(config.hidden1).init(device);
        let fc2 = LinearConfig::new(config.hidden1, config.hidden2).init(device);
        let bn2 = BatchNormConfig::new(config.hidden2).init(device);
        let fc3 = LinearConfig::new(config.hidden2, config.num_classes).init(device);

        Self {
            backbone,
            fc1,
            bn1,
            fc2,
            bn2,
            fc3,
            num_classes: config.num_classes,
        }
    }

    /// Load pre-trained backbone weights from a Burn record file
    ///
    /// Without a weights file the backbone stays randomly initialized,
    /// which removes the transfer-learning benefit; a warning is logged.
    pub fn load_backbone_weights(
        mut self,
        path: Option<&Path>,
        device: &B::Device,
    ) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                info!("Loading pre-trained backbone weights from {:?}", path);
                let recorder = CompactRecorder::new();
                self.backbone = self
                    .backbone
                    .load_file(path, &recorder, device)
                    .map_err(|e| anyhow::anyhow!("Failed to load backbone weights: {:?}", e))?;
            }
            None => {
                warn!("No backbone weights supplied; the feature extractor is randomly initialized");
            }
        }
        Ok(self)
    }

    /// Freeze the backbone so only the dense head trains
    pub fn freeze_backbone(mut self) -> Self {
        self.backbone = self.backbone.no_grad();
        self
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(x);

        // Flatten: [B, C, H, W] -> [B, C * H * W]
        let [batch, channels, height, width] = features.dims();
        let x = features.reshape([batch, channels * height * width]);

        let x = batch_norm_1d(&self.bn1, relu(self.fc1.forward(x)));
        let x = batch_norm_1d(&self.bn2, relu(self.fc2.forward(x)));
        self.fc3.forward(x)
    }

    /// Forward pass with softmax for evaluation
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Parameter counts as (backbone, total)
    pub fn param_counts(&self) -> (usize, usize) {
        (self.backbone.num_params(), self.num_params())
    }
}

#[cfg(all(test, feature = "ndarray", not(feature = "wgpu")))]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    /// Reduced geometry keeps the CPU tests fast while exercising the same
    /// downsampling path
    fn small_config() -> ModelConfig {
        ModelConfig::new()
            .with_img_height(64)
            .with_img_width(64)
            .with_hidden1(16)
            .with_hidden2(8)
    }

    #[test]
    fn test_classifier_output_shape() {
        let device = Default::default();
        let model = DementiaClassifier::<DefaultBackend>::new(&small_config(), &device);

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 4]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let device = Default::default();
        let model = DementiaClassifier::<DefaultBackend>::new(&small_config(), &device);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 64, 64], &device);
        let probs = model.forward_softmax(input);

        let sum: f32 = probs.sum().into_scalar();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_backbone_dominates_param_count() {
        let device = Default::default();
        let model = DementiaClassifier::<DefaultBackend>::new(&small_config(), &device);

        let (backbone_params, total_params) = model.param_counts();
        assert!(backbone_params > 0);
        assert!(total_params > backbone_params);
    }
}
