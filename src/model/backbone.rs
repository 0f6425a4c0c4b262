//! MobileNetV2 Feature Extractor
//!
//! Implements the MobileNetV2 architecture with the Burn framework: a
//! stride-2 stem, a stack of inverted residual bottlenecks, and a final
//! 1x1 expansion to the feature channels. The backbone is used frozen, as
//! a pre-trained feature extractor; weights can be loaded from a Burn
//! record file.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    tensor::{backend::Backend, Tensor},
};

/// Inverted residual settings: (expansion, channels, repeats, stride)
const BOTTLENECK_SETTINGS: [(usize, usize, usize, usize); 7] = [
    (1, 16, 1, 1),
    (6, 24, 2, 2),
    (6, 32, 3, 2),
    (6, 64, 4, 2),
    (6, 96, 3, 1),
    (6, 160, 3, 2),
    (6, 320, 1, 1),
];

/// Stem channels before width scaling
const STEM_CHANNELS: usize = 32;

/// Output channels of the final 1x1 expansion before width scaling
const HEAD_CHANNELS: usize = 1280;

/// ReLU6 activation used throughout MobileNetV2
fn relu6<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    x.clamp(0.0, 6.0)
}

/// Round a scaled channel count to the nearest multiple of 8, never
/// dropping more than 10% below the unrounded value
fn make_divisible(value: f64, divisor: usize) -> usize {
    let divisor = divisor as f64;
    let rounded = ((value + divisor / 2.0) / divisor).floor() * divisor;
    let rounded = rounded.max(divisor);
    if rounded < 0.9 * value {
        (rounded + divisor) as usize
    } else {
        rounded as usize
    }
}

/// Convolution + BatchNorm + ReLU6 block
#[derive(Module, Debug)]
pub struct ConvBnRelu6<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBnRelu6<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        groups: usize,
        device: &B::Device,
    ) -> Self {
        let padding = kernel_size / 2;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_groups(groups)
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);

        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        relu6(self.bn.forward(self.conv.forward(x)))
    }
}

/// MobileNetV2 inverted residual bottleneck
///
/// 1x1 expansion (skipped when the expansion factor is 1), 3x3 depthwise
/// convolution, then a linear 1x1 projection. The skip connection applies
/// only at stride 1 with matching channel counts.
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    expand: Option<ConvBnRelu6<B>>,
    depthwise: ConvBnRelu6<B>,
    project: Conv2d<B>,
    project_bn: BatchNorm<B, 2>,
    use_residual: bool,
}

impl<B: Backend> InvertedResidual<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        expansion: usize,
        stride: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = in_channels * expansion;

        let expand = if expansion != 1 {
            Some(ConvBnRelu6::new(in_channels, hidden, 1, 1, 1, device))
        } else {
            None
        };

        let depthwise = ConvBnRelu6::new(hidden, hidden, 3, stride, hidden, device);

        let project = Conv2dConfig::new([hidden, out_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let project_bn = BatchNormConfig::new(out_channels).init(device);

        Self {
            expand,
            depthwise,
            project,
            project_bn,
            use_residual: stride == 1 && in_channels == out_channels,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = match &self.expand {
            Some(expand) => expand.forward(x.clone()),
            None => x.clone(),
        };
        let out = self.depthwise.forward(out);
        let out = self.project_bn.forward(self.project.forward(out));

        if self.use_residual {
            x + out
        } else {
            out
        }
    }
}

/// MobileNetV2 backbone producing a [batch, channels, h/32, w/32] feature map
#[derive(Module, Debug)]
pub struct MobileNetV2<B: Backend> {
    stem: ConvBnRelu6<B>,
    blocks: Vec<InvertedResidual<B>>,
    head: ConvBnRelu6<B>,
    out_channels: usize,
}

impl<B: Backend> MobileNetV2<B> {
    /// Build the backbone for the given width multiplier
    pub fn new(width_mult: f64, device: &B::Device) -> Self {
        let stem_channels = make_divisible(STEM_CHANNELS as f64 * width_mult, 8);
        let stem = ConvBnRelu6::new(3, stem_channels, 3, 2, 1, device);

        let mut blocks = Vec::new();
        let mut in_channels = stem_channels;

        for &(expansion, channels, repeats, stride) in BOTTLENECK_SETTINGS.iter() {
            let out_channels = make_divisible(channels as f64 * width_mult, 8);
            for repeat in 0..repeats {
                let block_stride = if repeat == 0 { stride } else { 1 };
                blocks.push(InvertedResidual::new(
                    in_channels,
                    out_channels,
                    expansion,
                    block_stride,
                    device,
                ));
                in_channels = out_channels;
            }
        }

        let out_channels = if width_mult > 1.0 {
            make_divisible(HEAD_CHANNELS as f64 * width_mult, 8)
        } else {
            HEAD_CHANNELS
        };
        let head = ConvBnRelu6::new(in_channels, out_channels, 1, 1, 1, device);

        Self {
            stem,
            blocks,
            head,
            out_channels,
        }
    }

    /// Forward pass producing the feature map
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.stem.forward(x);
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.head.forward(x)
    }

    /// Number of output feature channels
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_divisible() {
        assert_eq!(make_divisible(32.0, 8), 32);
        assert_eq!(make_divisible(16.0, 8), 16);
        // 0.5x of 24 = 12 rounds to 16, within the 10% guard
        assert_eq!(make_divisible(12.0, 8), 16);
        // Never below the divisor
        assert_eq!(make_divisible(3.0, 8), 8);
    }

    #[test]
    fn test_block_count() {
        // Standard MobileNetV2 has 17 bottlenecks
        let total: usize = BOTTLENECK_SETTINGS.iter().map(|&(_, _, n, _)| n).sum();
        assert_eq!(total, 17);
    }

    #[cfg(all(feature = "ndarray", not(feature = "wgpu")))]
    #[test]
    fn test_backbone_output_shape() {
        use crate::backend::DefaultBackend;

        let device = Default::default();
        let backbone = MobileNetV2::<DefaultBackend>::new(1.0, &device);

        // Small input keeps the test fast; 64 -> 2 after five stride-2 convs
        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 64, 64], &device);
        let output = backbone.forward(input);

        assert_eq!(output.dims(), [1, 1280, 2, 2]);
    }
}
