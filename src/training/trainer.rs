//! Supervised Training Loop
//!
//! Implements the training loop directly on Burn's API: forward pass,
//! cross-entropy loss, SGD updates, and per-epoch evaluation on the
//! validation set. The learning rate follows a reduce-on-plateau schedule
//! keyed to validation loss, matching the experiment design.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer, SgdConfig},
    tensor::{
        activation::softmax,
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{MriBatcher, MriBurnDataset};
use crate::model::DementiaClassifier;
use crate::utils::logging::TrainingLogger;
use crate::utils::metrics::{Metrics, RunningAverage};
use crate::utils::roc::micro_auc;
use crate::{IMG_HEIGHT, IMG_WIDTH};

use super::history::{EpochMetrics, TrainingHistory};
use super::scheduler::ReduceOnPlateau;

/// Configuration for the training loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size for training
    pub batch_size: usize,
    /// Batch size for evaluation
    pub eval_batch_size: usize,
    /// Initial learning rate for SGD
    pub learning_rate: f64,
    /// Epochs of stagnating validation loss before the LR is reduced
    pub plateau_patience: usize,
    /// Random seed for epoch shuffling
    pub seed: u64,
    /// Input image height
    pub image_height: usize,
    /// Input image width
    pub image_width: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: super::DEFAULT_EPOCHS,
            batch_size: super::DEFAULT_BATCH_SIZE,
            eval_batch_size: super::DEFAULT_EVAL_BATCH_SIZE,
            learning_rate: super::DEFAULT_LEARNING_RATE,
            plateau_patience: 2,
            seed: 42,
            image_height: IMG_HEIGHT,
            image_width: IMG_WIDTH,
        }
    }
}

/// Evaluation result: aggregate metrics plus the raw per-sample outputs
/// needed for the confusion matrix and ROC analysis
#[derive(Debug, Clone)]
pub struct EvalOutput {
    /// Aggregate metrics over the dataset
    pub metrics: EpochMetrics,
    /// Predicted class per sample
    pub predictions: Vec<usize>,
    /// Softmax probability vector per sample
    pub probabilities: Vec<Vec<f64>>,
    /// Ground-truth class per sample
    pub targets: Vec<usize>,
}

/// Train the classifier, returning the trained model and the epoch history
pub fn fit<B: AutodiffBackend>(
    mut model: DementiaClassifier<B>,
    train: &MriBurnDataset,
    validation: &MriBurnDataset,
    config: &TrainerConfig,
    device: &B::Device,
) -> Result<(DementiaClassifier<B>, TrainingHistory)> {
    let num_classes = model.num_classes();
    let batcher = MriBatcher::with_size(config.image_height, config.image_width);

    let mut optimizer = SgdConfig::new().init();
    let mut scheduler = ReduceOnPlateau::on_validation_loss(config.learning_rate, config.plateau_patience);
    let mut logger = TrainingLogger::new(config.epochs);
    let mut history = TrainingHistory::new();

    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let inner_device = <B::InnerBackend as Backend>::Device::default();

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);
        let current_lr = scheduler.lr();

        let mut loss_avg = RunningAverage::new();
        let mut predictions: Vec<usize> = Vec::with_capacity(train.len());
        let mut probabilities: Vec<Vec<f64>> = Vec::with_capacity(train.len());
        let mut targets: Vec<usize> = Vec::with_capacity(train.len());

        // Fresh shuffle every epoch
        let mut indices: Vec<usize> = (0..train.len()).collect();
        indices.shuffle(&mut epoch_rng);
        let num_batches = (indices.len() + config.batch_size - 1) / config.batch_size;

        for batch_idx in 0..num_batches {
            let start = batch_idx * config.batch_size;
            let end = (start + config.batch_size).min(indices.len());
            let items: Vec<_> = indices[start..end]
                .iter()
                .filter_map(|&i| train.get(i))
                .collect();

            if items.is_empty() {
                continue;
            }

            targets.extend(items.iter().map(|item| item.label));
            let batch = batcher.batch(items, device);

            // Forward pass
            let logits = model.forward(batch.images.clone());

            let loss = CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            loss_avg.add(loss_value);

            collect_outputs(
                logits.clone().detach(),
                num_classes,
                &mut predictions,
                &mut probabilities,
            )?;

            // Backward pass and parameter update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(current_lr, model, grads);

            if (batch_idx + 1) % 10 == 0 || batch_idx == num_batches - 1 {
                debug!(
                    "  Batch {}/{}: loss = {:.4}",
                    batch_idx + 1,
                    num_batches,
                    loss_value
                );
            }
        }

        let train_metrics = aggregate_metrics(
            loss_avg.average(),
            &predictions,
            &probabilities,
            &targets,
            num_classes,
        );

        // Validation phase on the inner (inference) backend
        let val_output = evaluate(
            &model.valid(),
            validation,
            &batcher,
            config.eval_batch_size,
            &inner_device,
        )?;
        let val_metrics = val_output.metrics;

        history.push(train_metrics, val_metrics, current_lr);
        logger.end_epoch(
            train_metrics.loss,
            val_metrics.loss,
            val_metrics.accuracy,
            current_lr,
        );

        let new_lr = scheduler.step(val_metrics.loss);
        if new_lr < current_lr {
            logger.log_lr_reduced(new_lr);
        }
    }

    logger.log_complete(history.best_validation_loss().unwrap_or(f64::INFINITY));

    Ok((model, history))
}

/// Evaluate the model on a dataset, collecting per-sample outputs
pub fn evaluate<B: Backend>(
    model: &DementiaClassifier<B>,
    dataset: &MriBurnDataset,
    batcher: &MriBatcher,
    batch_size: usize,
    device: &B::Device,
) -> Result<EvalOutput> {
    let num_classes = model.num_classes();
    let len = dataset.len();

    let mut loss_avg = RunningAverage::new();
    let mut predictions: Vec<usize> = Vec::with_capacity(len);
    let mut probabilities: Vec<Vec<f64>> = Vec::with_capacity(len);
    let mut targets: Vec<usize> = Vec::with_capacity(len);

    for start in (0..len).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();

        if items.is_empty() {
            continue;
        }

        targets.extend(items.iter().map(|item| item.label));
        let batch = batcher.batch(items, device);

        let logits = model.forward(batch.images);

        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), batch.targets);
        let loss_value: f64 = loss.into_scalar().elem();
        loss_avg.add(loss_value);

        collect_outputs(logits, num_classes, &mut predictions, &mut probabilities)?;
    }

    let metrics = aggregate_metrics(
        loss_avg.average(),
        &predictions,
        &probabilities,
        &targets,
        num_classes,
    );

    Ok(EvalOutput {
        metrics,
        predictions,
        probabilities,
        targets,
    })
}

/// Extract argmax predictions and softmax probabilities from logits
fn collect_outputs<B: Backend>(
    logits: burn::tensor::Tensor<B, 2>,
    num_classes: usize,
    predictions: &mut Vec<usize>,
    probabilities: &mut Vec<Vec<f64>>,
) -> Result<()> {
    let preds: Vec<i64> = logits
        .clone()
        .argmax(1)
        .squeeze::<1>(1)
        .into_data()
        .to_vec()
        .map_err(|e| anyhow!("Failed to read predictions: {:?}", e))?;
    predictions.extend(preds.into_iter().map(|p| p as usize));

    let probs: Vec<f32> = softmax(logits, 1)
        .into_data()
        .to_vec()
        .map_err(|e| anyhow!("Failed to read probabilities: {:?}", e))?;
    probabilities.extend(
        probs
            .chunks(num_classes)
            .map(|row| row.iter().map(|&p| p as f64).collect::<Vec<f64>>()),
    );

    Ok(())
}

fn aggregate_metrics(
    loss: f64,
    predictions: &[usize],
    probabilities: &[Vec<f64>],
    targets: &[usize],
    num_classes: usize,
) -> EpochMetrics {
    let metrics = Metrics::from_predictions(predictions, targets, num_classes);

    EpochMetrics {
        loss,
        accuracy: metrics.accuracy,
        auc: micro_auc(probabilities, targets, num_classes),
        f1: metrics.macro_f1,
    }
}

#[cfg(all(test, feature = "ndarray", not(feature = "wgpu")))]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;
    use crate::dataset::MriItem;
    use crate::model::ModelConfig;

    fn tiny_dataset(count: usize, height: usize, width: usize) -> MriBurnDataset {
        let items: Vec<MriItem> = (0..count)
            .map(|i| {
                let value = (i % 4) as f32 / 4.0;
                MriItem::new(vec![value; 3 * height * width], i % 4)
            })
            .collect();
        MriBurnDataset::new(items)
    }

    #[test]
    fn test_trainer_config_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.epochs, 25);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.eval_batch_size, 32);
        assert!((config.learning_rate - 0.01).abs() < 1e-12);
        assert_eq!(config.plateau_patience, 2);
    }

    #[test]
    fn test_fit_single_epoch_smoke() {
        let device = Default::default();
        let model_config = ModelConfig::new()
            .with_img_height(32)
            .with_img_width(32)
            .with_width_mult(0.25)
            .with_hidden1(8)
            .with_hidden2(4);
        let model = DementiaClassifier::<TrainingBackend>::new(&model_config, &device)
            .freeze_backbone();

        let train = tiny_dataset(4, 32, 32);
        let validation = tiny_dataset(4, 32, 32);

        let config = TrainerConfig {
            epochs: 1,
            batch_size: 4,
            eval_batch_size: 4,
            image_height: 32,
            image_width: 32,
            ..Default::default()
        };

        let (_model, history) = fit(model, &train, &validation, &config, &device).unwrap();

        assert_eq!(history.epochs(), 1);
        assert!(history.train[0].loss.is_finite());
        assert!(history.validation[0].loss.is_finite());
        assert!((0.0..=1.0).contains(&history.validation[0].accuracy));
    }

    #[test]
    fn test_evaluate_outputs_aligned() {
        let device = Default::default();
        let model_config = ModelConfig::new()
            .with_img_height(32)
            .with_img_width(32)
            .with_width_mult(0.25)
            .with_hidden1(8)
            .with_hidden2(4);
        let model =
            DementiaClassifier::<crate::backend::DefaultBackend>::new(&model_config, &device);

        let dataset = tiny_dataset(6, 32, 32);
        let batcher = MriBatcher::with_size(32, 32);

        let output = evaluate(&model, &dataset, &batcher, 4, &device).unwrap();

        assert_eq!(output.predictions.len(), 6);
        assert_eq!(output.probabilities.len(), 6);
        assert_eq!(output.targets.len(), 6);
        for row in &output.probabilities {
            assert_eq!(row.len(), 4);
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-3);
        }
    }
}
