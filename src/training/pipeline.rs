//! End-to-End Experiment Pipeline
//!
//! Runs the full experiment as five sequential stages:
//! 1. Bulk-load every scan from the dataset directory into memory
//! 2. Balance class counts with SMOTE oversampling
//! 3. Split into train/validation/test partitions
//! 4. Train the frozen backbone + dense head
//! 5. Evaluate on the test set, render charts, and persist the model

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{
    module::{AutodiffModule, Module},
    record::CompactRecorder,
    tensor::backend::{AutodiffBackend, Backend},
};
use chrono::Local;
use colored::Colorize;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::dataset::balance::{oversample, SmoteConfig};
use crate::dataset::batch::{MriBatcher, MriBurnDataset, MriItem};
use crate::dataset::loader::MriDataset;
use crate::dataset::split::{DatasetSplits, SplitConfig};
use crate::dataset::{CLASS_NAMES, NUM_CLASSES};
use crate::model::{DementiaClassifier, ModelConfig};
use crate::utils::charts::{
    generate_confusion_heatmap, generate_metric_chart, generate_roc_chart, RocSeries,
};
use crate::utils::montage::save_sample_grid;
use crate::utils::roc::RocAnalysis;
use crate::{IMG_HEIGHT, IMG_WIDTH};

use super::trainer::{evaluate, fit, TrainerConfig};

/// Number of rows and columns in the sample montages
const GRID_ROWS: usize = 4;
const GRID_COLS: usize = 4;

/// Configuration for the end-to-end pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dataset directory with one subdirectory per class
    pub data_dir: String,
    /// Directory for the model, charts, and history artifacts
    pub output_dir: String,
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size for training
    pub batch_size: usize,
    /// Initial learning rate for SGD
    pub learning_rate: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Optional pre-trained backbone record file
    pub backbone_weights: Option<PathBuf>,
    /// Keep per-class proportions in the splits
    pub stratified: bool,
    /// Apply SMOTE balancing before splitting
    pub balance: bool,
    /// Cap the number of loaded samples (smoke runs)
    pub max_samples: Option<usize>,
}

impl PipelineConfig {
    /// Create a pipeline configuration with the standard hyperparameters
    pub fn new(data_dir: &str, output_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
            output_dir: output_dir.to_string(),
            epochs: super::DEFAULT_EPOCHS,
            batch_size: super::DEFAULT_BATCH_SIZE,
            learning_rate: super::DEFAULT_LEARNING_RATE,
            seed: 42,
            backbone_weights: None,
            stratified: false,
            balance: true,
            max_samples: None,
        }
    }
}

/// Run the full experiment
pub fn run_pipeline<B: AutodiffBackend>(config: PipelineConfig) -> Result<()> {
    println!("{}", "Initializing Experiment...".green().bold());

    let device = B::Device::default();
    println!("  Device: {:?}", device);

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", config.output_dir))?;
    let output_dir = PathBuf::from(&config.output_dir);

    // Stage 1: bulk-load the dataset into memory
    println!();
    println!("{}", "Loading Dataset...".cyan().bold());
    let dataset = MriDataset::new(&config.data_dir)?;
    let stats = dataset.stats();
    stats.print();

    if stats.total_samples == 0 {
        println!("{} No images found in dataset directory!", "Error:".red());
        println!();
        println!("Expected structure: {}/{{class_name}}/*.jpg", config.data_dir);
        return Ok(());
    }

    let mut items = dataset.load_all(config.seed)?;
    if let Some(max) = config.max_samples {
        println!(
            "{}",
            format!("Quick mode: keeping {} of {} samples", max.min(items.len()), items.len())
                .yellow()
        );
        items.truncate(max);
    }

    println!();
    println!("  Images shape: [{}, 3, {}, {}]", items.len(), IMG_HEIGHT, IMG_WIDTH);
    println!("  Labels shape: [{}]", items.len());
    print_class_counts("Samples per class", &items);

    let mut montage_rng = ChaCha8Rng::seed_from_u64(config.seed);
    save_montage(
        &items,
        0..items.len(),
        &output_dir.join("samples_original.png"),
        &mut montage_rng,
    )?;

    // Stage 2: SMOTE balancing
    let items = if config.balance {
        println!();
        println!("{}", "Balancing Classes with SMOTE...".cyan().bold());
        let (balanced, smote_stats) =
            oversample(items, NUM_CLASSES, &SmoteConfig { seed: config.seed, ..Default::default() })?;

        print_class_counts("Samples per class after SMOTE", &balanced);
        println!("  Synthesized {} samples", smote_stats.synthesized());

        if smote_stats.synthesized() > 0 {
            save_montage(
                &balanced,
                smote_stats.samples_before..balanced.len(),
                &output_dir.join("samples_synthetic.png"),
                &mut montage_rng,
            )?;
        }

        balanced
    } else {
        println!();
        println!("{}", "Skipping class balancing".yellow());
        items
    };

    // Stage 3: train/validation/test split
    println!();
    println!("{}", "Splitting Dataset...".cyan().bold());
    let split_config = SplitConfig {
        seed: config.seed,
        stratified: config.stratified,
        ..Default::default()
    };
    // `items` is consumed here; the splits own every sample from now on,
    // keeping peak memory at one copy of the dataset
    let splits = DatasetSplits::from_items(items, split_config)?;
    println!("{}", splits.stats(NUM_CLASSES));

    let DatasetSplits {
        train,
        validation,
        test,
        ..
    } = splits;
    let train_dataset = MriBurnDataset::new(train);
    let val_dataset = MriBurnDataset::new(validation);
    let test_dataset = MriBurnDataset::new(test);

    // Stage 4: model and training
    println!();
    println!("{}", "Creating Model...".cyan().bold());
    let model_config = ModelConfig::new();
    let model = DementiaClassifier::<B>::new(&model_config, &device)
        .load_backbone_weights(config.backbone_weights.as_deref(), &device)?
        .freeze_backbone();

    let (backbone_params, total_params) = model.param_counts();
    println!("  Backbone parameters (frozen): {}", backbone_params);
    println!("  Head parameters (trainable):  {}", total_params - backbone_params);

    let trainer_config = TrainerConfig {
        epochs: config.epochs,
        batch_size: config.batch_size,
        learning_rate: config.learning_rate,
        seed: config.seed,
        ..Default::default()
    };

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Training samples:   {}", train_dataset.items().len());
    println!("  Validation samples: {}", val_dataset.items().len());
    println!("  Test samples:       {}", test_dataset.items().len());
    println!("  Epochs:             {}", trainer_config.epochs);
    println!("  Batch size:         {}", trainer_config.batch_size);
    println!("  Learning rate:      {}", trainer_config.learning_rate);

    println!();
    println!("{}", "Starting Training...".green().bold());
    let (model, history) = fit(model, &train_dataset, &val_dataset, &trainer_config, &device)?;

    // Stage 5: evaluation, charts, and persistence
    println!();
    println!("{}", "Evaluating on Test Set...".cyan().bold());
    let inner_device = <B::InnerBackend as Backend>::Device::default();
    let batcher = MriBatcher::new();
    let test_output = evaluate(
        &model.valid(),
        &test_dataset,
        &batcher,
        trainer_config.eval_batch_size,
        &inner_device,
    )?;

    println!();
    println!("Testing Loss:     {:.6}", test_output.metrics.loss);
    println!("Testing Accuracy: {:.6} %", test_output.metrics.accuracy * 100.0);
    println!("Testing AUC:      {:.6} %", test_output.metrics.auc * 100.0);
    println!("Testing F1-Score: {:.6} %", test_output.metrics.f1 * 100.0);

    let metrics = crate::utils::metrics::Metrics::from_predictions(
        &test_output.predictions,
        &test_output.targets,
        NUM_CLASSES,
    );

    println!();
    println!("{}", "Classification Report:".cyan().bold());
    println!("{}", metrics.classification_report(&CLASS_NAMES));
    println!("{}", metrics.confusion_matrix.display(Some(&CLASS_NAMES)));

    render_charts(&output_dir, &history, &metrics, &test_output)?;

    metrics
        .confusion_matrix
        .save_csv(&output_dir.join("confusion_matrix.csv"))?;
    history.save(&output_dir.join("history.json"))?;

    // Persist the trained model
    println!();
    println!("{}", "Saving Model...".cyan().bold());
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let model_path = output_dir.join(format!("bioad_{}", timestamp));
    let recorder = CompactRecorder::new();
    model
        .save_file(&model_path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;
    println!("  Saved to: {:?}", model_path);

    println!();
    println!("{}", "Experiment Complete!".green().bold());
    println!(
        "  Best validation loss: {:.4}",
        history.best_validation_loss().unwrap_or(f64::INFINITY)
    );
    println!("  Artifacts in: {:?}", output_dir);

    Ok(())
}

fn print_class_counts(label: &str, items: &[MriItem]) {
    let mut counts = vec![0usize; NUM_CLASSES];
    for item in items {
        if item.label < NUM_CLASSES {
            counts[item.label] += 1;
        }
    }

    let pairs: Vec<String> = counts
        .iter()
        .enumerate()
        .map(|(idx, count)| format!("({}, {})", idx, count))
        .collect();
    println!("  {}: [{}]", label, pairs.join(", "));
}

/// Save a random sample grid drawn from the given index range
fn save_montage(
    items: &[MriItem],
    range: std::ops::Range<usize>,
    path: &std::path::Path,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    if range.is_empty() {
        return Ok(());
    }

    let count = GRID_ROWS * GRID_COLS;
    let images: Vec<Vec<f32>> = (0..count)
        .map(|_| {
            let idx = rng.gen_range(range.clone());
            info!(
                "Montage cell: {}",
                crate::dataset::class_name(items[idx].label).unwrap_or("unknown")
            );
            items[idx].image.clone()
        })
        .collect();

    save_sample_grid(&images, IMG_WIDTH, IMG_HEIGHT, GRID_ROWS, GRID_COLS, path)
        .with_context(|| format!("Failed to save montage: {:?}", path))?;
    println!("  Sample grid saved to: {:?}", path);

    Ok(())
}

/// Render the training-curve, confusion-matrix, and ROC charts
fn render_charts(
    output_dir: &std::path::Path,
    history: &crate::training::history::TrainingHistory,
    metrics: &crate::utils::metrics::Metrics,
    test_output: &super::trainer::EvalOutput,
) -> Result<()> {
    println!();
    println!("{}", "Rendering Charts...".cyan().bold());

    // Training curves: accuracy, loss, AUC, F1
    let curves: [(&str, &str, fn(&crate::training::history::EpochMetrics) -> f64); 4] = [
        ("Bio-AD Accuracy", "Accuracy", |m| m.accuracy),
        ("Bio-AD Loss", "Loss", |m| m.loss),
        ("Bio-AD AUC", "AUC", |m| m.auc),
        ("Bio-AD F1-Score", "F1-Score", |m| m.f1),
    ];

    for (title, y_label, extract) in curves {
        let train_series = history.series(&history.train, extract);
        let val_series = history.series(&history.validation, extract);
        let filename = format!("{}.svg", y_label.to_lowercase().replace('-', "_"));
        generate_metric_chart(
            title,
            y_label,
            &train_series,
            &val_series,
            &output_dir.join(filename),
        )?;
    }

    generate_confusion_heatmap(
        "Confusion Matrix of Bio-AD",
        &metrics.confusion_matrix.matrix,
        NUM_CLASSES,
        &CLASS_NAMES,
        &output_dir.join("confusion_matrix.svg"),
    )?;

    let roc = RocAnalysis::from_probabilities(
        &test_output.probabilities,
        &test_output.targets,
        NUM_CLASSES,
    );

    // Single-class chart for the Non-Demented class
    let non_demented = crate::dataset::class_index("Non-Demented").unwrap_or(2);
    let single = vec![RocSeries {
        name: CLASS_NAMES[non_demented].to_string(),
        fpr: roc.per_class[non_demented].fpr.clone(),
        tpr: roc.per_class[non_demented].tpr.clone(),
        auc: roc.per_class[non_demented].auc,
    }];
    generate_roc_chart(
        "Receiver Operating Characteristic",
        &single,
        &output_dir.join("roc_non_demented.svg"),
    )?;

    // All classes plus the micro and macro averages
    let mut all_curves = vec![
        RocSeries {
            name: "micro-average".to_string(),
            fpr: roc.micro.fpr.clone(),
            tpr: roc.micro.tpr.clone(),
            auc: roc.micro.auc,
        },
        RocSeries {
            name: "macro-average".to_string(),
            fpr: roc.macro_avg.fpr.clone(),
            tpr: roc.macro_avg.tpr.clone(),
            auc: roc.macro_avg.auc,
        },
    ];
    for (idx, curve) in roc.per_class.iter().enumerate() {
        all_curves.push(RocSeries {
            name: CLASS_NAMES[idx].to_string(),
            fpr: curve.fpr.clone(),
            tpr: curve.tpr.clone(),
            auc: curve.auc,
        });
    }
    generate_roc_chart(
        "Multiclass Receiver Operating Characteristic",
        &all_curves,
        &output_dir.join("roc_all_classes.svg"),
    )?;

    println!("  Charts saved to: {:?}", output_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::new("data/mri", "output");

        assert_eq!(config.epochs, 25);
        assert_eq!(config.batch_size, 64);
        assert!((config.learning_rate - 0.01).abs() < 1e-12);
        assert!(config.balance);
        assert!(!config.stratified);
        assert!(config.backbone_weights.is_none());
    }
}
