//! Training loop with best-checkpoint promotion.
//!
//! One epoch is one full pass over the training partition: forward pass,
//! cross-entropy loss, backward pass, one AdamW step per batch, with loss and
//! correctness accumulated per sample. After the training pass the model is
//! validated with a forward-only pass over the validation partition, and the
//! checkpoint slot is overwritten only when validation accuracy strictly
//! improves on the best seen so far in the run.

use std::path::PathBuf;

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion},
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::dataset::augmentation::maybe_flip;
use crate::dataset::{ImageBatcher, ImageItem};
use crate::error::{Error, Result};
use crate::metrics::{AccuracyTracker, RunningAverage};
use crate::model::{ImageClassifier, ImageClassifierConfig};
use crate::IMAGE_SIZE;

/// Probability of a horizontal flip on a training sample.
const FLIP_PROBABILITY: f64 = 0.5;

/// Training run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of full passes over the training partition
    pub epochs: usize,
    /// Samples per gradient step
    pub batch_size: usize,
    /// Fixed AdamW learning rate
    pub learning_rate: f64,
    /// AdamW weight decay
    pub weight_decay: f64,
    /// Output class count; must match the dataset's labeling
    pub num_classes: usize,
    /// Seed for shuffling, augmentation, and weight initialization
    pub seed: u64,
    /// Apply horizontal-flip augmentation to the training partition
    pub augment: bool,
    /// Directory holding the single best-checkpoint slot
    pub checkpoint_dir: PathBuf,
    /// Directory receiving the per-epoch metrics history
    pub log_dir: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            num_classes: crate::NUM_CLASSES,
            seed: 42,
            augment: true,
            checkpoint_dir: PathBuf::from("../checkpoints"),
            log_dir: PathBuf::from("../logs"),
        }
    }
}

impl TrainerConfig {
    /// Reject invalid values before any dataset, model, or optimizer work.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(Error::Config(format!(
                "weight decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if self.num_classes == 0 {
            return Err(Error::Config("number of classes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Metrics for one completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Outcome of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Highest validation accuracy observed across all epochs
    pub best_val_accuracy: f64,
    /// Number of epochs completed
    pub epochs_run: usize,
    /// Number of checkpoint promotions performed
    pub promotions: usize,
    /// Per-epoch metrics in order
    pub history: Vec<EpochMetrics>,
}

/// Orchestrates the epoch loop and checkpoint promotion.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Create a trainer; invalid configuration fails here, before any work.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run the full training loop.
    ///
    /// On success the checkpoint slot holds the parameters of the epoch with
    /// the highest validation accuracy. Any failure constructing the model or
    /// assembling a batch aborts the run immediately; a previously promoted
    /// checkpoint is left untouched.
    pub fn run<B: AutodiffBackend>(
        &self,
        train_set: &dyn Dataset<ImageItem>,
        val_set: &dyn Dataset<ImageItem>,
        device: &B::Device,
    ) -> Result<TrainingReport> {
        let config = &self.config;

        if train_set.len() == 0 {
            return Err(Error::Data("training partition is empty".to_string()));
        }
        if val_set.len() == 0 {
            return Err(Error::Data("validation partition is empty".to_string()));
        }

        B::seed(config.seed);

        let model_config = ImageClassifierConfig::new().with_num_classes(config.num_classes);
        let mut model = ImageClassifier::<B>::new(&model_config, device);

        let mut optimizer = AdamWConfig::new()
            .with_weight_decay(config.weight_decay as f32)
            .init();

        let batcher = ImageBatcher::<B>::new(IMAGE_SIZE);
        let valid_batcher = ImageBatcher::<B::InnerBackend>::new(IMAGE_SIZE);
        let store = CheckpointStore::new(&config.checkpoint_dir);

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut best_val_accuracy = f64::NEG_INFINITY;
        let mut promotions = 0usize;
        let mut history: Vec<EpochMetrics> = Vec::with_capacity(config.epochs);

        info!(
            "Starting training: {} epochs, batch size {}, lr {}, weight decay {}, {} train / {} val samples",
            config.epochs,
            config.batch_size,
            config.learning_rate,
            config.weight_decay,
            train_set.len(),
            val_set.len()
        );

        for epoch in 1..=config.epochs {
            let mut indices: Vec<usize> = (0..train_set.len()).collect();
            indices.shuffle(&mut rng);

            let mut train_loss = RunningAverage::new();
            let mut train_acc = AccuracyTracker::new();

            for batch_indices in indices.chunks(config.batch_size) {
                let mut items = Vec::with_capacity(batch_indices.len());
                for &idx in batch_indices {
                    let mut item = train_set.get(idx).ok_or_else(|| {
                        Error::Data(format!("training sample {} could not be loaded", idx))
                    })?;
                    if config.augment {
                        maybe_flip(&mut item, IMAGE_SIZE, FLIP_PROBABILITY, &mut rng);
                    }
                    items.push(item);
                }

                let batch_len = items.len();
                let batch = batcher.batch(items, device);

                let output = model.forward(batch.images);
                let loss = CrossEntropyLossConfig::new()
                    .init(&output.device())
                    .forward(output.clone(), batch.targets.clone());
                let loss_value: f64 = loss.clone().into_scalar().elem();

                let predictions = output.argmax(1).squeeze::<1>(1);
                let batch_correct: i64 = predictions
                    .equal(batch.targets)
                    .int()
                    .sum()
                    .into_scalar()
                    .elem();

                train_loss.add_weighted(loss_value, batch_len);
                train_acc.add(batch_correct as usize, batch_len);

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optimizer.step(config.learning_rate, model, grads);
            }

            // Forward-only pass over the validation partition; the inner
            // module carries no autodiff state and performs no updates.
            let (val_loss, val_accuracy) = run_validation(
                &model.valid(),
                val_set,
                &valid_batcher,
                config.batch_size,
                device,
            )?;

            let is_best = val_accuracy > best_val_accuracy;
            if is_best {
                best_val_accuracy = val_accuracy;
                store.save(&model.valid())?;
                promotions += 1;
                debug!("Promoted checkpoint at epoch {}", epoch);
            }

            info!(
                "Epoch {}/{}: train_loss={:.4}, train_acc={:.4} | val_loss={:.4}, val_acc={:.4}{}",
                epoch,
                config.epochs,
                train_loss.average(),
                train_acc.accuracy(),
                val_loss,
                val_accuracy,
                if is_best { " (best)" } else { "" }
            );

            history.push(EpochMetrics {
                epoch,
                train_loss: train_loss.average(),
                train_accuracy: train_acc.accuracy(),
                val_loss,
                val_accuracy,
            });
        }

        std::fs::create_dir_all(&config.log_dir)?;
        let history_path = config.log_dir.join("history.json");
        std::fs::write(&history_path, serde_json::to_string_pretty(&history)?)?;
        debug!("Metrics history written to {:?}", history_path);

        info!(
            "Training complete: best validation accuracy {:.4} ({} promotions)",
            best_val_accuracy, promotions
        );

        Ok(TrainingReport {
            best_val_accuracy,
            epochs_run: config.epochs,
            promotions,
            history,
        })
    }
}

/// Forward-only pass over a partition: per-sample loss and accuracy, no
/// gradient computation, no parameter mutation.
fn run_validation<B: Backend>(
    model: &ImageClassifier<B>,
    dataset: &dyn Dataset<ImageItem>,
    batcher: &ImageBatcher<B>,
    batch_size: usize,
    device: &B::Device,
) -> Result<(f64, f64)> {
    let mut loss_avg = RunningAverage::new();
    let mut accuracy = AccuracyTracker::new();
    let len = dataset.len();

    for start in (0..len).step_by(batch_size) {
        let end = (start + batch_size).min(len);
        let mut items = Vec::with_capacity(end - start);
        for idx in start..end {
            items.push(dataset.get(idx).ok_or_else(|| {
                Error::Data(format!("validation sample {} could not be loaded", idx))
            })?);
        }

        let batch_len = items.len();
        let batch = batcher.batch(items, device);

        let output = model.forward(batch.images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), batch.targets.clone());
        let loss_value: f64 = loss.into_scalar().elem();

        let predictions = output.argmax(1).squeeze::<1>(1);
        let correct: i64 = predictions
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem();

        loss_avg.add_weighted(loss_value, batch_len);
        accuracy.add(correct as usize, batch_len);
    }

    Ok((loss_avg.average(), accuracy.accuracy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.weight_decay, 1e-4);
        assert_eq!(config.num_classes, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_epochs() {
        let config = TrainerConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_rejects_zero_batch_size() {
        let config = TrainerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_rejects_bad_learning_rate() {
        for lr in [0.0, -1.0, f64::NAN] {
            let config = TrainerConfig {
                learning_rate: lr,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_config_rejects_negative_weight_decay() {
        let config = TrainerConfig {
            weight_decay: -0.1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_trainer_new_validates() {
        let config = TrainerConfig {
            num_classes: 0,
            ..Default::default()
        };
        assert!(Trainer::new(config).is_err());
    }

    #[test]
    fn test_empty_dataset_is_data_error() {
        use crate::backend::TrainingBackend;
        use crate::dataset::InMemoryDataset;

        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            epochs: 1,
            batch_size: 2,
            num_classes: 2,
            checkpoint_dir: dir.path().join("ckpt"),
            log_dir: dir.path().join("logs"),
            ..Default::default()
        };
        let trainer = Trainer::new(config).unwrap();

        let empty = InMemoryDataset::default();
        let err = trainer
            .run::<TrainingBackend>(&empty, &empty, &Default::default())
            .unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }
}
