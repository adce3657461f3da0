//! Evaluation harness.
//!
//! Loads a checkpoint into a freshly constructed model and runs one
//! forward-only pass over a held-out partition, reporting exact
//! correct/total accuracy and the confusion matrix. Never writes back to the
//! checkpoint.

use std::path::Path;

use burn::data::{dataloader::batcher::Batcher, dataset::Dataset};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkpoint::load_classifier;
use crate::dataset::{ImageBatcher, ImageItem};
use crate::error::{Error, Result};
use crate::metrics::ConfusionMatrix;
use crate::model::ImageClassifierConfig;
use crate::IMAGE_SIZE;

/// Result of evaluating one checkpoint over one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Exact correct/total over the full partition
    pub accuracy: f64,
    /// Counts indexed [true_label][predicted_label]
    pub confusion: ConfusionMatrix,
    /// Number of samples evaluated
    pub total_samples: usize,
}

/// Forward-only evaluator.
#[derive(Debug, Clone)]
pub struct Evaluator {
    batch_size: usize,
    num_classes: usize,
}

impl Evaluator {
    /// Create an evaluator; invalid configuration fails here.
    pub fn new(batch_size: usize, num_classes: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Config("batch size must be positive".to_string()));
        }
        if num_classes == 0 {
            return Err(Error::Config("number of classes must be positive".to_string()));
        }
        Ok(Self {
            batch_size,
            num_classes,
        })
    }

    /// Evaluate the checkpoint at `checkpoint_path` over the whole partition
    /// exactly once.
    ///
    /// Accuracy is correct/total over every sample; a final batch that does
    /// not fill `batch_size` still contributes its true weight. Fails with
    /// [`Error::CheckpointMismatch`] if the stored parameter shapes do not
    /// match the constructed architecture.
    pub fn run<B: Backend>(
        &self,
        checkpoint_path: &Path,
        dataset: &dyn Dataset<ImageItem>,
        device: &B::Device,
    ) -> Result<EvaluationReport> {
        if dataset.len() == 0 {
            return Err(Error::Data("evaluation partition is empty".to_string()));
        }

        let config = ImageClassifierConfig::new().with_num_classes(self.num_classes);
        let model = load_classifier::<B>(checkpoint_path, &config, device)?;
        let batcher = ImageBatcher::<B>::new(IMAGE_SIZE);

        info!(
            "Evaluating {:?} over {} samples ({} classes)",
            checkpoint_path,
            dataset.len(),
            self.num_classes
        );

        let mut confusion = ConfusionMatrix::new(self.num_classes);
        let len = dataset.len();

        for start in (0..len).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(len);
            let mut items = Vec::with_capacity(end - start);
            for idx in start..end {
                items.push(dataset.get(idx).ok_or_else(|| {
                    Error::Data(format!("evaluation sample {} could not be loaded", idx))
                })?);
            }

            let batch = batcher.batch(items, device);
            let targets = batch.targets.clone();
            let output = model.forward(batch.images);
            let predictions = output.argmax(1).squeeze::<1>(1);

            let pred_vec: Vec<i64> = predictions
                .into_data()
                .convert::<i64>()
                .to_vec()
                .map_err(|e| Error::Inference(format!("failed to read predictions: {:?}", e)))?;
            let target_vec: Vec<i64> = targets
                .into_data()
                .convert::<i64>()
                .to_vec()
                .map_err(|e| Error::Inference(format!("failed to read targets: {:?}", e)))?;

            for (pred, actual) in pred_vec.iter().zip(target_vec.iter()) {
                confusion.add(*actual as usize, *pred as usize);
            }
        }

        let accuracy = confusion.accuracy();
        let total_samples = confusion.total();

        info!(
            "Evaluation complete: accuracy {:.4} over {} samples",
            accuracy, total_samples
        );

        Ok(EvaluationReport {
            accuracy,
            confusion,
            total_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_rejects_zero_batch_size() {
        assert!(matches!(Evaluator::new(0, 10), Err(Error::Config(_))));
    }

    #[test]
    fn test_evaluator_rejects_zero_classes() {
        assert!(matches!(Evaluator::new(8, 0), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_partition_is_data_error() {
        use crate::backend::DefaultBackend;
        use crate::dataset::InMemoryDataset;

        let evaluator = Evaluator::new(4, 2).unwrap();
        let empty = InMemoryDataset::default();
        let err = evaluator
            .run::<DefaultBackend>(Path::new("/tmp/none.mpk"), &empty, &Default::default())
            .unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[test]
    fn test_missing_checkpoint_surfaces() {
        use crate::backend::DefaultBackend;
        use crate::dataset::{ImageItem, InMemoryDataset};

        let evaluator = Evaluator::new(4, 2).unwrap();
        let dataset = InMemoryDataset::new(vec![ImageItem::from_data(
            vec![0.0; 3 * IMAGE_SIZE * IMAGE_SIZE],
            0,
        )]);
        let dir = tempfile::tempdir().unwrap();
        let err = evaluator
            .run::<DefaultBackend>(&dir.path().join("best.mpk"), &dataset, &Default::default())
            .unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
    }
}
