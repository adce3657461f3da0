//! # visionpipe
//!
//! An image-classifier lifecycle pipeline built on the Burn framework: a
//! train/validate loop with best-checkpoint promotion, an evaluation harness
//! reporting accuracy and a confusion matrix, and an inference path that loads
//! a persisted model and predicts with a softmax confidence score.
//!
//! ## Modules
//!
//! - `dataset`: image-folder loading, batching, and training-time augmentation
//! - `model`: CNN classifier architecture
//! - `training`: the epoch loop with checkpoint promotion
//! - `evaluation`: forward-only evaluation over a held-out partition
//! - `inference`: request-time prediction from raw image bytes
//! - `checkpoint`: the single-slot durable checkpoint store
//! - `utils`: logging setup
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use visionpipe::backend::TrainingBackend;
//! use visionpipe::dataset::ImageFolderDataset;
//! use visionpipe::training::{Trainer, TrainerConfig};
//!
//! let train = ImageFolderDataset::new("data/train")?.into_memory()?;
//! let val = ImageFolderDataset::new("data/val")?.into_memory()?;
//! let trainer = Trainer::new(TrainerConfig::default())?;
//! let report = trainer.run::<TrainingBackend>(&train, &val, &Default::default())?;
//! ```

pub mod backend;
pub mod checkpoint;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod training;
pub mod utils;

pub use checkpoint::CheckpointStore;
pub use dataset::{ImageBatch, ImageBatcher, ImageFolderDataset, ImageItem, InMemoryDataset};
pub use error::{Error, Result};
pub use evaluation::{EvaluationReport, Evaluator};
pub use inference::{Prediction, Predictor};
pub use metrics::ConfusionMatrix;
pub use model::{ImageClassifier, ImageClassifierConfig};
pub use training::{EpochMetrics, Trainer, TrainerConfig, TrainingReport};

/// Default number of output classes.
pub const NUM_CLASSES: usize = 10;

/// Side length the classifier expects; every image is resized to
/// `IMAGE_SIZE` x `IMAGE_SIZE` RGB before entering the network.
pub const IMAGE_SIZE: usize = 32;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
