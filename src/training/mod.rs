//! Training loop and checkpoint promotion.

pub mod trainer;

pub use trainer::{EpochMetrics, Trainer, TrainerConfig, TrainingReport};
