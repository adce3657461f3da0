//! Model architecture.

pub mod cnn;

pub use cnn::{ImageClassifier, ImageClassifierConfig, ImageClassifierRecord};
