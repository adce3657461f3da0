//! Request-time inference.

pub mod predictor;

pub use predictor::{Prediction, Predictor};
