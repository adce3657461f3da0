//! Request-time prediction from raw image bytes.
//!
//! The predictor loads a checkpoint once at construction and is immutable
//! afterwards; `predict` takes `&self` and is safe to call from concurrent
//! requests. Preprocessing is fixed and deterministic (decode, RGB, resize
//! to the architecture's input size, CHW floats in `[0, 1]`): exactly the
//! transform the training batcher applies, with none of the training-time
//! augmentation.

use std::path::Path;

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkpoint::load_classifier;
use crate::error::{Error, Result};
use crate::model::{ImageClassifier, ImageClassifierConfig};
use crate::IMAGE_SIZE;

/// Result of a single prediction.
///
/// `confidence` is the maximum value of the softmax-normalized score vector.
/// It is a derived score in `[0, 1]`, not a calibrated probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class index (argmax of the score vector)
    pub class_index: usize,
    /// Softmax probability of the predicted class
    pub confidence: f32,
    /// Full probability distribution over all classes
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from a softmax-normalized probability vector.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Self {
        let (class_index, &confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &0.0));

        Self {
            class_index,
            confidence,
            probabilities,
        }
    }
}

/// Inference service over one loaded checkpoint.
#[derive(Debug)]
pub struct Predictor<B: Backend> {
    model: ImageClassifier<B>,
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> Predictor<B> {
    /// Load a checkpoint into a freshly constructed model.
    ///
    /// Fails with [`Error::CheckpointNotFound`] or
    /// [`Error::CheckpointMismatch`]; a caller that wants to stay live
    /// without a model keeps the error and serves `ModelUnavailable`.
    pub fn from_checkpoint(
        checkpoint_path: &Path,
        num_classes: usize,
        device: B::Device,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::Config("number of classes must be positive".to_string()));
        }

        let config = ImageClassifierConfig::new().with_num_classes(num_classes);
        let model = load_classifier::<B>(checkpoint_path, &config, &device)?;

        info!(
            "Predictor ready: checkpoint {:?}, {} classes",
            checkpoint_path, num_classes
        );

        Ok(Self {
            model,
            device,
            image_size: IMAGE_SIZE,
        })
    }

    /// Wrap an already constructed model (used by tests and by callers that
    /// train in-process).
    pub fn from_model(model: ImageClassifier<B>, device: B::Device) -> Self {
        Self {
            model,
            device,
            image_size: IMAGE_SIZE,
        }
    }

    /// Number of classes the loaded model predicts over.
    pub fn num_classes(&self) -> usize {
        self.model.num_classes()
    }

    /// Decode raw image bytes into the model's input buffer.
    ///
    /// Malformed payloads fail with [`Error::ImageDecode`]; this is a user
    /// input fault and does not affect the loaded parameters or any other
    /// request.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| Error::ImageDecode(e.to_string()))?
            .resize_exact(
                self.image_size as u32,
                self.image_size as u32,
                FilterType::Triangle,
            )
            .to_rgb8();

        let (width, height) = (self.image_size, self.image_size);
        let mut data = vec![0.0f32; 3 * height * width];
        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                data[y * width + x] = pixel[0] as f32 / 255.0;
                data[height * width + y * width + x] = pixel[1] as f32 / 255.0;
                data[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(data)
    }

    /// Predict the class of one image given as raw encoded bytes.
    pub fn predict(&self, bytes: &[u8]) -> Result<Prediction> {
        let data = self.preprocess(bytes)?;

        let input = Tensor::<B, 4>::from_floats(
            TensorData::new(data, [1, 3, self.image_size, self.image_size]),
            &self.device,
        );

        let probs = self.model.forward_softmax(input);
        let probabilities: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| Error::Inference(format!("failed to read class scores: {:?}", e)))?;

        Ok(Prediction::from_probabilities(probabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use image::{Rgb, RgbImage};

    fn encoded_image(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(48, 48, Rgb(color));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn predictor(num_classes: usize) -> Predictor<DefaultBackend> {
        let device = Default::default();
        let config = ImageClassifierConfig::new().with_num_classes(num_classes);
        Predictor::from_model(ImageClassifier::new(&config, &device), device)
    }

    #[test]
    fn test_prediction_from_probabilities() {
        let prediction = Prediction::from_probabilities(vec![0.1, 0.7, 0.2]);
        assert_eq!(prediction.class_index, 1);
        assert!((prediction.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let predictor = predictor(3);
        let bytes = encoded_image([120, 40, 200]);

        let a = predictor.predict(&bytes).unwrap();
        let b = predictor.predict(&bytes).unwrap();

        assert_eq!(a.class_index, b.class_index);
        assert_eq!(a.probabilities, b.probabilities);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let predictor = predictor(5);
        let prediction = predictor.predict(&encoded_image([0, 255, 0])).unwrap();

        assert_eq!(prediction.probabilities.len(), 5);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_corrupt_bytes_decode_error() {
        let predictor = predictor(3);
        let err = predictor.predict(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode(_)));

        // The predictor stays usable for the next request
        let ok = predictor.predict(&encoded_image([10, 10, 10]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_missing_checkpoint_fails_construction() {
        let device = Default::default();
        let err = Predictor::<DefaultBackend>::from_checkpoint(
            Path::new("/nonexistent/best.mpk"),
            10,
            device,
        )
        .unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
    }
}
