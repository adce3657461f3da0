//! Single-slot checkpoint store.
//!
//! One named slot (`best.mpk`) per run holds the parameters of the
//! best-performing model. The trainer overwrites the slot on promotion; the
//! evaluator and the inference service only read it. The file is a burn
//! `CompactRecorder` blob: a named-tensor map that carries each tensor's
//! shape and dtype inline, so no sidecar schema is needed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{ImageClassifier, ImageClassifierConfig, ImageClassifierRecord};

/// File stem of the single checkpoint slot.
pub const BEST_SLOT: &str = "best";

/// Extension appended by the recorder.
pub const CHECKPOINT_EXTENSION: &str = "mpk";

/// Durable store with a single best-model slot.
#[derive(Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    writes: AtomicUsize,
}

impl CheckpointStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            writes: AtomicUsize::new(0),
        }
    }

    /// Full path of the slot file.
    pub fn best_path(&self) -> PathBuf {
        self.dir
            .join(BEST_SLOT)
            .with_extension(CHECKPOINT_EXTENSION)
    }

    /// Whether the slot currently holds a checkpoint.
    pub fn exists(&self) -> bool {
        self.best_path().exists()
    }

    /// Overwrite the slot with the given model's parameters.
    pub fn save<B: Backend>(&self, model: &ImageClassifier<B>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let recorder = CompactRecorder::new();
        model
            .clone()
            .save_file(self.dir.join(BEST_SLOT), &recorder)
            .map_err(|e| Error::Serialization(format!("failed to write checkpoint: {:?}", e)))?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        info!("Checkpoint written to {:?}", self.best_path());
        Ok(())
    }

    /// Load the slot into a freshly constructed model.
    pub fn load<B: Backend>(
        &self,
        config: &ImageClassifierConfig,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>> {
        load_classifier(&self.best_path(), config, device)
    }

    /// Number of slot writes performed through this store instance.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

/// Load a checkpoint file into a freshly constructed classifier of the given
/// configuration.
///
/// Fails with [`Error::CheckpointNotFound`] when no file exists at the path
/// and with [`Error::CheckpointMismatch`] when the stored parameters do not
/// fit the configured architecture (including undecodable files); the stored
/// record is never truncated or reshaped to fit.
pub fn load_classifier<B: Backend>(
    path: &Path,
    config: &ImageClassifierConfig,
    device: &B::Device,
) -> Result<ImageClassifier<B>> {
    // The recorder normalizes the extension itself; resolve the actual file
    // here so a missing checkpoint gets a precise error.
    let file = path.with_extension(CHECKPOINT_EXTENSION);
    if !file.exists() {
        return Err(Error::CheckpointNotFound(file));
    }

    let record: ImageClassifierRecord<B> = CompactRecorder::new()
        .load(file.clone(), device)
        .map_err(|e| {
            Error::CheckpointMismatch(format!("failed to read checkpoint {:?}: {:?}", file, e))
        })?;

    ImageClassifier::validate_record(config, &record)?;

    Ok(ImageClassifier::new(config, device).load_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Tensor;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn new_model(num_classes: usize) -> (ImageClassifier<TestBackend>, ImageClassifierConfig) {
        let device = Default::default();
        let config = ImageClassifierConfig::new()
            .with_num_classes(num_classes)
            .with_base_filters(4);
        (ImageClassifier::new(&config, &device), config)
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = Default::default();
        let (model, config) = new_model(3);

        assert!(!store.exists());
        store.save(&model).unwrap();
        assert!(store.exists());
        assert_eq!(store.write_count(), 1);

        let loaded = store.load::<TestBackend>(&config, &device).unwrap();
        assert_eq!(loaded.num_classes(), 3);

        // Same weights produce the same logits
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let a: Vec<f32> = model.forward(input.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.forward(input).into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_slot_is_overwritten_not_versioned() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let (model, _) = new_model(3);

        store.save(&model).unwrap();
        store.save(&model).unwrap();
        assert_eq!(store.write_count(), 2);

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_class_count_mismatch_fails_at_load() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = Default::default();

        let (model, _) = new_model(5);
        store.save(&model).unwrap();

        let other_config = ImageClassifierConfig::new()
            .with_num_classes(2)
            .with_base_filters(4);
        let err = store
            .load::<TestBackend>(&other_config, &device)
            .unwrap_err();
        assert!(matches!(err, Error::CheckpointMismatch(_)));
        assert!(err.to_string().contains("2"));
        assert!(err.to_string().contains("5"));
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = Default::default();
        let config = ImageClassifierConfig::new();

        let err = store.load::<TestBackend>(&config, &device).unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
    }

    #[test]
    fn test_corrupt_checkpoint_is_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let device = Default::default();
        let config = ImageClassifierConfig::new();

        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.best_path(), b"not a checkpoint").unwrap();

        let err = store.load::<TestBackend>(&config, &device).unwrap_err();
        assert!(matches!(err, Error::CheckpointMismatch(_)));
    }
}
