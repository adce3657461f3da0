//! Image-folder dataset loader.
//!
//! A partition directory holds one subdirectory per class:
//!
//! ```text
//! data/train/
//! ├── airplane/
//! │   ├── 0001.png
//! │   └── 0002.png
//! ├── automobile/
//! │   └── ...
//! └── ...
//! ```
//!
//! Class indices are assigned by sorted directory name so train and
//! validation partitions with the same class set agree on labels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::batcher::{ImageItem, InMemoryDataset};
use crate::error::{Error, Result};
use crate::IMAGE_SIZE;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// An image-folder partition with lazy decoding.
#[derive(Debug, Clone)]
pub struct ImageFolderDataset {
    /// Root directory of the partition
    root_dir: PathBuf,
    /// All (path, label) pairs
    samples: Vec<(PathBuf, usize)>,
    /// Mapping from class name to label index
    class_to_idx: HashMap<String, usize>,
    /// Target square image size
    image_size: usize,
}

impl ImageFolderDataset {
    /// Scan a partition directory.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        Self::with_image_size(root_dir, IMAGE_SIZE)
    }

    /// Scan a partition directory with a custom target image size.
    pub fn with_image_size<P: AsRef<Path>>(root_dir: P, image_size: usize) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading image folder dataset from {:?}", root_dir);

        if !root_dir.exists() {
            return Err(Error::Data(format!(
                "dataset directory does not exist: {:?}",
                root_dir
            )));
        }

        let mut class_dirs: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push(name.to_string());
                }
            }
        }
        class_dirs.sort();

        if class_dirs.is_empty() {
            return Err(Error::Data(format!(
                "no class subdirectories found in {:?}",
                root_dir
            )));
        }

        let class_to_idx: HashMap<String, usize> = class_dirs
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut samples = Vec::new();
        for class_name in &class_dirs {
            let class_dir = root_dir.join(class_name);
            let label = class_to_idx[class_name];

            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                        samples.push((path, label));
                    }
                }
            }

            debug!("Class '{}' mapped to label {}", class_name, label);
        }

        if samples.is_empty() {
            return Err(Error::Data(format!(
                "no images found under {:?}",
                root_dir
            )));
        }

        info!(
            "Loaded {} samples across {} classes",
            samples.len(),
            class_dirs.len()
        );

        Ok(Self {
            root_dir,
            samples,
            class_to_idx,
            image_size,
        })
    }

    /// Number of classes discovered in the partition.
    pub fn num_classes(&self) -> usize {
        self.class_to_idx.len()
    }

    /// Class name for a label index.
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_to_idx
            .iter()
            .find(|(_, &idx)| idx == label)
            .map(|(name, _)| name.as_str())
    }

    /// Per-class sample counts.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for (_, label) in &self.samples {
            counts[*label] += 1;
        }
        counts
    }

    /// Shuffle the sample order in place with a fixed seed.
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.samples.shuffle(&mut rng);
    }

    /// Partition root.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Decode every sample up front. Any undecodable file fails the whole
    /// load; a training or evaluation run never silently drops samples.
    pub fn into_memory(self) -> Result<InMemoryDataset> {
        let items: Result<Vec<ImageItem>> = self
            .samples
            .iter()
            .map(|(path, label)| ImageItem::from_path(path, *label, self.image_size))
            .collect();

        Ok(InMemoryDataset::new(items?))
    }
}

impl Dataset<ImageItem> for ImageFolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let (path, label) = self.samples.get(index)?;
        ImageItem::from_path(path, *label, self.image_size).ok()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_image(path: &Path, color: [u8; 3]) {
        let img = RgbImage::from_pixel(8, 8, Rgb(color));
        img.save(path).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for (class, color) in [("cat", [255u8, 0, 0]), ("dog", [0u8, 0, 255])] {
            let class_dir = dir.path().join(class);
            std::fs::create_dir_all(&class_dir).unwrap();
            write_image(&class_dir.join("a.png"), color);
            write_image(&class_dir.join("b.png"), color);
        }
        dir
    }

    #[test]
    fn test_folder_scan() {
        let dir = fixture();
        let dataset = ImageFolderDataset::with_image_size(dir.path(), 8).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.num_classes(), 2);
        assert_eq!(dataset.class_name(0), Some("cat"));
        assert_eq!(dataset.class_name(1), Some("dog"));
        assert_eq!(dataset.class_counts(), vec![2, 2]);
    }

    #[test]
    fn test_missing_directory_is_data_error() {
        let err = ImageFolderDataset::new("/nonexistent/dataset/path").unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[test]
    fn test_empty_directory_is_data_error() {
        let dir = TempDir::new().unwrap();
        let err = ImageFolderDataset::new(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[test]
    fn test_lazy_get_decodes() {
        let dir = fixture();
        let dataset = ImageFolderDataset::with_image_size(dir.path(), 8).unwrap();

        let item = dataset.get(0).unwrap();
        assert_eq!(item.image.len(), 3 * 8 * 8);
        // Red fixture image: R plane saturated, B plane zero
        assert!((item.image[0] - 1.0).abs() < 1e-6);
        assert!(item.image[2 * 64] < 1e-6);
    }

    #[test]
    fn test_into_memory() {
        let dir = fixture();
        let dataset = ImageFolderDataset::with_image_size(dir.path(), 8)
            .unwrap()
            .into_memory()
            .unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.num_classes(), 2);
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let dir = fixture();
        let mut a = ImageFolderDataset::with_image_size(dir.path(), 8).unwrap();
        let mut b = a.clone();

        a.shuffle(42);
        b.shuffle(42);
        assert_eq!(a.samples, b.samples);
    }
}
