//! Dataset loading and batching.
//!
//! The training and validation partitions are plain image folders (one
//! subdirectory per class). Items are decoded into CHW float buffers in
//! `[0, 1]`, the exact transform the inference path applies, so a model
//! never sees a different pixel distribution at serving time than it saw in
//! training. Augmentation (horizontal flip) is applied to the training
//! partition only.

pub mod augmentation;
pub mod batcher;
pub mod loader;

pub use augmentation::flip_horizontal;
pub use batcher::{ImageBatch, ImageBatcher, ImageItem, InMemoryDataset};
pub use loader::ImageFolderDataset;
