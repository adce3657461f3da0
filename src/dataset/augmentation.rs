//! Training-time augmentation.
//!
//! The training partition gets a random horizontal flip; validation,
//! evaluation, and inference always see the clean image. The caller owns the
//! rng so a seeded run reproduces the same flip sequence.

use rand::Rng;

use super::batcher::ImageItem;

/// Flip a CHW float image buffer along the horizontal axis.
pub fn flip_horizontal(image: &[f32], width: usize, height: usize) -> Vec<f32> {
    let channels = image.len() / (width * height);
    let mut flipped = vec![0.0f32; image.len()];

    for c in 0..channels {
        let plane = c * height * width;
        for y in 0..height {
            for x in 0..width {
                flipped[plane + y * width + x] = image[plane + y * width + (width - 1 - x)];
            }
        }
    }

    flipped
}

/// Apply a horizontal flip to the item with the given probability.
pub fn maybe_flip<R: Rng>(item: &mut ImageItem, image_size: usize, probability: f64, rng: &mut R) {
    if probability > 0.0 && rng.gen_bool(probability) {
        item.image = flip_horizontal(&item.image, image_size, image_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_flip_reverses_rows() {
        // 1 channel worth per plane, 2x2 image, 3 channels
        let image: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let flipped = flip_horizontal(&image, 2, 2);

        // First channel rows [0,1],[2,3] become [1,0],[3,2]
        assert_eq!(&flipped[0..4], &[1.0, 0.0, 3.0, 2.0]);
        assert_eq!(&flipped[4..8], &[5.0, 4.0, 7.0, 6.0]);
    }

    #[test]
    fn test_double_flip_is_identity() {
        let image: Vec<f32> = (0..27).map(|v| v as f32 * 0.5).collect();
        let back = flip_horizontal(&flip_horizontal(&image, 3, 3), 3, 3);
        assert_eq!(back, image);
    }

    #[test]
    fn test_maybe_flip_zero_probability_is_noop() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut item = ImageItem::from_data((0..12).map(|v| v as f32).collect(), 0);
        let original = item.image.clone();

        maybe_flip(&mut item, 2, 0.0, &mut rng);
        assert_eq!(item.image, original);
    }

    #[test]
    fn test_maybe_flip_always() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut item = ImageItem::from_data((0..12).map(|v| v as f32).collect(), 0);

        maybe_flip(&mut item, 2, 1.0, &mut rng);
        assert_eq!(&item.image[0..4], &[1.0, 0.0, 3.0, 2.0]);
    }
}
