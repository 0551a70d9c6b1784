use image::{DynamicImage, imageops::FilterType};
use ndarray::Array4;

pub const DEFAULT_INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid target size {0}")]
    InvalidSize(u32),
}

/// NHWC `f32` image batch of size one, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor {
    array: Array4<f32>,
}

impl PreprocessedTensor {
    pub fn shape(&self) -> [usize; 4] {
        let dims = self.array.dim();
        [dims.0, dims.1, dims.2, dims.3]
    }

    pub fn array(&self) -> &Array4<f32> {
        &self.array
    }

    /// Values in row-major NHWC order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.array.iter().copied().collect()
    }
}

/// Decodes `bytes` and turns them into a model input of `size`×`size` pixels.
///
/// The image is stretched to the target size with nearest-neighbour sampling,
/// converted to RGB and scaled by `1/255`.
pub fn preprocess(bytes: &[u8], size: u32) -> Result<PreprocessedTensor, PreprocessError> {
    let image = image::load_from_memory(bytes)?;
    preprocess_image(&image, size)
}

pub fn preprocess_image(
    image: &DynamicImage,
    size: u32,
) -> Result<PreprocessedTensor, PreprocessError> {
    if size == 0 {
        return Err(PreprocessError::InvalidSize(size));
    }

    let resized = image.resize_exact(size, size, FilterType::Nearest);
    let rgb = resized.to_rgb8();
    let side = size as usize;

    let array = Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });

    Ok(PreprocessedTensor { array })
}
