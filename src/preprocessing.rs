use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{Array, Ix4};
use thiserror::Error;

/// Side length of the square input the MobileNetV2 backbone expects.
pub const INPUT_SIZE: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Error reading image: {0}")]
    Read(#[from] std::io::Error),
    #[error("Error decoding image: {0}")]
    Decode(#[from] image::ImageError),
}

pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    let image_reader =
        image::ImageReader::new(std::io::Cursor::new(image_data)).with_guessed_format()?;

    Ok(image_reader.decode()?)
}

/// MobileNetV2 input scaling: maps [0, 255] onto [-1, 1].
#[inline]
pub fn normalize(value: u8) -> f32 {
    (value as f32) / 127.5 - 1.
}

/// Builds the (1, 224, 224, 3) channel-last RGB tensor fed to the classifier.
///
/// The image is stretched to 224x224 with bicubic (Catmull-Rom) resampling,
/// whatever its aspect ratio. Alpha and grayscale inputs are converted to
/// RGB first so the channel count never varies.
pub fn preprocess(image: &DynamicImage) -> Array<f32, Ix4> {
    let size = INPUT_SIZE as usize;
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let resized = rgb.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let mut input = Array::zeros((1, size, size, INPUT_CHANNELS));
    for pixel in resized.pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, y, x, 0]] = normalize(r);
        input[[0, y, x, 1]] = normalize(g);
        input[[0, y, x, 2]] = normalize(b);
    }

    input
}

pub fn preprocess_bytes(image_data: &[u8]) -> Result<(Array<f32, Ix4>, u32, u32), PreprocessError> {
    let image = decode_image(image_data)?;
    let (width, height) = image.dimensions();

    Ok((preprocess(&image), width, height))
}
