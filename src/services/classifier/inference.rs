use crate::error::AppError;
use image::{DynamicImage, ImageReader};
use ndarray::Array4;
use std::path::Path;

/// Decode an image file, mapping any open/decode failure to `ImageDecode`
/// so the organizer can record it per file and keep going.
pub fn decode_image(path: &Path) -> Result<DynamicImage, AppError> {
    ImageReader::open(path)
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Build the oracle input: aspect-distorting resize to a square edge, then
/// an NCHW f32 tensor with pixels scaled to [-1, 1] (MobileNet-family
/// preprocessing convention).
pub fn to_input_tensor(img: &DynamicImage, input_size: u32) -> Result<Array4<f32>, AppError> {
    let resized = img.resize_exact(input_size, input_size, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let hw = (input_size * input_size) as usize;
    let raw = rgb.into_raw();
    let mut data = vec![0f32; 3 * hw];
    // HWC → CHW while normalizing.
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        data[i] = pixel[0] as f32 / 127.5 - 1.0;
        data[hw + i] = pixel[1] as f32 / 127.5 - 1.0;
        data[2 * hw + i] = pixel[2] as f32 / 127.5 - 1.0;
    }

    Array4::from_shape_vec((1, 3, input_size as usize, input_size as usize), data)
        .map_err(|e| AppError::Other(format!("failed to create input tensor: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_has_nchw_shape_and_unit_range() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(50, 30, |x, _| {
            image::Rgb([(x * 5) as u8, 0, 255])
        }));
        let tensor = to_input_tensor(&img, 224).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        for v in tensor.iter() {
            assert!(*v >= -1.0 && *v <= 1.0);
        }
        // Blue channel is saturated at 255 everywhere.
        assert!((tensor[[0, 2, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_byte_file_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        let err = decode_image(&path).unwrap_err();
        assert!(matches!(err, AppError::ImageDecode { .. }));
    }
}
