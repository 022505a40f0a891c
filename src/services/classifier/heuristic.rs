use image::DynamicImage;

/// Variance of the grayscale pixel values of the full-resolution image.
///
/// Documents, whiteboards, and handwritten notes photograph as dark marks
/// on a bright background, which pushes the grayscale variance well above
/// typical scenery; values over ~5000 (on the 0-255 scale) are treated as
/// document-like by the classifier.
pub fn grayscale_variance(img: &DynamicImage) -> f32 {
    let gray = img.to_luma8();
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }

    let n = pixels.len() as f64;
    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    for &p in pixels {
        let v = p as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    ((sum_sq / n) - mean * mean).max(0.0) as f32
}
