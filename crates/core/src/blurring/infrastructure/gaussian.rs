use crate::blurring::domain::head_region::BlurRect;

/// Precompute a normalized 1-D Gaussian kernel.
///
/// `kernel_size` must be odd and >= 1; `sigma` is the standard deviation
/// in pixels.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    debug_assert!(sigma > 0.0);
    let half = (kernel_size / 2) as f64;
    let mut weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights.iter().map(|&w| w as f32).collect()
}

/// Separable Gaussian blur of an interleaved pixel buffer, in place.
///
/// Two passes: horizontal into `scratch` (f32, so quantization happens
/// once), then vertical back into `data`. Samples past the buffer edge
/// replicate the edge pixel. `scratch` is resized as needed and can be
/// reused across calls.
pub fn separable_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    scratch: &mut Vec<f32>,
) {
    let support = kernel.len();
    if support <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = (support / 2) as isize;

    scratch.resize(width * height * channels, 0.0);

    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1) as usize;
                    acc += f32::from(data[(row + sx) * channels + c]) * weight;
                }
                scratch[(row + x) * channels + c] = acc;
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - half).clamp(0, height as isize - 1) as usize;
                    acc += scratch[(sy * width + x) * channels + c] * weight;
                }
                data[(y * width + x) * channels + c] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Copy the pixels under `rect` out of a frame buffer into `out`.
///
/// The caller guarantees `rect` lies inside the frame. `out` is resized
/// and can be reused across calls.
pub fn extract_rect(
    data: &[u8],
    frame_width: usize,
    channels: usize,
    rect: BlurRect,
    out: &mut Vec<u8>,
) {
    let (x, y, w, h) = rect_as_usize(rect);
    let row_bytes = w * channels;
    out.resize(row_bytes * h, 0);
    for row in 0..h {
        let src = ((y + row) * frame_width + x) * channels;
        let dst = row * row_bytes;
        out[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
    }
}

/// Copy a processed rectangle back into the frame buffer it came from.
pub fn write_rect_back(
    data: &mut [u8],
    blurred: &[u8],
    frame_width: usize,
    channels: usize,
    rect: BlurRect,
) {
    let (x, y, w, h) = rect_as_usize(rect);
    let row_bytes = w * channels;
    for row in 0..h {
        let dst = ((y + row) * frame_width + x) * channels;
        let src = row * row_bytes;
        data[dst..dst + row_bytes].copy_from_slice(&blurred[src..src + row_bytes]);
    }
}

fn rect_as_usize(rect: BlurRect) -> (usize, usize, usize, usize) {
    (
        rect.x as usize,
        rect.y as usize,
        rect.width as usize,
        rect.height as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_sums_to_one() {
        let k = gaussian_kernel_1d(51, 30.0);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_kernel_is_symmetric_with_peak_at_center() {
        let k = gaussian_kernel_1d(9, 2.0);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-7);
        }
        assert!(k.iter().all(|&w| w <= k[4]));
    }

    #[test]
    fn test_wider_sigma_flattens_the_kernel() {
        let narrow = gaussian_kernel_1d(9, 1.0);
        let wide = gaussian_kernel_1d(9, 10.0);
        assert!(narrow[4] > wide[4]);
        assert!(narrow[0] < wide[0]);
    }

    #[test]
    fn test_blur_keeps_uniform_buffer_uniform() {
        let mut data = vec![128u8; 12 * 12 * 3];
        let kernel = gaussian_kernel_1d(5, 1.5);
        separable_blur(&mut data, 12, 12, 3, &kernel, &mut Vec::new());
        assert!(data.iter().all(|&v| (i32::from(v) - 128).abs() <= 1));
    }

    #[test]
    fn test_blur_spreads_a_bright_pixel() {
        let mut data = vec![0u8; 11 * 11 * 3];
        let center = (5 * 11 + 5) * 3;
        data[center] = 255;
        data[center + 1] = 255;
        data[center + 2] = 255;

        let kernel = gaussian_kernel_1d(5, 1.5);
        separable_blur(&mut data, 11, 11, 3, &kernel, &mut Vec::new());

        assert!(data[center] < 255);
        let neighbor = (5 * 11 + 6) * 3;
        assert!(data[neighbor] > 0);
    }

    #[test]
    fn test_single_tap_kernel_is_identity() {
        let mut data = vec![42u8; 6 * 4 * 3];
        let original = data.clone();
        separable_blur(&mut data, 6, 4, 3, &[1.0], &mut Vec::new());
        assert_eq!(data, original);
    }

    #[test]
    fn test_extract_and_write_back_roundtrip() {
        // 8x8 gradient frame; pull a rect out and push it back untouched.
        let mut data: Vec<u8> = (0..8 * 8 * 3).map(|i| (i % 251) as u8).collect();
        let original = data.clone();
        let rect = BlurRect {
            x: 2,
            y: 3,
            width: 4,
            height: 3,
        };

        let mut patch = Vec::new();
        extract_rect(&data, 8, 3, rect, &mut patch);
        assert_eq!(patch.len(), 4 * 3 * 3);
        write_rect_back(&mut data, &patch, 8, 3, rect);
        assert_eq!(data, original);
    }

    #[test]
    fn test_extract_rect_copies_the_right_pixels() {
        let mut data = vec![0u8; 8 * 8 * 3];
        // Mark pixel (x=4, y=2).
        let idx = (2 * 8 + 4) * 3;
        data[idx] = 9;

        let rect = BlurRect {
            x: 4,
            y: 2,
            width: 2,
            height: 2,
        };
        let mut patch = Vec::new();
        extract_rect(&data, 8, 3, rect, &mut patch);
        assert_eq!(patch[0], 9);
    }
}
