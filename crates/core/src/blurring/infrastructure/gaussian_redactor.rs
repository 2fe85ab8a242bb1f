use std::cell::RefCell;

use crate::blurring::domain::frame_redactor::FrameRedactor;
use crate::blurring::domain::head_region::head_region;
use crate::shared::constants::{BLUR_KERNEL_SIZE, BLUR_SIGMA};
use crate::shared::frame::Frame;
use crate::shared::person_box::PersonBox;

use super::gaussian;

/// Blurs the head region of each person box with a separable Gaussian.
///
/// The kernel is computed once; the region and pass buffers are reused
/// across boxes and frames behind `RefCell` so `redact` can stay `&self`.
pub struct GaussianRedactor {
    kernel: Vec<f32>,
    region_buf: RefCell<Vec<u8>>,
    pass_buf: RefCell<Vec<f32>>,
}

impl GaussianRedactor {
    pub fn new(kernel_size: usize, sigma: f64) -> Self {
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size, sigma),
            region_buf: RefCell::new(Vec::new()),
            pass_buf: RefCell::new(Vec::new()),
        }
    }
}

impl Default for GaussianRedactor {
    fn default() -> Self {
        Self::new(BLUR_KERNEL_SIZE, BLUR_SIGMA)
    }
}

impl FrameRedactor for GaussianRedactor {
    fn redact(&self, frame: &mut Frame, boxes: &[PersonBox]) {
        let frame_width = frame.width();
        let frame_height = frame.height();
        let width = frame_width as usize;
        let channels = frame.channels() as usize;
        let data = frame.data_mut();

        let mut region = self.region_buf.borrow_mut();
        let mut pass = self.pass_buf.borrow_mut();

        for person in boxes {
            let Some(rect) = head_region(person, frame_width, frame_height) else {
                continue;
            };
            gaussian::extract_rect(data, width, channels, rect, &mut region);
            gaussian::separable_blur(
                &mut region,
                rect.width as usize,
                rect.height as usize,
                channels,
                &self.kernel,
                &mut pass,
            );
            gaussian::write_rect_back(data, &region, width, channels, rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::head_region::BlurRect;

    fn make_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(vec![value; (width * height * 3) as usize], width, height, 3, 0)
    }

    fn person(x: u32, y: u32, w: u32, h: u32) -> PersonBox {
        PersonBox {
            x,
            y,
            width: w,
            height: h,
        }
    }

    /// Paints a checkerboard so any blur visibly changes pixel values.
    fn checkerboard(frame: &mut Frame) {
        let width = frame.width() as usize;
        let data = frame.data_mut();
        for (i, chunk) in data.chunks_mut(3).enumerate() {
            let (x, y) = (i % width, i / width);
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            chunk.fill(v);
        }
    }

    fn rect_contains(rect: BlurRect, x: u32, y: u32) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    #[test]
    fn test_no_boxes_leaves_frame_untouched() {
        let mut frame = make_frame(64, 64, 77);
        let original = frame.data().to_vec();
        GaussianRedactor::new(5, 1.5).redact(&mut frame, &[]);
        assert_eq!(frame.data(), &original[..]);
    }

    #[test]
    fn test_head_region_pixels_change() {
        let mut frame = make_frame(100, 100, 0);
        checkerboard(&mut frame);
        let original = frame.data().to_vec();

        let target = person(30, 40, 20, 40);
        let rect = head_region(&target, 100, 100).unwrap();
        GaussianRedactor::new(5, 1.5).redact(&mut frame, &[target]);

        // A checkerboard pixel inside the head rect must have moved toward
        // the 128 average.
        let inside = ((rect.y + 1) as usize * 100 + (rect.x + 1) as usize) * 3;
        assert_ne!(frame.data()[inside], original[inside]);
    }

    #[test]
    fn test_pixels_outside_head_region_unchanged() {
        let mut frame = make_frame(100, 100, 0);
        checkerboard(&mut frame);
        let original = frame.data().to_vec();

        let target = person(30, 40, 20, 40);
        let rect = head_region(&target, 100, 100).unwrap();
        GaussianRedactor::new(5, 1.5).redact(&mut frame, &[target]);

        for y in 0..100u32 {
            for x in 0..100u32 {
                if rect_contains(rect, x, y) {
                    continue;
                }
                let idx = (y as usize * 100 + x as usize) * 3;
                assert_eq!(
                    frame.data()[idx],
                    original[idx],
                    "pixel ({x},{y}) outside the head rect changed"
                );
            }
        }
    }

    #[test]
    fn test_overlapping_boxes_are_both_processed() {
        let mut frame = make_frame(100, 100, 0);
        checkerboard(&mut frame);
        let original = frame.data().to_vec();

        let a = person(20, 30, 30, 50);
        let b = person(30, 30, 30, 50);
        GaussianRedactor::new(5, 1.5).redact(&mut frame, &[a.clone(), b.clone()]);

        let rect_a = head_region(&a, 100, 100).unwrap();
        let rect_b = head_region(&b, 100, 100).unwrap();
        let in_a = ((rect_a.y + 1) as usize * 100 + (rect_a.x + 1) as usize) * 3;
        let in_b_only =
            ((rect_b.y + 1) as usize * 100 + (rect_b.x + rect_b.width - 2) as usize) * 3;
        assert_ne!(frame.data()[in_a], original[in_a]);
        assert_ne!(frame.data()[in_b_only], original[in_b_only]);
    }

    #[test]
    fn test_degenerate_head_region_is_skipped() {
        // A one-pixel-tall box floors to an empty head rect.
        let mut frame = make_frame(64, 64, 50);
        let original = frame.data().to_vec();
        GaussianRedactor::new(5, 1.5).redact(&mut frame, &[person(10, 10, 20, 1)]);
        assert_eq!(frame.data(), &original[..]);
    }

    #[test]
    fn test_box_touching_frame_edges_does_not_panic() {
        let mut frame = make_frame(64, 64, 0);
        checkerboard(&mut frame);
        // Clamped on the left/top and right/bottom in turn.
        GaussianRedactor::new(5, 1.5).redact(
            &mut frame,
            &[person(0, 0, 20, 40), person(43, 23, 20, 40)],
        );
    }

    #[test]
    fn test_default_uses_redaction_policy_kernel() {
        let redactor = GaussianRedactor::default();
        assert_eq!(redactor.kernel.len(), BLUR_KERNEL_SIZE);
    }
}
