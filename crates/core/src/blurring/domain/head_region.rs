use crate::shared::constants::{HEAD_HEIGHT_RATIO, HEAD_PADDING_RATIO};
use crate::shared::person_box::PersonBox;

/// Pixel rectangle targeted by the redaction blur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a full-body box to the padded head rectangle to blur.
///
/// The head is approximated as the top half of the body box, padded by a
/// fixed fraction on each side to cover hair and box jitter, then clamped
/// to the frame. Returns `None` when the clamped rectangle is empty
/// (possible for boxes a single pixel tall).
pub fn head_region(person: &PersonBox, frame_width: u32, frame_height: u32) -> Option<BlurRect> {
    let head_h = (f64::from(person.height) * HEAD_HEIGHT_RATIO).floor() as u32;
    let pad_x = (f64::from(person.width) * HEAD_PADDING_RATIO).floor() as u32;
    let pad_y = (f64::from(head_h) * HEAD_PADDING_RATIO).floor() as u32;

    let x0 = person.x.saturating_sub(pad_x);
    let y0 = person.y.saturating_sub(pad_y);
    let x1 = (person.x + person.width + pad_x).min(frame_width);
    let y1 = (person.y + head_h + pad_y).min(frame_height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(BlurRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(x: u32, y: u32, width: u32, height: u32) -> PersonBox {
        PersonBox {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_interior_box_geometry() {
        // 80x160 body at (100,100): head is the top 80 rows, padded by
        // floor(80*0.15)=12 on each side.
        let rect = head_region(&person(100, 100, 80, 160), 640, 480).unwrap();
        assert_eq!(
            rect,
            BlurRect {
                x: 88,
                y: 88,
                width: 104,
                height: 104,
            }
        );
    }

    #[test]
    fn test_padding_clamps_at_origin() {
        let rect = head_region(&person(5, 3, 80, 160), 640, 480).unwrap();
        assert_eq!((rect.x, rect.y), (0, 0));
        // Right/bottom unaffected by the origin clamp.
        assert_eq!(rect.x + rect.width, 5 + 80 + 12);
        assert_eq!(rect.y + rect.height, 3 + 80 + 12);
    }

    #[test]
    fn test_padding_clamps_at_far_edges() {
        let rect = head_region(&person(560, 300, 79, 179), 640, 480).unwrap();
        assert!(rect.x + rect.width <= 640);
        assert!(rect.y + rect.height <= 480);
    }

    #[test]
    fn test_head_is_half_of_tall_box() {
        let rect = head_region(&person(200, 50, 40, 301), 640, 480).unwrap();
        // head_h = floor(301 * 0.5) = 150, pad_y = floor(150 * 0.15) = 22.
        assert_eq!(rect.y, 50 - 22);
        assert_eq!(rect.y + rect.height, 50 + 150 + 22);
    }

    #[test]
    fn test_single_pixel_tall_box_yields_nothing() {
        // head_h floors to zero, so the rectangle is empty.
        assert!(head_region(&person(100, 100, 80, 1), 640, 480).is_none());
    }

    #[test]
    fn test_tiny_box_still_covered() {
        let rect = head_region(&person(10, 10, 4, 6), 640, 480).unwrap();
        // Pads floor to zero; the bare head rows remain.
        assert_eq!(
            rect,
            BlurRect {
                x: 10,
                y: 10,
                width: 4,
                height: 3,
            }
        );
    }
}
