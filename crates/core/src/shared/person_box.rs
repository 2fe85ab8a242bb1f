/// A validated person bounding box in pixel coordinates.
///
/// Invariants, guaranteed by construction: the top-left corner lies inside
/// the frame, `width > 0`, `height > 0`, and `x + width` / `y + height`
/// never exceed the frame dimensions. Code holding a `PersonBox` can index
/// the frame without further bounds checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PersonBox {
    /// Builds a box from raw floating-point corners as reported by a
    /// detector, which may lie outside the frame.
    ///
    /// The top-left corner is floored and clamped to `>= 0`; the
    /// bottom-right corner is floored and clamped to `<= width-1` /
    /// `<= height-1`. Returns `None` when the clamped box is degenerate
    /// (zero or inverted extent).
    pub fn from_corners(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        let left = x1.floor().max(0.0);
        let top = y1.floor().max(0.0);
        let right = x2.floor().min(f64::from(frame_width - 1));
        let bottom = y2.floor().min(f64::from(frame_height - 1));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}
