/// One raw detector output row, before any validation.
///
/// Corners are in source pixel coordinates but untrusted: they may lie
/// outside the frame or be inverted. A `Detection` lives for exactly one
/// inference call and is discarded after filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}
