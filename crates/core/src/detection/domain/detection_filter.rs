use crate::detection::domain::detection::Detection;
use crate::shared::constants::{CONFIDENCE_THRESHOLD, PERSON_CLASS_ID};
use crate::shared::person_box::PersonBox;

/// Reduces one frame's raw detections to validated person boxes.
///
/// Keeps only the person class at or above the confidence threshold,
/// clamps corners to the frame, and drops anything degenerate after
/// clamping. Detector order is preserved and overlapping boxes are all
/// kept. This stage never fails; malformed rows are silently dropped.
pub fn filter_detections(
    detections: &[Detection],
    frame_width: u32,
    frame_height: u32,
) -> Vec<PersonBox> {
    detections
        .iter()
        .filter(|d| d.class_id == PERSON_CLASS_ID && d.confidence >= CONFIDENCE_THRESHOLD)
        .filter_map(|d| PersonBox::from_corners(d.x1, d.y1, d.x2, d.y2, frame_width, frame_height))
        .collect()
}
