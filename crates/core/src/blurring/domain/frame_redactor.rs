use crate::shared::frame::Frame;
use crate::shared::person_box::PersonBox;

/// Domain interface for redacting person boxes within a frame.
///
/// Implementations mutate the frame in place and never fail: a box whose
/// head region clamps to nothing is skipped, and every valid `PersonBox`
/// stays within frame bounds by construction.
pub trait FrameRedactor: Send {
    fn redact(&self, frame: &mut Frame, boxes: &[PersonBox]);
}
