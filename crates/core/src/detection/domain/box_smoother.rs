use crate::shared::constants::MAX_HELD_FRAMES;
use crate::shared::person_box::PersonBox;

/// Bridges short detection gaps by holding the last detected boxes.
///
/// Detector output is independent per frame and can miss a person for a
/// frame or two under pose or occlusion noise; letting the blur flicker
/// off for those frames leaks identity. The previous box set is held or
/// dropped as a whole, never aged out box by box.
pub struct BoxSmoother {
    last_boxes: Vec<PersonBox>,
    stale_frames: usize,
    max_held_frames: usize,
}

impl BoxSmoother {
    pub fn new(max_held_frames: usize) -> Self {
        Self {
            last_boxes: Vec::new(),
            stale_frames: 0,
            max_held_frames,
        }
    }

    /// Advances one frame and returns the effective set to redact.
    ///
    /// A non-empty input replaces the held set and resets the stale
    /// counter. An empty input returns the held set unchanged for up to
    /// `max_held_frames` consecutive misses, after which nothing is
    /// redacted until a detection arrives again.
    pub fn smooth(&mut self, detected: Vec<PersonBox>) -> Vec<PersonBox> {
        if !detected.is_empty() {
            self.stale_frames = 0;
            self.last_boxes = detected;
            return self.last_boxes.clone();
        }

        self.stale_frames += 1;
        if !self.last_boxes.is_empty() && self.stale_frames <= self.max_held_frames {
            self.last_boxes.clone()
        } else {
            Vec::new()
        }
    }
}

impl Default for BoxSmoother {
    fn default() -> Self {
        Self::new(MAX_HELD_FRAMES)
    }
}
