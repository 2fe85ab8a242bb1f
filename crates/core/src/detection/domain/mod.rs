pub mod box_smoother;
pub mod detection;
pub mod detection_filter;
pub mod person_detector;
