pub mod constants;
pub mod frame;
pub mod person_box;
pub mod video_metadata;
