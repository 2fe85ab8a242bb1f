pub mod frame_redactor;
pub mod head_region;
