mod gaussian;
pub mod gaussian_redactor;
