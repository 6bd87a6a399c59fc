//! Input processing module
//! Reads resume and job description files into normalized documents

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::InputManager;
