//! resume-fit library: explainable resume and job description compatibility scoring

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{EngineError, Result};
