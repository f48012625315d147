//! Core framework types shared across the pipeline

pub mod error;

pub use error::{Result, TtsError};
