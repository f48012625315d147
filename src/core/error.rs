//! Structured error handling for the synthesis pipeline
//!
//! Every error that crosses the public API carries enough context (chunk
//! index, step index, endpoint name) to diagnose a failed request without
//! source inspection. A failed chunk aborts the whole request; nothing is
//! skipped or silently degraded.

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::Endpoint;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for the synthesis pipeline
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// The tokenizer met a code point absent from the vocabulary.
    ///
    /// Request-fatal unless the caller substitutes the character up front;
    /// the pipeline never drops characters on its own.
    #[error("unsupported character {ch:?} (U+{code_point:04X}) at position {position} in chunk {chunk_index}")]
    UnsupportedCharacter {
        ch: char,
        code_point: u32,
        position: usize,
        chunk_index: usize,
    },

    /// Precondition violation (step count, style batch size, config values).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A backend endpoint call failed or returned a malformed output.
    #[error(
        "{endpoint} failed for chunk {chunk_index}{}: {message}",
        .step.map(|s| format!(" at step {s}")).unwrap_or_default()
    )]
    Inference {
        endpoint: Endpoint,
        chunk_index: usize,
        /// Denoising step index, for vector-estimator failures.
        step: Option<usize>,
        message: String,
    },

    /// A required style/vocabulary/config file is absent.
    #[error("required asset missing: {}", path.display())]
    AssetMissing { path: PathBuf },

    /// I/O failure outside of plain file absence.
    #[error("i/o error: {message}")]
    Io { message: String, path: Option<PathBuf> },

    /// Tensor plumbing or parse failure inside the orchestrator.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TtsError {
    /// Shorthand for `InvalidArgument`.
    pub fn invalid(message: impl Into<String>) -> Self {
        TtsError::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<candle_core::Error> for TtsError {
    fn from(err: candle_core::Error) -> Self {
        TtsError::Internal {
            message: format!("tensor operation failed: {err}"),
        }
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        TtsError::Internal {
            message: format!("JSON parse failed: {err}"),
        }
    }
}

impl From<anyhow::Error> for TtsError {
    fn from(err: anyhow::Error) -> Self {
        TtsError::Internal {
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_character_display() {
        let err = TtsError::UnsupportedCharacter {
            ch: '€',
            code_point: '€' as u32,
            position: 7,
            chunk_index: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("U+20AC"));
        assert!(msg.contains("position 7"));
        assert!(msg.contains("chunk 2"));
    }

    #[test]
    fn test_inference_display_names_endpoint_and_chunk() {
        let err = TtsError::Inference {
            endpoint: Endpoint::VectorEstimator,
            chunk_index: 1,
            step: Some(3),
            message: "backend exploded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("vector_estimator"));
        assert!(msg.contains("chunk 1"));
        assert!(msg.contains("at step 3"));
    }

    #[test]
    fn test_inference_display_omits_absent_step() {
        let err = TtsError::Inference {
            endpoint: Endpoint::Vocoder,
            chunk_index: 0,
            step: None,
            message: "empty waveform".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("chunk 0: empty waveform"));
        assert!(!msg.contains("step"));
    }

    #[test]
    fn test_asset_missing_display() {
        let err = TtsError::AssetMissing {
            path: PathBuf::from("voice_styles/M1.json"),
        };
        assert!(err.to_string().contains("voice_styles"));
    }
}
