//! Pipeline configuration matching the persisted `tts.json` structure

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TtsError};

/// Root pipeline configuration
///
/// Mirrors the on-disk layout: audio-encoder parameters under `ae`,
/// text-to-latent parameters under `ttl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Audio encoder (waveform) parameters
    pub ae: AudioEncoderConfig,

    /// Text-to-latent parameters
    pub ttl: TextToLatentConfig,
}

/// Audio encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioEncoderConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Waveform samples covered by one uncompressed latent frame
    pub base_chunk_size: usize,
}

/// Text-to-latent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToLatentConfig {
    /// Temporal compression applied on top of `base_chunk_size`
    pub chunk_compress_factor: usize,

    /// Latent channel count before compression stacking
    pub latent_dim: usize,
}

impl PipelineConfig {
    /// Validate that every derived quantity is well defined.
    pub fn validate(&self) -> Result<()> {
        if self.ae.sample_rate == 0 {
            return Err(TtsError::invalid("sample_rate must be positive"));
        }
        if self.ae.base_chunk_size == 0 {
            return Err(TtsError::invalid("base_chunk_size must be positive"));
        }
        if self.ttl.chunk_compress_factor == 0 {
            return Err(TtsError::invalid("chunk_compress_factor must be positive"));
        }
        if self.ttl.latent_dim == 0 {
            return Err(TtsError::invalid("latent_dim must be positive"));
        }
        Ok(())
    }

    /// Waveform samples covered by one latent frame.
    pub fn latent_chunk_size(&self) -> usize {
        self.ae.base_chunk_size * self.ttl.chunk_compress_factor
    }

    /// Channel dimension of the noisy latent tensor.
    pub fn latent_channels(&self) -> usize {
        self.ttl.latent_dim * self.ttl.chunk_compress_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig {
            ae: AudioEncoderConfig {
                sample_rate: 44100,
                base_chunk_size: 512,
            },
            ttl: TextToLatentConfig {
                chunk_compress_factor: 4,
                latent_dim: 24,
            },
        }
    }

    #[test]
    fn test_derived_sizes() {
        let cfg = config();
        assert_eq!(cfg.latent_chunk_size(), 2048);
        assert_eq!(cfg.latent_channels(), 96);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_fields_rejected() {
        let mut cfg = config();
        cfg.ae.sample_rate = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.ttl.chunk_compress_factor = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parses_persisted_shape() {
        let raw = r#"{
            "ae": { "sample_rate": 44100, "base_chunk_size": 512 },
            "ttl": { "chunk_compress_factor": 4, "latent_dim": 24 }
        }"#;
        let cfg: PipelineConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.ae.sample_rate, 44100);
        assert_eq!(cfg.ttl.latent_dim, 24);
    }
}
