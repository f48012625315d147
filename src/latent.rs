//! Duration-driven latent scheduling
//!
//! Converts per-chunk predicted durations into a masked Gaussian latent:
//! seconds become waveform samples, samples become latent frames (ceiling
//! division by the latent chunk size), and the batch is padded to the
//! longest chunk with a validity mask zeroing noise past each true length.

use candle_core::{Device, Tensor};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::core::error::{Result, TtsError};
use crate::text::tokenizer::length_to_mask;

/// Schedules noisy latents from predicted durations
#[derive(Debug, Clone)]
pub struct LatentScheduler {
    sample_rate: u32,
    chunk_size: usize,
    latent_channels: usize,
    device: Device,
}

impl LatentScheduler {
    /// Build a scheduler from the pipeline configuration.
    pub fn new(config: &PipelineConfig, device: &Device) -> Self {
        Self {
            sample_rate: config.ae.sample_rate,
            chunk_size: config.latent_chunk_size(),
            latent_channels: config.latent_channels(),
            device: device.clone(),
        }
    }

    /// Latent frames needed to cover one predicted duration.
    ///
    /// Duration is truncated to whole samples before the ceiling division,
    /// matching the persisted models' integer semantics.
    fn frames_for(&self, duration_secs: f32) -> Result<usize> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(TtsError::invalid(format!(
                "predicted duration must be a non-negative number, got {duration_secs}"
            )));
        }
        let wav_len = (duration_secs * self.sample_rate as f32) as i64;
        Ok(((wav_len as usize) + self.chunk_size - 1) / self.chunk_size)
    }

    /// Sample a masked `[B, C, T]` standard-normal latent for a batch of
    /// predicted durations, returning the latent and its `[B, 1, T]` mask.
    pub fn schedule(&self, durations: &[f32]) -> Result<(Tensor, Tensor)> {
        if durations.is_empty() {
            return Err(TtsError::invalid("cannot schedule an empty batch"));
        }

        let mut frames = Vec::with_capacity(durations.len());
        for &duration in durations {
            frames.push(self.frames_for(duration)?);
        }

        let max_frames = frames.iter().copied().max().unwrap_or(0);
        if max_frames == 0 {
            return Err(TtsError::invalid(
                "predicted durations are too short to produce any latent frames",
            ));
        }

        debug!(
            batch = durations.len(),
            max_frames, "sampling noisy latent"
        );

        let bsz = durations.len();
        let noise = Tensor::randn(
            0f32,
            1f32,
            (bsz, self.latent_channels, max_frames),
            &self.device,
        )?;
        let mask = length_to_mask(&frames, max_frames, &self.device)?;
        let latent = noise.broadcast_mul(&mask)?;
        Ok((latent, mask))
    }

    /// Waveform samples covered by one latent frame.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
