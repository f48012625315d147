//! Audio chunk types, silence padding, and real-time-factor accounting

use std::time::Duration;

/// One synthesized chunk of mono f32 audio
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Mono samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Position of the source text chunk within the request.
    pub index: usize,
}

impl AudioChunk {
    /// Playback duration of this chunk in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A run of zero samples covering `duration_secs` at `sample_rate`.
pub fn silence(duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let count = (duration_secs.max(0.0) * sample_rate as f32) as usize;
    vec![0.0; count]
}

/// Per-request synthesis accounting
#[derive(Debug, Clone, Default)]
pub struct RtfStats {
    /// Chunks synthesized before completion or cancellation.
    pub chunks: usize,
    /// Total produced audio, in seconds, silence included.
    pub audio_secs: f64,
    /// Wall-clock time spent in synthesis.
    pub elapsed: Duration,
    /// Whether the request stopped early on a cancellation signal.
    pub cancelled: bool,
}

impl RtfStats {
    /// Real-time factor: processing seconds per produced audio second.
    /// Zero when no audio was produced.
    pub fn rtf(&self) -> f64 {
        if self.audio_secs > 0.0 {
            self.elapsed.as_secs_f64() / self.audio_secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_duration() {
        let chunk = AudioChunk {
            samples: vec![0.0; 12000],
            sample_rate: 24000,
            index: 0,
        };
        assert!((chunk.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_silence_length() {
        assert_eq!(silence(0.3, 24000).len(), 7200);
        assert_eq!(silence(0.0, 24000).len(), 0);
        assert_eq!(silence(-1.0, 24000).len(), 0);
    }

    #[test]
    fn test_rtf() {
        let stats = RtfStats {
            chunks: 2,
            audio_secs: 4.0,
            elapsed: Duration::from_secs(2),
            cancelled: false,
        };
        assert!((stats.rtf() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rtf_guards_zero_audio() {
        let stats = RtfStats::default();
        assert_eq!(stats.rtf(), 0.0);
    }
}
