//! Synthesis orchestration
//!
//! Wires the text front end, latent scheduler, denoising loop, and vocoder
//! into the two request shapes the engine offers: batch synthesis returning
//! one assembled waveform, and streaming synthesis yielding chunks as they
//! finish. Chunks of a request always run sequentially; parallelism across
//! requests is the caller's business.

pub mod stream;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::Device;
use tracing::{debug, info};

use crate::assets;
use crate::audio::{silence, RtfStats};
use crate::backend::{call, tensor_map, Endpoint, InferenceBackend};
use crate::config::PipelineConfig;
use crate::core::error::{Result, TtsError};
use crate::diffusion::DiffusionStepper;
use crate::latent::LatentScheduler;
use crate::style::{StyleCache, StyleVector};
use crate::text::{chunk_text, TextNormalizer, UnicodeIndexer, UnicodeTokenizer, DEFAULT_MAX_CHUNK_LEN};

pub use stream::{CancellationToken, StreamEvent, StreamHandle};

/// Per-request synthesis knobs
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Denoising steps per chunk.
    pub steps: usize,
    /// Speaking-rate multiplier; predicted durations are divided by it.
    pub speed: f32,
    /// Silence inserted between assembled chunks, in seconds.
    pub silence_duration: f32,
    /// Maximum characters per text chunk.
    pub max_chunk_len: usize,
    /// Streaming back-pressure: chunks buffered ahead of the consumer.
    pub queue_depth: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            steps: crate::DEFAULT_DENOISING_STEPS,
            speed: 1.0,
            silence_duration: crate::DEFAULT_SILENCE_DURATION,
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            queue_depth: 2,
        }
    }
}

impl SynthesisOptions {
    /// Reject values no request shape can honor.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(TtsError::invalid("steps must be at least 1"));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(TtsError::invalid(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        if !self.silence_duration.is_finite() || self.silence_duration < 0.0 {
            return Err(TtsError::invalid(format!(
                "silence_duration must be non-negative, got {}",
                self.silence_duration
            )));
        }
        if self.max_chunk_len == 0 {
            return Err(TtsError::invalid("max_chunk_len must be at least 1"));
        }
        if self.queue_depth == 0 {
            return Err(TtsError::invalid("queue_depth must be at least 1"));
        }
        Ok(())
    }
}

/// A completed batch synthesis
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Assembled mono waveform, inter-chunk silence included.
    pub samples: Vec<f32>,
    /// Sample rate of `samples` in Hz.
    pub sample_rate: u32,
    /// Running total of speed-adjusted model-predicted durations plus the
    /// silence inserted between chunks, in seconds.
    pub predicted_duration: f64,
    /// Timing and chunk accounting for the request.
    pub stats: RtfStats,
}

impl Synthesis {
    /// Playback duration of the assembled waveform in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Shared per-engine state driving one chunk end to end.
pub(crate) struct SynthesisCore {
    backend: Arc<dyn InferenceBackend>,
    normalizer: TextNormalizer,
    tokenizer: UnicodeTokenizer,
    scheduler: LatentScheduler,
    sample_rate: u32,
    device: Device,
}

impl SynthesisCore {
    fn new(
        config: &PipelineConfig,
        indexer: UnicodeIndexer,
        backend: Arc<dyn InferenceBackend>,
        device: Device,
    ) -> Self {
        Self {
            backend,
            normalizer: TextNormalizer::new(),
            tokenizer: UnicodeTokenizer::new(indexer),
            scheduler: LatentScheduler::new(config, &device),
            sample_rate: config.ae.sample_rate,
            device,
        }
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Normalize and chunk a request's text.
    fn prepare(&self, text: &str, opts: &SynthesisOptions) -> Vec<String> {
        let normalized = self.normalizer.normalize(text);
        chunk_text(&normalized, opts.max_chunk_len)
    }

    /// Run one text chunk through the whole model stack, returning its
    /// waveform and speed-adjusted predicted duration.
    pub(crate) fn synthesize_chunk(
        &self,
        chunk: &str,
        index: usize,
        style: &StyleVector,
        opts: &SynthesisOptions,
    ) -> Result<(Vec<f32>, f32)> {
        let batch = self
            .tokenizer
            .encode_batch(std::slice::from_ref(&chunk.to_string()))
            .map_err(|err| match err {
                TtsError::UnsupportedCharacter {
                    ch,
                    code_point,
                    position,
                    ..
                } => TtsError::UnsupportedCharacter {
                    ch,
                    code_point,
                    position,
                    chunk_index: index,
                },
                other => other,
            })?;
        let (text_ids, text_mask) = batch.to_tensors(&self.device)?;

        let duration_out = call(
            self.backend.as_ref(),
            Endpoint::DurationPredictor,
            tensor_map([
                ("text_ids", text_ids.clone()),
                ("style_dp", style.dp.clone()),
                ("text_mask", text_mask.clone()),
            ]),
            index,
            None,
        )?;
        let predicted = duration_out.flatten_all()?.to_vec1::<f32>()?;
        let duration = predicted
            .first()
            .copied()
            .ok_or_else(|| TtsError::Inference {
                endpoint: Endpoint::DurationPredictor,
                chunk_index: index,
                step: None,
                message: "duration output is empty".to_string(),
            })?
            / opts.speed;
        debug!(chunk_index = index, duration, "predicted duration");

        let text_emb = call(
            self.backend.as_ref(),
            Endpoint::TextEncoder,
            tensor_map([
                ("text_ids", text_ids),
                ("style_ttl", style.ttl.clone()),
                ("text_mask", text_mask.clone()),
            ]),
            index,
            None,
        )?;

        let (noisy, latent_mask) = self.scheduler.schedule(&[duration])?;
        let stepper = DiffusionStepper::new(opts.steps)?;
        let latent = stepper.denoise(
            self.backend.as_ref(),
            index,
            noisy,
            &text_emb,
            &style.ttl,
            &text_mask,
            &latent_mask,
        )?;

        let waveform = call(
            self.backend.as_ref(),
            Endpoint::Vocoder,
            tensor_map([("latent", latent)]),
            index,
            None,
        )?;
        let samples = waveform.flatten_all()?.to_vec1::<f32>()?;
        if samples.is_empty() {
            return Err(TtsError::Inference {
                endpoint: Endpoint::Vocoder,
                chunk_index: index,
                step: None,
                message: "vocoder produced an empty waveform".to_string(),
            });
        }
        Ok((samples, duration))
    }
}

/// The synthesis engine: one loaded model stack plus its voice cache
pub struct TextToSpeech {
    core: Arc<SynthesisCore>,
    styles: StyleCache,
    model_dir: Option<PathBuf>,
}

impl TextToSpeech {
    /// Build an engine from already-loaded assets.
    pub fn new(
        config: PipelineConfig,
        indexer: UnicodeIndexer,
        backend: Arc<dyn InferenceBackend>,
        device: Device,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            core: Arc::new(SynthesisCore::new(&config, indexer, backend, device)),
            styles: StyleCache::new(),
            model_dir: None,
        })
    }

    /// Build an engine from a model directory holding `tts.json` and
    /// `unicode_indexer.json`, enabling voice-name resolution.
    pub fn from_model_dir(
        model_dir: &Path,
        backend: Arc<dyn InferenceBackend>,
        device: Device,
    ) -> Result<Self> {
        let config = assets::load_pipeline_config(&model_dir.join("tts.json"))?;
        let indexer = assets::load_unicode_indexer(&model_dir.join("unicode_indexer.json"))?;
        let mut engine = Self::new(config, indexer, backend, device)?;
        engine.model_dir = Some(model_dir.to_path_buf());
        Ok(engine)
    }

    /// Fetch a voice's style by name, loading and caching it on first use.
    pub fn style(&self, voice: &str) -> Result<Arc<StyleVector>> {
        let model_dir = self.model_dir.as_deref().ok_or_else(|| {
            TtsError::invalid("voice lookup by name requires a model directory")
        })?;
        self.styles.get_or_load(voice, || {
            let path = assets::resolve_voice_path(model_dir, voice)?;
            assets::load_style_vector(&path, &self.core.device)
        })
    }

    /// Synthesize `text` with a named voice.
    pub fn synthesize(
        &self,
        text: &str,
        voice: &str,
        opts: &SynthesisOptions,
    ) -> Result<Synthesis> {
        let style = self.style(voice)?;
        self.synthesize_with_style(text, &style, opts)
    }

    /// Synthesize `text` with an explicit style, assembling all chunks
    /// into one waveform with silence between them.
    pub fn synthesize_with_style(
        &self,
        text: &str,
        style: &StyleVector,
        opts: &SynthesisOptions,
    ) -> Result<Synthesis> {
        opts.validate()?;
        style.check_single()?;
        let chunks = self.core.prepare(text, opts);
        if chunks.is_empty() {
            return Err(TtsError::invalid("no synthesizable text after chunking"));
        }

        let start = Instant::now();
        let sample_rate = self.core.sample_rate();
        let gap = silence(opts.silence_duration, sample_rate);
        let mut samples = Vec::new();
        let mut predicted_duration = 0f64;

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 {
                samples.extend_from_slice(&gap);
                predicted_duration += opts.silence_duration as f64;
            }
            let (chunk_samples, duration) =
                self.core.synthesize_chunk(chunk, index, style, opts)?;
            predicted_duration += duration as f64;
            samples.extend(chunk_samples);
        }

        let stats = RtfStats {
            chunks: chunks.len(),
            audio_secs: samples.len() as f64 / sample_rate as f64,
            elapsed: start.elapsed(),
            cancelled: false,
        };
        info!(
            chunks = stats.chunks,
            audio_secs = stats.audio_secs,
            rtf = stats.rtf(),
            "synthesis complete"
        );

        Ok(Synthesis {
            samples,
            sample_rate,
            predicted_duration,
            stats,
        })
    }

    /// Stream `text` with a named voice.
    pub fn stream(
        &self,
        text: &str,
        voice: &str,
        opts: &SynthesisOptions,
    ) -> Result<StreamHandle> {
        let style = self.style(voice)?;
        self.stream_with_style(text, style, opts)
    }

    /// Stream `text` with an explicit style: chunks are synthesized on a
    /// background thread and delivered in order through the handle.
    pub fn stream_with_style(
        &self,
        text: &str,
        style: Arc<StyleVector>,
        opts: &SynthesisOptions,
    ) -> Result<StreamHandle> {
        opts.validate()?;
        style.check_single()?;
        let chunks = self.core.prepare(text, opts);
        if chunks.is_empty() {
            return Err(TtsError::invalid("no synthesizable text after chunking"));
        }
        Ok(stream::spawn_stream(
            self.core.clone(),
            style,
            chunks,
            opts.clone(),
        ))
    }
}
