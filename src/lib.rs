//! # Supertonic-TTS - Diffusion TTS Inference Pipeline
//!
//! Orchestrates a multi-stage neural text-to-speech stack: text
//! normalization and chunking, code-point tokenization, duration-driven
//! latent scheduling, fixed-count diffusion denoising, and vocoding, with
//! batch and streaming delivery.
//!
//! The neural networks themselves sit behind the [`InferenceBackend`]
//! trait; this crate owns everything around them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use supertonic_tts::{SynthesisOptions, TextToSpeech};
//!
//! let backend: Arc<dyn supertonic_tts::InferenceBackend> = load_backend()?;
//! let tts = TextToSpeech::from_model_dir("checkpoints".as_ref(), backend, Device::Cpu)?;
//!
//! let result = tts.synthesize("Hello, world!", "narrator", &SynthesisOptions::default())?;
//! play(&result.samples, result.sample_rate);
//! ```
//!
//! ## Streaming
//!
//! ```rust,ignore
//! use supertonic_tts::StreamEvent;
//!
//! let mut stream = tts.stream(long_text, "narrator", &SynthesisOptions::default())?;
//! while let Some(event) = stream.next_event() {
//!     match event {
//!         StreamEvent::Chunk(chunk) => play(&chunk.samples, chunk.sample_rate),
//!         StreamEvent::Done(stats) => println!("rtf {:.3}", stats.rtf()),
//!         StreamEvent::Error(err) => return Err(err.into()),
//!     }
//! }
//! ```

pub mod assets;
pub mod audio;
pub mod backend;
pub mod config;
pub mod core;
pub mod diffusion;
pub mod inference;
pub mod latent;
pub mod style;
pub mod text;

pub use audio::{silence, AudioChunk, RtfStats};
pub use backend::{tensor_map, Endpoint, InferenceBackend, TensorMap};
pub use config::{AudioEncoderConfig, PipelineConfig, TextToLatentConfig};
pub use crate::core::error::{Result, TtsError};
pub use diffusion::DiffusionStepper;
pub use inference::{
    CancellationToken, StreamEvent, StreamHandle, Synthesis, SynthesisOptions, TextToSpeech,
};
pub use latent::LatentScheduler;
pub use style::{StyleCache, StyleVector};
pub use text::{chunk_text, TextNormalizer, UnicodeIndexer, UnicodeTokenizer, DEFAULT_MAX_CHUNK_LEN};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default denoising steps per chunk
pub const DEFAULT_DENOISING_STEPS: usize = 5;

/// Default inter-chunk silence in seconds
pub const DEFAULT_SILENCE_DURATION: f32 = 0.3;
