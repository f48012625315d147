//! Speaker style vectors and their cache
//!
//! A voice is a pair of fixed embeddings: `ttl` conditions the text
//! encoder and vector estimator, `dp` conditions the duration predictor.
//! Loaded voices are cached by name; the cache is unbounded, sized by the
//! handful of voices a process realistically serves.

use std::sync::Arc;

use candle_core::Tensor;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::core::error::{Result, TtsError};

/// One voice's conditioning embeddings
#[derive(Debug, Clone)]
pub struct StyleVector {
    /// Text-to-latent style, fed to the text encoder and vector estimator.
    pub ttl: Tensor,
    /// Duration-predictor style.
    pub dp: Tensor,
}

impl StyleVector {
    /// Wrap a pair of `[B, ...]` style tensors, checking both are rank 3
    /// with matching batch dimensions.
    pub fn new(ttl: Tensor, dp: Tensor) -> Result<Self> {
        if ttl.rank() != 3 || dp.rank() != 3 {
            return Err(TtsError::invalid(format!(
                "style tensors must be rank 3, got ttl {:?} and dp {:?}",
                ttl.dims(),
                dp.dims()
            )));
        }
        if ttl.dim(0)? != dp.dim(0)? {
            return Err(TtsError::invalid(format!(
                "style batch mismatch: ttl {:?} vs dp {:?}",
                ttl.dims(),
                dp.dims()
            )));
        }
        Ok(Self { ttl, dp })
    }

    /// Batch dimension shared by both tensors.
    pub fn batch_size(&self) -> usize {
        self.ttl.dims()[0]
    }

    /// Chunks are conditioned one at a time, so a usable style is batch 1.
    pub fn check_single(&self) -> Result<()> {
        if self.batch_size() != 1 {
            return Err(TtsError::invalid(format!(
                "sequential synthesis needs a single-item style, got batch {}",
                self.batch_size()
            )));
        }
        Ok(())
    }
}

/// Voice-name keyed cache of loaded styles
#[derive(Debug, Default)]
pub struct StyleCache {
    styles: DashMap<String, Arc<StyleVector>>,
}

impl StyleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached style for `voice`, loading it on first use. The
    /// entry lock serializes concurrent first loads of the same voice.
    pub fn get_or_load<F>(&self, voice: &str, loader: F) -> Result<Arc<StyleVector>>
    where
        F: FnOnce() -> Result<StyleVector>,
    {
        if let Some(existing) = self.styles.get(voice) {
            return Ok(existing.clone());
        }
        match self.styles.entry(voice.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                debug!(voice, "loading style vector");
                let style = Arc::new(loader()?);
                entry.insert(style.clone());
                Ok(style)
            }
        }
    }

    /// Number of cached voices.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether no voice has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
