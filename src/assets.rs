//! On-disk asset loading
//!
//! The pipeline needs three persisted artifacts besides the model graphs:
//! the pipeline configuration (`tts.json`), the dense Unicode vocabulary
//! table (`unicode_indexer.json`), and per-voice style files holding the
//! `style_ttl`/`style_dp` embeddings. All three are JSON.

use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use serde::Deserialize;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::core::error::{Result, TtsError};
use crate::style::StyleVector;
use crate::text::UnicodeIndexer;

/// Directory holding voice style files under a model directory.
pub const VOICE_STYLE_DIR: &str = "voice_styles";

#[derive(Debug, Deserialize)]
struct NamedTensor {
    dims: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct StyleFile {
    style_ttl: NamedTensor,
    style_dp: NamedTensor,
}

impl NamedTensor {
    fn into_tensor(self, name: &str, device: &Device) -> Result<Tensor> {
        if self.dims.len() != 3 {
            return Err(TtsError::invalid(format!(
                "{name} must have 3 dims, file declares {:?}",
                self.dims
            )));
        }
        let expected: usize = self.dims.iter().product();
        if expected != self.data.len() {
            return Err(TtsError::invalid(format!(
                "{name} declares {:?} ({expected} values) but carries {} values",
                self.dims,
                self.data.len()
            )));
        }
        let tensor = Tensor::from_vec(self.data, self.dims.as_slice(), device)?;
        Ok(tensor)
    }
}

fn read_asset(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            TtsError::AssetMissing {
                path: path.to_path_buf(),
            }
        } else {
            TtsError::Io {
                message: err.to_string(),
                path: Some(path.to_path_buf()),
            }
        }
    })
}

/// Load and validate the pipeline configuration.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    let raw = read_asset(path)?;
    let config: PipelineConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    debug!(path = %path.display(), "loaded pipeline config");
    Ok(config)
}

/// Load the dense code-point vocabulary table.
pub fn load_unicode_indexer(path: &Path) -> Result<UnicodeIndexer> {
    let raw = read_asset(path)?;
    let table: Vec<i64> = serde_json::from_str(&raw)?;
    if table.is_empty() {
        return Err(TtsError::invalid(format!(
            "vocabulary table at {} is empty",
            path.display()
        )));
    }
    Ok(UnicodeIndexer::new(table))
}

/// Load one voice's style embeddings.
pub fn load_style_vector(path: &Path, device: &Device) -> Result<StyleVector> {
    let raw = read_asset(path)?;
    let file: StyleFile = serde_json::from_str(&raw)?;
    let ttl = file.style_ttl.into_tensor("style_ttl", device)?;
    let dp = file.style_dp.into_tensor("style_dp", device)?;
    StyleVector::new(ttl, dp)
}

/// Resolve a voice name to its style file.
///
/// A name that is already a path to an existing file wins; otherwise the
/// model directory's `voice_styles/{voice}.json` is tried, first exactly,
/// then case-insensitively.
pub fn resolve_voice_path(model_dir: &Path, voice: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(voice);
    if direct.is_file() {
        return Ok(direct);
    }

    let style_dir = model_dir.join(VOICE_STYLE_DIR);
    let exact = style_dir.join(format!("{voice}.json"));
    if exact.is_file() {
        return Ok(exact);
    }

    let wanted = format!("{}.json", voice.to_lowercase());
    if let Ok(entries) = fs::read_dir(&style_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().to_lowercase() == wanted {
                return Ok(entry.path());
            }
        }
    }

    Err(TtsError::AssetMissing { path: exact })
}
