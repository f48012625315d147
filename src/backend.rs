//! Inference backend boundary
//!
//! The neural networks themselves live behind [`InferenceBackend`]: four
//! named endpoints, each a named-tensor-in/named-tensor-out function. The
//! orchestrator never sees model internals; it builds the input map, runs
//! the endpoint, and pulls the single expected output tensor back out.
//!
//! Backend implementations return `anyhow::Result` so they can surface
//! whatever failure their runtime produces; the orchestrator wraps those
//! failures into [`TtsError::Inference`] with endpoint, chunk, and step
//! context attached.

use std::collections::HashMap;
use std::fmt;

use candle_core::Tensor;

use crate::core::error::{Result, TtsError};

/// Named tensors exchanged with the backend.
pub type TensorMap = HashMap<String, Tensor>;

/// The four model endpoints of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `text_ids, style_dp, text_mask -> duration` (seconds per item)
    DurationPredictor,
    /// `text_ids, style_ttl, text_mask -> text_emb`
    TextEncoder,
    /// `noisy_latent, text_emb, style_ttl, latent_mask, text_mask,
    /// current_step, total_step -> denoised_latent`
    VectorEstimator,
    /// `latent -> waveform`
    Vocoder,
}

impl Endpoint {
    /// Endpoint name as used by the persisted model layout.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::DurationPredictor => "duration_predictor",
            Endpoint::TextEncoder => "text_encoder",
            Endpoint::VectorEstimator => "vector_estimator",
            Endpoint::Vocoder => "vocoder",
        }
    }

    /// Name of the single output tensor this endpoint must produce.
    pub fn output_name(&self) -> &'static str {
        match self {
            Endpoint::DurationPredictor => "duration",
            Endpoint::TextEncoder => "text_emb",
            Endpoint::VectorEstimator => "denoised_latent",
            Endpoint::Vocoder => "waveform",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Model execution backend.
///
/// Implementations must be callable from the streaming producer thread, but
/// no claim is made about *concurrent* invocation being safe; the pipeline
/// keeps all calls for a request strictly sequential.
pub trait InferenceBackend: Send + Sync {
    /// Run one endpoint on the given named inputs.
    fn run(&self, endpoint: Endpoint, inputs: &TensorMap) -> anyhow::Result<TensorMap>;
}

/// Build a [`TensorMap`] from static input names.
pub fn tensor_map<const N: usize>(entries: [(&str, Tensor); N]) -> TensorMap {
    entries
        .into_iter()
        .map(|(name, tensor)| (name.to_string(), tensor))
        .collect()
}

/// Run an endpoint and extract its single expected output.
///
/// An absent output counts as a malformed backend response and is reported
/// the same way as an outright call failure.
pub(crate) fn call(
    backend: &dyn InferenceBackend,
    endpoint: Endpoint,
    inputs: TensorMap,
    chunk_index: usize,
    step: Option<usize>,
) -> Result<Tensor> {
    let mut outputs =
        backend
            .run(endpoint, &inputs)
            .map_err(|err| TtsError::Inference {
                endpoint,
                chunk_index,
                step,
                message: format!("{err:#}"),
            })?;

    outputs
        .remove(endpoint.output_name())
        .ok_or_else(|| TtsError::Inference {
            endpoint,
            chunk_index,
            step,
            message: format!("backend returned no `{}` output", endpoint.output_name()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    struct NoOutputBackend;

    impl InferenceBackend for NoOutputBackend {
        fn run(&self, _endpoint: Endpoint, _inputs: &TensorMap) -> anyhow::Result<TensorMap> {
            Ok(TensorMap::new())
        }
    }

    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn run(&self, _endpoint: Endpoint, _inputs: &TensorMap) -> anyhow::Result<TensorMap> {
            anyhow::bail!("runtime rejected the graph")
        }
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(Endpoint::DurationPredictor.output_name(), "duration");
        assert_eq!(Endpoint::TextEncoder.output_name(), "text_emb");
        assert_eq!(Endpoint::VectorEstimator.output_name(), "denoised_latent");
        assert_eq!(Endpoint::Vocoder.output_name(), "waveform");
        assert_eq!(Endpoint::Vocoder.to_string(), "vocoder");
    }

    #[test]
    fn test_missing_output_is_inference_error() {
        let inputs = tensor_map([(
            "latent",
            Tensor::zeros((1usize, 2usize, 3usize), candle_core::DType::F32, &Device::Cpu).unwrap(),
        )]);
        let err = call(&NoOutputBackend, Endpoint::Vocoder, inputs, 4, None).unwrap_err();
        match err {
            TtsError::Inference {
                endpoint,
                chunk_index,
                step,
                ..
            } => {
                assert_eq!(endpoint, Endpoint::Vocoder);
                assert_eq!(chunk_index, 4);
                assert_eq!(step, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_backend_failure_keeps_step_context() {
        let err = call(
            &FailingBackend,
            Endpoint::VectorEstimator,
            TensorMap::new(),
            0,
            Some(2),
        )
        .unwrap_err();
        match err {
            TtsError::Inference { step, message, .. } => {
                assert_eq!(step, Some(2));
                assert!(message.contains("runtime rejected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
