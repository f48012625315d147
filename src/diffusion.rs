//! Fixed-count denoising loop
//!
//! Runs the vector estimator a configured number of times, feeding each
//! step's output back as the next step's noisy latent. The step index and
//! total count travel to the model as f32 `[B]` tensors; masks and
//! conditioning stay constant across the loop.

use candle_core::Tensor;
use tracing::debug;

use crate::backend::{call, tensor_map, Endpoint, InferenceBackend};
use crate::core::error::{Result, TtsError};

/// Iterative denoiser over the vector-estimator endpoint
#[derive(Debug, Clone, Copy)]
pub struct DiffusionStepper {
    total_steps: usize,
}

impl DiffusionStepper {
    /// Create a stepper running `total_steps` estimator passes.
    pub fn new(total_steps: usize) -> Result<Self> {
        if total_steps == 0 {
            return Err(TtsError::invalid("denoising requires at least one step"));
        }
        Ok(Self { total_steps })
    }

    /// Number of estimator passes per chunk.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Denoise `initial` under the given conditioning, returning the final
    /// latent. Any estimator failure aborts the loop with step context.
    pub fn denoise(
        &self,
        backend: &dyn InferenceBackend,
        chunk_index: usize,
        initial: Tensor,
        text_emb: &Tensor,
        style_ttl: &Tensor,
        text_mask: &Tensor,
        latent_mask: &Tensor,
    ) -> Result<Tensor> {
        let bsz = initial.dim(0)?;
        let device = initial.device().clone();
        let total_step = Tensor::full(self.total_steps as f32, (bsz,), &device)?;

        let mut latent = initial;
        for step in 0..self.total_steps {
            debug!(chunk_index, step, total = self.total_steps, "denoising step");
            let current_step = Tensor::full(step as f32, (bsz,), &device)?;
            let inputs = tensor_map([
                ("noisy_latent", latent),
                ("text_emb", text_emb.clone()),
                ("style_ttl", style_ttl.clone()),
                ("text_mask", text_mask.clone()),
                ("latent_mask", latent_mask.clone()),
                ("current_step", current_step),
                ("total_step", total_step.clone()),
            ]);
            latent = call(
                backend,
                Endpoint::VectorEstimator,
                inputs,
                chunk_index,
                Some(step),
            )?;
        }
        Ok(latent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TensorMap;
    use candle_core::Device;
    use std::sync::Mutex;

    /// Echoes the noisy latent back and records the step schedule.
    struct EchoBackend {
        steps: Mutex<Vec<(f32, f32)>>,
    }

    impl InferenceBackend for EchoBackend {
        fn run(&self, _endpoint: Endpoint, inputs: &TensorMap) -> anyhow::Result<TensorMap> {
            let current = inputs["current_step"].to_vec1::<f32>()?[0];
            let total = inputs["total_step"].to_vec1::<f32>()?[0];
            self.steps.lock().unwrap().push((current, total));
            let mut out = TensorMap::new();
            out.insert("denoised_latent".to_string(), inputs["noisy_latent"].clone());
            Ok(out)
        }
    }

    #[test]
    fn test_zero_steps_rejected() {
        assert!(DiffusionStepper::new(0).is_err());
        assert_eq!(DiffusionStepper::new(5).unwrap().total_steps(), 5);
    }

    #[test]
    fn test_step_schedule() {
        let device = Device::Cpu;
        let backend = EchoBackend {
            steps: Mutex::new(Vec::new()),
        };
        let stepper = DiffusionStepper::new(3).unwrap();
        let latent = Tensor::zeros((1usize, 4usize, 8usize), candle_core::DType::F32, &device).unwrap();
        let text_emb = Tensor::zeros((1usize, 4usize, 6usize), candle_core::DType::F32, &device).unwrap();
        let style = Tensor::zeros((1usize, 1usize, 2usize), candle_core::DType::F32, &device).unwrap();
        let text_mask = Tensor::ones((1usize, 1usize, 6usize), candle_core::DType::F32, &device).unwrap();
        let latent_mask = Tensor::ones((1usize, 1usize, 8usize), candle_core::DType::F32, &device).unwrap();

        let out = stepper
            .denoise(&backend, 0, latent, &text_emb, &style, &text_mask, &latent_mask)
            .unwrap();
        assert_eq!(out.dims(), &[1, 4, 8]);
        assert_eq!(
            *backend.steps.lock().unwrap(),
            vec![(0.0, 3.0), (1.0, 3.0), (2.0, 3.0)]
        );
    }
}
