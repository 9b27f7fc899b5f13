/*!
# Gerchberg-Saxton phase retrieval

The reconstruction keeps the measured spectrum amplitude of the degraded
image and sweeps its phase linearly from the observed phase `φ₀` to the
corrected phase `φ₀ + Δφ`, where `Δφ` is the phase aberration of the
optics:

```text
α = k / max_iters
φ(k) = (1 - α) φ₀ + α (φ₀ + Δφ),  k = 0, ..., max_iters
```

Each step only depends on `φ₀` and `Δφ`, so the steps are computed in
parallel and collected in increasing order of `k`.

## Example

```rust,no_run
use coronagraph::{GerchbergSaxton, Image, OcclusionGeometry, OpticalSystem};

let image = Image::load("vlt.jpg")?;
let observation = OpticalSystem::new(OcclusionGeometry::circle(300)).simulate(&image)?;
let trace = GerchbergSaxton::new(10)?.run(
    &observation.image,
    &observation.aberration,
    Some(&observation.mask),
)?;
assert_eq!(trace.len(), 11);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use std::time::Instant;

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::{
    residual::{self, ResidualError},
    spectral::{self, SpectralError},
    AberrationField, Image, Iteration, IterationTrace, OcclusionMask,
};

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("the number of iterations must be at least 1")]
    ZeroIterations,
    #[error("aberration {aberration:?} does not match the {spectrum:?} spectrum of the image")]
    AberrationShape {
        aberration: (usize, usize),
        spectrum: (usize, usize),
    },
    #[error("spectral transform failed")]
    Spectral(#[from] SpectralError),
    #[error("failed to score the occulted region")]
    Residual(#[from] ResidualError),
}
type Result<T> = std::result::Result<T, SolverError>;

/// Phase at step `k` of a sweep of `max_iters` steps
///
/// Returns `phase0` at `k=0` and `phase0 + aberration` at `k=max_iters`.
pub fn corrected_phase(
    phase0: &DMatrix<f64>,
    aberration: &DMatrix<f64>,
    k: usize,
    max_iters: usize,
) -> DMatrix<f64> {
    if k == 0 {
        return phase0.clone();
    }
    if k == max_iters {
        return phase0 + aberration;
    }
    let alpha = k as f64 / max_iters as f64;
    phase0.zip_map(aberration, |p, d| (1f64 - alpha) * p + alpha * (p + d))
}

/// Gerchberg-Saxton phase retrieval
#[derive(Debug, Clone, Copy)]
pub struct GerchbergSaxton {
    max_iters: usize,
}
impl GerchbergSaxton {
    /// Creates a solver sweeping the phase in `max_iters` steps
    pub fn new(max_iters: usize) -> Result<Self> {
        if max_iters == 0 {
            return Err(SolverError::ZeroIterations);
        }
        Ok(Self { max_iters })
    }
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }
    /// Reconstructs `degraded` knowing the optics `aberration`
    ///
    /// The residual of the region inside `mask` is recorded at each
    /// iteration if a mask is given.
    /// The trace holds `max_iters + 1` iterations.
    pub fn run(
        &self,
        degraded: &Image,
        aberration: &AberrationField,
        mask: Option<&OcclusionMask>,
    ) -> Result<IterationTrace> {
        let max_iters = self.max_iters;
        let field = spectral::forward(degraded)?;
        if aberration.shape() != field.dims() {
            return Err(SolverError::AberrationShape {
                aberration: aberration.shape(),
                spectrum: field.dims(),
            });
        }
        if let Some(mask) = mask {
            if mask.dims() != degraded.dims() {
                return Err(ResidualError::ShapeMismatch {
                    image: degraded.dims(),
                    mask: mask.dims(),
                }
                .into());
            }
        }

        log::info!("Running Gerchberg-Saxton over {} iterations...", max_iters);
        let now = Instant::now();
        let iterations = (0..=max_iters)
            .into_par_iter()
            .map(|k| -> Result<Iteration> {
                log::debug!("iteration {} of {}", k, max_iters);
                let phase = corrected_phase(&field.phase, aberration, k, max_iters);
                let image = field.with_phase(phase)?.inverse();
                let error = mask.map(|mask| residual::score(&image, mask)).transpose()?;
                Ok(Iteration {
                    index: k,
                    image,
                    error,
                })
            })
            .collect::<Result<Vec<Iteration>>>()?;
        log::info!("... completed in {:}ms", now.elapsed().as_millis());

        let mut trace = IterationTrace::default();
        iterations
            .into_iter()
            .for_each(|iteration| trace.push(iteration));
        Ok(trace)
    }
}

/// Runs a [GerchbergSaxton] reconstruction of `max_iters` iterations
pub fn run(
    degraded: &Image,
    max_iters: usize,
    aberration: &AberrationField,
    mask: Option<&OcclusionMask>,
) -> Result<IterationTrace> {
    GerchbergSaxton::new(max_iters)?.run(degraded, aberration, mask)
}
