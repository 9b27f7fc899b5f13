/*!
# Coronagraph

Simulation of a coronagraph observation and reconstruction of the
aberrated image with a Gerchberg-Saxton phase sweep.

## Pipeline

1. an [Image] is loaded and normalized to [0,1],
2. the [OpticalSystem] occults the center of the image
   ([OcclusionGeometry]) and subtracts a random phase aberration
   ([AberrationField]) from its spectrum,
3. [GerchbergSaxton] progressively adds the aberration back to the phase
   of the degraded image, scoring the residual light inside the occulter
   ([residual::score]),
4. the [IterationTrace] is exported as numbered PNG frames
   ([FrameExporter]).

```rust,no_run
use coronagraph::{FrameExporter, GerchbergSaxton, Image, OcclusionGeometry, OpticalSystem};

let image = Image::load("300_26a_big-vlt-s.jpg")?;
let obs = OpticalSystem::new(OcclusionGeometry::circle(300)).simulate(&image)?;
let trace = GerchbergSaxton::new(10)?.run(&obs.image, &obs.aberration, Some(&obs.mask))?;
FrameExporter::new(".").save(&trace)?;
# Ok::<(), coronagraph::CoronagraphError>(())
```
*/

pub mod aberration;
pub mod frames;
pub mod gerchberg_saxton;
pub mod grayscale;
pub mod occultation;
pub mod optics;
pub mod residual;
pub mod spectral;
pub mod trace;

pub use aberration::{AberrationField, ABERRATION_SEED};
pub use frames::{FrameExporter, Palette, FRAME_PREFIX};
pub use gerchberg_saxton::GerchbergSaxton;
pub use grayscale::Image;
pub use occultation::{OcclusionGeometry, OcclusionMask, OcclusionShape};
pub use optics::{Observation, OpticalSystem};
pub use spectral::SpectralField;
pub use trace::{Iteration, IterationTrace};

#[derive(Debug, thiserror::Error)]
pub enum CoronagraphError {
    #[error("failed to load the image")]
    Grayscale(#[from] grayscale::GrayscaleError),
    #[error("spectral transform failed")]
    Spectral(#[from] spectral::SpectralError),
    #[error("Gerchberg-Saxton reconstruction failed")]
    Solver(#[from] gerchberg_saxton::SolverError),
    #[error("residual scoring failed")]
    Residual(#[from] residual::ResidualError),
    #[error("failed to export the frames")]
    Frame(#[from] frames::FrameError),
    #[error("failed to export the trace")]
    Trace(#[from] trace::TraceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_image_pipeline() -> Result<(), CoronagraphError> {
        let image = Image::constant(8, 8, 0.8);
        let obs = OpticalSystem::new(OcclusionGeometry::square(2)).simulate(&image)?;
        let trace = gerchberg_saxton::run(&obs.image, 2, &obs.aberration, Some(&obs.mask))?;
        assert_eq!(trace.len(), 3);
        for (k, it) in trace.iter().enumerate() {
            assert_eq!(it.index, k);
            assert_eq!(it.image.dims(), (8, 8));
            assert!(it
                .image
                .iter()
                .all(|x| x.is_finite() && (0f64..=1f64).contains(x)));
            assert!(it.error.is_some_and(f64::is_finite));
        }
        Ok(())
    }

    #[test]
    fn circular_occulter_pipeline() -> Result<(), CoronagraphError> {
        let image = Image::from_fn(32, 24, |i, j| {
            let r2 = (i as f64 - 16.).powi(2) + (j as f64 - 12.).powi(2);
            (-r2 / 40.).exp()
        });
        let obs = OpticalSystem::new(OcclusionGeometry::circle(8)).simulate(&image)?;
        let trace = GerchbergSaxton::new(4)?.run(&obs.image, &obs.aberration, Some(&obs.mask))?;
        let errors = trace.errors().expect("residuals are tracked");
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| e.is_finite() && *e >= 0.));
        Ok(())
    }
}
