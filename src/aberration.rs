use std::ops::Deref;

use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::spectral::{self, SpectralError};

/// Default seed of the phase aberration generator
pub const ABERRATION_SEED: u64 = 12345;

/// Unknown phase aberration of the optical system
///
/// The aberration is the phase of the spectrum of a uniform random image,
/// it has the shape of the half spectrum of the image it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct AberrationField {
    phase: DMatrix<f64>,
    image_dims: (usize, usize),
    seed: u64,
}
impl Deref for AberrationField {
    type Target = DMatrix<f64>;

    fn deref(&self) -> &Self::Target {
        &self.phase
    }
}
impl AberrationField {
    /// Generates the aberration for an image of `(height, width)`
    ///
    /// The same dimensions and seed always yield the same aberration.
    pub fn generate(
        (height, width): (usize, usize),
        seed: u64,
    ) -> Result<Self, SpectralError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise: Vec<f64> = (0..height * width).map(|_| rng.gen::<f64>()).collect();
        let field = spectral::forward(&DMatrix::from_row_slice(height, width, &noise))?;
        log::debug!(
            "phase aberration {:?} generated from seed {}",
            field.dims(),
            seed
        );
        Ok(Self {
            phase: field.phase,
            image_dims: (height, width),
            seed,
        })
    }
    /// (height, width) of the image the aberration applies to
    pub fn image_dims(&self) -> (usize, usize) {
        self.image_dims
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    pub fn phase(&self) -> &DMatrix<f64> {
        &self.phase
    }
}
