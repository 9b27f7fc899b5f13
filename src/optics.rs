use std::time::Instant;

use crate::{
    spectral::{self, SpectralError},
    AberrationField, Image, OcclusionGeometry, OcclusionMask, ABERRATION_SEED,
};

/// Degraded coronagraph observation
#[derive(Debug, Clone)]
pub struct Observation {
    /// Occulted and aberrated image
    pub image: Image,
    /// Phase aberration introduced by the optics
    pub aberration: AberrationField,
    /// Occulter mask
    pub mask: OcclusionMask,
}

/// Coronagraph optical system model
///
/// The occulter blocks the center of the field and the optics subtract an
/// unknown phase aberration from the spectrum of the occulted image.
#[derive(Debug, Clone, Copy)]
pub struct OpticalSystem {
    geometry: OcclusionGeometry,
    seed: u64,
}
impl OpticalSystem {
    pub fn new(geometry: OcclusionGeometry) -> Self {
        Self {
            geometry,
            seed: ABERRATION_SEED,
        }
    }
    /// Sets the seed of the aberration generator
    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
    pub fn geometry(&self) -> &OcclusionGeometry {
        &self.geometry
    }
    /// Observes `image` through the occulter and the aberrated optics
    pub fn simulate(&self, image: &Image) -> Result<Observation, SpectralError> {
        log::info!(
            "Simulating coronagraph ({} occulter, width {}px) on {:?} image...",
            self.geometry.shape,
            self.geometry.width,
            image.dims()
        );
        let now = Instant::now();
        let (occulted, mask) = self.geometry.apply(image);
        let field = spectral::forward(&occulted)?;
        let aberration = AberrationField::generate(occulted.dims(), self.seed)?;
        let image = field.with_phase(&field.phase - aberration.phase())?.inverse();
        log::info!("... simulated in {:}ms", now.elapsed().as_millis());
        Ok(Observation {
            image,
            aberration,
            mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(n: usize) -> Image {
        let c = n as f64 / 2.;
        Image::from_fn(n, n, |i, j| {
            let r = ((i as f64 - c).powi(2) + (j as f64 - c).powi(2)).sqrt();
            (1. - r / c).max(0.)
        })
    }

    #[test]
    fn observation_shapes() {
        let obs = OpticalSystem::new(OcclusionGeometry::circle(6))
            .simulate(&disk(16))
            .unwrap();
        assert_eq!(obs.image.dims(), (16, 16));
        assert_eq!(obs.mask.dims(), (16, 16));
        assert_eq!(obs.aberration.shape(), (16, 9));
        assert_eq!(obs.aberration.seed(), ABERRATION_SEED);
        assert!(obs.image.iter().all(|x| (0. ..=1.).contains(x)));
    }

    #[test]
    fn aberration_is_subtracted() {
        let image = disk(12);
        let system = OpticalSystem::new(OcclusionGeometry::square(4));
        let obs = system.simulate(&image).unwrap();

        let (occulted, _) = system.geometry().apply(&image);
        let field = spectral::forward(&occulted).unwrap();
        let expected = spectral::inverse(
            &field.amplitude,
            &(&field.phase - obs.aberration.phase()),
            (12, 12),
        )
        .unwrap();
        assert_eq!(obs.image, expected);

        let added = spectral::inverse(
            &field.amplitude,
            &(&field.phase + obs.aberration.phase()),
            (12, 12),
        )
        .unwrap();
        assert_ne!(obs.image, added);
    }

    #[test]
    fn reproducible() {
        let system = OpticalSystem::new(OcclusionGeometry::circle(4)).seed(7);
        let a = system.simulate(&disk(10)).unwrap();
        let b = system.simulate(&disk(10)).unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(a.aberration, b.aberration);
    }
}
