use std::ops::Deref;

use nalgebra::DMatrix;
use strum_macros::{Display, EnumIter, EnumString};

use crate::Image;

/// Occulter outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OcclusionShape {
    #[default]
    Circle,
    Square,
}

/// Centered occulter geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcclusionGeometry {
    pub shape: OcclusionShape,
    /// Circle diameter or square side in pixels
    pub width: usize,
}
impl OcclusionGeometry {
    pub fn new(shape: OcclusionShape, width: usize) -> Self {
        Self { shape, width }
    }
    pub fn circle(width: usize) -> Self {
        Self::new(OcclusionShape::Circle, width)
    }
    pub fn square(width: usize) -> Self {
        Self::new(OcclusionShape::Square, width)
    }
    /// Occulter mask for an image of `(height, width)`
    ///
    /// The center is at (height/2, width/2), integer divided.
    pub fn mask(&self, (height, width): (usize, usize)) -> OcclusionMask {
        let (cy, cx) = (height / 2, width / 2);
        let data = match self.shape {
            OcclusionShape::Circle => {
                let radius_sqr = (self.width as f64 / 2f64).powi(2);
                DMatrix::from_fn(height, width, |i, j| {
                    let y = i as f64 - cy as f64;
                    let x = j as f64 - cx as f64;
                    x * x + y * y <= radius_sqr
                })
            }
            OcclusionShape::Square => {
                let half = self.width / 2;
                let rows = cy.saturating_sub(half)..(cy + half).min(height);
                let cols = cx.saturating_sub(half)..(cx + half).min(width);
                DMatrix::from_fn(height, width, |i, j| {
                    rows.contains(&i) && cols.contains(&j)
                })
            }
        };
        OcclusionMask(data)
    }
    /// Zeroes the occulted part of `image`
    ///
    /// Returns the occulted image and the occulter mask
    pub fn apply(&self, image: &Image) -> (Image, OcclusionMask) {
        let mask = self.mask(image.dims());
        let occulted = image.zip_map(&mask.0, |x, m| if m { 0f64 } else { x });
        (Image::clipped(occulted), mask)
    }
}

/// Boolean map of the occulted pixels
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionMask(DMatrix<bool>);
impl Deref for OcclusionMask {
    type Target = DMatrix<bool>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<DMatrix<bool>> for OcclusionMask {
    fn from(data: DMatrix<bool>) -> Self {
        Self(data)
    }
}
impl OcclusionMask {
    /// Number of occulted pixels
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&m| m).count()
    }
    pub fn dims(&self) -> (usize, usize) {
        self.0.shape()
    }
}
