use crate::{Image, OcclusionMask};

#[derive(Debug, thiserror::Error)]
pub enum ResidualError {
    #[error("image {image:?} and occulter mask {mask:?} shapes differ")]
    ShapeMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },
}

/// Sum of the squared pixel values inside the occulter mask
///
/// The sum is not normalized by the mask area.
pub fn score(image: &Image, mask: &OcclusionMask) -> Result<f64, ResidualError> {
    if image.dims() != mask.dims() {
        return Err(ResidualError::ShapeMismatch {
            image: image.dims(),
            mask: mask.dims(),
        });
    }
    Ok(image
        .iter()
        .zip(mask.iter())
        .filter(|(_, &m)| m)
        .map(|(x, _)| x * x)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OcclusionGeometry;

    #[test]
    fn zero_inside_mask() {
        let mask = OcclusionGeometry::circle(4).mask((10, 10));
        let image = Image::from_fn(10, 10, |i, j| if mask[(i, j)] { 0. } else { 1. });
        assert_eq!(score(&image, &mask).unwrap(), 0.);
    }

    #[test]
    fn quadratic_scaling() {
        let mask = OcclusionGeometry::square(4).mask((8, 8));
        let image = Image::from_fn(8, 8, |i, j| 0.1 * ((i + j) % 5) as f64);
        let scaled = Image::from_fn(8, 8, |i, j| image[(i, j)] * 0.5);
        let e = score(&image, &mask).unwrap();
        let e_scaled = score(&scaled, &mask).unwrap();
        assert!(e > 0.);
        assert!((e_scaled - 0.25 * e).abs() < 1e-12);
    }

    #[test]
    fn raw_sum() {
        let mask = OcclusionGeometry::square(2).mask((4, 4));
        let image = Image::constant(4, 4, 0.5);
        assert_eq!(score(&image, &mask).unwrap(), 4. * 0.25);
    }

    #[test]
    fn shape_mismatch() {
        let mask = OcclusionGeometry::square(2).mask((4, 4));
        assert!(matches!(
            score(&Image::constant(4, 5, 0.), &mask),
            Err(ResidualError::ShapeMismatch { .. })
        ));
    }
}
