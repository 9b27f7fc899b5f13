use std::{
    ops::Deref,
    path::{Path, PathBuf},
    time::Instant,
};

use image::{GrayImage, ImageError, Luma};
use nalgebra::DMatrix;

#[derive(Debug, thiserror::Error)]
pub enum GrayscaleError {
    #[error("failed to read image {1:?}")]
    Read(#[source] ImageError, PathBuf),
    #[error("image {0:?} is empty")]
    Empty(PathBuf),
}
type Result<T> = std::result::Result<T, GrayscaleError>;

/// Clip a value to [0,1], mapping NaN to 0
#[inline]
pub fn clip(value: f64) -> f64 {
    if value > 1f64 {
        1f64
    } else if value >= 0f64 {
        value
    } else {
        0f64
    }
}

/// Grayscale image with values in [0,1]
///
/// Rows are the image height and columns the image width.
#[derive(Debug, Clone, PartialEq)]
pub struct Image(DMatrix<f64>);
impl Deref for Image {
    type Target = DMatrix<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Image> for DMatrix<f64> {
    fn from(image: Image) -> Self {
        image.0
    }
}
impl Image {
    /// Creates an image from a matrix, clipping every value to [0,1]
    pub fn clipped(mut data: DMatrix<f64>) -> Self {
        data.iter_mut().for_each(|x| *x = clip(*x));
        Self(data)
    }
    /// Creates an image of `height` rows and `width` columns from `f(row, column)`
    pub fn from_fn<F>(height: usize, width: usize, f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        Self::clipped(DMatrix::from_fn(height, width, f))
    }
    /// Creates a constant image
    pub fn constant(height: usize, width: usize, value: f64) -> Self {
        Self::clipped(DMatrix::from_element(height, width, value))
    }
    /// Image (height, width)
    pub fn dims(&self) -> (usize, usize) {
        self.0.shape()
    }
    pub fn height(&self) -> usize {
        self.0.nrows()
    }
    pub fn width(&self) -> usize {
        self.0.ncols()
    }
    /// Loads an image file as grayscale
    ///
    /// Color images are reduced to the mean of their red, green and blue
    /// channels, alpha is discarded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let now = Instant::now();
        let rgb = image::open(path)
            .map_err(|e| GrayscaleError::Read(e, path.to_path_buf()))?
            .into_rgb32f();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(GrayscaleError::Empty(path.to_path_buf()));
        }
        let image = Self::from_fn(height as usize, width as usize, |i, j| {
            let px = rgb.get_pixel(j as u32, i as u32);
            px.0.iter().map(|&c| c as f64).sum::<f64>() / 3f64
        });
        log::info!(
            "... loaded {}x{} in {:}ms",
            height,
            width,
            now.elapsed().as_millis()
        );
        Ok(image)
    }
    /// Converts to an 8 bits grayscale buffer
    pub fn to_luma8(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let value = self.0[(y as usize, x as usize)];
            Luma([(clip(value) * 255f64).round() as u8])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipping() {
        let image = Image::clipped(DMatrix::from_row_slice(
            2,
            2,
            &[-0.5, 0.25, 1.5, f64::NAN],
        ));
        assert_eq!(image.as_slice(), &[0., 1., 0.25, 0.]);
    }

    #[test]
    fn luma8_layout() {
        let image = Image::from_fn(2, 3, |i, j| if i == 1 && j == 2 { 1. } else { 0. });
        let luma = image.to_luma8();
        assert_eq!(luma.dimensions(), (3, 2));
        assert_eq!(luma.get_pixel(2, 1).0[0], 255);
        assert_eq!(luma.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn load_png() {
        let dir = std::env::temp_dir().join(format!("coronagraph-grayscale-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gray.png");
        let mut buffer = image::RgbImage::new(4, 3);
        buffer.put_pixel(1, 2, image::Rgb([255, 0, 0]));
        buffer.put_pixel(3, 0, image::Rgb([255, 255, 255]));
        buffer.save(&path).unwrap();

        let image = Image::load(&path).unwrap();
        assert_eq!(image.dims(), (3, 4));
        assert!((image[(2, 1)] - 1. / 3.).abs() < 1e-6);
        assert!((image[(0, 3)] - 1.).abs() < 1e-6);
        assert_eq!(image[(0, 0)], 0.);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn load_missing() {
        assert!(matches!(
            Image::load("does/not/exist.png"),
            Err(GrayscaleError::Read(..))
        ));
    }
}
