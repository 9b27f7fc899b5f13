/*!
# Spectral transform

Two-dimensional discrete Fourier transform pair between a real image and
its half-spectrum amplitude and phase.

The forward transform applies a real FFT along every row, keeping the
`W/2+1` non-redundant bins, followed by a complex FFT along every column.
The inverse undoes the column FFT, rebuilds every row from its Hermitian
symmetry and keeps the real part.
*/

use nalgebra::DMatrix;
use rustfft::{num_complex::Complex64, FftPlanner};

use crate::Image;

#[derive(Debug, thiserror::Error)]
pub enum SpectralError {
    #[error("cannot transform an empty {0}x{1} image")]
    Empty(usize, usize),
    #[error("amplitude {0:?} and phase {1:?} shapes differ")]
    ShapeMismatch((usize, usize), (usize, usize)),
    #[error("spectrum {found:?} does not match a {image:?} image (expected {expected:?})")]
    SpectrumShape {
        image: (usize, usize),
        expected: (usize, usize),
        found: (usize, usize),
    },
}
type Result<T> = std::result::Result<T, SpectralError>;

/// Number of half-spectrum columns for an image `width` pixels wide
pub fn half_width(width: usize) -> usize {
    width / 2 + 1
}
/// Half-spectrum (rows, columns) of an image of `dims` (height, width)
pub fn spectrum_dims((height, width): (usize, usize)) -> (usize, usize) {
    (height, half_width(width))
}

/// Amplitude and phase of the half spectrum of a real image
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralField {
    pub amplitude: DMatrix<f64>,
    pub phase: DMatrix<f64>,
    /// (height, width) of the image the spectrum belongs to
    image_dims: (usize, usize),
}
impl SpectralField {
    /// Creates a spectral field for an image of `image_dims` (height, width)
    pub fn new(
        amplitude: DMatrix<f64>,
        phase: DMatrix<f64>,
        image_dims: (usize, usize),
    ) -> Result<Self> {
        if image_dims.0 == 0 || image_dims.1 == 0 {
            return Err(SpectralError::Empty(image_dims.0, image_dims.1));
        }
        if amplitude.shape() != phase.shape() {
            return Err(SpectralError::ShapeMismatch(
                amplitude.shape(),
                phase.shape(),
            ));
        }
        let expected = spectrum_dims(image_dims);
        if amplitude.shape() != expected {
            return Err(SpectralError::SpectrumShape {
                image: image_dims,
                expected,
                found: amplitude.shape(),
            });
        }
        Ok(Self {
            amplitude,
            phase,
            image_dims,
        })
    }
    /// Returns the same amplitude with another phase
    pub fn with_phase(&self, phase: DMatrix<f64>) -> Result<Self> {
        Self::new(self.amplitude.clone(), phase, self.image_dims)
    }
    pub fn image_dims(&self) -> (usize, usize) {
        self.image_dims
    }
    /// Half-spectrum (rows, columns)
    pub fn dims(&self) -> (usize, usize) {
        self.amplitude.shape()
    }
    /// Image reconstructed from this field, see [inverse]
    pub fn inverse(&self) -> Image {
        inverse_unchecked(&self.amplitude, &self.phase, self.image_dims)
    }
}

/// Forward 2D real DFT of `data`, returned as a half spectrum
fn rfft2(data: &DMatrix<f64>) -> DMatrix<Complex64> {
    let (height, width) = data.shape();
    let n_half = half_width(width);
    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(width);
    let col_fft = planner.plan_fft_forward(height);

    let mut spectrum = DMatrix::<Complex64>::zeros(height, n_half);
    let mut row = vec![Complex64::default(); width];
    for i in 0..height {
        row.iter_mut()
            .zip(data.row(i).iter())
            .for_each(|(r, &x)| *r = Complex64::new(x, 0f64));
        row_fft.process(&mut row);
        spectrum
            .row_mut(i)
            .iter_mut()
            .zip(row.iter())
            .for_each(|(s, &r)| *s = r);
    }
    // columns are contiguous in nalgebra storage
    spectrum
        .as_mut_slice()
        .chunks_exact_mut(height)
        .for_each(|column| col_fft.process(column));
    spectrum
}

/// Inverse of [rfft2], real part only and normalized
fn irfft2(spectrum: &mut DMatrix<Complex64>, width: usize) -> DMatrix<f64> {
    let (height, n_half) = spectrum.shape();
    let mut planner = FftPlanner::<f64>::new();
    let row_ifft = planner.plan_fft_inverse(width);
    let col_ifft = planner.plan_fft_inverse(height);

    spectrum
        .as_mut_slice()
        .chunks_exact_mut(height)
        .for_each(|column| col_ifft.process(column));

    let norm = (height * width) as f64;
    let mut data = DMatrix::<f64>::zeros(height, width);
    let mut row = vec![Complex64::default(); width];
    for i in 0..height {
        let half = spectrum.row(i);
        for (j, r) in row.iter_mut().enumerate() {
            *r = if j < n_half {
                half[j]
            } else {
                half[width - j].conj()
            };
        }
        row[0].im = 0f64;
        if width % 2 == 0 {
            row[width / 2].im = 0f64;
        }
        row_ifft.process(&mut row);
        data.row_mut(i)
            .iter_mut()
            .zip(row.iter())
            .for_each(|(x, r)| *x = r.re / norm);
    }
    data
}

/// Amplitude and phase of the 2D half-spectrum DFT of `image`
pub fn forward(image: &DMatrix<f64>) -> Result<SpectralField> {
    let (height, width) = image.shape();
    if height == 0 || width == 0 {
        return Err(SpectralError::Empty(height, width));
    }
    let spectrum = rfft2(image);
    Ok(SpectralField {
        amplitude: spectrum.map(|z| z.norm()),
        phase: spectrum.map(|z| z.arg()),
        image_dims: (height, width),
    })
}

/// Image from the half-spectrum `amplitude * exp(i*phase)`, clipped to [0,1]
pub fn inverse(
    amplitude: &DMatrix<f64>,
    phase: &DMatrix<f64>,
    image_dims: (usize, usize),
) -> Result<Image> {
    SpectralField::new(amplitude.clone(), phase.clone(), image_dims)
        .map(|field| field.inverse())
}

fn inverse_unchecked(
    amplitude: &DMatrix<f64>,
    phase: &DMatrix<f64>,
    (_, width): (usize, usize),
) -> Image {
    let mut spectrum = amplitude.zip_map(phase, |a, p| Complex64::from_polar(a, p));
    Image::clipped(irfft2(&mut spectrum, width))
}
