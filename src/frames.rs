/*!
# Frame export

Saves every iteration of an [IterationTrace] as a numbered PNG file,
`<prefix>0.png` to `<prefix><max_iters>.png`.

If the residuals were tracked, the residual curve up to the frame iteration
is drawn in red on top of the frame: the horizontal axis spans the
iterations `[0, max_iters]` and the vertical axis the residuals
`[0, max_error]`, both across the whole frame.
*/

use std::{
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

use image::{imageops, ImageError, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use indicatif::{ProgressBar, ProgressStyle};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{grayscale::clip, Image, IterationTrace};

/// Default prefix of the frame files
pub const FRAME_PREFIX: &str = "coronagraph";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to create frames directory {1:?}")]
    CreateFrameDir(#[source] io::Error, PathBuf),
    #[error("failed to save frame to png file {1:?}")]
    Save(#[source] ImageError, PathBuf),
    #[error("frame scale must be at least 1")]
    Scale,
}
type Result<T> = std::result::Result<T, FrameError>;

/// Frame color map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Palette {
    #[default]
    Gray,
    Cubehelix,
}
impl Palette {
    fn rgb(&self, value: f64) -> Rgb<u8> {
        match self {
            Palette::Gray => {
                let v = (clip(value) * 255f64).round() as u8;
                Rgb([v, v, v])
            }
            Palette::Cubehelix => {
                let color = colorous::CUBEHELIX.eval_continuous(clip(value));
                Rgb([color.r, color.g, color.b])
            }
        }
    }
}

/// Numbered PNG frames writer
#[derive(Debug, Clone)]
pub struct FrameExporter {
    dir: PathBuf,
    prefix: String,
    palette: Palette,
    scale: u32,
}
impl FrameExporter {
    /// Creates an exporter writing frames into `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: FRAME_PREFIX.to_string(),
            palette: Palette::default(),
            scale: 1,
        }
    }
    pub fn prefix(self, prefix: impl ToString) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..self
        }
    }
    pub fn palette(self, palette: Palette) -> Self {
        Self { palette, ..self }
    }
    /// Nearest neighbour magnification of the frames
    pub fn scale(self, scale: u32) -> Self {
        Self { scale, ..self }
    }
    /// Path to frame `k`
    pub fn frame_path(&self, k: usize) -> PathBuf {
        self.dir.join(format!("{}{}.png", self.prefix, k))
    }
    /// Renders `image` with the palette and the magnification
    pub fn render(&self, image: &Image) -> RgbImage {
        let frame = RgbImage::from_fn(image.width() as u32, image.height() as u32, |x, y| {
            self.palette.rgb(image[(y as usize, x as usize)])
        });
        if self.scale > 1 {
            imageops::resize(
                &frame,
                frame.width() * self.scale,
                frame.height() * self.scale,
                imageops::FilterType::Nearest,
            )
        } else {
            frame
        }
    }
    /// Saves all the iterations of `trace`
    ///
    /// Returns the paths to the frames in iteration order
    pub fn save(&self, trace: &IterationTrace) -> Result<Vec<PathBuf>> {
        if self.scale == 0 {
            return Err(FrameError::Scale);
        }
        create_dir_all(&self.dir).map_err(|e| FrameError::CreateFrameDir(e, self.dir.clone()))?;

        let errors = trace.errors();
        let max_iters = trace.max_iters();
        let max_error = trace.max_error().unwrap_or_default();

        let save_pb = ProgressBar::new(trace.len() as u64);
        save_pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        save_pb.set_message("Saving frames");

        let mut paths = Vec::with_capacity(trace.len());
        for it in trace {
            let mut frame = self.render(&it.image);
            if let Some(errors) = &errors {
                draw_residuals(&mut frame, &errors[..=it.index], max_iters, max_error);
            }
            let path = self.frame_path(it.index);
            frame
                .save(&path)
                .map_err(|e| FrameError::Save(e, path.clone()))?;
            paths.push(path);
            save_pb.inc(1);
        }
        save_pb.finish_with_message("All frames saved");
        log::info!("{} frames saved to {:?}", paths.len(), self.dir);
        Ok(paths)
    }
}

/// Draws the residual curve over the whole frame, origin at the bottom left
fn draw_residuals(frame: &mut RgbImage, errors: &[f64], max_iters: usize, max_error: f64) {
    if max_iters == 0 {
        return;
    }
    let (width, height) = frame.dimensions();
    let (x_span, y_span) = ((width - 1) as f32, (height - 1) as f32);
    let to_pixel = |k: usize, e: f64| {
        let y = if max_error > 0f64 { e / max_error } else { 0f64 };
        (
            x_span * k as f32 / max_iters as f32,
            y_span * (1f32 - y as f32),
        )
    };
    let red = Rgb([255u8, 0u8, 0u8]);
    errors
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .windows(2)
        .for_each(|w| {
            let (k0, &e0) = w[0];
            let (k1, &e1) = w[1];
            draw_line_segment_mut(frame, to_pixel(k0, e0), to_pixel(k1, e1), red);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GerchbergSaxton, OcclusionGeometry, OpticalSystem};
    use strum::IntoEnumIterator;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "coronagraph-frames-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn trace(with_errors: bool) -> IterationTrace {
        let image = Image::from_fn(12, 16, |i, j| ((i * j) % 7) as f64 / 6.);
        let obs = OpticalSystem::new(OcclusionGeometry::circle(4))
            .simulate(&image)
            .unwrap();
        GerchbergSaxton::new(3)
            .unwrap()
            .run(&obs.image, &obs.aberration, with_errors.then_some(&obs.mask))
            .unwrap()
    }

    #[test]
    fn contiguous_numbering() {
        let dir = temp_dir("numbering");
        let paths = FrameExporter::new(&dir).save(&trace(false)).unwrap();
        assert_eq!(paths.len(), 4);
        for (k, path) in paths.iter().enumerate() {
            assert_eq!(path, &dir.join(format!("coronagraph{k}.png")));
            let frame = image::open(path).unwrap();
            assert_eq!((frame.width(), frame.height()), (16, 12));
        }
        assert!(!dir.join("coronagraph4.png").exists());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn gray_frame_matches_image() {
        let image = Image::from_fn(3, 5, |i, j| (i * 5 + j) as f64 / 14.);
        let frame = FrameExporter::new(".").render(&image);
        assert_eq!(frame.dimensions(), (5, 3));
        assert_eq!(frame.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(4, 2), &Rgb([255, 255, 255]));
    }

    #[test]
    fn scaled_frames() {
        let image = Image::constant(3, 5, 0.5);
        for palette in Palette::iter() {
            let frame = FrameExporter::new(".")
                .palette(palette)
                .scale(4)
                .render(&image);
            assert_eq!(frame.dimensions(), (20, 12));
        }
        let dir = temp_dir("scale");
        assert!(matches!(
            FrameExporter::new(&dir).scale(0).save(&trace(false)),
            Err(FrameError::Scale)
        ));
    }

    #[test]
    fn residual_overlay() {
        let dir = temp_dir("overlay");
        let exporter = FrameExporter::new(&dir).prefix("gs");
        let paths = exporter.save(&trace(true)).unwrap();
        assert_eq!(paths[0], dir.join("gs0.png"));
        let last = image::open(&paths[3]).unwrap().into_rgb8();
        assert!(last.pixels().any(|px| px == &Rgb([255, 0, 0])));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn residual_curve_end_points() {
        let mut frame = RgbImage::new(11, 11);
        draw_residuals(&mut frame, &[2., 1., 0.], 2, 2.);
        let red = Rgb([255, 0, 0]);
        assert_eq!(frame.get_pixel(0, 0), &red);
        assert_eq!(frame.get_pixel(5, 5), &red);
        assert_eq!(frame.get_pixel(10, 10), &red);
    }
}
