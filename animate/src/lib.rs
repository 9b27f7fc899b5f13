/*!
# Coronagraph animation

Assembles the numbered coronagraph frames `<prefix>0.png`, `<prefix>1.png`,
... into an animated GIF.

The frames are read in order up to a given last frame number.
The sequence ends at the first frame that is missing, unreadable or that
does not have the dimensions of the first frame.
*/

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use image::{
    codecs::gif::{GifEncoder, Repeat},
    Delay, Frame, ImageError, RgbaImage,
};
use indicatif::ProgressBar;

/// Default frame rate [frame/s]
pub const FPS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AnimateError {
    #[error("frame rate must be at least 1 frame per second")]
    FrameRate,
    #[error("failed to create animation file {1:?}")]
    Create(#[source] io::Error, PathBuf),
    #[error("failed to encode frame #{1} into the animation")]
    Encode(#[source] ImageError, usize),
}
type Result<T> = std::result::Result<T, AnimateError>;

/// Numbered frames to animation builder
#[derive(Debug, Clone)]
pub struct Animation {
    frames_dir: PathBuf,
    prefix: String,
    fps: u32,
}
impl Animation {
    /// Creates an animation from the frames in `frames_dir`
    pub fn new(frames_dir: impl AsRef<Path>) -> Self {
        Self {
            frames_dir: frames_dir.as_ref().to_path_buf(),
            prefix: String::from("coronagraph"),
            fps: FPS,
        }
    }
    pub fn prefix(self, prefix: impl ToString) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..self
        }
    }
    pub fn fps(self, fps: u32) -> Self {
        Self { fps, ..self }
    }
    /// Path to frame `k`
    pub fn frame_path(&self, k: usize) -> PathBuf {
        self.frames_dir.join(format!("{}{}.png", self.prefix, k))
    }
    fn read_frame(&self, k: usize) -> Option<RgbaImage> {
        let path = self.frame_path(k);
        match image::open(&path) {
            Ok(frame) => Some(frame.into_rgba8()),
            Err(e) => {
                log::warn!("frame {:?} not readable ({}), ending the sequence", path, e);
                None
            }
        }
    }
    /// Writes frames `0` to `last_frame` into the GIF file `output`
    ///
    /// Returns the number of frames in the animation.
    /// Nothing is written if the first frame cannot be read.
    pub fn assemble(&self, last_frame: usize, output: impl AsRef<Path>) -> Result<usize> {
        if self.fps == 0 {
            return Err(AnimateError::FrameRate);
        }
        let output = output.as_ref();
        let Some(first) = self.read_frame(0) else {
            return Ok(0);
        };
        let size = first.dimensions();
        log::info!(
            "Assembling up to {} {}x{} frames at {}fps into {:?}...",
            last_frame + 1,
            size.0,
            size.1,
            self.fps,
            output
        );

        let file =
            File::create(output).map_err(|e| AnimateError::Create(e, output.to_path_buf()))?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| AnimateError::Encode(e, 0))?;
        let delay = Delay::from_numer_denom_ms(1000, self.fps);

        let pb = ProgressBar::new(last_frame as u64 + 1);
        let mut frame = first;
        let mut n_frame = 0;
        loop {
            encoder
                .encode_frame(Frame::from_parts(frame, 0, 0, delay))
                .map_err(|e| AnimateError::Encode(e, n_frame))?;
            n_frame += 1;
            pb.inc(1);
            if n_frame > last_frame {
                break;
            }
            match self.read_frame(n_frame) {
                Some(next) if next.dimensions() == size => frame = next,
                Some(next) => {
                    log::warn!(
                        "frame #{} is {:?} instead of {:?}, ending the sequence",
                        n_frame,
                        next.dimensions(),
                        size
                    );
                    break;
                }
                None => break,
            }
        }
        pb.finish_and_clear();
        log::info!("... {} frames written to {:?}", n_frame, output);
        Ok(n_frame)
    }
}
