use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;

use crate::Image;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("failed to write trace to {1:?}")]
    Csv(#[source] csv::Error, PathBuf),
    #[error("failed to plot residuals to {1:?}: {0}")]
    Plot(String, PathBuf),
}
type Result<T> = std::result::Result<T, TraceError>;

/// Reconstruction at one Gerchberg-Saxton iteration
#[derive(Debug, Clone)]
pub struct Iteration {
    pub index: usize,
    pub image: Image,
    /// Residual of the occulted region, if tracked
    pub error: Option<f64>,
}

#[derive(Serialize)]
struct Record {
    iteration: usize,
    error: Option<f64>,
}

/// Ordered Gerchberg-Saxton iterations
#[derive(Debug, Default, Clone)]
pub struct IterationTrace {
    iterations: Vec<Iteration>,
}
impl IterationTrace {
    pub(crate) fn push(&mut self, iteration: Iteration) {
        self.iterations.push(iteration);
    }
    pub fn len(&self) -> usize {
        self.iterations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }
    /// Index of the last iteration
    pub fn max_iters(&self) -> usize {
        self.len().saturating_sub(1)
    }
    pub fn get(&self, k: usize) -> Option<&Iteration> {
        self.iterations.get(k)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Iteration> {
        self.iterations.iter()
    }
    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.iterations.iter().map(|it| &it.image)
    }
    /// Residuals of all the iterations, `None` if any iteration lacks one
    pub fn errors(&self) -> Option<Vec<f64>> {
        if self.is_empty() {
            return None;
        }
        self.iterations.iter().map(|it| it.error).collect()
    }
    /// Largest residual
    pub fn max_error(&self) -> Option<f64> {
        self.errors()
            .map(|errors| errors.into_iter().fold(f64::NEG_INFINITY, f64::max))
    }
    /// Writes the `iteration,error` table to a CSV file
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let csv_err = |e| TraceError::Csv(e, path.to_path_buf());
        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        for it in self.iter() {
            wtr.serialize(Record {
                iteration: it.index,
                error: it.error,
            })
            .map_err(csv_err)?;
        }
        wtr.flush()
            .map_err(|e| TraceError::Csv(e.into(), path.to_path_buf()))?;
        log::info!("trace written to {:?}", path);
        Ok(())
    }
    /// Plots the residuals versus the iterations in a SVG file
    ///
    /// Nothing is written if the residuals were not tracked.
    pub fn plot_errors(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Some(errors) = self.errors() else {
            log::warn!("no residuals to plot");
            return Ok(());
        };
        let plot_err =
            |e: &dyn std::fmt::Display| TraceError::Plot(e.to_string(), path.to_path_buf());
        let max_error = errors.iter().cloned().fold(0f64, f64::max);
        let x_max = self.max_iters().max(1) as f64;
        let y_max = if max_error > 0f64 { max_error } else { 1f64 };

        let plot = SVGBackend::new(path, (768, 512)).into_drawing_area();
        plot.fill(&WHITE).map_err(|e| plot_err(&e))?;
        let mut chart = ChartBuilder::on(&plot)
            .caption("Coronagraph Simulation", ("sans-serif", 24))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .margin(10)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max * 1.05)
            .map_err(|e| plot_err(&e))?;
        chart
            .configure_mesh()
            .x_desc("Iteration")
            .y_desc("Sum Square Error")
            .draw()
            .map_err(|e| plot_err(&e))?;
        chart
            .draw_series(LineSeries::new(
                errors.iter().enumerate().map(|(k, &e)| (k as f64, e)),
                &RED,
            ))
            .map_err(|e| plot_err(&e))?;
        plot.present().map_err(|e| plot_err(&e))?;
        log::info!("residuals plotted in {:?}", path);
        Ok(())
    }
}
impl<'a> IntoIterator for &'a IterationTrace {
    type Item = &'a Iteration;
    type IntoIter = std::slice::Iter<'a, Iteration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(errors: &[Option<f64>]) -> IterationTrace {
        let mut trace = IterationTrace::default();
        errors.iter().enumerate().for_each(|(index, &error)| {
            trace.push(Iteration {
                index,
                image: Image::constant(2, 2, 0.5),
                error,
            })
        });
        trace
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "coronagraph-trace-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn errors() {
        let t = trace(&[Some(3.), Some(1.), Some(2.)]);
        assert_eq!(t.errors(), Some(vec![3., 1., 2.]));
        assert_eq!(t.max_error(), Some(3.));
        assert_eq!(t.max_iters(), 2);
        let t = trace(&[Some(3.), None]);
        assert_eq!(t.errors(), None);
        assert_eq!(t.max_error(), None);
        assert_eq!(IterationTrace::default().errors(), None);
    }

    #[test]
    fn csv_table() {
        let dir = temp_dir("csv");
        let path = dir.join("trace.csv");
        trace(&[Some(0.5), Some(0.25)]).to_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "iteration,error\n0,0.5\n1,0.25\n");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn svg_plot() {
        let dir = temp_dir("svg");
        let path = dir.join("errors.svg");
        // text layout needs a system font, missing fonts surface as a plot error
        match trace(&[Some(0.5), Some(0.25), Some(0.3)]).plot_errors(&path) {
            Ok(()) => assert!(path.exists()),
            Err(e) => assert!(matches!(e, TraceError::Plot(..))),
        }
        let skipped = dir.join("skipped.svg");
        trace(&[None, None]).plot_errors(&skipped).unwrap();
        assert!(!skipped.exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
