//! Completeness for the Brown HST fields from their artificial star kernels.
//!
//! The `art` product of each Brown field (see [`crate::paths::brown_phot_path`])
//! is a FITS cube whose last two axes form a completeness Hess diagram:
//!
//! - rows: F814W magnitude, 91 samples from 31.5 down to 22.5 (0.1 mag)
//! - columns: F606W-F814W colour, 16 samples from -1.1 to 0.4 (0.1 mag)
//!
//! Any leading axes index repeated trials and are summed away.

use std::path::Path;

use ndarray::{Array2, Axis, Ix2};
use tracing::debug;

use crate::binning::{digitize, linspace};
use crate::error::{Error, Result};
use crate::fits;

pub const N_MAG_BINS: usize = 91;
pub const N_COLOR_BINS: usize = 16;
pub const MAG_FAINT: f64 = 31.5;
pub const MAG_BRIGHT: f64 = 22.5;
pub const COLOR_BLUE: f64 = -1.1;
pub const COLOR_RED: f64 = 0.4;

/// Completeness grid reduced from a Brown AST kernel.
#[derive(Debug, Clone)]
pub struct CompletenessKernel {
    grid: Array2<f64>,
    mag_grid: Vec<f64>,
    color_grid: Vec<f64>,
}

impl CompletenessKernel {
    /// Wrap an already reduced `(91, 16)` grid.
    pub fn from_grid(grid: Array2<f64>) -> Result<Self> {
        if grid.dim() != (N_MAG_BINS, N_COLOR_BINS) {
            return Err(Error::Shape {
                expected: vec![N_MAG_BINS, N_COLOR_BINS],
                found: grid.shape().to_vec(),
            });
        }
        Ok(Self {
            grid,
            mag_grid: linspace(MAG_FAINT, MAG_BRIGHT, N_MAG_BINS),
            color_grid: linspace(COLOR_BLUE, COLOR_RED, N_COLOR_BINS),
        })
    }

    /// Load a kernel cube and sum over every axis but the last two.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cube = fits::read_image(path)?;
        debug!("completeness kernel {} has shape {:?}", path.display(), cube.shape());
        if cube.ndim() < 2 {
            return Err(Error::Shape {
                expected: vec![N_MAG_BINS, N_COLOR_BINS],
                found: cube.shape().to_vec(),
            });
        }
        while cube.ndim() > 2 {
            cube = cube.sum_axis(Axis(0));
        }
        let grid = cube
            .into_dimensionality::<Ix2>()
            .map_err(|e| Error::Fits {
                path: path.to_path_buf(),
                message: format!("kernel is not reducible to 2D: {e}"),
            })?;
        Self::from_grid(grid)
    }

    pub fn grid(&self) -> &Array2<f64> {
        &self.grid
    }

    /// Row of the grid for an F814W magnitude.
    ///
    /// Magnitudes brighter than 22.5 reuse the brightest row instead of
    /// running off the grid.
    pub fn row_index(&self, m814w: f64) -> usize {
        digitize(m814w, &self.mag_grid).min(N_MAG_BINS - 1)
    }

    /// Column of the grid for an F606W-F814W colour, clamped like [`Self::row_index`].
    pub fn col_index(&self, color: f64) -> usize {
        digitize(color, &self.color_grid).min(N_COLOR_BINS - 1)
    }

    /// Completeness of a single star. No interpolation is done.
    pub fn lookup(&self, m606w: f64, m814w: f64) -> f64 {
        self.grid[[self.row_index(m814w), self.col_index(m606w - m814w)]]
    }

    /// Completeness for each star given parallel magnitude slices.
    pub fn estimate(&self, m606w: &[f64], m814w: &[f64]) -> Result<Vec<f64>> {
        if m606w.len() != m814w.len() {
            return Err(Error::InvalidArgument(format!(
                "F606W and F814W arrays differ in length: {} vs {}",
                m606w.len(),
                m814w.len()
            )));
        }
        Ok(m606w
            .iter()
            .zip(m814w)
            .map(|(&b, &r)| self.lookup(b, r))
            .collect())
    }
}

/// Completeness of stars with the given F606W and F814W magnitudes, using
/// the AST kernel at `ast_path`.
pub fn estimate_completeness(m606w: &[f64], m814w: &[f64], ast_path: &Path) -> Result<Vec<f64>> {
    CompletenessKernel::load(ast_path)?.estimate(m606w, m814w)
}
