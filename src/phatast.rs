//! PHAT v2 artificial star tests grouped into their six sky fields.
//!
//! The AST catalog does not say which field a star was injected into, so
//! the fields are recovered by k-means on (RA, Dec). k-means numbers its
//! clusters arbitrarily; each cluster is therefore identified with the
//! nearest of the six known field centres in [`FIELD_CENTERS`], and field
//! `i` always refers to `FIELD_CENTERS[i]`.
//!
//! Per-field products:
//! - crowding files in the StarFISH layout ([`PhatAstFields::write_crowdfile`])
//! - completeness and photometric-error Hess diagrams

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use ndarray::Array2;
use tracing::{info, warn};

use crate::ast::{AstStar, AstTable};
use crate::band::Band;
use crate::binning::{binned_statistic_2d, edges};
use crate::error::{Error, Result};
use crate::kmeans::{KMeansConfig, kmeans, nearest};

/// Centres (RA, Dec in degrees) of the six PHAT AST fields, in field order.
///
/// Approximate positions of the artificial star fields of Williams et al.
/// (2014, ApJS 215, 9), running from the bulge outward along the PHAT
/// footprint. Each only selects its nearest k-means centroid, so these are
/// placements good to a few arcminutes rather than catalogued values.
pub const FIELD_CENTERS: [[f64; 2]; 6] = [
    [10.7178, 41.3158],
    [10.8745, 41.5430],
    [11.0312, 41.7416],
    [11.1939, 41.9163],
    [11.3640, 42.0640],
    [11.5489, 42.1904],
];

/// `|input - output|` above which a star counts as lost in a crowdfile.
pub const DROPPED_DELTA: f64 = 9.0;
/// Magnitude difference written for lost stars.
pub const DROPPED_SENTINEL: f64 = 9.99;
/// Stars with `|input - output|` at or above this are left out of error maps.
pub const ERROR_DELTA_LIMIT: f64 = 20.0;

/// One axis of a Hess diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Input magnitude in one band.
    Single(Band),
    /// Input colour, first band minus second.
    Pair(Band, Band),
}

impl Axis {
    pub fn value(&self, star: &AstStar) -> f64 {
        match *self {
            Axis::Single(b) => star.input(b),
            Axis::Pair(a, b) => star.input(a) - star.input(b),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Single(b) => write!(f, "{b}"),
            Axis::Pair(a, b) => write!(f, "{a}-{b}"),
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    /// `"f814w"` or `"f475w-f814w"`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            None => Ok(Axis::Single(s.parse()?)),
            Some((a, b)) => Ok(Axis::Pair(a.parse()?, b.parse()?)),
        }
    }
}

/// Axes and binning of a Hess diagram. Spans are inclusive of both ends.
#[derive(Debug, Clone)]
pub struct HessSpec {
    pub x: Axis,
    pub y: Axis,
    pub x_span: (f64, f64),
    pub y_span: (f64, f64),
    pub dx: f64,
    pub dy: f64,
}

/// A binned statistic over a Hess plane.
#[derive(Debug, Clone)]
pub struct Hess {
    /// Shape `(x_edges.len() - 1, y_edges.len() - 1)`; `NaN` marks empty bins.
    pub values: Array2<f64>,
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
}

/// The AST catalog with each star assigned to a field.
#[derive(Debug, Clone)]
pub struct PhatAstFields {
    table: AstTable,
    labels: Vec<usize>,
    centroids: Vec<[f64; 2]>,
    /// Cluster label for each known field centre.
    field_labels: Vec<usize>,
}

impl PhatAstFields {
    /// Cluster with the default configuration and the built-in field centres.
    pub fn new(table: AstTable) -> Result<Self> {
        Self::with_config(table, &KMeansConfig::default(), &FIELD_CENTERS)
    }

    pub fn with_config(
        table: AstTable,
        config: &KMeansConfig,
        centers: &[[f64; 2]],
    ) -> Result<Self> {
        let coords: Vec<[f64; 2]> = table.rows().iter().map(|r| [r.ra, r.dec]).collect();
        let result = kmeans(&coords, config)?;

        // Two centres may land on the same cluster; that is kept as is.
        let field_labels: Vec<usize> = centers
            .iter()
            .filter_map(|c| nearest(c, &result.centroids).map(|(label, _)| label))
            .collect();
        for (i, label) in field_labels.iter().enumerate() {
            if field_labels[..i].contains(label) {
                warn!("field {i} shares cluster {label} with an earlier field");
            }
        }

        info!(
            "Clustered {} AST stars into {} fields (inertia {:.4e})",
            table.len(),
            result.centroids.len(),
            result.inertia
        );

        Ok(Self {
            table,
            labels: result.labels,
            centroids: result.centroids,
            field_labels,
        })
    }

    pub fn table(&self) -> &AstTable {
        &self.table
    }

    /// Cluster label of every row, in table order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// k-means centroids indexed by cluster label.
    pub fn centroids(&self) -> &[[f64; 2]] {
        &self.centroids
    }

    pub fn n_fields(&self) -> usize {
        self.field_labels.len()
    }

    /// Cluster label assigned to field `field`.
    pub fn field_label(&self, field: usize) -> Result<usize> {
        self.field_labels.get(field).copied().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "field {field} out of range, there are {} fields",
                self.field_labels.len()
            ))
        })
    }

    /// Rows belonging to `field`, in table order.
    pub fn field_rows(&self, field: usize) -> Result<Vec<&AstStar>> {
        let label = self.field_label(field)?;
        Ok(self
            .table
            .rows()
            .iter()
            .zip(&self.labels)
            .filter(|(_, l)| **l == label)
            .map(|(r, _)| r)
            .collect())
    }

    /// Rows of `field` as a standalone table.
    pub fn field_table(&self, field: usize) -> Result<AstTable> {
        Ok(AstTable::from_rows(
            self.field_rows(field)?.into_iter().cloned().collect(),
        ))
    }

    /// Write the crowding file of `field` for the given bands, returning the
    /// number of stars written.
    pub fn write_crowdfile(&self, field: usize, bands: &[Band], path: &Path) -> Result<usize> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        let n = self.write_crowdfile_to(field, bands, &mut w)?;
        w.flush()?;
        info!("Wrote {n} stars of field {field} to {}", path.display());
        Ok(n)
    }

    /// Crowding file rows: RA, Dec, then per band the input magnitude and
    /// `input - output`, with lost stars forced to +9.99.
    pub fn write_crowdfile_to<W: Write>(
        &self,
        field: usize,
        bands: &[Band],
        w: &mut W,
    ) -> Result<usize> {
        if bands.is_empty() {
            return Err(Error::InvalidArgument(
                "crowdfile needs at least one band".to_string(),
            ));
        }
        let rows = self.field_rows(field)?;
        for star in &rows {
            write!(w, "{:.8} {:.8}", star.ra, star.dec)?;
            for &band in bands {
                let mut delta = star.delta(band);
                if delta.abs() > DROPPED_DELTA {
                    delta = DROPPED_SENTINEL;
                }
                write!(w, " {:.2} {:+.2}", star.input(band), delta)?;
            }
            writeln!(w)?;
        }
        Ok(rows.len())
    }

    fn hess<F>(&self, field: usize, spec: &HessSpec, statistic: F) -> Result<Hess>
    where
        F: Fn(&[&AstStar]) -> f64,
    {
        let rows = self.field_rows(field)?;
        let x_edges = edges(spec.x_span.0, spec.x_span.1, spec.dx)?;
        let y_edges = edges(spec.y_span.0, spec.y_span.1, spec.dy)?;
        let x: Vec<f64> = rows.iter().map(|r| spec.x.value(r)).collect();
        let y: Vec<f64> = rows.iter().map(|r| spec.y.value(r)).collect();

        let mut members: Vec<&AstStar> = Vec::new();
        let values = binned_statistic_2d(&x, &y, &x_edges, &y_edges, |idx| {
            members.clear();
            members.extend(idx.iter().map(|&i| rows[i]));
            statistic(&members)
        })?;

        Ok(Hess {
            values,
            x_edges,
            y_edges,
        })
    }

    /// Fraction of injected stars recovered in `band`, per bin.
    pub fn completeness_hess(&self, field: usize, band: Band, spec: &HessSpec) -> Result<Hess> {
        self.hess(field, spec, |stars| recovered_fraction(stars, band))
    }

    /// Standard deviation of `input - output` in `band`, per bin.
    pub fn error_hess(&self, field: usize, band: Band, spec: &HessSpec) -> Result<Hess> {
        self.hess(field, spec, |stars| delta_std(stars, band))
    }
}

fn recovered_fraction(stars: &[&AstStar], band: Band) -> f64 {
    if stars.is_empty() {
        return f64::NAN;
    }
    let n_recovered = stars.iter().filter(|s| s.recovered(band)).count();
    n_recovered as f64 / stars.len() as f64
}

/// Population standard deviation of the magnitude error, ignoring lost stars.
fn delta_std(stars: &[&AstStar], band: Band) -> f64 {
    let deltas: Vec<f64> = stars
        .iter()
        .map(|s| s.delta(band))
        .filter(|d| d.abs() < ERROR_DELTA_LIMIT)
        .collect();
    if deltas.is_empty() {
        return f64::NAN;
    }
    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    (deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt()
}
