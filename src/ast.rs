//! PHAT v2 artificial star test catalog.
//!
//! From <http://cdsarc.u-strasbg.fr/vizier/ftp/cats/J/ApJS/215/9/ReadMe>:
//!
//! ```text
//!   1- 11 F11.8 deg RAdeg     Right Ascension in decimal degrees (J2000)
//!  13- 23 F11.8 deg DEdeg     Declination in decimal degrees (J2000)
//!  25- 30 F6.3  mag F275W-in  Input HST/WFC3 F275W band mag
//!  32- 37 F6.3  mag F275W-out ?=99.999 Output HST/WFC3 F275W band mag
//!  39- 44 F6.3  mag F336W-in  Input HST/WFC3 F336W band mag
//!  46- 51 F6.3  mag F336W-out ?=99.999 Output HST/WFC3 F336W band mag
//!  53- 58 F6.3  mag F475W-in  Input HST/ACS F475W band magnitude
//!  60- 65 F6.3  mag F475W-out ?=99.999 Output HST/ACS F475W band mag
//!  67- 72 F6.3  mag F814W-in  Input HST/ACS F814W band magnitude
//!  74- 79 F6.3  mag F814W-out ?=99.999 Output HST/ACS F814W band mag
//!  81- 86 F6.3  mag F110W-in  ?=99.999 Input HST/WFC3 F110W band mag
//!  88- 93 F6.3  mag F110W-out ?=99.999 Output HST/WFC3 F110W band mag
//!  95-100 F6.3  mag F160W-in  ?=99.999 Input HST/WFC3 F160W band mag
//! 102-107 F6.3  mag F160W-out ?=99.999 Output HST/WFC3 F160W band mag
//! ```
//!
//! Columns are separated by single spaces, so lines are split on whitespace
//! rather than sliced by byte range.

use std::path::Path;

use tracing::info;

use crate::band::Band;
use crate::error::{Error, Result};

/// Column names in file order.
pub const COLUMNS: [&str; 14] = [
    "ra",
    "dec",
    "f275w_in",
    "f275w_out",
    "f336w_in",
    "f336w_out",
    "f475w_in",
    "f475w_out",
    "f814w_in",
    "f814w_out",
    "f110w_in",
    "f110w_out",
    "f160w_in",
    "f160w_out",
];

/// Output magnitude flagging a star that was not recovered.
pub const NOT_RECOVERED: f64 = 99.999;

/// Output magnitudes at or above this are treated as non-detections.
pub const RECOVERED_LIMIT: f64 = 90.0;

/// One artificial star: position plus input/output magnitude per band.
#[derive(Debug, Clone, PartialEq)]
pub struct AstStar {
    pub ra: f64,
    pub dec: f64,
    /// Input magnitudes indexed by [`Band::index`].
    pub mag_in: [f64; 6],
    /// Output magnitudes indexed by [`Band::index`].
    pub mag_out: [f64; 6],
}

impl AstStar {
    pub fn input(&self, band: Band) -> f64 {
        self.mag_in[band.index()]
    }

    pub fn output(&self, band: Band) -> f64 {
        self.mag_out[band.index()]
    }

    /// `input - output` in `band`.
    pub fn delta(&self, band: Band) -> f64 {
        self.input(band) - self.output(band)
    }

    pub fn recovered(&self, band: Band) -> bool {
        self.output(band) < RECOVERED_LIMIT
    }

    fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let mut values = [0.0_f64; 14];
        let mut n = 0;
        for token in line.split_whitespace() {
            if n == values.len() {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("more than {} columns", values.len()),
                });
            }
            values[n] = token.parse().map_err(|_| Error::Parse {
                line: line_no,
                message: format!("invalid value '{token}' in column {}", COLUMNS[n]),
            })?;
            n += 1;
        }
        if n != values.len() {
            return Err(Error::Parse {
                line: line_no,
                message: format!("expected {} columns, found {n}", values.len()),
            });
        }

        Ok(Self {
            ra: values[0],
            dec: values[1],
            mag_in: std::array::from_fn(|i| values[2 + 2 * i]),
            mag_out: std::array::from_fn(|i| values[3 + 2 * i]),
        })
    }
}

/// The AST catalog, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AstTable {
    rows: Vec<AstStar>,
}

impl AstTable {
    pub fn from_rows(rows: Vec<AstStar>) -> Self {
        Self { rows }
    }

    /// Parse catalog text. Blank lines are skipped; there is no header.
    pub fn parse(data: &str) -> Result<Self> {
        let rows = data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| AstStar::parse_line(line, i + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let table = Self::parse(&data)?;
        info!("Loaded {} AST rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn rows(&self) -> &[AstStar] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Named column by its catalog name, e.g. `"f814w_out"`.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = COLUMNS.iter().position(|&c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|r| match idx {
                    0 => r.ra,
                    1 => r.dec,
                    i if i % 2 == 0 => r.mag_in[(i - 2) / 2],
                    i => r.mag_out[(i - 3) / 2],
                })
                .collect(),
        )
    }
}
