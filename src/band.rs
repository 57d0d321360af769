use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The six HST bands observed by PHAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    F275W,
    F336W,
    F475W,
    F814W,
    F110W,
    F160W,
}

impl Band {
    /// All bands in AST catalog column order.
    pub const ALL: [Band; 6] = [
        Band::F275W,
        Band::F336W,
        Band::F475W,
        Band::F814W,
        Band::F110W,
        Band::F160W,
    ];

    /// Lowercase filter name as used in file names.
    pub fn name(self) -> &'static str {
        match self {
            Band::F275W => "f275w",
            Band::F336W => "f336w",
            Band::F475W => "f475w",
            Band::F814W => "f814w",
            Band::F110W => "f110w",
            Band::F160W => "f160w",
        }
    }

    /// HLSP instrument token for the camera that observed this band.
    pub fn instrument(self) -> &'static str {
        match self {
            Band::F475W | Band::F814W => "acs-wfc",
            Band::F110W | Band::F160W => "wfc3-ir",
            Band::F275W | Band::F336W => "wfc3-uvis",
        }
    }

    /// Position of this band in [`Band::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Band {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Band::ALL
            .into_iter()
            .find(|b| b.name() == lower)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown PHAT band '{s}'")))
    }
}

/// Parse a comma-separated band list such as `"f475w,f814w"`.
pub fn parse_band_list(s: &str) -> Result<Vec<Band>, Error> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}
