//! Draine et al. (2014) M31 dust maps.
//!
//! See <http://www.astro.princeton.edu/~draine/m31dust/m31dust.html>.

use std::path::PathBuf;

use crate::config::DataRoots;
use crate::error::{Error, Result};

pub const SPIRE350_DUST_MASS_MAP: &str = "M31_S350_110_SSS_110_Model_All_SurfBr_Mdust.fits.gz";

/// Path to the dust mass surface density map at SPIRE 350 resolution.
pub fn spire350_dust_mass_map(roots: &DataRoots) -> Result<PathBuf> {
    let path = roots.draine_root()?.join(SPIRE350_DUST_MASS_MAP);
    if !path.exists() {
        return Err(Error::MissingData(format!("{} not found", path.display())));
    }
    Ok(path)
}
