//! Data access and artificial star test analysis for HST surveys of M31.
//!
//! Locates PHAT and Brown GO-10265 HLSP products under configurable dataset
//! roots, estimates completeness from the Brown AST kernels, and groups the
//! PHAT v2 artificial star tests into fields for crowding files and
//! completeness/error Hess diagrams.

pub mod ast;
pub mod band;
pub mod binning;
pub mod completeness;
pub mod config;
pub mod draine;
pub mod error;
pub mod fits;
pub mod kmeans;
pub mod paths;
pub mod phatast;

pub use band::Band;
pub use completeness::{CompletenessKernel, estimate_completeness};
pub use config::DataRoots;
pub use error::{Error, Result};
pub use paths::{
    BrownBand, BrownField, BrownProduct, brown_image_path, brown_phot_path, phat_brick_path,
    phat_field_path, phat_phot_path, phat_v2_ast_path,
};
