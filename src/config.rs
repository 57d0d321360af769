//! Dataset root directories.
//!
//! Every resolver takes a [`DataRoots`] instead of reading the process
//! environment itself, so callers (and tests) can point the crate at any
//! directory tree. [`DataRoots::from_env`] reproduces the conventional
//! `$PHATDATA` / `$BROWNDATA` / `$DRAINEDATA` layout.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const PHAT_ENV: &str = "PHATDATA";
pub const BROWN_ENV: &str = "BROWNDATA";
pub const DRAINE_ENV: &str = "DRAINEDATA";
/// Optional override for the full path of the PHAT v2 AST catalog.
pub const PHAT_AST_ENV: &str = "PHATV2AST";

/// Root directories of the dataset families this crate knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRoots {
    pub phat: Option<PathBuf>,
    pub brown: Option<PathBuf>,
    pub draine: Option<PathBuf>,
    /// Full path to the AST catalog; defaults to `{phat}/table6.dat`.
    pub phat_ast: Option<PathBuf>,
}

impl DataRoots {
    /// Read all roots from the environment. Unset or empty variables stay
    /// `None` and only fail when the corresponding root is requested.
    pub fn from_env() -> Self {
        Self {
            phat: env_path(PHAT_ENV),
            brown: env_path(BROWN_ENV),
            draine: env_path(DRAINE_ENV),
            phat_ast: env_path(PHAT_AST_ENV),
        }
    }

    pub fn with_phat(mut self, root: impl Into<PathBuf>) -> Self {
        self.phat = Some(root.into());
        self
    }

    pub fn with_brown(mut self, root: impl Into<PathBuf>) -> Self {
        self.brown = Some(root.into());
        self
    }

    pub fn with_draine(mut self, root: impl Into<PathBuf>) -> Self {
        self.draine = Some(root.into());
        self
    }

    pub fn with_phat_ast(mut self, path: impl Into<PathBuf>) -> Self {
        self.phat_ast = Some(path.into());
        self
    }

    pub fn phat_root(&self) -> Result<&Path> {
        require(&self.phat, PHAT_ENV)
    }

    pub fn brown_root(&self) -> Result<&Path> {
        require(&self.brown, BROWN_ENV)
    }

    pub fn draine_root(&self) -> Result<&Path> {
        require(&self.draine, DRAINE_ENV)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn require<'a>(root: &'a Option<PathBuf>, var: &'static str) -> Result<&'a Path> {
    root.as_deref().ok_or(Error::MissingConfig { var })
}
