//! Locate PHAT and Brown GO-10265 HLSP data products on disk.
//!
//! PHAT products live under `{PHATDATA}/brickBB/` and are found by glob,
//! since their file names embed a proposal ID this crate does not track.
//! Brown products have fully determined names under `{BROWNDATA}/`.
//! Every resolver returns a path that exists, or [`Error::MissingData`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::band::Band;
use crate::config::DataRoots;
use crate::error::{Error, Result};

/// Valid PHAT brick numbers.
pub const PHAT_BRICKS: std::ops::RangeInclusive<u32> = 1..=23;

/// Default PHAT photometry product kind (good-star catalog).
pub const DEFAULT_PHOT_KIND: &str = "gst";

const PHAT_PREFIX: &str = "hlsp_phat_hst";
const PHAT_DRZ_POSTFIX: &str = "v1_drz.fits";
const BROWN_PREFIX: &str = "hlsp_andromeda_hst_acs-wfc";

fn phat_basedir(roots: &DataRoots, brick: u32) -> Result<PathBuf> {
    if !PHAT_BRICKS.contains(&brick) {
        return Err(Error::InvalidArgument(format!(
            "PHAT brick must be in 1..=23, got {brick}"
        )));
    }
    Ok(roots.phat_root()?.join(format!("brick{brick:02}")))
}

/// Glob `filename` inside `dir` and require exactly one match.
///
/// `dir` is escaped so that metacharacters in the root path are taken
/// literally; only `filename` carries wildcards.
fn glob_single(dir: &Path, filename: &str) -> Result<PathBuf> {
    let dir_str = dir.to_str().ok_or_else(|| {
        Error::InvalidArgument(format!("non UTF-8 data directory: {}", dir.display()))
    })?;
    let pattern = format!(
        "{}{}{}",
        glob::Pattern::escape(dir_str),
        std::path::MAIN_SEPARATOR,
        filename
    );
    debug!("globbing {pattern}");

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(|r| r.ok()).collect();
    matches.sort();

    match matches.len() {
        1 => {
            let path = matches.remove(0);
            require_exists(path)
        }
        0 => Err(Error::MissingData(format!("no file matches {pattern}"))),
        n => Err(Error::MissingData(format!(
            "{n} files match {pattern}, expected exactly one"
        ))),
    }
}

fn require_exists(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::MissingData(format!("{} not found", path.display())))
    }
}

/// Path to a photometry product for a single PHAT field.
///
/// `filterset` is the filter-set token used in the file name, e.g.
/// `f275w-f336w`; `kind` is the product kind, usually [`DEFAULT_PHOT_KIND`].
pub fn phat_phot_path(
    roots: &DataRoots,
    brick: u32,
    field: u32,
    filterset: &str,
    kind: &str,
) -> Result<PathBuf> {
    let dir = phat_basedir(roots, brick)?;
    let filename = format!("*-b{brick:02}-f{field:02}_{filterset}_v1_{kind}.fits");
    glob_single(&dir, &filename)
}

/// Path to the drizzled image of a whole PHAT brick in one band.
pub fn phat_brick_path(roots: &DataRoots, brick: u32, band: Band) -> Result<PathBuf> {
    let dir = phat_basedir(roots, brick)?;
    let filename = [
        PHAT_PREFIX,
        band.instrument(),
        &format!("*-m31-b{brick:02}"),
        band.name(),
        PHAT_DRZ_POSTFIX,
    ]
    .join("_");
    glob_single(&dir, &filename)
}

/// Path to the drizzled image of a single PHAT field in one band.
pub fn phat_field_path(roots: &DataRoots, brick: u32, field: u32, band: Band) -> Result<PathBuf> {
    let dir = phat_basedir(roots, brick)?;
    let filename = [
        PHAT_PREFIX,
        band.instrument(),
        &format!("*-m31-b{brick:02}-f{field:02}"),
        band.name(),
        PHAT_DRZ_POSTFIX,
    ]
    .join("_");
    glob_single(&dir, &filename)
}

/// Path to the PHAT v2 artificial star test catalog (Williams et al. 2014,
/// VizieR J/ApJS/215/9).
pub fn phat_v2_ast_path(roots: &DataRoots) -> Result<PathBuf> {
    let path = match &roots.phat_ast {
        Some(path) => path.clone(),
        None => roots.phat_root()?.join("table6.dat"),
    };
    require_exists(path)
}

/// Fields of the Brown et al. GO-10265 survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrownField {
    Halo11,
    Stream,
    Disk,
    Halo21,
    Halo35a,
    Halo35b,
}

impl BrownField {
    pub const ALL: [BrownField; 6] = [
        BrownField::Halo11,
        BrownField::Stream,
        BrownField::Disk,
        BrownField::Halo21,
        BrownField::Halo35a,
        BrownField::Halo35b,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BrownField::Halo11 => "halo11",
            BrownField::Stream => "stream",
            BrownField::Disk => "disk",
            BrownField::Halo21 => "halo21",
            BrownField::Halo35a => "halo35a",
            BrownField::Halo35b => "halo35b",
        }
    }
}

/// Brown photometry product kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrownProduct {
    /// Photometry catalog.
    #[default]
    Cat,
    /// Artificial star tests.
    Art,
    /// Mask image.
    Msk,
}

impl BrownProduct {
    pub fn name(self) -> &'static str {
        match self {
            BrownProduct::Cat => "cat",
            BrownProduct::Art => "art",
            BrownProduct::Msk => "msk",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            BrownProduct::Cat => "_v2_cat.txt",
            BrownProduct::Art => "_v2_art.fits",
            BrownProduct::Msk => "_v2_msk.fits",
        }
    }
}

/// Bands imaged by the Brown survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrownBand {
    F606W,
    F814W,
}

impl BrownBand {
    pub fn name(self) -> &'static str {
        match self {
            BrownBand::F606W => "f606w",
            BrownBand::F814W => "f814w",
        }
    }
}

macro_rules! name_enum_impls {
    ($ty:ident, $what:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let lower = s.trim().to_ascii_lowercase();
                [$($ty::$variant),+]
                    .into_iter()
                    .find(|v| v.name() == lower)
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!(concat!("unknown ", $what, " '{}'"), s))
                    })
            }
        }
    };
}

name_enum_impls!(
    BrownField,
    "Brown field",
    [Halo11, Stream, Disk, Halo21, Halo35a, Halo35b]
);
name_enum_impls!(BrownProduct, "Brown product kind", [Cat, Art, Msk]);
name_enum_impls!(BrownBand, "Brown band", [F606W, F814W]);

/// Path to a Brown GO-10265 photometry product.
pub fn brown_phot_path(
    roots: &DataRoots,
    field: BrownField,
    kind: BrownProduct,
) -> Result<PathBuf> {
    let filename = format!("{BROWN_PREFIX}_{field}_f606w-f814w{}", kind.suffix());
    require_exists(roots.brown_root()?.join(filename))
}

/// Path to a Brown GO-10265 drizzled image.
pub fn brown_image_path(
    roots: &DataRoots,
    field: BrownField,
    band: BrownBand,
) -> Result<PathBuf> {
    let filename = format!("{BROWN_PREFIX}_{field}_{band}_v2_img.fits");
    require_exists(roots.brown_root()?.join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn phat_fixture() -> (TempDir, DataRoots) {
        let dir = TempDir::new().unwrap();
        let roots = DataRoots::default().with_phat(dir.path());
        (dir, roots)
    }

    #[test]
    fn phat_phot_single_match() {
        let (dir, roots) = phat_fixture();
        let expected = dir
            .path()
            .join("brick01/hlsp_phat_hst_wfc3-uvis_12058-m31-b01-f03_f275w-f336w_v1_gst.fits");
        touch(&expected);

        let found = phat_phot_path(&roots, 1, 3, "f275w-f336w", DEFAULT_PHOT_KIND).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn phat_phot_no_match_is_missing_data() {
        let (dir, roots) = phat_fixture();
        touch(
            &dir.path()
                .join("brick01/hlsp_phat_hst_wfc3-uvis_12058-m31-b01-f03_f275w-f336w_v1_gst.fits"),
        );

        let err = phat_phot_path(&roots, 1, 4, "f275w-f336w", "gst").unwrap_err();
        assert!(matches!(err, Error::MissingData(_)), "{err:?}");
        let err = phat_phot_path(&roots, 1, 3, "f275w-f336w", "st").unwrap_err();
        assert!(matches!(err, Error::MissingData(_)), "{err:?}");
    }

    #[test]
    fn phat_phot_multiple_matches_is_missing_data() {
        let (dir, roots) = phat_fixture();
        touch(&dir.path().join("brick02/a_12058-m31-b02-f01_f475w-f814w_v1_gst.fits"));
        touch(&dir.path().join("brick02/b_12059-m31-b02-f01_f475w-f814w_v1_gst.fits"));

        let err = phat_phot_path(&roots, 2, 1, "f475w-f814w", "gst").unwrap_err();
        match err {
            Error::MissingData(msg) => assert!(msg.contains("2 files")),
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn phat_brick_and_field_images() {
        let (dir, roots) = phat_fixture();
        let brick = dir
            .path()
            .join("brick12/hlsp_phat_hst_acs-wfc_12070-m31-b12_f814w_v1_drz.fits");
        let field = dir
            .path()
            .join("brick12/hlsp_phat_hst_wfc3-ir_12070-m31-b12-f07_f160w_v1_drz.fits");
        touch(&brick);
        touch(&field);

        assert_eq!(phat_brick_path(&roots, 12, Band::F814W).unwrap(), brick);
        assert_eq!(phat_field_path(&roots, 12, 7, Band::F160W).unwrap(), field);

        // The brick-level pattern must not pick up field-level images.
        assert!(matches!(
            phat_brick_path(&roots, 12, Band::F160W),
            Err(Error::MissingData(_))
        ));
        // Wrong instrument token for the band.
        assert!(matches!(
            phat_field_path(&roots, 12, 7, Band::F275W),
            Err(Error::MissingData(_))
        ));
    }

    #[test]
    fn phat_brick_out_of_range() {
        let (_dir, roots) = phat_fixture();
        assert!(matches!(
            phat_brick_path(&roots, 0, Band::F475W),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            phat_brick_path(&roots, 24, Band::F475W),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn phat_root_with_glob_metacharacters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data[v1]");
        let expected = root.join("brick05/x-b05-f02_f475w-f814w_v1_gst.fits");
        touch(&expected);
        let roots = DataRoots::default().with_phat(&root);

        assert_eq!(
            phat_phot_path(&roots, 5, 2, "f475w-f814w", "gst").unwrap(),
            expected
        );
    }

    #[test]
    fn unconfigured_root() {
        let roots = DataRoots::default();
        assert!(matches!(
            phat_brick_path(&roots, 1, Band::F475W),
            Err(Error::MissingConfig { .. })
        ));
        assert!(matches!(
            brown_image_path(&roots, BrownField::Disk, BrownBand::F606W),
            Err(Error::MissingConfig { .. })
        ));
    }

    #[test]
    fn brown_products() {
        let dir = TempDir::new().unwrap();
        let roots = DataRoots::default().with_brown(dir.path());
        let cat = dir
            .path()
            .join("hlsp_andromeda_hst_acs-wfc_stream_f606w-f814w_v2_cat.txt");
        let art = dir
            .path()
            .join("hlsp_andromeda_hst_acs-wfc_stream_f606w-f814w_v2_art.fits");
        let img = dir
            .path()
            .join("hlsp_andromeda_hst_acs-wfc_halo35b_f814w_v2_img.fits");
        touch(&cat);
        touch(&art);
        touch(&img);

        assert_eq!(
            brown_phot_path(&roots, BrownField::Stream, BrownProduct::Cat).unwrap(),
            cat
        );
        assert_eq!(
            brown_phot_path(&roots, BrownField::Stream, BrownProduct::Art).unwrap(),
            art
        );
        assert!(matches!(
            brown_phot_path(&roots, BrownField::Stream, BrownProduct::Msk),
            Err(Error::MissingData(_))
        ));
        assert_eq!(
            brown_image_path(&roots, BrownField::Halo35b, BrownBand::F814W).unwrap(),
            img
        );
        assert!(matches!(
            brown_image_path(&roots, BrownField::Halo35b, BrownBand::F606W),
            Err(Error::MissingData(_))
        ));
    }

    #[test]
    fn brown_enumerations_reject_unknown_names() {
        assert_eq!("halo35a".parse::<BrownField>().unwrap(), BrownField::Halo35a);
        assert!("halo99".parse::<BrownField>().is_err());
        assert_eq!("ART".parse::<BrownProduct>().unwrap(), BrownProduct::Art);
        assert!("ast".parse::<BrownProduct>().is_err());
        assert_eq!("f606w".parse::<BrownBand>().unwrap(), BrownBand::F606W);
        assert!("f475w".parse::<BrownBand>().is_err());
        for field in BrownField::ALL {
            assert_eq!(field.to_string().parse::<BrownField>().unwrap(), field);
        }
    }

    #[test]
    fn ast_catalog_path() {
        let dir = TempDir::new().unwrap();
        let roots = DataRoots::default().with_phat(dir.path());
        assert!(matches!(
            phat_v2_ast_path(&roots),
            Err(Error::MissingData(_))
        ));

        let table = dir.path().join("table6.dat");
        touch(&table);
        assert_eq!(phat_v2_ast_path(&roots).unwrap(), table);

        let other = dir.path().join("elsewhere/fake.dat");
        touch(&other);
        let roots = roots.with_phat_ast(&other);
        assert_eq!(phat_v2_ast_path(&roots).unwrap(), other);
    }
}
