//! Minimal FITS image reader.
//!
//! Reads the first image HDU that carries data into an `f64` array whose
//! axes follow C order, i.e. the shape is `[NAXISn, ..., NAXIS2, NAXIS1]`
//! with `NAXIS1` varying fastest. This matches how astropy exposes cubes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use fitsrs::Fits;
use fitsrs::card::Value;
use fitsrs::hdu::HDU;
use fitsrs::hdu::data::image::Pixels;
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::error::{Error, Result};

fn fits_error(path: &Path, message: impl Into<String>) -> Error {
    Error::Fits {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Read the first non-empty image HDU of a FITS file, applying BSCALE/BZERO.
pub fn read_image(path: &Path) -> Result<ArrayD<f64>> {
    let f = File::open(path)?;
    let reader = BufReader::new(f);
    let mut hdu_list = Fits::from_reader(reader);

    // The primary HDU may be empty (NAXIS=0) with the data in an extension.
    let hdu = loop {
        match hdu_list.next() {
            Some(Ok(HDU::Primary(hdu))) | Some(Ok(HDU::XImage(hdu))) => {
                let naxis = hdu.get_header().get_xtension().get_naxis();
                if !naxis.is_empty() && naxis.iter().all(|&n| n > 0) {
                    break hdu;
                }
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(fits_error(path, format!("failed to read HDU: {e}"))),
            None => return Err(fits_error(path, "no image HDU with data")),
        }
    };

    let header = hdu.get_header();
    let xtension = header.get_xtension();
    let shape: Vec<usize> = xtension
        .get_naxis()
        .iter()
        .rev()
        .map(|&n| n as usize)
        .collect();

    let bzero: f64 = match header.get("BZERO") {
        Some(Value::Float { value, .. }) => *value,
        Some(Value::Integer { value, .. }) => *value as f64,
        _ => 0.0,
    };
    let bscale: f64 = match header.get("BSCALE") {
        Some(Value::Float { value, .. }) => *value,
        Some(Value::Integer { value, .. }) => *value as f64,
        _ => 1.0,
    };
    debug!(
        "FITS {}: shape={:?} BITPIX={:?} BZERO={} BSCALE={}",
        path.display(),
        shape,
        xtension.get_bitpix(),
        bzero,
        bscale
    );

    let image_data = hdu_list.get_data(&hdu);
    let raw: Vec<f64> = match image_data.pixels() {
        Pixels::U8(it) => it.map(|v| v as f64 * bscale + bzero).collect(),
        Pixels::I16(it) => it.map(|v| v as f64 * bscale + bzero).collect(),
        Pixels::I32(it) => it.map(|v| v as f64 * bscale + bzero).collect(),
        Pixels::I64(it) => it.map(|v| v as f64 * bscale + bzero).collect(),
        Pixels::F32(it) => it.map(|v| v as f64 * bscale + bzero).collect(),
        Pixels::F64(it) => it.map(|v| v * bscale + bzero).collect(),
    };

    let expected: usize = shape.iter().product();
    if raw.len() != expected {
        return Err(fits_error(
            path,
            format!(
                "pixel count mismatch: expected {expected} for shape {shape:?}, got {}",
                raw.len()
            ),
        ));
    }

    ArrayD::from_shape_vec(IxDyn(&shape), raw)
        .map_err(|e| fits_error(path, format!("failed to reshape image data: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use fitsio::FitsFile;
    use fitsio::images::{ImageDescription, ImageType};

    /// Write `data` as a `BITPIX = -64` primary image.
    ///
    /// `shape` is in C order (`[.., NAXIS2, NAXIS1]`), as fitsio expects.
    pub fn write_f64_image(path: &Path, shape: &[usize], data: &[f64]) {
        assert_eq!(shape.iter().product::<usize>(), data.len());

        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: shape,
        };
        let mut fptr = FitsFile::create(path)
            .with_custom_primary(&description)
            .open()
            .unwrap();
        let hdu = fptr.primary_hdu().unwrap();
        hdu.write_image(&mut fptr, data).unwrap();
    }
}
