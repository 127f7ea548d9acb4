//! PGM (portable graymap) raster import and export.
//!
//! PGM is the simplest interchange format every image tool can read.
//! Writing always produces binary `P5` at 8-bit depth; reading accepts
//! `P5` and ASCII `P2`, rescaling samples to `[0, 1]`.

use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::errors::{ExportError, ExportResult};

/// Write the raster as a binary 8-bit PGM, clamping samples to `[0, 1]`.
pub fn write_pgm(raster: &Array2<f32>, path: &Path) -> ExportResult<()> {
    if raster.is_empty() {
        return Err(ExportError::EmptyRaster);
    }
    let (rows, cols) = raster.dim();
    let mut bytes = format!("P5\n{} {}\n255\n", cols, rows).into_bytes();
    bytes.reserve(raster.len());
    for &sample in raster.iter() {
        bytes.push((sample.clamp(0.0, 1.0) * 255.0).round() as u8);
    }
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `P5` or `P2` PGM into a raster with samples in `[0, 1]`.
pub fn read_pgm(path: &Path) -> ExportResult<Array2<f32>> {
    let bytes = fs::read(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pgm(&bytes)
}

/// Parse PGM bytes; split out from [`read_pgm`] so fixtures can stay in
/// memory.
pub fn parse_pgm(bytes: &[u8]) -> ExportResult<Array2<f32>> {
    let mut cursor = Cursor { bytes, position: 0 };

    let magic = cursor.token().ok_or_else(|| ExportError::MalformedImage {
        reason: "missing magic".to_string(),
    })?;
    if magic != "P5" && magic != "P2" {
        return Err(ExportError::UnsupportedMagic { magic });
    }

    let cols = cursor.dimension("width")?;
    let rows = cursor.dimension("height")?;
    let maxval = cursor.dimension("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(ExportError::UnsupportedDepth { maxval });
    }
    if rows == 0 || cols == 0 {
        return Err(ExportError::MalformedImage {
            reason: format!("zero dimension {}x{}", cols, rows),
        });
    }

    let expected = rows as usize * cols as usize;
    let samples: Vec<f32> = if magic == "P5" {
        // A single whitespace byte separates the header from the payload.
        cursor.position += 1;
        let payload = &bytes[cursor.position.min(bytes.len())..];
        if payload.len() < expected {
            return Err(ExportError::MalformedImage {
                reason: format!(
                    "payload has {} bytes, expected {}",
                    payload.len(),
                    expected
                ),
            });
        }
        payload[..expected]
            .iter()
            .map(|&byte| byte as f32 / maxval as f32)
            .collect()
    } else {
        let mut samples = Vec::with_capacity(expected);
        while samples.len() < expected {
            let token = cursor.token().ok_or_else(|| ExportError::MalformedImage {
                reason: format!("payload has {} samples, expected {}", samples.len(), expected),
            })?;
            let value: u32 = token.parse().map_err(|_| ExportError::MalformedImage {
                reason: format!("non-numeric sample {:?}", token),
            })?;
            samples.push(value.min(maxval) as f32 / maxval as f32);
        }
        samples
    };

    Ok(Array2::from_shape_vec((rows as usize, cols as usize), samples)
        .expect("sample count checked against dimensions"))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl Cursor<'_> {
    /// Next whitespace-delimited token, skipping `#` comment lines.
    fn token(&mut self) -> Option<String> {
        loop {
            while self.position < self.bytes.len()
                && self.bytes[self.position].is_ascii_whitespace()
            {
                self.position += 1;
            }
            if self.position < self.bytes.len() && self.bytes[self.position] == b'#' {
                while self.position < self.bytes.len() && self.bytes[self.position] != b'\n' {
                    self.position += 1;
                }
                continue;
            }
            break;
        }
        if self.position >= self.bytes.len() {
            return None;
        }
        let start = self.position;
        while self.position < self.bytes.len()
            && !self.bytes[self.position].is_ascii_whitespace()
        {
            self.position += 1;
        }
        Some(String::from_utf8_lossy(&self.bytes[start..self.position]).into_owned())
    }

    fn dimension(&mut self, field: &str) -> ExportResult<u32> {
        let token = self.token().ok_or_else(|| ExportError::MalformedImage {
            reason: format!("missing {}", field),
        })?;
        token.parse().map_err(|_| ExportError::MalformedImage {
            reason: format!("non-numeric {} {:?}", field, token),
        })
    }
}
