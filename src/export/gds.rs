//! GDSII export of binarized device rasters.
//!
//! The raster is treated as a union of unit squares (one per core sample,
//! 1 sample = 1 nm). Boundary edges between core and cladding are stitched
//! into closed loops, collinear runs are merged, and each loop is written
//! as a `BOUNDARY` element of a single-cell GDSII library. Outer outlines
//! and hole outlines wind in opposite directions and are emitted as
//! separate boundaries on the same layer.

use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::errors::{ExportError, ExportResult};

/// GDSII caps an XY record at 8191 points; stay on the classic safe side.
const MAX_BOUNDARY_POINTS: usize = 8190;

/// Database unit in meters (1 nm) and user units per database unit (µm).
const DB_UNIT_METERS: f64 = 1e-9;
const USER_UNITS_PER_DB_UNIT: f64 = 1e-3;

/// A closed contour in raster corner coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// Loop vertices, not repeating the first point.
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    /// Twice the signed area; negative loops are hole outlines.
    pub fn signed_area2(&self) -> i64 {
        let mut doubled = 0i64;
        for (index, &(x0, y0)) in self.points.iter().enumerate() {
            let (x1, y1) = self.points[(index + 1) % self.points.len()];
            doubled += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
        }
        doubled
    }

    pub fn is_hole(&self) -> bool {
        self.signed_area2() < 0
    }
}

/// Write the mask (samples >= 0.5 are core) as a single-cell GDSII library.
pub fn write_gds(
    mask: &Array2<f32>,
    path: &Path,
    cell_name: &str,
    layer: (i16, i16),
) -> ExportResult<()> {
    if mask.is_empty() {
        return Err(ExportError::EmptyRaster);
    }
    if cell_name.is_empty() || !cell_name.is_ascii() {
        return Err(ExportError::InvalidCellName);
    }

    let contours = trace_contours(mask);
    let rows = mask.dim().0 as i32;

    let mut writer = RecordWriter::new();
    writer.record_i16(RecordType::Header, &[600]);
    writer.record_i16(RecordType::BgnLib, &[0; 12]);
    writer.record_ascii(RecordType::LibName, "prefab");
    writer.record_real8(RecordType::Units, &[USER_UNITS_PER_DB_UNIT, DB_UNIT_METERS]);
    writer.record_i16(RecordType::BgnStr, &[0; 12]);
    writer.record_ascii(RecordType::StrName, cell_name);

    for contour in &contours {
        if contour.points.len() + 1 > MAX_BOUNDARY_POINTS {
            return Err(ExportError::ContourTooComplex {
                points: contour.points.len() + 1,
                max: MAX_BOUNDARY_POINTS,
            });
        }
        writer.record_empty(RecordType::Boundary);
        writer.record_i16(RecordType::Layer, &[layer.0]);
        writer.record_i16(RecordType::DataType, &[layer.1]);

        // Raster rows grow downward; flip so the layout reads the same way
        // up as the design. XY closes the loop by repeating point 0.
        let mut coordinates = Vec::with_capacity((contour.points.len() + 1) * 2);
        for &(x, y) in contour.points.iter().chain(contour.points.first()) {
            coordinates.push(x);
            coordinates.push(rows - y);
        }
        writer.record_i32(RecordType::Xy, &coordinates);
        writer.record_empty(RecordType::EndEl);
    }

    writer.record_empty(RecordType::EndStr);
    writer.record_empty(RecordType::EndLib);

    fs::write(path, writer.into_bytes()).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Contour tracing ──────────────────────────────────────────

/// Stitch the core/cladding boundary edges of the mask into closed loops.
///
/// Each core sample contributes the edges it does not share with another
/// core sample, oriented so the core is on the left of the walk. At a
/// corner where two loops touch diagonally the walk turns sharply left,
/// which keeps diagonally touching regions in separate loops.
pub fn trace_contours(mask: &Array2<f32>) -> Vec<Contour> {
    use std::collections::HashMap;

    let (rows, cols) = mask.dim();
    let filled = |r: isize, c: isize| -> bool {
        r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols
            && mask[(r as usize, c as usize)] >= 0.5
    };

    // Directed boundary edges, keyed by start vertex. Vertices live on the
    // (cols+1) x (rows+1) corner lattice.
    let mut outgoing: HashMap<(i32, i32), Vec<(i32, i32)>> = HashMap::new();
    let mut edge_count = 0usize;
    for r in 0..rows as isize {
        for c in 0..cols as isize {
            if !filled(r, c) {
                continue;
            }
            let (x, y) = (c as i32, r as i32);
            let mut push = |from: (i32, i32), to: (i32, i32)| {
                outgoing.entry(from).or_default().push(to);
                edge_count += 1;
            };
            if !filled(r - 1, c) {
                push((x, y), (x + 1, y));
            }
            if !filled(r, c + 1) {
                push((x + 1, y), (x + 1, y + 1));
            }
            if !filled(r + 1, c) {
                push((x + 1, y + 1), (x, y + 1));
            }
            if !filled(r, c - 1) {
                push((x, y + 1), (x, y));
            }
        }
    }

    let mut contours = Vec::new();
    let mut walked = 0usize;
    while walked < edge_count {
        // Deterministic start: the smallest keyed vertex with edges left.
        let start = *outgoing
            .iter()
            .filter(|(_, targets)| !targets.is_empty())
            .map(|(vertex, _)| vertex)
            .min()
            .expect("unwalked edges remain");

        let mut loop_points = vec![start];
        let mut previous = start;
        let mut current = outgoing
            .get_mut(&start)
            .expect("start vertex has edges")
            .pop()
            .expect("start vertex has edges");
        walked += 1;

        while current != start {
            let targets = outgoing
                .get_mut(&current)
                .expect("boundary edges form closed loops");
            let next = match targets.len() {
                1 => targets.pop().expect("len checked"),
                _ => {
                    // Checkerboard corner: two outgoing edges. Take the
                    // sharpest left turn relative to the incoming direction.
                    let incoming = (current.0 - previous.0, current.1 - previous.1);
                    let left = (incoming.1, -incoming.0);
                    let pick = targets
                        .iter()
                        .position(|&to| {
                            (to.0 - current.0, to.1 - current.1) == left
                        })
                        .unwrap_or(0);
                    targets.swap_remove(pick)
                }
            };
            walked += 1;
            loop_points.push(current);
            previous = current;
            current = next;
        }

        contours.push(Contour {
            points: compress_collinear(loop_points),
        });
    }

    contours
}

/// Drop intermediate vertices of straight runs, including across the
/// closing edge.
fn compress_collinear(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let count = points.len();
    if count < 3 {
        return points;
    }
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let prev = points[(index + count - 1) % count];
        let here = points[index];
        let next = points[(index + 1) % count];
        let to_here = (here.0 - prev.0, here.1 - prev.1);
        let to_next = (next.0 - here.0, next.1 - here.1);
        // Colinear iff the turn has zero cross product.
        if to_here.0 as i64 * to_next.1 as i64 != to_here.1 as i64 * to_next.0 as i64 {
            out.push(here);
        }
    }
    out
}

// ─── GDSII records ────────────────────────────────────────────

#[derive(Clone, Copy)]
enum RecordType {
    Header,
    BgnLib,
    LibName,
    Units,
    BgnStr,
    StrName,
    Boundary,
    Layer,
    DataType,
    Xy,
    EndEl,
    EndStr,
    EndLib,
}

impl RecordType {
    /// (record type, data type) bytes per the GDSII stream format.
    fn codes(self) -> (u8, u8) {
        match self {
            RecordType::Header => (0x00, 0x02),
            RecordType::BgnLib => (0x01, 0x02),
            RecordType::LibName => (0x02, 0x06),
            RecordType::Units => (0x03, 0x05),
            RecordType::BgnStr => (0x05, 0x02),
            RecordType::StrName => (0x06, 0x06),
            RecordType::Boundary => (0x08, 0x00),
            RecordType::Layer => (0x0d, 0x02),
            RecordType::DataType => (0x0e, 0x02),
            RecordType::Xy => (0x10, 0x03),
            RecordType::EndEl => (0x11, 0x00),
            RecordType::EndStr => (0x07, 0x00),
            RecordType::EndLib => (0x04, 0x00),
        }
    }
}

struct RecordWriter {
    bytes: Vec<u8>,
}

impl RecordWriter {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn record(&mut self, record_type: RecordType, payload: &[u8]) {
        let (rtype, dtype) = record_type.codes();
        let length = (payload.len() + 4) as u16;
        self.bytes.extend_from_slice(&length.to_be_bytes());
        self.bytes.push(rtype);
        self.bytes.push(dtype);
        self.bytes.extend_from_slice(payload);
    }

    fn record_empty(&mut self, record_type: RecordType) {
        self.record(record_type, &[]);
    }

    fn record_i16(&mut self, record_type: RecordType, values: &[i16]) {
        let mut payload = Vec::with_capacity(values.len() * 2);
        for value in values {
            payload.extend_from_slice(&value.to_be_bytes());
        }
        self.record(record_type, &payload);
    }

    fn record_i32(&mut self, record_type: RecordType, values: &[i32]) {
        let mut payload = Vec::with_capacity(values.len() * 4);
        for value in values {
            payload.extend_from_slice(&value.to_be_bytes());
        }
        self.record(record_type, &payload);
    }

    fn record_real8(&mut self, record_type: RecordType, values: &[f64]) {
        let mut payload = Vec::with_capacity(values.len() * 8);
        for &value in values {
            payload.extend_from_slice(&real8(value));
        }
        self.record(record_type, &payload);
    }

    /// ASCII records are padded with a NUL to an even length.
    fn record_ascii(&mut self, record_type: RecordType, text: &str) {
        let mut payload = text.as_bytes().to_vec();
        if payload.len() % 2 != 0 {
            payload.push(0);
        }
        self.record(record_type, &payload);
    }
}

/// Encode an f64 as a GDSII REAL8: sign bit, excess-64 base-16 exponent,
/// 56-bit mantissa with `value = mantissa * 16^(exponent - 64)`.
pub(crate) fn real8(value: f64) -> [u8; 8] {
    if value == 0.0 {
        return [0; 8];
    }
    let sign = if value < 0.0 { 0x80u8 } else { 0 };
    let mut magnitude = value.abs();

    let mut exponent = 64i32;
    while magnitude >= 1.0 {
        magnitude /= 16.0;
        exponent += 1;
    }
    while magnitude < 1.0 / 16.0 {
        magnitude *= 16.0;
        exponent -= 1;
    }

    // magnitude is now in [1/16, 1); 56 mantissa bits follow.
    let mantissa = (magnitude * (1u64 << 56) as f64) as u64;
    let mut out = [0u8; 8];
    out[0] = sign | (exponent as u8);
    out[1..].copy_from_slice(&mantissa.to_be_bytes()[1..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode a REAL8 back to f64 for roundtrip checks.
    fn decode_real8(bytes: [u8; 8]) -> f64 {
        let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
        let exponent = (bytes[0] & 0x7f) as i32 - 64;
        let mut mantissa_bytes = [0u8; 8];
        mantissa_bytes[1..].copy_from_slice(&bytes[1..]);
        let mantissa = u64::from_be_bytes(mantissa_bytes) as f64 / (1u64 << 56) as f64;
        sign * mantissa * 16f64.powi(exponent)
    }

    #[test]
    fn real8_zero_is_all_zero_bytes() {
        assert_eq!(real8(0.0), [0; 8]);
    }

    #[test]
    fn real8_roundtrips_the_unit_scales() {
        for value in [1e-9, 1e-3, 1.0, 0.5, 2048.0, 123.456] {
            let decoded = decode_real8(real8(value));
            assert!(
                ((decoded - value) / value).abs() < 1e-12,
                "{} decoded as {}",
                value,
                decoded
            );
        }
    }

    #[test]
    fn real8_keeps_the_sign_bit() {
        let encoded = real8(-1.0);
        assert_eq!(encoded[0] & 0x80, 0x80);
        assert!((decode_real8(encoded) + 1.0).abs() < 1e-12);
    }
}
