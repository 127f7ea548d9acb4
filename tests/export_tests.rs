//! Tests for PGM and GDSII export.

use ndarray::Array2;
use prefab::errors::ExportError;
use prefab::export::gds::{trace_contours, write_gds};
use prefab::export::pgm::{parse_pgm, read_pgm, write_pgm};

mod pgm_tests {
    use super::*;

    #[test]
    fn parses_ascii_pgm_with_comments() {
        let bytes = b"P2\n# a mask\n3 2\n255\n0 128 255\n255 128 0\n";
        let raster = parse_pgm(bytes).unwrap();
        assert_eq!(raster.dim(), (2, 3));
        assert_eq!(raster[(0, 0)], 0.0);
        assert_eq!(raster[(0, 2)], 1.0);
        assert!((raster[(1, 1)] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn binary_write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.pgm");

        let mut raster = Array2::<f32>::zeros((4, 5));
        raster[(1, 2)] = 1.0;
        raster[(3, 4)] = 0.5;
        write_pgm(&raster, &path).unwrap();

        let reloaded = read_pgm(&path).unwrap();
        assert_eq!(reloaded.dim(), (4, 5));
        assert_eq!(reloaded[(1, 2)], 1.0);
        assert_eq!(reloaded[(0, 0)], 0.0);
        // 0.5 quantizes to 128/255.
        assert!((reloaded[(3, 4)] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_foreign_magic_numbers() {
        assert!(matches!(
            parse_pgm(b"P6\n2 2\n255\n"),
            Err(ExportError::UnsupportedMagic { .. })
        ));
    }

    #[test]
    fn rejects_deep_samples() {
        assert!(matches!(
            parse_pgm(b"P2\n1 1\n65535\n1\n"),
            Err(ExportError::UnsupportedDepth { maxval: 65535 })
        ));
    }

    #[test]
    fn rejects_a_short_payload() {
        assert!(matches!(
            parse_pgm(b"P2\n2 2\n255\n1 2 3\n"),
            Err(ExportError::MalformedImage { .. })
        ));
    }
}

mod contour_tests {
    use super::*;

    #[test]
    fn a_single_sample_traces_one_unit_square() {
        let mut mask = Array2::<f32>::zeros((3, 3));
        mask[(1, 1)] = 1.0;
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        let points = &contours[0].points;
        assert_eq!(points.len(), 4);
        assert!(points.contains(&(1, 1)));
        assert!(points.contains(&(2, 2)));
        assert!(!contours[0].is_hole());
    }

    #[test]
    fn collinear_runs_are_compressed_to_corners() {
        let mask = Array2::<f32>::ones((3, 5));
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        // A rectangle is four corners regardless of its size.
        assert_eq!(contours[0].points.len(), 4);
        assert_eq!(contours[0].signed_area2().abs(), 2 * 5 * 3);
    }

    #[test]
    fn a_hole_gets_its_own_opposed_contour() {
        let mut mask = Array2::<f32>::ones((4, 4));
        mask[(1, 1)] = 0.0;
        mask[(1, 2)] = 0.0;
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 2);
        let holes: Vec<_> = contours.iter().filter(|c| c.is_hole()).collect();
        assert_eq!(holes.len(), 1);
        // The hole outline is a 2x1 rectangle.
        assert_eq!(holes[0].signed_area2().abs(), 2 * 2);
    }

    #[test]
    fn an_empty_mask_has_no_contours() {
        let mask = Array2::<f32>::zeros((3, 3));
        assert!(trace_contours(&mask).is_empty());
    }

    #[test]
    fn separate_islands_trace_separately() {
        let mut mask = Array2::<f32>::zeros((5, 5));
        mask[(0, 0)] = 1.0;
        mask[(4, 4)] = 1.0;
        assert_eq!(trace_contours(&mask).len(), 2);
    }
}

mod gds_tests {
    use super::*;

    fn boundary_count(bytes: &[u8]) -> usize {
        // BOUNDARY is the empty record 00 04 08 00.
        bytes
            .windows(4)
            .filter(|window| *window == [0x00, 0x04, 0x08, 0x00])
            .count()
    }

    #[test]
    fn writes_a_library_with_one_boundary_per_contour() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.gds");

        let mut mask = Array2::<f32>::ones((4, 4));
        mask[(1, 1)] = 0.0;
        write_gds(&mask, &path, "device_cell", (1, 0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // HEADER record: length 6, type 0x00, data type 0x02, version 600.
        assert_eq!(&bytes[..6], &[0x00, 0x06, 0x00, 0x02, 0x02, 0x58]);
        // Outer outline plus one hole.
        assert_eq!(boundary_count(&bytes), 2);
        // Library and cell names are embedded.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("prefab"));
        assert!(text.contains("device_cell"));
        // The stream terminates with ENDLIB.
        assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0x04, 0x04, 0x00]);
    }

    #[test]
    fn rejects_an_empty_cell_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.gds");
        let mask = Array2::<f32>::ones((2, 2));
        assert!(matches!(
            write_gds(&mask, &path, "", (1, 0)),
            Err(ExportError::InvalidCellName)
        ));
    }
}
