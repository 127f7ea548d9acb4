//! Tests for device construction, buffering, and transforms.

use ndarray::{array, Array2};
use prefab::errors::DeviceError;
use prefab::{BufferMode, BufferSpec, Device};

fn thin_buffer(mode: BufferMode) -> BufferSpec {
    BufferSpec::uniform(mode, 1)
}

mod construction_tests {
    use super::*;

    #[test]
    fn construction_pads_every_side_by_the_thickness() {
        let device = Device::new(Array2::ones((3, 3)), BufferSpec::uniform(BufferMode::Constant, 2))
            .unwrap();
        assert_eq!(device.shape(), (7, 7));
        // Constant padding is cladding.
        assert_eq!(device.raster()[(0, 0)], 0.0);
        assert_eq!(device.raster()[(1, 3)], 0.0);
        // The design sits centered in the frame.
        assert_eq!(device.raster()[(2, 2)], 1.0);
        assert_eq!(device.raster()[(4, 4)], 1.0);
    }

    #[test]
    fn edge_mode_replicates_the_boundary_samples() {
        let raster = array![[1.0f32, 2.0], [3.0, 4.0]];
        let buffer = BufferSpec {
            top: BufferMode::Edge,
            bottom: BufferMode::Constant,
            left: BufferMode::Constant,
            right: BufferMode::Constant,
            thickness: 1,
        };
        let device = Device::new(raster, buffer).unwrap();
        assert_eq!(device.shape(), (4, 4));
        // Top buffer rows repeat the first design row.
        assert_eq!(device.raster()[(0, 1)], 1.0);
        assert_eq!(device.raster()[(0, 2)], 2.0);
        // Constant sides stay cladding, including the corners.
        assert_eq!(device.raster()[(0, 0)], 0.0);
        assert_eq!(device.raster()[(3, 1)], 0.0);
    }

    #[test]
    fn edge_corners_follow_the_adjoining_sides() {
        let raster = array![[5.0f32]];
        let device = Device::new(raster, thin_buffer(BufferMode::Edge)).unwrap();
        // Every sample, corners included, replicates the single design sample.
        assert!(device.raster().iter().all(|&x| x == 5.0));
    }

    #[test]
    fn construction_rejects_degenerate_input() {
        assert!(matches!(
            Device::new(Array2::zeros((0, 0)), BufferSpec::default()),
            Err(DeviceError::EmptyRaster)
        ));
        assert!(matches!(
            Device::new(Array2::ones((2, 2)), BufferSpec::uniform(BufferMode::Constant, 0)),
            Err(DeviceError::InvalidBufferThickness)
        ));

        let mut raster = Array2::<f32>::ones((2, 2));
        raster[(1, 0)] = f32::NAN;
        assert!(matches!(
            Device::new(raster, BufferSpec::default()),
            Err(DeviceError::NonFiniteSample { row: 1, col: 0 })
        ));
    }
}

mod raster_access_tests {
    use super::*;

    #[test]
    fn to_raster_crops_edge_buffers_and_keeps_constant_ones() {
        let raster = array![[1.0f32, 2.0], [3.0, 4.0]];
        let buffer = BufferSpec {
            top: BufferMode::Edge,
            bottom: BufferMode::Constant,
            left: BufferMode::Edge,
            right: BufferMode::Constant,
            thickness: 1,
        };
        let device = Device::new(raster, buffer).unwrap();
        let exported = device.to_raster();
        // Top row and left column were context-only and are cropped.
        assert_eq!(exported.dim(), (3, 3));
        assert_eq!(exported[(0, 0)], 1.0);
        // The constant bottom/right buffers stay in the footprint.
        assert_eq!(exported[(2, 2)], 0.0);
    }

    #[test]
    fn is_binary_sees_through_the_padding() {
        let binary = Device::new(array![[0.0f32, 1.0]], thin_buffer(BufferMode::Constant)).unwrap();
        assert!(binary.is_binary());

        let grayscale =
            Device::new(array![[0.5f32, 1.0]], thin_buffer(BufferMode::Constant)).unwrap();
        assert!(!grayscale.is_binary());
    }
}

mod transform_tests {
    use super::*;

    #[test]
    fn transforms_return_new_devices_with_the_same_buffer_spec() {
        let device =
            Device::new(array![[0.2f32, 0.8]], thin_buffer(BufferMode::Constant)).unwrap();
        let binarized = device.binarize_hard(0.5);
        assert_eq!(binarized.buffer_spec(), device.buffer_spec());
        // The original is untouched.
        assert_eq!(device.raster()[(1, 1)], 0.2);
        assert_eq!(binarized.raster()[(1, 1)], 0.0);
        assert_eq!(binarized.raster()[(1, 2)], 1.0);
    }

    #[test]
    fn trim_keeps_the_buffer_thickness_as_margin() {
        let mut raster = Array2::<f32>::zeros((5, 5));
        raster[(2, 2)] = 1.0;
        let device = Device::new(raster, BufferSpec::uniform(BufferMode::Constant, 2)).unwrap();
        // Construction pads to 9x9 with the core sample at (4, 4).
        let trimmed = device.trim().unwrap();
        assert_eq!(trimmed.shape(), (5, 5));
        assert_eq!(trimmed.raster()[(2, 2)], 1.0);
    }

    #[test]
    fn normalize_reports_flat_devices() {
        let device =
            Device::new(Array2::zeros((2, 2)), thin_buffer(BufferMode::Constant)).unwrap();
        assert!(matches!(device.normalize(), Err(DeviceError::Geometry(_))));
    }

    #[test]
    fn ternarize_marks_the_uncertain_band() {
        let device = Device::new(array![[0.5f32]], thin_buffer(BufferMode::Constant)).unwrap();
        let ternary = device.ternarize(1.0 / 3.0, 2.0 / 3.0);
        assert_eq!(ternary.raster()[(1, 1)], 0.5);
        assert_eq!(ternary.raster()[(0, 0)], 0.0);
    }
}
