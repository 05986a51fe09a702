use crate::utils::{series_len, spatial_len};
use crate::{Affine, FloatType, VolumeData};

/// An image held in memory: dense samples shaped `(spatial..., series)` together
/// with the affine that maps voxel indices to physical coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub data: VolumeData,
    pub affine: Affine,
}

impl Volume {
    pub fn new(data: VolumeData, affine: Affine) -> Self {
        Volume { data, affine }
    }

    /// Wraps `data` with an identity affine.
    pub fn with_identity_affine(data: VolumeData) -> Self {
        Volume {
            data,
            affine: Affine::identity(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Product of every axis except the trailing series axis.
    pub fn spatial_len(&self) -> usize {
        spatial_len(self.shape())
    }

    pub fn series_len(&self) -> Option<usize> {
        series_len(self.shape())
    }

    /// Samples in logical row-major order, regardless of memory layout.
    pub fn flattened(&self) -> Vec<FloatType> {
        self.data.iter().copied().collect()
    }
}

#[test]
fn test_volume_lengths() {
    let volume = Volume::with_identity_affine(VolumeData::zeros(ndarray::IxDyn(&[10, 10, 4])));
    assert_eq!(volume.spatial_len(), 100);
    assert_eq!(volume.series_len(), Some(4));
    assert_eq!(volume.affine, Affine::identity());
}

#[test]
fn test_flattened_follows_logical_order() {
    use ndarray::ShapeBuilder;

    // Same logical array stored column-major
    let c_order = VolumeData::from_shape_vec(ndarray::IxDyn(&[2, 3]), (0..6).map(f64::from).collect()).unwrap();
    let mut f_order = VolumeData::zeros(ndarray::IxDyn(&[2, 3]).f());
    f_order.assign(&c_order);

    let volume = Volume::with_identity_affine(f_order);
    assert_eq!(volume.flattened(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}
