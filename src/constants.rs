
/// Number of spatial samples in a CIFTI-like volume (cortical surface + subcortical voxels).
pub const CIFTI_SIZE: usize = 98301;

/// Spatial shape produced by the forward reshape. Every axis is larger than one.
pub const FWD_DIM_TARGET: [usize; 3] = [7, 4681, 3];

/// Spatial shape produced by the backward reshape, i.e. the original flat layout.
/// The leading axis is capped at 32767 so it still fits in a NIfTI-1 `dim` entry.
pub const BWD_DIM_TARGET: [usize; 3] = [32767, 3, 1];

#[test]
fn test_targets_cover_cifti_size() {
    assert_eq!(FWD_DIM_TARGET.iter().product::<usize>(), CIFTI_SIZE);
    assert_eq!(BWD_DIM_TARGET.iter().product::<usize>(), CIFTI_SIZE);
}
