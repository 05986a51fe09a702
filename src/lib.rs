pub mod config;
pub mod constants;
pub mod reshape;
pub mod utils;
pub mod volume;

// Samples are always handled as f64, which is what the NIfTI reader hands back
// after applying the scaling slope and intercept.
pub type FloatType = f64;

pub type Affine = nalgebra::Matrix4<FloatType>;
pub type VolumeData = ndarray::ArrayD<FloatType>;
