use crate::config::{Config, Mode};
use crate::constants::*;
use crate::utils::io::VolumeStore;
use crate::volume::Volume;

use anyhow::{Context, Result};
use ndarray::IxDyn;

impl Mode {
    /// Spatial shape this mode reshapes into.
    pub fn target(&self) -> [usize; 3] {
        match self {
            Mode::Forward => FWD_DIM_TARGET,
            Mode::Backward => BWD_DIM_TARGET,
        }
    }
}

/// What a single invocation ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The volume was reshaped to `shape` and written out.
    Reshaped { shape: Vec<usize> },
    /// The volume was not CIFTI-like, so nothing was written.
    Skipped { spatial_len: usize },
}

/// Reinterprets the spatial samples of a CIFTI-like `volume` into the target shape
/// of `mode`, keeping the trailing series axis. Samples keep their row-major
/// (logical) order. The returned volume always carries an identity affine.
///
/// Volumes whose spatial length is not `CIFTI_SIZE` are left alone and `None` is
/// returned; this is not treated as an error.
pub fn reshape(volume: Volume, mode: Mode) -> Result<Option<Volume>> {
    let spatial_len = volume.spatial_len();
    let Some(series_len) = volume.series_len().filter(|_| spatial_len == CIFTI_SIZE) else {
        log::debug!(
            "shape {:?} has {} spatial samples (expected {}), skipping {} reshape",
            volume.shape(),
            spatial_len,
            CIFTI_SIZE,
            mode
        );
        return Ok(None);
    };

    match mode {
        Mode::Forward => log::info!(
            "CIFTI-like NIFTI detected! i.e. total length is {}. Reshaping to fill in all dimensions!",
            CIFTI_SIZE
        ),
        Mode::Backward => log::info!(
            "CIFTI-like NIFTI detected! i.e. total length is {}. Reshaping to original size!",
            CIFTI_SIZE
        ),
    }

    let [x, y, z] = mode.target();
    let shape = [x, y, z, series_len];

    // `into_shape` follows the memory order, so make sure that is row-major first
    let data = if volume.data.is_standard_layout() {
        volume.data
    } else {
        volume.data.as_standard_layout().into_owned()
    };
    let data = data.into_shape(IxDyn(&shape))?;

    Ok(Some(Volume::with_identity_affine(data)))
}

/// Loads `config.input`, reshapes it according to `config.mode` and writes the
/// result to `config.output`. Nothing is written when the input is not CIFTI-like.
pub fn run(config: &Config, store: &impl VolumeStore) -> Result<Outcome> {
    let volume = store
        .load(&config.input)
        .with_context(|| format!("failed to load volume from {}", config.input.display()))?;
    log::debug!("loaded {} with shape {:?}", config.input.display(), volume.shape());

    let spatial_len = volume.spatial_len();
    match reshape(volume, config.mode)? {
        Some(reshaped) => {
            let shape = reshaped.shape().to_vec();
            store
                .save(&config.output, &reshaped)
                .with_context(|| format!("failed to write volume to {}", config.output.display()))?;
            log::debug!("wrote {} with shape {:?}", config.output.display(), shape);
            Ok(Outcome::Reshaped { shape })
        }
        None => Ok(Outcome::Skipped { spatial_len }),
    }
}

#[cfg(test)]
use crate::{Affine, VolumeData};
#[cfg(test)]
use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Keeps volumes in memory, keyed by path.
#[cfg(test)]
#[derive(Default)]
struct MemoryStore {
    volumes: RefCell<HashMap<PathBuf, Volume>>,
}

#[cfg(test)]
impl VolumeStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<Volume> {
        self.volumes
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no volume stored at {}", path.display()))
    }

    fn save(&self, path: &Path, volume: &Volume) -> Result<()> {
        self.volumes
            .borrow_mut()
            .insert(path.to_path_buf(), volume.clone());
        Ok(())
    }
}

/// Array of the given shape holding 0, 1, 2, ... in row-major order.
#[cfg(test)]
fn ramp(shape: &[usize]) -> VolumeData {
    let len: usize = shape.iter().product();
    VolumeData::from_shape_vec(IxDyn(shape), (0..len).map(|i| i as f64).collect()).unwrap()
}

#[cfg(test)]
fn config(mode: Mode) -> Config {
    Config {
        input: PathBuf::from("in.nii.gz"),
        output: PathBuf::from("out.nii.gz"),
        mode,
    }
}

#[test]
fn test_forward_from_flat_layout() {
    let volume = Volume::with_identity_affine(ramp(&[98301, 1, 5]));
    let expected = volume.flattened();

    let reshaped = reshape(volume, Mode::Forward).unwrap().expect("volume is CIFTI-like");
    assert_eq!(reshaped.shape(), &[7, 4681, 3, 5]);
    assert_eq!(reshaped.data.len(), 491505);
    assert_eq!(reshaped.flattened(), expected);
}

#[test]
fn test_backward_preserves_flat_order() {
    let volume = Volume::with_identity_affine(ramp(&[7, 4681, 3, 5]));
    let expected = volume.flattened();

    let reshaped = reshape(volume, Mode::Backward).unwrap().expect("volume is CIFTI-like");
    assert_eq!(reshaped.shape(), &[32767, 3, 1, 5]);
    assert_eq!(reshaped.data.len(), 491505);
    for (i, (a, b)) in reshaped.data.iter().zip(expected.iter()).enumerate() {
        assert_eq!(a, b, "sample {i} moved");
    }
}

#[test]
fn test_backward_then_forward_round_trip() {
    for series in [1, 3] {
        let original = Volume::with_identity_affine(ramp(&[7, 4681, 3, series]));

        let backward = reshape(original.clone(), Mode::Backward).unwrap().unwrap();
        let forward = reshape(backward, Mode::Forward).unwrap().unwrap();

        assert_eq!(forward.shape(), original.shape());
        assert_eq!(forward.flattened(), original.flattened());
    }
}

#[test]
fn test_forward_then_backward_round_trip() {
    let original = Volume::with_identity_affine(ramp(&[32767, 3, 1, 2]));

    let forward = reshape(original.clone(), Mode::Forward).unwrap().unwrap();
    assert_eq!(forward.shape(), &[7, 4681, 3, 2]);
    let backward = reshape(forward, Mode::Backward).unwrap().unwrap();

    assert_eq!(backward.data, original.data);
}

#[test]
fn test_non_cifti_volume_is_skipped() {
    let volume = Volume::with_identity_affine(ramp(&[10, 10, 3]));
    assert!(reshape(volume.clone(), Mode::Forward).unwrap().is_none());
    assert!(reshape(volume, Mode::Backward).unwrap().is_none());

    // A single axis has no spatial samples at all
    let flat = Volume::with_identity_affine(ramp(&[98301]));
    assert!(reshape(flat, Mode::Forward).unwrap().is_none());
}

#[test]
fn test_affine_is_reset_to_identity() {
    let mut affine = Affine::identity();
    affine[(0, 0)] = -2.0;
    affine[(1, 1)] = 2.0;
    affine[(0, 3)] = 90.0;
    affine[(1, 3)] = -126.0;
    affine[(2, 3)] = -72.0;

    let volume = Volume::new(ramp(&[98301, 1, 2]), affine);
    let reshaped = reshape(volume, Mode::Forward).unwrap().unwrap();
    assert_eq!(reshaped.affine, Affine::identity());
}

#[test]
fn test_column_major_input_uses_logical_order() {
    use ndarray::ShapeBuilder;

    let c_order = ramp(&[7, 4681, 3, 2]);
    let mut f_order = VolumeData::zeros(IxDyn(&[7, 4681, 3, 2]).f());
    f_order.assign(&c_order);
    assert!(!f_order.is_standard_layout());

    let from_c = reshape(Volume::with_identity_affine(c_order), Mode::Backward).unwrap().unwrap();
    let from_f = reshape(Volume::with_identity_affine(f_order), Mode::Backward).unwrap().unwrap();
    assert_eq!(from_c.data, from_f.data);
}

#[test]
fn test_run_writes_reshaped_volume() {
    let store = MemoryStore::default();
    store
        .save(Path::new("in.nii.gz"), &Volume::with_identity_affine(ramp(&[98301, 1, 5])))
        .unwrap();

    let outcome = run(&config(Mode::Forward), &store).unwrap();
    assert_eq!(
        outcome,
        Outcome::Reshaped {
            shape: vec![7, 4681, 3, 5]
        }
    );

    let written = store.load(Path::new("out.nii.gz")).unwrap();
    assert_eq!(written.shape(), &[7, 4681, 3, 5]);
}

#[test]
fn test_run_skips_without_writing() {
    let store = MemoryStore::default();
    store
        .save(Path::new("in.nii.gz"), &Volume::with_identity_affine(ramp(&[10, 10, 5])))
        .unwrap();

    let outcome = run(&config(Mode::Backward), &store).unwrap();
    assert_eq!(outcome, Outcome::Skipped { spatial_len: 100 });
    assert!(store.load(Path::new("out.nii.gz")).is_err());
}

#[test]
fn test_run_fails_on_missing_input() {
    let store = MemoryStore::default();
    let err = run(&config(Mode::Forward), &store).unwrap_err();
    assert!(err.to_string().contains("in.nii.gz"));
}

#[test]
fn test_mode_targets() {
    assert_eq!(Mode::Forward.target(), [7, 4681, 3]);
    assert_eq!(Mode::Backward.target(), [32767, 3, 1]);
}
