use std::path::Path;

use anyhow::Result;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3, Vector4};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::volume::Volume;
use crate::{Affine, FloatType};

/// Sform/qform code NIfTI uses for "aligned to another file's coordinates".
const XFORM_ALIGNED: i16 = 2;

/// Loads and stores whole volumes by path.
pub trait VolumeStore {
    fn load(&self, path: &Path) -> Result<Volume>;

    fn save(&self, path: &Path, volume: &Volume) -> Result<()>;
}

/// NIfTI-1 files on disk. Whether a file is gzipped follows its extension (`.nii.gz`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NiftiStore;

impl VolumeStore for NiftiStore {
    fn load(&self, path: &Path) -> Result<Volume> {
        let object = ReaderOptions::new().read_file(path)?;
        let affine = header_affine(object.header());

        // Scaling slope and intercept are applied during conversion
        let data = object.into_volume().into_ndarray::<FloatType>()?;

        Ok(Volume::new(data, affine))
    }

    fn save(&self, path: &Path, volume: &Volume) -> Result<()> {
        let header = reference_header(&volume.affine);
        WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(&volume.data)?;
        Ok(())
    }
}

/// Voxel-to-world affine of a header. The sform is preferred, then the qform,
/// and finally plain voxel scaling when neither is set.
pub fn header_affine(header: &NiftiHeader) -> Affine {
    if header.sform_code > 0 {
        sform_affine(header)
    } else if header.qform_code > 0 {
        qform_affine(header)
    } else {
        let pixdim = &header.pixdim;
        Affine::from_diagonal(&Vector4::new(
            pixdim[1] as FloatType,
            pixdim[2] as FloatType,
            pixdim[3] as FloatType,
            1.0,
        ))
    }
}

fn sform_affine(header: &NiftiHeader) -> Affine {
    let mut affine = Affine::identity();
    for (i, row) in [header.srow_x, header.srow_y, header.srow_z].iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            affine[(i, j)] = value as FloatType;
        }
    }
    affine
}

fn qform_affine(header: &NiftiHeader) -> Affine {
    let b = header.quatern_b as FloatType;
    let c = header.quatern_c as FloatType;
    let d = header.quatern_d as FloatType;

    // The header stores only b, c, d of a unit quaternion
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(a, b, c, d)).to_rotation_matrix();

    let pixdim = &header.pixdim;
    let qfac = if pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let zooms = Vector3::new(
        pixdim[1] as FloatType,
        pixdim[2] as FloatType,
        pixdim[3] as FloatType * qfac,
    );

    let mut affine = (rotation.matrix() * Matrix3::from_diagonal(&zooms)).to_homogeneous();
    affine[(0, 3)] = header.quatern_x as FloatType;
    affine[(1, 3)] = header.quatern_y as FloatType;
    affine[(2, 3)] = header.quatern_z as FloatType;
    affine
}

/// Header written alongside a volume: `affine` goes into the sform, the qform is
/// left unset and voxel sizes are the lengths of the affine's columns.
fn reference_header(affine: &Affine) -> NiftiHeader {
    let row = |i: usize| {
        [
            affine[(i, 0)] as f32,
            affine[(i, 1)] as f32,
            affine[(i, 2)] as f32,
            affine[(i, 3)] as f32,
        ]
    };

    let mut pixdim = [1.0; 8];
    for (axis, zoom) in pixdim[1..4].iter_mut().enumerate() {
        *zoom = (0..3).map(|row| affine[(row, axis)].powi(2)).sum::<FloatType>().sqrt() as f32;
    }

    NiftiHeader {
        sform_code: XFORM_ALIGNED,
        qform_code: 0,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        pixdim,
        scl_slope: 1.0,
        scl_inter: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_sform_is_preferred() {
    let header = NiftiHeader {
        sform_code: 1,
        qform_code: 1,
        srow_x: [-2.0, 0.0, 0.0, 90.0],
        srow_y: [0.0, 2.0, 0.0, -126.0],
        srow_z: [0.0, 0.0, 2.0, -72.0],
        quatern_x: 5.0,
        ..Default::default()
    };

    let affine = header_affine(&header);
    assert_eq!(affine[(0, 0)], -2.0);
    assert_eq!(affine[(0, 3)], 90.0);
    assert_eq!(affine[(1, 3)], -126.0);
    assert_eq!(affine[(2, 2)], 2.0);
    assert_eq!(affine[(3, 3)], 1.0);
}

#[test]
fn test_qform_without_rotation() {
    let header = NiftiHeader {
        sform_code: 0,
        qform_code: 1,
        pixdim: [1.0, 2.0, 3.0, 4.0, 1.0, 1.0, 1.0, 1.0],
        quatern_b: 0.0,
        quatern_c: 0.0,
        quatern_d: 0.0,
        quatern_x: 10.0,
        quatern_y: -20.0,
        quatern_z: 30.0,
        ..Default::default()
    };

    let mut expected = Affine::from_diagonal(&Vector4::new(2.0, 3.0, 4.0, 1.0));
    expected[(0, 3)] = 10.0;
    expected[(1, 3)] = -20.0;
    expected[(2, 3)] = 30.0;

    let affine = header_affine(&header);
    for (a, e) in affine.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-9, "{affine} != {expected}");
    }
}

#[test]
fn test_reference_header_carries_affine() {
    let mut affine = Affine::identity();
    affine[(0, 0)] = 3.0;
    affine[(2, 3)] = -7.5;

    let header = reference_header(&affine);
    assert_eq!(header.sform_code, XFORM_ALIGNED);
    assert_eq!(header.qform_code, 0);
    assert_eq!(header.srow_x, [3.0, 0.0, 0.0, 0.0]);
    assert_eq!(header.srow_z, [0.0, 0.0, 1.0, -7.5]);
    assert_eq!(&header.pixdim[1..4], &[3.0, 1.0, 1.0]);
    assert_eq!(header_affine(&header), affine);
}

#[test]
fn test_reshape_through_nifti_files() {
    use crate::config::{Config, Mode};
    use crate::reshape::{run, Outcome};
    use crate::VolumeData;
    use ndarray::IxDyn;

    let dir = std::env::temp_dir();
    let input = dir.join(format!("surface_reshape_{}_in.nii", std::process::id()));
    let output = dir.join(format!("surface_reshape_{}_out.nii", std::process::id()));

    // Non-identity affine on the way in
    let shape = [7, 4681, 3, 2];
    let len: usize = shape.iter().product();
    let data = VolumeData::from_shape_vec(IxDyn(&shape), (0..len).map(|i| i as f64).collect()).unwrap();
    let mut affine = Affine::identity();
    affine[(0, 0)] = 2.0;
    affine[(0, 3)] = -90.0;
    NiftiStore
        .save(&input, &Volume::new(data.clone(), affine))
        .expect("failed to write input volume");

    let config = Config {
        input: input.clone(),
        output: output.clone(),
        mode: Mode::Backward,
    };
    let outcome = run(&config, &NiftiStore).expect("reshape failed");
    assert_eq!(
        outcome,
        Outcome::Reshaped {
            shape: vec![32767, 3, 1, 2]
        }
    );

    let written = NiftiStore.load(&output).expect("failed to read output volume");
    assert_eq!(written.shape(), &[32767, 3, 1, 2]);
    assert_eq!(written.affine, Affine::identity());
    assert_eq!(written.flattened(), data.iter().copied().collect::<Vec<_>>());

    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("surface_reshape_does_not_exist.nii");
    assert!(NiftiStore.load(&path).is_err());
}
