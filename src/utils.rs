pub mod io;

use crate::constants::*;

use anyhow::{ensure, Result};

/// Number of spatial samples in an array of the given `shape`, i.e. the product of
/// every axis except the trailing series axis. Arrays with fewer than two axes have
/// no spatial axes, so this is the empty product (1).
pub fn spatial_len(shape: &[usize]) -> usize {
    match shape.split_last() {
        Some((_, spatial)) => spatial.iter().product(),
        None => 1,
    }
}

/// Length of the trailing series (time) axis.
pub fn series_len(shape: &[usize]) -> Option<usize> {
    shape.last().copied()
}

/// Checks that both reshape targets factorize `CIFTI_SIZE`. Called once at startup.
pub fn verify_targets() -> Result<()> {
    let forward: usize = FWD_DIM_TARGET.iter().product();
    let backward: usize = BWD_DIM_TARGET.iter().product();
    ensure!(
        forward == CIFTI_SIZE && backward == CIFTI_SIZE,
        "reshape targets {:?} ({}) and {:?} ({}) must both hold {} samples",
        FWD_DIM_TARGET,
        forward,
        BWD_DIM_TARGET,
        backward,
        CIFTI_SIZE
    );
    Ok(())
}

#[test]
fn test_verify_targets() {
    assert!(verify_targets().is_ok());
}

#[test]
fn test_spatial_len_excludes_series_axis() {
    assert_eq!(spatial_len(&[98301, 1, 5]), CIFTI_SIZE);
    assert_eq!(spatial_len(&[7, 4681, 3, 5]), CIFTI_SIZE);
    assert_eq!(spatial_len(&[10, 10, 20]), 100);
}

#[test]
fn test_spatial_len_without_spatial_axes() {
    assert_eq!(spatial_len(&[]), 1);
    assert_eq!(spatial_len(&[98301]), 1);
}

#[test]
fn test_series_len() {
    assert_eq!(series_len(&[7, 4681, 3, 5]), Some(5));
    assert_eq!(series_len(&[]), None);
}
