use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// Direction of the reshape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Flat CIFTI-like layout to 7 x 4681 x 3.
    #[default]
    Forward,
    /// 7 x 4681 x 3 back to 32767 x 3 x 1.
    Backward,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Forward => write!(f, "forward"),
            Mode::Backward => write!(f, "backward"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    after_help = "Reshapes a surface nifti so that all dimensions have a size >1, or restores the original size."
)]
pub struct Args {
    /// functional MRI time series
    #[arg(short = 'f', value_name = "fMRI.nii.gz")]
    pub input: PathBuf,

    /// output of functional MRI time series
    #[arg(short = 'o', value_name = "out.nii.gz")]
    pub output: PathBuf,

    /// Reshape the flat layout so every spatial axis is larger than one (default)
    #[arg(long, conflicts_with = "backward")]
    pub forward: bool,

    /// Reshape back to the original flat layout
    #[arg(long)]
    pub backward: bool,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mode = if args.backward {
            Mode::Backward
        } else {
            Mode::Forward
        };

        Config {
            input: args.input,
            output: args.output,
            mode,
        }
    }
}

#[cfg(test)]
fn parse(args: &[&str]) -> Result<Config, clap::Error> {
    Args::try_parse_from(std::iter::once("surface_reshape").chain(args.iter().copied()))
        .map(Config::from)
}

#[test]
fn test_mode_defaults_to_forward() {
    let config = parse(&["-f", "in.nii.gz", "-o", "out.nii.gz"]).unwrap();
    assert_eq!(config.mode, Mode::Forward);
    assert_eq!(config.input, PathBuf::from("in.nii.gz"));
    assert_eq!(config.output, PathBuf::from("out.nii.gz"));
}

#[test]
fn test_explicit_modes() {
    let forward = parse(&["-f", "in.nii", "-o", "out.nii", "--forward"]).unwrap();
    assert_eq!(forward.mode, Mode::Forward);

    let backward = parse(&["--backward", "-f", "in.nii", "-o", "out.nii"]).unwrap();
    assert_eq!(backward.mode, Mode::Backward);
}

#[test]
fn test_conflicting_modes_rejected() {
    let err = parse(&["-f", "in.nii", "-o", "out.nii", "--forward", "--backward"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn test_missing_paths_rejected() {
    let err = parse(&["-f", "in.nii"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

    let err = parse(&["-o", "out.nii"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_mode_display() {
    assert_eq!(Mode::Forward.to_string(), "forward");
    assert_eq!(Mode::Backward.to_string(), "backward");
}
