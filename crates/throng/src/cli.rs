//! Command line: `<mesh-path> <instance-count> [layout]`.
//!
//! Hand-parsed like the engine's other binaries. A count that is missing,
//! zero, negative or unparsable is clamped to 1 rather than rejected; one
//! above [`MAX_INSTANCES`] is clamped down to it.

use std::path::PathBuf;

use throng_shared::constants::MAX_INSTANCES;
use throng_shared::placement::Layout;

use crate::error::{AppError, AppResult};

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Mesh file to instance.
    pub mesh_path: PathBuf,
    /// Number of instances, in `1..=MAX_INSTANCES`.
    pub instance_count: usize,
    /// Placement layout.
    pub layout: Layout,
}

/// Usage line printed on bad input and `--help`.
pub const USAGE: &str = "throng_viewer <mesh-path> <instance-count> [grid|plane|scatter]";

/// Parses the arguments after the program name.
///
/// # Errors
///
/// [`AppError::Usage`] if no mesh path is given or `--help` is requested.
pub fn parse_args<I, S>(args: I) -> AppResult<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Err(AppError::Usage(USAGE.to_owned()));
    }

    let Some(mesh) = args.first() else {
        return Err(AppError::Usage(USAGE.to_owned()));
    };

    let instance_count = args.get(1).map_or(1, |raw| clamp_count(raw));
    let layout = args.get(2).map_or(Layout::Grid, |raw| Layout::parse_lossy(raw));

    Ok(CliArgs {
        mesh_path: PathBuf::from(mesh),
        instance_count,
        layout,
    })
}

/// Parses an instance count, clamping it into `1..=MAX_INSTANCES`.
#[must_use]
pub fn clamp_count(raw: &str) -> usize {
    let raw = raw.trim();
    let digits_only = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    match raw.parse::<i128>() {
        Ok(n) if n > MAX_INSTANCES as i128 => {
            tracing::warn!("instance count {} clamped to {}", n, MAX_INSTANCES);
            MAX_INSTANCES
        }
        Ok(n) if n >= 1 => usize::try_from(n).unwrap_or(MAX_INSTANCES),
        Ok(n) => {
            tracing::warn!("instance count {} clamped to 1", n);
            1
        }
        Err(_) if digits_only => {
            tracing::warn!("instance count {} clamped to {}", raw, MAX_INSTANCES);
            MAX_INSTANCES
        }
        Err(_) => {
            tracing::warn!("instance count '{}' is not a number, using 1", raw);
            1
        }
    }
}
