use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{GridError, Result};
use crate::video::probe::ClipProbe;
use crate::video::types::{display_name, Clip, ClipInfo};

/// Outcome of probing every clip in the grid
#[derive(Debug, Clone)]
pub struct DurationNegotiation {
    /// Shortest duration among the clips that probed successfully
    pub duration: f64,

    /// Probe result per grid cell, in row-major order
    pub infos: Vec<Option<ClipInfo>>,
}

impl DurationNegotiation {
    /// Clips that probed successfully
    pub fn clips<'a>(&'a self, paths: &'a [PathBuf]) -> impl Iterator<Item = Clip> + 'a {
        paths
            .iter()
            .zip(&self.infos)
            .filter_map(|(path, info)| info.map(|info| Clip::new(path.clone(), info)))
    }

    pub fn failed_count(&self) -> usize {
        self.infos.iter().filter(|info| info.is_none()).count()
    }
}

/// Minimum over a set of durations, `None` when empty
pub fn min_duration<I: IntoIterator<Item = f64>>(durations: I) -> Option<f64> {
    durations.into_iter().fold(None, |acc, d| match acc {
        Some(min) if min <= d => Some(min),
        _ => Some(d),
    })
}

/// Probe every clip and pick the shortest duration
///
/// Clips that fail to probe are logged and left out; the negotiation only
/// fails when no clip at all could be probed.
pub async fn negotiate_duration<P: ClipProbe>(
    probe: &P,
    paths: &[PathBuf],
) -> Result<DurationNegotiation> {
    if paths.is_empty() {
        return Err(GridError::EmptyGrid.into());
    }

    let mut infos = Vec::with_capacity(paths.len());
    for path in paths {
        match probe.probe(path).await {
            Ok(info) => {
                info!("   {}: {}x{}, {:.2}s",
                      display_name(path), info.width, info.height, info.duration);
                infos.push(Some(info));
            }
            Err(e) => {
                warn!("   Skipping {} for duration: {}", display_name(path), e);
                infos.push(None);
            }
        }
    }

    let duration = min_duration(infos.iter().flatten().map(|info| info.duration))
        .ok_or(GridError::NoUsableClips { attempted: paths.len() })?;

    info!("   Using duration: {:.2}s", duration);
    Ok(DurationNegotiation { duration, infos })
}
