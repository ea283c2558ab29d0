//! Best-match resolution for a requested capture mode.

use camdir_core::{
    Backend, Capability, CapabilityDirectory, CaptureResult, MatchScore, PixelFormat, RankedCapability,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub device_id: String,
    pub requested: Capability,
    pub best: Capability,
    pub score: MatchScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked: Option<Vec<RankedCapability>>,
}

/// Build the request the user described on the command line.
pub fn request(width: u32, height: u32, fps: u32, format: PixelFormat) -> Capability {
    Capability::new(width, height, fps, format)
}

pub fn best_match<B: Backend>(
    dir: &CapabilityDirectory<B>,
    device_id: &str,
    requested: Capability,
    include_ranking: bool,
) -> CaptureResult<MatchReport> {
    let (best, score) = dir.best_match_scored(device_id, &requested)?;
    let ranked = if include_ranking {
        Some(dir.ranked(device_id, &requested)?)
    } else {
        None
    };

    Ok(MatchReport {
        device_id: device_id.to_string(),
        requested,
        best,
        score,
        ranked,
    })
}
