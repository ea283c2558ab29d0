//! Best-match selection between a requested capability and what a device
//! actually offers.
//!
//! Every candidate gets a non-negative cost built from three terms:
//!
//! - resolution: `|area(C) - area(R)| / area(R)`
//! - frame rate: a relative surplus `s` costs `surplus_factor * s / (1 + s)`,
//!   which stays below `surplus_factor`; a relative shortfall `d` costs
//!   `surplus_factor + shortfall_factor * d`, so any shortfall costs more
//!   than any surplus
//! - format: `0` on a match (or when the request leaves the format
//!   unspecified), otherwise `format_mismatch_cost`
//!
//! The terms are combined with `resolution_weight > frame_rate_weight >
//! format_weight`. The lowest total wins; on equal totals the candidate
//! listed first wins.

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};
use crate::types::Capability;

/// Weights and penalty factors for capability scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    pub resolution_weight: f64,
    pub frame_rate_weight: f64,
    pub format_weight: f64,
    /// Upper bound of the frame-rate surplus penalty, and the base cost of
    /// any shortfall
    pub surplus_factor: f64,
    /// Penalty per unit of relative frame-rate shortfall
    pub shortfall_factor: f64,
    /// Cost of any pixel format other than the requested one
    pub format_mismatch_cost: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            resolution_weight: 100.0,
            frame_rate_weight: 10.0,
            format_weight: 1.0,
            surplus_factor: 0.1,
            shortfall_factor: 1.0,
            format_mismatch_cost: 1.0,
        }
    }
}

impl MatchPolicy {
    /// Check that all values are usable and the term ordering holds.
    pub fn validate(&self) -> CaptureResult<()> {
        let fields = [
            ("resolution_weight", self.resolution_weight),
            ("frame_rate_weight", self.frame_rate_weight),
            ("format_weight", self.format_weight),
            ("surplus_factor", self.surplus_factor),
            ("shortfall_factor", self.shortfall_factor),
            ("format_mismatch_cost", self.format_mismatch_cost),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CaptureError::InvalidPolicy(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.resolution_weight <= self.frame_rate_weight
            || self.frame_rate_weight <= self.format_weight
        {
            return Err(CaptureError::InvalidPolicy(
                "weights must satisfy resolution > frame rate > format".into(),
            ));
        }

        if self.surplus_factor >= self.shortfall_factor {
            return Err(CaptureError::InvalidPolicy(
                "surplus_factor must be less than shortfall_factor".into(),
            ));
        }

        Ok(())
    }
}

/// Cost breakdown for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub resolution: f64,
    pub frame_rate: f64,
    pub format: f64,
    /// Weighted sum of the three terms
    pub total: f64,
}

/// A candidate together with its enumeration index and score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedCapability {
    pub index: usize,
    pub capability: Capability,
    pub score: MatchScore,
}

/// Reject requests that cannot be scored.
pub fn validate_request(requested: &Capability) -> CaptureResult<()> {
    if requested.width == 0 || requested.height == 0 {
        return Err(CaptureError::InvalidRequest(format!(
            "resolution must be non-zero, got {}x{}",
            requested.width, requested.height
        )));
    }
    if requested.max_fps == 0 {
        return Err(CaptureError::InvalidRequest("frame rate must be non-zero".into()));
    }
    Ok(())
}

/// Score one candidate against a validated request.
pub fn score(policy: &MatchPolicy, requested: &Capability, candidate: &Capability) -> MatchScore {
    let requested_area = requested.area() as f64;
    let resolution = (candidate.area() as f64 - requested_area).abs() / requested_area;

    let requested_fps = f64::from(requested.max_fps);
    let candidate_fps = f64::from(candidate.max_fps);
    let frame_rate = if candidate_fps >= requested_fps {
        let surplus = (candidate_fps - requested_fps) / requested_fps;
        policy.surplus_factor * surplus / (1.0 + surplus)
    } else {
        let shortfall = (requested_fps - candidate_fps) / requested_fps;
        policy.surplus_factor + policy.shortfall_factor * shortfall
    };

    let format = if requested.pixel_format.is_unknown()
        || candidate.pixel_format == requested.pixel_format
    {
        0.0
    } else {
        policy.format_mismatch_cost
    };

    let total = policy.resolution_weight * resolution
        + policy.frame_rate_weight * frame_rate
        + policy.format_weight * format;

    MatchScore {
        resolution,
        frame_rate,
        format,
        total,
    }
}

/// Pick the lowest-cost candidate. Returns its index and score.
pub fn best_match(
    policy: &MatchPolicy,
    requested: &Capability,
    candidates: &[Capability],
) -> CaptureResult<(usize, MatchScore)> {
    validate_request(requested)?;

    let mut best: Option<(usize, MatchScore)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let candidate_score = score(policy, requested, candidate);
        // Strict comparison keeps the earlier candidate on a tie.
        let better = match &best {
            Some((_, current)) => candidate_score.total < current.total,
            None => true,
        };
        if better {
            best = Some((index, candidate_score));
        }
    }

    best.ok_or_else(|| CaptureError::NoCapabilities("candidate list is empty".into()))
}

/// Every candidate ordered by cost, ties kept in enumeration order.
pub fn rank(
    policy: &MatchPolicy,
    requested: &Capability,
    candidates: &[Capability],
) -> CaptureResult<Vec<RankedCapability>> {
    validate_request(requested)?;

    let mut ranked: Vec<RankedCapability> = candidates
        .iter()
        .enumerate()
        .map(|(index, capability)| RankedCapability {
            index,
            capability: *capability,
            score: score(policy, requested, capability),
        })
        .collect();
    ranked.sort_by(|a, b| a.score.total.total_cmp(&b.score.total));
    Ok(ranked)
}
