//! Confidence gate over retrieval results.
//!
//! The gate trusts the single nearest neighbor: a candidate set is accepted
//! when its top distance is at or below the threshold. An optional margin
//! check can additionally require the best hit to stand apart from the
//! runner-up; without it the single-threshold rule is unchanged.

use serde::Serialize;

use crate::document::Candidate;

/// Whether a candidate set is trustworthy enough to answer from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateDecision {
    pub accept: bool,
    /// Distance of the best candidate; `None` for an empty set.
    pub top_distance: Option<f32>,
}

/// Apply the single-threshold rule: accept iff the top distance is `<= threshold`.
///
/// `candidates` must already be sorted ascending by distance.
pub fn gate(candidates: &[Candidate], threshold: f32) -> GateDecision {
    match candidates.first() {
        None => GateDecision { accept: false, top_distance: None },
        Some(top) => GateDecision { accept: top.distance <= threshold, top_distance: Some(top.distance) },
    }
}

/// Configured gate used by the agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
    min_margin: Option<f32>,
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold, min_margin: None }
    }

    /// Also require `distance[1] - distance[0] >= margin` when a runner-up exists.
    pub fn with_min_margin(mut self, margin: Option<f32>) -> Self {
        self.min_margin = margin;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn evaluate(&self, candidates: &[Candidate]) -> GateDecision {
        let decision = gate(candidates, self.threshold);
        match (decision.accept, self.min_margin, candidates.get(1)) {
            (true, Some(margin), Some(runner_up)) => {
                let top = candidates[0].distance;
                GateDecision { accept: runner_up.distance - top >= margin, ..decision }
            }
            _ => decision,
        }
    }
}
