use crate::model::{LaneResult, PipelineResult};
use serde::{Deserialize, Serialize};

/// Statistics about a planning run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadStats {
    /// Lanes that produced at least one trailer.
    pub num_lanes_served: usize,
    pub num_trailers: usize,
    pub num_stacks: usize,
    /// Shipped unit identifiers across all trailers.
    pub num_units: usize,
    /// Unit identifiers that stayed behind.
    pub num_unused: usize,
    /// Mean of length_used / trailer length over all trailers (0.0 to 1.0+,
    /// overhanging loads can exceed 1).
    pub mean_coverage: f64,
    pub num_rotated: usize,
}

impl LoadStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Lanes served: {}, Trailers: {}, Stacks: {}, Units: {}, Unused: {}, Coverage: {:.2}%, Rotated: {}",
            self.num_lanes_served,
            self.num_trailers,
            self.num_stacks,
            self.num_units,
            self.num_unused,
            self.mean_coverage * 100.0,
            self.num_rotated,
        )
    }
}

fn accumulate(lanes: &[LaneResult]) -> LoadStats {
    let mut num_lanes_served = 0;
    let mut num_trailers = 0;
    let mut num_stacks = 0;
    let mut num_units = 0;
    let mut num_unused = 0;
    let mut num_rotated = 0;
    let mut coverage_sum = 0.0;

    for lane in lanes {
        if !lane.trailers.is_empty() {
            num_lanes_served += 1;
        }
        num_unused += lane.unused_models.len();
        for t in &lane.trailers {
            num_trailers += 1;
            if t.length > 0.0 {
                coverage_sum += t.length_used / t.length;
            }
            for ps in &t.stacks {
                num_stacks += 1;
                num_units += ps.stack.models.len();
                if ps.rotated {
                    num_rotated += 1;
                }
            }
        }
    }

    let mean_coverage = if num_trailers > 0 {
        coverage_sum / num_trailers as f64
    } else {
        0.0
    };

    LoadStats {
        num_lanes_served,
        num_trailers,
        num_stacks,
        num_units,
        num_unused,
        mean_coverage,
        num_rotated,
    }
}

impl PipelineResult {
    /// Computes planning statistics for this result.
    pub fn stats(&self) -> LoadStats {
        accumulate(&self.lanes)
    }
}

impl LaneResult {
    pub fn stats(&self) -> LoadStats {
        accumulate(std::slice::from_ref(self))
    }
}
