//! Computed output segments.

use serde::{Deserialize, Serialize};

/// Speed ratios closer to 1.0 than this are encoded without tempo filters.
pub const SPEED_EPSILON: f64 = 0.01;

/// A half-open range `[start, end)` of the source that survives editing,
/// played back at `speed_ratio`.
///
/// Produced by the segment planner for one planning call; `Copy` so that
/// consumers never mutate a plan in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub speed_ratio: f64,
}

impl OutputSegment {
    pub fn new(start_secs: f64, end_secs: f64, speed_ratio: f64) -> Self {
        Self {
            start_secs,
            end_secs,
            speed_ratio,
        }
    }

    /// Source duration covered by this segment.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Duration after the speed factor is applied.
    pub fn output_duration_secs(&self) -> f64 {
        self.duration_secs() / self.speed_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_duration_accounts_for_speed() {
        let seg = OutputSegment::new(10.0, 30.0, 2.0);
        assert!((seg.duration_secs() - 20.0).abs() < 1e-9);
        assert!((seg.output_duration_secs() - 10.0).abs() < 1e-9);
    }
}
