//! Segment planning.
//!
//! Only one whole-timeline transformation applies per plan, in priority
//! order: a Trim short-circuits everything, otherwise Splits short-circuit
//! Cuts and SpeedChanges, otherwise the Cut/SpeedChange sweep runs.
//!
//! The sweep assigns a single speed per surviving segment, taken from the
//! segment's start time. A SpeedChange range that begins inside a segment
//! is not split out into its own segment.

use jimaku_common::error::{JimakuError, JimakuResult};
use jimaku_project_model::edit::{EditKind, EditOperation};
use jimaku_project_model::segment::OutputSegment;

/// Segments shorter than this are dropped instead of being encoded.
pub const MIN_SEGMENT_SECS: f64 = 1e-6;

/// Which rule produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// A single trimmed range.
    Trim,
    /// Standalone parts, one output file per segment.
    Split,
    /// Cut/speed sweep, concatenated into one output.
    Sweep,
}

/// Result of planning: the segments plus how they are meant to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub mode: PlanMode,
    pub segments: Vec<OutputSegment>,
}

impl SegmentPlan {
    /// Whether the segments are written as separate files instead of being joined.
    pub fn is_standalone_parts(&self) -> bool {
        self.mode == PlanMode::Split
    }

    /// Total output duration after speed factors.
    pub fn output_duration_secs(&self) -> f64 {
        self.segments
            .iter()
            .map(OutputSegment::output_duration_secs)
            .sum()
    }
}

/// Plan the output segments for `source_duration_secs` under `edits`.
///
/// Fails with a planning error when the input is invalid or when nothing of
/// the source survives the edits.
pub fn plan(source_duration_secs: f64, edits: &[EditOperation]) -> JimakuResult<SegmentPlan> {
    if !source_duration_secs.is_finite() || source_duration_secs <= 0.0 {
        return Err(JimakuError::planning(format!(
            "source duration must be positive (got {source_duration_secs})"
        )));
    }
    for (i, edit) in edits.iter().enumerate() {
        edit.validate()
            .map_err(|e| JimakuError::planning(format!("edit #{}: {e}", i + 1)))?;
    }

    let plan = if let Some(trim) = first_of_kind(edits, EditKind::Trim) {
        SegmentPlan {
            mode: PlanMode::Trim,
            segments: plan_trim(source_duration_secs, trim),
        }
    } else if edits.iter().any(|e| e.kind == EditKind::Split) {
        SegmentPlan {
            mode: PlanMode::Split,
            segments: plan_split(source_duration_secs, edits),
        }
    } else {
        SegmentPlan {
            mode: PlanMode::Sweep,
            segments: plan_sweep(source_duration_secs, edits),
        }
    };

    if plan.segments.is_empty() {
        return Err(JimakuError::planning(
            "nothing left to export: the edits remove the entire source",
        ));
    }

    tracing::debug!(
        mode = ?plan.mode,
        segments = plan.segments.len(),
        source_duration_secs,
        output_duration_secs = plan.output_duration_secs(),
        "Segment plan built"
    );

    Ok(plan)
}

/// Caller-facing shorthand for [`plan`] returning only the segments.
pub fn compute_segments(
    source_duration_secs: f64,
    edits: &[EditOperation],
) -> JimakuResult<Vec<OutputSegment>> {
    plan(source_duration_secs, edits).map(|plan| plan.segments)
}

/// Earliest-starting edit of `kind`; ties keep list order.
fn first_of_kind(edits: &[EditOperation], kind: EditKind) -> Option<&EditOperation> {
    edits
        .iter()
        .filter(|e| e.kind == kind)
        .min_by(|a, b| a.start_secs.total_cmp(&b.start_secs))
}

fn plan_trim(duration: f64, trim: &EditOperation) -> Vec<OutputSegment> {
    let start = trim.start_secs.clamp(0.0, duration);
    let end = trim.end_secs.clamp(0.0, duration);
    if end - start > MIN_SEGMENT_SECS {
        vec![OutputSegment::new(start, end, 1.0)]
    } else {
        vec![]
    }
}

fn plan_split(duration: f64, edits: &[EditOperation]) -> Vec<OutputSegment> {
    let mut points: Vec<f64> = edits
        .iter()
        .filter(|e| e.kind == EditKind::Split)
        .map(|e| e.start_secs)
        .filter(|&t| t > 0.0 && t < duration)
        .collect();
    points.sort_by(f64::total_cmp);
    points.dedup();

    let mut boundaries = Vec::with_capacity(points.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(points);
    boundaries.push(duration);

    boundaries
        .windows(2)
        .map(|w| OutputSegment::new(w[0], w[1], 1.0))
        .collect()
}

fn plan_sweep(duration: f64, edits: &[EditOperation]) -> Vec<OutputSegment> {
    let cuts = normalized_cuts(duration, edits);
    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut cursor = 0.0f64;

    let emit = |start: f64, end: f64, segments: &mut Vec<OutputSegment>| {
        if end - start > MIN_SEGMENT_SECS {
            segments.push(OutputSegment::new(
                start,
                end,
                speed_ratio_at(start, edits),
            ));
        }
    };

    while let Some(&(cut_start, cut_end)) = cuts.iter().find(|(start, _)| *start >= cursor) {
        emit(cursor, cut_start, &mut segments);
        cursor = cut_end;
    }

    if cursor < duration {
        emit(cursor, duration, &mut segments);
    }

    segments
}

/// Cut ranges clamped to the source, with empty ranges dropped and
/// overlapping or touching ranges merged. Sorted by start.
fn normalized_cuts(duration: f64, edits: &[EditOperation]) -> Vec<(f64, f64)> {
    let mut cuts: Vec<(f64, f64)> = edits
        .iter()
        .filter(|e| e.kind == EditKind::Cut)
        .map(|e| {
            (
                e.start_secs.clamp(0.0, duration),
                e.end_secs.clamp(0.0, duration),
            )
        })
        .filter(|(start, end)| end > start)
        .collect();
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(cuts.len());
    for (start, end) in cuts {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

/// Speed of the first SpeedChange (in caller order) covering `t`, else 1.0.
fn speed_ratio_at(t: f64, edits: &[EditOperation]) -> f64 {
    edits
        .iter()
        .find(|e| e.kind == EditKind::SpeedChange && e.contains(t))
        .map(|e| e.speed_ratio)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(segments: &[OutputSegment]) -> Vec<(f64, f64, f64)> {
        segments
            .iter()
            .map(|s| (s.start_secs, s.end_secs, s.speed_ratio))
            .collect()
    }

    #[test]
    fn test_no_edits_yields_whole_source() {
        let plan = plan(42.0, &[]).unwrap();
        assert_eq!(plan.mode, PlanMode::Sweep);
        assert_eq!(spans(&plan.segments), vec![(0.0, 42.0, 1.0)]);
    }

    #[test]
    fn test_cut_and_speed_scenario_uses_segment_start_speed() {
        let edits = vec![
            EditOperation::cut(10.0, 20.0),
            EditOperation::speed_change(30.0, 40.0, 2.0),
        ];
        let segments = compute_segments(100.0, &edits).unwrap();
        assert_eq!(
            spans(&segments),
            vec![(0.0, 10.0, 1.0), (20.0, 100.0, 1.0)]
        );
    }

    #[test]
    fn test_speed_applies_when_covering_segment_start() {
        let edits = vec![
            EditOperation::cut(10.0, 20.0),
            EditOperation::speed_change(15.0, 60.0, 1.5),
        ];
        let segments = compute_segments(100.0, &edits).unwrap();
        assert_eq!(
            spans(&segments),
            vec![(0.0, 10.0, 1.0), (20.0, 100.0, 1.5)]
        );
    }

    #[test]
    fn test_first_speed_change_in_list_order_wins() {
        let edits = vec![
            EditOperation::speed_change(5.0, 50.0, 0.5),
            EditOperation::speed_change(0.0, 50.0, 3.0),
        ];
        // Segment starts at 0: only the second covers it.
        let segments = compute_segments(50.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 50.0, 3.0)]);

        let edits = vec![
            EditOperation::cut(0.0, 10.0),
            EditOperation::speed_change(5.0, 50.0, 0.5),
            EditOperation::speed_change(0.0, 50.0, 3.0),
        ];
        // Segment starts at 10: both cover it, list order picks 0.5.
        let segments = compute_segments(50.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(10.0, 50.0, 0.5)]);
    }

    #[test]
    fn test_speed_change_alone_applies_to_whole_source_from_zero() {
        let edits = vec![EditOperation::speed_change(0.0, 10.0, 2.0)];
        let segments = compute_segments(30.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 30.0, 2.0)]);
    }

    #[test]
    fn test_trim_takes_precedence_over_everything() {
        let edits = vec![
            EditOperation::cut(0.0, 5.0),
            EditOperation::split(3.0),
            EditOperation::trim(12.0, 18.0),
            EditOperation::speed_change(0.0, 100.0, 2.0),
        ];
        let plan = plan(100.0, &edits).unwrap();
        assert_eq!(plan.mode, PlanMode::Trim);
        assert_eq!(spans(&plan.segments), vec![(12.0, 18.0, 1.0)]);
    }

    #[test]
    fn test_earliest_trim_wins() {
        let edits = vec![EditOperation::trim(40.0, 50.0), EditOperation::trim(5.0, 8.0)];
        let segments = compute_segments(100.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(5.0, 8.0, 1.0)]);
    }

    #[test]
    fn test_trim_is_clamped_to_source() {
        let segments = compute_segments(20.0, &[EditOperation::trim(15.0, 90.0)]).unwrap();
        assert_eq!(spans(&segments), vec![(15.0, 20.0, 1.0)]);

        let err = compute_segments(20.0, &[EditOperation::trim(25.0, 30.0)]).unwrap_err();
        assert!(matches!(err, JimakuError::Planning { .. }));
    }

    #[test]
    fn test_split_ignores_cuts_and_dedups_points() {
        let edits = vec![
            EditOperation::split(30.0),
            EditOperation::cut(40.0, 50.0),
            EditOperation::split(10.0),
            EditOperation::split(30.0),
        ];
        let plan = plan(60.0, &edits).unwrap();
        assert!(plan.is_standalone_parts());
        assert_eq!(
            spans(&plan.segments),
            vec![(0.0, 10.0, 1.0), (10.0, 30.0, 1.0), (30.0, 60.0, 1.0)]
        );
    }

    #[test]
    fn test_split_points_on_or_outside_bounds_are_ignored() {
        let edits = vec![
            EditOperation::split(0.0),
            EditOperation::split(60.0),
            EditOperation::split(75.0),
        ];
        let segments = compute_segments(60.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 60.0, 1.0)]);
    }

    #[test]
    fn test_cuts_at_edges_emit_no_empty_segments() {
        let edits = vec![EditOperation::cut(0.0, 5.0), EditOperation::cut(95.0, 100.0)];
        let segments = compute_segments(100.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(5.0, 95.0, 1.0)]);
    }

    #[test]
    fn test_overlapping_cuts_are_removed_once() {
        let edits = vec![EditOperation::cut(20.0, 40.0), EditOperation::cut(10.0, 30.0)];
        let segments = compute_segments(100.0, &edits).unwrap();
        assert_eq!(
            spans(&segments),
            vec![(0.0, 10.0, 1.0), (40.0, 100.0, 1.0)]
        );
    }

    #[test]
    fn test_zero_length_cut_is_ignored() {
        let edits = vec![EditOperation::cut(10.0, 10.0)];
        let segments = compute_segments(20.0, &edits).unwrap();
        assert_eq!(spans(&segments), vec![(0.0, 20.0, 1.0)]);
    }

    #[test]
    fn test_cut_covering_everything_is_an_error() {
        let err = compute_segments(30.0, &[EditOperation::cut(0.0, 30.0)]).unwrap_err();
        assert!(matches!(err, JimakuError::Planning { .. }));
        assert!(err.to_string().contains("nothing left to export"));
    }

    #[test]
    fn test_invalid_inputs_are_planning_errors() {
        assert!(matches!(
            compute_segments(0.0, &[]),
            Err(JimakuError::Planning { .. })
        ));
        assert!(matches!(
            compute_segments(f64::NAN, &[]),
            Err(JimakuError::Planning { .. })
        ));
        assert!(matches!(
            compute_segments(10.0, &[EditOperation::cut(5.0, 2.0)]),
            Err(JimakuError::Planning { .. })
        ));
    }

    #[test]
    fn test_output_duration_sums_speed_adjusted_segments() {
        let edits = vec![EditOperation::speed_change(0.0, 5.0, 2.0)];
        let plan = plan(10.0, &edits).unwrap();
        assert!((plan.output_duration_secs() - 5.0).abs() < 1e-9);
    }
}
