use jimaku_processing_core::segment_planner::{compute_segments, plan, PlanMode};
use jimaku_project_model::edit::EditOperation;
use jimaku_project_model::segment::OutputSegment;
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-4;

/// Length of the union of `intervals` clipped to `[0, duration]`.
fn union_length(mut intervals: Vec<(f64, f64)>, duration: f64) -> f64 {
    intervals.retain(|(s, e)| e > s);
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut total = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for (s, e) in intervals {
        let (s, e) = (s.clamp(0.0, duration), e.clamp(0.0, duration));
        match current {
            Some((cs, ce)) if s <= ce => current = Some((cs, ce.max(e))),
            Some((cs, ce)) => {
                total += ce - cs;
                current = Some((s, e));
            }
            None => current = Some((s, e)),
        }
    }
    if let Some((cs, ce)) = current {
        total += ce - cs;
    }
    total
}

fn assert_sorted_disjoint(segments: &[OutputSegment], duration: f64) {
    for seg in segments {
        assert!(seg.start_secs >= 0.0);
        assert!(seg.start_secs < seg.end_secs);
        assert!(seg.end_secs <= duration);
        assert!(seg.speed_ratio > 0.0);
    }
    for pair in segments.windows(2) {
        assert!(pair[0].end_secs <= pair[1].start_secs);
    }
}

fn cut_strategy(duration: f64) -> impl Strategy<Value = (f64, f64)> {
    (0.0..duration, 0.0..duration).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

proptest! {
    #[test]
    fn cut_only_plans_cover_source_minus_cuts(
        (duration, cuts) in (1.0f64..500.0).prop_flat_map(|d| {
            (Just(d), prop::collection::vec(cut_strategy(d), 0..8))
        })
    ) {
        let edits: Vec<EditOperation> =
            cuts.iter().map(|&(s, e)| EditOperation::cut(s, e)).collect();
        let removed = union_length(cuts.clone(), duration);

        match compute_segments(duration, &edits) {
            Ok(segments) => {
                assert_sorted_disjoint(&segments, duration);
                let kept: f64 = segments.iter().map(|s| s.duration_secs()).sum();
                prop_assert!((kept - (duration - removed)).abs() < TOLERANCE);

                // No kept segment overlaps any cut.
                for seg in &segments {
                    for &(cs, ce) in &cuts {
                        let overlap = seg.end_secs.min(ce) - seg.start_secs.max(cs);
                        prop_assert!(overlap <= TOLERANCE);
                    }
                }
            }
            Err(_) => prop_assert!(duration - removed < TOLERANCE),
        }
    }

    #[test]
    fn trim_always_yields_exactly_the_trim(
        (duration, trim, others) in (1.0f64..500.0).prop_flat_map(|d| {
            (
                Just(d),
                cut_strategy(d).prop_filter("non-empty trim", |(s, e)| e - s > 0.01),
                prop::collection::vec(cut_strategy(d), 0..6),
            )
        })
    ) {
        let mut edits: Vec<EditOperation> = others
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| match i % 3 {
                0 => EditOperation::cut(s, e),
                1 => EditOperation::split(s),
                _ => EditOperation::speed_change(s, e, 2.0),
            })
            .collect();
        edits.insert(edits.len() / 2, EditOperation::trim(trim.0, trim.1));

        let plan = plan(duration, &edits).unwrap();
        prop_assert_eq!(plan.mode, PlanMode::Trim);
        prop_assert_eq!(plan.segments, vec![OutputSegment::new(trim.0, trim.1, 1.0)]);
    }

    #[test]
    fn split_count_is_distinct_interior_points_plus_one(
        (duration, points) in (1.0f64..500.0).prop_flat_map(|d| {
            (Just(d), prop::collection::vec(0.0..d, 1..8))
        })
    ) {
        let mut edits: Vec<EditOperation> =
            points.iter().map(|&p| EditOperation::split(p)).collect();
        edits.push(EditOperation::cut(0.0, duration / 2.0));

        let mut distinct: Vec<f64> = points.iter().copied().filter(|&p| p > 0.0).collect();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();

        let segments = compute_segments(duration, &edits).unwrap();
        prop_assert_eq!(segments.len(), distinct.len() + 1);
        prop_assert_eq!(segments.first().unwrap().start_secs, 0.0);
        prop_assert_eq!(segments.last().unwrap().end_secs, duration);
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end_secs, pair[1].start_secs);
        }
    }

    #[test]
    fn planning_is_idempotent(
        (duration, cuts, speeds) in (1.0f64..500.0).prop_flat_map(|d| {
            (
                Just(d),
                prop::collection::vec(cut_strategy(d), 0..5),
                prop::collection::vec((cut_strategy(d), 0.25f64..4.0), 0..4),
            )
        })
    ) {
        let mut edits: Vec<EditOperation> =
            cuts.iter().map(|&(s, e)| EditOperation::cut(s, e)).collect();
        edits.extend(
            speeds
                .iter()
                .map(|&((s, e), r)| EditOperation::speed_change(s, e, r)),
        );

        let first = compute_segments(duration, &edits);
        let second = compute_segments(duration, &edits);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.len(), b.len());
                for (x, y) in a.iter().zip(b.iter()) {
                    prop_assert_eq!(x.start_secs.to_bits(), y.start_secs.to_bits());
                    prop_assert_eq!(x.end_secs.to_bits(), y.end_secs.to_bits());
                    prop_assert_eq!(x.speed_ratio.to_bits(), y.speed_ratio.to_bits());
                }
            }
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "planning is not deterministic"),
        }
    }
}

#[test]
fn documented_cut_and_speed_scenario() {
    let edits = vec![
        EditOperation::cut(10.0, 20.0),
        EditOperation::speed_change(30.0, 40.0, 2.0),
    ];
    let segments = compute_segments(100.0, &edits).unwrap();
    assert_eq!(
        segments,
        vec![
            OutputSegment::new(0.0, 10.0, 1.0),
            OutputSegment::new(20.0, 100.0, 1.0),
        ]
    );
}
