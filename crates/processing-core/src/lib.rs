//! Jimaku Processing Core
//!
//! Turns the source duration and a list of edit operations into the ordered,
//! non-overlapping output segments the render engine encodes:
//! - **Trim:** keep a single range, ignoring every other edit
//! - **Split:** break the source into standalone parts at each split point
//! - **Cut / Speed change:** sweep the timeline, skipping cut ranges and
//!   assigning each surviving segment one speed factor
//!
//! Pure computation: no I/O and no process spawning.

pub mod segment_planner;

pub use segment_planner::{compute_segments, plan, PlanMode, SegmentPlan};
