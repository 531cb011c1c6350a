//! Jimaku Project Model
//!
//! Defines the core data contracts for Jimaku:
//! - **Cues:** Timed overlay text with position, size, and color
//! - **Edits:** Timeline operations (cut, trim, split, speed change)
//! - **Segments:** Computed output ranges with a per-segment speed factor
//! - **Edit lists:** The on-disk bundle of cues and edits fed to the CLI
//!
//! All times are `f64` seconds from the start of the source media. Values are
//! plain snapshots; nothing here notifies or mutates behind the caller's back.

pub mod cue;
pub mod edit;
pub mod edit_list;
pub mod segment;

pub use cue::*;
pub use edit::*;
pub use edit_list::*;
pub use segment::*;
