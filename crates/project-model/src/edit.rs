//! Timeline edit operations.

use serde::{Deserialize, Serialize};

use jimaku_common::timecode::format_display_time;

use crate::edit_list::ModelError;

/// Kind of timeline transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Remove `[start, end)` from the output.
    Cut,
    /// Keep only `[start, end)`.
    Trim,
    /// Break the output into standalone files at `start`.
    Split,
    /// Play `[start, end]` at `speed_ratio`.
    SpeedChange,
}

impl EditKind {
    /// Human-readable label for listings.
    pub fn label(self) -> &'static str {
        match self {
            EditKind::Cut => "Cut",
            EditKind::Trim => "Trim",
            EditKind::Split => "Split",
            EditKind::SpeedChange => "Speed change",
        }
    }
}

/// One timeline edit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    pub kind: EditKind,

    /// Start time in seconds. For [`EditKind::Split`] this is the split point.
    pub start_secs: f64,

    /// End time in seconds.
    pub end_secs: f64,

    /// Playback rate multiplier. Only consumed for [`EditKind::SpeedChange`].
    #[serde(default = "default_speed_ratio")]
    pub speed_ratio: f64,

    /// Display-only label.
    #[serde(default)]
    pub label: String,
}

fn default_speed_ratio() -> f64 {
    1.0
}

impl EditOperation {
    pub fn new(kind: EditKind, start_secs: f64, end_secs: f64) -> Self {
        Self {
            kind,
            start_secs,
            end_secs,
            speed_ratio: 1.0,
            label: String::new(),
        }
    }

    pub fn cut(start_secs: f64, end_secs: f64) -> Self {
        Self::new(EditKind::Cut, start_secs, end_secs)
    }

    pub fn trim(start_secs: f64, end_secs: f64) -> Self {
        Self::new(EditKind::Trim, start_secs, end_secs)
    }

    pub fn split(at_secs: f64) -> Self {
        Self::new(EditKind::Split, at_secs, at_secs)
    }

    pub fn speed_change(start_secs: f64, end_secs: f64, speed_ratio: f64) -> Self {
        Self {
            speed_ratio,
            ..Self::new(EditKind::SpeedChange, start_secs, end_secs)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether `t` falls inside the closed interval `[start, end]`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_secs <= t && t <= self.end_secs
    }

    /// Speed formatted for listings, e.g. `"2.0x"`.
    pub fn speed_label(&self) -> String {
        format!("{:.1}x", self.speed_ratio)
    }

    pub fn start_formatted(&self) -> String {
        format_display_time(self.start_secs)
    }

    pub fn end_formatted(&self) -> String {
        format_display_time(self.end_secs)
    }

    /// Check the edit invariants: finite, non-negative times with
    /// `end >= start`, and a positive finite speed ratio.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.start_secs.is_finite() || !self.end_secs.is_finite() {
            return Err(ModelError::validation(format!(
                "{} times must be finite (start={}, end={})",
                self.kind.label(),
                self.start_secs,
                self.end_secs
            )));
        }
        if self.start_secs < 0.0 {
            return Err(ModelError::validation(format!(
                "{} starts before zero ({:.3}s)",
                self.kind.label(),
                self.start_secs
            )));
        }
        if self.end_secs < self.start_secs {
            return Err(ModelError::validation(format!(
                "{} ends before it starts ({:.3}s .. {:.3}s)",
                self.kind.label(),
                self.start_secs,
                self.end_secs
            )));
        }
        if !self.speed_ratio.is_finite() || self.speed_ratio <= 0.0 {
            return Err(ModelError::validation(format!(
                "{} speed ratio must be positive (got {})",
                self.kind.label(),
                self.speed_ratio
            )));
        }
        Ok(())
    }
}
