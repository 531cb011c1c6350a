//! Timed overlay cues.
//!
//! A cue is one piece of text burned into the video between two source
//! timestamps, anchored at one of five fixed screen positions.

use serde::{Deserialize, Serialize};

use jimaku_common::timecode::format_display_time;

use crate::edit_list::ModelError;

/// Logical font size used when a cue does not specify one.
pub const DEFAULT_FONT_SIZE: f64 = 48.0;

/// Screen anchor for an overlay cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuePosition {
    #[default]
    BottomCenter,
    TopCenter,
    Center,
    BottomLeft,
    BottomRight,
}

impl CuePosition {
    /// Every position, in style-table order.
    pub const ALL: [CuePosition; 5] = [
        CuePosition::BottomCenter,
        CuePosition::TopCenter,
        CuePosition::Center,
        CuePosition::BottomLeft,
        CuePosition::BottomRight,
    ];

    /// Stable identifier, also used as the overlay style name.
    pub fn name(self) -> &'static str {
        match self {
            CuePosition::BottomCenter => "BottomCenter",
            CuePosition::TopCenter => "TopCenter",
            CuePosition::Center => "Center",
            CuePosition::BottomLeft => "BottomLeft",
            CuePosition::BottomRight => "BottomRight",
        }
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::RED
    }
}

/// One timed overlay text entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedCue {
    /// Text to display. May be empty.
    #[serde(default)]
    pub text: String,

    /// Start time in seconds.
    pub start_secs: f64,

    /// End time in seconds (exclusive, must be greater than start).
    pub end_secs: f64,

    /// Screen anchor.
    #[serde(default)]
    pub position: CuePosition,

    /// Logical font size in display units. The rendered overlay uses twice this value.
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Text color.
    #[serde(default)]
    pub color: Rgb,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl TimedCue {
    /// Create a cue with default position, size, and color.
    pub fn new(text: impl Into<String>, start_secs: f64, end_secs: f64) -> Self {
        Self {
            text: text.into(),
            start_secs,
            end_secs,
            position: CuePosition::default(),
            font_size: DEFAULT_FONT_SIZE,
            color: Rgb::default(),
        }
    }

    pub fn with_position(mut self, position: CuePosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// How long the cue stays on screen.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn start_formatted(&self) -> String {
        format_display_time(self.start_secs)
    }

    pub fn end_formatted(&self) -> String {
        format_display_time(self.end_secs)
    }

    /// Check the cue invariants: finite, non-negative times with `end > start`
    /// and a positive font size.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.start_secs.is_finite() || !self.end_secs.is_finite() {
            return Err(ModelError::validation(format!(
                "cue times must be finite (start={}, end={})",
                self.start_secs, self.end_secs
            )));
        }
        if self.start_secs < 0.0 {
            return Err(ModelError::validation(format!(
                "cue starts before zero ({:.3}s)",
                self.start_secs
            )));
        }
        if self.end_secs <= self.start_secs {
            return Err(ModelError::validation(format!(
                "cue must end after it starts ({:.3}s .. {:.3}s)",
                self.start_secs, self.end_secs
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ModelError::validation(format!(
                "cue font size must be positive (got {})",
                self.font_size
            )));
        }
        Ok(())
    }
}
