//! Edit list files.
//!
//! An edit list bundles the overlay cues and timeline edits for one source
//! file. It is the input format of the `jimaku` command-line tool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cue::TimedCue;
use crate::edit::EditOperation;

/// Current edit list schema version.
pub const EDIT_LIST_VERSION: &str = "1.0";

/// Cues and edits for a single source file (`*.jimaku.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditList {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Overlay cues to burn in.
    #[serde(default)]
    pub cues: Vec<TimedCue>,

    /// Timeline edits.
    #[serde(default)]
    pub edits: Vec<EditOperation>,
}

fn default_version() -> String {
    EDIT_LIST_VERSION.to_string()
}

impl EditList {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            cues: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// Load an edit list from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the edit list as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ModelError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validate every cue and edit, collecting one message per violation.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        for (i, cue) in self.cues.iter().enumerate() {
            if let Err(e) = cue.validate() {
                errors.push(format!("cue #{}: {e}", i + 1));
            }
        }
        for (i, edit) in self.edits.iter().enumerate() {
            if let Err(e) = edit.validate() {
                errors.push(format!("edit #{}: {e}", i + 1));
            }
        }

        errors
    }
}

impl Default for EditList {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when working with model values and edit lists.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{message}")]
    ValidationError { message: String },
}

impl ModelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError {
            message: msg.into(),
        }
    }
}
