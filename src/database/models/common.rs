//! Common shared models.

use serde::{Deserialize, Serialize};

/// A url button parsed from a greeting template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    /// Button text
    pub label: String,
    /// URL to open when clicked
    pub url: String,
    /// Put this button on the same row as the previous one
    #[serde(default)]
    pub same_row: bool,
}

impl ButtonSpec {
    /// Create a new button that starts its own row.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            same_row: false,
        }
    }

    /// Mark this button as sharing the previous button's row.
    #[must_use]
    pub fn same_row(mut self) -> Self {
        self.same_row = true;
        self
    }
}
