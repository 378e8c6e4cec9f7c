//! Sort keys and ordering for topology cards
//!
//! Standard keys (`status`, `name`, `type`) are always available; custom
//! keys come from headline properties found on the nodes being shown.

mod engine;
mod labels;

pub use engine::sort_topology;
pub use labels::{derive_sort_labels, STANDARD_SORT_LABELS};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default sort key when nothing is persisted
pub const DEFAULT_SORT_BY: &str = "status";

/// A field the cards can be sorted by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortLabel {
    /// Field key
    pub value: String,
    /// Display name
    pub label: String,
    /// Built-in field rather than one derived from node properties
    pub standard: bool,
}

impl SortLabel {
    pub fn standard(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            standard: true,
        }
    }

    pub fn custom(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            standard: false,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("invalid sort order: {}", other)),
        }
    }
}
