use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum width of the sequence segment.
pub const SEQUENCE_WIDTH: usize = 4;

/// Human-readable document number, `<PREFIX>-<PERIOD>-<SEQUENCE>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Third hyphen-delimited field read as an integer; 0 when absent or not numeric.
    pub fn sequence(&self) -> u32 {
        sequence_of(&self.0)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn sequence_of(reference: &str) -> u32 {
    reference
        .split('-')
        .nth(2)
        .and_then(|segment| segment.parse::<u32>().ok())
        .unwrap_or(0)
}

pub fn format_sequence(prefix: &str, sequence: u32) -> Reference {
    Reference(format!("{prefix}{sequence:0width$}", width = SEQUENCE_WIDTH))
}

/// Ordering used to pick the "last" reference of a period: longer strings
/// rank higher, then lexicographic, so `10000` still sorts above `9999`.
pub fn compare_references(left: &str, right: &str) -> Ordering {
    left.len()
        .cmp(&right.len())
        .then_with(|| left.cmp(right))
}
