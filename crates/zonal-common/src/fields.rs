//! Recognized attribute keys and region identifiers.
//!
//! The statistic field name is shared by the overlay engine, the exporter
//! and whatever consumes the exported table, so both defaults live here and
//! nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default attribute key the zonal maximum is written under.
pub const DEFAULT_STATISTIC_FIELD: &str = "OUT_max";

/// Default attribute key holding the region identifier.
pub const DEFAULT_IDENTIFIER_FIELD: &str = "code_commu";

/// The set of attribute keys the pipeline reads or writes by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Attribute holding the stable region identifier.
    pub identifier: String,
    /// Attribute the computed statistic is written to.
    pub statistic: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER_FIELD.to_string(),
            statistic: DEFAULT_STATISTIC_FIELD.to_string(),
        }
    }
}

impl FieldNames {
    pub fn new(identifier: impl Into<String>, statistic: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            statistic: statistic.into(),
        }
    }

    /// Both names must be non-empty and distinct.
    pub fn validate(&self) -> Result<(), String> {
        if self.identifier.trim().is_empty() {
            return Err("identifier field name must not be empty".to_string());
        }
        if self.statistic.trim().is_empty() {
            return Err("statistic field name must not be empty".to_string());
        }
        if self.identifier == self.statistic {
            return Err(format!(
                "identifier and statistic fields must differ (both '{}')",
                self.identifier
            ));
        }
        Ok(())
    }
}

/// Stable identifier of a polygon region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionId {
    Integer(i64),
    Text(String),
}

impl From<i64> for RegionId {
    fn from(id: i64) -> Self {
        RegionId::Integer(id)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        RegionId::Text(id.to_string())
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        RegionId::Text(id)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Integer(id) => write!(f, "{}", id),
            RegionId::Text(id) => f.write_str(id),
        }
    }
}
