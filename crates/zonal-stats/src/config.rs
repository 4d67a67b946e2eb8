//! Configuration for the zonal statistics engine.

use serde::{Deserialize, Serialize};
use zonal_common::{CrsCode, FieldNames};

/// Configuration for normalization, overlay and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalConfig {
    /// Identifier and statistic attribute names.
    pub fields: FieldNames,

    /// CRS both layers are normalized into before the overlay.
    pub target_crs: CrsCode,

    /// CRS declared on inputs that carry none. When unset, an undeclared
    /// input is an error.
    pub assume_crs: Option<CrsCode>,

    /// Compute regions on the rayon thread pool.
    pub parallel: bool,

    /// Region attributes copied into the result table as extra columns.
    pub carry_fields: Vec<String>,

    /// Attach a WKT `geometry` column to the result table. The exporter
    /// never writes it out; it is there for in-memory consumers.
    pub include_geometry: bool,
}

impl Default for ZonalConfig {
    fn default() -> Self {
        Self {
            fields: FieldNames::default(),
            target_crs: CrsCode::WGS84,
            assume_crs: None,
            parallel: true,
            carry_fields: Vec::new(),
            include_geometry: false,
        }
    }
}

impl ZonalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ZONAL_STAT_FIELD") {
            config.fields.statistic = val;
        }

        if let Ok(val) = std::env::var("ZONAL_ID_FIELD") {
            config.fields.identifier = val;
        }

        if let Ok(val) = std::env::var("ZONAL_TARGET_EPSG") {
            if let Some(code) = env_crs("ZONAL_TARGET_EPSG", &val) {
                config.target_crs = code;
            }
        }

        if let Ok(val) = std::env::var("ZONAL_ASSUME_EPSG") {
            config.assume_crs = env_crs("ZONAL_ASSUME_EPSG", &val);
        }

        if let Ok(val) = std::env::var("ZONAL_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.fields.validate()?;

        if self.target_crs.code() == 0 {
            return Err("target_crs must be a positive EPSG code".to_string());
        }

        for name in &self.carry_fields {
            if name.trim().is_empty() {
                return Err("carry_fields entries must not be empty".to_string());
            }
            if *name == self.fields.identifier || *name == self.fields.statistic {
                return Err(format!(
                    "carry_fields must not repeat the identifier or statistic field ('{}')",
                    name
                ));
            }
        }

        Ok(())
    }
}

/// Parse a CRS environment value, warning when it is unusable.
fn env_crs(var: &str, raw: &str) -> Option<CrsCode> {
    match CrsCode::parse(raw) {
        Ok(code) => Some(code),
        Err(e) => {
            tracing::warn!(
                var = var,
                value = %raw,
                error = %e,
                "Ignoring unparseable CRS setting"
            );
            None
        }
    }
}
