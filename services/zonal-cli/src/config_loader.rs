//! Run configuration loader for the zonal CLI
//!
//! Loads and validates a YAML run file naming the input grid, the region
//! layer, the outputs and the engine settings. Supports environment
//! variable substitution using ${VAR} and ${VAR:-default} syntax.
//!
//! ```yaml
//! grid: ${DATA_DIR:-./data}/mmi_mean.flt
//! grid_crs: 4326
//! regions: ${DATA_DIR:-./data}/communes.geojson
//! output:
//!   csv: ./out/communes.csv
//!   geojson: ./out/communes_max.geojson
//! engine:
//!   target_crs: 4326
//!   assume_crs: 4326
//! logging:
//!   level: info
//!   format: json
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use zonal_common::CrsCode;
use zonal_stats::ZonalConfig;

// ============================================================================
// Run Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// `.flt` or `.hdr` path of the ESRI float grid
    pub grid: PathBuf,
    /// CRS of the grid; the float grid format does not record one
    #[serde(default)]
    pub grid_crs: Option<CrsCode>,
    /// GeoJSON FeatureCollection of regions
    pub regions: PathBuf,
    pub output: OutputConfig,
    #[serde(default = "ZonalConfig::from_env")]
    pub engine: ZonalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Delimited table of identifier and statistic
    pub csv: PathBuf,
    /// Optional region layer with the statistic attribute added
    #[serde(default)]
    pub geojson: Option<PathBuf>,
    /// Columns to export; defaults to identifier and statistic
    #[serde(default)]
    pub columns: Vec<String>,
    /// Optional JSON run summary
    #[serde(default)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse a run file with environment variable substitution
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read run config from {:?}", path.as_ref()))?;

    let config = parse_run_config(&content)
        .with_context(|| format!("Invalid run config {:?}", path.as_ref()))?;

    Ok(config)
}

/// Parse run file contents (after environment substitution) and validate
pub fn parse_run_config(content: &str) -> Result<RunConfig> {
    let expanded = expand_env_vars(content)?;

    let config: RunConfig =
        serde_yaml::from_str(&expanded).with_context(|| "Failed to parse run config YAML")?;

    validate_run_config(&config)?;

    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            let value = resolve_var_expr(&var_expr)?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

pub fn validate_run_config(config: &RunConfig) -> Result<()> {
    anyhow::ensure!(
        !config.grid.as_os_str().is_empty(),
        "Grid path cannot be empty"
    );
    anyhow::ensure!(
        !config.regions.as_os_str().is_empty(),
        "Regions path cannot be empty"
    );
    anyhow::ensure!(
        !config.output.csv.as_os_str().is_empty(),
        "CSV output path cannot be empty"
    );

    config
        .engine
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid engine settings: {}", e))?;

    let fields = &config.engine.fields;
    for column in &config.output.columns {
        anyhow::ensure!(
            *column == fields.identifier
                || *column == fields.statistic
                || config.engine.carry_fields.contains(column)
                || zonal_stats::is_geometry_field(column),
            "Output column {} is neither the identifier, the statistic nor a carried field",
            column
        );
    }

    // Validate logging level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    anyhow::ensure!(
        valid_levels.contains(&config.logging.level.as_str()),
        "Invalid log level: {}. Must be one of: {:?}",
        config.logging.level,
        valid_levels
    );

    // Validate logging format
    let valid_formats = ["json", "pretty"];
    anyhow::ensure!(
        valid_formats.contains(&config.logging.format.as_str()),
        "Invalid log format: {}. Must be one of: {:?}",
        config.logging.format,
        valid_formats
    );

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
