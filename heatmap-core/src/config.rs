//! Configuration file support for the heatmap tools
//!
//! Loads run configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.heatmaprc.json` in the working directory
//! 3. `heatmap.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::groups::RecipeFallback;
use crate::threshold::{Threshold, ThresholdPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "Data_Raw.xlsx";
pub const DEFAULT_SENSORY_PATH: &str = "Sensory_Note.xlsx";
pub const DEFAULT_STATIC_OUTPUT: &str = "tobacco_heatmap_static.png";
pub const DEFAULT_STANDALONE_OUTPUT: &str = "tobacco_heatmap_standalone.html";
pub const DEFAULT_WIDTH: u32 = 2400;
pub const DEFAULT_HEIGHT: u32 = 1400;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;

/// Heatmap configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatmapConfig {
    /// Concentration matrix workbook (default: Data_Raw.xlsx)
    #[serde(default)]
    pub data: Option<PathBuf>,

    /// Sensory classification workbook (default: Sensory_Note.xlsx)
    #[serde(default)]
    pub sensory: Option<PathBuf>,

    /// Static raster settings
    #[serde(default, rename = "static")]
    pub static_image: Option<StaticConfig>,

    /// Standalone HTML document settings
    #[serde(default)]
    pub standalone: Option<StandaloneConfig>,

    /// Dashboard server settings
    #[serde(default)]
    pub dashboard: Option<DashboardConfig>,

    /// What to do with recipes listed in no group (default: drop)
    #[serde(default)]
    pub recipe_fallback: Option<RecipeFallback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// Cutoff (default: 0.45)
    pub threshold: Option<f64>,
    /// Comparison (default: exclusive)
    pub policy: Option<ThresholdPolicy>,
    pub output: Option<PathBuf>,
    /// Image width in pixels (default: 2400)
    pub width: Option<u32>,
    /// Image height in pixels (default: 1400)
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandaloneConfig {
    /// Initial cutoff (default: 0.4)
    pub threshold: Option<f64>,
    /// Comparison (default: inclusive)
    pub policy: Option<ThresholdPolicy>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Initial cutoff (default: 0.4)
    pub threshold: Option<f64>,
    /// Comparison (default: inclusive)
    pub policy: Option<ThresholdPolicy>,
    /// Bind address (default: 127.0.0.1)
    pub host: Option<String>,
    /// Bind port (default: 8050)
    pub port: Option<u16>,
}

/// Resolved configuration with every default filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub data: PathBuf,
    pub sensory: PathBuf,
    pub static_threshold: Threshold,
    pub static_output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub standalone_threshold: Threshold,
    pub standalone_output: PathBuf,
    pub dashboard_threshold: Threshold,
    pub host: String,
    pub port: u16,
    pub recipe_fallback: RecipeFallback,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn check_threshold(section: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        Threshold::check_cutoff(v).with_context(|| format!("invalid {}.threshold", section))?;
    }
    Ok(())
}

fn pick(cutoff: Option<f64>, policy: Option<ThresholdPolicy>, default: Threshold) -> Threshold {
    Threshold {
        cutoff: cutoff.unwrap_or(default.cutoff),
        policy: policy.unwrap_or(default.policy),
    }
}

impl HeatmapConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref s) = self.static_image {
            check_threshold("static", s.threshold)?;
            for (name, val) in [("width", s.width), ("height", s.height)] {
                if val == Some(0) {
                    anyhow::bail!("static.{} must be positive", name);
                }
            }
        }

        if let Some(ref s) = self.standalone {
            check_threshold("standalone", s.threshold)?;
        }

        if let Some(ref d) = self.dashboard {
            check_threshold("dashboard", d.threshold)?;
            if d.port == Some(0) {
                anyhow::bail!("dashboard.port must be non-zero");
            }
            if let Some(ref host) = d.host {
                if host.trim().is_empty() {
                    anyhow::bail!("dashboard.host must not be empty");
                }
            }
        }

        Ok(())
    }

    /// Resolve config into the form the commands consume
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let static_image = self.static_image.clone().unwrap_or_default();
        let standalone = self.standalone.clone().unwrap_or_default();
        let dashboard = self.dashboard.clone().unwrap_or_default();

        Ok(ResolvedConfig {
            data: self
                .data
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            sensory: self
                .sensory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SENSORY_PATH)),
            static_threshold: pick(
                static_image.threshold,
                static_image.policy,
                Threshold::STATIC_DEFAULT,
            ),
            static_output: static_image
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_OUTPUT)),
            width: static_image.width.unwrap_or(DEFAULT_WIDTH),
            height: static_image.height.unwrap_or(DEFAULT_HEIGHT),
            standalone_threshold: pick(
                standalone.threshold,
                standalone.policy,
                Threshold::INTERACTIVE_DEFAULT,
            ),
            standalone_output: standalone
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STANDALONE_OUTPUT)),
            dashboard_threshold: pick(
                dashboard.threshold,
                dashboard.policy,
                Threshold::INTERACTIVE_DEFAULT,
            ),
            host: dashboard.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: dashboard.port.unwrap_or(DEFAULT_PORT),
            recipe_fallback: self.recipe_fallback.unwrap_or_default(),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        HeatmapConfig::default().resolve()
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.heatmaprc.json`
/// 2. `heatmap.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(dir: &Path) -> Result<Option<(HeatmapConfig, PathBuf)>> {
    for name in [".heatmaprc.json", "heatmap.config.json"] {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<HeatmapConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: HeatmapConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `dir`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(dir: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (HeatmapConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
