//! Configuration loading and config file resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User TOML config file
//! 4. System TOML config file (Linux only)
//! 5. Built-in defaults (fallback)
//!
//! Every field has a built-in default, so a partial (or missing) TOML file
//! still yields a runnable configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DIGIT_ENSEMBLE_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "digit-ensemble";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Sentinel label the shipped classifiers emit for "none of my digits"
pub const DEFAULT_REJECTION_LABEL: &str = "이외";

/// Complete ensemble configuration
///
/// Models are held in a `BTreeMap`, so iteration is always in sorted key
/// order. That order is the fixed model order fusion uses to break ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Minimum time between two capture fusions (milliseconds)
    pub throttle_interval_ms: u64,

    /// Cadence at which the scheduler offers the capture loop a tick (milliseconds)
    pub tick_interval_ms: u64,

    /// How the mode-selection surface behaves
    pub mode_strategy: ModeStrategy,

    /// Start capture as soon as all models are loaded
    pub auto_start_capture: bool,

    /// Capture device settings
    pub capture: CaptureSettings,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Per-model configuration keyed by model key
    pub models: BTreeMap<String, ModelConfig>,
}

/// Mode-selection strategy
///
/// - `Toggle`: one persistent camera button toggles capture; uploading an
///   image switches to single-image mode and the button switches back.
/// - `Exclusive`: capture and single-image are radio-selected; the camera
///   button only acts while capture mode is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeStrategy {
    #[default]
    Toggle,
    Exclusive,
}

/// Capture device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Mirror frames horizontally
    pub flip: bool,
    /// Frame source (directory replayed by the directory capture device)
    pub source: PathBuf,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            flip: true,
            source: PathBuf::from("frames"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration of one range classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the model descriptor (model.json)
    pub model: PathBuf,

    /// Path to the label metadata (metadata.json)
    pub metadata: PathBuf,

    /// Display string of the covered digit range (e.g. "1~3")
    pub range: String,

    /// Label the model emits when the image is outside its range
    #[serde(default = "default_rejection_label")]
    pub rejection_label: String,

    /// Prediction endpoint serving this model
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_rejection_label() -> String {
    DEFAULT_REJECTION_LABEL.to_string()
}

impl ModelConfig {
    /// Model rooted at `dir` with the conventional file names
    pub fn in_dir(dir: impl AsRef<Path>, range: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join("model.json"),
            metadata: dir.join("metadata.json"),
            range: range.to_string(),
            rejection_label: default_rejection_label(),
            endpoint: None,
        }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("model1".to_string(), ModelConfig::in_dir("3`1", "1~3"));
        models.insert("model2".to_string(), ModelConfig::in_dir("6`4", "4~6"));
        models.insert("model3".to_string(), ModelConfig::in_dir("9`7", "7~9"));

        Self {
            throttle_interval_ms: 10,
            tick_interval_ms: 16,
            mode_strategy: ModeStrategy::default(),
            auto_start_capture: true,
            capture: CaptureSettings::default(),
            logging: LoggingConfig::default(),
            models,
        }
    }
}

impl EnsembleConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Resolve the config file and load it, falling back to built-in defaults
    ///
    /// An explicitly requested file (CLI or environment) must exist; a
    /// discovered file is optional.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_config_path(cli_arg, CONFIG_ENV_VAR) {
            return Self::load(&path);
        }

        match discover_config_file() {
            Some(path) => Self::load(&path),
            None => {
                warn!("No config file found, using built-in defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Check invariants the rest of the system relies on
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(Error::Config("At least one model must be configured".to_string()));
        }

        for (key, model) in &self.models {
            if key.trim().is_empty() {
                return Err(Error::Config("Model key must not be empty".to_string()));
            }
            if model.rejection_label.is_empty() {
                return Err(Error::Config(format!(
                    "Model '{}': rejection_label must not be empty",
                    key
                )));
            }
            if model.range.trim().is_empty() {
                return Err(Error::Config(format!("Model '{}': range must not be empty", key)));
            }
        }

        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(Error::Config(format!(
                "Capture dimensions must be non-zero (got {}x{})",
                self.capture.width, self.capture.height
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Minimum time between two capture fusions
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Scheduler cadence
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Config file named on the command line or through the environment
pub fn explicit_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    match std::env::var(env_var_name) {
        Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => None,
    }
}

/// First existing config file among the platform locations
fn discover_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
