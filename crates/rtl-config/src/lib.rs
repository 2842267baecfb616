//! Claude RTL configuration system
//!
//! Settings are read from `rtl.toml` and can be overridden per process with
//! environment variables. Every section falls back to defaults, so an empty
//! or missing file yields a working configuration.

use rtl_text::Detection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RtlConfig {
    /// Class names written to the document
    pub marker: MarkerConfig,
    /// Which elements are observed
    pub observe: ObserveConfig,
    /// How element text is classified
    pub detection: DetectionConfig,
    /// Enabled-flag persistence
    pub storage: StorageConfig,
}

/// Marker class names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Class toggled on each element judged RTL
    pub class_name: String,
    /// Class toggled on `<body>` while the feature is enabled
    pub global_class: String,
}

/// Observation wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    /// Element the bootstrap observer watches (falls back to the document root)
    pub bootstrap_tag: String,
    /// Element whose appearance hands off to continuous observation
    pub target_tag: String,
    /// Attribute that marks an editable input region when set to "true"
    pub editable_attribute: String,
}

/// Text classification
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectionConfig {
    pub mode: Detection,
}

/// Enabled-flag storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Value used when nothing has been stored yet
    pub default_enabled: bool,
    /// JSON file backing the flag; in-memory storage when unset
    pub path: Option<PathBuf>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            class_name: "claude-rtl".to_string(),
            global_class: "claude-rtl-enabled".to_string(),
        }
    }
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            bootstrap_tag: "body".to_string(),
            target_tag: "main".to_string(),
            editable_attribute: "contenteditable".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_enabled: true,
            path: None,
        }
    }
}

impl RtlConfig {
    /// Load configuration from a TOML file
    ///
    /// # Returns
    /// * `Ok(RtlConfig)` - Successfully loaded configuration
    /// * `Err(String)` - Error message if loading failed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Load `rtl.toml` from the current directory, or defaults if it is absent
    pub fn load_or_default() -> Self {
        Self::load_from_file("rtl.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key/value source. `merge_with_env` is this
    /// with the process environment.
    pub fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Marker settings
        if let Some(class) = lookup("RTL_MARKER_CLASS").filter(|v| !v.trim().is_empty()) {
            self.marker.class_name = class.trim().to_string();
        }
        if let Some(class) = lookup("RTL_GLOBAL_CLASS").filter(|v| !v.trim().is_empty()) {
            self.marker.global_class = class.trim().to_string();
        }

        // Observe settings
        if let Some(tag) = lookup("RTL_BOOTSTRAP_TAG").filter(|v| !v.trim().is_empty()) {
            self.observe.bootstrap_tag = tag.trim().to_ascii_lowercase();
        }
        if let Some(tag) = lookup("RTL_TARGET_TAG").filter(|v| !v.trim().is_empty()) {
            self.observe.target_tag = tag.trim().to_ascii_lowercase();
        }

        // Detection settings
        if let Some(mode) = lookup("RTL_DETECTION") {
            match mode.trim().to_ascii_lowercase().as_str() {
                "any_rtl" | "any" => self.detection.mode = Detection::AnyRtl,
                "first_strong" | "first" => self.detection.mode = Detection::FirstStrong,
                _ => {}
            }
        }

        // Storage settings
        if let Some(val) = lookup("RTL_DEFAULT_ENABLED") {
            self.storage.default_enabled = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Some(path) = lookup("RTL_STORAGE_PATH").filter(|v| !v.trim().is_empty()) {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rtl.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
