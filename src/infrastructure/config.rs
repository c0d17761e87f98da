use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::application::palette::Theme;
use crate::application::runtime::{DEFAULT_MAX_DEPTH, DEFAULT_WARMUP_DELAY};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RivetConfig {
    /// Discovery roots. Empty means the home directory.
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_warmup_delay_ms")]
    pub warmup_delay_ms: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_warmup_delay_ms() -> u64 {
    u64::try_from(DEFAULT_WARMUP_DELAY.as_millis()).unwrap_or(u64::MAX)
}

fn default_theme() -> String {
    Theme::default().label().to_string()
}

impl Default for RivetConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: default_max_depth(),
            warmup_delay_ms: default_warmup_delay_ms(),
            theme: default_theme(),
        }
    }
}

impl RivetConfig {
    /// Roots with `~` expanded against `home`. Falls back to `home` itself
    /// when no roots are configured.
    pub fn resolved_roots(&self, home: Option<&Path>) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            return home.map(Path::to_path_buf).into_iter().collect();
        }

        self.roots
            .iter()
            .map(|root| root.trim())
            .filter(|root| !root.is_empty())
            .filter_map(|root| expand_home(root, home))
            .collect()
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    /// Unknown labels fall back to the default theme.
    pub fn theme(&self) -> Theme {
        Theme::from_label(&self.theme).unwrap_or_default()
    }
}

fn expand_home(value: &str, home: Option<&Path>) -> Option<PathBuf> {
    if value == "~" {
        return home.map(Path::to_path_buf);
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.map(|home| home.join(rest));
    }
    Some(PathBuf::from(value))
}

fn config_directory() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir() {
        return Some(path.join("rivet"));
    }

    dirs::home_dir().map(|path| path.join(".config").join("rivet"))
}

pub fn config_path() -> Option<PathBuf> {
    config_directory().map(|path| path.join("config.toml"))
}

pub fn load() -> Result<RivetConfig, String> {
    let path = config_path().ok_or_else(|| "cannot resolve config path".to_string())?;
    load_from_path(&path)
}

/// The loaded config, or defaults plus the load error.
pub fn load_or_default() -> (RivetConfig, Option<String>) {
    match load() {
        Ok(config) => (config, None),
        Err(error) => (RivetConfig::default(), Some(error)),
    }
}

pub fn load_from_path(path: &Path) -> Result<RivetConfig, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RivetConfig::default());
        }
        Err(error) => return Err(format!("config read failed: {error}")),
    };

    toml::from_str::<RivetConfig>(&raw).map_err(|error| format!("config parse failed: {error}"))
}
