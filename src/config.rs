use serde::Deserialize;
use std::path::{Path, PathBuf};

use tonika::params::{DEFAULT_GAIN, DEFAULT_SLOPE};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(default = "default_slope")]
    pub slope: f32,
    #[serde(default)]
    pub peak_mode: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            gain: default_gain(),
            slope: default_slope(),
            peak_mode: false,
        }
    }
}

fn default_gain() -> f32 { DEFAULT_GAIN }
fn default_slope() -> f32 { DEFAULT_SLOPE }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Auto-detect a config file: tonika.toml in the working directory, then
/// the user's config locations.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("tonika.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("tonika").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("tonika").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.gain, DEFAULT_GAIN);
        assert_eq!(config.analysis.slope, DEFAULT_SLOPE);
        assert!(!config.analysis.peak_mode);
    }

    #[test]
    fn partial_analysis_section_fills_the_rest() {
        let config: Config = toml::from_str("[analysis]\ngain = 1.5\n").unwrap();
        assert_eq!(config.analysis.gain, 1.5);
        assert_eq!(config.analysis.slope, DEFAULT_SLOPE);
    }
}
