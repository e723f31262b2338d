use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default location searched by [`Config::load`]
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub sonar: SonarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_width")]
    pub width: i32,
    #[serde(default = "default_world_height")]
    pub height: i32,
    #[serde(default = "default_cell_size")]
    pub cell_width: i32,
    #[serde(default = "default_cell_size")]
    pub cell_height: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    #[serde(default = "default_start")]
    pub start_x: f64,
    #[serde(default = "default_start")]
    pub start_y: f64,
    /// Degrees; 0 faces +y
    #[serde(default)]
    pub heading: f64,
    #[serde(default = "default_body_width")]
    pub body_width: f64,
    #[serde(default = "default_body_height")]
    pub body_height: f64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_min_sleep_ms")]
    pub min_sleep_ms: u64,
    #[serde(default = "default_step")]
    pub linear_step: f64,
    #[serde(default = "default_step")]
    pub angular_step: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SonarConfig {
    #[serde(default = "default_max_range")]
    pub max_range: f64,
    /// Leaving the world counts as a hit
    #[serde(default)]
    pub boundary_blocks: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

// Default values
fn default_world_width() -> i32 { 800 }
fn default_world_height() -> i32 { 600 }
fn default_cell_size() -> i32 { 20 }
fn default_start() -> f64 { 100.0 }
fn default_body_width() -> f64 { 20.0 }
fn default_body_height() -> f64 { 30.0 }
fn default_tick_ms() -> u64 { 50 }
fn default_min_sleep_ms() -> u64 { 2 }
fn default_step() -> f64 { 1.0 }
fn default_max_range() -> f64 { 750.0 }
fn default_enable_action_log() -> bool { true }
fn default_action_log_path() -> String { "action_log.json".to_string() }

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_width(),
            height: default_world_height(),
            cell_width: default_cell_size(),
            cell_height: default_cell_size(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            start_x: default_start(),
            start_y: default_start(),
            heading: 0.0,
            body_width: default_body_width(),
            body_height: default_body_height(),
            tick_ms: default_tick_ms(),
            min_sleep_ms: default_min_sleep_ms(),
            linear_step: default_step(),
            angular_step: default_step(),
        }
    }
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            max_range: default_max_range(),
            boundary_blocks: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            robot: RobotConfig::default(),
            sonar: SonarConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml`, or use defaults if it is missing or invalid
    pub fn load() -> Self {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    log::warn!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => {
                log::info!("No {} found, using default configuration", path.display());
                Config::default()
            }
        }
    }

    /// Strict load: missing or malformed files are errors
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.world.width, 800);
        assert_eq!(config.world.cell_width, 20);
        assert_eq!(config.robot.start_x, 100.0);
        assert_eq!(config.robot.body_width, 20.0);
        assert_eq!(config.robot.body_height, 30.0);
        assert_eq!(config.robot.tick_ms, 50);
        assert_eq!(config.sonar.max_range, 750.0);
        assert!(!config.sonar.boundary_blocks);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [world]
            width = 200
            height = 200

            [sonar]
            boundary_blocks = true
            "#,
        )
        .unwrap();
        assert_eq!(config.world.width, 200);
        assert_eq!(config.world.cell_height, 20);
        assert_eq!(config.robot.tick_ms, 50);
        assert_eq!(config.sonar.max_range, 750.0);
        assert!(config.sonar.boundary_blocks);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.world.height, 600);
        assert!(config.logging.enable_action_log);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            Config::parse("[world]\nwidth = \"wide\""),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default("definitely/not/here.toml");
        assert_eq!(config.world.width, 800);
        assert!(matches!(
            Config::from_path("definitely/not/here.toml"),
            Err(SimError::Io(_))
        ));
    }
}
