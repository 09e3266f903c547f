//! Configuration loading and parsing
//!
//! The file is optional. Without one the monitor runs on its built-in
//! defaults and writes snapshot log lines.

use anyhow::{Context, Result};
use can_telemetry_decoder::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How observations are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Snapshot log lines on stdout
    #[default]
    Lines,
    /// One JSON record per snapshot, transition or advisory on stdout
    Json,
    /// Human-readable event log on stderr
    Events,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .monitor
        .validate()
        .with_context(|| format!("Invalid monitor settings in {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [monitor]
            steering_limit_deg = 12
            alert_threshold = 40

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.monitor.steering_limit_deg, 12);
        assert_eq!(config.monitor.alert_threshold, 40);
        assert_eq!(config.monitor.snapshot_interval, 5);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.output.format, OutputFormat::Lines);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\nskew_ratio = 0.03\n\n[output]\nformat = \"events\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.monitor.skew_ratio, 0.03);
        assert_eq!(config.output.format, OutputFormat::Events);
    }

    #[test]
    fn test_load_config_rejects_invalid_monitor() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\nsnapshot_interval = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Path::new("does-not-exist.toml")).is_err());
    }
}
