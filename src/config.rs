use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How close (pixels) a pointer must be to grab a link endpoint
    pub endpoint_tolerance: f32,

    /// Displacement of each successive paste of the same clipboard
    pub paste_offset: (f32, f32),

    /// Optional cap on the undo history
    pub max_undo_depth: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            endpoint_tolerance: 8.0,
            paste_offset: (20.0, 20.0),
            max_undo_depth: None,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse editor configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.endpoint_tolerance.is_finite() || self.endpoint_tolerance <= 0.0 {
            return Err(anyhow!(
                "endpoint_tolerance must be a positive number, got {}",
                self.endpoint_tolerance
            ));
        }
        if !self.paste_offset.0.is_finite() || !self.paste_offset.1.is_finite() {
            return Err(anyhow!("paste_offset must be finite"));
        }
        if self.max_undo_depth == Some(0) {
            return Err(anyhow!("max_undo_depth must be at least 1"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize editor configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EditorConfig::from_json_str(r#"{ "max_undo_depth": 50 }"#).unwrap();
        assert_eq!(config.max_undo_depth, Some(50));
        assert_eq!(config.endpoint_tolerance, 8.0);
        assert_eq!(config.paste_offset, (20.0, 20.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EditorConfig::from_json_str(r#"{ "endpoint_tolerance": -1.0 }"#).is_err());
        assert!(EditorConfig::from_json_str(r#"{ "max_undo_depth": 0 }"#).is_err());
        assert!(EditorConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        fs::write(&path, r#"{ "paste_offset": [5.0, 10.0] }"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.paste_offset, (5.0, 10.0));
        assert!(EditorConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = EditorConfig {
            endpoint_tolerance: 4.0,
            ..EditorConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json_str(&json).unwrap(), config);
    }
}
