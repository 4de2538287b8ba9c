use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub presets: PresetConfig,
    pub global_data: GlobalDataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reset per-module order indexes before every top-level parse.
    ///
    /// Off by default so class numbering keeps counting across the several
    /// parses that render one page.
    pub reset_order_index: bool,
    /// Substrings that mark content as Divi content. Content with none of
    /// them goes straight to the stock block parser.
    pub divi_markers: Vec<String>,
    /// Substrings of structural wrapper blocks whose content is parsed again
    /// later; content containing any of them goes to the stock parser.
    pub wrapper_markers: Vec<String>,
    /// Depth limit for nested block normalization.
    pub max_block_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reset_order_index: false,
            divi_markers: vec![
                "<!-- wp:divi/".to_string(),
                "\"builderVersion\":\"5".to_string(),
            ],
            wrapper_markers: vec![
                "<!-- wp:template-part".to_string(),
                "<!-- wp:post-content".to_string(),
            ],
            max_block_depth: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// Options key the preset data is stored under.
    pub option_key: String,
    /// Priority of presets that do not declare one.
    pub default_priority: i64,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            option_key: "builder_global_presets_d5".to_string(),
            default_priority: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalDataConfig {
    /// Options key the global colors and variables are stored under.
    pub option_key: String,
    /// How deep color/variable aliases are followed.
    pub max_depth: usize,
    /// Wrap one `hsl(from ...)` per alias level instead of adding the
    /// adjustments into a single expression.
    pub nest_filters: bool,
}

impl Default for GlobalDataConfig {
    fn default() -> Self {
        Self {
            option_key: "et_divi_global_data".to_string(),
            max_depth: 10,
            nest_filters: false,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert!(!config.parser.reset_order_index);
        assert_eq!(config.parser.max_block_depth, 20);
        assert_eq!(config.presets.default_priority, 10);
        assert_eq!(config.global_data.max_depth, 10);
        assert!(!config.global_data.nest_filters);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = Config::default();
        original.parser.reset_order_index = true;
        original.global_data.nest_filters = true;

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config_content = r#"
[parser]
reset_order_index = true
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert!(config.parser.reset_order_index);
        assert_eq!(config.parser.max_block_depth, 20);
        assert_eq!(config.parser.divi_markers, ParserConfig::default().divi_markers);
        assert_eq!(config.presets, PresetConfig::default());
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_or_default(temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[parser\nreset_order_index = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.presets.option_key = "custom_presets".to_string();

        test_config.save_to_path(&config_file).unwrap();

        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
