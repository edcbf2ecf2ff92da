//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[serde(default)]` fills missing fields from `Default::default()`, so a
//! config file only needs the keys it wants to change:
//!
//! ```toml
//! [editor]
//! hide_buttons = true
//!
//! [[editor.languages]]
//! value = "python"
//! display_text = "Python"
//! file_extension = ".py"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::EditorResult;
use crate::language::{LanguageDescriptor, LanguageSet, default_descriptors};

/// Main configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor widget settings
    pub editor: EditorOptions,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("multicode").join("config.toml"))
    }

    /// Checks that the configured language list is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.editor
            .language_set()
            .map(|_| ())
            .map_err(|e| ConfigError::Languages(e.to_string()))
    }
}

/// Options a controller is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Hide the push and save buttons
    pub hide_buttons: bool,

    /// Selector entries, primary language first
    pub languages: Vec<LanguageDescriptor>,
}

impl EditorOptions {
    /// Validates the language list.
    pub fn language_set(&self) -> EditorResult<LanguageSet> {
        LanguageSet::new(self.languages.clone())
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            hide_buttons: false,
            languages: default_descriptors(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid language list: {0}")]
    Languages(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.editor.hide_buttons);
        assert_eq!(config.editor.languages.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.editor, config.editor);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[editor]
hide_buttons = true

[[editor.languages]]
value = "javascript"
display_text = "JS"
file_extension = ".mjs"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert!(config.editor.hide_buttons);

        let set = config.editor.language_set().unwrap();
        assert_eq!(set.primary(), Language::JavaScript);
        assert_eq!(set.get(Language::JavaScript).unwrap().file_extension, ".mjs");
        assert!(!set.contains(Language::Python));
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[editor.languages]]
value = "json"
display_text = "JSON"
file_extension = ".json"

[[editor.languages]]
value = "json"
display_text = "Config"
file_extension = ".cfg"
"#
        )
        .unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Languages(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_language() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[editor.languages]]
value = "cobol"
display_text = "COBOL"
file_extension = ".cob"
"#
        )
        .unwrap();

        assert!(matches!(Config::load_from(file.path()), Err(ConfigError::Parse(_))));
    }
}
