//! Configuration system

use std::collections::BTreeMap;

pub use serde::{Deserialize, Serialize};

use crate::error::GlfwResult;
use crate::hint::{HintSetting, WindowHint};
use crate::window::WindowBuilder;

/// Serialization formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &str) -> Result<Self, ConfigError> {
        match std::path::Path::new(path).extension().and_then(|extension| extension.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_string())),
        }
    }
}

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    ///
    /// The extension is checked before the file is touched.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        match format {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Window settings as stored in a configuration file
///
/// ```toml
/// width = 1280
/// height = 720
/// title = "Viewer"
///
/// [hints]
/// resizable = false
/// client_api = "no_api"
/// samples = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Content area width in screen coordinates
    pub width: u32,
    /// Content area height in screen coordinates
    pub height: u32,
    /// Window title
    pub title: String,
    /// Hints applied before creation, keyed by hint name
    pub hints: BTreeMap<WindowHint, HintSetting>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "safe_glfw".to_string(),
            hints: BTreeMap::new(),
        }
    }
}

impl Config for WindowConfig {}

impl WindowConfig {
    /// Resolve every hint setting and prepare a window builder
    ///
    /// Values are only resolved to typed hint values here; the domain checks
    /// run when the builder builds, before anything reaches the native layer.
    pub fn builder(&self) -> GlfwResult<WindowBuilder<'static>> {
        self.hints
            .iter()
            .try_fold(WindowBuilder::new(self.width, self.height, self.title.clone()), |builder, (hint, setting)| {
                Ok(builder.hint(*hint, setting.resolve(*hint)?))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlfwError;
    use crate::hint::{ClientApi, HintValue};

    const SAMPLE: &str = r#"
width = 1024
height = 768
title = "Viewer"

[hints]
resizable = false
client_api = "no_api"
samples = 4
x11_class_name = "viewer"
"#;

    #[test]
    fn test_parse_toml() {
        let config: WindowConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.hints.len(), 4);

        let builder = config.builder().unwrap();
        let hints = builder.hints();
        assert!(hints.contains(&(WindowHint::Resizable, HintValue::Bool(false))));
        assert!(hints.contains(&(WindowHint::ClientApi, HintValue::from_enum(ClientApi::NoApi))));
        assert!(hints.contains(&(WindowHint::Samples, HintValue::Int(4))));
        assert!(hints.contains(&(WindowHint::X11ClassName, HintValue::Str("viewer".to_string()))));
    }

    #[test]
    fn test_unknown_enum_name() {
        let mut config = WindowConfig::default();
        config.hints.insert(WindowHint::ClientApi, HintSetting::Text("vulkan".to_string()));
        assert!(matches!(config.builder(), Err(GlfwError::Configuration { .. })));
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let mut config = WindowConfig::default();
        config.hints.insert(WindowHint::Decorated, HintSetting::Bool(false));

        let path = std::env::temp_dir().join(format!("safe_glfw_window_{}.ron", std::process::id()));
        let path = path.to_str().unwrap();
        config.save_to_file(path).unwrap();
        let loaded = WindowConfig::load_from_file(path).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            WindowConfig::load_from_file("window.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            WindowConfig::default().save_to_file("window.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(!std::path::Path::new("window.yaml").exists());
    }

    #[test]
    fn test_missing_file_with_known_extension() {
        assert!(matches!(
            WindowConfig::load_from_file("definitely/not/here/window.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
