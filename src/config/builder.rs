//! Layering of the config file under command-line flags

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

/// Builds a [`Config`] from a file and flag overrides
///
/// Flags given as `None` leave the file value in place.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `path`, or from the first discovered file
    ///
    /// A named file must exist and parse; discovery falls back to
    /// defaults.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => self.config = ConfigFile::load(path)?,
            None => {
                if let Some((path, config)) = ConfigFile::discover() {
                    log::info!("Loaded config from {}", path.display());
                    self.config = config;
                }
            }
        }
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        self.config.general.verbose = verbose.unwrap_or(self.config.general.verbose);
        self
    }

    pub fn with_dry_run(mut self, dry_run: Option<bool>) -> Self {
        self.config.general.dry_run = dry_run.unwrap_or(self.config.general.dry_run);
        self
    }

    /// X display name, from `--display` or `$DISPLAY`
    pub fn with_display(mut self, name: Option<String>) -> Self {
        if name.is_some() {
            self.config.display.name = name;
        }
        self
    }

    /// Finish, rejecting empty library paths
    pub fn build(self) -> Result<Config, ConfigError> {
        let config = self.config;
        if config.vulkan.library.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "vulkan.library".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if config.nvml.library.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "nvml.library".to_string(),
                message: "must not be empty; remove the key to use the system library"
                    .to_string(),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags_override() {
        let config = ConfigBuilder::new()
            .with_verbose(Some(true))
            .with_dry_run(None)
            .with_display(Some(":1".to_string()))
            .build()
            .unwrap();

        assert!(config.general.verbose);
        assert!(!config.general.dry_run);
        assert_eq!(config.display.name.as_deref(), Some(":1"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[general]\ndry_run = true\n\n[display]\nname = \":2\"\n\n[backends]\nglx = false"
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .with_file(file.path().to_str())
            .unwrap()
            .with_display(Some(":0".to_string()))
            .with_dry_run(None)
            .build()
            .unwrap();
        assert_eq!(config.display.name.as_deref(), Some(":0"));
        assert!(config.general.dry_run);
        assert!(!config.backends.glx);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigBuilder::new().with_file(Some("/nonexistent/nvsettings.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_library_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[nvml]\nlibrary = \"\"").unwrap();

        let result = ConfigBuilder::new()
            .with_file(file.path().to_str())
            .unwrap()
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "nvml.library"
        ));
    }
}
