//! Config file discovery
//!
//! Files are searched system-wide first, then per user, then in the
//! working directory. The first one that parses wins.

use crate::config::Config;
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

const FILE_NAME: &str = "config.toml";
const APP_DIR: &str = "nvsettings";

/// Loader for `nvsettings` TOML files
pub struct ConfigFile;

impl ConfigFile {
    /// Parse the file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        Ok(toml::from_str(&text)?)
    }

    /// First search path that loads, with the config it holds
    ///
    /// Broken files are logged and skipped.
    pub fn discover() -> Option<(PathBuf, Config)> {
        Self::search_paths()
            .into_iter()
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load(&path) {
                Ok(config) => Some((path, config)),
                Err(e) => {
                    log::warn!("Ignoring {}: {}", path.display(), e);
                    None
                }
            })
    }

    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![Path::new("/etc").join(APP_DIR).join(FILE_NAME)];
        paths.extend(dirs::config_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME)));
        paths.push(PathBuf::from("nvsettings.toml"));
        paths.push(PathBuf::from(".nvsettings.toml"));
        paths
    }
}
