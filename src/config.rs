use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::segmenter::{SegmentConfig, DEFAULT_MAX_LENGTH, DEFAULT_SEPARATORS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub max_length: usize,
    pub separators: Vec<String>,
    pub color: bool,
    pub record_stats: bool,
    pub log_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            color: true,
            record_stats: true,
            log_history: true,
        }
    }
}

impl Config {
    pub fn segment_config(&self) -> SegmentConfig {
        SegmentConfig {
            max_length: self.max_length,
            separators: self.separators.clone(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> crate::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing keys take their defaults; an unreadable file yields the defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt config file");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
