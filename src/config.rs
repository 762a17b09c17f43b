use crate::{
    round::{CORRECT_PAUSE, INCORRECT_PAUSE},
    stats::TrendConfig,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application-level knobs. Quiz settings are not here: they live in the
/// record store next to the session history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub correct_pause_ms: u64,
    pub incorrect_pause_ms: u64,
    pub trend: TrendConfig,
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            correct_pause_ms: CORRECT_PAUSE.as_millis() as u64,
            incorrect_pause_ms: INCORRECT_PAUSE.as_millis() as u64,
            trend: TrendConfig::default(),
            db_path: None,
        }
    }
}

impl Config {
    /// Pause shown after an answer before moving on
    pub fn feedback_pause(&self, correct: bool) -> Duration {
        Duration::from_millis(if correct {
            self.correct_pause_ms
        } else {
            self.incorrect_pause_ms
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "timestables") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("timestables_config.json")
        };
        Self { path }
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
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
