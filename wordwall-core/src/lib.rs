use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod config;
mod discovery;
mod filter;
pub mod host;
pub mod ids;
pub mod memory;
mod patcher;
mod report;
pub mod shuffle;
pub mod word_wall;

pub use config::{load_config, Discovery, EntryKind, PluginEntry, SettingsDocument};
pub use discovery::find_references;
pub use filter::{resolve_set, FLAG_DELETED, FLAG_INITIALLY_DISABLED};
pub use host::Host;
pub use ids::{resolve, GlobalId, ShortId};
pub use patcher::{Patcher, RunContext, RunSummary, ESL_FLAG};
pub use report::PatchLog;
pub use shuffle::{shuffle_by_key, ShufflePairing};
pub use word_wall::{WordWall, WordWallField};

pub const SETTINGS_FILE_NAME: &str = "rwwSettings.json";
pub const LOG_FILE_NAME: &str = "rwwLog.txt";
pub const DEFAULT_PATCH_FILE_NAME: &str = "RandomWordWallsPatch.esp";

/// User-editable run settings, as the host's settings page stores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatcherSettings {
    pub is_dynamic: bool,
    pub set_esl: bool,
    pub show_log: bool,
    pub patch_file_name: String,
    pub ignored_files: Vec<String>,
}

impl Default for PatcherSettings {
    fn default() -> Self {
        Self {
            is_dynamic: true,
            set_esl: true,
            show_log: false,
            patch_file_name: DEFAULT_PATCH_FILE_NAME.to_string(),
            ignored_files: Vec::new(),
        }
    }
}

impl PatcherSettings {
    /// Case-insensitive, whitespace-trimmed match against `ignored_files`.
    pub fn is_ignored(&self, plugin_name: &str) -> bool {
        let wanted = plugin_name.trim().to_uppercase();
        self.ignored_files
            .iter()
            .any(|file| file.trim().to_uppercase() == wanted)
    }
}

/// Locations of the settings document and the text log inside the
/// patcher directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatcherPaths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

impl PatcherPaths {
    pub fn new(patcher_dir: &Path) -> Self {
        Self {
            settings_path: patcher_dir.join(SETTINGS_FILE_NAME),
            log_path: patcher_dir.join(LOG_FILE_NAME),
        }
    }
}

#[derive(Debug, Error)]
pub enum PatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unable to load {form_id} from {plugin}")]
    UnresolvedIdentifier { plugin: String, form_id: String },
    #[error("{form_id}{reason}")]
    Shape { form_id: String, reason: String },
    #[error("host error: {0}")]
    Host(String),
    #[error("shuffled word walls exhausted after {0} patches")]
    PairingExhausted(usize),
}

pub type Result<T> = std::result::Result<T, PatcherError>;
