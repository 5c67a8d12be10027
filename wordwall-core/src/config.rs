//! Settings document loading and resolution against the active load order.
//!
//! The document lists plugin-relative form ids. Resolution expands each of
//! them with the plugin's load order index and, for triggers and
//! hardcoded walls, looks the record up in that plugin. Entries for
//! ignored or missing plugins are skipped with a log message; an id that
//! does not resolve inside a loaded plugin aborts the run.

use log::info;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::host::Host;
use crate::ids::{form_id_with_lo, record_with_lo, GlobalId, ShortId};
use crate::{PatcherError, PatcherSettings, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginEntry {
    #[serde(rename = "pluginName")]
    pub plugin_name: String,
    #[serde(rename = "shortFormIDs")]
    pub short_form_ids: Vec<ShortId>,
}

#[derive(Debug, Deserialize)]
struct LegacyTriggerEntry {
    #[serde(rename = "pluginName")]
    plugin_name: String,
    #[serde(rename = "triggerID")]
    trigger_id: ShortId,
}

#[derive(Debug, Deserialize)]
struct LegacyBlacklistEntry {
    #[serde(rename = "pluginName")]
    plugin_name: String,
    refrs: Vec<ShortId>,
}

/// The settings document, normalised from either schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDocument {
    pub triggers: Vec<PluginEntry>,
    pub blacklist: Vec<PluginEntry>,
    /// `None` for documents written before hardcoded walls existed.
    pub hardcoded_walls: Option<Vec<PluginEntry>>,
}

impl SettingsDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| PatcherError::Config(format!("Invalid settings.json: {e}")))?;
        let Value::Object(root) = root else {
            return Err(PatcherError::Config(
                "Invalid settings.json at root!".to_string(),
            ));
        };

        if root.contains_key("dynamicWordWallTriggers") {
            Ok(Self {
                triggers: field(&root, "dynamicWordWallTriggers")?,
                blacklist: field(&root, "dynamicBlacklist")?,
                hardcoded_walls: Some(field(&root, "hardcodedWalls")?),
            })
        } else if root.contains_key("wordWallTriggers") {
            let triggers: Vec<LegacyTriggerEntry> = field(&root, "wordWallTriggers")?;
            let blacklist: Vec<LegacyBlacklistEntry> = field(&root, "blacklist")?;
            Ok(Self {
                triggers: triggers
                    .into_iter()
                    .map(|t| PluginEntry {
                        plugin_name: t.plugin_name,
                        short_form_ids: vec![t.trigger_id],
                    })
                    .collect(),
                blacklist: blacklist
                    .into_iter()
                    .map(|b| PluginEntry {
                        plugin_name: b.plugin_name,
                        short_form_ids: b.refrs,
                    })
                    .collect(),
                hardcoded_walls: None,
            })
        } else {
            Err(PatcherError::Config(
                "Invalid settings.json at root! Missing dynamicWordWallTriggers".to_string(),
            ))
        }
    }
}

fn field<T: DeserializeOwned>(root: &Map<String, Value>, name: &str) -> Result<T> {
    let value = root.get(name).ok_or_else(|| {
        PatcherError::Config(format!("Invalid settings.json at root! Missing {name}"))
    })?;
    serde_json::from_value(value.clone())
        .map_err(|e| PatcherError::Config(format!("Invalid settings.json at {name}: {e}")))
}

/// Reads the settings document. A missing document is a configuration
/// error rather than an IO error: the run cannot start without it.
pub fn load_config(path: &Path) -> Result<SettingsDocument> {
    if !path.exists() {
        return Err(PatcherError::Config(format!(
            "Unable to find {}!",
            path.display()
        )));
    }
    let text = fs::read_to_string(path)?;
    SettingsDocument::from_json(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Trigger,
    Blacklist,
    HardcodedWall,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Trigger => "trigger",
            EntryKind::Blacklist => "blacklist",
            EntryKind::HardcodedWall => "hardcoded walls",
        })
    }
}

/// How the run finds its word walls. Chosen once during initialisation.
#[derive(Debug, Clone)]
pub enum Discovery<H> {
    Dynamic {
        triggers: Vec<H>,
        trigger_ids: Vec<GlobalId>,
        blacklist: Vec<GlobalId>,
    },
    Hardcoded {
        walls: Vec<H>,
        wall_ids: Vec<GlobalId>,
    },
}

impl<H> Discovery<H> {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Discovery::Dynamic { .. })
    }
}

/// Expands every id of every usable entry. Returns `(plugin file, id)`
/// pairs in document order.
fn usable_ids<H: Host>(
    host: &H,
    settings: &PatcherSettings,
    entries: &[PluginEntry],
    kind: EntryKind,
) -> Vec<(H::File, ShortId, GlobalId)> {
    let mut out = Vec::new();
    for entry in entries {
        if settings.is_ignored(&entry.plugin_name) {
            info!("{} ignored. Skipping its {}...", entry.plugin_name, kind);
            continue;
        }
        let Some(file) = host.file_by_name(&entry.plugin_name) else {
            info!("{} not found. Skipping its {}...", entry.plugin_name, kind);
            continue;
        };
        for short in &entry.short_form_ids {
            let global = form_id_with_lo(host, &file, short);
            out.push((file.clone(), short.clone(), global));
        }
    }
    out
}

/// Resolves entries to record handles, failing on the first id that does
/// not exist in its (loaded) plugin.
pub fn resolve_handles<H: Host>(
    host: &H,
    settings: &PatcherSettings,
    entries: &[PluginEntry],
    kind: EntryKind,
) -> Result<(Vec<H::Handle>, Vec<GlobalId>)> {
    let mut handles = Vec::new();
    let mut ids = Vec::new();
    for (file, short, global) in usable_ids(host, settings, entries, kind) {
        handles.push(record_with_lo(host, &file, &short)?);
        ids.push(global);
    }
    Ok((handles, ids))
}

/// Blacklist entries are compared by identity only and never looked up.
pub fn resolve_ids<H: Host>(
    host: &H,
    settings: &PatcherSettings,
    entries: &[PluginEntry],
    kind: EntryKind,
) -> Vec<GlobalId> {
    usable_ids(host, settings, entries, kind)
        .into_iter()
        .map(|(_, _, global)| global)
        .collect()
}

pub fn resolve_discovery<H: Host>(
    host: &H,
    settings: &PatcherSettings,
    document: &SettingsDocument,
) -> Result<Discovery<H::Handle>> {
    if settings.is_dynamic {
        info!("Loading Word Wall Triggers...");
        let (triggers, trigger_ids) =
            resolve_handles(host, settings, &document.triggers, EntryKind::Trigger)?;
        info!("Loading REFR blacklist...");
        let blacklist = resolve_ids(host, settings, &document.blacklist, EntryKind::Blacklist);
        Ok(Discovery::Dynamic {
            triggers,
            trigger_ids,
            blacklist,
        })
    } else {
        let entries = document.hardcoded_walls.as_ref().ok_or_else(|| {
            PatcherError::Config(
                "Invalid settings.json at root! Missing hardcodedWalls".to_string(),
            )
        })?;
        info!("Loading hardcoded Word Walls...");
        let (walls, wall_ids) =
            resolve_handles(host, settings, entries, EntryKind::HardcodedWall)?;
        Ok(Discovery::Hardcoded { walls, wall_ids })
    }
}
