use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::ids::GlobalId;
use crate::{PatcherSettings, Result};

const SEPARATOR: &str = "==============================";

/// Human-readable record of a run, appended to the log file at the end.
#[derive(Debug, Clone, Default)]
pub struct PatchLog {
    lines: Vec<String>,
}

impl PatchLog {
    pub fn new(started: DateTime<Local>, settings: &PatcherSettings) -> Self {
        let mut log = Self::default();
        log.push(format!(
            "##### Random Word Walls run {} #####",
            started.format("%Y-%m-%d %H:%M:%S")
        ));
        log.push(format!(
            "Mode: {}",
            if settings.is_dynamic { "dynamic" } else { "hardcoded" }
        ));
        log.push(format!("Patch file: {}", settings.patch_file_name));
        log.push(format!("Set ESL: {}", settings.set_esl));
        log.push(format!("Ignored files: {}", settings.ignored_files.join(", ")));
        log
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn push_ids(&mut self, label: &str, ids: &[GlobalId]) {
        let joined = ids.iter().map(GlobalId::as_str).collect::<Vec<_>>().join(", ");
        self.push(format!("{label}: {joined}"));
    }

    pub fn push_patched(
        &mut self,
        form_id: &GlobalId,
        cell_name: &str,
        original_shout: &str,
        randomized_shout: &str,
    ) {
        self.push(SEPARATOR);
        self.push(format!("REFR: {form_id}"));
        self.push(format!("At cell: {cell_name}"));
        self.push(format!("Original shout: {original_shout}"));
        self.push(format!("Randomized shout: {randomized_shout}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Appends the rendered log to `path`, creating the file and its
    /// parent directory if needed.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", self.render())?;
        writeln!(file)?;
        Ok(())
    }
}
