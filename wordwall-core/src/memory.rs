//! A [`Host`] over a load order held entirely in memory.
//!
//! The snapshot is plain serde data, so a load order can be dumped to
//! JSON, patched offline and written back out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::host::Host;
use crate::word_wall::{SCRIPT_PATH, VALUE_PATH_V1, VALUE_PATH_V2};
use crate::{PatcherError, Result};

/// Load order indices are a single byte.
pub const MAX_FILES: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOrderSnapshot {
    /// Files in load order.
    pub files: Vec<SnapshotFile>,
    pub records: Vec<SnapshotRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<String>,
}

impl SnapshotFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: BTreeSet::new(),
        }
    }
}

/// One override of a record, owned by `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub file: String,
    pub form_id: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    /// Form id of the base object this record points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<SnapshotScript>,
}

impl SnapshotRecord {
    pub fn new(file: &str, form_id: &str, signature: &str) -> Self {
        Self {
            file: file.to_string(),
            form_id: form_id.to_ascii_uppercase(),
            signature: signature.to_string(),
            flags: BTreeSet::new(),
            cell: None,
            links_to: None,
            script: None,
        }
    }

    pub fn links_to(mut self, form_id: &str) -> Self {
        self.links_to = Some(form_id.to_ascii_uppercase());
        self
    }

    pub fn in_cell(mut self, cell: &str) -> Self {
        self.cell = Some(cell.to_string());
        self
    }

    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flags.insert(flag.to_string());
        self
    }

    pub fn with_script(mut self, script: SnapshotScript) -> Self {
        self.script = Some(script);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotScript {
    pub name: String,
    pub properties: Vec<ScriptProperty>,
}

impl SnapshotScript {
    /// A word wall script with `myWord01..03` and `shoutGlobal` set.
    pub fn word_wall(format: ObjectFormat, words: [&str; 3], shout: &str) -> Self {
        let mut properties: Vec<ScriptProperty> = ["myWord01", "myWord02", "myWord03"]
            .iter()
            .zip(words)
            .map(|(name, value)| ScriptProperty::object(name, format, value))
            .collect();
        properties.push(ScriptProperty::object("shoutGlobal", format, shout));
        Self {
            name: "WordWallTriggerScript".to_string(),
            properties,
        }
    }

    pub fn without(mut self, property: &str) -> Self {
        self.properties.retain(|p| p.name != property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&ScriptProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectFormat {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptProperty {
    pub name: String,
    pub format: ObjectFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ScriptProperty {
    pub fn object(name: &str, format: ObjectFormat, value: &str) -> Self {
        Self {
            name: name.to_string(),
            format,
            value: Some(value.to_ascii_uppercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemFile(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemHandle {
    Record(usize),
    Script(usize),
    Property { record: usize, property: usize },
    Value { record: usize, property: usize },
}

impl MemHandle {
    fn record(self) -> usize {
        match self {
            MemHandle::Record(r) | MemHandle::Script(r) => r,
            MemHandle::Property { record, .. } | MemHandle::Value { record, .. } => record,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    snapshot: LoadOrderSnapshot,
    indexed: BTreeSet<usize>,
}

impl MemoryHost {
    pub fn new(snapshot: LoadOrderSnapshot) -> Result<Self> {
        if snapshot.files.len() > MAX_FILES {
            return Err(PatcherError::Host(format!(
                "load order has {} files, at most {} are supported",
                snapshot.files.len(),
                MAX_FILES
            )));
        }
        for record in &snapshot.records {
            if !snapshot.files.iter().any(|f| f.name == record.file) {
                return Err(PatcherError::Host(format!(
                    "record {} belongs to {}, which is not in the load order",
                    record.form_id, record.file
                )));
            }
            if record.form_id.len() != 8 || u32::from_str_radix(&record.form_id, 16).is_err() {
                return Err(PatcherError::Host(format!(
                    "'{}' in {} is not an eight-digit hex form id",
                    record.form_id, record.file
                )));
            }
        }
        Ok(Self {
            snapshot,
            indexed: BTreeSet::new(),
        })
    }

    pub fn snapshot(&self) -> &LoadOrderSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> LoadOrderSnapshot {
        self.snapshot
    }

    /// The override of `form_id` that `file` contains, if any.
    pub fn record_in(&self, file: &str, form_id: &str) -> Option<&SnapshotRecord> {
        self.snapshot
            .records
            .iter()
            .find(|r| r.file == file && r.form_id.eq_ignore_ascii_case(form_id))
    }

    fn rec(&self, handle: &MemHandle) -> &SnapshotRecord {
        &self.snapshot.records[handle.record()]
    }

    fn file_position(&self, name: &str) -> usize {
        self.snapshot
            .files
            .iter()
            .position(|f| f.name == name)
            .unwrap_or(usize::MAX)
    }

    /// Overrides of the record behind `handle`, as (load order, index).
    fn overrides(&self, handle: &MemHandle) -> Vec<(usize, usize)> {
        let form_id = &self.rec(handle).form_id;
        let mut out: Vec<(usize, usize)> = self
            .snapshot
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.form_id == form_id)
            .map(|(i, r)| (self.file_position(&r.file), i))
            .collect();
        out.sort_unstable();
        out
    }
}

impl Host for MemoryHost {
    type File = MemFile;
    type Handle = MemHandle;

    fn file_by_name(&self, name: &str) -> Option<MemFile> {
        self.snapshot
            .files
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
            .map(MemFile)
    }

    fn loaded_files(&self) -> Vec<MemFile> {
        (0..self.snapshot.files.len()).map(MemFile).collect()
    }

    fn file_name(&self, file: &MemFile) -> String {
        self.snapshot.files[file.0].name.clone()
    }

    fn load_order(&self, file: &MemFile) -> u8 {
        u8::try_from(file.0).unwrap_or(u8::MAX)
    }

    fn patch_file(&mut self, name: &str) -> Result<MemFile> {
        if let Some(file) = self.file_by_name(name) {
            return Ok(file);
        }
        if self.snapshot.files.len() >= MAX_FILES {
            return Err(PatcherError::Host(format!(
                "no load order slot left for {name}"
            )));
        }
        self.snapshot.files.push(SnapshotFile::new(name));
        Ok(MemFile(self.snapshot.files.len() - 1))
    }

    fn record(&self, file: &MemFile, form_id: &str) -> Option<MemHandle> {
        let name = &self.snapshot.files[file.0].name;
        self.snapshot
            .records
            .iter()
            .position(|r| &r.file == name && r.form_id.eq_ignore_ascii_case(form_id))
            .map(MemHandle::Record)
    }

    fn hex_form_id(&self, handle: &MemHandle) -> String {
        self.rec(handle).form_id.to_ascii_uppercase()
    }

    fn signature(&self, handle: &MemHandle) -> String {
        self.rec(handle).signature.clone()
    }

    fn master_record(&self, handle: &MemHandle) -> MemHandle {
        self.overrides(handle)
            .first()
            .map(|&(_, i)| MemHandle::Record(i))
            .unwrap_or(MemHandle::Record(handle.record()))
    }

    fn element(&self, handle: &MemHandle, path: &str) -> Option<MemHandle> {
        match *handle {
            MemHandle::Record(r) if path == SCRIPT_PATH => {
                self.snapshot.records[r].script.as_ref().map(|_| MemHandle::Script(r))
            }
            MemHandle::Property { record, property } => {
                let prop = &self.snapshot.records[record].script.as_ref()?.properties[property];
                let wanted = match path {
                    VALUE_PATH_V1 => ObjectFormat::V1,
                    VALUE_PATH_V2 => ObjectFormat::V2,
                    _ => return None,
                };
                (prop.format == wanted && prop.value.is_some())
                    .then_some(MemHandle::Value { record, property })
            }
            _ => None,
        }
    }

    fn script_property(&self, script: &MemHandle, name: &str) -> Option<MemHandle> {
        let MemHandle::Script(record) = *script else {
            return None;
        };
        let properties = &self.snapshot.records[record].script.as_ref()?.properties;
        properties
            .iter()
            .position(|p| p.name == name)
            .map(|property| MemHandle::Property { record, property })
    }

    fn value(&self, element: &MemHandle) -> Option<String> {
        match *element {
            MemHandle::Value { record, property } => self.snapshot.records[record]
                .script
                .as_ref()?
                .properties[property]
                .value
                .clone(),
            MemHandle::Record(r) => Some(self.snapshot.records[r].form_id.clone()),
            _ => None,
        }
    }

    fn copy_element(&mut self, target: &MemHandle, source: &MemHandle) -> Result<()> {
        let (
            MemHandle::Value { record: tr, property: tp },
            MemHandle::Value { record: sr, property: sp },
        ) = (*target, *source)
        else {
            return Err(PatcherError::Host(
                "only object values can be copied".to_string(),
            ));
        };
        let value = self.snapshot.records[sr]
            .script
            .as_ref()
            .and_then(|s| s.properties[sp].value.clone());
        let script = self.snapshot.records[tr].script.as_mut().ok_or_else(|| {
            PatcherError::Host("copy target lost its script".to_string())
        })?;
        script.properties[tp].value = value;
        Ok(())
    }

    fn build_references(&mut self, file: &MemFile) {
        self.indexed.insert(file.0);
    }

    fn references_to(&self, handle: &MemHandle) -> Vec<MemHandle> {
        let form_id = self.hex_form_id(handle);
        self.snapshot
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                self.indexed.contains(&self.file_position(&r.file))
                    && r.links_to
                        .as_deref()
                        .is_some_and(|target| target.eq_ignore_ascii_case(&form_id))
            })
            .map(|(i, _)| MemHandle::Record(i))
            .collect()
    }

    fn previous_override(&self, handle: &MemHandle, file: &MemFile) -> MemHandle {
        self.overrides(handle)
            .into_iter()
            .filter(|&(order, _)| order < file.0)
            .last()
            .map(|(_, i)| MemHandle::Record(i))
            .unwrap_or(MemHandle::Record(handle.record()))
    }

    fn record_flag(&self, handle: &MemHandle, flag: &str) -> bool {
        self.rec(handle).flags.contains(flag)
    }

    fn set_file_flag(&mut self, file: &MemFile, flag: &str, enabled: bool) -> Result<()> {
        let flags = &mut self.snapshot.files[file.0].flags;
        if enabled {
            flags.insert(flag.to_string());
        } else {
            flags.remove(flag);
        }
        Ok(())
    }

    fn cell_name(&self, handle: &MemHandle) -> Option<String> {
        self.rec(handle).cell.clone()
    }

    fn add_override(&mut self, file: &MemFile, handle: &MemHandle) -> Result<MemHandle> {
        let form_id = self.hex_form_id(handle);
        if let Some(existing) = self.record(file, &form_id) {
            return Ok(existing);
        }
        let mut copy = self.rec(handle).clone();
        copy.file = self.file_name(file);
        self.snapshot.records.push(copy);
        Ok(MemHandle::Record(self.snapshot.records.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> MemoryHost {
        MemoryHost::new(LoadOrderSnapshot {
            files: vec![
                SnapshotFile::new("Skyrim.esm"),
                SnapshotFile::new("Update.esm"),
                SnapshotFile::new("Tweaks.esp"),
            ],
            records: vec![
                SnapshotRecord::new("Skyrim.esm", "0001A2B3", "ACTI"),
                SnapshotRecord::new("Skyrim.esm", "00000100", "REFR").links_to("0001A2B3"),
                SnapshotRecord::new("Update.esm", "00000100", "REFR")
                    .links_to("0001A2B3")
                    .with_flag("Initially Disabled"),
                SnapshotRecord::new("Tweaks.esp", "00000100", "REFR").links_to("0001A2B3"),
            ],
        })
        .unwrap()
    }

    #[test]
    fn rejects_records_of_unknown_files() {
        let err = MemoryHost::new(LoadOrderSnapshot {
            files: vec![SnapshotFile::new("Skyrim.esm")],
            records: vec![SnapshotRecord::new("Missing.esp", "00000001", "REFR")],
        })
        .unwrap_err();
        assert!(matches!(err, PatcherError::Host(ref m) if m.contains("Missing.esp")));
    }

    #[test]
    fn references_need_an_index() {
        let mut host = host();
        let trigger = MemHandle::Record(0);
        assert!(host.references_to(&trigger).is_empty());

        host.build_references(&MemFile(0));
        assert_eq!(host.references_to(&trigger), vec![MemHandle::Record(1)]);

        host.build_references(&MemFile(2));
        assert_eq!(
            host.references_to(&trigger),
            vec![MemHandle::Record(1), MemHandle::Record(3)]
        );
    }

    #[test]
    fn previous_override_skips_later_files() {
        let host = host();
        let base = MemHandle::Record(1);
        assert_eq!(host.previous_override(&base, &MemFile(2)), MemHandle::Record(2));
        assert_eq!(host.previous_override(&base, &MemFile(3)), MemHandle::Record(3));
        assert_eq!(host.master_record(&MemHandle::Record(3)), MemHandle::Record(1));
    }

    #[test]
    fn patch_file_is_appended_once() {
        let mut host = host();
        let patch = host.patch_file("Patch.esp").unwrap();
        assert_eq!(host.load_order(&patch), 3);
        assert_eq!(host.patch_file("patch.ESP").unwrap(), patch);

        let copy = host.add_override(&patch, &MemHandle::Record(3)).unwrap();
        assert_eq!(host.file_name(&patch), "Patch.esp");
        assert_eq!(host.hex_form_id(&copy), "00000100");
        assert_eq!(host.add_override(&patch, &MemHandle::Record(1)).unwrap(), copy);
    }

    #[test]
    fn value_paths_follow_object_format() {
        let mut snapshot = host().into_snapshot();
        snapshot.records[1].script = Some(SnapshotScript::word_wall(
            ObjectFormat::V2,
            ["00000A01", "00000A02", "00000A03"],
            "00000B01",
        ));
        let host = MemoryHost::new(snapshot).unwrap();

        let script = host.element(&MemHandle::Record(1), SCRIPT_PATH).unwrap();
        let shout = host.script_property(&script, "shoutGlobal").unwrap();
        assert!(host.element(&shout, VALUE_PATH_V1).is_none());
        let value = host.element(&shout, VALUE_PATH_V2).unwrap();
        assert_eq!(host.value(&value).as_deref(), Some("00000B01"));
    }
}
