//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::path::Path;

use wordwall_core::memory::{
    LoadOrderSnapshot, MemFile, MemHandle, MemoryHost, ObjectFormat, SnapshotFile,
    SnapshotRecord, SnapshotScript,
};
use wordwall_core::{Host, Result, SETTINGS_FILE_NAME};

pub const TRIGGER: &str = "0001A2B3";

/// A word wall REFR placed against the trigger.
pub fn wall(file: &str, form_id: &str, format: ObjectFormat, n: u32) -> SnapshotRecord {
    let word = |i: u32| format!("{:08X}", 0x000A_0000 + n * 0x10 + i);
    SnapshotRecord::new(file, form_id, "REFR")
        .links_to(TRIGGER)
        .in_cell(&format!("Cell {n}"))
        .with_script(SnapshotScript::word_wall(
            format,
            [&word(1), &word(2), &word(3)],
            &format!("{:08X}", 0x000B_0000 + n),
        ))
}

/// Skyrim.esm with the trigger and five walls, Mod.esp overriding two of
/// them (one now disabled), plus a non-reference record pointing at the
/// trigger.
pub fn skyrim_snapshot() -> LoadOrderSnapshot {
    LoadOrderSnapshot {
        files: vec![
            SnapshotFile::new("Skyrim.esm"),
            SnapshotFile::new("Dawnguard.esm"),
            SnapshotFile::new("Mod.esp"),
        ],
        records: vec![
            SnapshotRecord::new("Skyrim.esm", TRIGGER, "ACTI"),
            wall("Skyrim.esm", "00000101", ObjectFormat::V1, 1),
            wall("Skyrim.esm", "00000102", ObjectFormat::V1, 2),
            wall("Skyrim.esm", "00000103", ObjectFormat::V2, 3),
            wall("Skyrim.esm", "00000104", ObjectFormat::V1, 4),
            wall("Skyrim.esm", "00000105", ObjectFormat::V2, 5),
            wall("Mod.esp", "00000102", ObjectFormat::V2, 2),
            wall("Mod.esp", "00000104", ObjectFormat::V1, 4).with_flag("Initially Disabled"),
            SnapshotRecord::new("Mod.esp", "02000800", "FLST").links_to(TRIGGER),
        ],
    }
}

pub fn write_settings(dir: &Path, json: &str) {
    fs::write(dir.join(SETTINGS_FILE_NAME), json).unwrap();
}

pub fn shout_of(host: &MemoryHost, file: &str, form_id: &str) -> Option<String> {
    host.record_in(file, form_id)?
        .script
        .as_ref()?
        .property("shoutGlobal")?
        .value
        .clone()
}

/// Delegates to a [`MemoryHost`], counting reference graph calls.
pub struct CountingHost {
    pub inner: MemoryHost,
    pub reference_queries: Cell<usize>,
    pub index_builds: usize,
}

impl CountingHost {
    pub fn new(inner: MemoryHost) -> Self {
        Self {
            inner,
            reference_queries: Cell::new(0),
            index_builds: 0,
        }
    }
}

impl Host for CountingHost {
    type File = MemFile;
    type Handle = MemHandle;

    fn file_by_name(&self, name: &str) -> Option<MemFile> {
        self.inner.file_by_name(name)
    }

    fn loaded_files(&self) -> Vec<MemFile> {
        self.inner.loaded_files()
    }

    fn file_name(&self, file: &MemFile) -> String {
        self.inner.file_name(file)
    }

    fn load_order(&self, file: &MemFile) -> u8 {
        self.inner.load_order(file)
    }

    fn patch_file(&mut self, name: &str) -> Result<MemFile> {
        self.inner.patch_file(name)
    }

    fn record(&self, file: &MemFile, form_id: &str) -> Option<MemHandle> {
        self.inner.record(file, form_id)
    }

    fn hex_form_id(&self, handle: &MemHandle) -> String {
        self.inner.hex_form_id(handle)
    }

    fn signature(&self, handle: &MemHandle) -> String {
        self.inner.signature(handle)
    }

    fn master_record(&self, handle: &MemHandle) -> MemHandle {
        self.inner.master_record(handle)
    }

    fn element(&self, handle: &MemHandle, path: &str) -> Option<MemHandle> {
        self.inner.element(handle, path)
    }

    fn script_property(&self, script: &MemHandle, name: &str) -> Option<MemHandle> {
        self.inner.script_property(script, name)
    }

    fn value(&self, element: &MemHandle) -> Option<String> {
        self.inner.value(element)
    }

    fn copy_element(&mut self, target: &MemHandle, source: &MemHandle) -> Result<()> {
        self.inner.copy_element(target, source)
    }

    fn build_references(&mut self, file: &MemFile) {
        self.index_builds += 1;
        self.inner.build_references(file)
    }

    fn references_to(&self, handle: &MemHandle) -> Vec<MemHandle> {
        self.reference_queries.set(self.reference_queries.get() + 1);
        self.inner.references_to(handle)
    }

    fn previous_override(&self, handle: &MemHandle, file: &MemFile) -> MemHandle {
        self.inner.previous_override(handle, file)
    }

    fn record_flag(&self, handle: &MemHandle, flag: &str) -> bool {
        self.inner.record_flag(handle, flag)
    }

    fn set_file_flag(&mut self, file: &MemFile, flag: &str, enabled: bool) -> Result<()> {
        self.inner.set_file_flag(file, flag, enabled)
    }

    fn cell_name(&self, handle: &MemHandle) -> Option<String> {
        self.inner.cell_name(handle)
    }

    fn add_override(&mut self, file: &MemFile, handle: &MemHandle) -> Result<MemHandle> {
        self.inner.add_override(file, handle)
    }
}
