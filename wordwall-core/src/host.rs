//! The editing environment a patch run is driven by.
//!
//! The host owns plugin files, load order, the reference index and the
//! in-memory override model. The core only ever talks to it through this
//! trait, so a run can be exercised against [`crate::memory::MemoryHost`]
//! as easily as against a live editor session.

use crate::Result;

pub trait Host {
    /// A loaded plugin file.
    type File: Clone;
    /// A record override or an element nested inside one.
    type Handle: Clone;

    fn file_by_name(&self, name: &str) -> Option<Self::File>;

    /// Loaded files in load order.
    fn loaded_files(&self) -> Vec<Self::File>;

    fn file_name(&self, file: &Self::File) -> String;

    fn load_order(&self, file: &Self::File) -> u8;

    /// Returns the named patch file, creating it at the end of the load
    /// order if it is not loaded yet.
    fn patch_file(&mut self, name: &str) -> Result<Self::File>;

    /// Looks up `form_id` (eight hex digits) inside `file`.
    fn record(&self, file: &Self::File, form_id: &str) -> Option<Self::Handle>;

    /// Eight-digit upper-case hex form id of the record owning `handle`.
    fn hex_form_id(&self, handle: &Self::Handle) -> String;

    fn signature(&self, handle: &Self::Handle) -> String;

    /// The record as defined by the file that introduced it.
    fn master_record(&self, handle: &Self::Handle) -> Self::Handle;

    /// Resolves a backslash separated path below `handle`.
    fn element(&self, handle: &Self::Handle, path: &str) -> Option<Self::Handle>;

    fn script_property(&self, script: &Self::Handle, name: &str) -> Option<Self::Handle>;

    /// Display text of an element's value.
    fn value(&self, element: &Self::Handle) -> Option<String>;

    /// Overwrites the value at `target` with the value at `source`.
    fn copy_element(&mut self, target: &Self::Handle, source: &Self::Handle) -> Result<()>;

    /// Indexes the references held by records of `file`. Must run before
    /// [`Host::references_to`] can see them.
    fn build_references(&mut self, file: &Self::File);

    fn references_to(&self, handle: &Self::Handle) -> Vec<Self::Handle>;

    /// The override `file` would be layered on top of: the last override
    /// loaded before `file`.
    fn previous_override(&self, handle: &Self::Handle, file: &Self::File) -> Self::Handle;

    fn record_flag(&self, handle: &Self::Handle, flag: &str) -> bool;

    fn set_file_flag(&mut self, file: &Self::File, flag: &str, enabled: bool) -> Result<()>;

    /// Long name of the cell the record is placed in.
    fn cell_name(&self, handle: &Self::Handle) -> Option<String>;

    /// Copies `handle` into `file` as a new override and returns the copy.
    fn add_override(&mut self, file: &Self::File, handle: &Self::Handle) -> Result<Self::Handle>;
}
