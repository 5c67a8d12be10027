use serde::{Deserialize, Serialize};
use std::fmt;

use crate::host::Host;
use crate::{PatcherError, Result};

/// Plugin-local record identifier: six hex digits, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortId(String);

impl ShortId {
    pub const WIDTH: usize = 6;

    pub fn parse(raw: &str) -> Result<Self> {
        let t = raw.trim();
        let t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
        if t.len() != Self::WIDTH || !t.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PatcherError::Config(format!(
                "'{}' is not a {}-digit hex form id",
                raw,
                Self::WIDTH
            )));
        }
        Ok(Self(t.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortId {
    type Error = PatcherError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<ShortId> for String {
    fn from(id: ShortId) -> Self {
        id.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load-order qualified form id. Two handles share a `GlobalId` exactly
/// when they are overrides of the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(String);

impl GlobalId {
    /// Wraps a hex form id as reported by the host.
    pub fn from_hex(hex: &str) -> Self {
        Self(hex.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefixes `short` with the two-digit hex load order index.
pub fn resolve(load_order: u8, short: &ShortId) -> GlobalId {
    GlobalId(format!("{:02X}{}", load_order, short.as_str()))
}

pub fn form_id_with_lo<H: Host>(host: &H, file: &H::File, short: &ShortId) -> GlobalId {
    resolve(host.load_order(file), short)
}

/// Resolves `short` inside `file`. A miss means the settings document
/// does not match the loaded plugin, which no run can recover from.
pub fn record_with_lo<H: Host>(host: &H, file: &H::File, short: &ShortId) -> Result<H::Handle> {
    let form_id = form_id_with_lo(host, file, short);
    host.record(file, form_id.as_str())
        .ok_or_else(|| PatcherError::UnresolvedIdentifier {
            plugin: host.file_name(file),
            form_id: form_id.to_string(),
        })
}
