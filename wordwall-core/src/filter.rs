use log::debug;
use std::collections::HashSet;

use crate::host::Host;
use crate::ids::GlobalId;

pub const FLAG_INITIALLY_DISABLED: &str = "Initially Disabled";
pub const FLAG_DELETED: &str = "Deleted";

/// Collapses `raw` to one override per record, in first-seen order.
///
/// Each record is resolved to the override `patch_file` would sit on top
/// of. Blacklisted records, and records whose resolved override is
/// disabled or deleted, are dropped. Deduplication happens before the
/// flag check: only the first occurrence of a record is ever evaluated.
pub fn resolve_set<H: Host>(
    host: &H,
    raw: &[H::Handle],
    blacklist: &[GlobalId],
    patch_file: &H::File,
) -> Vec<H::Handle> {
    let blacklist: HashSet<&GlobalId> = blacklist.iter().collect();
    let mut seen: HashSet<GlobalId> = HashSet::new();
    let mut out = Vec::new();

    for handle in raw {
        let form_id = GlobalId::from_hex(&host.hex_form_id(handle));
        if !seen.insert(form_id.clone()) {
            continue;
        }
        if blacklist.contains(&form_id) {
            debug!("{form_id} is blacklisted");
            continue;
        }

        let resolved = host.previous_override(handle, patch_file);
        if host.record_flag(&resolved, FLAG_INITIALLY_DISABLED)
            || host.record_flag(&resolved, FLAG_DELETED)
        {
            debug!("{form_id} is disabled or deleted");
            continue;
        }
        out.push(resolved);
    }

    out
}
