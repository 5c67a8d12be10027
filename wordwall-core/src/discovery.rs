use log::debug;

use crate::host::Host;

/// Signature of placed object references.
pub const REFERENCE_SIGNATURE: &str = "REFR";

/// Every placed reference that points at one of `triggers`, across all
/// indexed files. Duplicates are kept; overrides of the same reference in
/// several plugins each show up once.
pub fn find_references<H: Host>(host: &H, triggers: &[H::Handle]) -> Vec<H::Handle> {
    let mut found = Vec::new();
    for trigger in triggers {
        let master = host.master_record(trigger);
        for reference in host.references_to(&master) {
            let signature = host.signature(&reference);
            if signature != REFERENCE_SIGNATURE {
                debug!(
                    "Skipping {} [{}] referencing {}",
                    host.hex_form_id(&reference),
                    signature,
                    host.hex_form_id(trigger)
                );
                continue;
            }
            found.push(reference);
        }
    }
    found
}
