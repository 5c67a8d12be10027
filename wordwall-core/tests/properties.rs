use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use wordwall_core::memory::{LoadOrderSnapshot, MemHandle, MemoryHost, SnapshotFile, SnapshotRecord};
use wordwall_core::{
    resolve, resolve_set, shuffle_by_key, GlobalId, Host, ShortId, FLAG_DELETED,
    FLAG_INITIALLY_DISABLED,
};

const FILES: [&str; 2] = ["Skyrim.esm", "Mod.esp"];

fn form_id(n: u32) -> String {
    format!("{:08X}", 0x100 + n)
}

/// Overrides of up to eight records spread over two files, with random
/// disabled/deleted flags.
fn snapshot_strategy() -> impl Strategy<Value = LoadOrderSnapshot> {
    prop::collection::vec((0u32..8, 0usize..2, any::<bool>(), any::<bool>()), 1..20).prop_map(
        |specs| {
            let mut seen = HashSet::new();
            let mut records = Vec::new();
            for (id, file, disabled, deleted) in specs {
                if !seen.insert((id, file)) {
                    continue;
                }
                let mut record = SnapshotRecord::new(FILES[file], &form_id(id), "REFR");
                if disabled {
                    record = record.with_flag(FLAG_INITIALLY_DISABLED);
                }
                if deleted {
                    record = record.with_flag(FLAG_DELETED);
                }
                records.push(record);
            }
            LoadOrderSnapshot {
                files: FILES.iter().map(|name| SnapshotFile::new(name)).collect(),
                records,
            }
        },
    )
}

proptest! {
    #[test]
    fn resolve_is_injective(a in (any::<u8>(), 0u32..=0xFF_FFFF), b in (any::<u8>(), 0u32..=0xFF_FFFF)) {
        let short_a = ShortId::parse(&format!("{:06X}", a.1)).unwrap();
        let short_b = ShortId::parse(&format!("{:06X}", b.1)).unwrap();
        let same_input = a == b;
        let same_output = resolve(a.0, &short_a) == resolve(b.0, &short_b);
        prop_assert_eq!(same_input, same_output);
        prop_assert_eq!(resolve(a.0, &short_a), resolve(a.0, &short_a));
    }

    #[test]
    fn resolve_set_is_unique_ordered_and_filtered(
        snapshot in snapshot_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
        blacklisted in prop::collection::vec(0u32..8, 0..4),
    ) {
        let mut host = MemoryHost::new(snapshot).unwrap();
        let patch = host.patch_file("Patch.esp").unwrap();
        let count = host.snapshot().records.len();
        let raw: Vec<MemHandle> = picks
            .iter()
            .map(|i| MemHandle::Record(i.index(count)))
            .collect();
        let blacklist: Vec<GlobalId> = blacklisted
            .iter()
            .map(|&n| GlobalId::from_hex(&form_id(n)))
            .collect();

        let out = resolve_set(&host, &raw, &blacklist, &patch);
        let out_ids: Vec<String> = out.iter().map(|h| host.hex_form_id(h)).collect();

        let unique: HashSet<&String> = out_ids.iter().collect();
        prop_assert_eq!(unique.len(), out_ids.len());

        let mut first_seen: Vec<String> = Vec::new();
        for h in &raw {
            let id = host.hex_form_id(h);
            if !first_seen.contains(&id) {
                first_seen.push(id);
            }
        }
        let mut cursor = first_seen.iter();
        for id in &out_ids {
            prop_assert!(cursor.any(|seen| seen == id), "{} out of order", id);
        }

        for (handle, id) in out.iter().zip(&out_ids) {
            prop_assert!(!blacklist.contains(&GlobalId::from_hex(id)));
            prop_assert!(!host.record_flag(handle, FLAG_INITIALLY_DISABLED));
            prop_assert!(!host.record_flag(handle, FLAG_DELETED));
        }
    }

    #[test]
    fn shuffle_is_a_permutation(items in prop::collection::vec(any::<u32>(), 0..64), seed in any::<u64>()) {
        let mut shuffled = shuffle_by_key(items.clone(), &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(shuffled.len(), items.len());
        if items.len() <= 1 {
            prop_assert_eq!(&shuffled, &items);
        }
        let mut expected = items;
        expected.sort_unstable();
        shuffled.sort_unstable();
        prop_assert_eq!(shuffled, expected);
    }
}
