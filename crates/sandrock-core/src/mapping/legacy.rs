//! Record-id keyed mapping files
//!
//! Older dumps list records as `{ "id", "size", "text" }`, where `size` is the
//! declared length and `text` the (possibly translated) string. They carry no
//! offsets, so entries are matched on record id.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ImportOutcome;
use crate::document::BinaryDocument;
use crate::report::UnknownSlot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub id: u32,
    #[serde(default)]
    pub size: Option<usize>,
    pub text: String,
}

pub(super) fn apply(entries: &[LegacyEntry], doc: &mut BinaryDocument) -> ImportOutcome {
    let index = doc.record_index();
    let mut outcome = ImportOutcome::default();

    for entry in entries {
        let Some(&i) = index.get(&entry.id) else {
            warn!("Record {} not found in document", entry.id);
            outcome.unknown.push(UnknownSlot {
                slot: None,
                record_id: Some(entry.id),
            });
            continue;
        };

        let slot = &mut doc.slots_mut()[i];
        if entry.size.is_some_and(|size| size != slot.declared_len()) {
            debug!(
                "Record {} size {} differs from declared length {}",
                entry.id,
                entry.size.unwrap_or_default(),
                slot.declared_len()
            );
        }
        slot.set_replacement(entry.text.as_str());
        outcome.applied += 1;
    }

    info!(
        "Imported {} record-id entries ({} unknown)",
        outcome.applied,
        outcome.unknown.len()
    );
    outcome
}
