//! JSON mapping export and import
//!
//! A mapping is the editable form of a document: one entry per slot, in
//! file order, keyed by the slot's origin offset.
//!
//! ```json
//! [
//!   {
//!     "slot": "0x0001695C",
//!     "id": 1201,
//!     "capacity": 12,
//!     "original": "Hello!",
//!     "translation": "Hallo!"
//!   }
//! ]
//! ```
//!
//! `original` is for human reference only; import reads `translation`.

mod legacy;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::BinaryDocument;
use crate::error::Result;
use crate::layout::SlotId;
use crate::report::{RunReport, UnknownSlot};

pub use legacy::LegacyEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub slot: SlotId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub original: String,
    /// `null` leaves the slot unchanged
    #[serde(default)]
    pub translation: Option<String>,
}

/// Ordered slot mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    pub entries: Vec<MappingEntry>,
}

/// Outcome of applying a mapping to a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Entries whose translation was assigned to a slot
    pub applied: usize,
    /// Entries without a translation
    pub skipped: usize,
    pub unknown: Vec<UnknownSlot>,
}

impl ImportOutcome {
    pub fn record_into(&self, report: &mut RunReport) {
        report.unknown_slots.extend(self.unknown.iter().cloned());
    }
}

impl Mapping {
    /// Build a mapping from a document
    ///
    /// Each translation is the slot's replacement if one is set, otherwise a
    /// copy of the original text as an editable default.
    pub fn export(doc: &BinaryDocument) -> Self {
        let entries = doc
            .slots()
            .iter()
            .map(|slot| MappingEntry {
                slot: slot.id(),
                id: Some(slot.record_id()),
                capacity: Some(slot.capacity()),
                original: slot.original_text().to_string(),
                translation: Some(slot.effective_text().to_string()),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assign translations onto the matching slots of `doc`
    ///
    /// Entries naming a slot the document doesn't have are reported and
    /// skipped; the remaining entries still apply.
    pub fn apply(&self, doc: &mut BinaryDocument) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();
        let mut seen = HashSet::with_capacity(self.entries.len());

        for entry in &self.entries {
            let Some(slot) = doc.slot(entry.slot) else {
                warn!("Mapping entry {} matches no slot", entry.slot);
                outcome.unknown.push(UnknownSlot {
                    slot: Some(entry.slot),
                    record_id: entry.id,
                });
                continue;
            };

            if !seen.insert(entry.slot) {
                warn!("Duplicate mapping entry {}, last one wins", entry.slot);
            }
            if !entry.original.is_empty() && slot.original_text() != entry.original {
                debug!(
                    "Mapping original for {} differs from document text",
                    entry.slot
                );
            }

            match &entry.translation {
                Some(text) => {
                    // Slot existence checked above
                    if doc.set_replacement(entry.slot, text.as_str()).is_ok() {
                        outcome.applied += 1;
                    }
                }
                None => outcome.skipped += 1,
            }
        }

        info!(
            "Imported {} translations ({} skipped, {} unknown)",
            outcome.applied,
            outcome.skipped,
            outcome.unknown.len()
        );
        outcome
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save mapping as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.to_json()?)?;
        info!(
            "Saved {} mapping entries to {}",
            self.entries.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Any mapping file this tool can read
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MappingFile {
    Slots(Mapping),
    /// `[{ "id", "size", "text" }]` files written by the older tool
    Legacy(Vec<LegacyEntry>),
}

impl MappingFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn apply(&self, doc: &mut BinaryDocument) -> ImportOutcome {
        match self {
            MappingFile::Slots(mapping) => mapping.apply(doc),
            MappingFile::Legacy(entries) => legacy::apply(entries, doc),
        }
    }
}
