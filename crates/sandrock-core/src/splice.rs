//! Replacement text taken from another copy of the localization file
//!
//! Useful for carrying an existing translation forward to a newer game build:
//! the donor is parsed with its own sector bounds and each target slot takes
//! the donor text of the record with the same id.

use tracing::{debug, info};

use crate::document::BinaryDocument;
use crate::report::RunReport;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceOutcome {
    /// Target slots that received donor text
    pub applied: usize,
    /// Target records with no donor counterpart
    pub missing: Vec<u32>,
    /// Donor records with no target counterpart
    pub unused: usize,
}

impl SpliceOutcome {
    pub fn record_into(&self, report: &mut RunReport) {
        report.unspliced.extend(self.missing.iter().copied());
    }
}

/// Copy donor text onto `target` slots with matching record ids
pub fn splice(target: &mut BinaryDocument, donor: &BinaryDocument) -> SpliceOutcome {
    let donor_index = donor.record_index();
    let mut outcome = SpliceOutcome::default();
    let mut matched = 0usize;

    for slot in target.slots_mut() {
        match donor_index.get(&slot.record_id()) {
            Some(&i) => {
                matched += 1;
                let text = donor.slots()[i].original_text();
                if text != slot.original_text() {
                    slot.set_replacement(text);
                    outcome.applied += 1;
                }
            }
            None => {
                debug!("Record {} has no donor text", slot.record_id());
                outcome.missing.push(slot.record_id());
            }
        }
    }

    outcome.unused = donor_index.len().saturating_sub(matched);
    info!(
        "Spliced {} slots from donor ({} missing, {} unused donor records)",
        outcome.applied,
        outcome.missing.len(),
        outcome.unused
    );
    outcome
}
