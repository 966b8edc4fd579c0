//! Slot patcher
//!
//! Re-encodes replacement text into each slot's fixed byte budget and
//! produces a new buffer of exactly the source length.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::codec::TextCodec;
use crate::document::BinaryDocument;
use crate::layout::{SlotId, record};
use crate::markup::has_markup;
use crate::report::{CapacityViolation, MarkupOverflow, RunReport};

/// What happens to a record's `length` header when its text changes
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LengthPrefix {
    /// Never touch header bytes; only slot ranges change
    #[default]
    Preserve,
    /// Rewrite the declared length to the full slot capacity so the whole
    /// aligned area is readable text
    Sync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchOptions {
    pub length_prefix: LengthPrefix,
    /// Keep the original text instead of truncating strings that carry markup
    pub guard_markup: bool,
    /// Treat any truncation as a failed run
    pub strict: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            length_prefix: LengthPrefix::Preserve,
            guard_markup: true,
            strict: false,
        }
    }
}

/// Patched buffer plus the per-slot issues found while fitting
#[derive(Debug, Clone)]
pub struct PatchOutput {
    pub bytes: Vec<u8>,
    pub written: usize,
    pub truncated: Vec<CapacityViolation>,
    pub markup_overflows: Vec<MarkupOverflow>,
    pub unmappable: Vec<SlotId>,
}

impl PatchOutput {
    /// Fold the patch issues into a run report
    pub fn record_into(&self, report: &mut RunReport) {
        report.written += self.written;
        report.truncated.extend(self.truncated.iter().cloned());
        report
            .markup_overflows
            .extend(self.markup_overflows.iter().cloned());
        report.unmappable.extend(self.unmappable.iter().copied());
    }
}

pub struct SlotPatcher<'a> {
    codec: &'a TextCodec,
    options: &'a PatchOptions,
}

impl<'a> SlotPatcher<'a> {
    pub fn new(codec: &'a TextCodec, options: &'a PatchOptions) -> Self {
        Self { codec, options }
    }

    /// Produce the patched buffer for `doc`
    ///
    /// Slots without a replacement, or whose replacement equals the original
    /// text, keep their source bytes.
    pub fn patch(&self, doc: &BinaryDocument) -> PatchOutput {
        let source = doc.bytes();
        let mut out = PatchOutput {
            bytes: source.to_vec(),
            written: 0,
            truncated: Vec::new(),
            markup_overflows: Vec::new(),
            unmappable: Vec::new(),
        };

        for slot in doc.slots() {
            let Some(replacement) = slot.replacement_text() else {
                continue;
            };
            if !slot.is_changed() {
                continue;
            }

            // Readers stop at the declared length, which must keep the
            // record's aligned size so the next header stays in place
            let budget = match self.options.length_prefix {
                LengthPrefix::Preserve => slot.declared_len(),
                LengthPrefix::Sync => slot.capacity(),
            };
            let fitted = self.codec.fit(replacement, budget);

            if fitted.truncated
                && self.options.guard_markup
                && (has_markup(slot.original_text()) || has_markup(replacement))
            {
                warn!(
                    "Slot {} keeps original text: replacement with markup needs {} bytes, capacity {}",
                    slot.id(),
                    fitted.required,
                    budget
                );
                out.markup_overflows.push(MarkupOverflow {
                    slot: slot.id(),
                    record_id: slot.record_id(),
                    capacity: budget,
                    required: fitted.required,
                });
                continue;
            }

            if fitted.truncated {
                warn!(
                    "Slot {} truncated: needs {} bytes, capacity {}",
                    slot.id(),
                    fitted.required,
                    budget
                );
                out.truncated.push(CapacityViolation {
                    slot: slot.id(),
                    record_id: slot.record_id(),
                    capacity: budget,
                    required: fitted.required,
                    kept: fitted.text.clone(),
                });
            }
            if fitted.unmappable {
                warn!("Slot {} has characters outside the file encoding", slot.id());
                out.unmappable.push(slot.id());
            }

            let origin = slot.origin_offset();
            let range = origin..origin + budget;
            let length_changed = budget != slot.declared_len();
            if fitted.bytes.as_slice() == &source[range.clone()] && !length_changed {
                debug!("Slot {} unchanged after fitting", slot.id());
                continue;
            }
            out.bytes[range].copy_from_slice(&fitted.bytes);

            if length_changed {
                let at = slot.header_offset() + record::LENGTH;
                out.bytes[at..at + record::WORD].copy_from_slice(&(budget as u32).to_le_bytes());
            }
            out.written += 1;
        }

        debug_assert_eq!(out.bytes.len(), source.len());
        debug!(
            "Patched {} of {} slots ({} truncated, {} kept for markup)",
            out.written,
            doc.slots().len(),
            out.truncated.len(),
            out.markup_overflows.len()
        );
        out
    }
}
