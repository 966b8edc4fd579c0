//! Per-run issue aggregation
//!
//! Per-slot problems never abort a run. They are collected here so the
//! final report can list every string that needs a manual look.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::error::{Error, Result};
use crate::layout::SlotId;

/// A mapping entry that matched no slot
///
/// Record-id keyed entries carry no slot id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownSlot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u32>,
}

/// Replacement text that had to be truncated to fit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityViolation {
    pub slot: SlotId,
    pub record_id: u32,
    pub capacity: usize,
    pub required: usize,
    /// Text actually written
    pub kept: String,
}

/// Oversized replacement carrying markup; the original text was kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkupOverflow {
    pub slot: SlotId,
    pub record_id: u32,
    pub capacity: usize,
    pub required: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FailureKind {
    Transient,
    Permanent,
    Cancelled,
}

/// Slot left untranslated because the translator failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationFailure {
    pub slot: SlotId,
    pub record_id: u32,
    pub kind: FailureKind,
    pub message: String,
}

impl From<&TranslationFailure> for Error {
    fn from(failure: &TranslationFailure) -> Self {
        Error::TranslationFailure {
            slot: failure.slot,
            message: format!("{} ({})", failure.message, failure.kind),
        }
    }
}

/// Everything worth telling the user after a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Local>,
    pub slots: usize,
    /// Slots whose bytes changed in the output
    pub written: usize,
    pub truncated: Vec<CapacityViolation>,
    pub markup_overflows: Vec<MarkupOverflow>,
    pub untranslated: Vec<TranslationFailure>,
    pub unknown_slots: Vec<UnknownSlot>,
    /// Slots with characters the file encoding cannot represent
    pub unmappable: Vec<SlotId>,
    /// Records left as-is because the donor binary lacks them
    pub unspliced: Vec<u32>,
}

impl RunReport {
    pub fn new(slots: usize) -> Self {
        Self {
            generated_at: Local::now(),
            slots,
            written: 0,
            truncated: Vec::new(),
            markup_overflows: Vec::new(),
            untranslated: Vec::new(),
            unknown_slots: Vec::new(),
            unmappable: Vec::new(),
            unspliced: Vec::new(),
        }
    }

    /// No slot needs attention
    pub fn is_clean(&self) -> bool {
        self.truncated.is_empty()
            && self.markup_overflows.is_empty()
            && self.untranslated.is_empty()
            && self.unknown_slots.is_empty()
            && self.unmappable.is_empty()
            && self.unspliced.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.truncated.len()
            + self.markup_overflows.len()
            + self.untranslated.len()
            + self.unknown_slots.len()
            + self.unmappable.len()
            + self.unspliced.len()
    }

    /// Turn lossy fits into an error, for strict validation workflows
    pub fn into_strict(self) -> Result<Self> {
        if let Some(v) = self.truncated.first() {
            return Err(Error::CapacityViolation {
                slot: v.slot,
                capacity: v.capacity,
                required: v.required,
            });
        }
        if let Some(v) = self.markup_overflows.first() {
            return Err(Error::CapacityViolation {
                slot: v.slot,
                capacity: v.capacity,
                required: v.required,
            });
        }
        Ok(self)
    }

    /// Save report as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation() -> CapacityViolation {
        CapacityViolation {
            slot: SlotId::new(0x40),
            record_id: 3,
            capacity: 12,
            required: 15,
            kept: "Hallo Welt".to_string(),
        }
    }

    #[test]
    fn test_new_report_is_clean() {
        let report = RunReport::new(10);
        assert!(report.is_clean());
        assert_eq!(report.issue_count(), 0);
        assert!(report.into_strict().is_ok());
    }

    #[test]
    fn test_strict_rejects_truncation() {
        let mut report = RunReport::new(1);
        report.truncated.push(violation());
        assert!(!report.is_clean());

        let err = report.into_strict().unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityViolation {
                capacity: 12,
                required: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_strict_allows_translation_failures() {
        let mut report = RunReport::new(1);
        report.untranslated.push(TranslationFailure {
            slot: SlotId::new(0x40),
            record_id: 3,
            kind: FailureKind::Transient,
            message: "rate limited".to_string(),
        });
        assert_eq!(report.issue_count(), 1);
        assert!(report.into_strict().is_ok());
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = RunReport::new(2);
        report.truncated.push(violation());
        report.unknown_slots.push(UnknownSlot {
            slot: Some(SlotId::new(0x99)),
            record_id: None,
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["slots"], 2);
        assert_eq!(value["truncated"][0]["slot"], "0x00000040");
        assert_eq!(value["unknown_slots"][0]["slot"], "0x00000099");
        assert!(value["unknown_slots"][0].get("record_id").is_none());
    }

    #[test]
    fn test_translation_failure_into_error() {
        let failure = TranslationFailure {
            slot: SlotId::new(0x40),
            record_id: 3,
            kind: FailureKind::Permanent,
            message: "HTTP 403".to_string(),
        };
        let err = Error::from(&failure);
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Translation failed for slot 0x00000040: HTTP 403 (permanent)"
        );
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Transient.to_string(), "transient");
        assert_eq!(FailureKind::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_report_save() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let report = RunReport::new(0);
        report.save(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"slots\": 0"));
    }
}
