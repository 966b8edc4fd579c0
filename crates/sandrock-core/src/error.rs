use thiserror::Error;

use crate::layout::SlotId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed layout at offset {offset:#x}: {reason}")]
    MalformedLayout { offset: usize, reason: String },

    #[error("Mapping references unknown slot {0}")]
    UnknownSlot(SlotId),

    #[error("Replacement for slot {slot} needs {required} bytes but capacity is {capacity}")]
    CapacityViolation {
        slot: SlotId,
        capacity: usize,
        required: usize,
    },

    #[error("Translation failed for slot {slot}: {message}")]
    TranslationFailure { slot: SlotId, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedLayout {
            offset,
            reason: reason.into(),
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Structural errors abort a run before any output is produced.
    ///
    /// Per-slot errors (unknown slot, capacity, translation) are only
    /// returned when a caller asked for strict handling.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::UnknownSlot(_)
                | Error::CapacityViolation { .. }
                | Error::TranslationFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::malformed(0x10, "truncated header").is_fatal());
        assert!(!Error::UnknownSlot(SlotId::new(0x20)).is_fatal());
        assert!(
            !Error::CapacityViolation {
                slot: SlotId::new(0x20),
                capacity: 4,
                required: 8,
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_malformed_layout_message() {
        let err = Error::malformed(0x1F, "text runs past sector end");
        assert_eq!(
            err.to_string(),
            "Malformed layout at offset 0x1f: text runs past sector end"
        );
    }
}
