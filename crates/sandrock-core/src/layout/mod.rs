//! Record layout of the localization sector
//!
//! The localization binary holds a sector of back-to-back records:
//!
//! ```text
//! +---------+-------------+--------------------+-------------+
//! | id: u32 | length: u32 | text (length bytes) | fill to 4n |
//! +---------+-------------+--------------------+-------------+
//! ```
//!
//! Each record's text area (text + fill) is one fixed-capacity [`Slot`].
//! Everything else in the file, including record headers, is opaque.

mod reader;
mod slot;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use reader::{SlotReader, opaque_regions};
pub use slot::{Slot, SlotId, validate_slots};

/// Record header constants
pub mod record {
    /// Word size (4 bytes / 32-bit little-endian integer)
    pub const WORD: usize = 4;

    /// Record id field
    pub const ID: usize = 0;
    /// Declared text length field
    pub const LENGTH: usize = WORD;
    /// Size of the header preceding the text bytes
    pub const HEADER_SIZE: usize = WORD * 2;

    /// Text areas are padded up to a multiple of this
    pub const DEFAULT_ALIGNMENT: usize = WORD;
}

/// Default sector bounds for the shipped English localization file
pub mod sector {
    /// First byte of the localization sector (decimal file position)
    pub const DEFAULT_FIRST_BYTE: usize = 92508;
    /// Last byte of the localization sector, inclusive
    pub const DEFAULT_LAST_BYTE: usize = 13807635;
}

/// Where the record stream lives and how records are aligned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectorLayout {
    /// First byte of the sector
    pub first_byte: usize,
    /// Last byte of the sector (inclusive)
    pub last_byte: usize,
    /// Text area alignment in bytes
    pub alignment: usize,
}

impl Default for SectorLayout {
    fn default() -> Self {
        Self {
            first_byte: sector::DEFAULT_FIRST_BYTE,
            last_byte: sector::DEFAULT_LAST_BYTE,
            alignment: record::DEFAULT_ALIGNMENT,
        }
    }
}

impl SectorLayout {
    pub fn new(first_byte: usize, last_byte: usize) -> Self {
        Self {
            first_byte,
            last_byte,
            ..Default::default()
        }
    }

    /// Layout covering a whole buffer of `len` bytes
    pub fn whole(len: usize) -> Self {
        Self::new(0, len.saturating_sub(1))
    }

    /// Exclusive end of the sector
    pub fn end(&self) -> usize {
        self.last_byte.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_byte > self.last_byte {
            return Err(Error::InvalidConfig(format!(
                "sector first byte {} is after last byte {}",
                self.first_byte, self.last_byte
            )));
        }
        if self.alignment == 0 {
            return Err(Error::InvalidConfig(
                "record alignment must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Capacity of a text area whose declared length is `len`
    pub fn capacity_for(&self, len: usize) -> Option<usize> {
        let rem = len % self.alignment;
        if rem == 0 {
            Some(len)
        } else {
            len.checked_add(self.alignment - rem)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_up_to_alignment() {
        let layout = SectorLayout::default();
        assert_eq!(layout.capacity_for(0), Some(0));
        assert_eq!(layout.capacity_for(1), Some(4));
        assert_eq!(layout.capacity_for(4), Some(4));
        assert_eq!(layout.capacity_for(6), Some(8));
        assert_eq!(layout.capacity_for(usize::MAX), None);
    }

    #[test]
    fn test_capacity_with_unit_alignment() {
        let layout = SectorLayout {
            alignment: 1,
            ..SectorLayout::whole(64)
        };
        assert_eq!(layout.capacity_for(7), Some(7));
    }

    #[test]
    fn test_validate_rejects_inverted_sector() {
        assert!(SectorLayout::new(10, 5).validate().is_err());
        assert!(SectorLayout::new(5, 5).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_alignment() {
        let layout = SectorLayout {
            alignment: 0,
            ..SectorLayout::whole(16)
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_whole_layout_bounds() {
        let layout = SectorLayout::whole(32);
        assert_eq!(layout.first_byte, 0);
        assert_eq!(layout.last_byte, 31);
        assert_eq!(layout.end(), 32);
    }
}
