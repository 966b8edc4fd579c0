use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable slot identity, derived from the slot's origin offset
///
/// Rendered as a zero-padded hex offset (`0x0001695C`) so mappings read
/// naturally next to a hex editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId(u64);

impl SlotId {
    pub fn new(origin_offset: u64) -> Self {
        Self(origin_offset)
    }

    pub fn from_offset(origin_offset: usize) -> Self {
        Self(origin_offset as u64)
    }

    pub fn offset(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u64::from_str_radix(digits, 16)
            .map(SlotId)
            .map_err(|e| Error::InvalidConfig(format!("invalid slot identity {:?}: {}", s, e)))
    }
}

impl TryFrom<String> for SlotId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.to_string()
    }
}

/// One fixed-capacity string region of the source binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
    record_id: u32,
    header_offset: usize,
    origin_offset: usize,
    declared_len: usize,
    capacity: usize,
    original_text: String,
    replacement_text: Option<String>,
}

impl Slot {
    pub fn new(
        record_id: u32,
        header_offset: usize,
        origin_offset: usize,
        declared_len: usize,
        capacity: usize,
        original_text: String,
    ) -> Self {
        Self {
            id: SlotId::from_offset(origin_offset),
            record_id,
            header_offset,
            origin_offset,
            declared_len,
            capacity,
            original_text,
            replacement_text: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Record id stored in the header
    pub fn record_id(&self) -> u32 {
        self.record_id
    }

    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn origin_offset(&self) -> usize {
        self.origin_offset
    }

    /// Text length stored in the header, before alignment padding
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte range of the slot in the source buffer
    pub fn range(&self) -> Range<usize> {
        self.origin_offset..self.origin_offset + self.capacity
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn replacement_text(&self) -> Option<&str> {
        self.replacement_text.as_deref()
    }

    /// Text the patched output will carry for this slot, before fitting
    pub fn effective_text(&self) -> &str {
        self.replacement_text().unwrap_or(&self.original_text)
    }

    pub fn set_replacement(&mut self, text: impl Into<String>) {
        self.replacement_text = Some(text.into());
    }

    pub fn clear_replacement(&mut self) {
        self.replacement_text = None;
    }

    /// True when a replacement is set and differs from the original
    pub fn is_changed(&self) -> bool {
        self.replacement_text
            .as_deref()
            .is_some_and(|text| text != self.original_text)
    }
}

/// Check that slots are ordered, inside the buffer and pairwise disjoint
pub fn validate_slots(slots: &[Slot], buffer_len: usize) -> Result<()> {
    let mut previous_end = 0usize;
    let mut previous: Option<&Slot> = None;

    for slot in slots {
        let end = slot
            .origin_offset
            .checked_add(slot.capacity)
            .ok_or_else(|| Error::malformed(slot.origin_offset, "slot range overflows"))?;
        if end > buffer_len {
            return Err(Error::malformed(
                slot.origin_offset,
                format!(
                    "slot capacity {} reads past end of buffer ({} bytes)",
                    slot.capacity, buffer_len
                ),
            ));
        }

        if let Some(prev) = previous {
            if slot.origin_offset < prev.origin_offset {
                return Err(Error::malformed(
                    slot.origin_offset,
                    format!("slot is out of order (follows {})", prev.id),
                ));
            }
            if slot.origin_offset < previous_end {
                return Err(Error::malformed(
                    slot.origin_offset,
                    format!("slot overlaps {}", prev.id),
                ));
            }
        }

        previous_end = end;
        previous = Some(slot);
    }

    Ok(())
}
