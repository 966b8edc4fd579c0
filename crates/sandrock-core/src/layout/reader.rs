use std::ops::Range;

use tracing::debug;

use super::slot::{Slot, validate_slots};
use super::{SectorLayout, record};
use crate::codec::TextCodec;
use crate::error::{Error, Result};

/// Parses the record stream of a sector into slots
pub struct SlotReader<'a> {
    layout: &'a SectorLayout,
    codec: &'a TextCodec,
}

impl<'a> SlotReader<'a> {
    pub fn new(layout: &'a SectorLayout, codec: &'a TextCodec) -> Self {
        Self { layout, codec }
    }

    /// Read all slots of the sector in `bytes`
    ///
    /// Stops when less than one record header remains; that tail stays opaque.
    pub fn read(&self, bytes: &[u8]) -> Result<Vec<Slot>> {
        self.layout.validate()?;

        let start = self.layout.first_byte;
        let end = self.layout.end();
        if end > bytes.len() {
            return Err(Error::malformed(
                start,
                format!(
                    "sector {}..={} extends past end of buffer ({} bytes)",
                    start,
                    self.layout.last_byte,
                    bytes.len()
                ),
            ));
        }

        let mut slots = Vec::new();
        let mut pos = start;

        while end - pos >= record::HEADER_SIZE {
            let record_id = read_u32(bytes, pos + record::ID);
            let declared_len = read_u32(bytes, pos + record::LENGTH) as usize;
            let origin = pos + record::HEADER_SIZE;

            let capacity = self.layout.capacity_for(declared_len).ok_or_else(|| {
                Error::malformed(pos, format!("declared length {} overflows", declared_len))
            })?;
            if capacity > end - origin {
                return Err(Error::malformed(
                    pos,
                    format!(
                        "record {} declares {} bytes but only {} remain in sector",
                        record_id,
                        declared_len,
                        end - origin
                    ),
                ));
            }

            let text = self
                .codec
                .decode(&bytes[origin..origin + declared_len])
                .map_err(|e| Error::malformed(origin, format!("record {}: {}", record_id, e)))?;

            slots.push(Slot::new(
                record_id,
                pos,
                origin,
                declared_len,
                capacity,
                text,
            ));
            pos = origin + capacity;
        }

        if pos < end {
            debug!("Sector tail of {} bytes left opaque at {:#x}", end - pos, pos);
        }

        validate_slots(&slots, bytes.len())?;
        debug!("Read {} slots from sector {:#x}..{:#x}", slots.len(), start, end);
        Ok(slots)
    }
}

/// Byte ranges not covered by any slot, in file order
pub fn opaque_regions(slots: &[Slot], buffer_len: usize) -> Vec<Range<usize>> {
    let mut regions = Vec::with_capacity(slots.len() + 1);
    let mut pos = 0usize;

    for slot in slots {
        let range = slot.range();
        if range.start > pos {
            regions.push(pos..range.start);
        }
        pos = pos.max(range.end);
    }
    if pos < buffer_len {
        regions.push(pos..buffer_len);
    }

    regions
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, text: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(text.len() as u32).to_le_bytes());
        out.extend_from_slice(text);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn read(bytes: &[u8], layout: &SectorLayout) -> Result<Vec<Slot>> {
        let codec = TextCodec::utf8();
        SlotReader::new(layout, &codec).read(bytes)
    }

    #[test]
    fn test_read_records_in_sector() {
        let mut bytes = vec![0xAA; 4];
        bytes.extend(record(1, b"Hello!"));
        bytes.extend(record(2, "日本".as_bytes()));
        bytes.extend(record(3, b"abcd"));
        let layout = SectorLayout::new(4, bytes.len() - 1);

        let slots = read(&bytes, &layout).unwrap();
        assert_eq!(slots.len(), 3);

        assert_eq!(slots[0].record_id(), 1);
        assert_eq!(slots[0].header_offset(), 4);
        assert_eq!(slots[0].origin_offset(), 12);
        assert_eq!(slots[0].declared_len(), 6);
        assert_eq!(slots[0].capacity(), 8);
        assert_eq!(slots[0].original_text(), "Hello!");

        assert_eq!(slots[1].original_text(), "日本");
        assert_eq!(slots[1].capacity(), 8);

        assert_eq!(slots[2].capacity(), 4);
        assert_eq!(slots[2].original_text(), "abcd");
    }

    #[test]
    fn test_read_empty_record() {
        let bytes = [record(9, b""), record(10, b"x")].concat();
        let slots = read(&bytes, &SectorLayout::whole(bytes.len())).unwrap();
        assert_eq!(slots[0].capacity(), 0);
        assert_eq!(slots[0].original_text(), "");
        assert_eq!(slots[1].original_text(), "x");
    }

    #[test]
    fn test_read_leaves_short_tail_opaque() {
        let mut bytes = record(1, b"ok");
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        let slots = read(&bytes, &SectorLayout::whole(bytes.len())).unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_read_rejects_capacity_past_sector() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(b"short");
        let err = read(&bytes, &SectorLayout::whole(bytes.len())).unwrap_err();
        assert!(matches!(err, Error::MalformedLayout { offset: 0, .. }));
    }

    #[test]
    fn test_read_rejects_sector_past_buffer() {
        let bytes = record(1, b"ok");
        let err = read(&bytes, &SectorLayout::new(0, 100)).unwrap_err();
        assert!(matches!(err, Error::MalformedLayout { .. }));
    }

    #[test]
    fn test_read_rejects_invalid_text() {
        let bytes = record(1, &[0xFF, 0xFE, 0x41]);
        let err = read(&bytes, &SectorLayout::whole(bytes.len())).unwrap_err();
        assert!(matches!(err, Error::MalformedLayout { offset: 8, .. }));
    }

    #[test]
    fn test_opaque_regions_cover_non_slot_bytes() {
        let mut bytes = vec![0u8; 2];
        bytes.extend(record(1, b"abc"));
        bytes.extend(record(2, b"defgh"));
        bytes.extend_from_slice(&[7, 7]);
        let layout = SectorLayout::new(2, bytes.len() - 3);
        let slots = read(&bytes, &layout).unwrap();

        let regions = opaque_regions(&slots, bytes.len());
        assert_eq!(regions, vec![0..10, 14..22, 30..32]);

        let covered: usize = regions.iter().map(|r| r.len()).sum::<usize>()
            + slots.iter().map(|s| s.capacity()).sum::<usize>();
        assert_eq!(covered, bytes.len());
    }
}
