//! Source binary plus its slot table
//!
//! A [`BinaryDocument`] owns the source bytes read-only. Replacement text
//! lives on the slots; patching always produces a fresh buffer.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info};

use crate::codec::TextCodec;
use crate::error::{Error, Result};
use crate::layout::{SectorLayout, Slot, SlotId, SlotReader, opaque_regions};

#[derive(Debug, Clone)]
pub struct BinaryDocument {
    bytes: Vec<u8>,
    layout: SectorLayout,
    slots: Vec<Slot>,
}

impl BinaryDocument {
    /// Parse a buffer into a document
    pub fn parse(bytes: Vec<u8>, layout: &SectorLayout, codec: &TextCodec) -> Result<Self> {
        let slots = SlotReader::new(layout, codec).read(&bytes)?;
        Ok(Self {
            bytes,
            layout: layout.clone(),
            slots,
        })
    }

    /// Read and parse a file
    pub fn open<P: AsRef<Path>>(path: P, layout: &SectorLayout, codec: &TextCodec) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let doc = Self::parse(bytes, layout, codec)?;
        info!(
            "Parsed {} slots from {} ({} bytes)",
            doc.slots.len(),
            path.display(),
            doc.bytes.len()
        );
        Ok(doc)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Source bytes of a slot
    pub fn slot_bytes(&self, slot: &Slot) -> &[u8] {
        &self.bytes[slot.range()]
    }

    /// Regions outside every slot
    pub fn opaque_regions(&self) -> Vec<Range<usize>> {
        opaque_regions(&self.slots, self.bytes.len())
    }

    fn index_of(&self, id: SlotId) -> Option<usize> {
        self.slots
            .binary_search_by_key(&id.offset(), |s| s.origin_offset() as u64)
            .ok()
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.index_of(id).map(|i| &self.slots[i])
    }

    /// Set replacement text for a slot
    pub fn set_replacement(&mut self, id: SlotId, text: impl Into<String>) -> Result<()> {
        let index = self.index_of(id).ok_or(Error::UnknownSlot(id))?;
        self.slots[index].set_replacement(text);
        Ok(())
    }

    pub fn clear_replacements(&mut self) {
        for slot in &mut self.slots {
            slot.clear_replacement();
        }
    }

    /// Slots that currently carry replacement text
    pub fn replacement_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.replacement_text().is_some())
            .count()
    }

    /// Slot indices keyed by header record id
    ///
    /// Record ids are expected to be unique; if not, the first slot wins.
    pub fn record_index(&self) -> HashMap<u32, usize> {
        let mut index = HashMap::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            match index.entry(slot.record_id()) {
                Entry::Vacant(e) => {
                    e.insert(i);
                }
                Entry::Occupied(_) => {
                    debug!("Duplicate record id {} at {}", slot.record_id(), slot.id());
                }
            }
        }
        index
    }
}

/// Write `bytes` to `path`, replacing it only once the data is fully on disk
///
/// A cancelled or failed write never leaves a partial output file behind.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(text.len() as u32).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn sample() -> BinaryDocument {
        let bytes = [record(10, "Hello!"), record(11, "Bye"), record(10, "dup")].concat();
        let layout = SectorLayout::whole(bytes.len());
        BinaryDocument::parse(bytes, &layout, &TextCodec::utf8()).unwrap()
    }

    #[test]
    fn test_lookup_by_slot_id() {
        let doc = sample();
        let id = doc.slots()[1].id();
        assert_eq!(doc.slot(id).unwrap().original_text(), "Bye");
        assert!(doc.slot(SlotId::new(3)).is_none());
    }

    #[test]
    fn test_set_replacement_unknown_slot() {
        let mut doc = sample();
        let err = doc.set_replacement(SlotId::new(1), "x").unwrap_err();
        assert!(matches!(err, Error::UnknownSlot(_)));
    }

    #[test]
    fn test_set_and_clear_replacements() {
        let mut doc = sample();
        let id = doc.slots()[0].id();
        doc.set_replacement(id, "Hallo!").unwrap();
        assert_eq!(doc.replacement_count(), 1);
        doc.clear_replacements();
        assert_eq!(doc.replacement_count(), 0);
    }

    #[test]
    fn test_record_index_first_wins() {
        let doc = sample();
        let index = doc.record_index();
        assert_eq!(index.len(), 2);
        assert_eq!(index[&10], 0);
        assert_eq!(index[&11], 1);
    }

    #[test]
    fn test_slot_bytes() {
        let doc = sample();
        assert_eq!(doc.slot_bytes(&doc.slots()[0]), b"Hello!\0\0");
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"abc").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        write_atomic(&path, b"defg").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"defg");
    }

    #[test]
    fn test_open_missing_file() {
        let err = BinaryDocument::open(
            "definitely/not/here.dat",
            &SectorLayout::default(),
            &TextCodec::utf8(),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
