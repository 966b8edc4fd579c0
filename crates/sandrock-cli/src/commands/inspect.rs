//! Inspect command: summarize the slot table of a binary.

use std::path::Path;

use anyhow::{Context, Result};
use sandrock_core::markup::has_markup;
use sandrock_core::{BinaryDocument, Pipeline};

use super::hex_utils::format_hex_bytes;
use super::summary::preview;

/// Bytes of record header shown per slot
const HEADER_PREVIEW: usize = 8;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub slots: usize,
    pub empty: usize,
    pub with_markup: usize,
    pub total_capacity: usize,
    pub max_capacity: usize,
    pub opaque_bytes: usize,
}

impl SlotStats {
    pub fn collect(doc: &BinaryDocument) -> Self {
        let mut stats = Self {
            slots: doc.slots().len(),
            opaque_bytes: doc.opaque_regions().iter().map(|r| r.len()).sum(),
            ..Default::default()
        };
        for slot in doc.slots() {
            stats.total_capacity += slot.capacity();
            stats.max_capacity = stats.max_capacity.max(slot.capacity());
            if slot.original_text().is_empty() {
                stats.empty += 1;
            }
            if has_markup(slot.original_text()) {
                stats.with_markup += 1;
            }
        }
        stats
    }
}

pub fn run(pipeline: &Pipeline, input: &Path, list_slots: bool) -> Result<()> {
    let doc = pipeline
        .open(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let layout = doc.layout();
    let stats = SlotStats::collect(&doc);

    println!("File:      {} ({} bytes)", input.display(), doc.len());
    println!(
        "Sector:    {}..={} (0x{:X}..=0x{:X})",
        layout.first_byte, layout.last_byte, layout.first_byte, layout.last_byte
    );
    println!("Encoding:  {}", pipeline.codec().encoding_name());
    println!("Slots:     {}", stats.slots);
    println!("  empty:   {}", stats.empty);
    println!("  markup:  {}", stats.with_markup);
    println!(
        "Capacity:  {} bytes total, {} max",
        stats.total_capacity, stats.max_capacity
    );
    println!("Opaque:    {} bytes", stats.opaque_bytes);

    if list_slots {
        println!();
        println!("{:<12} {:>10} {:>8}  {:<23}  Text", "Slot", "Record", "Cap", "Header");
        for slot in doc.slots() {
            let header = &doc.bytes()[slot.header_offset()..slot.origin_offset()];
            println!(
                "{:<12} {:>10} {:>8}  {:<23}  {}",
                slot.id().to_string(),
                slot.record_id(),
                slot.capacity(),
                format_hex_bytes(&header[..header.len().min(HEADER_PREVIEW)]),
                preview(slot.original_text())
            );
        }
    }

    Ok(())
}
