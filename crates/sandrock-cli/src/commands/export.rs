//! Export command: write the slot table as a JSON mapping.

use std::path::Path;

use anyhow::{Context, Result, bail};
use sandrock_core::{CancelToken, Pipeline, RunReport};

use super::translate::translate_document;

/// Export `input` to `mapping`, pre-filled with machine translation if asked
pub fn run(
    pipeline: &Pipeline,
    input: &Path,
    mapping: &Path,
    prefill: bool,
    cancel: &CancelToken,
) -> Result<RunReport> {
    let mut doc = pipeline
        .open(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut report = RunReport::new(doc.slots().len());

    if prefill {
        report.untranslated = translate_document(pipeline, &mut doc, cancel)?;
        if cancel.is_cancelled() {
            bail!(sandrock_core::Error::Cancelled);
        }
    }

    let exported = pipeline
        .export(&doc, mapping)
        .with_context(|| format!("Failed to write {}", mapping.display()))?;
    eprintln!(
        "Exported {} entries to {}",
        exported.len(),
        mapping.display()
    );
    Ok(report)
}
