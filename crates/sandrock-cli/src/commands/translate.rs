//! Translate command: machine-translate and patch in one step.

use std::path::Path;

use anyhow::{Context, Result};
use sandrock_core::{
    BinaryDocument, CancelToken, GoogleTranslator, Pipeline, RunReport, SlotTranslator,
    TranslationFailure,
};
use tracing::info;

use crate::progress::translation_bar;

pub fn run(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    cancel: &CancelToken,
) -> Result<RunReport> {
    let mut doc = pipeline
        .open(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut report = RunReport::new(doc.slots().len());

    report.untranslated = translate_document(pipeline, &mut doc, cancel)?;
    let report = pipeline.write(&doc, output, report, cancel)?;
    eprintln!("Wrote {}", output.display());
    Ok(report)
}

/// Run the configured translator over `doc` with a progress bar
pub fn translate_document(
    pipeline: &Pipeline,
    doc: &mut BinaryDocument,
    cancel: &CancelToken,
) -> Result<Vec<TranslationFailure>> {
    let languages = pipeline.config().languages()?;
    let translator = match &pipeline.config().translation.endpoint {
        Some(endpoint) => GoogleTranslator::with_endpoint(endpoint.clone()),
        None => GoogleTranslator::new(),
    };

    let total = SlotTranslator::segment_count(doc);
    info!("Translating {} ({} segments)", languages, total);
    let (bar, progress) = translation_bar(total)?;
    let failures = pipeline.translate(doc, &translator, cancel, Some(progress))?;
    bar.finish_and_clear();

    Ok(failures)
}
