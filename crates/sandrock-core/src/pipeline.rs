//! Read, translate and patch steps wired to one configuration
//!
//! Exporting and one-step translation share the same reader and patcher;
//! only the source of replacement text differs.

use std::path::Path;

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::codec::TextCodec;
use crate::config::ToolConfig;
use crate::document::{BinaryDocument, write_atomic};
use crate::error::{Error, Result};
use crate::layout::SectorLayout;
use crate::mapping::{ImportOutcome, Mapping, MappingFile};
use crate::patch::{PatchOutput, SlotPatcher};
use crate::report::{RunReport, TranslationFailure};
use crate::splice::{SpliceOutcome, splice};
use crate::translate::{ProgressFn, SlotTranslator, Translator};

pub struct Pipeline {
    config: ToolConfig,
    codec: TextCodec,
}

impl Pipeline {
    pub fn new(config: ToolConfig) -> Result<Self> {
        config.validate()?;
        let codec = config.codec()?;
        Ok(Self { config, codec })
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn codec(&self) -> &TextCodec {
        &self.codec
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<BinaryDocument> {
        BinaryDocument::open(path, &self.config.sector, &self.codec)
    }

    /// Open a second copy of the file whose sector may sit elsewhere
    pub fn open_with_layout<P: AsRef<Path>>(
        &self,
        path: P,
        layout: &SectorLayout,
    ) -> Result<BinaryDocument> {
        BinaryDocument::open(path, layout, &self.codec)
    }

    /// Machine-translate every slot of `doc`
    pub fn translate(
        &self,
        doc: &mut BinaryDocument,
        translator: &dyn Translator,
        cancel: &CancelToken,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<TranslationFailure>> {
        let mut runner = SlotTranslator::new(translator, self.config.languages()?)
            .with_retry(self.config.retry_strategy())
            .with_workers(self.config.translation.workers)
            .with_cancel(cancel.clone());
        if let Some(progress) = progress {
            runner = runner.with_progress(progress);
        }
        runner.run(doc)
    }

    /// Write `doc` as a mapping file
    pub fn export<P: AsRef<Path>>(&self, doc: &BinaryDocument, path: P) -> Result<Mapping> {
        let mapping = Mapping::export(doc);
        mapping.save(path)?;
        Ok(mapping)
    }

    pub fn import<P: AsRef<Path>>(
        &self,
        doc: &mut BinaryDocument,
        path: P,
    ) -> Result<ImportOutcome> {
        Ok(MappingFile::load(path)?.apply(doc))
    }

    pub fn splice(&self, doc: &mut BinaryDocument, donor: &BinaryDocument) -> SpliceOutcome {
        splice(doc, donor)
    }

    pub fn patch(&self, doc: &BinaryDocument) -> PatchOutput {
        SlotPatcher::new(&self.codec, &self.config.patch).patch(doc)
    }

    /// Patch `doc` and persist the result to `output`
    ///
    /// Nothing is written when the run was cancelled or, in strict mode,
    /// when any slot had to be truncated.
    pub fn write<P: AsRef<Path>>(
        &self,
        doc: &BinaryDocument,
        output: P,
        mut report: RunReport,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        let patched = self.patch(doc);
        patched.record_into(&mut report);

        if cancel.is_cancelled() {
            warn!("Run cancelled, output not written");
            return Err(Error::Cancelled);
        }
        let report = if self.config.patch.strict {
            report.into_strict()?
        } else {
            report
        };

        write_atomic(output.as_ref(), &patched.bytes)?;
        info!(
            "Patched {} slots into {}",
            report.written,
            output.as_ref().display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{LanguageCode, TranslateError};
    use std::fs;

    type Reply = std::result::Result<String, TranslateError>;

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

    fn setup(texts: &[&str]) -> (tempfile::TempDir, std::path::PathBuf, Pipeline) {
        let dir = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = texts
            .iter()
            .enumerate()
            .flat_map(|(i, t)| record(i as u32 + 1, t))
            .collect();
        let input = dir.path().join("english.dat");
        fs::write(&input, &bytes).unwrap();

        let config = ToolConfig::builder()
            .first_byte(0)
            .last_byte(bytes.len() - 1)
            .target("de".parse().unwrap())
            .build();
        (dir, input, Pipeline::new(config).unwrap())
    }

    #[test]
    fn test_export_edit_import_patch() {
        let (dir, input, pipeline) = setup(&["Hello!", "Quit"]);
        let doc = pipeline.open(&input).unwrap();
        let mapping_path = dir.path().join("mapping.json");
        let mut mapping = pipeline.export(&doc, &mapping_path).unwrap();

        mapping.entries[1].translation = Some("Ende".to_string());
        mapping.save(&mapping_path).unwrap();

        let mut doc = pipeline.open(&input).unwrap();
        let outcome = pipeline.import(&mut doc, &mapping_path).unwrap();
        assert_eq!(outcome.applied, 2);

        let output = dir.path().join("patched.dat");
        let report = pipeline
            .write(&doc, &output, RunReport::new(doc.slots().len()), &CancelToken::new())
            .unwrap();
        assert_eq!(report.written, 1);

        let patched = fs::read(&output).unwrap();
        assert_eq!(patched.len(), doc.len());
        let reparsed = pipeline.open(&output).unwrap();
        assert_eq!(reparsed.slots()[1].original_text(), "Ende");
        assert_eq!(reparsed.slots()[0].original_text(), "Hello!");
    }

    #[test]
    fn test_cancelled_run_writes_nothing() {
        let (dir, input, pipeline) = setup(&["Hello!"]);
        let doc = pipeline.open(&input).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let output = dir.path().join("patched.dat");
        let err = pipeline
            .write(&doc, &output, RunReport::new(1), &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(!output.exists());
    }

    #[test]
    fn test_strict_mode_refuses_truncation() {
        let (dir, input, _) = setup(&["Hi"]);
        let config = ToolConfig::builder()
            .first_byte(0)
            .last_byte(11)
            .strict(true)
            .build();
        let pipeline = Pipeline::new(config).unwrap();
        let mut doc = pipeline.open(&input).unwrap();
        let id = doc.slots()[0].id();
        doc.set_replacement(id, "Hallo Welt").unwrap();

        let output = dir.path().join("patched.dat");
        let err = pipeline
            .write(&doc, &output, RunReport::new(1), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::CapacityViolation { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_translate_then_write() {
        let (dir, input, pipeline) = setup(&["Yes", "No [x]"]);
        let mut doc = pipeline.open(&input).unwrap();
        let translator = |text: &str, _: &LanguageCode, _: &LanguageCode| -> Reply {
            Ok(match text {
                "Yes" => "Ja".to_string(),
                "No" => "Ne".to_string(),
                other => other.to_string(),
            })
        };
        let failures = pipeline
            .translate(&mut doc, &translator, &CancelToken::new(), None)
            .unwrap();
        assert!(failures.is_empty());

        let output = dir.path().join("patched.dat");
        pipeline
            .write(&doc, &output, RunReport::new(2), &CancelToken::new())
            .unwrap();
        let reparsed = pipeline.open(&output).unwrap();
        assert_eq!(reparsed.slots()[0].original_text(), "Ja");
        assert_eq!(reparsed.slots()[1].original_text(), "Ne [x]");
    }
}
