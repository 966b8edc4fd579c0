//! Patch command: apply a mapping file or splice from another binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sandrock_core::{CancelToken, Pipeline, RunReport, SectorLayout};
use tracing::warn;

/// Where replacement text comes from
#[derive(Debug, Clone)]
pub enum PatchSource {
    Mapping(PathBuf),
    Binary {
        path: PathBuf,
        first_byte: Option<usize>,
        last_byte: Option<usize>,
    },
}

pub fn run(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    source: &PatchSource,
    cancel: &CancelToken,
) -> Result<RunReport> {
    let mut doc = pipeline
        .open(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut report = RunReport::new(doc.slots().len());

    match source {
        PatchSource::Mapping(path) => {
            let outcome = pipeline
                .import(&mut doc, path)
                .with_context(|| format!("Failed to load mapping {}", path.display()))?;
            outcome.record_into(&mut report);
            eprintln!(
                "Applied {} of {} mapping entries",
                outcome.applied,
                outcome.applied + outcome.skipped + outcome.unknown.len()
            );
        }
        PatchSource::Binary {
            path,
            first_byte,
            last_byte,
        } => {
            let sector = &pipeline.config().sector;
            let layout = SectorLayout {
                first_byte: first_byte.unwrap_or(sector.first_byte),
                last_byte: last_byte.unwrap_or(sector.last_byte),
                alignment: sector.alignment,
            };
            let donor = pipeline
                .open_with_layout(path, &layout)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let outcome = pipeline.splice(&mut doc, &donor);
            outcome.record_into(&mut report);
            if !outcome.missing.is_empty() {
                warn!(
                    "{} records have no counterpart in {}",
                    outcome.missing.len(),
                    path.display()
                );
            }
            eprintln!("Spliced {} slots from {}", outcome.applied, path.display());
        }
    }

    let report = pipeline.write(&doc, output, report, cancel)?;
    eprintln!("Wrote {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandrock_core::ToolConfig;

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

    fn pipeline_for(bytes: &[u8]) -> Pipeline {
        let config = ToolConfig::builder()
            .first_byte(0)
            .last_byte(bytes.len() - 1)
            .build();
        Pipeline::new(config).unwrap()
    }

    #[test]
    fn test_patch_from_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = [record(1, "Start"), record(2, "Quit")].concat();
        let input = dir.path().join("english.dat");
        std::fs::write(&input, &bytes).unwrap();

        let mapping = dir.path().join("mapping.json");
        std::fs::write(
            &mapping,
            r#"[
                {"slot": "0x00000008", "original": "Start", "translation": "Los"},
                {"slot": "0x00001000", "original": "?", "translation": "?"}
            ]"#,
        )
        .unwrap();

        let pipeline = pipeline_for(&bytes);
        let output = dir.path().join("patched.dat");
        let report = run(
            &pipeline,
            &input,
            &output,
            &PatchSource::Mapping(mapping),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.unknown_slots.len(), 1);
        let patched = std::fs::read(&output).unwrap();
        assert_eq!(patched.len(), bytes.len());
        assert_eq!(&patched[8..16], b"Los\0\0\0\0\0");
    }

    #[test]
    fn test_patch_from_binary_with_other_sector() {
        let dir = tempfile::tempdir().unwrap();
        // Record 3 only exists in the newer build
        let bytes = [record(1, "Start"), record(2, "Quit"), record(3, "Load")].concat();
        let input = dir.path().join("english.dat");
        std::fs::write(&input, &bytes).unwrap();

        let mut donor_bytes = vec![0xFF; 8];
        donor_bytes.extend([record(2, "Ende"), record(1, "Los")].concat());
        let donor = dir.path().join("german.dat");
        std::fs::write(&donor, &donor_bytes).unwrap();

        let pipeline = pipeline_for(&bytes);
        let output = dir.path().join("patched.dat");
        let source = PatchSource::Binary {
            path: donor,
            first_byte: Some(8),
            last_byte: Some(donor_bytes.len() - 1),
        };
        let report = run(&pipeline, &input, &output, &source, &CancelToken::new()).unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.unspliced, vec![3]);

        let reparsed = pipeline.open(&output).unwrap();
        assert_eq!(reparsed.slots()[0].original_text(), "Los");
        assert_eq!(reparsed.slots()[1].original_text(), "Ende");
    }
}
