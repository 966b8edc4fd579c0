//! Human-readable run report.

use owo_colors::OwoColorize;
use sandrock_core::{Error, RunReport};

/// Longest text shown per issue line
const PREVIEW_CHARS: usize = 40;

pub fn print_report(report: &RunReport) {
    let status = if report.is_clean() {
        "OK".green().bold().to_string()
    } else {
        format!("{} issues", report.issue_count())
            .yellow()
            .bold()
            .to_string()
    };
    eprintln!(
        "{} slots, {} written: {}",
        report.slots, report.written, status
    );

    for v in &report.truncated {
        eprintln!(
            "  {} {} (record {}): needs {} bytes, capacity {}, kept {:?}",
            "truncated".yellow(),
            v.slot,
            v.record_id,
            v.required,
            v.capacity,
            preview(&v.kept)
        );
    }
    for v in &report.markup_overflows {
        eprintln!(
            "  {} {} (record {}): needs {} bytes, capacity {}, original kept",
            "markup".yellow(),
            v.slot,
            v.record_id,
            v.required,
            v.capacity
        );
    }
    for failure in &report.untranslated {
        eprintln!(
            "  {} {}",
            "untranslated".red(),
            Error::from(failure)
        );
    }
    for unknown in &report.unknown_slots {
        let slot = unknown
            .slot
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        match unknown.record_id {
            Some(id) => eprintln!("  {} {} (record {})", "unknown".red(), slot, id),
            None => eprintln!("  {} {}", "unknown".red(), slot),
        }
    }
    for slot in &report.unmappable {
        eprintln!(
            "  {} {}: characters outside the file encoding",
            "unmappable".yellow(),
            slot
        );
    }
    if !report.unspliced.is_empty() {
        let ids: Vec<String> = report.unspliced.iter().map(|id| id.to_string()).collect();
        eprintln!(
            "  {} records without donor text: {}",
            "unspliced".yellow(),
            ids.join(", ")
        );
    }
}

/// Shorten `text` for one-line display
pub fn preview(text: &str) -> String {
    let mut out: String = text
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text() {
        assert_eq!(preview("Hello"), "Hello");
    }

    #[test]
    fn test_preview_replaces_control_chars() {
        assert_eq!(preview("a\nb\tc"), "a b c");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "x".repeat(50);
        let out = preview(&text);
        assert_eq!(out.chars().count(), PREVIEW_CHARS + 3);
        assert!(out.ends_with("..."));
    }
}
