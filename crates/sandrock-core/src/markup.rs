//! Game markup inside localized strings
//!
//! Strings carry inline tokens such as `[PlayerName]`, `{0}` or `<color=red>`.
//! Tokens must reach the game byte-for-byte: they are never sent for
//! translation and a slot whose text carries them is never truncated.

/// Opening and closing characters of a markup token
pub const DELIMITERS: [(char, char); 3] = [('[', ']'), ('{', '}'), ('<', '>')];

/// Minimum alphanumeric characters for a text segment to be worth translating
pub const MIN_TRANSLATABLE_ALNUM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Markup(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Text(s) | Segment::Markup(s) => s,
        }
    }
}

/// True if `text` contains any markup opening character
pub fn has_markup(text: &str) -> bool {
    text.chars()
        .any(|c| DELIMITERS.iter().any(|(open, _)| *open == c))
}

/// Split `text` into literal text and markup tokens, in order
///
/// An opener without a matching closer is treated as literal text.
/// Concatenating the segments always yields `text` again.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0usize;
    let mut search_from = 0usize;

    while let Some((open_idx, close)) = next_opener(text, search_from) {
        match text[open_idx + 1..].find(close) {
            Some(rel) => {
                let close_end = open_idx + 1 + rel + close.len_utf8();
                if open_idx > text_start {
                    segments.push(Segment::Text(&text[text_start..open_idx]));
                }
                segments.push(Segment::Markup(&text[open_idx..close_end]));
                text_start = close_end;
                search_from = close_end;
            }
            None => search_from = open_idx + 1,
        }
    }

    if text_start < text.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }
    segments
}

fn next_opener(text: &str, from: usize) -> Option<(usize, char)> {
    text[from..].char_indices().find_map(|(idx, c)| {
        DELIMITERS
            .iter()
            .find(|(open, _)| *open == c)
            .map(|(_, close)| (from + idx, *close))
    })
}

/// Whether a text segment should be sent to a translator
///
/// Translation services mangle lone punctuation, whitespace and empty
/// strings, so those pass through untouched.
pub fn is_translatable(segment: &str) -> bool {
    segment
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(MIN_TRANSLATABLE_ALNUM)
        .count()
        >= MIN_TRANSLATABLE_ALNUM
}

/// Split a segment into leading whitespace, core and trailing whitespace
pub fn trim_parts(segment: &str) -> (&str, &str, &str) {
    let core_start = segment.len() - segment.trim_start().len();
    let core_end = segment.trim_end().len().max(core_start);
    (
        &segment[..core_start],
        &segment[core_start..core_end],
        &segment[core_end..],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[Segment<'_>]) -> String {
        segments.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_plain_text_is_one_segment() {
        assert_eq!(split_segments("Hello"), vec![Segment::Text("Hello")]);
        assert!(split_segments("").is_empty());
    }

    #[test]
    fn test_split_mixed_markup() {
        let text = "Hi [Player], you got {0} <color=red>gold</color>!";
        let segments = split_segments(text);
        assert_eq!(
            segments,
            vec![
                Segment::Text("Hi "),
                Segment::Markup("[Player]"),
                Segment::Text(", you got "),
                Segment::Markup("{0}"),
                Segment::Text(" "),
                Segment::Markup("<color=red>"),
                Segment::Text("gold"),
                Segment::Markup("</color>"),
                Segment::Text("!"),
            ]
        );
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_unclosed_opener_is_text() {
        let text = "5 < 6 and [ok]";
        let segments = split_segments(text);
        assert_eq!(
            segments,
            vec![Segment::Text("5 < 6 and "), Segment::Markup("[ok]")]
        );
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn test_markup_at_edges() {
        let segments = split_segments("{a}b{c}");
        assert_eq!(
            segments,
            vec![
                Segment::Markup("{a}"),
                Segment::Text("b"),
                Segment::Markup("{c}")
            ]
        );
    }

    #[test]
    fn test_has_markup() {
        assert!(has_markup("a [b]"));
        assert!(has_markup("x < y"));
        assert!(!has_markup("plain text"));
    }

    #[test]
    fn test_is_translatable() {
        assert!(is_translatable("Go"));
        assert!(is_translatable(" a b "));
        assert!(!is_translatable("!"));
        assert!(!is_translatable("   "));
        assert!(!is_translatable("a."));
        assert!(!is_translatable(""));
    }

    #[test]
    fn test_trim_parts() {
        assert_eq!(trim_parts("  hi there "), ("  ", "hi there", " "));
        assert_eq!(trim_parts("x"), ("", "x", ""));
        assert_eq!(trim_parts("   "), ("   ", "", ""));
    }
}
