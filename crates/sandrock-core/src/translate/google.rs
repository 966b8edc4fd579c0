use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{LanguageCode, TranslateError, Translator};

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const TIMEOUT_SECS: u64 = 30;

/// Google Translate public endpoint
pub struct GoogleTranslator {
    agent: ureq::Agent,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(TIMEOUT_SECS)))
            .build();

        Self {
            agent: config.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for GoogleTranslator {
    fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, TranslateError> {
        let mut response = self
            .agent
            .get(&self.endpoint)
            .query("client", "gtx")
            .query("sl", source.as_str())
            .query("tl", target.as_str())
            .query("dt", "t")
            .query("q", text)
            .call()
            .map_err(classify)?;

        let body = response.body_mut().read_to_string().map_err(classify)?;
        let translated = parse_response(&body)?;
        debug!("Translated {} chars to {}", text.chars().count(), target);
        Ok(translated)
    }
}

/// Extract the translated text from a `dt=t` response
///
/// The body is `[[["translated", "source", ...], ...], ...]`; long input comes
/// back split into several sentence entries which are concatenated.
pub fn parse_response(body: &str) -> Result<String, TranslateError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TranslateError::Permanent(format!("invalid response JSON: {}", e)))?;

    let sentences = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Permanent("response has no sentence list".to_string()))?;

    let mut out = String::new();
    for sentence in sentences {
        if let Some(part) = sentence.get(0).and_then(Value::as_str) {
            out.push_str(part);
        }
    }
    Ok(out)
}

/// Map a transport error to transient or permanent
pub fn classify(err: ureq::Error) -> TranslateError {
    match err {
        ureq::Error::StatusCode(code) if code == 429 || (500..600).contains(&code) => {
            TranslateError::Transient(format!("HTTP {}", code))
        }
        ureq::Error::StatusCode(code) => TranslateError::Permanent(format!("HTTP {}", code)),
        e @ (ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound) => TranslateError::Transient(e.to_string()),
        e => TranslateError::Permanent(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_sentence() {
        let body = r#"[[["Hallo Welt","Hello world",null,null,10]],null,"en"]"#;
        assert_eq!(parse_response(body).unwrap(), "Hallo Welt");
    }

    #[test]
    fn test_parse_joins_sentences() {
        let body = r#"[[["Hallo. ","Hello. ",null],["Tschüss.","Bye.",null]],null,"en"]"#;
        assert_eq!(parse_response(body).unwrap(), "Hallo. Tschüss.");
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(matches!(
            parse_response(r#"{"error": "nope"}"#),
            Err(TranslateError::Permanent(_))
        ));
        assert!(matches!(
            parse_response("<html>"),
            Err(TranslateError::Permanent(_))
        ));
    }

    #[test]
    fn test_classify_status_codes() {
        assert!(classify(ureq::Error::StatusCode(429)).is_transient());
        assert!(classify(ureq::Error::StatusCode(503)).is_transient());
        assert!(!classify(ureq::Error::StatusCode(400)).is_transient());
        assert!(!classify(ureq::Error::StatusCode(403)).is_transient());
    }

    #[test]
    fn test_classify_transport_errors() {
        assert!(classify(ureq::Error::ConnectionFailed).is_transient());
        assert!(classify(ureq::Error::HostNotFound).is_transient());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(classify(ureq::Error::Io(io)).is_transient());
    }
}
