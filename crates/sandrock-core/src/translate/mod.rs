//! Machine translation of slot text
//!
//! The [`Translator`] trait is the adapter seam: one fallible call per text
//! segment. [`SlotTranslator`] drives it over a document, splitting each
//! string around its markup, deduplicating segments and running calls on a
//! bounded worker pool. A failed slot keeps its original text.

#[cfg(feature = "http")]
mod google;
mod retry;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::document::BinaryDocument;
use crate::error::{Error, Result};
use crate::markup::{Segment, is_translatable, split_segments, trim_parts};
use crate::report::{FailureKind, TranslationFailure};

#[cfg(feature = "http")]
pub use google::GoogleTranslator;
pub use retry::{
    ExponentialBackoff, FixedDelay, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRIES, NoRetry,
    RetryStrategy,
};

pub const DEFAULT_WORKERS: usize = 4;

/// Language code accepted by translation services
///
/// Either `auto` (source only) or a 2-3 letter code with an optional region,
/// e.g. `de`, `pt-BR`, `zh-CN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub const AUTO: &'static str = "auto";

    pub fn auto() -> Self {
        Self(Self::AUTO.to_string())
    }

    pub fn is_auto(&self) -> bool {
        self.0 == Self::AUTO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::AUTO) {
            return Ok(Self::auto());
        }

        let (lang, region) = match s.split_once(['-', '_']) {
            Some((lang, region)) => (lang, Some(region)),
            None => (s, None),
        };
        let lang_ok = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic());
        let region_ok = region.is_none_or(|r| {
            (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
        });
        if !lang_ok || !region_ok {
            return Err(Error::InvalidLanguage(s.to_string()));
        }

        Ok(Self(match region {
            Some(region) => format!("{}-{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase()),
            None => lang.to_ascii_lowercase(),
        }))
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Result<Self> {
        if target.is_auto() {
            return Err(Error::InvalidLanguage(
                "target language cannot be auto".to_string(),
            ));
        }
        Ok(Self { source, target })
    }

    /// Source and target are the same language
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Worth retrying: rate limiting, server errors, timeouts
    #[error("transient: {0}")]
    Transient(String),

    #[error("permanent: {0}")]
    Permanent(String),
}

impl TranslateError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslateError::Transient(_))
    }

    fn kind(&self) -> FailureKind {
        match self {
            TranslateError::Transient(_) => FailureKind::Transient,
            TranslateError::Permanent(_) => FailureKind::Permanent,
        }
    }

    fn message(&self) -> &str {
        match self {
            TranslateError::Transient(m) | TranslateError::Permanent(m) => m,
        }
    }
}

/// Translation service adapter
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<String, TranslateError>;
}

impl<F> Translator for F
where
    F: Fn(&str, &LanguageCode, &LanguageCode) -> std::result::Result<String, TranslateError>
        + Send
        + Sync,
{
    fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> std::result::Result<String, TranslateError> {
        self(text, source, target)
    }
}

/// Called with `(done, total)` after each segment resolves
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

type Outcome = std::result::Result<String, (FailureKind, String)>;

/// Translates every slot of a document through a [`Translator`]
pub struct SlotTranslator<'a> {
    translator: &'a dyn Translator,
    languages: LanguagePair,
    retry: Box<dyn RetryStrategy>,
    workers: usize,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl<'a> SlotTranslator<'a> {
    pub fn new(translator: &'a dyn Translator, languages: LanguagePair) -> Self {
        Self {
            translator,
            languages,
            retry: Box::new(ExponentialBackoff::default()),
            workers: DEFAULT_WORKERS,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_retry(mut self, retry: Box<dyn RetryStrategy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of distinct segments that would be sent for `doc`
    pub fn segment_count(doc: &BinaryDocument) -> usize {
        unique_segments(doc).len()
    }

    /// Translate all slots, setting replacement text on success
    ///
    /// Per-slot failures are returned, never raised; those slots keep no
    /// replacement. Only pool setup errors abort.
    pub fn run(&self, doc: &mut BinaryDocument) -> Result<Vec<TranslationFailure>> {
        if self.languages.is_identity() {
            info!(
                "Source and target language are both {}, skipping translation",
                self.languages.target
            );
            return Ok(Vec::new());
        }

        let segments = unique_segments(doc);
        info!(
            "Translating {} distinct segments ({}) with {} workers",
            segments.len(),
            self.languages,
            self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("translate-{}", i))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to start worker pool: {}", e)))?;

        let total = segments.len();
        // Locked while the callback runs so counts arrive in order
        let done = Mutex::new(0usize);
        let results: HashMap<String, Outcome> = pool.install(|| {
            segments
                .into_par_iter()
                .map(|segment| {
                    let outcome = self.translate_segment(&segment);
                    if let (Some(progress), Ok(mut n)) = (&self.progress, done.lock()) {
                        *n += 1;
                        progress(*n, total);
                    }
                    (segment, outcome)
                })
                .collect()
        });

        let mut failures = Vec::new();
        let mut translated = 0usize;
        for slot in doc.slots_mut() {
            match rebuild(slot.original_text(), &results) {
                Rebuilt::Untouched => {}
                Rebuilt::Text(text) => {
                    slot.set_replacement(text);
                    translated += 1;
                }
                Rebuilt::Failed(kind, message) => {
                    debug!("Slot {} left untranslated ({}): {}", slot.id(), kind, message);
                    failures.push(TranslationFailure {
                        slot: slot.id(),
                        record_id: slot.record_id(),
                        kind,
                        message,
                    });
                }
            }
        }

        if failures.is_empty() {
            info!("Translated {} slots", translated);
        } else {
            warn!(
                "Translated {} slots, {} left untranslated",
                translated,
                failures.len()
            );
        }
        Ok(failures)
    }

    fn translate_segment(&self, segment: &str) -> Outcome {
        let mut retry = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err((FailureKind::Cancelled, "run cancelled".to_string()));
            }

            match self
                .translator
                .translate(segment, &self.languages.source, &self.languages.target)
            {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => {
                    retry += 1;
                    let Some(delay) = self.retry.delay(retry) else {
                        return Err((e.kind(), e.message().to_string()));
                    };
                    debug!(
                        "Transient translation error ({}), retry {} in {}ms",
                        e.message(),
                        retry,
                        delay.as_millis()
                    );
                    if self.cancel.wait(delay) {
                        return Err((FailureKind::Cancelled, "run cancelled".to_string()));
                    }
                }
                Err(e) => return Err((e.kind(), e.message().to_string())),
            }
        }
    }
}

/// Distinct translatable segment cores, in first-seen order
fn unique_segments(doc: &BinaryDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for slot in doc.slots() {
        for segment in split_segments(slot.original_text()) {
            let Segment::Text(text) = segment else {
                continue;
            };
            let (_, core, _) = trim_parts(text);
            if is_translatable(core) && seen.insert(core) {
                out.push(core.to_string());
            }
        }
    }
    out
}

enum Rebuilt {
    /// Nothing in the string is translatable
    Untouched,
    Text(String),
    Failed(FailureKind, String),
}

fn rebuild(original: &str, results: &HashMap<String, Outcome>) -> Rebuilt {
    let mut out = String::with_capacity(original.len());
    let mut any = false;

    for segment in split_segments(original) {
        match segment {
            Segment::Markup(token) => out.push_str(token),
            Segment::Text(text) => {
                let (lead, core, trail) = trim_parts(text);
                out.push_str(lead);
                match results.get(core) {
                    Some(Ok(translated)) => {
                        out.push_str(translated);
                        any = true;
                    }
                    Some(Err((kind, message))) => return Rebuilt::Failed(*kind, message.clone()),
                    None => out.push_str(core),
                }
                out.push_str(trail);
            }
        }
    }

    if any {
        Rebuilt::Text(out)
    } else {
        Rebuilt::Untouched
    }
}
