//! Tool configuration
//!
//! Settings come from an optional `sandrock.toml` and are then overridden by
//! command line flags through [`ToolConfigBuilder`]:
//!
//! ```toml
//! [sector]
//! first_byte = 92508
//! last_byte = 13807635
//!
//! [codec]
//! encoding = "utf-8"
//! fill_byte = 0
//!
//! [translation]
//! source = "auto"
//! target = "de"
//! workers = 4
//! retry = "exponential"
//!
//! [patch]
//! length_prefix = "preserve"
//! strict = false
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::codec::{CodecConfig, TextCodec};
use crate::error::{Error, Result};
use crate::layout::SectorLayout;
use crate::patch::{LengthPrefix, PatchOptions};
use crate::translate::{
    DEFAULT_WORKERS, ExponentialBackoff, FixedDelay, INITIAL_BACKOFF_MS, LanguageCode,
    LanguagePair, MAX_BACKOFF_MS, MAX_RETRIES, NoRetry, RetryStrategy,
};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "sandrock.toml";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RetryKind {
    None,
    Fixed,
    #[default]
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationSettings {
    pub source: LanguageCode,
    pub target: Option<LanguageCode>,
    /// Concurrent translation calls
    pub workers: usize,
    pub retry: RetryKind,
    pub max_retries: u32,
    /// First (or fixed) retry delay
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Override for the HTTP translation endpoint
    pub endpoint: Option<String>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source: LanguageCode::auto(),
            target: None,
            workers: DEFAULT_WORKERS,
            retry: RetryKind::default(),
            max_retries: MAX_RETRIES,
            backoff_ms: INITIAL_BACKOFF_MS,
            max_backoff_ms: MAX_BACKOFF_MS,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub sector: SectorLayout,
    pub codec: CodecConfig,
    pub translation: TranslationSettings,
    pub patch: PatchOptions,
}

impl ToolConfig {
    /// Create a new configuration builder
    pub fn builder() -> ToolConfigBuilder {
        ToolConfigBuilder::default()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else `sandrock.toml` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::load(DEFAULT_CONFIG_FILE) {
                Ok(config) => Ok(config),
                Err(e) if e.is_not_found() => {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
                Err(e) => Err(e),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.sector.validate()?;
        TextCodec::new(&self.codec)?;
        if self.translation.workers == 0 {
            return Err(Error::InvalidConfig(
                "translation workers must be at least 1".to_string(),
            ));
        }
        if self.translation.target.as_ref().is_some_and(LanguageCode::is_auto) {
            return Err(Error::InvalidLanguage(
                "target language cannot be auto".to_string(),
            ));
        }
        Ok(())
    }

    pub fn codec(&self) -> Result<TextCodec> {
        TextCodec::new(&self.codec)
    }

    /// Source and target language; a target is required
    pub fn languages(&self) -> Result<LanguagePair> {
        let target = self.translation.target.clone().ok_or_else(|| {
            Error::InvalidConfig("no target language configured".to_string())
        })?;
        LanguagePair::new(self.translation.source.clone(), target)
    }

    pub fn retry_strategy(&self) -> Box<dyn RetryStrategy> {
        let t = &self.translation;
        match t.retry {
            RetryKind::None => Box::new(NoRetry),
            RetryKind::Fixed => Box::new(FixedDelay {
                delay: Duration::from_millis(t.backoff_ms),
                max_retries: t.max_retries,
            }),
            RetryKind::Exponential => Box::new(ExponentialBackoff {
                initial: Duration::from_millis(t.backoff_ms),
                max: Duration::from_millis(t.max_backoff_ms),
                max_retries: t.max_retries,
            }),
        }
    }
}

/// Overrides applied on top of a loaded configuration
#[derive(Debug, Clone, Default)]
pub struct ToolConfigBuilder {
    first_byte: Option<usize>,
    last_byte: Option<usize>,
    encoding: Option<String>,
    fill_byte: Option<u8>,
    reserve_terminator: Option<bool>,
    source: Option<LanguageCode>,
    target: Option<LanguageCode>,
    workers: Option<usize>,
    strict: Option<bool>,
    length_prefix: Option<LengthPrefix>,
    guard_markup: Option<bool>,
}

impl ToolConfigBuilder {
    pub fn first_byte(mut self, value: usize) -> Self {
        self.first_byte = Some(value);
        self
    }

    pub fn last_byte(mut self, value: usize) -> Self {
        self.last_byte = Some(value);
        self
    }

    /// Set the WHATWG encoding label
    pub fn encoding<S: Into<String>>(mut self, label: S) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn fill_byte(mut self, value: u8) -> Self {
        self.fill_byte = Some(value);
        self
    }

    pub fn reserve_terminator(mut self, enabled: bool) -> Self {
        self.reserve_terminator = Some(enabled);
        self
    }

    pub fn source(mut self, code: LanguageCode) -> Self {
        self.source = Some(code);
        self
    }

    pub fn target(mut self, code: LanguageCode) -> Self {
        self.target = Some(code);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Fail the run on any truncation
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = Some(enabled);
        self
    }

    pub fn length_prefix(mut self, policy: LengthPrefix) -> Self {
        self.length_prefix = Some(policy);
        self
    }

    pub fn guard_markup(mut self, enabled: bool) -> Self {
        self.guard_markup = Some(enabled);
        self
    }

    /// Apply the overrides to `base`
    pub fn build_on(self, base: ToolConfig) -> ToolConfig {
        let ToolConfig {
            mut sector,
            mut codec,
            mut translation,
            mut patch,
        } = base;

        sector.first_byte = self.first_byte.unwrap_or(sector.first_byte);
        sector.last_byte = self.last_byte.unwrap_or(sector.last_byte);

        codec.encoding = self.encoding.unwrap_or(codec.encoding);
        codec.fill_byte = self.fill_byte.unwrap_or(codec.fill_byte);
        codec.reserve_terminator = self.reserve_terminator.unwrap_or(codec.reserve_terminator);

        translation.source = self.source.unwrap_or(translation.source);
        translation.target = self.target.or(translation.target);
        translation.workers = self.workers.unwrap_or(translation.workers);

        patch.strict = self.strict.unwrap_or(patch.strict);
        patch.length_prefix = self.length_prefix.unwrap_or(patch.length_prefix);
        patch.guard_markup = self.guard_markup.unwrap_or(patch.guard_markup);

        ToolConfig {
            sector,
            codec,
            translation,
            patch,
        }
    }

    /// Apply the overrides to the defaults
    pub fn build(self) -> ToolConfig {
        self.build_on(ToolConfig::default())
    }
}
