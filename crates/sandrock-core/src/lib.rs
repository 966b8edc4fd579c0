//! # sandrock-core
//!
//! Core library for patching the localization binary of the game.
//!
//! This crate provides:
//! - Record layout parsing into fixed-capacity text slots
//! - A configurable text codec with capacity-safe truncation
//! - JSON mapping export and import for manual editing
//! - Markup-aware machine translation over a bounded worker pool
//! - A patcher that never changes the file size
//!
//! ## Feature Flags
//!
//! - `http`: Enables [`translate::GoogleTranslator`], a translation adapter
//!   for the public Google Translate endpoint.

pub mod cancel;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod markup;
pub mod patch;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod splice;
pub mod translate;

pub use cancel::CancelToken;
pub use codec::{CodecConfig, Fitted, TextCodec};
pub use config::{RetryKind, ToolConfig, ToolConfigBuilder, TranslationSettings};
pub use document::{BinaryDocument, write_atomic};
pub use error::{Error, Result};
pub use layout::{SectorLayout, Slot, SlotId};
pub use mapping::{ImportOutcome, LegacyEntry, Mapping, MappingEntry, MappingFile};
pub use patch::{LengthPrefix, PatchOptions, PatchOutput, SlotPatcher};
pub use pipeline::Pipeline;
pub use report::{
    CapacityViolation, FailureKind, MarkupOverflow, RunReport, TranslationFailure, UnknownSlot,
};
pub use splice::{SpliceOutcome, splice};
#[cfg(feature = "http")]
pub use translate::GoogleTranslator;
pub use translate::{
    ExponentialBackoff, FixedDelay, LanguageCode, LanguagePair, NoRetry, ProgressFn,
    RetryStrategy, SlotTranslator, TranslateError, Translator,
};
