//! Prelude module for convenient imports
//!
//! ```ignore
//! use sandrock_core::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Pipeline and configuration: `Pipeline`, `ToolConfig`
//! - Document model: `BinaryDocument`, `Slot`, `SlotId`, `SectorLayout`
//! - Mapping files: `Mapping`, `MappingFile`
//! - Translation: `Translator`, `TranslateError`, `LanguageCode`, `CancelToken`
//! - Error handling: `Error`, `Result`

// Pipeline and configuration
pub use crate::config::ToolConfig;
pub use crate::pipeline::Pipeline;

// Error handling
pub use crate::error::{Error, Result};

// Document model
pub use crate::codec::TextCodec;
pub use crate::document::BinaryDocument;
pub use crate::layout::{SectorLayout, Slot, SlotId};

// Mapping files
pub use crate::mapping::{Mapping, MappingFile};

// Translation
pub use crate::cancel::CancelToken;
pub use crate::translate::{LanguageCode, LanguagePair, TranslateError, Translator};

// Reporting
pub use crate::report::RunReport;
