//! xlsxlate - Pure-Rust text translation engine for Excel packages
//!
//! This crate rewrites the human-readable text inside an XLSX package (sheet titles,
//! cell text, shared strings, comments, drawing and chart labels) through a
//! pluggable translation engine, while leaving formulas, numbers, chart data,
//! styles and the package's part/relationship graph untouched.
//!
//! Every attempted text unit is recorded in a structured log. A failure to
//! translate one piece of text never aborts the rest of the file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxlate::{Translation, TranslateError, WorkbookTranslatorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = WorkbookTranslatorBuilder::new()
//!         .with_target_language("fr")
//!         .build()?;
//!
//!     // Any closure `(text, object_id) -> Result<Translation, TranslateError>` is an engine
//!     let engine = |text: &str, _object_id: &str| -> Result<Translation, TranslateError> {
//!         Ok(Translation::new(format!("[fr] {}", text), "pseudo"))
//!     };
//!
//!     let input = std::fs::read("report.xlsx")?;
//!     let result = translator.translate("report.xlsx", &input, &engine)?;
//!
//!     // report_fr.xlsx
//!     std::fs::write(&result.output_file_name, &result.output_bytes)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Translation Log
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxlate::{write_log_json, IdentityTranslator, LogStatus, WorkbookTranslatorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = WorkbookTranslatorBuilder::new()
//!         .with_target_language("de")
//!         .build()?;
//!     let result = translator.translate_file("report.xlsx", &IdentityTranslator)?;
//!
//!     let failed = result
//!         .log_entries
//!         .iter()
//!         .filter(|entry| entry.status == LogStatus::Error)
//!         .count();
//!     println!("{} entries, {} failed", result.log_entries.len(), failed);
//!
//!     write_log_json(&result.log_entries, File::create("report_de.log.json")?)?;
//!     Ok(())
//! }
//! ```
//!
//! # Partial Failure
//!
//! A malformed part or a structural change in a drawing/chart part aborts the
//! file. The entries logged before the abort are returned with the error:
//!
//! ```rust
//! use xlsxlate::{IdentityTranslator, WorkbookTranslatorBuilder, XlsxlateError};
//!
//! # fn main() -> Result<(), XlsxlateError> {
//! let translator = WorkbookTranslatorBuilder::new()
//!     .with_target_language("es")
//!     .build()?;
//! let failure = translator
//!     .translate("broken.xlsx", b"not a package", &IdentityTranslator)
//!     .unwrap_err();
//! assert!(matches!(failure.error, XlsxlateError::MalformedPackage(_)));
//! assert!(failure.log.is_empty());
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;
mod error;
mod log;
mod orchestrator;
mod package;
mod parts;
mod relationships;
mod security;
mod sheet_name;
mod translator;
mod types;
mod xml;

// 公開API
pub use api::{LogStatus, PartKind};
pub use builder::{WorkbookTranslator, WorkbookTranslatorBuilder};
pub use error::{ProcessingFailure, XlsxlateError};
pub use log::{write_log_json, TranslationLogEntry, XML_LAYER_SHEET_NAME};
pub use security::SecurityConfig;
pub use translator::{IdentityTranslator, TranslateError, Translation, Translator};
pub use types::{ProcessingResult, SheetDescriptor};
