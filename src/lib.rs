//! mergezero - Pure-Rust mail merge from Excel tables
//!
//! This crate reads client records from an XLSX sheet, substitutes them into a
//! templated document (`{{Field}}` placeholders), and produces either one
//! document per client or one consolidated document exported as PDF.
//!
//! The document service, file storage and user prompt are traits
//! ([`services::DocumentService`], [`services::Storage`], [`services::Prompt`])
//! with an in-memory backend and a local filesystem backend.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mergezero::{MailMergeBuilder, Workbook};
//! use mergezero::api::DocumentFormat;
//! use mergezero::services::local::{LocalDocumentService, LocalStorage, TerminalPrompt};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stdin = std::io::stdin();
//!     let mut merge = MailMergeBuilder::new()
//!         .with_time_zone("+02:00")
//!         .build_with(
//!             LocalDocumentService::new("drafts", DocumentFormat::PlainText),
//!             LocalStorage::new("."),
//!             TerminalPrompt::new(stdin.lock(), std::io::stdout(), false),
//!         )?;
//!
//!     // One document per client; locators are written back to "URL Document"
//!     let mut workbook = Workbook::open("clients.xlsx", merge.config().time_zone())?;
//!     let outcome = merge.generate_per_client(&mut workbook)?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```
//!
//! # All Clients on One Page
//!
//! ```rust,no_run
//! use mergezero::{MailMergeBuilder, TemplateFields, Workbook};
//! use mergezero::services::memory::{MemoryDocumentService, MemoryStorage, ScriptedPrompt};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut merge = MailMergeBuilder::new()
//!     .with_fields(TemplateFields::french())
//!     .with_confirmation(false)
//!     .build_with(
//!         MemoryDocumentService::new(),
//!         MemoryStorage::new(),
//!         ScriptedPrompt::default(),
//!     )?;
//!
//! let workbook = Workbook::open("clients.xlsx", merge.config().time_zone())?;
//! if let Some(report) = merge.generate_single_page(&workbook)?.completed() {
//!     println!("PDF: {}", report.pdf);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod aggregate;
mod builder;
pub mod config;
mod document;
mod error;
mod fields;
mod merger;
mod normalizer;
mod orchestrator;
mod output;
mod pdf;
mod security;
pub mod services;
mod template;
mod types;
mod workbook;

// 公開API
pub use aggregate::{aggregate_title, AggregateReport};
pub use api::{DocumentFormat, LocatorReset, RunOutcome, SkipReason, ValueEscaping};
pub use builder::{MailMerge, MailMergeBuilder, MailMergeConfig, DEFAULT_LOCATOR_COLUMN};
pub use document::{Block, Document, DocumentState, HeadingLevel, StoredDocument};
pub use error::MergeError;
pub use fields::{placeholder, FieldBinding, TemplateFields};
pub use merger::RowMerger;
pub use normalizer::{parse_time_zone, ValueNormalizer};
pub use orchestrator::{BatchReport, SingleReport};
pub use output::DocumentRenderer;
pub use pdf::PdfRenderer;
pub use template::{build_template, initialize_header, DEFAULT_TEMPLATE_TITLE};
pub use types::{CellCoord, CellValue, FieldSchema, Locator, Record};
pub use workbook::{HeaderStyle, Sheet, Workbook, DEFAULT_SHEET_NAME};
