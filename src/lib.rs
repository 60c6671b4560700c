//! # edgequake-docjob
//!
//! Describe document conversion jobs that cannot be malformed, then hand them
//! to a conversion engine.
//!
//! ## Why this crate?
//!
//! An office conversion engine is expensive to start and slow to fail: a
//! missing source, an unknown extension or a stream whose format nobody
//! stated is only discovered after the engine has spun up. This crate checks
//! all of that while the job is being described. A [`ConversionJob`] can
//! only be obtained once it has at least one readable source and exactly one
//! writable target, each with a resolved [`DocumentFormat`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! caller
//!  │
//!  ├─ 1. Source(s)  path or stream, explicit format or inferred from the extension
//!  ├─ 2. Target     path or stream, same format rules, writability check
//!  ├─ 3. Build      immutable ConversionJob (sources in merge order + target)
//!  └─ 4. Execute    Converter::execute(job), optional timeout, batch width
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docjob::{ConversionError, ConversionJob, Converter, DocumentConverter};
//!
//! struct Office;
//!
//! impl Converter for Office {
//!     async fn execute(&self, job: ConversionJob) -> Result<(), ConversionError> {
//!         // drive the engine with job.sources(), job.target(), job.store_properties()
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = DocumentConverter::new(Office);
//!     let job = converter
//!         .convert("report.txt")?
//!         .set_target("report.pdf")?
//!         .build();
//!     let report = converter.execute(job).await?;
//!     eprintln!("{} in {}ms", report.job, report.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Builders
//!
//! | Builder | Protocol checked | Use when |
//! |---------|------------------|----------|
//! | [`JobBuilder`] | at compile time | the job's shape is known in code |
//! | [`JobSpecification`] | at run time | sources come from data |
//!
//! A rejected call never changes the builder: [`JobBuilder`] hands itself
//! back inside [`Rejected`], [`JobSpecification`] is left as it was.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use convert::{ConversionReport, Converter, DocumentConverter};
pub use error::{ConversionError, ErrorKind, JobError, Rejected, Role};
pub use job::{
    ConversionJob, EndpointKind, EndpointSummary, JobBuilder, JobSpecification, JobState, JobSummary,
    SourceInput, SourceItem, SourceOrigin, TargetDescriptor, TargetInput, TargetSink,
};
pub use stream::{InputStream, OutputStream, StreamHandle};

pub use document_formats::{
    default_registry, DocumentFamily, DocumentFormat, FormatRegistry, FormatsError, PropertyMap,
    SimpleFormatRegistry,
};
