//! Error types for the edgequake-docjob library.
//!
//! Every error is raised synchronously by the call that caused it and is
//! never logged or swallowed by the library. [`JobError`] carries a precise
//! variant for diagnostics; [`JobError::kind`] folds those variants into the
//! four categories callers usually branch on:
//!
//! | [`ErrorKind`] | Raised by | Typical cause |
//! |---------------|-----------|---------------|
//! | `InvalidArgument` | `add_source` / `set_target` | missing or unreadable file, unwritable target, closed stream |
//! | `FormatResolution` | `add_source` / `set_target` | unknown extension, stream without explicit format |
//! | `IncompleteSpecification` | `build` | no source or no target yet |
//! | `Conversion` | execution | the engine failed; passed through untouched |
//!
//! Builders that change type on success hand themselves back on failure
//! inside [`Rejected`], so a rejected call leaves the caller exactly where it
//! was before the call.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a job an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Source,
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => f.write_str("source"),
            Role::Target => f.write_str("target"),
        }
    }
}

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Absent, unreadable or unwritable input, or a closed stream handle.
    InvalidArgument,
    /// No explicit format and none could be inferred.
    FormatResolution,
    /// `build` was called before the job had a source and a target.
    IncompleteSpecification,
    /// The conversion engine reported a failure.
    Conversion,
}

/// All errors returned by the edgequake-docjob library.
#[derive(Debug, Error)]
pub enum JobError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// An empty path was supplied.
    #[error("Empty {role} path")]
    EmptyPath { role: Role },

    /// Source file does not exist.
    #[error("Source document not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Source file exists but could not be opened for reading.
    #[error("Cannot read source document '{path}': {source}")]
    SourceNotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path names a directory or other non-file entry.
    #[error("The {role} path '{path}' is not a regular file")]
    NotAFile { role: Role, path: PathBuf },

    /// Target file exists but is locked or read-only.
    #[error("Target '{path}' exists but is not writable: {source}")]
    TargetNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stream handle was already closed when it was supplied.
    #[error("The {role} stream is already closed")]
    StreamClosed { role: Role },

    /// A target was already recorded for this job.
    #[error("The job already has a target; a job writes exactly one document")]
    TargetAlreadySet,

    /// A target was supplied before any source.
    #[error("A target can only be set after the first source")]
    TargetBeforeSource,

    // ── Format errors ─────────────────────────────────────────────────────
    /// The file extension is not registered.
    #[error("No format registered for extension '{extension}' of {role} '{path}'\nPass an explicit format to override inference.")]
    UnknownExtension {
        role: Role,
        path: PathBuf,
        extension: String,
    },

    /// The path has no extension to infer a format from.
    #[error("Cannot infer the format of {role} '{path}': the file name has no extension")]
    MissingExtension { role: Role, path: PathBuf },

    /// Streams carry no name, so their format must be explicit.
    #[error("A {role} stream requires an explicit format")]
    StreamFormatRequired { role: Role },

    // ── Specification errors ──────────────────────────────────────────────
    /// `build` was called on an incomplete job.
    #[error("Incomplete job specification: {missing} is missing")]
    IncompleteSpecification { missing: &'static str },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The conversion engine failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl JobError {
    /// Category of this error.
    ///
    /// Configuration mistakes are reported as
    /// [`ErrorKind::InvalidArgument`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::EmptyPath { .. }
            | JobError::SourceNotFound { .. }
            | JobError::SourceNotReadable { .. }
            | JobError::NotAFile { .. }
            | JobError::TargetNotWritable { .. }
            | JobError::StreamClosed { .. }
            | JobError::TargetAlreadySet
            | JobError::TargetBeforeSource
            | JobError::InvalidConfig(_) => ErrorKind::InvalidArgument,
            JobError::UnknownExtension { .. }
            | JobError::MissingExtension { .. }
            | JobError::StreamFormatRequired { .. } => ErrorKind::FormatResolution,
            JobError::IncompleteSpecification { .. } => ErrorKind::IncompleteSpecification,
            JobError::Conversion(_) => ErrorKind::Conversion,
        }
    }
}

/// Failure reported by a conversion engine.
///
/// The library passes these through unchanged and never retries;
/// [`ConversionError::is_retryable`] is a hint for the caller.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The engine could not complete the conversion.
    #[error("Conversion failed: {reason}")]
    Engine {
        reason: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The engine cannot convert between these formats.
    #[error("Conversion from '{from}' to '{to}' is not supported")]
    Unsupported { from: String, to: String },

    /// The engine did not finish in time.
    #[error("Conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The conversion was cancelled before completion.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Reading a source or writing the target failed.
    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Engine failure with a message only.
    pub fn engine(reason: impl Into<String>) -> Self {
        Self::Engine {
            reason: reason.into(),
            cause: None,
        }
    }

    /// Engine failure wrapping the underlying error.
    pub fn engine_with_cause(
        reason: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Engine {
            reason: reason.into(),
            cause: Some(cause.into()),
        }
    }

    /// Whether retrying the same job might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

/// A rejected builder call: the error plus the builder, unchanged.
///
/// Converts into [`JobError`] so `?` works in functions returning
/// `Result<_, JobError>`; use [`Rejected::into_builder`] to retry instead.
pub struct Rejected<B> {
    builder: B,
    error: JobError,
}

impl<B> Rejected<B> {
    pub(crate) fn new(builder: B, error: JobError) -> Self {
        Self { builder, error }
    }

    pub fn error(&self) -> &JobError {
        &self.error
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Recover the builder in the state it had before the rejected call.
    pub fn into_builder(self) -> B {
        self.builder
    }

    pub fn into_error(self) -> JobError {
        self.error
    }

    pub fn into_parts(self) -> (B, JobError) {
        (self.builder, self.error)
    }
}

impl<B> fmt::Debug for Rejected<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<B> fmt::Display for Rejected<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<B> std::error::Error for Rejected<B> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

impl<B> From<Rejected<B>> for JobError {
    fn from(rejected: Rejected<B>) -> Self {
        rejected.error
    }
}
