//! Statically staged job builder.
//!
//! The builder's type parameter records how far the job has come:
//!
//! ```text
//! JobBuilder<Empty> ──add_source──▶ JobBuilder<SourceSpecified> ──set_target──▶ JobBuilder<TargetSet> ──build──▶ ConversionJob
//!                                      │        ▲                                  │        ▲
//!                                      └────────┘ add_source                       └────────┘ add_source
//! ```
//!
//! Only `JobBuilder<TargetSet>` has a `build` method and only
//! `JobBuilder<SourceSpecified>` has `set_target`, so a job without a source,
//! a job without a target and a job with two targets are all compile errors.
//!
//! Building a job without a target does not compile:
//!
//! ```rust,compile_fail
//! use edgequake_docjob::{ConverterConfig, JobBuilder};
//! use std::sync::Arc;
//!
//! let job = JobBuilder::new(Arc::new(ConverterConfig::default()))
//!     .add_source("report.txt")
//!     .unwrap()
//!     .build();
//! ```
//!
//! Neither does setting the target twice:
//!
//! ```rust,compile_fail
//! use edgequake_docjob::{ConverterConfig, JobBuilder};
//! use std::sync::Arc;
//!
//! let builder = JobBuilder::new(Arc::new(ConverterConfig::default()))
//!     .add_source("report.txt")
//!     .unwrap()
//!     .set_target("report.pdf")
//!     .unwrap()
//!     .set_target("report.odt");
//! ```
//!
//! Nor choosing a target before any source:
//!
//! ```rust,compile_fail
//! use edgequake_docjob::{ConverterConfig, JobBuilder};
//! use std::sync::Arc;
//!
//! let builder = JobBuilder::new(Arc::new(ConverterConfig::default())).set_target("report.pdf");
//! ```
//!
//! Every fallible step returns [`Rejected<Self>`] on failure, which hands the
//! builder back untouched.

use crate::config::ConverterConfig;
use crate::error::{JobError, Rejected};
use crate::job::executable::ConversionJob;
use crate::job::resolve;
use crate::job::source::{SourceInput, SourceItem};
use crate::job::target::{TargetDescriptor, TargetInput};
use document_formats::FormatRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// No source has been added yet.
#[derive(Debug)]
pub struct Empty;

/// At least one source, no target.
#[derive(Debug)]
pub struct SourceSpecified;

/// At least one source and the target.
#[derive(Debug)]
pub struct TargetSet(TargetDescriptor);

/// Builder for a [`ConversionJob`], staged by its type parameter.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docjob::{ConverterConfig, JobBuilder};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), edgequake_docjob::JobError> {
/// let job = JobBuilder::new(Arc::new(ConverterConfig::default()))
///     .add_source("chapter-1.odt")?
///     .add_source("chapter-2.odt")?
///     .set_target("book.pdf")?
///     .build();
/// assert!(job.is_merge());
/// # Ok(())
/// # }
/// ```
pub struct JobBuilder<S> {
    config: Arc<ConverterConfig>,
    sources: Vec<SourceItem>,
    state: S,
}

impl JobBuilder<Empty> {
    pub fn new(config: Arc<ConverterConfig>) -> Self {
        Self {
            config,
            sources: Vec::new(),
            state: Empty,
        }
    }

    /// Builder over the default configuration with a custom registry.
    pub fn with_registry(registry: Arc<dyn FormatRegistry>) -> Self {
        Self::new(Arc::new(ConverterConfig::with_registry(registry)))
    }

    /// Add the primary source.
    ///
    /// # Errors
    /// `FormatResolution` when no format was given and none can be inferred;
    /// `InvalidArgument` when the file is missing or unreadable, or the
    /// stream is already closed.
    pub fn add_source(
        self,
        source: impl Into<SourceInput>,
    ) -> Result<JobBuilder<SourceSpecified>, Rejected<Self>> {
        let item = match self.resolve_source(source.into()) {
            Ok(item) => item,
            Err(e) => return Err(Rejected::new(self, e)),
        };
        let mut next = self.advance(SourceSpecified);
        next.push_source(item);
        Ok(next)
    }
}

impl JobBuilder<SourceSpecified> {
    /// Append another source; it is merged after the ones already added.
    pub fn add_source(mut self, source: impl Into<SourceInput>) -> Result<Self, Rejected<Self>> {
        match self.resolve_source(source.into()) {
            Ok(item) => {
                self.push_source(item);
                Ok(self)
            }
            Err(e) => Err(Rejected::new(self, e)),
        }
    }

    /// Set the single output of the job.
    ///
    /// An existing target file is overwritten when the job runs. Stream
    /// targets are closed on completion unless
    /// [`TargetInput::close_on_completion`] says otherwise.
    ///
    /// # Errors
    /// `FormatResolution` when no format was given and none can be inferred;
    /// `InvalidArgument` when an existing target is not a writable file, or
    /// the stream is already closed. The builder stays in
    /// `SourceSpecified`.
    pub fn set_target(
        self,
        target: impl Into<TargetInput>,
    ) -> Result<JobBuilder<TargetSet>, Rejected<Self>> {
        let descriptor = match target.into().resolve(&self.config) {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(Rejected::new(self, e)),
        };
        debug!(
            "Accepted target {} ({})",
            resolve::location(descriptor.path()),
            descriptor.format().name()
        );
        Ok(self.advance(TargetSet(descriptor)))
    }
}

impl JobBuilder<TargetSet> {
    /// Append another source after the target was set.
    ///
    /// The target is unchanged; the source joins the merge in call order.
    pub fn add_source(mut self, source: impl Into<SourceInput>) -> Result<Self, Rejected<Self>> {
        match self.resolve_source(source.into()) {
            Ok(item) => {
                self.push_source(item);
                Ok(self)
            }
            Err(e) => Err(Rejected::new(self, e)),
        }
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.state.0
    }

    /// Freeze the job. Performs no I/O and cannot fail.
    pub fn build(self) -> ConversionJob {
        let job = ConversionJob::new(self.sources, self.state.0, self.config);
        debug!(
            "Built job: {} source(s) -> {}",
            job.sources().len(),
            job.target().format().name()
        );
        job
    }
}

impl<S> JobBuilder<S> {
    /// Sources accepted so far, in call order.
    pub fn sources(&self) -> &[SourceItem] {
        &self.sources
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn resolve_source(&self, source: SourceInput) -> Result<SourceItem, JobError> {
        source.resolve(&self.config)
    }

    fn push_source(&mut self, item: SourceItem) {
        debug!(
            "Accepted source #{}: {} ({})",
            self.sources.len() + 1,
            resolve::location(item.path()),
            item.format().name()
        );
        self.sources.push(item);
    }

    fn advance<T>(self, state: T) -> JobBuilder<T> {
        JobBuilder {
            config: self.config,
            sources: self.sources,
            state,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for JobBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobBuilder")
            .field("sources", &self.sources)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
