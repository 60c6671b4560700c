//! Run-time job accumulator.
//!
//! [`JobSpecification`] follows the same protocol as
//! [`JobBuilder`](crate::job::JobBuilder) but checks it while the program
//! runs, for callers that assemble jobs from data (a request body, a queue
//! message) where the number of sources is only known at run time.

use crate::config::ConverterConfig;
use crate::error::{JobError, Rejected};
use crate::job::executable::ConversionJob;
use crate::job::resolve;
use crate::job::source::{SourceInput, SourceItem};
use crate::job::target::{TargetDescriptor, TargetInput};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How far a [`JobSpecification`] has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Empty,
    SourceSpecified,
    TargetSet,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Empty => f.write_str("empty"),
            JobState::SourceSpecified => f.write_str("source specified"),
            JobState::TargetSet => f.write_str("target set"),
        }
    }
}

/// Mutable job description checked at run time.
///
/// A rejected call changes nothing. `build` consumes the specification; on
/// failure it is handed back inside [`Rejected`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_docjob::{ConverterConfig, JobSpecification};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), edgequake_docjob::JobError> {
/// let chapters = ["one.odt", "two.odt", "three.odt"];
/// let mut spec = JobSpecification::new(Arc::new(ConverterConfig::default()));
/// for chapter in chapters {
///     spec.add_source(chapter)?;
/// }
/// spec.set_target("book.pdf")?;
/// let job = spec.build()?;
/// assert_eq!(job.sources().len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct JobSpecification {
    config: Arc<ConverterConfig>,
    sources: Vec<SourceItem>,
    target: Option<TargetDescriptor>,
}

impl JobSpecification {
    pub fn new(config: Arc<ConverterConfig>) -> Self {
        Self {
            config,
            sources: Vec::new(),
            target: None,
        }
    }

    /// Append a source. Legal in every state.
    pub fn add_source(&mut self, source: impl Into<SourceInput>) -> Result<&mut Self, JobError> {
        let item = source.into().resolve(&self.config)?;
        debug!(
            "Accepted source #{}: {} ({})",
            self.sources.len() + 1,
            resolve::location(item.path()),
            item.format().name()
        );
        self.sources.push(item);
        Ok(self)
    }

    /// Set the single target.
    ///
    /// # Errors
    /// [`JobError::TargetBeforeSource`] before the first source and
    /// [`JobError::TargetAlreadySet`] on a second call, both without touching
    /// the new target. Otherwise the same errors as
    /// [`JobBuilder::set_target`](crate::job::JobBuilder::set_target).
    pub fn set_target(&mut self, target: impl Into<TargetInput>) -> Result<&mut Self, JobError> {
        match self.state() {
            JobState::Empty => return Err(JobError::TargetBeforeSource),
            JobState::TargetSet => return Err(JobError::TargetAlreadySet),
            JobState::SourceSpecified => {}
        }
        let descriptor = target.into().resolve(&self.config)?;
        debug!(
            "Accepted target {} ({})",
            resolve::location(descriptor.path()),
            descriptor.format().name()
        );
        self.target = Some(descriptor);
        Ok(self)
    }

    pub fn state(&self) -> JobState {
        match (self.sources.is_empty(), self.target.is_some()) {
            (true, _) => JobState::Empty,
            (false, false) => JobState::SourceSpecified,
            (false, true) => JobState::TargetSet,
        }
    }

    /// At least one source and a resolved target.
    pub fn is_executable(&self) -> bool {
        self.state() == JobState::TargetSet
    }

    pub fn sources(&self) -> &[SourceItem] {
        &self.sources
    }

    pub fn target(&self) -> Option<&TargetDescriptor> {
        self.target.as_ref()
    }

    /// Freeze the job.
    ///
    /// # Errors
    /// [`JobError::IncompleteSpecification`] when there is no source or no
    /// target yet.
    pub fn build(mut self) -> Result<ConversionJob, Rejected<Self>> {
        if self.sources.is_empty() {
            return Err(Rejected::new(
                self,
                JobError::IncompleteSpecification { missing: "a source" },
            ));
        }
        let Some(target) = self.target.take() else {
            return Err(Rejected::new(
                self,
                JobError::IncompleteSpecification { missing: "a target" },
            ));
        };
        let job = ConversionJob::new(std::mem::take(&mut self.sources), target, Arc::clone(&self.config));
        debug!(
            "Built job: {} source(s) -> {}",
            job.sources().len(),
            job.target().format().name()
        );
        Ok(job)
    }
}

impl fmt::Debug for JobSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSpecification")
            .field("state", &self.state())
            .field("sources", &self.sources)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::stream::OutputStream;
    use document_formats::FormatRegistry;
    use std::path::PathBuf;

    fn spec() -> JobSpecification {
        JobSpecification::new(Arc::new(ConverterConfig::default()))
    }

    fn write(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, name).unwrap();
        path
    }

    #[test]
    fn build_without_sources_is_incomplete() {
        let rejected = spec().build().unwrap_err();
        assert_eq!(rejected.kind(), ErrorKind::IncompleteSpecification);
        assert!(rejected.to_string().contains("a source"));
        assert_eq!(rejected.into_builder().state(), JobState::Empty);
    }

    #[test]
    fn build_without_target_is_incomplete_and_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = spec();
        s.add_source(write(&dir, "a.txt")).unwrap();
        assert!(!s.is_executable());

        let rejected = s.build().unwrap_err();
        assert!(rejected.to_string().contains("a target"));

        let mut s = rejected.into_builder();
        assert_eq!(s.sources().len(), 1);
        s.set_target(dir.path().join("a.pdf")).unwrap();
        assert!(s.is_executable());
        assert_eq!(s.build().unwrap().sources().len(), 1);
    }

    #[test]
    fn second_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = spec();
        s.add_source(write(&dir, "a.txt"))
            .unwrap()
            .set_target(dir.path().join("a.pdf"))
            .unwrap();

        let err = s.set_target(dir.path().join("a.odt")).unwrap_err();
        assert!(matches!(err, JobError::TargetAlreadySet));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(s.target().unwrap().format().extension(), "pdf");
    }

    #[test]
    fn target_before_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = spec();
        let err = s.set_target(dir.path().join("a.pdf")).unwrap_err();
        assert!(matches!(err, JobError::TargetBeforeSource));
        assert_eq!(s.state(), JobState::Empty);
    }

    #[test]
    fn failed_target_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputStream::new(Vec::<u8>::new());
        let mut s = spec();
        s.add_source(write(&dir, "a.txt")).unwrap();

        let err = s.set_target(out.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatResolution);
        assert_eq!(s.state(), JobState::SourceSpecified);

        let pdf = ConverterConfig::default().registry.format_by_extension("pdf").unwrap();
        s.set_target(TargetInput::stream(out).with_format(pdf)).unwrap();
        assert_eq!(s.state(), JobState::TargetSet);
    }

    #[test]
    fn sources_after_target_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt");
        let b = write(&dir, "b.txt");
        let mut s = spec();
        s.add_source(a.as_path()).unwrap();
        s.set_target(dir.path().join("out.pdf")).unwrap();
        s.add_source(b.as_path()).unwrap();
        assert_eq!(s.state(), JobState::TargetSet);

        let job = s.build().unwrap();
        assert_eq!(job.sources()[0].path(), Some(a.as_path()));
        assert_eq!(job.sources()[1].path(), Some(b.as_path()));
        assert_eq!(job.target().format().extension(), "pdf");
    }
}
