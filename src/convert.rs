//! Handing built jobs to a conversion engine.
//!
//! The library never transcodes bytes itself. A [`Converter`] does the work;
//! [`DocumentConverter`] pairs one with a [`ConverterConfig`], creates
//! builders that share that configuration, and runs finished jobs with the
//! configured timeout and batch width.

use crate::config::ConverterConfig;
use crate::error::{ConversionError, JobError, Rejected};
use crate::job::{ConversionJob, Empty, JobBuilder, JobSpecification, JobSummary, SourceInput, SourceSpecified};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// A conversion engine.
///
/// Receives only complete jobs: at least one resolved source and exactly one
/// resolved target. The engine owns the job for the duration of the call;
/// when it drops the job, flagged streams are closed whether the conversion
/// succeeded or not.
///
/// # Example
/// ```rust
/// use edgequake_docjob::{ConversionError, ConversionJob, Converter};
///
/// struct DryRun;
///
/// impl Converter for DryRun {
///     async fn execute(&self, job: ConversionJob) -> Result<(), ConversionError> {
///         tracing::debug!("Would store with {:?}", job.store_properties());
///         Ok(())
///     }
/// }
/// ```
pub trait Converter: Send + Sync {
    /// Convert the job's sources, merged in order, into its target.
    fn execute(&self, job: ConversionJob) -> impl Future<Output = Result<(), ConversionError>> + Send;

    /// Short engine name used in logs and reports.
    fn name(&self) -> &str {
        "converter"
    }
}

/// Outcome of a successful [`DocumentConverter::execute`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Engine that ran the job.
    pub engine: String,
    /// The job as it was handed to the engine.
    pub job: JobSummary,
    pub source_count: usize,
    /// Wall time of the engine call in milliseconds.
    pub duration_ms: u64,
}

/// A conversion engine plus the configuration its jobs are built with.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docjob::{ConversionError, ConversionJob, Converter, DocumentConverter};
///
/// struct Engine;
/// impl Converter for Engine {
///     async fn execute(&self, _job: ConversionJob) -> Result<(), ConversionError> {
///         Ok(())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), edgequake_docjob::JobError> {
/// let converter = DocumentConverter::new(Engine);
/// let job = converter.convert("report.txt")?.set_target("report.pdf")?.build();
/// let report = converter.execute(job).await?;
/// println!("{} in {}ms", report.job, report.duration_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DocumentConverter<C> {
    config: Arc<ConverterConfig>,
    engine: C,
}

impl<C: Converter> DocumentConverter<C> {
    /// Engine with the default configuration.
    pub fn new(engine: C) -> Self {
        Self::with_config(engine, ConverterConfig::default())
    }

    pub fn with_config(engine: C, config: ConverterConfig) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn engine(&self) -> &C {
        &self.engine
    }

    /// An empty typed builder sharing this converter's configuration.
    pub fn job(&self) -> JobBuilder<Empty> {
        JobBuilder::new(Arc::clone(&self.config))
    }

    /// A typed builder that already holds its primary source.
    pub fn convert(
        &self,
        source: impl Into<SourceInput>,
    ) -> Result<JobBuilder<SourceSpecified>, Rejected<JobBuilder<Empty>>> {
        self.job().add_source(source)
    }

    /// An empty run-time accumulator sharing this converter's configuration.
    pub fn specification(&self) -> JobSpecification {
        JobSpecification::new(Arc::clone(&self.config))
    }

    /// Run one job on the engine.
    ///
    /// Engine failures are returned as [`JobError::Conversion`] without
    /// retrying. When [`ConverterConfig::job_timeout_secs`] elapses the engine
    /// call is dropped and [`ConversionError::Timeout`] is returned.
    pub async fn execute(&self, job: ConversionJob) -> Result<ConversionReport, JobError> {
        let summary = job.summary();
        let source_count = summary.sources.len();
        info!("Executing job on {}: {}", self.engine.name(), summary);

        let start = Instant::now();
        let call = self.engine.execute(job);
        match self.config.job_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
                .await
                .map_err(|_| ConversionError::Timeout { secs })??,
            None => call.await?,
        }
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Job complete: {} source(s) -> {} in {}ms",
            source_count, summary.target, duration_ms
        );
        Ok(ConversionReport {
            engine: self.engine.name().to_string(),
            job: summary,
            source_count,
            duration_ms,
        })
    }

    /// Synchronous wrapper around [`DocumentConverter::execute`].
    ///
    /// Creates a temporary tokio runtime internally, so it must not be
    /// called from within an async context.
    pub fn execute_sync(&self, job: ConversionJob) -> Result<ConversionReport, JobError> {
        tokio::runtime::Runtime::new()
            .map_err(ConversionError::Io)?
            .block_on(self.execute(job))
    }

    /// Run several jobs, at most [`ConverterConfig::concurrency`] at a time.
    ///
    /// Results are returned in input order; one failed job does not stop the
    /// others.
    pub async fn execute_all(
        &self,
        jobs: impl IntoIterator<Item = ConversionJob>,
    ) -> Vec<Result<ConversionReport, JobError>> {
        stream::iter(jobs.into_iter().map(|job| self.execute(job)))
            .buffered(self.config.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<JobSummary>>,
    }

    impl Converter for Recorder {
        async fn execute(&self, job: ConversionJob) -> Result<(), ConversionError> {
            self.seen.lock().unwrap().push(job.summary());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Failing;

    impl Converter for Failing {
        async fn execute(&self, job: ConversionJob) -> Result<(), ConversionError> {
            Err(ConversionError::Unsupported {
                from: job.primary_source().format().extension().to_string(),
                to: job.target().format().extension().to_string(),
            })
        }
    }

    fn source(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, name).unwrap();
        path
    }

    #[test]
    fn execute_hands_job_to_engine() {
        let dir = tempfile::tempdir().unwrap();
        let converter = DocumentConverter::new(Recorder::default());
        let job = converter
            .convert(source(&dir, "report.txt"))
            .unwrap()
            .set_target(dir.path().join("report.pdf"))
            .unwrap()
            .build();

        let report = tokio_test::block_on(converter.execute(job)).unwrap();
        assert_eq!(report.engine, "recorder");
        assert_eq!(report.source_count, 1);
        assert_eq!(report.job.target.format, "pdf");

        let seen = converter.engine().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], report.job);
    }

    #[test]
    fn engine_errors_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let converter = DocumentConverter::new(Failing);
        let job = converter
            .convert(source(&dir, "sheet.png"))
            .unwrap()
            .set_target(dir.path().join("sheet.xlsx"))
            .unwrap()
            .build();

        let err = tokio_test::block_on(converter.execute(job)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(matches!(
            err,
            JobError::Conversion(ConversionError::Unsupported { ref from, ref to }) if from == "png" && to == "xlsx"
        ));
    }

    #[test]
    fn execute_sync_outside_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let converter = DocumentConverter::new(Recorder::default());
        let job = converter
            .convert(source(&dir, "a.odt"))
            .unwrap()
            .set_target(dir.path().join("a.docx"))
            .unwrap()
            .build();
        let report = converter.execute_sync(job).unwrap();
        assert_eq!(report.job.sources[0].format, "odt");
    }

    #[test]
    fn batch_results_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConverterConfig::builder().concurrency(2).build().unwrap();
        let converter = DocumentConverter::with_config(Recorder::default(), config);
        let jobs: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                converter
                    .convert(source(&dir, &format!("{name}.txt")))
                    .unwrap()
                    .set_target(dir.path().join(format!("{name}.pdf")))
                    .unwrap()
                    .build()
            })
            .collect();

        let results = tokio_test::block_on(converter.execute_all(jobs));
        let targets: Vec<String> = results
            .into_iter()
            .map(|r| r.unwrap().job.target.location)
            .collect();
        for (target, name) in targets.iter().zip(["a.pdf", "b.pdf", "c.pdf"]) {
            assert!(target.ends_with(name), "{target}");
        }
    }
}
