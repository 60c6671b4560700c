//! Configuration shared by every job a converter builds.
//!
//! [`ConverterConfig`] holds the format registry used for inference, the
//! default close-on-completion policy for stream endpoints, property
//! overrides merged into each job, and execution limits. It is built through
//! [`ConverterConfigBuilder`], validated once, and then shared behind an
//! `Arc` by every builder and job created from it.

use crate::error::JobError;
use document_formats::{default_registry, FormatRegistry, PropertyMap};
use std::fmt;
use std::sync::Arc;

/// Configuration for job construction and execution.
///
/// Built via [`ConverterConfig::builder()`] or using
/// [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docjob::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .close_target_streams(false)
///     .store_property("Overwrite", true)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert!(!config.close_target_streams);
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Registry consulted when a path-backed source or target has no explicit
    /// format. Default: the built-in registry from `document-formats`.
    pub registry: Arc<dyn FormatRegistry>,

    /// Close-on-completion default for stream sources. Default: true.
    ///
    /// A per-source override always wins.
    pub close_source_streams: bool,

    /// Close-on-completion default for stream targets. Default: true.
    ///
    /// A per-target override always wins.
    pub close_target_streams: bool,

    /// Load properties laid over each source format's own load properties.
    pub load_properties: PropertyMap,

    /// Store properties laid over the target format's store properties.
    pub store_properties: PropertyMap,

    /// Number of jobs run at once by batch execution. Default: 4.
    pub concurrency: usize,

    /// Upper bound for a single engine call, in seconds. Default: none.
    ///
    /// When it elapses the engine future is dropped, which releases the job
    /// and closes its flagged streams, and the call fails with
    /// [`crate::error::ConversionError::Timeout`].
    pub job_timeout_secs: Option<u64>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            close_source_streams: true,
            close_target_streams: true,
            load_properties: PropertyMap::new(),
            store_properties: PropertyMap::new(),
            concurrency: 4,
            job_timeout_secs: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("registry", &"<dyn FormatRegistry>")
            .field("close_source_streams", &self.close_source_streams)
            .field("close_target_streams", &self.close_target_streams)
            .field("load_properties", &self.load_properties)
            .field("store_properties", &self.store_properties)
            .field("concurrency", &self.concurrency)
            .field("job_timeout_secs", &self.job_timeout_secs)
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with a different registry.
    pub fn with_registry(registry: Arc<dyn FormatRegistry>) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn format_registry(mut self, registry: Arc<dyn FormatRegistry>) -> Self {
        self.config.registry = registry;
        self
    }

    pub fn close_source_streams(mut self, v: bool) -> Self {
        self.config.close_source_streams = v;
        self
    }

    pub fn close_target_streams(mut self, v: bool) -> Self {
        self.config.close_target_streams = v;
        self
    }

    pub fn load_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.load_properties.insert(key.into(), value.into());
        self
    }

    pub fn store_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.store_properties.insert(key.into(), value.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn job_timeout_secs(mut self, secs: u64) -> Self {
        self.config.job_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, JobError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(JobError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.job_timeout_secs == Some(0) {
            return Err(JobError::InvalidConfig(
                "Job timeout must be at least one second".into(),
            ));
        }
        let blank_key = c
            .load_properties
            .keys()
            .chain(c.store_properties.keys())
            .find(|k| k.trim().is_empty());
        if blank_key.is_some() {
            return Err(JobError::InvalidConfig(
                "Property names must not be blank".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_formats::SimpleFormatRegistry;

    #[test]
    fn defaults_close_streams_and_use_builtin_registry() {
        let c = ConverterConfig::default();
        assert!(c.close_source_streams);
        assert!(c.close_target_streams);
        assert_eq!(c.concurrency, 4);
        assert!(c.job_timeout_secs.is_none());
        assert!(c.registry.format_by_extension("pdf").is_some());
    }

    #[test]
    fn builder_sets_overrides() {
        let c = ConverterConfig::builder()
            .close_source_streams(false)
            .load_property("Hidden", true)
            .store_property("FilterOptions", "utf8")
            .job_timeout_secs(30)
            .build()
            .unwrap();
        assert!(!c.close_source_streams);
        assert_eq!(c.load_properties["Hidden"], true);
        assert_eq!(c.store_properties["FilterOptions"], "utf8");
        assert_eq!(c.job_timeout_secs, Some(30));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = ConverterConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, JobError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ConverterConfig::builder().job_timeout_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn blank_property_name_is_rejected() {
        let err = ConverterConfig::builder()
            .store_property("  ", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidConfig(_)));
    }

    #[test]
    fn custom_registry_replaces_default() {
        let c = ConverterConfig::with_registry(Arc::new(SimpleFormatRegistry::new()));
        assert!(c.registry.format_by_extension("pdf").is_none());
        assert!(format!("{c:?}").contains("<dyn FormatRegistry>"));
    }
}
