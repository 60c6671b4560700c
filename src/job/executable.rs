//! The immutable, executable job and its serialisable summary.

use crate::config::ConverterConfig;
use crate::job::resolve;
use crate::job::source::{SourceItem, SourceOrigin};
use crate::job::target::{TargetDescriptor, TargetSink};
use document_formats::{DocumentFamily, PropertyMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A complete conversion job: one or more sources merged, in order, into one
/// target.
///
/// Only produced by a successful build, so it always has at least one
/// resolved source and exactly one resolved target. Dropping the job closes
/// every flagged stream it holds.
#[derive(Debug)]
pub struct ConversionJob {
    sources: Vec<SourceItem>,
    target: TargetDescriptor,
    config: Arc<ConverterConfig>,
}

impl ConversionJob {
    pub(crate) fn new(
        sources: Vec<SourceItem>,
        target: TargetDescriptor,
        config: Arc<ConverterConfig>,
    ) -> Self {
        debug_assert!(!sources.is_empty());
        Self {
            sources,
            target,
            config,
        }
    }

    /// All sources in merge order; the first is the primary source.
    pub fn sources(&self) -> &[SourceItem] {
        &self.sources
    }

    pub fn primary_source(&self) -> &SourceItem {
        &self.sources[0]
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// Whether more than one document is merged into the target.
    pub fn is_merge(&self) -> bool {
        self.sources.len() > 1
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Properties an engine should use to load source `index`.
    ///
    /// The source format's load properties with the configured load
    /// properties laid over them. `None` when `index` is out of range.
    pub fn load_properties(&self, index: usize) -> Option<PropertyMap> {
        let source = self.sources.get(index)?;
        let mut props = source.format().load_properties().clone();
        props.extend(self.config.load_properties.clone());
        Some(props)
    }

    /// Properties an engine should use to store the target.
    ///
    /// Store properties depend on the family of the document being stored,
    /// which is the primary source's input family. Formats without a family
    /// are stored as text. Configured store properties are laid over the
    /// format's own.
    pub fn store_properties(&self) -> PropertyMap {
        let family = self
            .primary_source()
            .format()
            .input_family()
            .unwrap_or(DocumentFamily::Text);
        let mut props = self
            .target
            .format()
            .store_properties(family)
            .cloned()
            .unwrap_or_default();
        props.extend(self.config.store_properties.clone());
        props
    }

    /// Serialisable description of the job, for logs and assertions.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            sources: self.sources.iter().map(EndpointSummary::from).collect(),
            target: EndpointSummary::from(&self.target),
        }
    }
}

/// What kind of endpoint a source or target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    File,
    Stream,
}

/// One source or the target of a [`JobSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub kind: EndpointKind,
    /// The path, or `<stream>`.
    pub location: String,
    /// Canonical extension of the resolved format.
    pub format: String,
    pub media_type: String,
    pub close_on_completion: bool,
}

impl From<&SourceItem> for EndpointSummary {
    fn from(item: &SourceItem) -> Self {
        let kind = match item.origin() {
            SourceOrigin::File(_) => EndpointKind::File,
            SourceOrigin::Stream(_) => EndpointKind::Stream,
        };
        Self {
            kind,
            location: resolve::location(item.path()),
            format: item.format().extension().to_string(),
            media_type: item.format().media_type().to_string(),
            close_on_completion: item.close_on_completion(),
        }
    }
}

impl From<&TargetDescriptor> for EndpointSummary {
    fn from(target: &TargetDescriptor) -> Self {
        let kind = match target.sink() {
            TargetSink::File(_) => EndpointKind::File,
            TargetSink::Stream(_) => EndpointKind::Stream,
        };
        Self {
            kind,
            location: resolve::location(target.path()),
            format: target.format().extension().to_string(),
            media_type: target.format().media_type().to_string(),
            close_on_completion: target.close_on_completion(),
        }
    }
}

impl fmt::Display for EndpointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location, self.format)
    }
}

/// Serialisable snapshot of a [`ConversionJob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub sources: Vec<EndpointSummary>,
    pub target: EndpointSummary,
}

impl fmt::Display for JobSummary {
    /// `a.txt:txt + b.odt:odt -> out.pdf:pdf`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{source}")?;
        }
        write!(f, " -> {}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConverterConfig;
    use crate::job::{JobBuilder, SourceInput, TargetInput};
    use crate::stream::{InputStream, OutputStream};
    use document_formats::FormatRegistry;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;

    fn config() -> Arc<ConverterConfig> {
        Arc::new(
            ConverterConfig::builder()
                .load_property("Hidden", true)
                .store_property("Overwrite", true)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn effective_properties_overlay_config() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.txt");
        std::fs::write(&src, "hello").unwrap();

        let job = JobBuilder::new(config())
            .add_source(src.as_path())
            .unwrap()
            .set_target(dir.path().join("notes.txt.out.txt"))
            .unwrap()
            .build();

        let load = job.load_properties(0).unwrap();
        assert_eq!(load["Hidden"], json!(true));
        assert_eq!(load["FilterName"], json!("Text (encoded)"));
        assert!(job.load_properties(1).is_none());

        let store = job.store_properties();
        assert_eq!(store["Overwrite"], json!(true));
        assert_eq!(store["FilterName"], json!("Text (encoded)"));
    }

    #[test]
    fn summary_describes_streams_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "a").unwrap();
        let cfg = config();
        let txt = cfg.registry.format_by_extension("txt").unwrap();
        let pdf = cfg.registry.format_by_extension("pdf").unwrap();

        let job = JobBuilder::new(Arc::clone(&cfg))
            .add_source(src.as_path())
            .unwrap()
            .add_source(
                SourceInput::stream(InputStream::new(Cursor::new(b"b".to_vec())))
                    .with_format(txt)
                    .close_on_completion(false),
            )
            .unwrap()
            .set_target(TargetInput::stream(OutputStream::new(Vec::<u8>::new())).with_format(pdf))
            .unwrap()
            .build();

        assert!(job.is_merge());
        let summary = job.summary();
        assert_eq!(summary.sources.len(), 2);
        assert_eq!(summary.sources[0].kind, EndpointKind::File);
        assert_eq!(summary.sources[1].location, "<stream>");
        assert!(!summary.sources[1].close_on_completion);
        assert_eq!(summary.target.kind, EndpointKind::Stream);
        assert!(summary.target.close_on_completion);
        assert!(summary.to_string().ends_with("+ <stream>:txt -> <stream>:pdf"));

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["target"]["kind"], "stream");
        assert_eq!(value["target"]["media_type"], "application/pdf");
    }
}
