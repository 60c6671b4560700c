//! Source inputs and resolved source items.

use crate::config::ConverterConfig;
use crate::error::{JobError, Role};
use crate::job::resolve;
use crate::stream::InputStream;
use document_formats::DocumentFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a source document is read from.
#[derive(Debug)]
pub enum SourceOrigin {
    /// A file on disk.
    File(PathBuf),
    /// A caller-supplied byte stream.
    Stream(InputStream),
}

/// An unresolved source, as supplied by the caller.
///
/// Paths, strings and [`InputStream`]s convert into a `SourceInput`, so
/// `builder.add_source("report.txt")` works directly. Use
/// [`SourceInput::with_format`] to name the format explicitly; streams
/// always need one.
#[derive(Debug)]
pub struct SourceInput {
    origin: SourceOrigin,
    format: Option<Arc<DocumentFormat>>,
    close_on_completion: Option<bool>,
}

impl SourceInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: SourceOrigin::File(path.into()),
            format: None,
            close_on_completion: None,
        }
    }

    pub fn stream(stream: InputStream) -> Self {
        Self {
            origin: SourceOrigin::Stream(stream),
            format: None,
            close_on_completion: None,
        }
    }

    /// Use this format instead of inferring one from the extension.
    pub fn with_format(mut self, format: Arc<DocumentFormat>) -> Self {
        self.format = Some(format);
        self
    }

    /// Whether the stream is closed once the job is done with it.
    ///
    /// Defaults to [`ConverterConfig::close_source_streams`]. Ignored for
    /// file sources.
    pub fn close_on_completion(mut self, close: bool) -> Self {
        self.close_on_completion = Some(close);
        self
    }

    pub(crate) fn resolve(self, config: &ConverterConfig) -> Result<SourceItem, JobError> {
        match self.origin {
            SourceOrigin::File(path) => {
                resolve::require_non_empty(Role::Source, &path)?;
                let format =
                    resolve::format_for_path(Role::Source, &path, self.format, &*config.registry)?;
                resolve::check_readable(&path)?;
                Ok(SourceItem {
                    origin: SourceOrigin::File(path),
                    format,
                    close_on_completion: false,
                })
            }
            SourceOrigin::Stream(stream) => {
                let format = resolve::format_for_stream(Role::Source, self.format)?;
                if !stream.is_open() {
                    return Err(JobError::StreamClosed { role: Role::Source });
                }
                Ok(SourceItem {
                    origin: SourceOrigin::Stream(stream),
                    format,
                    close_on_completion: self
                        .close_on_completion
                        .unwrap_or(config.close_source_streams),
                })
            }
        }
    }
}

impl From<PathBuf> for SourceInput {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

impl From<&Path> for SourceInput {
    fn from(path: &Path) -> Self {
        Self::file(path)
    }
}

impl From<&str> for SourceInput {
    fn from(path: &str) -> Self {
        Self::file(path)
    }
}

impl From<String> for SourceInput {
    fn from(path: String) -> Self {
        Self::file(path)
    }
}

impl From<InputStream> for SourceInput {
    fn from(stream: InputStream) -> Self {
        Self::stream(stream)
    }
}

/// One resolved input of a job.
///
/// Immutable once created. When the item is dropped, a stream flagged
/// close-on-completion is closed; this happens when the job that owns the
/// item finishes executing or when an unfinished builder is abandoned.
#[derive(Debug)]
pub struct SourceItem {
    origin: SourceOrigin,
    format: Arc<DocumentFormat>,
    close_on_completion: bool,
}

impl SourceItem {
    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// The path for file sources.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            SourceOrigin::File(path) => Some(path),
            SourceOrigin::Stream(_) => None,
        }
    }

    /// The stream handle for stream sources.
    pub fn stream(&self) -> Option<&InputStream> {
        match &self.origin {
            SourceOrigin::File(_) => None,
            SourceOrigin::Stream(stream) => Some(stream),
        }
    }

    /// The resolved format, shared with the registry it came from.
    pub fn format(&self) -> &Arc<DocumentFormat> {
        &self.format
    }

    /// Always `false` for file sources.
    pub fn close_on_completion(&self) -> bool {
        self.close_on_completion
    }
}

impl Drop for SourceItem {
    fn drop(&mut self) {
        if let (SourceOrigin::Stream(stream), true) = (&self.origin, self.close_on_completion) {
            stream.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_formats::FormatRegistry;
    use std::io::Cursor;

    fn config() -> ConverterConfig {
        ConverterConfig::default()
    }

    fn txt_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "some text").unwrap();
        path
    }

    #[test]
    fn file_source_infers_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = txt_file(&dir, "report.txt");
        let item = SourceInput::from(path.as_path()).resolve(&config()).unwrap();
        assert_eq!(item.format().extension(), "txt");
        assert_eq!(item.path(), Some(path.as_path()));
        assert!(item.stream().is_none());
        assert!(!item.close_on_completion());
    }

    #[test]
    fn file_source_close_flag_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = txt_file(&dir, "report.txt");
        let item = SourceInput::file(path)
            .close_on_completion(true)
            .resolve(&config())
            .unwrap();
        assert!(!item.close_on_completion());
    }

    #[test]
    fn missing_file_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceInput::file(dir.path().join("nope.txt"))
            .resolve(&config())
            .unwrap_err();
        assert!(matches!(err, JobError::SourceNotFound { .. }));
    }

    #[test]
    fn stream_source_uses_config_default_close_flag() {
        let cfg = ConverterConfig::builder()
            .close_source_streams(false)
            .build()
            .unwrap();
        let txt = cfg.registry.format_by_extension("txt").unwrap();
        let item = SourceInput::stream(InputStream::new(Cursor::new(Vec::<u8>::new())))
            .with_format(txt)
            .resolve(&cfg)
            .unwrap();
        assert!(!item.close_on_completion());
        assert!(item.path().is_none());
    }

    #[test]
    fn closed_stream_is_rejected() {
        let cfg = config();
        let stream = InputStream::new(Cursor::new(Vec::<u8>::new()));
        stream.close();
        let txt = cfg.registry.format_by_extension("txt").unwrap();
        let err = SourceInput::stream(stream)
            .with_format(txt)
            .resolve(&cfg)
            .unwrap_err();
        assert!(matches!(err, JobError::StreamClosed { role: Role::Source }));
    }

    #[test]
    fn dropping_flagged_item_closes_stream() {
        let cfg = config();
        let stream = InputStream::new(Cursor::new(b"abc".to_vec()));
        let txt = cfg.registry.format_by_extension("txt").unwrap();

        let kept = SourceInput::stream(stream.clone())
            .with_format(Arc::clone(&txt))
            .close_on_completion(false)
            .resolve(&cfg)
            .unwrap();
        drop(kept);
        assert!(stream.is_open());

        let closed = SourceInput::stream(stream.clone())
            .with_format(txt)
            .resolve(&cfg)
            .unwrap();
        assert!(closed.close_on_completion());
        drop(closed);
        assert!(!stream.is_open());
    }
}
