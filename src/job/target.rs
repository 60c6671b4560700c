//! Target inputs and the resolved target descriptor.

use crate::config::ConverterConfig;
use crate::error::{JobError, Role};
use crate::job::resolve;
use crate::stream::OutputStream;
use document_formats::DocumentFormat;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the converted document is written.
#[derive(Debug)]
pub enum TargetSink {
    /// A file on disk; an existing file is overwritten.
    File(PathBuf),
    /// A caller-supplied byte stream.
    Stream(OutputStream),
}

/// An unresolved target, as supplied by the caller.
#[derive(Debug)]
pub struct TargetInput {
    sink: TargetSink,
    format: Option<Arc<DocumentFormat>>,
    close_on_completion: Option<bool>,
}

impl TargetInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: TargetSink::File(path.into()),
            format: None,
            close_on_completion: None,
        }
    }

    pub fn stream(stream: OutputStream) -> Self {
        Self {
            sink: TargetSink::Stream(stream),
            format: None,
            close_on_completion: None,
        }
    }

    /// Write in this format instead of inferring one from the extension.
    pub fn with_format(mut self, format: Arc<DocumentFormat>) -> Self {
        self.format = Some(format);
        self
    }

    /// Whether the stream is closed after the result is written.
    ///
    /// Defaults to [`ConverterConfig::close_target_streams`] (true unless
    /// configured otherwise). Ignored for file targets.
    pub fn close_on_completion(mut self, close: bool) -> Self {
        self.close_on_completion = Some(close);
        self
    }

    pub(crate) fn resolve(self, config: &ConverterConfig) -> Result<TargetDescriptor, JobError> {
        match self.sink {
            TargetSink::File(path) => {
                resolve::require_non_empty(Role::Target, &path)?;
                let format =
                    resolve::format_for_path(Role::Target, &path, self.format, &*config.registry)?;
                resolve::check_writable(&path)?;
                Ok(TargetDescriptor {
                    sink: TargetSink::File(path),
                    format,
                    close_on_completion: false,
                })
            }
            TargetSink::Stream(stream) => {
                let format = resolve::format_for_stream(Role::Target, self.format)?;
                if !stream.is_open() {
                    return Err(JobError::StreamClosed { role: Role::Target });
                }
                Ok(TargetDescriptor {
                    sink: TargetSink::Stream(stream),
                    format,
                    close_on_completion: self
                        .close_on_completion
                        .unwrap_or(config.close_target_streams),
                })
            }
        }
    }
}

impl From<PathBuf> for TargetInput {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

impl From<&Path> for TargetInput {
    fn from(path: &Path) -> Self {
        Self::file(path)
    }
}

impl From<&str> for TargetInput {
    fn from(path: &str) -> Self {
        Self::file(path)
    }
}

impl From<String> for TargetInput {
    fn from(path: String) -> Self {
        Self::file(path)
    }
}

impl From<OutputStream> for TargetInput {
    fn from(stream: OutputStream) -> Self {
        Self::stream(stream)
    }
}

/// The single resolved output of a job.
///
/// A flagged stream is flushed and closed when the descriptor is dropped.
/// Engines that need to observe flush errors call
/// [`TargetDescriptor::finish`] themselves; the drop path has nowhere to
/// report them.
#[derive(Debug)]
pub struct TargetDescriptor {
    sink: TargetSink,
    format: Arc<DocumentFormat>,
    close_on_completion: bool,
}

impl TargetDescriptor {
    pub fn sink(&self) -> &TargetSink {
        &self.sink
    }

    /// The path for file targets.
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            TargetSink::File(path) => Some(path),
            TargetSink::Stream(_) => None,
        }
    }

    /// The stream handle for stream targets.
    pub fn stream(&self) -> Option<&OutputStream> {
        match &self.sink {
            TargetSink::File(_) => None,
            TargetSink::Stream(stream) => Some(stream),
        }
    }

    /// The resolved format, shared with the registry it came from.
    pub fn format(&self) -> &Arc<DocumentFormat> {
        &self.format
    }

    /// Always `false` for file targets.
    pub fn close_on_completion(&self) -> bool {
        self.close_on_completion
    }

    /// Flush the target stream and close it if it is flagged.
    ///
    /// Returns `Ok(true)` when this call closed the stream. Unflagged
    /// streams are flushed but stay open; file targets are a no-op.
    pub fn finish(&self) -> io::Result<bool> {
        match (&self.sink, self.close_on_completion) {
            (TargetSink::Stream(stream), true) => stream.close(),
            (TargetSink::Stream(stream), false) => {
                let mut writer = stream;
                io::Write::flush(&mut writer).map(|()| false)
            }
            (TargetSink::File(_), _) => Ok(false),
        }
    }
}

impl Drop for TargetDescriptor {
    fn drop(&mut self) {
        if let (TargetSink::Stream(stream), true) = (&self.sink, self.close_on_completion) {
            let _ = stream.close();
        }
    }
}
