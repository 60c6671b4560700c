//! Format resolution and filesystem checks shared by sources and targets.
//!
//! Resolution order for both sides:
//!
//! 1. An explicit format is used verbatim. It is never cross-checked against
//!    the path's extension, so a `.txt` file can deliberately be read as CSV.
//! 2. A path without explicit format is looked up in the registry by its
//!    extension: the text after the last dot of the file name, lower-cased.
//! 3. A stream without explicit format always fails; it has no name to
//!    infer from.
//!
//! Format resolution performs no I/O and runs before the filesystem checks,
//! so a job with an unknown extension is rejected as a format problem even
//! when the file is also missing.

use crate::error::{JobError, Role};
use document_formats::{DocumentFormat, FormatRegistry};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Lower-cased extension of the path's file name, if it has one.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Resolve the format of a path-backed endpoint.
pub(crate) fn format_for_path(
    role: Role,
    path: &Path,
    explicit: Option<Arc<DocumentFormat>>,
    registry: &dyn FormatRegistry,
) -> Result<Arc<DocumentFormat>, JobError> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    let extension = extension_of(path).ok_or_else(|| JobError::MissingExtension {
        role,
        path: path.to_path_buf(),
    })?;
    registry
        .format_by_extension(&extension)
        .ok_or_else(|| JobError::UnknownExtension {
            role,
            path: path.to_path_buf(),
            extension,
        })
}

/// Resolve the format of a stream-backed endpoint.
pub(crate) fn format_for_stream(
    role: Role,
    explicit: Option<Arc<DocumentFormat>>,
) -> Result<Arc<DocumentFormat>, JobError> {
    explicit.ok_or(JobError::StreamFormatRequired { role })
}

/// Human-readable location of an endpoint for logs and summaries.
pub(crate) fn location(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<stream>".to_string(),
    }
}

pub(crate) fn require_non_empty(role: Role, path: &Path) -> Result<(), JobError> {
    if path.as_os_str().is_empty() {
        return Err(JobError::EmptyPath { role });
    }
    Ok(())
}

/// A source path must name an existing, readable regular file.
///
/// Opening the file is the only reliable readability check; the handle is
/// dropped immediately and nothing is read.
pub(crate) fn check_readable(path: &Path) -> Result<(), JobError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(JobError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(JobError::SourceNotReadable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if !meta.is_file() {
        return Err(JobError::NotAFile {
            role: Role::Source,
            path: path.to_path_buf(),
        });
    }
    fs::File::open(path).map_err(|e| JobError::SourceNotReadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// A target path that already exists must be a writable regular file.
///
/// A missing target is fine: the engine creates it. An existing one is
/// opened for writing without truncation, which fails when it is read-only
/// or locked by another process.
pub(crate) fn check_writable(path: &Path) -> Result<(), JobError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(JobError::TargetNotWritable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if !meta.is_file() {
        return Err(JobError::NotAFile {
            role: Role::Target,
            path: path.to_path_buf(),
        });
    }
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| JobError::TargetNotWritable {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as Kind;
    use document_formats::default_registry;

    #[test]
    fn extension_is_last_suffix_lower_cased() {
        assert_eq!(extension_of(Path::new("report.TXT")).as_deref(), Some("txt"));
        assert_eq!(extension_of(Path::new("archive.tar.gz")).as_deref(), Some("gz"));
        assert_eq!(extension_of(Path::new("dir.d/README")), None);
        assert_eq!(extension_of(Path::new(".profile")), None);
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let reg = default_registry();
        let csv = reg.require("csv").unwrap();
        let f = format_for_path(Role::Source, Path::new("data.txt"), Some(Arc::clone(&csv)), &*reg)
            .unwrap();
        assert!(Arc::ptr_eq(&f, &csv));
    }

    #[test]
    fn explicit_format_needs_no_extension() {
        let reg = default_registry();
        let pdf = reg.require("pdf").unwrap();
        let f = format_for_path(Role::Target, Path::new("out"), Some(pdf), &*reg).unwrap();
        assert_eq!(f.extension(), "pdf");
    }

    #[test]
    fn inferred_format_comes_from_registry() {
        let reg = default_registry();
        let f = format_for_path(Role::Source, Path::new("Report.Txt"), None, &*reg).unwrap();
        assert_eq!(f.media_type(), "text/plain");
    }

    #[test]
    fn unknown_extension_fails_resolution() {
        let reg = default_registry();
        let err = format_for_path(Role::Source, Path::new("x.xyz123"), None, &*reg).unwrap_err();
        assert_eq!(err.kind(), Kind::FormatResolution);
        assert!(matches!(err, JobError::UnknownExtension { ref extension, .. } if extension == "xyz123"));
    }

    #[test]
    fn missing_extension_fails_resolution() {
        let reg = default_registry();
        let err = format_for_path(Role::Target, Path::new("Makefile"), None, &*reg).unwrap_err();
        assert!(matches!(err, JobError::MissingExtension { role: Role::Target, .. }));
    }

    #[test]
    fn stream_without_format_fails() {
        let err = format_for_stream(Role::Source, None).unwrap_err();
        assert!(matches!(err, JobError::StreamFormatRequired { role: Role::Source }));
    }

    #[test]
    fn readable_checks() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();

        assert!(check_readable(&file).is_ok());
        assert!(matches!(
            check_readable(&dir.path().join("missing.txt")),
            Err(JobError::SourceNotFound { .. })
        ));
        assert!(matches!(
            check_readable(dir.path()),
            Err(JobError::NotAFile { role: Role::Source, .. })
        ));
    }

    #[test]
    fn writable_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_writable(&dir.path().join("new.pdf")).is_ok());

        let existing = dir.path().join("old.pdf");
        std::fs::write(&existing, "%PDF").unwrap();
        assert!(check_writable(&existing).is_ok());
        assert_eq!(std::fs::read(&existing).unwrap(), b"%PDF", "check must not truncate");

        assert!(matches!(
            check_writable(dir.path()),
            Err(JobError::NotAFile { role: Role::Target, .. })
        ));
    }

    /// A regular file used as a directory makes `metadata` fail with
    /// `NotADirectory`, which is neither missing nor a permission problem.
    #[cfg(unix)]
    #[test]
    fn metadata_failures_are_invalid_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();

        let err = check_readable(&file.join("b.txt")).unwrap_err();
        assert!(matches!(err, JobError::SourceNotReadable { .. }), "got: {err}");
        assert_eq!(err.kind(), Kind::InvalidArgument);

        let err = check_writable(&file.join("out.pdf")).unwrap_err();
        assert!(matches!(err, JobError::TargetNotWritable { .. }), "got: {err}");
        assert_eq!(err.kind(), Kind::InvalidArgument);
    }

    #[test]
    fn read_only_target_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("locked.pdf");
        std::fs::write(&target, "%PDF").unwrap();
        let mut perms = std::fs::metadata(&target).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&target, perms.clone()).unwrap();

        // Privileged users (root) can write read-only files anyway.
        let privileged = OpenOptions::new().write(true).open(&target).is_ok();
        let result = check_writable(&target);

        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(&target, perms).unwrap();

        if privileged {
            println!("SKIP: running with privileges that ignore read-only files");
            return;
        }
        let err = result.unwrap_err();
        assert!(matches!(err, JobError::TargetNotWritable { .. }), "got: {err}");
        assert_eq!(err.kind(), Kind::InvalidArgument);
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            require_non_empty(Role::Source, Path::new("")),
            Err(JobError::EmptyPath { role: Role::Source })
        ));
        assert!(require_non_empty(Role::Source, Path::new("a.txt")).is_ok());
    }
}
