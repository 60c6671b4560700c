//! # document-formats
//!
//! Format descriptors and the registry that maps file extensions and media
//! types to them.
//!
//! Conversion jobs never guess a format on their own: when a caller does not
//! name one explicitly, the job asks a [`FormatRegistry`] for the descriptor
//! registered under the file's extension. This crate provides that registry
//! contract, an in-memory implementation and a built-in default registry
//! covering common office, text and image formats.
//!
//! ## Usage
//!
//! ```rust
//! use document_formats::{default_registry, DocumentFamily, FormatRegistry};
//!
//! let registry = default_registry();
//! let pdf = registry.format_by_extension("PDF").unwrap();
//! assert_eq!(pdf.media_type(), "application/pdf");
//! assert!(pdf.store_properties(DocumentFamily::Text).is_some());
//! ```
//!
//! ## Custom registries
//!
//! A registry can be loaded from a JSON array of formats:
//!
//! ```json
//! [
//!   {
//!     "name": "Plain Text",
//!     "extensions": ["txt"],
//!     "mediaType": "text/plain",
//!     "inputFamily": "TEXT",
//!     "loadProperties": { "FilterName": "Text (encoded)" },
//!     "storeProperties": { "TEXT": { "FilterName": "Text (encoded)" } }
//!   }
//! ]
//! ```
//!
//! See [`SimpleFormatRegistry::from_json_str`] and
//! [`SimpleFormatRegistry::from_reader`].

use thiserror::Error;

mod format;
mod registry;

pub use format::{DocumentFamily, DocumentFormat, DocumentFormatBuilder, PropertyMap};
pub use registry::{default_registry, FormatRegistry, SimpleFormatRegistry};

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors raised while building formats or loading a registry.
#[derive(Error, Debug)]
pub enum FormatsError {
    /// The registry document is not valid JSON or does not match the schema.
    #[error("Invalid registry document: {0}")]
    Json(#[from] serde_json::Error),

    /// A format declares no extension at all.
    #[error("Format '{format}' declares no extension")]
    MissingExtension { format: String },

    /// An extension contains characters that cannot appear in a file suffix.
    #[error("Format '{format}' has an invalid extension '{extension}'")]
    InvalidExtension { format: String, extension: String },

    /// A format declares an empty media type.
    #[error("Format '{format}' declares no media type")]
    MissingMediaType { format: String },

    /// Two formats claim the same extension.
    #[error("Extension '{extension}' is already registered by '{existing}'")]
    DuplicateExtension { extension: String, existing: String },

    /// A required lookup found nothing.
    #[error("No format registered for extension '{extension}'")]
    UnknownExtension { extension: String },
}
