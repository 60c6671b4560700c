//! Format registries: extension and media-type lookup.

use crate::format::{DocumentFamily, DocumentFormat};
use crate::FormatsError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Read-only lookup of format descriptors.
///
/// Lookups are synchronous and must be cheap: job builders call them while
/// resolving every source and target. Implementations are shared across
/// threads behind an `Arc<dyn FormatRegistry>`.
pub trait FormatRegistry: Send + Sync {
    /// Find a format by extension (case-insensitive, no leading dot).
    fn format_by_extension(&self, extension: &str) -> Option<Arc<DocumentFormat>>;

    /// Find a format by media type (case-insensitive).
    fn format_by_media_type(&self, media_type: &str) -> Option<Arc<DocumentFormat>>;

    /// Every format that can be written from a document of `family`.
    fn output_formats(&self, family: DocumentFamily) -> Vec<Arc<DocumentFormat>>;
}

/// In-memory registry backed by hash maps.
///
/// Registration order is kept for [`FormatRegistry::output_formats`]. When
/// two formats share a media type the first one registered answers
/// media-type lookups; extensions must be unique.
#[derive(Debug, Default)]
pub struct SimpleFormatRegistry {
    formats: Vec<Arc<DocumentFormat>>,
    by_extension: HashMap<String, Arc<DocumentFormat>>,
    by_media_type: HashMap<String, Arc<DocumentFormat>>,
}

impl SimpleFormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON array of format descriptors.
    pub fn from_json_str(json: &str) -> Result<Self, FormatsError> {
        let formats: Vec<DocumentFormat> = serde_json::from_str(json)?;
        Self::from_formats(formats)
    }

    /// Load a registry from a reader yielding a JSON array of format descriptors.
    pub fn from_reader(reader: impl Read) -> Result<Self, FormatsError> {
        let formats: Vec<DocumentFormat> = serde_json::from_reader(reader)?;
        Self::from_formats(formats)
    }

    fn from_formats(formats: Vec<DocumentFormat>) -> Result<Self, FormatsError> {
        let mut registry = Self::new();
        for format in formats {
            registry.add_format(format)?;
        }
        debug!("Loaded format registry with {} formats", registry.len());
        Ok(registry)
    }

    /// Register a format and return the shared handle the registry keeps.
    ///
    /// Extensions are lower-cased and stripped of leading dots first, the
    /// same way [`crate::DocumentFormatBuilder::extension`] treats them.
    pub fn add_format(&mut self, mut format: DocumentFormat) -> Result<Arc<DocumentFormat>, FormatsError> {
        format.normalise_extensions();
        format.validate()?;

        let keys: Vec<String> = format.extensions().to_vec();
        if let Some(taken) = keys.iter().find(|k| self.by_extension.contains_key(*k)) {
            return Err(FormatsError::DuplicateExtension {
                extension: taken.clone(),
                existing: self.by_extension[taken].name().to_string(),
            });
        }

        let format = Arc::new(format);
        for key in keys {
            self.by_extension.insert(key, Arc::clone(&format));
        }
        self.by_media_type
            .entry(format.media_type().to_ascii_lowercase())
            .or_insert_with(|| Arc::clone(&format));
        self.formats.push(Arc::clone(&format));
        Ok(format)
    }

    /// Look up a format that must exist.
    pub fn require(&self, extension: &str) -> Result<Arc<DocumentFormat>, FormatsError> {
        self.format_by_extension(extension)
            .ok_or_else(|| FormatsError::UnknownExtension {
                extension: extension.to_string(),
            })
    }

    /// All registered formats in registration order.
    pub fn formats(&self) -> &[Arc<DocumentFormat>] {
        &self.formats
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl FormatRegistry for SimpleFormatRegistry {
    fn format_by_extension(&self, extension: &str) -> Option<Arc<DocumentFormat>> {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.get(&key).cloned()
    }

    fn format_by_media_type(&self, media_type: &str) -> Option<Arc<DocumentFormat>> {
        self.by_media_type
            .get(&media_type.to_ascii_lowercase())
            .cloned()
    }

    fn output_formats(&self, family: DocumentFamily) -> Vec<Arc<DocumentFormat>> {
        self.formats
            .iter()
            .filter(|f| f.store_properties(family).is_some())
            .cloned()
            .collect()
    }
}

static DEFAULT_FORMATS_JSON: &str = include_str!("../resources/document-formats.json");

static DEFAULT_REGISTRY: Lazy<Arc<SimpleFormatRegistry>> = Lazy::new(|| {
    Arc::new(
        SimpleFormatRegistry::from_json_str(DEFAULT_FORMATS_JSON)
            .expect("embedded document-formats.json must be a valid registry"),
    )
});

/// The built-in registry of common office, text and image formats.
///
/// Loaded once per process from an embedded JSON resource.
pub fn default_registry() -> Arc<SimpleFormatRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}
