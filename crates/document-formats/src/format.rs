//! Format descriptors: the immutable identity of a document format.
//!
//! A [`DocumentFormat`] names a format (extensions, media type) and carries
//! the option bags a conversion engine needs in each direction:
//!
//! * **load properties** are applied when a document of this format is
//!   opened as a source;
//! * **store properties** are applied when a document is written in this
//!   format, keyed by the [`DocumentFamily`] of the document being written
//!   (exporting a spreadsheet to PDF uses a different filter than exporting
//!   a text document to PDF).

use crate::FormatsError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Option bag attached to a format for one direction.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

static RE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_+-]*$").unwrap());

/// Broad document family a format belongs to when it is used as an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentFamily {
    /// Word-processing documents.
    Text,
    /// Spreadsheets.
    Spreadsheet,
    /// Slide decks.
    Presentation,
    /// Vector and raster drawings.
    Drawing,
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentFamily::Text => "text",
            DocumentFamily::Spreadsheet => "spreadsheet",
            DocumentFamily::Presentation => "presentation",
            DocumentFamily::Drawing => "drawing",
        };
        f.write_str(s)
    }
}

/// Immutable description of a document format.
///
/// Obtain one from a [`crate::FormatRegistry`] or assemble it with
/// [`DocumentFormat::builder`]. Registries hand out `Arc<DocumentFormat>` so
/// every job referencing a format shares the registry's instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFormat {
    name: String,
    extensions: Vec<String>,
    media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_family: Option<DocumentFamily>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    load_properties: PropertyMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    store_properties: BTreeMap<DocumentFamily, PropertyMap>,
}

impl DocumentFormat {
    /// Start building a format with the given human-readable name.
    pub fn builder(name: impl Into<String>) -> DocumentFormatBuilder {
        DocumentFormatBuilder {
            format: DocumentFormat {
                name: name.into(),
                extensions: Vec::new(),
                media_type: String::new(),
                input_family: None,
                load_properties: PropertyMap::new(),
                store_properties: BTreeMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical (first) extension, lower-case, without a leading dot.
    pub fn extension(&self) -> &str {
        self.extensions.first().map(String::as_str).unwrap_or_default()
    }

    /// All extensions recognised for this format.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Family of documents in this format, when it can be loaded at all.
    pub fn input_family(&self) -> Option<DocumentFamily> {
        self.input_family
    }

    pub fn load_properties(&self) -> &PropertyMap {
        &self.load_properties
    }

    /// Store properties to use when writing a document of `family` in this format.
    pub fn store_properties(&self, family: DocumentFamily) -> Option<&PropertyMap> {
        self.store_properties.get(&family)
    }

    /// Families this format can be written from.
    pub fn output_families(&self) -> impl Iterator<Item = DocumentFamily> + '_ {
        self.store_properties.keys().copied()
    }

    /// Lower-case every extension, strip leading dots and drop duplicates.
    ///
    /// The builder does this as extensions are added; formats deserialised
    /// from JSON get it when a registry accepts them.
    pub(crate) fn normalise_extensions(&mut self) {
        let mut seen = Vec::with_capacity(self.extensions.len());
        for ext in self.extensions.drain(..) {
            let ext = normalise_extension(&ext);
            if !seen.contains(&ext) {
                seen.push(ext);
            }
        }
        self.extensions = seen;
    }

    /// Check the structural rules a registry relies on.
    ///
    /// Formats deserialised from JSON bypass the builder, so registries call
    /// this before accepting them.
    pub fn validate(&self) -> Result<(), FormatsError> {
        if self.extensions.is_empty() {
            return Err(FormatsError::MissingExtension {
                format: self.name.clone(),
            });
        }
        for ext in &self.extensions {
            if !RE_EXTENSION.is_match(&ext.to_ascii_lowercase()) {
                return Err(FormatsError::InvalidExtension {
                    format: self.name.clone(),
                    extension: ext.clone(),
                });
            }
        }
        if self.media_type.trim().is_empty() {
            return Err(FormatsError::MissingMediaType {
                format: self.name.clone(),
            });
        }
        Ok(())
    }
}

fn normalise_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (.{}, {})", self.name, self.extension(), self.media_type)
    }
}

/// Builder for [`DocumentFormat`].
#[derive(Debug)]
pub struct DocumentFormatBuilder {
    format: DocumentFormat,
}

impl DocumentFormatBuilder {
    /// Add a recognised extension. Leading dots are stripped and the value
    /// is lower-cased; the first extension added is the canonical one.
    pub fn extension(mut self, ext: impl AsRef<str>) -> Self {
        let ext = normalise_extension(ext.as_ref());
        if !self.format.extensions.contains(&ext) {
            self.format.extensions.push(ext);
        }
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.format.media_type = media_type.into();
        self
    }

    pub fn input_family(mut self, family: DocumentFamily) -> Self {
        self.format.input_family = Some(family);
        self
    }

    pub fn load_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.format.load_properties.insert(key.into(), value.into());
        self
    }

    pub fn store_property(
        mut self,
        family: DocumentFamily,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.format
            .store_properties
            .entry(family)
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Build the format, validating extension syntax and media type.
    pub fn build(self) -> Result<DocumentFormat, FormatsError> {
        self.format.validate()?;
        Ok(self.format)
    }
}
