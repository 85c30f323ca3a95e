//! Note container codec: gzip-compressed JSON.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use super::detect::{detect_container, ContainerKind};
use crate::error::{Error, Result};
use crate::model::Document;

/// Format tag written into every container.
pub const FORMAT_TAG: &str = "inkpage";

/// Highest container version this codec understands.
pub const FORMAT_VERSION: u32 = 1;

/// Default file extension for note containers.
pub const NOTE_EXTENSION: &str = "inkp";

/// Converts documents to and from their persisted byte form.
///
/// Implementations must preserve page geometry, backgrounds, layer order,
/// stroke points (including missing pressure), tool, width and color.
pub trait DocumentCodec: Send + Sync {
    /// Parse a document from container bytes.
    fn parse(&self, bytes: &[u8]) -> Result<Document>;

    /// Serialize a document to container bytes.
    fn serialize(&self, doc: &Document) -> Result<Vec<u8>>;

    /// File extension without the leading dot.
    fn extension(&self) -> &str;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    document: &'a Document,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    document: Document,
}

/// The default codec: a JSON envelope inside a gzip stream.
#[derive(Debug, Clone)]
pub struct NoteCodec {
    compression: Compression,
    pretty: bool,
}

impl NoteCodec {
    /// Create a codec with default compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gzip compression level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Write indented JSON inside the gzip stream.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn to_json(&self, doc: &Document) -> Result<Vec<u8>> {
        let envelope = EnvelopeRef {
            format: FORMAT_TAG,
            version: FORMAT_VERSION,
            document: doc,
        };
        let json = if self.pretty {
            serde_json::to_vec_pretty(&envelope)
        } else {
            serde_json::to_vec(&envelope)
        };
        json.map_err(|e| Error::Parse(format!("JSON serialization error: {}", e)))
    }
}

impl Default for NoteCodec {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            pretty: false,
        }
    }
}

impl DocumentCodec for NoteCodec {
    fn parse(&self, bytes: &[u8]) -> Result<Document> {
        let json = match detect_container(bytes)? {
            ContainerKind::Gzip => {
                let mut decoder = GzDecoder::new(bytes);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Parse(format!("corrupt gzip stream: {}", e)))?;
                out
            }
            ContainerKind::Json => bytes.to_vec(),
        };

        let envelope: Envelope = serde_json::from_slice(&json)?;
        if envelope.format != FORMAT_TAG {
            return Err(Error::Parse(format!(
                "unexpected container format '{}'",
                envelope.format
            )));
        }
        if envelope.version > FORMAT_VERSION {
            return Err(Error::Parse(format!(
                "container version {} is newer than supported version {}",
                envelope.version, FORMAT_VERSION
            )));
        }

        let document = envelope.document;
        for (index, page) in document.pages.iter().enumerate() {
            if !page.has_valid_size() {
                return Err(Error::Parse(format!(
                    "page {} has invalid size {}x{}",
                    index, page.width, page.height
                )));
            }
            for stroke in page.layers.iter().flat_map(|layer| layer.strokes()) {
                stroke
                    .validate()
                    .map_err(|e| Error::Parse(format!("page {}: {}", index, e)))?;
            }
        }
        Ok(document)
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
        let json = self.to_json(doc)?;
        let mut encoder = GzEncoder::new(Vec::new(), self.compression);
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    fn extension(&self) -> &str {
        NOTE_EXTENSION
    }
}
