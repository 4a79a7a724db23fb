//! On-disk layout of one index: a JSON document array plus a JSON index
//! artifact carrying the ANN snapshot, the document count and a BLAKE3
//! digest of the document bytes.

use std::fs;
use std::path::Path;

use helix_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::ann::AnnSnapshot;
use crate::index::IndexOptions;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub format_version: u32,
    pub name: String,
    pub options: IndexOptions,
    pub document_count: usize,
    pub documents_digest: String,
    pub ann: AnnSnapshot,
}

pub fn digest(bytes: &[u8]) -> String { blake3::hash(bytes).to_hex().to_string() }

impl IndexArtifact {
    pub fn new(name: &str, options: &IndexOptions, document_count: usize, documents_bytes: &[u8], ann: AnnSnapshot) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: name.to_string(),
            options: options.clone(),
            document_count,
            documents_digest: digest(documents_bytes),
            ann,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = read_file(path)?;
        let artifact: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::persistence(path.display().to_string(), format!("unreadable index artifact: {e}")))?;
        if artifact.format_version != FORMAT_VERSION {
            return Err(Error::persistence(
                &artifact.name,
                format!("unsupported format version {}", artifact.format_version),
            ));
        }
        Ok(artifact)
    }

    pub fn verify_documents(&self, documents_bytes: &[u8]) -> Result<()> {
        let actual = digest(documents_bytes);
        if actual != self.documents_digest {
            return Err(Error::persistence(&self.name, "documents artifact does not match the index digest"));
        }
        Ok(())
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> { fs::read(path).map_err(|e| Error::io(path, e)) }

/// Writes through a sibling temp file and renames it into place.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}
