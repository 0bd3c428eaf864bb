use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::domain::{Library, LibraryHeader};

const REVIEWS_MARKER: &str = "\n=== REVIEWS ===\n";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML header: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("failed to encode TOML header: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("failed to parse review on line {line}: {source}")]
    JsonDecode { line: usize, source: serde_json::Error },
    #[error("failed to encode review: {0}")]
    JsonEncode(serde_json::Error),
}

pub fn load_library(path: &Path) -> Result<Library, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Library::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(Library::new());
    }

    let (header_blob, reviews_blob) = if let Some((header, reviews)) = raw.split_once(REVIEWS_MARKER) {
        (header, reviews)
    } else {
        (raw.as_str(), "")
    };

    let header: LibraryHeader = toml::from_str(header_blob)?;
    let mut reviews = Vec::new();
    for (index, line) in reviews_blob.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let review = serde_json::from_str(line).map_err(|source| StorageError::JsonDecode {
            line: index + 1,
            source,
        })?;
        reviews.push(review);
    }

    debug!("loaded {} reviews from {}", reviews.len(), path.display());
    Ok(Library { header, reviews })
}

pub fn save_library(path: &Path, library: &Library) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let header = toml::to_string_pretty(&library.header)?;
    let mut file = fs::File::create(path)?;
    file.write_all(header.as_bytes())?;
    file.write_all(REVIEWS_MARKER.as_bytes())?;

    for review in &library.reviews {
        let line = serde_json::to_string(review).map_err(StorageError::JsonEncode)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
    }

    debug!("saved {} reviews to {}", library.reviews.len(), path.display());
    Ok(())
}
