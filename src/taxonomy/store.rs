//! Taxonomy persistence
//!
//! The canonicalization stages never touch the filesystem themselves; callers
//! hand them a taxonomy obtained from a `TaxonomyStore` and give the result
//! back to the store at the end of the run.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::serialize::{deserialize, serialize};
use super::types::Taxonomy;
use crate::error::{Result, TaxonomyError};

/// Source and sink of persisted taxonomy snapshots.
pub trait TaxonomyStore {
    fn load(&self) -> Result<Taxonomy>;

    fn save(&self, taxonomy: &Taxonomy) -> Result<()>;
}

/// Load a taxonomy from a YAML file.
pub fn load(path: impl AsRef<Path>) -> Result<Taxonomy> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
    let taxonomy = deserialize(&content)?;
    info!("Loaded {} classes from {:?}", taxonomy.len(), path);
    Ok(taxonomy)
}

/// Write a taxonomy to a YAML file in canonical form.
///
/// The document is rendered before the file is opened, so a serialization
/// failure leaves any existing file untouched.
pub fn save(taxonomy: &Taxonomy, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = serialize(taxonomy)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TaxonomyError::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| TaxonomyError::io(path, e))?;

    info!("Wrote {} classes to {:?}", taxonomy.len(), path);
    Ok(())
}

/// Filesystem store with explicit source and destination paths.
#[derive(Debug, Clone)]
pub struct FileStore {
    source: PathBuf,
    destination: PathBuf,
}

impl FileStore {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Read and write the same file
    pub fn in_place(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(path.clone(), path)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl TaxonomyStore for FileStore {
    fn load(&self) -> Result<Taxonomy> {
        load(&self.source)
    }

    fn save(&self, taxonomy: &Taxonomy) -> Result<()> {
        save(taxonomy, &self.destination)
    }
}

/// In-memory store for fixtures
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: String,
    saved: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            saved: RefCell::new(None),
        }
    }

    /// The last document written through `save`, if any
    pub fn saved(&self) -> Option<String> {
        self.saved.borrow().clone()
    }
}

impl TaxonomyStore for MemoryStore {
    fn load(&self) -> Result<Taxonomy> {
        deserialize(&self.document)
    }

    fn save(&self, taxonomy: &Taxonomy) -> Result<()> {
        let text = serialize(taxonomy)?;
        debug!("MemoryStore saved {} bytes", text.len());
        *self.saved.borrow_mut() = Some(text);
        Ok(())
    }
}
