//! File-backed collection of tracked products.
//!
//! The whole collection lives in one JSON array. Every write goes to a
//! temporary file next to the target which is then renamed over it, so a
//! reader never sees a half-written store.

use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::models::Product;
use crate::utils::error::StoreError;

#[derive(Debug, Clone)]
pub struct ProductStore {
    path: PathBuf,
}

impl ProductStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the collection, distinguishing a missing file (empty collection)
    /// from one that cannot be read or parsed.
    pub fn try_load(&self) -> Result<Vec<Product>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.read_error(e)),
        };

        serde_json::from_str(&text).map_err(|e| self.read_error(e))
    }

    /// Loads the collection, falling back to an empty one on any failure.
    ///
    /// A corrupt file is indistinguishable from an empty store to callers of
    /// this method; use [`ProductStore::try_load`] to tell them apart.
    pub fn load(&self) -> Vec<Product> {
        match self.try_load() {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!("{}; continuing with an empty product list", e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, products: &[Product]) -> Result<(), StoreError> {
        self.write_atomically(products).map_err(|e| StoreError::PersistenceWrite {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Saved {} products to {}", products.len(), self.path.display());
        Ok(())
    }

    /// Appends `product` unless its url is already tracked.
    ///
    /// Like every write, this refuses to touch a store that cannot be read.
    pub fn add(&self, product: Product) -> Result<(), StoreError> {
        let mut products = self.try_load()?;
        if products.iter().any(|p| p.url == product.url) {
            return Err(StoreError::DuplicateProduct { url: product.url });
        }

        tracing::info!("Tracking {} ({})", product.name, product.url);
        products.push(product);
        self.save(&products)
    }

    /// Removes the product at 1-based `index` and returns it.
    pub fn remove(&self, index: usize) -> Result<Product, StoreError> {
        let mut products = self.try_load()?;
        if index < 1 || index > products.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: products.len(),
            });
        }

        let removed = products.remove(index - 1);
        self.save(&products)?;
        tracing::info!("Stopped tracking {} ({})", removed.name, removed.url);
        Ok(removed)
    }

    pub fn contains_url(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self.try_load()?.iter().any(|p| p.url == url))
    }

    fn write_atomically(&self, products: &[Product]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let mut temp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
            products.serialize(&mut serializer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_error(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::PersistenceRead {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}
