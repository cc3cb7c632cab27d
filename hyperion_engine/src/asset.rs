//! Asset loading interface
//!
//! The engine only consumes loaded bytes (SPIR-V, pixels); parsing asset
//! formats is the caller's business.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::engine_warn;

/// Source of raw asset bytes, addressed by relative path
pub trait AssetLoader {
    /// Load the bytes of `path`
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when nothing exists at `path`.
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Loads assets from a root directory on disk
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for FileAssetLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.root.join(path);
        std::fs::read(&full_path).map_err(|error| {
            engine_warn!("hyperion::Asset", "cannot load '{}': {}", full_path.display(), error);
            match error.kind() {
                ErrorKind::NotFound => Error::NotFound(full_path.display().to_string()),
                _ => Error::InvalidResource(format!("{}: {}", full_path.display(), error)),
            }
        })
    }
}

/// In-memory asset store (embedded shaders, tests)
#[derive(Default)]
pub struct MemoryAssetLoader {
    assets: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.assets.insert(path.into(), bytes);
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }
}

#[cfg(test)]
#[path = "asset_tests.rs"]
mod tests;
