//! Durable byte storage for uploaded assets.
//!
//! Files are written under a single configured directory. Incoming filenames
//! are flattened to their final component before joining the root, so an
//! upload cannot escape the assets directory. Same-name uploads overwrite:
//! this layer enforces no uniqueness on filenames (deduplication happens by
//! content fingerprint upstream).

use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};

pub struct AssetStorage {
    root: PathBuf,
}

impl AssetStorage {
    /// Create the storage rooted at `dir`, creating the directory if needed.
    pub fn new(dir: &Path) -> AssetResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| AssetError::Storage {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: dir.to_path_buf(),
        })
    }

    /// The on-disk path an upload with this filename lands at.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        let base = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        self.root.join(base)
    }

    /// Persist raw bytes, overwriting any file with the same name.
    /// Returns the logical path the asset is stored at.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> AssetResult<String> {
        let path = self.path_for(filename);
        std::fs::write(&path, bytes).map_err(|source| AssetError::Storage {
            path: path.clone(),
            source,
        })?;
        Ok(path.to_string_lossy().into_owned())
    }

    pub fn read(&self, filename: &str) -> AssetResult<Vec<u8>> {
        let path = self.path_for(filename);
        std::fs::read(&path).map_err(|source| AssetError::Storage {
            path: path.clone(),
            source,
        })
    }

    /// Remove a stored file. Missing files are a no-op success, matching the
    /// idempotent delete semantics of the index.
    pub fn delete(&self, filename: &str) -> AssetResult<()> {
        let path = self.path_for(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AssetError::Storage { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = AssetStorage::new(tmp.path()).unwrap();

        let stored = storage.write("cat.jpg", b"jpeg bytes").unwrap();
        assert!(stored.ends_with("cat.jpg"));
        assert_eq!(storage.read("cat.jpg").unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_filenames_are_flattened() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = AssetStorage::new(tmp.path()).unwrap();

        let stored = storage.write("../../etc/passwd.jpg", b"data").unwrap();
        assert_eq!(
            PathBuf::from(stored),
            tmp.path().join("passwd.jpg"),
        );
    }

    #[test]
    fn test_same_name_overwrites() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = AssetStorage::new(tmp.path()).unwrap();

        storage.write("a.jpg", b"first").unwrap();
        storage.write("a.jpg", b"second").unwrap();
        assert_eq!(storage.read("a.jpg").unwrap(), b"second");
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = AssetStorage::new(tmp.path()).unwrap();
        assert!(storage.delete("never-written.jpg").is_ok());
    }
}
