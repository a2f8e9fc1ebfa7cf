//! File-backed pet storage: one JSON file per key inside a directory.

use labubu_game::PetStorage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("save file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> FileStorageError {
        FileStorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl PetStorage for FileStorage {
    type Error = FileStorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(&self.dir, err))?;
        let path = self.path_for(key);
        fs::write(&path, raw).map_err(|err| Self::io_error(&path, err))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(Self::io_error(&path, err)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "labubu-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn write_read_remove() {
        let storage = FileStorage::new(temp_dir("cycle"));
        assert!(storage.read("pet").unwrap().is_none());
        storage.write("pet", "{\"money\":1}").unwrap();
        assert_eq!(storage.read("pet").unwrap().as_deref(), Some("{\"money\":1}"));
        storage.remove("pet").unwrap();
        storage.remove("pet").unwrap();
        assert!(storage.read("pet").unwrap().is_none());
    }
}
