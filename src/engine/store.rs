//! The store maps (collection, resource) pairs onto JSON files under a root directory.
//!
//! ```text
//! root/
//! └── {collection}/
//!     ├── {resource}.json        ← pretty printed document
//!     └── {resource}.json.tmp    ← only present while a write is in flight
//! ```
//!
//! Writes and deletes take the collection's lock so they are serialized per collection.
//! Reads take no lock at all, they rely on writes landing through an atomic rename and
//! so will see either the old or the new document. A read racing a delete may see
//! either the document or NotFound.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::io::{
    DocumentCodec, DocumentCodecError, FileOperations, FileOperationsError, LockManager,
    PathResolver,
};
use super::options::{LogLogger, Logger, Options};
use crate::constants::MAX_CONCURRENT_READS;

#[derive(Clone, Debug)]
pub struct Store {
    paths: PathResolver,
    lock_manager: LockManager,
    log: Arc<dyn Logger>,
}

impl Store {
    /// Opens the store rooted at `root`, creating the directory and any missing parents.
    ///
    /// Opening an existing root is fine, nothing in it is touched unless
    /// `Options::sweep_temp_files` is set.
    pub async fn new(root: impl AsRef<Path>, options: Option<Options>) -> Result<Store, StoreError> {
        let options = options.unwrap_or_default();
        let log: Arc<dyn Logger> = match options.logger {
            Some(l) => l,
            None => Arc::new(LogLogger::default()),
        };

        let store = Store {
            paths: PathResolver::new(root),
            lock_manager: LockManager::new(),
            log,
        };

        let root = store.paths.root();
        match tokio::fs::metadata(root).await {
            Ok(m) if m.is_dir() => {
                store.log.debug(format_args!(
                    "Using {0} as it already exists",
                    root.display()
                ));
            }
            _ => {
                store
                    .log
                    .debug(format_args!("Creating the db at {0}", root.display()));
                FileOperations::make_dir(root)
                    .await
                    .map_err(StoreError::io)?;
            }
        }

        if options.sweep_temp_files {
            store.sweep_temp_files().await?;
        }

        Ok(store)
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// Stores `document` as `<root>/<collection>/<resource>.json`, replacing what was there.
    ///
    /// The collection directory is created on demand. If anything fails the previous
    /// version of the resource is left as it was.
    pub async fn write<T>(
        &self,
        collection: &str,
        resource: &str,
        document: &T,
    ) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        Self::check_names(collection, resource)?;

        let buffer = DocumentCodec::encode(document)?;

        let _guard = self.lock_manager.lock(collection).await;

        let dir = self.paths.collection_dir(collection);
        FileOperations::make_dir(&dir)
            .await
            .map_err(StoreError::io)?;

        let final_path = self.paths.resource_path(collection, resource);
        let temp_path = self.paths.temp_path(collection, resource);
        self.log.debug(format_args!(
            "Writing {0} bytes to {1}",
            buffer.len(),
            final_path.display()
        ));

        FileOperations::write_atomic(&temp_path, &final_path, buffer)
            .await
            .map_err(StoreError::io)
    }

    /// Loads and decodes a single resource. No locks are taken.
    pub async fn read<T>(&self, collection: &str, resource: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        Self::check_names(collection, resource)?;

        let path = self.paths.resource_path(collection, resource);
        self.log.debug(format_args!("Reading {0}", path.display()));

        let data = FileOperations::read_file(&path).await?;
        Ok(DocumentCodec::decode(&data)?)
    }

    /// Returns the raw text of every file in the collection, in whatever order the
    /// filesystem lists them. Nothing is decoded.
    ///
    /// Files that disappear between listing and reading are skipped, as are the temp
    /// files of writes still in flight.
    pub async fn read_all(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        Self::check_name("collection", collection)?;

        let dir = self.paths.collection_dir(collection);
        self.log
            .debug(format_args!("Reading all records in {0}", dir.display()));

        //In flight writes are not records yet
        let files = FileOperations::list_files(&dir)
            .await?
            .into_iter()
            .filter(|p| {
                !p.file_name()
                    .and_then(|n| n.to_str())
                    .map(PathResolver::is_temp_file)
                    .unwrap_or(false)
            });
        let loaded: Vec<Option<(PathBuf, bytes::Bytes)>> = stream::iter(files)
            .map(|path| async move {
                match FileOperations::read_file(&path).await {
                    Ok(data) => Ok(Some((path, data))),
                    Err(e) if e.is_not_found() => {
                        debug!("{0} went away while reading the collection", path.display());
                        Ok(None)
                    }
                    Err(e) => Err(StoreError::from(e)),
                }
            })
            .buffered(MAX_CONCURRENT_READS)
            .try_collect()
            .await?;

        loaded
            .into_iter()
            .flatten()
            .map(|(path, data)| {
                String::from_utf8(data.to_vec()).map_err(|_| StoreError::NotUtf8(path))
            })
            .collect()
    }

    /// `read_all` followed by decoding every record as `T`.
    pub async fn read_all_as<T>(&self, collection: &str) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.read_all(collection)
            .await?
            .iter()
            .map(|r| DocumentCodec::decode(r.as_bytes()).map_err(StoreError::from))
            .collect()
    }

    /// Removes the resource. If a directory sits where the resource file should be,
    /// the whole directory is removed.
    pub async fn delete(&self, collection: &str, resource: &str) -> Result<(), StoreError> {
        Self::check_names(collection, resource)?;

        let _guard = self.lock_manager.lock(collection).await;

        let path = self.paths.resource_path(collection, resource);
        self.log.debug(format_args!("Deleting {0}", path.display()));

        Ok(FileOperations::remove(&path).await?)
    }

    /// Removes `.json.tmp` files left behind by writes that never reached their rename,
    /// for example because the process died. Each collection is swept under its lock so
    /// in flight writes are not disturbed.
    ///
    /// Returns how many files were removed.
    pub async fn sweep_temp_files(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for dir in FileOperations::list_dirs(self.paths.root()).await? {
            let collection = match dir.file_name().and_then(|n| n.to_str()) {
                Some(s) => s.to_string(),
                None => {
                    warn!("Skipping non unicode collection {0}", dir.display());
                    continue;
                }
            };

            let _guard = self.lock_manager.lock(&collection).await;
            match FileOperations::remove_temp_files(&dir).await {
                Ok(count) => removed += count,
                //Collection removed out from under us
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            self.log.debug(format_args!(
                "Removed {0} orphaned temp files from {1}",
                removed,
                self.paths.root().display()
            ));
        }

        Ok(removed)
    }

    fn check_names(collection: &str, resource: &str) -> Result<(), StoreError> {
        Self::check_name("collection", collection)?;
        Self::check_name("resource", resource)
    }

    fn check_name(kind: &'static str, name: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument(kind));
        }
        Ok(())
    }
}

/// Broad classes of failure, for callers that only care about the category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    InvalidArgument,
    NotFound,
    Io,
    Serialization,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A {0} name must be provided")]
    InvalidArgument(&'static str),
    #[error("Record {0} does not exist")]
    NotFound(PathBuf),
    #[error("I/O error on {0}: {1}")]
    IOError(PathBuf, std::io::Error),
    #[error(transparent)]
    SerializationError(#[from] DocumentCodecError),
    #[error("Record {0} is not valid UTF-8")]
    NotUtf8(PathBuf),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::InvalidArgument(_) => StoreErrorKind::InvalidArgument,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::IOError(_, _) => StoreErrorKind::Io,
            StoreError::SerializationError(_) | StoreError::NotUtf8(_) => {
                StoreErrorKind::Serialization
            }
        }
    }

    /// Mutations report every filesystem failure as I/O, even a missing path
    fn io(e: FileOperationsError) -> StoreError {
        match e {
            FileOperationsError::IOError(path, e) => StoreError::IOError(path, e),
        }
    }
}

impl From<FileOperationsError> for StoreError {
    fn from(e: FileOperationsError) -> Self {
        match e {
            FileOperationsError::IOError(path, e) if e.kind() == ErrorKind::NotFound => {
                StoreError::NotFound(path)
            }
            FileOperationsError::IOError(path, e) => StoreError::IOError(path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use std::sync::Mutex;
    use tempfile::TempDir;

    use super::*;

    #[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
    struct Note {
        title: String,
        body: String,
    }

    fn get_note(i: usize) -> Note {
        Note {
            title: format!("note {0}", i),
            body: "x".repeat(i),
        }
    }

    #[derive(Debug, Default)]
    struct CapturingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for CapturingLogger {
        fn debug(&self, args: std::fmt::Arguments<'_>) {
            if let Ok(mut l) = self.lines.lock() {
                l.push(args.to_string());
            }
        }
    }

    #[tokio::test]
    async fn test_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        store.write("notes", "first", &get_note(1)).await?;
        let note: Note = store.read("notes", "first").await?;
        assert_eq!(note, get_note(1));

        //Overwrite
        store.write("notes", "first", &get_note(2)).await?;
        let note: Note = store.read("notes", "first").await?;
        assert_eq!(note, get_note(2));

        let on_disk = std::fs::read_to_string(tmp.path().join("notes").join("first.json"))?;
        assert!(on_disk.starts_with("{\n\t\"title\""));
        assert!(on_disk.ends_with("}\n"));
        assert!(!tmp.path().join("notes").join("first.json.tmp").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_creates_nested_root() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let root = tmp.path().join("a").join("b").join("db");

        let store = Store::new(&root, None).await?;
        assert!(root.is_dir());

        //Opening again is fine and keeps the data
        store.write("notes", "n", &get_note(3)).await?;
        let store2 = Store::new(&root, None).await?;
        let note: Note = store2.read("notes", "n").await?;
        assert_eq!(note, get_note(3));

        Ok(())
    }

    #[tokio::test]
    async fn test_root_is_a_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let root = tmp.path().join("db");
        std::fs::write(&root, b"not a dir")?;

        let res = Store::new(&root, None).await;
        assert_eq!(res.map(|_| ()).map_err(|e| e.kind()), Err(StoreErrorKind::Io));

        Ok(())
    }

    #[tokio::test]
    async fn test_validation() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        let errs = vec![
            store.write("", "x", &get_note(1)).await.unwrap_err(),
            store.write("c", "", &get_note(1)).await.unwrap_err(),
            store.read::<Note>("c", "").await.unwrap_err(),
            store.read::<Note>("", "x").await.unwrap_err(),
            store.read_all("").await.unwrap_err(),
            store.delete("", "x").await.unwrap_err(),
            store.delete("c", "").await.unwrap_err(),
        ];
        for e in errs {
            assert_eq!(e.kind(), StoreErrorKind::InvalidArgument);
        }

        //Nothing should have been created
        assert_eq!(std::fs::read_dir(tmp.path())?.count(), 0);
        assert!(store.lock_manager.is_empty().await);

        Ok(())
    }

    #[tokio::test]
    async fn test_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        let res = store.read::<Note>("c", "missing").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));

        let res = store.delete("c", "missing").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));

        let res = store.read_all("c").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_shape() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        store.write("c", "num", &42).await?;
        let res = store.read::<Note>("c", "num").await;
        assert!(matches!(res, Err(StoreError::SerializationError(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_unencodable_leaves_old() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        store.write("c", "r", &get_note(1)).await?;

        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "tuple keys can't be JSON");
        let res = store.write("c", "r", &bad).await;
        assert_eq!(res.unwrap_err().kind(), StoreErrorKind::Serialization);

        let note: Note = store.read("c", "r").await?;
        assert_eq!(note, get_note(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        store.write("c", "r", &get_note(1)).await?;
        store.delete("c", "r").await?;
        assert!(!tmp.path().join("c").join("r.json").exists());

        let res = store.delete("c", "r").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));

        //A directory in the resource's spot is removed wholesale
        std::fs::create_dir_all(tmp.path().join("c").join("d.json").join("inner"))?;
        store.delete("c", "d").await?;
        assert!(!tmp.path().join("c").join("d.json").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_read_all() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        for i in 0..3 {
            store.write("notes", &i.to_string(), &get_note(i)).await?;
        }
        //Sub directories and temp files are not records
        std::fs::create_dir(tmp.path().join("notes").join("junk"))?;
        std::fs::write(tmp.path().join("notes").join("9.json.tmp"), b"{\n\t\"ti")?;

        let raw = store.read_all("notes").await?;
        assert_eq!(raw.len(), 3);
        for r in raw.iter() {
            assert!(r.ends_with("}\n"));
        }

        let mut notes: Vec<Note> = store.read_all_as("notes").await?;
        notes.sort_by(|a, b| a.title.cmp(&b.title));
        assert_eq!(notes, vec![get_note(0), get_note(1), get_note(2)]);

        Ok(())
    }

    #[tokio::test]
    async fn test_read_all_not_utf8() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        std::fs::create_dir(tmp.path().join("bin"))?;
        std::fs::write(tmp.path().join("bin").join("x.json"), [0xff, 0xfe, 0x00])?;

        let res = store.read_all("bin").await;
        assert_eq!(res.unwrap_err().kind(), StoreErrorKind::Serialization);

        Ok(())
    }

    #[tokio::test]
    async fn test_sweep() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let store = Store::new(tmp.path(), None).await?;

        store.write("c", "keep", &get_note(1)).await?;
        std::fs::write(tmp.path().join("c").join("lost.json.tmp"), b"{\n\t\"tit")?;
        std::fs::create_dir(tmp.path().join("empty"))?;

        //Opening without the option leaves the file alone
        let _store2 = Store::new(tmp.path(), None).await?;
        assert!(tmp.path().join("c").join("lost.json.tmp").exists());

        let options = Options::new().with_sweep_temp_files(true);
        let _store3 = Store::new(tmp.path(), Some(options)).await?;
        assert!(!tmp.path().join("c").join("lost.json.tmp").exists());
        assert!(tmp.path().join("c").join("keep.json").exists());

        assert_eq!(store.sweep_temp_files().await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_injected_logger() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let logger = Arc::new(CapturingLogger::default());
        let options = Options::new().with_logger(logger.clone());

        let store = Store::new(tmp.path().join("db"), Some(options)).await?;
        store.write("c", "r", &get_note(1)).await?;

        let lines = logger.lines.lock().map_err(|e| e.to_string())?.clone();
        assert!(lines[0].starts_with("Creating the db at"));
        assert!(lines.iter().any(|l| l.starts_with("Writing")));

        Ok(())
    }
}
