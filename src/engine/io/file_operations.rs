//! Helper functions to aid in chaining async calls against the filesystem.
//!
//! Errors carry the path they happened on so the store can report something useful.

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::PathResolver;

pub struct FileOperations {}

impl FileOperations {
    /// Must be able to repeatedly make the same directory
    pub async fn make_dir(path: &Path) -> Result<(), FileOperationsError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| FileOperationsError::IOError(path.to_path_buf(), e))
    }

    /// Writes the buffer to `temp_path`, flushes it to disk and then renames it over
    /// `final_path`. Anyone looking at `final_path` sees either the old or the new
    /// content, never a mix.
    ///
    /// On failure the temp file is cleaned up if possible, `final_path` is untouched.
    pub async fn write_atomic(
        temp_path: &Path,
        final_path: &Path,
        buffer: Bytes,
    ) -> Result<(), FileOperationsError> {
        if let Err(e) = Self::write_and_sync(temp_path, buffer).await {
            Self::discard_temp(temp_path).await;
            return Err(FileOperationsError::IOError(temp_path.to_path_buf(), e));
        }

        if let Err(e) = fs::rename(temp_path, final_path).await {
            Self::discard_temp(temp_path).await;
            return Err(FileOperationsError::IOError(final_path.to_path_buf(), e));
        }

        Ok(())
    }

    pub async fn read_file(path: &Path) -> Result<Bytes, FileOperationsError> {
        match fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => Err(FileOperationsError::IOError(path.to_path_buf(), e)),
        }
    }

    /// Lists the non directory entries of `path` in the order the filesystem hands them back.
    pub async fn list_files(path: &Path) -> Result<Vec<PathBuf>, FileOperationsError> {
        let map_err = |e: std::io::Error| FileOperationsError::IOError(path.to_path_buf(), e);

        let mut files = vec![];
        let mut entries = fs::read_dir(path).await.map_err(map_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(map_err)? {
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                //Deleted out from under us
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(FileOperationsError::IOError(entry.path(), e)),
            };
            if file_type.is_dir() {
                continue;
            }
            files.push(entry.path());
        }

        Ok(files)
    }

    /// Lists the sub directories of `path`, used to find collections.
    pub async fn list_dirs(path: &Path) -> Result<Vec<PathBuf>, FileOperationsError> {
        let map_err = |e: std::io::Error| FileOperationsError::IOError(path.to_path_buf(), e);

        let mut dirs = vec![];
        let mut entries = fs::read_dir(path).await.map_err(map_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(map_err)? {
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => dirs.push(entry.path()),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(FileOperationsError::IOError(entry.path(), e)),
            }
        }

        Ok(dirs)
    }

    /// Removes a file, or a whole directory tree if that is what lives at `path`.
    pub async fn remove(path: &Path) -> Result<(), FileOperationsError> {
        let map_err = |e: std::io::Error| FileOperationsError::IOError(path.to_path_buf(), e);

        let metadata = fs::metadata(path).await.map_err(map_err)?;
        if metadata.is_dir() {
            fs::remove_dir_all(path).await.map_err(map_err)
        } else {
            fs::remove_file(path).await.map_err(map_err)
        }
    }

    /// Removes leftover `<resource>.json.tmp` files from a collection directory.
    pub async fn remove_temp_files(dir: &Path) -> Result<usize, FileOperationsError> {
        let mut removed = 0;
        for path in Self::list_files(dir).await? {
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(PathResolver::is_temp_file)
                .unwrap_or(false);
            if !is_temp {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(_) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(FileOperationsError::IOError(path, e)),
            }
        }

        Ok(removed)
    }

    async fn write_and_sync(path: &Path, mut buffer: Bytes) -> Result<(), std::io::Error> {
        let mut file = File::create(path).await?;
        file.write_all_buf(&mut buffer).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn discard_temp(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Unable to clean up temp file {0}: {1}", path.display(), e);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum FileOperationsError {
    #[error("I/O error on {0}: {1}")]
    IOError(PathBuf, std::io::Error),
}

impl FileOperationsError {
    pub fn is_not_found(&self) -> bool {
        match self {
            FileOperationsError::IOError(_, e) => e.kind() == ErrorKind::NotFound,
        }
    }
}
