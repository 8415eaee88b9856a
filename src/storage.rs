// SPDX-License-Identifier: GPL-3.0-only

//! Photo library
//!
//! The destination of saved photos. The capture controller only sees the
//! [`PhotoLibrary`] trait; [`DirectoryLibrary`] is the on-disk implementation.

use crate::constants::photo;
use crate::errors::PhotoError;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Destination for encoded photos
pub trait PhotoLibrary: Send + Sync {
    /// Persist one encoded photo, returning where it landed
    fn save(&self, data: Arc<[u8]>) -> BoxFuture<'_, Result<PathBuf, PhotoError>>;
}

/// Photo library backed by a directory
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    dir: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PhotoLibrary for DirectoryLibrary {
    fn save(&self, data: Arc<[u8]>) -> BoxFuture<'_, Result<PathBuf, PhotoError>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            if data.is_empty() {
                return Err(PhotoError::SaveFailed("no image data".to_string()));
            }

            let timestamp = chrono::Local::now()
                .format(photo::TIMESTAMP_FORMAT)
                .to_string();

            // Write to disk in background task (I/O-bound)
            let filepath = tokio::task::spawn_blocking(move || write_unique(&dir, &timestamp, &data))
                .await
                .map_err(|e| PhotoError::SaveFailed(format!("Save task error: {}", e)))??;

            info!(path = %filepath.display(), "Photo saved successfully");
            Ok(filepath)
        })
    }
}

/// Write `data` as `IMG_<timestamp>.jpg`, appending `_N` if the name is taken
fn write_unique(dir: &Path, timestamp: &str, data: &[u8]) -> Result<PathBuf, PhotoError> {
    std::fs::create_dir_all(dir)?;

    let mut suffix = 0u32;
    loop {
        let filename = if suffix == 0 {
            format!("{}_{}.{}", photo::FILENAME_PREFIX, timestamp, photo::EXTENSION)
        } else {
            format!(
                "{}_{}_{}.{}",
                photo::FILENAME_PREFIX,
                timestamp,
                suffix,
                photo::EXTENSION
            )
        };
        let filepath = dir.join(filename);

        // create_new fails if the file exists, so concurrent saves never overwrite
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&filepath)
        {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(data)?;
                return Ok(filepath);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %filepath.display(), "Filename taken");
                suffix += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
