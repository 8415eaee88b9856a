// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the photo library

use snapcam::errors::PhotoError;
use snapcam::storage::{DirectoryLibrary, PhotoLibrary};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("snapcam-storage-{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn test_save_writes_jpeg_named_file() {
    let dir = temp_dir();
    let library = DirectoryLibrary::new(&dir);

    let data: Arc<[u8]> = Arc::from(vec![0xFFu8, 0xD8, 0xFF, 0xD9]);
    let path = library.save(Arc::clone(&data)).await.expect("save photo");

    assert!(path.starts_with(&dir));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("IMG_"), "unexpected name {}", name);
    assert!(name.ends_with(".jpg"));
    assert_eq!(std::fs::read(&path).unwrap(), data.to_vec());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_saves_never_overwrite() {
    let dir = temp_dir();
    let library = DirectoryLibrary::new(&dir);

    let first = library.save(Arc::from(vec![1u8])).await.unwrap();
    let second = library.save(Arc::from(vec![2u8])).await.unwrap();
    let third = library.save(Arc::from(vec![3u8])).await.unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
    assert_eq!(std::fs::read(&first).unwrap(), vec![1u8]);
    assert_eq!(std::fs::read(&third).unwrap(), vec![3u8]);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_empty_data_is_rejected() {
    let dir = temp_dir();
    let library = DirectoryLibrary::new(&dir);

    let result = library.save(Arc::from(Vec::<u8>::new())).await;
    assert!(matches!(result, Err(PhotoError::SaveFailed(_))));
    assert!(!dir.exists());
}
