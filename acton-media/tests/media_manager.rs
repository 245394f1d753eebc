//! Integration tests for the media manager
//!
//! Runs the manager end to end against both shipped backends.

use acton_media::config::{DiskSettings, MediaConfig};
use acton_media::storage::{LocalStore, MemoryStore};
use acton_media::{MediaError, MediaManager, StorageError, Store};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF_MAGIC: &[u8] = b"GIF89a";

fn config_without_suffix() -> MediaConfig {
    MediaConfig {
        suffix: None,
        ..MediaConfig::default()
    }
}

fn memory_manager() -> (MediaManager, MemoryStore) {
    let store = MemoryStore::new("media");
    let manager = MediaManager::new(config_without_suffix(), Arc::new(store.clone()));
    (manager, store)
}

#[tokio::test]
async fn test_save_then_refuse_then_replace() {
    let (manager, store) = memory_manager();

    let first = manager
        .resource_from_raw(PNG_MAGIC.to_vec(), None)
        .unwrap()
        .pathname("/a/b/")
        .filename("logo")
        .finalize()
        .unwrap();
    assert_eq!(manager.save(&first, false).await.unwrap(), "/a/b/logo.png");

    let second = manager
        .resource_from_raw(GIF_MAGIC.to_vec(), None)
        .unwrap()
        .pathname("a/b")
        .filename_with_extension("logo", "png")
        .finalize()
        .unwrap();
    assert_eq!(second.path(), first.path());

    let refused = manager.save(&second, false).await;
    assert!(matches!(refused, Err(MediaError::AlreadyExists { ref path }) if path == "/a/b/logo.png"));
    assert_eq!(store.get("/a/b/logo.png").as_deref(), Some(PNG_MAGIC));

    manager.replace(&second).await.unwrap();
    assert_eq!(store.get("/a/b/logo.png").as_deref(), Some(GIF_MAGIC));
}

#[tokio::test]
async fn test_random_names_do_not_collide() {
    let (manager, store) = memory_manager();

    for _ in 0..20 {
        let resource = manager
            .resource_from_raw(PNG_MAGIC.to_vec(), None)
            .unwrap()
            .pathname("uploads")
            .finalize()
            .unwrap();
        manager.save(&resource, false).await.unwrap();
    }

    assert_eq!(store.len(), 20);
    assert!(store.keys().iter().all(|key| key.starts_with("uploads/") && key.ends_with(".png")));
}

#[tokio::test]
async fn test_rename_move_copy_delete() {
    let (manager, store) = memory_manager();

    let resource = manager
        .resource_from_raw(PNG_MAGIC.to_vec(), None)
        .unwrap()
        .pathname("docs")
        .filename("report")
        .finalize()
        .unwrap();
    let path = manager.save(&resource, false).await.unwrap();

    assert!(manager.rename(&path, "final.png").await.unwrap());
    assert!(!manager.exists("/docs/report.png").await.unwrap());
    assert!(manager.exists("/docs/final.png").await.unwrap());

    assert!(manager.copy("/docs/final.png", "/archive/final.png").await.unwrap());
    assert!(manager.move_file("/docs/final.png", "/docs/moved.png").await.unwrap());
    assert!(!manager.move_file("/docs/final.png", "/docs/again.png").await.unwrap());

    let paths = BTreeSet::from(["/docs/moved.png".to_string(), "/archive/final.png".to_string()]);
    assert!(manager.delete(&paths).await.unwrap());
    assert!(store.is_empty());

    assert!(!manager.delete_one("/docs/moved.png").await.unwrap());
}

#[tokio::test]
async fn test_rename_rejects_directory_paths() {
    let (manager, _store) = memory_manager();

    for bad in ["/docs/", "", "//x.png"] {
        let result = manager.rename(bad, "final.png").await;
        assert!(matches!(result, Err(MediaError::InvalidPath { .. })), "{bad:?}");
    }
}

#[tokio::test]
async fn test_rename_onto_existing_file_is_refused() {
    let (manager, store) = memory_manager();
    store.save("/docs/a.png", Bytes::from_static(b"A")).await.unwrap();
    store.save("/docs/b.png", Bytes::from_static(b"B")).await.unwrap();

    let result = manager.rename("/docs/a.png", "b.png").await;
    assert!(matches!(result, Err(MediaError::Storage(StorageError::TargetExists(_)))));

    assert_eq!(store.get("/docs/a.png").as_deref(), Some(&b"A"[..]));
    assert_eq!(store.get("/docs/b.png").as_deref(), Some(&b"B"[..]));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_local_copy_onto_existing_file_is_refused() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new("media", dir.path()).unwrap();
    let manager = MediaManager::new(config_without_suffix(), Arc::new(store));

    std::fs::write(dir.path().join("a.png"), b"A").unwrap();
    std::fs::write(dir.path().join("b.png"), b"B").unwrap();

    assert!(matches!(
        manager.copy("/a.png", "/b.png").await,
        Err(MediaError::Storage(StorageError::TargetExists(_)))
    ));
    assert!(matches!(
        manager.rename("/a.png", "b.png").await,
        Err(MediaError::Storage(StorageError::TargetExists(_)))
    ));
    assert_eq!(std::fs::read(dir.path().join("b.png")).unwrap(), b"B");
    assert!(dir.path().join("a.png").exists());
}

#[tokio::test]
async fn test_local_disk_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new("media", dir.path()).unwrap();
    let manager = MediaManager::new(config_without_suffix(), Arc::new(store));

    let resource = manager
        .resource_from_base64("R0lGODlhAQABAAAAACw=", None)
        .unwrap()
        .pathname("/avatars")
        .filename("me")
        .finalize()
        .unwrap();
    assert_eq!(resource.mimetype(), "image/gif");

    let path = manager.save(&resource, false).await.unwrap();
    assert_eq!(path, "/avatars/me.gif");

    let on_disk = tokio::fs::read(dir.path().join("avatars/me.gif")).await.unwrap();
    assert_eq!(on_disk, &resource.raw()[..]);

    assert!(matches!(
        manager.save(&resource, false).await,
        Err(MediaError::AlreadyExists { .. })
    ));

    assert!(manager.rename(&path, "you.gif").await.unwrap());
    assert!(dir.path().join("avatars/you.gif").exists());
    assert!(!dir.path().join("avatars/me.gif").exists());

    assert!(manager.delete_one("/avatars/you.gif").await.unwrap());
    assert!(!dir.path().join("avatars/you.gif").exists());
}

#[tokio::test]
async fn test_from_config_opens_configured_disk() {
    let dir = TempDir::new().unwrap();

    let mut config = config_without_suffix();
    config.path = dir.path().to_path_buf();
    let manager = MediaManager::from_config(config).unwrap();

    let resource = manager
        .resource_from_raw(PNG_MAGIC.to_vec(), None)
        .unwrap()
        .filename("x")
        .finalize()
        .unwrap();
    manager.save(&resource, false).await.unwrap();

    assert!(manager.path_for("/x.png").exists());
    assert_eq!(manager.path(), dir.path());
}

#[tokio::test]
async fn test_from_config_with_memory_disk() {
    let mut config = config_without_suffix();
    config.disk = "scratch".to_string();
    config.disks.insert("scratch".to_string(), DiskSettings::Memory);

    let manager = MediaManager::from_config(config).unwrap();
    let resource = manager
        .resource_from_raw(PNG_MAGIC.to_vec(), None)
        .unwrap()
        .filename("x")
        .finalize()
        .unwrap();

    manager.save(&resource, false).await.unwrap();
    assert!(manager.exists("/x.png").await.unwrap());
}

#[test]
fn test_from_config_rejects_unknown_disk() {
    let config = MediaConfig {
        disk: "missing".to_string(),
        ..MediaConfig::default()
    };

    assert!(matches!(
        MediaManager::from_config(config),
        Err(MediaError::UnknownDisk(disk)) if disk == "missing"
    ));
}

#[tokio::test]
async fn test_concurrent_creates_admit_one_writer() {
    let (manager, store) = memory_manager();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let resource = manager
                .resource_from_raw(PNG_MAGIC.to_vec(), None)
                .unwrap()
                .filename("shared")
                .finalize()
                .unwrap();
            manager.save(&resource, false).await
        }));
    }

    let mut saved = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => saved += 1,
            Err(MediaError::AlreadyExists { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(saved, 1);
    assert_eq!(refused, 15);
    assert_eq!(store.len(), 1);
}
