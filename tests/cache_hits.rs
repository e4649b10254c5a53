mod common;

use common::create_file;
use foldcat::config::ConfigBuilder;
use foldcat::selection::{FsSelection, MemorySelection};
use foldcat::{RunState, Session};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_unchanged_selection_is_a_hit() -> anyhow::Result<()> {
    let selection = MemorySelection::new("drop")
        .with_file("a.txt", b"alpha".to_vec())
        .with_file("b.txt", b"beta".to_vec());
    let session = Session::new(ConfigBuilder::new().build()?);

    let first = session.ingest(&selection)?;
    let second = session.ingest(&selection)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(session.state(), RunState::Completed);
    assert_eq!(session.progress().fraction(), 1.0);
    Ok(())
}

#[test]
fn test_changed_content_is_a_miss() -> anyhow::Result<()> {
    let session = Session::new(ConfigBuilder::new().build()?);
    let first = session.ingest(&MemorySelection::new("drop").with_file("a.txt", b"one".to_vec()))?;
    let second = session.ingest(&MemorySelection::new("drop").with_file("a.txt", b"two".to_vec()))?;
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(session.file_text("a.txt")?, "two");
    Ok(())
}

#[test]
fn test_folder_reingest_is_byte_identical() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "src/main.rs", "fn main() {}");
    create_file(temp.path(), "README.md", "# readme");
    let config = ConfigBuilder::new().input_path(temp.path().to_string_lossy()).build()?;
    let selection = FsSelection::new(temp.path(), config.discovery.clone());
    let session = Session::new(config);

    let first = session.ingest(&selection)?;
    let document = first.assembly.document.as_str().to_string();
    let second = session.ingest(&selection)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.assembly.document.as_str(), document);

    // a size change alters the fingerprint
    fs::write(temp.path().join("README.md"), "# readme, longer now")?;
    let third = session.ingest(&selection)?;
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third.assembly.document.as_str().contains("longer now"));
    Ok(())
}

#[test]
fn test_config_change_is_a_miss() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let cache_dir = temp.path().join("cache");
    let selection = MemorySelection::new("drop").with_file("a.c", b"int a; // note".to_vec());

    let plain = Session::new(ConfigBuilder::new().cache_dir(&cache_dir).build()?);
    plain.ingest(&selection)?;
    let condensed = Session::new(
        ConfigBuilder::new()
            .cache_dir(&cache_dir)
            .extract_content(true)
            .build()?,
    );
    condensed.ingest(&selection)?;
    assert!(!condensed.file_text("a.c")?.contains("note"));
    Ok(())
}

#[test]
fn test_disk_cache_survives_sessions() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let cache_dir = temp.path().join("cache");
    let selection = MemorySelection::new("drop").with_file("a.txt", b"persisted".to_vec());

    let first = Session::new(ConfigBuilder::new().cache_dir(&cache_dir).build()?);
    let original = first.ingest(&selection)?;
    let blobs = fs::read_dir(&cache_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .count();
    assert_eq!(blobs, 1);

    let second = Session::new(ConfigBuilder::new().cache_dir(&cache_dir).build()?);
    let restored = second.ingest(&selection)?;
    assert_eq!(*restored, *original);
    Ok(())
}

#[test]
fn test_corrupt_disk_blob_is_a_miss() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let cache_dir = temp.path().join("cache");
    let selection = MemorySelection::new("drop").with_file("a.txt", b"data".to_vec());

    Session::new(ConfigBuilder::new().cache_dir(&cache_dir).build()?).ingest(&selection)?;
    for entry in fs::read_dir(&cache_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|x| x == "json") {
            fs::write(&path, b"{ truncated")?;
        }
    }

    let session = Session::new(ConfigBuilder::new().cache_dir(&cache_dir).build()?);
    session.ingest(&selection)?;
    assert_eq!(session.state(), RunState::Completed);
    assert_eq!(session.file_text("a.txt")?, "data");
    Ok(())
}

#[test]
fn test_clear_cache_and_zero_capacity() -> anyhow::Result<()> {
    let selection = MemorySelection::new("drop").with_file("a.txt", b"x".to_vec());

    let session = Session::new(ConfigBuilder::new().build()?);
    let first = session.ingest(&selection)?;
    session.clear_cache()?;
    let second = session.ingest(&selection)?;
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);

    let uncached = Session::new(ConfigBuilder::new().cache_capacity(0).build()?);
    let a = uncached.ingest(&selection)?;
    let b = uncached.ingest(&selection)?;
    assert!(!Arc::ptr_eq(&a, &b));
    Ok(())
}
