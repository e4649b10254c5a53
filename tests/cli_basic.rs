mod common;

use assert_cmd::prelude::*;
use common::{create_file, foldcat_cmd, zip_bytes};
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_no_args_uses_current_dir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    create_file(temp.path(), "test.txt", "Hello");

    foldcat_cmd()
        .arg("--no-cache")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("## File: test.txt\n```txt\nHello\n```\n"));

    temp.close()?;
    Ok(())
}

#[test]
fn test_specific_file_input() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    create_file(temp.path(), "input.rs", "fn main() {}");

    foldcat_cmd()
        .arg(temp.path().join("input.rs"))
        .arg("--no-cache")
        .assert()
        .success()
        .stdout(predicate::eq("## File: input.rs\n```rs\nfn main() {}\n```\n\n"));
    Ok(())
}

#[test]
fn test_output_file_and_summary() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("in");
    create_file(&input, "a.txt", "alpha");
    create_file(&input, "img.bin", [0u8, 1, 2, 3, 0]);
    let output = temp.path().join("out.md");

    foldcat_cmd()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--summary", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Processed Files: (2)"))
        .stderr(predicate::str::contains("- img.bin (binary)"))
        .stderr(predicate::str::contains("Text: 1, Binary: 1, Failed: 0"));

    assert_eq!(fs::read_to_string(output)?, "## File: a.txt\n```txt\nalpha\n```\n\n");
    Ok(())
}

#[test]
fn test_zip_and_tree_view() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let root = temp.path().join("proj");
    create_file(&root, "bundle.zip", zip_bytes(&[("a.txt", b"hello"), ("b/c.txt", b"world")]));

    foldcat_cmd()
        .arg(&root)
        .args(["--tree", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## File: bundle.zip/b/c.txt"))
        .stdout(predicate::str::contains("## File: bundle.zip/a.txt"))
        .stderr(predicate::str::contains(
            "proj/\n└── bundle.zip/\n    ├── b/\n    │   └── c.txt\n    └── a.txt\n",
        ));
    Ok(())
}

#[test]
fn test_no_archives_flag() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    create_file(temp.path(), "bundle.zip", zip_bytes(&[("a.txt", b"hello")]));

    foldcat_cmd()
        .arg(temp.path())
        .args(["--no-archives", "--no-cache", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## File:").not())
        .stderr(predicate::str::contains("- bundle.zip (binary)"));
    Ok(())
}

#[test]
fn test_extract_flag_condenses() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    create_file(temp.path(), "lib.rs", "// header\n\nfn x() {} /* inline */\n");

    foldcat_cmd()
        .arg(temp.path())
        .args(["-x", "--no-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fn x() {}"))
        .stdout(predicate::str::contains("header").not())
        .stdout(predicate::str::contains("inline").not());
    Ok(())
}

#[test]
fn test_cache_dir_is_populated_and_cleared() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("in");
    let cache = temp.path().join("cache");
    create_file(&input, "a.txt", "cached");

    let run = |extra: &[&str]| {
        foldcat_cmd()
            .arg(&input)
            .arg("--cache-dir")
            .arg(&cache)
            .args(extra)
            .assert()
            .success()
            .stdout(predicate::str::contains("cached"));
    };
    run(&[]);
    run(&[]);
    let blobs = || {
        fs::read_dir(&cache)
            .map(|d| {
                d.filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
                    .count()
            })
            .unwrap_or(0)
    };
    assert_eq!(blobs(), 1);

    let stale = cache.join("stale.json");
    fs::write(&stale, "{}")?;
    run(&["--clear-cache"]);
    assert!(!stale.exists());
    assert_eq!(blobs(), 1);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_clear_cache_works_with_no_cache() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("in");
    let xdg_cache = temp.path().join("xdg");
    create_file(&input, "a.txt", "cached");
    let blobs = || {
        fs::read_dir(xdg_cache.join("foldcat"))
            .map(|d| {
                d.filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
                    .count()
            })
            .unwrap_or(0)
    };

    foldcat_cmd()
        .arg(&input)
        .env("XDG_CACHE_HOME", &xdg_cache)
        .assert()
        .success();
    assert!(blobs() > 0);

    foldcat_cmd()
        .arg(&input)
        .env("XDG_CACHE_HOME", &xdg_cache)
        .args(["--no-cache", "--clear-cache"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Cache cleared."));
    assert_eq!(blobs(), 0);
    Ok(())
}

#[test]
fn test_missing_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    foldcat_cmd()
        .arg(temp.path().join("nope"))
        .arg("--no-cache")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot read selection root"));
    Ok(())
}

#[test]
fn test_invalid_max_size_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    foldcat_cmd()
        .arg(temp.path())
        .args(["-m", "lots", "--no-cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

#[test]
fn test_cache_dir_conflicts_with_no_cache() {
    foldcat_cmd()
        .args(["--no-cache", "--cache-dir", "x"])
        .assert()
        .failure();
}
