mod common;

use common::create_file;
use foldcat::assemble::parse_document;
use foldcat::config::ConfigBuilder;
use foldcat::errors::Error;
use foldcat::selection::{FsSelection, MemorySelection};
use foldcat::{IssueKind, RunState, Session};
use tempfile::tempdir;

fn ingest_dir(builder: ConfigBuilder, root: &std::path::Path) -> foldcat::Result<(Session, std::sync::Arc<foldcat::Snapshot>)> {
    let config = builder.input_path(root.to_string_lossy()).build()?;
    let selection = FsSelection::new(root, config.discovery.clone());
    let session = Session::new(config);
    let snapshot = session.ingest(&selection)?;
    Ok((session, snapshot))
}

#[test]
fn test_folder_document_is_exact() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "b.txt", "Content B");
    create_file(temp.path(), "a.rs", "fn a() {}\n");
    create_file(temp.path(), "src/lib.rs", "pub mod x;");

    let (session, snapshot) = ingest_dir(ConfigBuilder::new(), temp.path())?;
    let expected = "## File: src/lib.rs\n```rs\npub mod x;\n```\n\n\
                    ## File: a.rs\n```rs\nfn a() {}\n```\n\n\
                    ## File: b.txt\n```txt\nContent B\n```\n\n";
    assert_eq!(snapshot.assembly.document.as_str(), expected);
    assert_eq!(session.state(), RunState::Completed);
    assert_eq!(snapshot.assembly.document.line_count(), 15);
    Ok(())
}

#[test]
fn test_spans_tile_document_in_tree_order() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "Zeta.md", "z");
    create_file(temp.path(), "alpha.md", "a\nb\nc");
    create_file(temp.path(), "docs/guide.md", "# Guide\n\n```rust\nlet x = 1;\n```");
    create_file(temp.path(), "docs/img.png", [0x89u8, b'P', b'N', b'G', 0, 0, 0, 0x0d]);

    let (_, snapshot) = ingest_dir(ConfigBuilder::new(), temp.path())?;
    let index = &snapshot.assembly.index;
    let order: Vec<_> = index.spans().iter().map(|s| s.path.as_str()).collect();
    assert_eq!(order, vec!["docs/guide.md", "alpha.md", "Zeta.md"]);
    assert!(snapshot.assembly.is_consistent());

    let last = index.spans().last().unwrap();
    assert_eq!(last.end_line, snapshot.assembly.document.line_count());
    assert_eq!(last.end_offset, snapshot.assembly.document.char_count());
    assert!(snapshot.tree.find("docs/img.png").is_some());
    assert!(index.get("docs/img.png").is_none());
    Ok(())
}

#[test]
fn test_document_round_trips_through_parser() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "one.txt", "first\nsecond\n");
    create_file(temp.path(), "fence.md", "````\nnested ``` fence\n````");
    create_file(temp.path(), "empty.txt", "");

    let (_, snapshot) = ingest_dir(ConfigBuilder::new(), temp.path())?;
    let parsed = parse_document(snapshot.assembly.document.as_str());
    assert_eq!(
        parsed,
        vec![
            ("empty.txt".to_string(), String::new()),
            ("fence.md".to_string(), "````\nnested ``` fence\n````".to_string()),
            ("one.txt".to_string(), "first\nsecond".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_awkward_names_keep_document_parseable() -> anyhow::Result<()> {
    let selection = MemorySelection::new("drop")
        .with_file("evil\nname.txt", b"split header".to_vec())
        .with_file("ok.`x", b"tick".to_vec())
        .with_file("plain.txt", b"plain".to_vec());
    let session = Session::new(ConfigBuilder::new().build()?);
    let snapshot = session.ingest(&selection)?;

    assert_eq!(session.file_text("ok.`x")?, "tick");
    assert_eq!(session.file_text("plain.txt")?, "plain");
    assert!(snapshot.tree.find("evil\nname.txt").is_none());
    assert!(snapshot
        .stats
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::UnsafePath));

    let parsed = parse_document(snapshot.assembly.document.as_str());
    assert_eq!(
        parsed,
        vec![
            ("ok.`x".to_string(), "tick".to_string()),
            ("plain.txt".to_string(), "plain".to_string()),
        ]
    );
    assert!(snapshot.assembly.is_consistent());
    Ok(())
}

#[test]
fn test_gitignore_and_custom_ignore() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), ".gitignore", "*.log\n");
    create_file(temp.path(), "keep.txt", "keep");
    create_file(temp.path(), "debug.log", "noise");
    create_file(temp.path(), "target/out.txt", "build output");

    let builder = ConfigBuilder::new().ignore_patterns(vec!["target/**".to_string()]);
    let (_, snapshot) = ingest_dir(builder, temp.path())?;
    assert!(snapshot.tree.find("keep.txt").is_some());
    assert!(snapshot.tree.find("debug.log").is_none());
    assert!(snapshot.tree.find("target/out.txt").is_none());
    Ok(())
}

#[test]
fn test_decoding_and_line_endings() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let mut utf16 = vec![0xFF, 0xFE];
    utf16.extend("hé\r\nthere".encode_utf16().flat_map(|u| u.to_le_bytes()));
    create_file(temp.path(), "wide.txt", utf16);
    create_file(temp.path(), "legacy.txt", b"caf\xe9 au lait".to_vec());
    create_file(temp.path(), "crlf.txt", "one\r\ntwo\rthree");

    let (session, snapshot) = ingest_dir(ConfigBuilder::new(), temp.path())?;
    assert_eq!(session.file_text("wide.txt")?, "hé\nthere");
    assert_eq!(session.file_text("crlf.txt")?, "one\ntwo\nthree");
    // not UTF-8 and no fallback declared
    assert!(matches!(session.file_text("legacy.txt"), Err(Error::NotAFile(_))));
    assert_eq!(snapshot.stats.binary_files, 1);

    let (session, _) = ingest_dir(ConfigBuilder::new().encoding("latin1"), temp.path())?;
    assert_eq!(session.file_text("legacy.txt")?, "café au lait");
    Ok(())
}

#[test]
fn test_condensed_extract_strategy() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "main.c", "int x; // trailing\n\n/* block */\nint y;\n");
    create_file(temp.path(), "notes.md", "See http://example.com\n\n/* literal */\n");

    let (session, _) = ingest_dir(ConfigBuilder::new().extract_content(true), temp.path())?;
    let text = session.file_text("main.c")?;
    assert!(!text.contains("trailing"));
    assert!(!text.contains("block"));
    assert!(text.contains("int x;"));
    assert!(text.contains("int y;"));
    assert_eq!(
        session.file_text("notes.md")?,
        "See http://example.com\n/* literal */"
    );
    Ok(())
}

#[test]
fn test_unreadable_root_fails_run() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let missing = temp.path().join("does-not-exist");
    let config = ConfigBuilder::new().input_path(missing.to_string_lossy()).build()?;
    let selection = FsSelection::new(&missing, config.discovery.clone());
    let session = Session::new(config);

    assert!(matches!(
        session.ingest(&selection),
        Err(Error::RootUnreadable { .. })
    ));
    assert_eq!(session.state(), RunState::Failed);
    assert!(session.snapshot().is_none());
    Ok(())
}

#[test]
fn test_save_writes_document() -> anyhow::Result<()> {
    let temp = tempdir()?;
    create_file(temp.path(), "in/a.txt", "hello");
    let (session, snapshot) = ingest_dir(ConfigBuilder::new(), &temp.path().join("in"))?;

    let out = temp.path().join("out.md");
    session.save(&out)?;
    assert_eq!(std::fs::read_to_string(out)?, snapshot.assembly.document.as_str());
    Ok(())
}
