use super::{normalize_path, Entry, FsFile, Selection};
use crate::cancellation::CancellationToken;
use crate::config::DiscoveryConfig;
use crate::errors::{Error, Result};
use crossbeam_channel::unbounded;
use glob::Pattern;
use ignore::{DirEntry, WalkBuilder, WalkParallel, WalkState};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A folder (or a single file) on the local filesystem.
///
/// Folders are walked in parallel with the `ignore` crate, so `.gitignore`,
/// `.ignore` and hidden-file rules apply unless disabled in
/// [`DiscoveryConfig`]. Entry paths are relative to the folder. A single file
/// root yields one entry named after the file.
///
/// # Examples
/// ```no_run
/// use foldcat::config::DiscoveryConfig;
/// use foldcat::selection::{FsSelection, Selection};
/// use foldcat::CancellationToken;
///
/// # fn main() -> Result<(), foldcat::Error> {
/// let selection = FsSelection::new("./src", DiscoveryConfig::default());
/// for entry in selection.entries(&CancellationToken::new())? {
///     println!("{:?} {}", entry.kind, entry.path);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FsSelection {
    root: PathBuf,
    config: DiscoveryConfig,
}

impl FsSelection {
    pub fn new(root: impl Into<PathBuf>, config: DiscoveryConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_root(&self) -> Result<PathBuf> {
        let unreadable = |source| Error::RootUnreadable {
            path: self.root.display().to_string(),
            source,
        };
        let root = self.root.canonicalize().map_err(unreadable)?;
        if root.is_dir() {
            // Fail early on a folder we cannot list; the walker would only log it.
            std::fs::read_dir(&root).map_err(unreadable)?;
        }
        Ok(root)
    }
}

impl Selection for FsSelection {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    fn entries(&self, token: &CancellationToken) -> Result<Vec<Entry>> {
        token.check()?;
        let root = self.resolve_root()?;

        if root.is_file() {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let provider = FsFile::from_path(&root).map_err(|source| Error::RootUnreadable {
                path: root.display().to_string(),
                source,
            })?;
            debug!("Selection root is a single file: {}", name);
            return Ok(vec![Entry::file(name, Arc::new(provider))]);
        }

        let walker = build_walker(&root, &self.config);
        let (tx, rx) = unbounded();
        let token_clone = token.clone();
        let root_clone = root.clone();

        walker.run(move || {
            let tx = tx.clone();
            let token = token_clone.clone();
            let root = root_clone.clone();

            Box::new(move |entry_result| {
                if token.is_cancelled() {
                    return WalkState::Quit;
                }
                match entry_result {
                    Ok(dir_entry) => {
                        if let Some(entry) = to_entry(&dir_entry, &root) {
                            if tx.send(entry).is_err() {
                                log::error!("Receiver dropped, quitting selection walk.");
                                return WalkState::Quit;
                            }
                        }
                    }
                    Err(e) => log::warn!("Skipping unreadable path: {}", e),
                }
                WalkState::Continue
            })
        });

        token.check()?;

        let mut entries: Vec<Entry> = rx.into_iter().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(
            "Walk of {} complete: {} entries",
            root.display(),
            entries.len()
        );
        Ok(entries)
    }
}

/// Converts one walker result into an [`Entry`]. The root itself and
/// anything that is neither a file nor a directory are skipped.
fn to_entry(dir_entry: &DirEntry, root: &Path) -> Option<Entry> {
    if dir_entry.depth() == 0 {
        return None;
    }
    let relative = dir_entry.path().strip_prefix(root).ok()?;
    let relative = normalize_path(&relative.to_string_lossy());
    if relative.is_empty() {
        return None;
    }

    let file_type = dir_entry.file_type()?;
    if file_type.is_dir() {
        return Some(Entry::directory(relative));
    }
    if !file_type.is_file() {
        // Symlinks are not followed.
        return None;
    }
    match dir_entry.metadata() {
        Ok(metadata) => {
            let provider = FsFile::new(
                dir_entry.path().to_path_buf(),
                metadata.len(),
                metadata.modified().ok(),
            );
            Some(Entry::file(relative, Arc::new(provider)))
        }
        Err(e) => {
            // Still list the file; the read will fail and mark it.
            log::warn!("Cannot stat '{}': {}", relative, e);
            let provider = FsFile::new(dir_entry.path().to_path_buf(), 0, None);
            Some(Entry::file(relative, Arc::new(provider)))
        }
    }
}

/// Configures the parallel walker from the discovery settings.
pub(super) fn build_walker(root: &Path, config: &DiscoveryConfig) -> WalkParallel {
    let mut walker_builder = WalkBuilder::new(root);

    walker_builder.standard_filters(config.use_gitignore);
    debug!(
        "Configuring WalkBuilder: standard_filters {}.",
        if config.use_gitignore {
            "enabled"
        } else {
            "disabled"
        }
    );
    // Honor .gitignore files even outside a git repository.
    walker_builder.require_git(false);

    if !config.recursive {
        walker_builder.max_depth(Some(1));
        debug!("Recursion disabled (max depth: 1).");
    }

    let custom_ignore_globs: Vec<Pattern> = config
        .ignore_patterns
        .iter()
        .flatten()
        .filter_map(|p| match Pattern::new(p) {
            Ok(glob) => {
                debug!("Compiled custom ignore glob: {}", p);
                Some(glob)
            }
            Err(e) => {
                log::warn!("Invalid ignore glob pattern '{}': {}", p, e);
                None
            }
        })
        .collect();

    if !custom_ignore_globs.is_empty() {
        let root = root.to_path_buf();
        walker_builder.filter_entry(move |entry| {
            let path = entry.path();
            let relative = path.strip_prefix(&root).unwrap_or(path);
            let skip = custom_ignore_globs
                .iter()
                .any(|glob| glob.matches_path(relative));
            if skip {
                debug!("Skipping {:?}: matches custom ignore glob", relative);
            }
            !skip
        });
    }

    walker_builder.build_parallel()
}
