use crate::errors::{Error, Issue, IssueKind, Result};
use crate::selection::{is_archive_path, normalize_path, Entry, InMemory};
use std::io::{Cursor, Read};
use std::sync::Arc;
use zip::ZipArchive;

/// One item yielded by [`ArchiveMembers`].
#[derive(Debug)]
pub enum Member {
    /// A directory record. Carries the full path (archive path included).
    Directory(String),
    /// A decompressed file, ready to be processed like any other entry.
    File(Entry),
    /// A member that could not be used: unreadable, corrupt, or unsafely named.
    Failed(Issue),
}

/// Lazily decompresses the members of one ZIP archive.
///
/// Members are read one at a time as the iterator advances. Each read is
/// bounded to one byte past the applicable limit, so a member whose header
/// understates its size cannot exhaust memory; the processing stage then
/// sees the overflow and classifies the member as oversized. Nested archives
/// are bounded by the archive limit instead and fail when they exceed it.
pub struct ArchiveMembers {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    path: String,
    next: usize,
    member_limit: u64,
    archive_limit: u64,
}

impl ArchiveMembers {
    /// Reads `entry`, up to `archive_limit` bytes, and opens it as a ZIP
    /// archive.
    ///
    /// # Errors
    /// [`Error::EntryRead`] if the bytes cannot be read and
    /// [`Error::ArchiveCorrupt`] if they are not a readable archive or turn
    /// out to be longer than `archive_limit`.
    pub fn open(entry: &Entry, member_limit: u64, archive_limit: u64) -> Result<Self> {
        let bytes = entry
            .read_bounded(archive_limit.saturating_add(1))
            .map_err(|source| Error::EntryRead {
                path: entry.path.clone(),
                source,
            })?;
        if bytes.len() as u64 > archive_limit {
            return Err(Error::ArchiveCorrupt {
                path: entry.path.clone(),
                reason: format!("archive exceeds {} bytes", archive_limit),
            });
        }
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::ArchiveCorrupt {
            path: entry.path.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("Opened archive {} ({} members)", entry.path, archive.len());
        Ok(Self {
            archive,
            path: entry.path.clone(),
            next: 0,
            member_limit,
            archive_limit,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of member records, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Sum of the declared uncompressed sizes. Only used for progress.
    pub fn total_bytes(&mut self) -> u64 {
        (0..self.archive.len())
            .filter_map(|i| self.archive.by_index_raw(i).ok().map(|f| f.size()))
            .fold(0u64, u64::saturating_add)
    }

    fn read_member(&mut self, index: usize) -> Member {
        let fallback_name = self
            .archive
            .name_for_index(index)
            .map(normalize_path)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("#{}", index));

        let (member_limit, archive_limit) = (self.member_limit, self.archive_limit);
        let archive_path = self.path.clone();
        let mut file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => return corrupt(member_path(&archive_path, &fallback_name), e),
        };

        let Some(inner) = file.enclosed_name() else {
            let path = member_path(&archive_path, &fallback_name);
            let message = format!("unsafe member name '{}'", file.name());
            log::warn!("Skipping {} in {}", message, archive_path);
            return Member::Failed(Issue::new(path, IssueKind::UnsafePath, message));
        };
        let inner = inner.to_string_lossy().into_owned();

        if file.is_dir() {
            return Member::Directory(member_path(&archive_path, &inner));
        }

        let nested = is_archive_path(&inner);
        let limit = if nested {
            archive_limit
        } else {
            member_limit
        };
        let mut buffer = Vec::with_capacity(file.size().min(limit) as usize);
        let read = (&mut file).take(limit.saturating_add(1)).read_to_end(&mut buffer);
        drop(file);

        if let Err(e) = read {
            return corrupt(member_path(&archive_path, &inner), e);
        }
        if nested && buffer.len() as u64 > limit {
            return corrupt(
                member_path(&archive_path, &inner),
                format!("nested archive exceeds {} bytes", limit),
            );
        }
        Member::File(Entry::archive_member(
            &archive_path,
            &inner,
            Arc::new(InMemory::new(buffer)),
        ))
    }
}

fn member_path(archive: &str, inner: &str) -> String {
    normalize_path(&format!("{}/{}", archive, inner))
}

fn corrupt(path: String, reason: impl ToString) -> Member {
    let err = Error::ArchiveCorrupt {
        path: path.clone(),
        reason: reason.to_string(),
    };
    Member::Failed(Issue::from_error(path, &err))
}

impl Iterator for ArchiveMembers {
    type Item = Member;

    fn next(&mut self) -> Option<Member> {
        if self.next >= self.archive.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.read_member(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.archive.len() - self.next;
        (remaining, Some(remaining))
    }
}
