use super::Entry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of a selection plus the settings it was processed with.
///
/// Two selections with the same set of `(kind, path, fingerprint)` triples and
/// the same configuration fingerprint have equal signatures, whatever order
/// their entries were enumerated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(String);

impl Signature {
    pub fn compute(entries: &[Entry], config_fingerprint: &str) -> Self {
        let mut lines: Vec<String> = entries.iter().map(Entry::signature_line).collect();
        lines.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(config_fingerprint.as_bytes());
        hasher.update(b"\n");
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Signature(hex::encode(hasher.finalize()))
    }

    /// Lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
