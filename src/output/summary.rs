// src/output/summary.rs

use crate::constants;
use crate::session::Snapshot;
use anyhow::Result;
use log::debug;
use std::io::Write;

/// Writes the status summary of a snapshot: every file with its status or
/// block size, the totals, then the recorded issues.
pub fn write_summary(writer: &mut dyn Write, snapshot: &Snapshot) -> Result<()> {
    let stats = &snapshot.stats;
    debug!("Writing summary for {} files...", stats.total_files);
    write!(writer, "\n{}\n", constants::SUMMARY_SEPARATOR)?;
    writeln!(
        writer,
        "{}: ({})",
        constants::SUMMARY_HEADER_PREFIX,
        stats.total_files
    )?;

    let mut files = snapshot.tree.files();
    files.sort_by(|a, b| a.full_path.cmp(&b.full_path));
    for node in files {
        match snapshot.assembly.index.get(&node.full_path) {
            Some(span) => writeln!(
                writer,
                "- {} (L:{} C:{})",
                node.full_path,
                span.line_count(),
                span.char_count()
            )?,
            None => match node.status() {
                Some(status) => writeln!(writer, "- {} ({})", node.full_path, status)?,
                None => writeln!(writer, "- {}", node.full_path)?,
            },
        }
    }

    writeln!(
        writer,
        "Text: {}, Binary: {}, Failed: {}, Lines: {}, Chars: {}",
        stats.text_files, stats.binary_files, stats.failed_files, stats.lines, stats.chars
    )?;
    if !stats.issues.is_empty() {
        writeln!(writer, "Issues: ({})", stats.issues.len())?;
        for issue in &stats.issues {
            writeln!(writer, "- {}", issue)?;
        }
    }
    Ok(())
}
