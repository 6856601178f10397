//! Hash list import and export
//!
//! Reads and writes the `<hex-digest>  <path>` line format produced by tools
//! such as `sha512sum`. Imported digests are trusted as-is; size, mtime and
//! kind are probed from the live object.

use crate::error::StorageError;
use crate::store::{EntryStore, TrackedEntry};
use crate::tree::path::{absolutize, normalize_lexically, to_relative_key};
use crate::tree::{ScannedEntry, WalkerConfig};
use crate::types::Digest;
use encoding_rs::{DecoderResult, Encoding};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One parsed line of a hash list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashListEntry {
    /// 1-based line number in the source file
    pub line: usize,
    pub digest: Digest,
    /// Absolute path, resolved against the list's directory
    pub path: PathBuf,
}

/// A hash list line that was parsed but not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSkip {
    pub line: usize,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<PathBuf>,
    pub skipped: Vec<ImportSkip>,
}

/// Decode and parse a hash list.
///
/// `encoding_label` is a WHATWG encoding label such as `utf-8` or `latin1`.
/// Relative paths in the list are resolved against `base_dir`.
pub fn parse_hash_list(
    bytes: &[u8],
    encoding_label: &str,
    source: &Path,
    base_dir: &Path,
) -> Result<Vec<HashListEntry>, StorageError> {
    let decode_error = |line: usize, reason: String| StorageError::ImportDecode {
        file: source.to_path_buf(),
        line,
        reason,
    };

    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| decode_error(0, format!("unknown text encoding '{}'", encoding_label)))?;
    let text = decode_text(encoding, bytes).map_err(|bad_line| {
        decode_error(bad_line, format!("not valid {} text", encoding.name()))
    })?;

    let mut entries = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let raw_line = raw_line.trim_end_matches('\r');
        if raw_line.trim().is_empty() {
            continue;
        }

        // Text mode separates with two spaces, binary mode with a space and an asterisk
        let hex_len = raw_line.bytes().take_while(u8::is_ascii_hexdigit).count();
        let (hex, rest) = raw_line.split_at(hex_len);
        let name = rest
            .strip_prefix("  ")
            .or_else(|| rest.strip_prefix(" *"))
            .ok_or_else(|| decode_error(line, "expected '<digest>  <path>'".to_string()))?;
        let digest = Digest::from_hex(hex)
            .map_err(|e| decode_error(line, format!("invalid digest: {}", e)))?;
        if name.is_empty() {
            return Err(decode_error(line, "empty path".to_string()));
        }

        entries.push(HashListEntry {
            line,
            digest,
            path: normalize_lexically(&base_dir.join(name)),
        });
    }
    Ok(entries)
}

/// Decode `bytes` without replacement characters.
///
/// On malformed input, returns the 1-based line holding the first bad sequence.
fn decode_text(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, usize> {
    let mut decoder = encoding.new_decoder();
    let mut text = String::with_capacity(bytes.len());
    let mut remaining = bytes;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(remaining, &mut text, true);
        remaining = &remaining[read..];
        match result {
            DecoderResult::InputEmpty => return Ok(text),
            DecoderResult::OutputFull => text.reserve(remaining.len().max(16) * 3),
            DecoderResult::Malformed(_, _) => return Err(text.matches('\n').count() + 1),
        }
    }
}

/// Create or overwrite store entries from parsed hash list lines.
///
/// Lines naming paths outside `root`, the database itself, or objects that
/// are not a regular file or symlink are skipped, not imported.
pub fn import_entries(
    store: &mut EntryStore,
    root: &Path,
    walker_config: &WalkerConfig,
    entries: Vec<HashListEntry>,
) -> Result<ImportReport, StorageError> {
    let mut report = ImportReport::default();

    for entry in entries {
        let path = absolutize(&entry.path)?;
        let skip = |reason: &str| ImportSkip {
            line: entry.line,
            path: path.clone(),
            reason: reason.to_string(),
        };

        if !path.starts_with(root) || path == root {
            report.skipped.push(skip("outside the database root"));
            continue;
        }
        let is_sidecar = path.parent() == Some(root)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| walker_config.is_database_artifact(name));
        if is_sidecar {
            report.skipped.push(skip("is the database file"));
            continue;
        }

        match ScannedEntry::probe(&path) {
            Ok(Some(scanned)) => {
                store.put(TrackedEntry::from_scan(scanned, entry.digest))?;
                report.imported.push(path);
            }
            Ok(None) => report
                .skipped
                .push(skip("not a regular file or symlink")),
            Err(error) if error.is_vanished() => report.skipped.push(skip("does not exist")),
            Err(StorageError::EntryRead { source, .. }) => {
                report.skipped.push(skip(&source.to_string()))
            }
            Err(other) => return Err(other),
        }
    }

    debug!(
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "Import complete"
    );
    Ok(report)
}

/// Render the store as hash list text, one line per entry, sorted by path.
pub fn export_hash_list(store: &EntryStore, root: &Path) -> Result<String, StorageError> {
    let mut out = String::new();
    for entry in store.values() {
        let key = to_relative_key(root, &entry.path)?;
        out.push_str(entry.digest.as_str());
        out.push_str("  ");
        out.push_str(&key);
        out.push('\n');
    }
    Ok(out)
}
