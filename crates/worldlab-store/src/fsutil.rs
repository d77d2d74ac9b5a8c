//! File helpers shared by the stores: JSON-lines splitting, single-writer
//! appends with torn-tail recovery, and atomic whole-file replacement.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Read a whole file, treating a missing file as `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Split file contents into newline-terminated lines and the unterminated
/// remainder.
///
/// The remainder is whatever follows the last `\n`; a concurrent reader may
/// see it half-written, so callers never treat it as a record.
pub(crate) fn split_lines(contents: &str) -> (Vec<&str>, &str) {
    let (body, tail) = match contents.rfind('\n') {
        Some(pos) => contents.split_at(pos.saturating_add(1)),
        None => ("", contents),
    };
    (body.lines().collect(), tail)
}

/// Append one JSON line to `path`, creating the file and its parent
/// directories as needed.
///
/// Assumes a single writer per file. If a previous writer crashed mid-line,
/// the torn tail is truncated first so the new record does not get glued onto
/// it. The line is written with a single `write_all` and flushed to disk
/// before returning.
pub(crate) fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    append_checked(path, line, |_| true)
}

/// Like [`append_line`], but also truncates a terminated last line that
/// `is_record` rejects.
///
/// Readers drop such a line only while it is last; once another record
/// follows it, it would be corruption in the middle of the file.
pub(crate) fn append_checked(
    path: &Path,
    line: &str,
    is_record: impl Fn(&str) -> bool,
) -> Result<(), StoreError> {
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;

    discard_torn_tail(&mut file, path)?;
    discard_rejected_last_line(&mut file, path, &is_record)?;

    let mut record = String::with_capacity(line.len().saturating_add(1));
    record.push_str(line);
    record.push('\n');
    file.write_all(record.as_bytes())
        .map_err(|e| StoreError::io(path, e))?;
    file.sync_data().map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

/// Replace `path` with `bytes` atomically (temp file, fsync, rename).
///
/// Readers observe either the old contents or the new ones, never a mix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    ensure_parent(path)?;

    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(bytes).map_err(|e| StoreError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard_torn_tail(file: &mut File, path: &Path) -> Result<(), StoreError> {
    let len = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0_u8; 1];
    file.seek(SeekFrom::End(-1))
        .map_err(|e| StoreError::io(path, e))?;
    file.read_exact(&mut last)
        .map_err(|e| StoreError::io(path, e))?;
    if last == [b'\n'] {
        return Ok(());
    }

    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))
        .map_err(|e| StoreError::io(path, e))?;
    file.read_to_end(&mut contents)
        .map_err(|e| StoreError::io(path, e))?;

    let keep = contents
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos.saturating_add(1));
    let keep = u64::try_from(keep).unwrap_or(len);
    file.set_len(keep).map_err(|e| StoreError::io(path, e))?;

    tracing::warn!(
        path = %path.display(),
        discarded_bytes = len.saturating_sub(keep),
        "Discarded torn trailing record before append"
    );
    Ok(())
}

/// Bytes read per step when scanning backwards for the last line.
const SCAN_CHUNK: u64 = 4096;

fn discard_rejected_last_line(
    file: &mut File,
    path: &Path,
    is_record: &impl Fn(&str) -> bool,
) -> Result<(), StoreError> {
    let Some((start, last)) = last_nonblank_line(file, path)? else {
        return Ok(());
    };
    if is_record(last.trim()) {
        return Ok(());
    }

    let len = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
    file.set_len(start).map_err(|e| StoreError::io(path, e))?;
    tracing::warn!(
        path = %path.display(),
        discarded_bytes = len.saturating_sub(start),
        "Discarded unreadable trailing record before append"
    );
    Ok(())
}

/// Byte offset and text of the last non-blank line, reading backwards from
/// the end so the cost does not grow with the file.
fn last_nonblank_line(file: &mut File, path: &Path) -> Result<Option<(u64, String)>, StoreError> {
    let mut pos = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
    let mut suffix: Vec<u8> = Vec::new();

    loop {
        let content_end = suffix.iter().rposition(|b| !b.is_ascii_whitespace());
        if let Some(end) = content_end {
            let head = suffix.get(..end).unwrap_or_default();
            if let Some(nl) = head.iter().rposition(|&b| b == b'\n') {
                let line_start = nl.saturating_add(1);
                let text = suffix.get(line_start..).unwrap_or_default();
                let offset = u64::try_from(line_start).unwrap_or(u64::MAX);
                return Ok(Some((
                    pos.saturating_add(offset),
                    String::from_utf8_lossy(text).into_owned(),
                )));
            }
        }
        if pos == 0 {
            return Ok(content_end.map(|_| (0, String::from_utf8_lossy(&suffix).into_owned())));
        }

        let step = pos.min(SCAN_CHUNK);
        pos = pos.saturating_sub(step);
        let mut chunk = vec![0_u8; usize::try_from(step).unwrap_or(0)];
        file.seek(SeekFrom::Start(pos))
            .map_err(|e| StoreError::io(path, e))?;
        file.read_exact(&mut chunk)
            .map_err(|e| StoreError::io(path, e))?;
        chunk.extend_from_slice(&suffix);
        suffix = chunk;
    }
}
