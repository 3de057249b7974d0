//! Loading a document into a single normalized text buffer.
//!
//! Every line of the loaded document ends with exactly one `\n`: a trailing `\r` is
//! stripped from each line and a terminator is appended to the last line if the source
//! lacked one. No parsing happens here.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use memchr::{memchr, memchr_iter};
use tracing::{debug, enabled, Level};

use crate::error::*;

/// Reads the file at `path` into a normalized buffer.
pub(crate) fn read_path(path: &Path) -> Result<String> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|err| Error::io(label.as_str(), err))?;
    read_normalized(file, &label)
}

/// Reads `reader` to the end into a normalized buffer. `label` is only used in errors.
pub(crate) fn read_normalized<R: Read>(mut reader: R, label: &str) -> Result<String> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).map_err(|err| Error::io(label, err))?;
    let n_raw = raw.len();
    let text = into_text(normalize_line_endings(raw)).map_err(|err| Error::io(label, err))?;
    if enabled!(Level::DEBUG) {
        let lines = bytecount::count(text.as_bytes(), b'\n');
        debug!(label, raw_bytes = n_raw, bytes = text.len(), lines, "loaded source");
    }
    Ok(text)
}

/// Normalizes line endings of `raw` to `\n`, guaranteeing a terminator on the last line.
///
/// Only a `\r` immediately before a `\n` (or at the very end of the input) is removed;
/// carriage returns elsewhere are kept. An empty input stays empty. When the input holds
/// no `\r` at all the buffer is reused rather than rebuilt.
pub fn normalize_line_endings(mut raw: Vec<u8>) -> Vec<u8> {
    if raw.is_empty() {
        return raw;
    }
    if memchr(b'\r', &raw).is_none() {
        if raw.last() != Some(&b'\n') {
            raw.push(b'\n');
        }
        return raw;
    }

    let mut out = Vec::with_capacity(raw.len() + 1);
    let mut start = 0;
    for end in memchr_iter(b'\n', &raw) {
        push_line(&mut out, &raw[start..end]);
        start = end + 1;
    }
    if start < raw.len() {
        push_line(&mut out, &raw[start..]);
    }
    out
}

fn push_line(out: &mut Vec<u8>, line: &[u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    out.extend_from_slice(line);
    out.push(b'\n');
}

fn into_text(bytes: Vec<u8>) -> io::Result<String> {
    match simdutf8::compat::from_utf8(&bytes) {
        // SAFETY: the whole buffer was just validated as UTF-8.
        Ok(_) => Ok(unsafe { String::from_utf8_unchecked(bytes) }),
        Err(err) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid UTF-8 at byte {}", err.valid_up_to()),
        )),
    }
}
