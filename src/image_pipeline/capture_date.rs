//! Capture timestamp extraction from corpus file names.
//!
//! Files are named `YYYY-MM-DD-HHMM<suffix>.<ext>`, e.g.
//! `2025-08-01-0021_band-13.png`. The timestamp is the segment before the
//! first `_`. Names that do not parse carry no date and are never filtered.

use std::path::Path;

use chrono::NaiveDateTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M";
const SEGMENT_DELIMITER: char = '_';

pub fn capture_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let token = file_name.split(SEGMENT_DELIMITER).next()?;
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).ok()
}

/// Same as [`capture_timestamp`], applied to the base name of `path`.
pub fn capture_timestamp_of(path: &Path) -> Option<NaiveDateTime> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(capture_timestamp)
}
