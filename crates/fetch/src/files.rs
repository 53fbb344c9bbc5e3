//! Reading and writing content records as ad-hoc JSON files.
//!
//! The secondary CLI subcommands pass content between invocations as JSON
//! files. A plain-text file is accepted on read and wrapped into a record.

use std::path::Path;

use tracing::debug;

use contentiq_shared::{ContentIqError, ContentRecord, Result};

/// Read a content record from `path`.
///
/// JSON files must deserialize to a [`ContentRecord`]. Anything else is
/// treated as plain text and wrapped into a record whose URL is a `file://`
/// reference and whose title is the file stem.
pub fn read_record(path: &Path) -> Result<ContentRecord> {
    let raw = std::fs::read_to_string(path).map_err(|e| ContentIqError::io(path, e))?;

    if let Ok(record) = serde_json::from_str::<ContentRecord>(&raw) {
        debug!(?path, "loaded content record from JSON");
        return Ok(record);
    }

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    debug!(?path, "treating file as plain text content");
    Ok(ContentRecord::new(
        format!("file://{}", path.display()),
        title,
        raw,
    ))
}

/// Write a content record to `path` as pretty-printed JSON.
pub fn write_record(record: &ContentRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| ContentIqError::parse(format!("serialize record: {e}")))?;
    std::fs::write(path, json).map_err(|e| ContentIqError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_record_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("record.json");

        let record = ContentRecord::new("https://example.com", "Example", "body text");
        write_record(&record, &path).expect("write");

        let loaded = read_record(&path).expect("read");
        assert_eq!(loaded.url, "https://example.com");
        assert_eq!(loaded.body, "body text");
    }

    #[test]
    fn plain_text_becomes_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "raw notes about things").expect("write");

        let record = read_record(&path).expect("read");
        assert_eq!(record.title, "notes");
        assert!(record.url.starts_with("file://"));
        assert_eq!(record.word_count, 4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_record(Path::new("/nonexistent/record.json")).unwrap_err();
        assert!(matches!(err, ContentIqError::Io { .. }));
    }
}
