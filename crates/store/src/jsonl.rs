use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Write one record per line. The parent directory must already exist;
/// builds write into a staging directory created by [`crate::Staging`].
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    log::debug!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read every non-blank line as one record. A line that fails to parse is a
/// hard error carrying its line number; a truncated artifact should never
/// load as a silently shorter one.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(StoreError::Missing(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| {
            StoreError::MalformedRecord {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            }
        })?;
        records.push(record);
    }
    Ok(records)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(StoreError::Missing(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        score: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a".into(),
                score: 1,
            },
            Row {
                id: "b".into(),
                score: 2,
            },
        ]
    }

    #[test]
    fn jsonl_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        write_jsonl(&path, &rows()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);

        let loaded: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(loaded, rows());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"id\":\"a\",\"score\":1}\n\n  \n").unwrap();
        let loaded: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn malformed_line_reports_its_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"id\":\"a\",\"score\":1}\nnot json\n").unwrap();
        let err = read_jsonl::<Row>(&path).unwrap_err();
        match err {
            StoreError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_artifact_is_its_own_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_jsonl::<Row>(&dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }

    #[test]
    fn json_documents_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        write_json(&path, &rows()[0]).unwrap();
        let loaded: Row = read_json(&path).unwrap();
        assert_eq!(loaded, rows()[0]);
    }
}
