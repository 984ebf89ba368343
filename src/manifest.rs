//! Multisample manifest: whitespace-separated `sample\tstatus\tpath`
//! lines, order-significant.

use crate::errors::{Result, StrProfileError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Case,
    Control,
}

#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub sample_id: String,
    pub status: SampleStatus,
    pub profile_path: PathBuf,
}

/// Parses the manifest, preserving entry order.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| StrProfileError::Io(format!("failed to open manifest {}: {e}", path.display())))?;

    let mut entries = Vec::new();
    for (line_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            StrProfileError::Format(format!("malformed manifest line {}: {e}", line_no + 1))
        })?;
        if record.len() < 3 {
            return Err(StrProfileError::Format(format!(
                "malformed manifest line {}: expected 3 columns, got {}",
                line_no + 1,
                record.len()
            )));
        }
        let sample_id = record.get(0).unwrap().to_string();
        let status_str = record.get(1).unwrap();
        let status = match status_str {
            "case" => SampleStatus::Case,
            "control" => SampleStatus::Control,
            other => {
                return Err(StrProfileError::Configuration(format!(
                    "invalid sample status '{other}' for sample {sample_id} on manifest line {}",
                    line_no + 1
                )))
            }
        };
        let profile_path = PathBuf::from(record.get(2).unwrap());
        entries.push(ManifestEntry {
            sample_id,
            status,
            profile_path,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_order_preserving_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sampleA\tcase\t/a.json").unwrap();
        writeln!(file, "sampleB\tcontrol\t/b.json").unwrap();
        let entries = read_manifest(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sample_id, "sampleA");
        assert_eq!(entries[0].status, SampleStatus::Case);
        assert_eq!(entries[1].status, SampleStatus::Control);
    }

    #[test]
    fn rejects_invalid_status() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sampleA\tunknown\t/a.json").unwrap();
        assert!(read_manifest(file.path()).is_err());
    }
}
