//! C10: configuration surface shared by the `profile` and `merge`
//! workflows. Validated once, before any stream is opened.

use crate::errors::{Result, StrProfileError};
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub reads_path: PathBuf,
    pub reference_path: PathBuf,
    pub output_prefix: PathBuf,
    pub min_motif_len: usize,
    pub max_motif_len: usize,
    pub min_anchor_mapq: u8,
    pub max_irr_mapq: u8,
    pub enable_pair_log: bool,
}

impl ProfileConfig {
    pub fn motif_size_range(&self) -> RangeInclusive<usize> {
        self.min_motif_len..=self.max_motif_len
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_motif_len < 1 {
            return Err(StrProfileError::Configuration(
                "min motif length must be at least 1".to_string(),
            ));
        }
        if self.min_motif_len > self.max_motif_len {
            return Err(StrProfileError::Configuration(format!(
                "min motif length ({}) must not exceed max motif length ({})",
                self.min_motif_len, self.max_motif_len
            )));
        }
        if !self.reads_path.exists() {
            return Err(StrProfileError::Configuration(format!(
                "reads path does not exist: {}",
                self.reads_path.display()
            )));
        }
        if !self.reference_path.exists() {
            return Err(StrProfileError::Configuration(format!(
                "reference path does not exist: {}",
                self.reference_path.display()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub manifest_path: PathBuf,
    pub reference_path: PathBuf,
    pub output_prefix: PathBuf,
    pub min_motif_len: usize,
    pub max_motif_len: usize,
}

impl MergeConfig {
    pub fn motif_size_range(&self) -> RangeInclusive<usize> {
        self.min_motif_len..=self.max_motif_len
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_motif_len < 1 || self.min_motif_len > self.max_motif_len {
            return Err(StrProfileError::Configuration(format!(
                "invalid motif size range [{}, {}]",
                self.min_motif_len, self.max_motif_len
            )));
        }
        if !self.manifest_path.exists() {
            return Err(StrProfileError::Configuration(format!(
                "manifest path does not exist: {}",
                self.manifest_path.display()
            )));
        }
        if !self.reference_path.exists() {
            return Err(StrProfileError::Configuration(format!(
                "reference path does not exist: {}",
                self.reference_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_motif_range() {
        let cfg = MergeConfig {
            manifest_path: PathBuf::from("/dev/null"),
            reference_path: PathBuf::from("/dev/null"),
            output_prefix: PathBuf::from("out"),
            min_motif_len: 20,
            max_motif_len: 2,
        };
        assert!(cfg.validate().is_err());
    }
}
