//! Reference-contig name <-> id lookup, tolerant of a "chr" prefix
//! mismatch between the catalog and the alignment header.

use crate::errors::{Result, StrProfileError};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ReferenceContigInfo {
    names_and_sizes: Vec<(String, u64)>,
    name_to_index: HashMap<String, usize>,
}

/// Strips a leading "chr" if present, otherwise adds one. Mirrors the
/// upstream convention so that "chr1" and "1" resolve to the same contig.
fn alternative_contig_name(name: &str) -> String {
    if let Some(stripped) = name.strip_prefix("chr") {
        stripped.to_string()
    } else {
        format!("chr{name}")
    }
}

impl ReferenceContigInfo {
    pub fn new(names_and_sizes: Vec<(String, u64)>) -> Self {
        let mut name_to_index = HashMap::with_capacity(names_and_sizes.len() * 2);
        for (index, (name, _)) in names_and_sizes.iter().enumerate() {
            name_to_index.entry(name.clone()).or_insert(index);
            let alt = alternative_contig_name(name);
            name_to_index.entry(alt).or_insert(index);
        }
        Self {
            names_and_sizes,
            name_to_index,
        }
    }

    pub fn num_contigs(&self) -> usize {
        self.names_and_sizes.len()
    }

    pub fn contig_name(&self, contig_id: usize) -> Result<&str> {
        self.names_and_sizes
            .get(contig_id)
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| StrProfileError::Logic(format!("invalid contig index {contig_id}")))
    }

    pub fn contig_size(&self, contig_id: usize) -> Result<u64> {
        self.names_and_sizes
            .get(contig_id)
            .map(|(_, size)| *size)
            .ok_or_else(|| StrProfileError::Logic(format!("invalid contig index {contig_id}")))
    }

    pub fn contig_id(&self, name: &str) -> Result<usize> {
        self.name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| StrProfileError::Format(format!("invalid contig name {name}")))
    }
}
