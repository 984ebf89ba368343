//! The record-stream interface the single-sample driver (C8) consumes.
//! Alignment-file decoding itself is out of scope for the core; this
//! module defines the boundary and a simple in-memory stream used by
//! tests. See `htslib_stream` for the concrete BAM-backed adapter.

use crate::errors::Result;

/// One primary-alignment record. Secondary/supplementary alignments are
/// filtered out upstream, before records reach the core.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub name: String,
    pub bases: Vec<u8>,
    pub quals: Vec<u8>,
    pub flag: u16,
    pub mapq: u8,
    /// -1 if unaligned.
    pub contig_id: i64,
    pub pos: i64,
    pub mate_contig_id: i64,
    pub mate_pos: i64,
}

impl ReadRecord {
    pub fn read_length(&self) -> usize {
        self.bases.len()
    }
}

/// Produces, until exhausted, one record per primary alignment.
pub trait RecordStream {
    fn next_record(&mut self) -> Result<Option<ReadRecord>>;
}

/// An in-memory stream over a fixed vector of records, used by tests and
/// by any caller that has already materialized records in memory.
pub struct VecRecordStream {
    records: std::vec::IntoIter<ReadRecord>,
}

impl VecRecordStream {
    pub fn new(records: Vec<ReadRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordStream for VecRecordStream {
    fn next_record(&mut self) -> Result<Option<ReadRecord>> {
        Ok(self.records.next())
    }
}
