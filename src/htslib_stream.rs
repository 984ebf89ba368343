//! C13: the concrete BAM/CRAM-backed `RecordStream` implementation. This
//! is the "opaque collaborator" of spec.md §1 made concrete — alignment
//! decoding itself is not part of the core's tested surface, but the CLI
//! needs a real adapter to drive it.

use crate::contig::ReferenceContigInfo;
use crate::errors::{Result, StrProfileError};
use crate::record_stream::{ReadRecord, RecordStream};
use rust_htslib::bam::{self, Read};
use rust_htslib::faidx;
use std::path::Path;

/// Builds a contig table straight from a FASTA's `.fai` index, the way
/// the merge workflow does it (it has no alignment-file header to draw
/// on, only the reference used to build every sample's profile).
pub fn load_reference_contig_info(reference_path: &Path) -> Result<ReferenceContigInfo> {
    let reader = faidx::Reader::from_path(reference_path).map_err(|e| {
        StrProfileError::Io(format!(
            "unable to load FASTA index for {}: {e}",
            reference_path.display()
        ))
    })?;
    let n_seqs = reader.n_seqs();
    let mut names_and_sizes = Vec::with_capacity(n_seqs as usize);
    for index in 0..n_seqs {
        let name = reader.seq_name(index as i32).map_err(|e| {
            StrProfileError::Io(format!(
                "unable to read sequence name {index} from {}: {e}",
                reference_path.display()
            ))
        })?;
        let len = reader.fetch_seq_len(&name).max(0) as u64;
        names_and_sizes.push((name, len));
    }
    Ok(ReferenceContigInfo::new(names_and_sizes))
}

const FLAG_SECONDARY: u16 = 0x100;
const FLAG_SUPPLEMENTARY: u16 = 0x800;

/// Streams primary alignments out of a BAM/CRAM file, filtering out
/// secondary and supplementary records before they reach the core.
pub struct HtsRecordStream {
    reader: bam::Reader,
    record: bam::Record,
}

impl HtsRecordStream {
    pub fn open(reads_path: &Path, reference_path: &Path) -> Result<Self> {
        let mut reader = bam::Reader::from_path(reads_path).map_err(|e| {
            StrProfileError::Io(format!(
                "unable to open alignment file {}: {e}",
                reads_path.display()
            ))
        })?;
        reader.set_reference(reference_path).map_err(|e| {
            StrProfileError::Io(format!(
                "unable to set reference {} for {}: {e}",
                reference_path.display(),
                reads_path.display()
            ))
        })?;
        Ok(Self {
            reader,
            record: bam::Record::new(),
        })
    }

    /// Builds the contig table from the alignment file's header, which
    /// the BAM/CRAM spec requires to agree with the reference FASTA's
    /// `.fai` used to create it.
    pub fn contig_info(&self) -> ReferenceContigInfo {
        let header = self.reader.header();
        let names_and_sizes = (0..header.target_count())
            .map(|tid| {
                let name = String::from_utf8_lossy(header.tid2name(tid)).to_string();
                let len = header.target_len(tid).unwrap_or(0);
                (name, len)
            })
            .collect();
        ReferenceContigInfo::new(names_and_sizes)
    }
}

impl RecordStream for HtsRecordStream {
    fn next_record(&mut self) -> Result<Option<ReadRecord>> {
        loop {
            match self.reader.read(&mut self.record) {
                None => return Ok(None),
                Some(Err(e)) => {
                    return Err(StrProfileError::Io(format!(
                        "failed to read alignment record: {e}"
                    )))
                }
                Some(Ok(())) => {}
            }

            let flag = self.record.flags();
            if flag & FLAG_SECONDARY != 0 || flag & FLAG_SUPPLEMENTARY != 0 {
                continue;
            }

            let name = String::from_utf8_lossy(self.record.qname()).to_string();
            let bases = self.record.seq().as_bytes();
            let quals: Vec<u8> = self.record.qual().iter().map(|q| q + 33).collect();
            let contig_id = self.record.tid() as i64;
            let pos = self.record.pos();
            let mate_contig_id = self.record.mtid() as i64;
            let mate_pos = self.record.mpos();
            let mapq = self.record.mapq();

            return Ok(Some(ReadRecord {
                name,
                bases,
                quals,
                flag,
                mapq,
                contig_id,
                pos,
                mate_contig_id,
                mate_pos,
            }));
        }
    }
}
