//! C7: sample-run stats — mean read length and median per-contig depth
//! over the sweep.

use crate::contig::ReferenceContigInfo;
use crate::errors::{Result, StrProfileError};
use crate::region::UNALIGNED_CONTIG_ID;
use std::collections::HashMap;

/// Default set of contig ids considered for the per-contig depth
/// estimate (the human autosomes in standard BAM header order,
/// 0-indexed). Configurable per spec.md §9's design note rather than a
/// hard-coded cutoff.
pub fn default_depth_contig_ids() -> Vec<i64> {
    (0..=22).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRunStats {
    pub mean_read_length: i64,
    pub depth: f64,
}

pub struct SampleRunStatsCalculator {
    contig_info: ReferenceContigInfo,
    depth_contig_ids: Vec<i64>,
    total_read_count: u64,
    sum_of_read_lengths: u64,
    contig_id_to_read_count: HashMap<i64, u64>,
}

impl SampleRunStatsCalculator {
    pub fn new(contig_info: ReferenceContigInfo) -> Self {
        Self::with_depth_contigs(contig_info, default_depth_contig_ids())
    }

    pub fn with_depth_contigs(contig_info: ReferenceContigInfo, depth_contig_ids: Vec<i64>) -> Self {
        Self {
            contig_info,
            depth_contig_ids,
            total_read_count: 0,
            sum_of_read_lengths: 0,
            contig_id_to_read_count: HashMap::new(),
        }
    }

    pub fn inspect(&mut self, contig_id: i64, read_length: usize) {
        self.total_read_count += 1;
        self.sum_of_read_lengths += read_length as u64;
        if self.depth_contig_ids.contains(&contig_id) || contig_id == UNALIGNED_CONTIG_ID {
            *self.contig_id_to_read_count.entry(contig_id).or_insert(0) += 1;
        }
    }

    /// Fails if no reads were inspected.
    pub fn estimate(&self) -> Result<SampleRunStats> {
        if self.total_read_count == 0 {
            return Err(StrProfileError::EmptyStream(
                "cannot estimate sample-run stats with zero reads inspected".to_string(),
            ));
        }

        let mean_read_length =
            (self.sum_of_read_lengths / self.total_read_count) as i64;

        let mut per_contig_depths: Vec<f64> = Vec::new();
        for (&contig_id, &read_count) in &self.contig_id_to_read_count {
            if contig_id == UNALIGNED_CONTIG_ID {
                continue;
            }
            let contig_length = self.contig_info.contig_size(contig_id as usize)?;
            let depth = (read_count as f64 * mean_read_length as f64) / contig_length as f64;
            per_contig_depths.push(depth);
        }

        let depth = median(per_contig_depths)?;

        Ok(SampleRunStats {
            mean_read_length,
            depth,
        })
    }
}

fn median(mut values: Vec<f64>) -> Result<f64> {
    if values.is_empty() {
        return Err(StrProfileError::Logic(
            "median of an empty array is undefined".to_string(),
        ));
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 0 {
        Ok((values[n / 2 - 1] + values[n / 2]) / 2.0)
    } else {
        Ok(values[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contigs() -> ReferenceContigInfo {
        ReferenceContigInfo::new(vec![
            ("chr1".to_string(), 1000),
            ("chr2".to_string(), 2000),
        ])
    }

    #[test]
    fn estimate_fails_on_empty_stream() {
        let calc = SampleRunStatsCalculator::new(contigs());
        assert!(calc.estimate().is_err());
    }

    #[test]
    fn mean_read_length_and_depth_are_computed() {
        let mut calc = SampleRunStatsCalculator::new(contigs());
        for _ in 0..100 {
            calc.inspect(0, 100);
        }
        for _ in 0..200 {
            calc.inspect(1, 100);
        }
        let stats = calc.estimate().unwrap();
        assert_eq!(stats.mean_read_length, 100);
        // contig0 depth = 100*100/1000 = 10; contig1 depth = 200*100/2000 = 10
        assert!((stats.depth - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unaligned_reads_are_counted_but_excluded_from_estimate() {
        let mut calc = SampleRunStatsCalculator::new(contigs());
        for _ in 0..50 {
            calc.inspect(0, 100);
        }
        for _ in 0..1000 {
            calc.inspect(-1, 100);
        }
        let stats = calc.estimate().unwrap();
        assert!((stats.depth - 5.0).abs() < 1e-9);
    }

    #[test]
    fn median_of_empty_set_is_an_error() {
        assert!(median(vec![]).is_err());
    }
}
