//! C6: region aggregator — countable regions on the genome, their merge
//! rule, and the text encoding used for profile-document keys and the
//! pair log.

use crate::contig::ReferenceContigInfo;
use crate::errors::{Result, StrProfileError};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sentinel contig id meaning "unaligned".
pub const UNALIGNED_CONTIG_ID: i64 = -1;

/// Regions on the same contig within this many bases are merged together.
pub const MAX_MERGE_DISTANCE: i64 = 500;

/// A combinable payload carried by a region. `CountFeature` for
/// single-sample anchor/IRR region lists, `SampleCountFeature` for the
/// cohort merge.
pub trait Feature: Clone {
    fn combine(&mut self, other: &Self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountFeature(pub i64);

impl Feature for CountFeature {
    fn combine(&mut self, other: &Self) {
        self.0 += other.0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleCountFeature(pub HashMap<String, i64>);

impl Feature for SampleCountFeature {
    fn combine(&mut self, other: &Self) {
        for (sample, count) in &other.0 {
            *self.0.entry(sample.clone()).or_insert(0) += count;
        }
    }
}

impl SampleCountFeature {
    pub fn single(sample_id: impl Into<String>, count: i64) -> Self {
        let mut map = HashMap::with_capacity(1);
        map.insert(sample_id.into(), count);
        Self(map)
    }
}

/// A region on the genome (half-open `[start, end)`) carrying a
/// combinable feature. `contig_id == -1` means "unaligned". Equality and
/// ordering are both keyed on `(contigId, start, end)` alone, ignoring
/// `feature`, so the two stay consistent with each other.
#[derive(Debug, Clone)]
pub struct Region<F: Feature> {
    pub contig_id: i64,
    pub start: i64,
    pub end: i64,
    pub feature: F,
}

impl<F: Feature> Region<F> {
    pub fn new(contig_id: i64, start: i64, end: i64, feature: F) -> Result<Self> {
        if contig_id < UNALIGNED_CONTIG_ID {
            return Err(StrProfileError::Logic(format!(
                "region contig id {contig_id} is invalid"
            )));
        }
        Ok(Self {
            contig_id,
            start,
            end,
            feature,
        })
    }

    /// 0 if overlapping or both unaligned, the gap between disjoint
    /// intervals on the same contig otherwise, +infinity across contigs.
    pub fn distance(&self, other: &Self) -> i64 {
        if self.contig_id != other.contig_id {
            return i64::MAX;
        }
        if self.contig_id == UNALIGNED_CONTIG_ID {
            return 0;
        }
        if self.end < other.start {
            return other.start - self.end;
        }
        if other.end < self.start {
            return self.start - other.end;
        }
        0
    }

    pub fn encode(&self, contig_info: &ReferenceContigInfo) -> Result<String> {
        if self.contig_id == UNALIGNED_CONTIG_ID {
            return Ok("unaligned".to_string());
        }
        let name = contig_info.contig_name(self.contig_id as usize)?;
        Ok(format!("{name}:{}-{}", self.start, self.end))
    }

    fn sort_key(&self) -> (i64, i64, i64) {
        (self.contig_id, self.start, self.end)
    }
}

pub fn create_countable_region(contig_id: i64, start: i64, end: i64) -> Result<Region<CountFeature>> {
    Region::new(contig_id, start, end, CountFeature(1))
}

/// Decodes a region encoding of the form `contig:start-end` or the
/// literal `unaligned`. Strict: exactly one `-` in the interval part,
/// non-empty contig and interval substrings.
pub fn decode(contig_info: &ReferenceContigInfo, encoding: &str) -> Result<(i64, i64, i64)> {
    if encoding == "unaligned" {
        return Ok((UNALIGNED_CONTIG_ID, 0, 0));
    }

    let colon_index = encoding.rfind(':').ok_or_else(|| {
        StrProfileError::Format(format!("unexpected range format: {encoding}"))
    })?;
    if colon_index == 0 || colon_index + 1 == encoding.len() {
        return Err(StrProfileError::Format(format!(
            "unexpected range format: {encoding}"
        )));
    }

    let contig = &encoding[..colon_index];
    let interval = &encoding[colon_index + 1..];

    let dash_count = interval.matches('-').count();
    if dash_count != 1 {
        return Err(StrProfileError::Format(format!(
            "unexpected range format: {encoding}"
        )));
    }
    let dash_index = interval.find('-').unwrap();
    if dash_index == 0 || dash_index + 1 == interval.len() {
        return Err(StrProfileError::Format(format!(
            "unexpected range format: {encoding}"
        )));
    }

    let contig_id = contig_info.contig_id(contig)?;
    let start: i64 = interval[..dash_index]
        .parse()
        .map_err(|_| StrProfileError::Format(format!("unexpected range format: {encoding}")))?;
    let end: i64 = interval[dash_index + 1..]
        .parse()
        .map_err(|_| StrProfileError::Format(format!("unexpected range format: {encoding}")))?;

    if start > end {
        return Err(StrProfileError::Format(format!(
            "unexpected range format: {encoding}"
        )));
    }

    Ok((contig_id as i64, start, end))
}

/// Sorts `regions` lexicographically by `(contigId, start, end)` then
/// sweeps left to right, merging neighbours within `max_merge_distance`.
/// Idempotent: running it twice is the same as running it once.
pub fn sort_and_merge<F: Feature>(regions: &mut Vec<Region<F>>, max_merge_distance: i64) {
    regions.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut merged: Vec<Region<F>> = Vec::with_capacity(regions.len());
    let mut open: Option<Region<F>> = None;

    for region in regions.drain(..) {
        match &mut open {
            None => open = Some(region),
            Some(current) => {
                if current.distance(&region) <= max_merge_distance {
                    current.end = current.end.max(region.end);
                    current.feature.combine(&region.feature);
                } else {
                    merged.push(open.take().unwrap());
                    open = Some(region);
                }
            }
        }
    }
    if let Some(last) = open {
        merged.push(last);
    }

    *regions = merged;
}

impl<F: Feature> PartialEq for Region<F> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl<F: Feature> Eq for Region<F> {}

impl<F: Feature> Ord for Region<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl<F: Feature> PartialOrd for Region<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceContigInfo {
        ReferenceContigInfo::new(vec![
            ("chr1".to_string(), 248_956_422),
            ("chr2".to_string(), 242_193_529),
        ])
    }

    #[test]
    fn distance_unaligned_is_zero_aligned_is_infinite() {
        let a = create_countable_region(-1, 0, 0).unwrap();
        let b = create_countable_region(-1, 0, 0).unwrap();
        assert_eq!(a.distance(&b), 0);

        let c = create_countable_region(0, 10, 20).unwrap();
        assert_eq!(a.distance(&c), i64::MAX);
    }

    #[test]
    fn merge_overlapping_and_nearby_regions() {
        let mut regions = vec![
            Region::new(1, 10, 20, CountFeature(5)).unwrap(),
            Region::new(1, 15, 25, CountFeature(3)).unwrap(),
            Region::new(1, 20, 35, CountFeature(2)).unwrap(),
        ];
        sort_and_merge(&mut regions, MAX_MERGE_DISTANCE);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].start, 10);
        assert_eq!(regions[0].end, 35);
        assert_eq!(regions[0].feature.0, 10);
    }

    #[test]
    fn merge_distinct_contigs_and_far_regions() {
        let mut regions = vec![
            Region::new(1, 200, 250, CountFeature(1)).unwrap(),
            Region::new(1, 500, 550, CountFeature(1)).unwrap(),
            Region::new(1, 0, 10, CountFeature(1)).unwrap(),
            Region::new(1, 1100, 1200, CountFeature(1)).unwrap(),
            Region::new(2, 1100, 1200, CountFeature(1)).unwrap(),
        ];
        sort_and_merge(&mut regions, MAX_MERGE_DISTANCE);
        assert_eq!(regions.len(), 3);
        assert_eq!((regions[0].contig_id, regions[0].start, regions[0].end, regions[0].feature.0), (1, 0, 550, 3));
        assert_eq!((regions[1].contig_id, regions[1].start, regions[1].end, regions[1].feature.0), (1, 1100, 1200, 1));
        assert_eq!((regions[2].contig_id, regions[2].start, regions[2].end, regions[2].feature.0), (2, 1100, 1200, 1));
    }

    #[test]
    fn sort_and_merge_is_idempotent() {
        let mut regions = vec![
            Region::new(1, 10, 20, CountFeature(5)).unwrap(),
            Region::new(1, 15, 25, CountFeature(3)).unwrap(),
        ];
        sort_and_merge(&mut regions, MAX_MERGE_DISTANCE);
        let once = regions.clone();
        sort_and_merge(&mut regions, MAX_MERGE_DISTANCE);
        assert_eq!(once, regions);
    }

    #[test]
    fn decode_examples() {
        let t = table();
        assert_eq!(decode(&t, "chr1:1-100").unwrap(), (0, 1, 100));
        assert_eq!(decode(&t, "unaligned").unwrap(), (-1, 0, 0));
    }

    #[test]
    fn decode_tolerates_colon_in_contig_name() {
        let t = ReferenceContigInfo::new(vec![(
            "HLA-DQA1*05:11".to_string(),
            6192,
        )]);
        assert_eq!(
            decode(&t, "HLA-DQA1*05:11:6177-6177").unwrap(),
            (0, 6177, 6177)
        );
    }

    #[test]
    fn decode_rejects_malformed_encodings() {
        let t = table();
        assert!(decode(&t, "chr1-100-200").is_err());
        assert!(decode(&t, "chr1:100").is_err());
        assert!(decode(&t, "chr1:100-200-300").is_err());
    }

    #[test]
    fn encode_round_trips_with_decode() {
        let t = table();
        let region = create_countable_region(0, 1, 100).unwrap();
        let encoded = region.encode(&t).unwrap();
        assert_eq!(encoded, "chr1:1-100");
        assert_eq!(decode(&t, &encoded).unwrap(), (0, 1, 100));
    }
}
