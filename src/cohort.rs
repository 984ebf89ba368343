//! C9: multisample merger — unions anchored regions per motif across many
//! single-sample profiles, carrying per-sample counts as a labeled
//! multiset, plus per-sample read-length/depth parameters.

use crate::contig::ReferenceContigInfo;
use crate::errors::{Result, StrProfileError};
use crate::manifest::ManifestEntry;
use crate::region::{decode, sort_and_merge, Region, SampleCountFeature, MAX_MERGE_DISTANCE};
use crate::sample_profile::ProfileDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;

/// Normalize every 50 samples loaded, to bound memory, per the cohort
/// merge's periodic-compression policy.
const NORMALIZATION_STRIDE: usize = 50;

#[derive(Debug, Default)]
pub struct CohortBuilder {
    anchored_irr_profile: BTreeMap<String, Vec<Region<SampleCountFeature>>>,
    paired_irr_profile: BTreeMap<String, BTreeMap<String, i64>>,
    read_lengths: BTreeMap<String, i64>,
    depths: BTreeMap<String, f64>,
}

impl CohortBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every sample in manifest order, normalizing every 50 samples
    /// and once more at the end.
    pub fn load_manifest(
        &mut self,
        entries: &[ManifestEntry],
        contig_info: &ReferenceContigInfo,
        motif_size_range: RangeInclusive<usize>,
    ) -> Result<()> {
        for (index, entry) in entries.iter().enumerate() {
            self.load_sample(&entry.sample_id, &entry.profile_path, contig_info, motif_size_range.clone())?;

            if (index + 1) % NORMALIZATION_STRIDE == 0 {
                self.normalize();
            }
        }
        self.normalize();
        Ok(())
    }

    fn load_sample(
        &mut self,
        sample_id: &str,
        profile_path: &Path,
        contig_info: &ReferenceContigInfo,
        motif_size_range: RangeInclusive<usize>,
    ) -> Result<()> {
        let file = File::open(profile_path).map_err(|e| {
            StrProfileError::Io(format!("unable to read {}: {e}", profile_path.display()))
        })?;
        let document: ProfileDocument = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            StrProfileError::Format(format!(
                "malformed profile JSON in {}: {e}",
                profile_path.display()
            ))
        })?;

        if document.read_length == 0 {
            return Err(StrProfileError::Format(format!(
                "read length appears to be unset for {sample_id}"
            )));
        }
        if document.depth < 0.0 {
            return Err(StrProfileError::Format(format!(
                "depth appears to be unset for {sample_id}"
            )));
        }

        for (motif, record) in &document.motifs {
            if !motif_size_range.contains(&motif.len()) {
                continue;
            }

            for (encoding, count) in &record.regions_with_irr_anchors {
                let (contig_id, start, end) = decode(contig_info, encoding)?;
                let region = Region::new(
                    contig_id,
                    start,
                    end,
                    SampleCountFeature::single(sample_id, *count),
                )?;
                self.anchored_irr_profile
                    .entry(motif.clone())
                    .or_default()
                    .push(region);
            }

            if record.irr_pair_count > 0 {
                self.paired_irr_profile
                    .entry(motif.clone())
                    .or_default()
                    .insert(sample_id.to_string(), record.irr_pair_count);
            }
        }

        self.read_lengths
            .insert(sample_id.to_string(), document.read_length);
        self.depths.insert(sample_id.to_string(), document.depth);

        Ok(())
    }

    fn normalize(&mut self) {
        for regions in self.anchored_irr_profile.values_mut() {
            sort_and_merge(regions, MAX_MERGE_DISTANCE);
        }
    }

    pub fn build(self, contig_info: &ReferenceContigInfo) -> Result<MultisampleProfile> {
        let mut counts = BTreeMap::new();

        for (motif, sample_counts) in &self.paired_irr_profile {
            counts
                .entry(motif.clone())
                .or_insert_with(MotifCounts::default)
                .irr_pair_counts = sample_counts.clone();
        }

        for (motif, regions) in &self.anchored_irr_profile {
            let mut regions_with_irr_anchors = BTreeMap::new();
            for region in regions {
                let encoding = region.encode(contig_info)?;
                regions_with_irr_anchors
                    .insert(encoding, region.feature.0.clone().into_iter().collect());
            }
            counts
                .entry(motif.clone())
                .or_insert_with(MotifCounts::default)
                .regions_with_irr_anchors = regions_with_irr_anchors;
        }

        Ok(MultisampleProfile {
            counts,
            parameters: Parameters {
                read_lengths: self.read_lengths,
                depths: self.depths,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MotifCounts {
    #[serde(
        rename = "IrrPairCounts",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub irr_pair_counts: BTreeMap<String, i64>,
    #[serde(
        rename = "RegionsWithIrrAnchors",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub regions_with_irr_anchors: BTreeMap<String, BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Parameters {
    #[serde(rename = "ReadLengths")]
    pub read_lengths: BTreeMap<String, i64>,
    #[serde(rename = "Depths")]
    pub depths: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisampleProfile {
    #[serde(rename = "Counts")]
    pub counts: BTreeMap<String, MotifCounts>,
    #[serde(rename = "Parameters")]
    pub parameters: Parameters,
}

pub fn write_multisample_profile(path: &Path, profile: &MultisampleProfile) -> Result<()> {
    crate::utils::write_atomically(path, |writer| {
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut *writer,
            serde_json::ser::PrettyFormatter::with_indent(b"    "),
        );
        use serde::Serialize as _;
        profile
            .serialize(&mut serializer)
            .map_err(|e| StrProfileError::Io(format!("failed to serialize multisample profile JSON: {e}")))?;
        use std::io::Write as _;
        writeln!(writer)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SampleStatus;
    use crate::sample_profile::MotifRecord;

    fn contigs() -> ReferenceContigInfo {
        ReferenceContigInfo::new(vec![("chr1".to_string(), 1_000_000)])
    }

    fn write_sample_profile(dir: &Path, name: &str, doc: &ProfileDocument) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        serde_json::to_writer(file, doc).unwrap();
        path
    }

    #[test]
    fn merges_two_samples_carrying_per_sample_counts() {
        let dir = tempfile::tempdir().unwrap();

        let mut motifs_a = BTreeMap::new();
        let mut regions_a = BTreeMap::new();
        regions_a.insert("chr1:100-200".to_string(), 3);
        motifs_a.insert(
            "CCG".to_string(),
            MotifRecord {
                repeat_unit: "CCG".to_string(),
                anchored_irr_count: 3,
                irr_pair_count: 1,
                regions_with_irr_anchors: regions_a,
            },
        );
        let doc_a = ProfileDocument {
            read_length: 150,
            depth: 30.0,
            motifs: motifs_a,
        };
        let path_a = write_sample_profile(dir.path(), "a.json", &doc_a);

        let mut motifs_b = BTreeMap::new();
        let mut regions_b = BTreeMap::new();
        regions_b.insert("chr1:150-250".to_string(), 2);
        motifs_b.insert(
            "CCG".to_string(),
            MotifRecord {
                repeat_unit: "CCG".to_string(),
                anchored_irr_count: 2,
                irr_pair_count: 0,
                regions_with_irr_anchors: regions_b,
            },
        );
        let doc_b = ProfileDocument {
            read_length: 150,
            depth: 28.0,
            motifs: motifs_b,
        };
        let path_b = write_sample_profile(dir.path(), "b.json", &doc_b);

        let entries = vec![
            ManifestEntry {
                sample_id: "sampleA".to_string(),
                status: SampleStatus::Case,
                profile_path: path_a,
            },
            ManifestEntry {
                sample_id: "sampleB".to_string(),
                status: SampleStatus::Control,
                profile_path: path_b,
            },
        ];

        let contig_info = contigs();
        let mut builder = CohortBuilder::new();
        builder
            .load_manifest(&entries, &contig_info, 2..=20)
            .unwrap();
        let merged = builder.build(&contig_info).unwrap();

        let ccg = merged.counts.get("CCG").unwrap();
        assert_eq!(ccg.irr_pair_counts.get("sampleA"), Some(&1));
        assert!(ccg.irr_pair_counts.get("sampleB").is_none());
        // Overlapping regions (100-200, 150-250) merge into one locus
        // carrying both samples' counts.
        assert_eq!(ccg.regions_with_irr_anchors.len(), 1);
        let (_, sample_counts) = ccg.regions_with_irr_anchors.iter().next().unwrap();
        assert_eq!(sample_counts.get("sampleA"), Some(&3));
        assert_eq!(sample_counts.get("sampleB"), Some(&2));

        assert_eq!(merged.parameters.read_lengths.get("sampleA"), Some(&150));
        assert_eq!(merged.parameters.depths.get("sampleB"), Some(&28.0));
    }
}
