//! C8: single-sample profile driver — owns the end-to-end sweep over a
//! record stream, producing the profile document and the locus/motif
//! side tables.

use crate::classify::{classify_read, ClassifierParams, ReadType};
use crate::contig::ReferenceContigInfo;
use crate::errors::{Result, StrProfileError};
use crate::pair_collector::{PairCollector, ReadPosition};
use crate::record_stream::{ReadRecord, RecordStream};
use crate::region::{sort_and_merge, CountFeature, Region, MAX_MERGE_DISTANCE, UNALIGNED_CONTIG_ID};
use crate::stats::{SampleRunStats, SampleRunStatsCalculator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Target depth used to normalize counts into the locus/motif tables.
const TARGET_DEPTH: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotifRecord {
    #[serde(rename = "RepeatUnit")]
    pub repeat_unit: String,
    #[serde(rename = "AnchoredIrrCount")]
    pub anchored_irr_count: i64,
    #[serde(rename = "IrrPairCount")]
    pub irr_pair_count: i64,
    #[serde(
        rename = "RegionsWithIrrAnchors",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub regions_with_irr_anchors: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(rename = "ReadLength")]
    pub read_length: i64,
    #[serde(rename = "Depth")]
    pub depth: f64,
    #[serde(flatten)]
    pub motifs: BTreeMap<String, MotifRecord>,
}

/// Runs the full sweep: classify each primary record, route it to the
/// pair collector, feed the stats calculator, then finalize. Fails if
/// zero primary alignments were inspected.
pub fn build_profile<S: RecordStream>(
    stream: &mut S,
    contig_info: ReferenceContigInfo,
    params: &ClassifierParams,
    pair_log_path: Option<&Path>,
) -> Result<(ProfileDocument, Vec<LocusRow>, Vec<MotifRow>)> {
    let mut stats_calc = SampleRunStatsCalculator::new(contig_info.clone());
    let mut collector = PairCollector::new(contig_info.clone());
    if let Some(path) = pair_log_path {
        collector.enable_pair_log(path)?;
    }

    let mut inspected = 0u64;
    while let Some(record) = stream.next_record()? {
        inspected += 1;
        stats_calc.inspect(record.contig_id, record.read_length());
        route_record(&record, params, &mut collector)?;
    }

    if inspected == 0 {
        return Err(StrProfileError::EmptyStream(
            "no primary alignments were inspected".to_string(),
        ));
    }

    let stats = stats_calc.estimate()?;
    let (mut anchor_regions, mut irr_regions) = collector.into_regions();

    let motif_range = params.motif_size_range.clone();
    let mut document = ProfileDocument {
        read_length: stats.mean_read_length,
        depth: stats.depth,
        motifs: BTreeMap::new(),
    };

    let mut target_motifs: Vec<String> = irr_regions
        .keys()
        .filter(|motif| motif_range.contains(&motif.len()))
        .cloned()
        .collect();
    target_motifs.sort();

    let mut locus_rows = Vec::new();
    let mut motif_rows = Vec::new();

    for motif in target_motifs {
        let irr_count = irr_regions.get(&motif).map(|v| v.len()).unwrap_or(0);
        let anchor_count = anchor_regions.get(&motif).map(|v| v.len()).unwrap_or(0);
        let irr_pair_count = ((irr_count as i64) - (anchor_count as i64)) / 2;

        let mut regions_with_irr_anchors = BTreeMap::new();
        if let Some(regions) = anchor_regions.get_mut(&motif) {
            sort_and_merge(regions, MAX_MERGE_DISTANCE);
            for region in regions.iter() {
                let encoding = region.encode(&contig_info)?;
                regions_with_irr_anchors.insert(encoding, region.feature.0);

                if region.contig_id != UNALIGNED_CONTIG_ID {
                    locus_rows.push(locus_row(&contig_info, region, &motif, &stats)?);
                }
            }
        }

        if irr_pair_count > 0 {
            motif_rows.push(MotifRow {
                motif: motif.clone(),
                num_paired_irrs: irr_pair_count,
                norm_num_paired_irrs: irr_pair_count as f64 * TARGET_DEPTH / stats.depth,
            });
        }

        document.motifs.insert(
            motif.clone(),
            MotifRecord {
                repeat_unit: motif,
                anchored_irr_count: anchor_count as i64,
                irr_pair_count,
                regions_with_irr_anchors,
            },
        );
    }

    Ok((document, locus_rows, motif_rows))
}

fn route_record(
    record: &ReadRecord,
    params: &ClassifierParams,
    collector: &mut PairCollector,
) -> Result<()> {
    let view = crate::classify::ReadView {
        bases: &record.bases,
        quals: &record.quals,
        flag: record.flag,
        mapq: record.mapq,
    };
    let (read_type, motif) = classify_read(&view, params);
    let pos = ReadPosition {
        contig_id: record.contig_id,
        pos: record.pos,
    };
    match read_type {
        ReadType::Irr => {
            let motif_str = String::from_utf8(motif.expect("IRR read always carries a motif"))
                .map_err(|_| StrProfileError::Logic("motif bytes were not valid UTF-8".to_string()))?;
            collector.add_irr(&record.name, pos, &motif_str)?;
        }
        ReadType::Anchor => collector.add_anchor(&record.name, pos)?,
        ReadType::Other => collector.add_other(&record.name),
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LocusRow {
    pub contig: String,
    pub start: i64,
    pub end: i64,
    pub motif: String,
    pub num_anc_irrs: i64,
    pub norm_num_anc_irrs: f64,
    pub het_str_size: i64,
}

#[derive(Debug, Clone)]
pub struct MotifRow {
    pub motif: String,
    pub num_paired_irrs: i64,
    pub norm_num_paired_irrs: f64,
}

fn locus_row(
    contig_info: &ReferenceContigInfo,
    region: &Region<CountFeature>,
    motif: &str,
    stats: &SampleRunStats,
) -> Result<LocusRow> {
    let contig = contig_info.contig_name(region.contig_id as usize)?.to_string();
    let num_irrs = region.feature.0;
    let norm_num_anc_irrs = num_irrs as f64 * TARGET_DEPTH / stats.depth;
    let read_length = stats.mean_read_length as f64;
    let het_str_size = ((read_length + (num_irrs as f64 * read_length) / (stats.depth / 2.0))
        / motif.len() as f64)
        .floor() as i64;

    Ok(LocusRow {
        contig,
        start: region.start,
        end: region.end,
        motif: motif.to_string(),
        num_anc_irrs: num_irrs,
        norm_num_anc_irrs,
        het_str_size,
    })
}

pub fn write_profile_document(path: &Path, document: &ProfileDocument) -> Result<()> {
    crate::utils::write_atomically(path, |writer| {
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut *writer,
            serde_json::ser::PrettyFormatter::with_indent(b"    "),
        );
        document
            .serialize(&mut serializer)
            .map_err(|e| StrProfileError::Io(format!("failed to serialize profile JSON: {e}")))?;
        writeln!(writer)?;
        Ok(())
    })
}

pub fn write_locus_table(path: &Path, rows: &[LocusRow]) -> Result<()> {
    crate::utils::write_atomically(path, |writer| {
        writeln!(
            writer,
            "contig\tstart\tend\tmotif\tnum_anc_irrs\tnorm_num_anc_irrs\thet_str_size"
        )?;
        for row in rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{:.2}\t{}",
                row.contig,
                row.start,
                row.end,
                row.motif,
                row.num_anc_irrs,
                row.norm_num_anc_irrs,
                row.het_str_size
            )?;
        }
        Ok(())
    })
}

pub fn write_motif_table(path: &Path, rows: &[MotifRow]) -> Result<()> {
    crate::utils::write_atomically(path, |writer| {
        writeln!(writer, "motif\tnum_paired_irrs\tnorm_num_paired_irrs")?;
        for row in rows {
            writeln!(
                writer,
                "{}\t{}\t{:.2}",
                row.motif, row.num_paired_irrs, row.norm_num_paired_irrs
            )?;
        }
        Ok(())
    })
}
