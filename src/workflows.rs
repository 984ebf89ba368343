//! Thin orchestration layer wiring the external collaborators (record
//! stream, manifest, filesystem) to the core (C1-C9). Mirrors the
//! teacher's `profile`/`merge` driver functions, generalized to the
//! expanded configuration surface.

use crate::classify::ClassifierParams;
use crate::cohort::{write_multisample_profile, CohortBuilder};
use crate::config::{MergeConfig, ProfileConfig};
use crate::htslib_stream::{load_reference_contig_info, HtsRecordStream};
use crate::manifest::read_manifest;
use crate::sample_profile::{build_profile, write_locus_table, write_motif_table, write_profile_document};
use anyhow::Result;
use log::info;
use std::path::PathBuf;

/// Runs the single-sample sweep end to end and writes the three output
/// files derived from `config.output_prefix`.
pub fn run_profile_workflow(config: &ProfileConfig) -> Result<()> {
    config.validate()?;
    info!("Reading alignments from {}", config.reads_path.display());

    let mut stream = HtsRecordStream::open(&config.reads_path, &config.reference_path)?;
    let contig_info = stream.contig_info();

    let params = ClassifierParams {
        motif_size_range: config.motif_size_range(),
        max_irr_mapq: config.max_irr_mapq,
        min_anchor_mapq: config.min_anchor_mapq,
        min_baseq: crate::purity::DEFAULT_MIN_BASEQ,
    };

    let pair_log_path = if config.enable_pair_log {
        Some(profile_output_path(&config.output_prefix, "pair_log", "tsv"))
    } else {
        None
    };

    let (document, locus_rows, motif_rows) = build_profile(
        &mut stream,
        contig_info,
        &params,
        pair_log_path.as_deref(),
    )?;

    info!("Writing profile document and side tables");
    write_profile_document(&profile_output_path(&config.output_prefix, "str_profile", "json"), &document)?;
    write_locus_table(&profile_output_path(&config.output_prefix, "locus", "tsv"), &locus_rows)?;
    write_motif_table(&profile_output_path(&config.output_prefix, "motif", "tsv"), &motif_rows)?;

    info!("Done");
    Ok(())
}

/// Runs the cohort merge end to end and writes the multisample profile.
pub fn run_merge_workflow(config: &MergeConfig) -> Result<()> {
    config.validate()?;
    let contig_info = load_reference_contig_info(&config.reference_path)?;
    let entries = read_manifest(&config.manifest_path)?;
    info!("Loaded manifest describing {} samples", entries.len());

    let mut builder = CohortBuilder::new();
    builder.load_manifest(&entries, &contig_info, config.motif_size_range())?;
    let merged = builder.build(&contig_info)?;

    let out_path = profile_output_path(&config.output_prefix, "multisample_profile", "json");
    write_multisample_profile(&out_path, &merged)?;

    info!("Done");
    Ok(())
}

fn profile_output_path(prefix: &std::path::Path, suffix: &str, ext: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_os_string();
    path.push(format!(".{suffix}.{ext}"));
    PathBuf::from(path)
}
