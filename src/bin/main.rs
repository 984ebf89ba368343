use clap::{Parser, Subcommand};
use std::path::PathBuf;

use strdn_profile::config::{MergeConfig, ProfileConfig};
use strdn_profile::workflows::{run_merge_workflow, run_profile_workflow};

/// Default output prefix for a given input path: its directory plus the
/// text before the first period in its file name.
fn default_output_prefix(input: &std::path::Path) -> PathBuf {
    let file_stem = input.file_stem().unwrap_or_default().to_str().unwrap_or("");
    let file_prefix = match file_stem.find('.') {
        Some(period_idx) => &file_stem[..period_idx],
        None => file_stem,
    };
    let mut out = input.to_path_buf();
    out.set_file_name(file_prefix);
    out
}

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
pub struct App {
    #[clap(short, long, default_value = "2")]
    verbosity: usize,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Builds a single-sample STR profile from aligned reads
    Profile {
        /// The path to the aligned, indexed reads (BAM/CRAM)
        reads: PathBuf,

        /// The path to the reference FASTA the reads were aligned against
        reference: PathBuf,

        /// The prefix output files are written under. Defaults to the reads path's stem.
        #[clap(short, long)]
        output_prefix: Option<PathBuf>,

        /// Minimum motif length considered during period finding.
        #[clap(long, default_value = "2")]
        min_motif_len: usize,

        /// Maximum motif length considered during period finding.
        #[clap(long, default_value = "20")]
        max_motif_len: usize,

        /// Minimum mapping quality for a read to be treated as an anchor.
        #[clap(long, default_value = "50")]
        min_anchor_mapq: u8,

        /// Maximum mapping quality for a read to be eligible for IRR detection.
        #[clap(long, default_value = "40")]
        max_irr_mapq: u8,

        /// Write a per-pair log alongside the profile. Default is false.
        #[clap(long, action)]
        pair_log: bool,
    },
    /// Merges single-sample profiles into a cohort-level multisample profile
    Merge {
        /// The path to the manifest file (sample, case/control status, profile path)
        manifest: PathBuf,

        /// The path to the reference FASTA the samples were profiled against
        reference: PathBuf,

        /// The prefix output files are written under. Defaults to the manifest path's stem.
        #[clap(short, long)]
        output_prefix: Option<PathBuf>,

        /// Minimum motif length to include in the merged profile.
        #[clap(long, default_value = "2")]
        min_motif_len: usize,

        /// Maximum motif length to include in the merged profile.
        #[clap(long, default_value = "20")]
        max_motif_len: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let app: App = App::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(app.verbosity)
        .timestamp(stderrlog::Timestamp::Second)
        .color(stderrlog::ColorChoice::Never)
        .init()
        .unwrap();

    match app.command {
        Command::Profile {
            reads,
            reference,
            output_prefix,
            min_motif_len,
            max_motif_len,
            min_anchor_mapq,
            max_irr_mapq,
            pair_log,
        } => {
            let output_prefix = output_prefix.unwrap_or_else(|| default_output_prefix(&reads));
            let config = ProfileConfig {
                reads_path: reads,
                reference_path: reference,
                output_prefix,
                min_motif_len,
                max_motif_len,
                min_anchor_mapq,
                max_irr_mapq,
                enable_pair_log: pair_log,
            };
            run_profile_workflow(&config)?;
        }
        Command::Merge {
            manifest,
            reference,
            output_prefix,
            min_motif_len,
            max_motif_len,
        } => {
            let output_prefix = output_prefix.unwrap_or_else(|| default_output_prefix(&manifest));
            let config = MergeConfig {
                manifest_path: manifest,
                reference_path: reference,
                output_prefix,
                min_motif_len,
                max_motif_len,
            };
            run_merge_workflow(&config)?;
        }
    }

    Ok(())
}
