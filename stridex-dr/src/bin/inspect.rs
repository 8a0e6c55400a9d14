//! stridex-inspect - offline file inspector
//!
//! Loads the given files in order, prints one JSON report with per-file
//! details and the subjects merged from them.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use stridex_common::{load_path, DiscoveryLimits, IngestReport, Subject, SubjectIndex};
use stridex_dr::report::FileReport;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stridex-inspect", version, about = "Inspect gait sensor JSON files")]
struct Args {
    /// List every discovered candidate, not just the count
    #[arg(long)]
    candidates: bool,

    /// Discovery recursion depth bound
    #[arg(long)]
    max_depth: Option<usize>,

    /// Discovery candidate count bound
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Input files (.json, .jsonl, .ndjson, optionally .gz)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    summary: String,
    files: Vec<FileReport>,
    ingest: IngestReport,
    subjects: Vec<&'a Subject>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let defaults = DiscoveryLimits::default();
    let limits = DiscoveryLimits {
        max_depth: args.max_depth.unwrap_or(defaults.max_depth),
        max_candidates: args.max_candidates.unwrap_or(defaults.max_candidates),
        ..defaults
    };

    let mut index = SubjectIndex::new();
    let mut ingest = IngestReport::default();
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let outcome = load_path(path);
        files.push(FileReport::build(&outcome, &limits, args.candidates));
        ingest.absorb(index.ingest_outcome(&outcome));
    }

    let output = InspectOutput {
        summary: ingest.headline(),
        files,
        ingest,
        subjects: index.subjects().collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
