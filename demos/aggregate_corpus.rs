//! Example: Build raga signatures from a labeled corpus
//!
//! Usage:
//!   cargo run --release --example aggregate_corpus -- <corpus_dir> <output_dir>
//!
//! The corpus is laid out as `<corpus_dir>/<raga>/<clip>.json`, one serialized
//! `PitchTrack` per file; the directory name is the label.

use std::env;
use std::path::Path;
use std::time::Instant;

use swara_dsp::config::{AggregationConfig, FeatureConfig};
use swara_dsp::io::{save_signature_set, scan_corpus};
use swara_dsp::SignatureAggregator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 2 {
        eprintln!("Usage: aggregate_corpus <corpus_dir> <output_dir>");
        std::process::exit(2);
    }
    let corpus_dir = Path::new(&args[0]);
    let output_dir = Path::new(&args[1]);

    let files = scan_corpus(corpus_dir)?;
    println!("Found {} clip files", files.len());

    let t0 = Instant::now();
    let aggregator = SignatureAggregator::new(FeatureConfig::default(), AggregationConfig::default())
        .with_corpus_path(corpus_dir.display().to_string());
    let set = aggregator.aggregate_track_files(&files)?;
    let elapsed = t0.elapsed();

    save_signature_set(&set, output_dir)?;

    let counts = &set.metadata().counts;
    println!("Aggregation Results:");
    println!("  Files seen: {}", counts.files_seen);
    println!("  Accepted: {}", counts.accepted);
    println!("  Skipped (schema): {}", counts.skipped_schema);
    println!("  Skipped (low gating): {}", counts.skipped_low_gating);
    println!("  Empty features: {}", counts.empty_features);
    println!("  Errors: {}", counts.errors);
    println!();
    for signature in set.iter() {
        println!(
            "  {:<24} clips={:<4} gating={:.3} transitions={:.1}",
            signature.label(),
            signature.clip_count(),
            signature.mean_gating_ratio(),
            signature.mean_transitions()
        );
    }
    println!();
    println!("Wrote {} signatures to {} in {:.2}s", set.len(), output_dir.display(), elapsed.as_secs_f64());

    Ok(())
}
