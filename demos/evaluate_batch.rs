//! Example: Evaluate recognition accuracy over a labeled corpus in parallel
//!
//! Usage:
//!   cargo run --release --example evaluate_batch -- [--jobs N] [--json] <signature_dir> <corpus_dir>
//!
//! Notes:
//! - The corpus is laid out as `<corpus_dir>/<raga>/<clip>.json`.
//! - Parallelism is across clips. Each clip is recognized on one thread.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use swara_dsp::analysis::evaluate_corpus;
use swara_dsp::io::{load_pitch_track, load_signature_set, scan_corpus, LabeledPitchTrack};
use swara_dsp::{RecognitionConfig, RecognitionEngine};

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn load_corpus(dir: &Path) -> Result<Vec<LabeledPitchTrack>, Box<dyn std::error::Error>> {
    let mut clips = Vec::new();
    for file in scan_corpus(dir)? {
        match load_pitch_track(&file.path) {
            Ok(track) => clips.push(LabeledPitchTrack {
                id: file.id,
                label: file.label,
                track,
            }),
            Err(e) => eprintln!("Skipping {}: {}", file.path.display(), e),
        }
    }
    Ok(clips)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: evaluate_batch [--jobs N] [--json] <signature_dir> <corpus_dir>\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per clip (JSONL)\n"
                );
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    if positional.len() != 2 {
        eprintln!("ERROR: Provide a signature directory and a corpus directory. Use --help for usage.");
        std::process::exit(2);
    }

    let signatures = load_signature_set(&positional[0])?;
    let clips = load_corpus(Path::new(&positional[1]))?;
    let engine = RecognitionEngine::new(Arc::new(signatures), RecognitionConfig::default())?;

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} clips, {} ragas, jobs={}", clips.len(), engine.signatures().len(), jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let report = pool.install(|| evaluate_corpus(&engine, &clips));
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    if json {
        for row in &report.rows {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        for (idx, row) in report.rows.iter().enumerate() {
            match &row.error {
                None => println!(
                    "[{}/{}] {}: true={} verdict={} margin={} {}",
                    idx + 1,
                    report.rows.len(),
                    row.id,
                    row.true_label,
                    row.verdict,
                    row.margin_12.map(|m| format!("{:.4}", m)).unwrap_or_else(|| "n/a".to_string()),
                    if row.correct { "OK" } else { "MISS" }
                ),
                Some(e) => println!("[{}/{}] {}: ERROR: {}", idx + 1, report.rows.len(), row.id, e),
            }
        }
    }

    let s = &report.summary;
    eprintln!(
        "Done: clips={} correct={} unknown={} errors={} missing_signature={} wall={:.0}ms",
        s.total, s.correct, s.unknown, s.errors, s.missing_signature, wall_ms
    );
    eprintln!("accuracy: {:.3}", s.accuracy);
    for (label, tally) in &s.per_raga {
        eprintln!("  {:<24} {}/{} ({:.3})", label, tally.correct, tally.total, tally.accuracy);
    }

    Ok(())
}
