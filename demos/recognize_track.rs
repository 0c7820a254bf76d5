//! Example: Recognize the raga of a single pitch track
//!
//! Usage:
//!   cargo run --release --example recognize_track -- <signature_dir> <track.json>
//!
//! The track file is a serialized `PitchTrack` (pitch in Hz per frame,
//! voiced flags, frame rate). Signatures are read from a directory written by
//! the `aggregate_corpus` example.

use std::env;
use std::sync::Arc;
use std::time::Instant;

use swara_dsp::io::{load_pitch_track, load_signature_set};
use swara_dsp::{RecognitionConfig, RecognitionEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 2 {
        eprintln!("Usage: recognize_track <signature_dir> <track.json>");
        std::process::exit(2);
    }

    let signatures = load_signature_set(&args[0])?;
    if !signatures.missing_labels().is_empty() {
        eprintln!("WARNING: missing signatures: {}", signatures.missing_labels().join(", "));
    }
    let track = load_pitch_track(&args[1])?;

    let engine = RecognitionEngine::new(Arc::new(signatures), RecognitionConfig::default())?;

    let t0 = Instant::now();
    let outcome = engine.recognize(&track)?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

    println!("Recognition Results:");
    if let Some(tonic) = &outcome.tonic {
        println!("  Tonic: {:.2} Hz", tonic.tonic_hz);
    }
    println!("  Gating ratio: {:.3}", outcome.gating_ratio);
    println!("  Transitions: {}", outcome.transitions);
    println!("  Genericness: {:.3}", outcome.genericness_index);
    if outcome.escalated {
        println!("  Sibling escalation applied");
    }
    println!();
    println!("  {:<4} {:<24} {:>8} {:>8} {:>8}", "#", "Raga", "PCD", "Dyad", "Score");
    for (i, c) in outcome.ranking.iter().take(5).enumerate() {
        println!(
            "  {:<4} {:<24} {:>8.4} {:>8.4} {:>8.4}",
            i + 1,
            c.label,
            c.pcd_similarity,
            c.dyad_similarity,
            c.final_score
        );
    }
    println!();
    match outcome.margin_12 {
        Some(m) => println!("  Margin (1-2): {:.4}", m),
        None => println!("  Margin (1-2): n/a"),
    }
    println!("  Verdict: {}", outcome.verdict);
    println!("  Processing time: {:.2} ms", elapsed_ms);

    Ok(())
}
