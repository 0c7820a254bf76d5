//! Integration tests for the raga recognition engine
//!
//! Clips come from a seeded synthetic singer: a random walk over a raga's
//! scale with held notes, short glides between them and a longer hold on Sa.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swara_dsp::analysis::result::{AbstentionReason, Verdict};
use swara_dsp::analysis::{evaluate_corpus, SiblingPairs};
use swara_dsp::config::{
    AggregationConfig, FeatureConfig, FeatureSchema, RecognitionConfig, ScoreWeights, ScoringMethod,
};
use swara_dsp::features::{extract_with_tonic, ClipFeatures, LabeledFeatures};
use swara_dsp::io::{load_signature_set, save_signature_set, LabeledPitchTrack, PitchTrack};
use swara_dsp::{RecognitionEngine, SignatureAggregator, SignatureSet};

const FRAME_RATE: f32 = 100.0;
const BIN_WIDTH: f32 = 1200.0 / 36.0;

/// Scale degrees as 36-bin indices
const RAGAS: [(&str, &[usize]); 3] = [
    ("Mohanam", &[0, 6, 12, 21, 27]),
    ("Kharaharapriya", &[0, 3, 9, 15, 24, 30]),
    ("Mayamalavagowla", &[0, 3, 12, 15, 21, 24, 33]),
];

fn bin_center(bin: usize) -> f32 {
    (bin as f32 + 0.5) * BIN_WIDTH
}

/// Cents sequence of a synthetic performance
///
/// With `sa_at_zero` the tonic itself sits at 0 cents (as a singer would);
/// otherwise every note, Sa included, sits at its bin centre.
fn synth_cents(rng: &mut StdRng, scale: &[usize], notes: usize, sa_at_zero: bool) -> Vec<f32> {
    let position = |degree: usize| {
        if degree == 0 && sa_at_zero {
            0.0
        } else {
            bin_center(scale[degree])
        }
    };

    let mut cents = Vec::new();
    let mut degree = 0usize;
    for _ in 0..notes {
        let here = position(degree);
        let hold = rng.gen_range(15..35) + if degree == 0 { 30 } else { 0 };
        for _ in 0..hold {
            cents.push(here + rng.gen_range(-4.0f32..4.0));
        }

        let steps = [-2isize, -1, 1, 1, 2];
        let step = steps[rng.gen_range(0..steps.len())];
        let mut next = degree as isize + step;
        if next < 0 || next >= scale.len() as isize {
            next = degree as isize - step;
        }
        let mut next = next.clamp(0, scale.len() as isize - 1) as usize;
        if next == degree {
            next = if degree == 0 { 1 } else { degree - 1 };
        }

        let there = position(next);
        for g in 1..4 {
            cents.push(here + (there - here) * g as f32 / 4.0);
        }
        degree = next;
    }

    let sa = position(0);
    cents.extend((0..40).map(|_| sa + rng.gen_range(-4.0f32..4.0)));
    cents
}

fn to_track(cents: &[f32], tonic_hz: f32, rng: &mut StdRng) -> PitchTrack {
    let mut pitch: Vec<f32> = cents
        .iter()
        .map(|c| tonic_hz * 2f32.powf(c / 1200.0))
        .collect();
    // Sparse tracker dropouts
    for p in pitch.iter_mut() {
        if rng.gen_bool(0.01) {
            *p = f32::NAN;
        }
    }
    PitchTrack::from_pitch(pitch, FRAME_RATE).unwrap()
}

fn feature_config() -> FeatureConfig {
    FeatureConfig::default()
}

/// Features of `clips` clips per raga, extracted with their known tonic
fn corpus_features(rng: &mut StdRng, clips: usize) -> Vec<LabeledFeatures> {
    let mut out = Vec::new();
    for (label, scale) in RAGAS.iter() {
        for i in 0..clips {
            let tonic = rng.gen_range(120.0f32..200.0);
            let cents = synth_cents(rng, scale, 60, false);
            let track = to_track(&cents, tonic, rng);
            let features = extract_with_tonic(&track, tonic, &feature_config())
                .unwrap()
                .into_features()
                .unwrap();
            out.push(LabeledFeatures {
                id: format!("{}_{}", label, i),
                label: label.to_string(),
                features,
            });
        }
    }
    out
}

fn corpus_tracks(rng: &mut StdRng, clips: usize) -> Vec<LabeledPitchTrack> {
    let mut out = Vec::new();
    for (label, scale) in RAGAS.iter() {
        for i in 0..clips {
            let tonic = rng.gen_range(120.0f32..200.0);
            let cents = synth_cents(rng, scale, 60, true);
            out.push(LabeledPitchTrack {
                id: format!("{}_{}", label, i),
                label: label.to_string(),
                track: to_track(&cents, tonic, rng),
            });
        }
    }
    out
}

#[test]
fn test_known_tonic_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let corpus = corpus_features(&mut rng, 4);
    let aggregator = SignatureAggregator::new(feature_config(), AggregationConfig::default());
    let set = aggregator.aggregate_features(&corpus).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.metadata().counts.accepted, 12);

    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();
    for (label, scale) in RAGAS.iter() {
        let tonic = rng.gen_range(120.0f32..200.0);
        let cents = synth_cents(&mut rng, scale, 60, false);
        let track = to_track(&cents, tonic, &mut rng);
        let outcome = engine.recognize_with_tonic(&track, tonic).unwrap();

        assert_eq!(outcome.ranking[0].label, *label);
        let margin = outcome.margin_12.unwrap();
        assert!(margin > 0.06, "{}: margin {:.4}", label, margin);
        assert_eq!(outcome.verdict, Verdict::Raga(label.to_string()));
    }
}

#[test]
fn test_estimated_tonic_round_trip() {
    let mut rng = StdRng::seed_from_u64(11);
    let corpus = corpus_tracks(&mut rng, 4);
    let aggregator = SignatureAggregator::new(feature_config(), AggregationConfig::default())
        .with_corpus_path("synthetic");
    let set = aggregator.aggregate_tracks(&corpus).unwrap();
    assert_eq!(set.metadata().counts.files_seen, 12);
    assert_eq!(set.metadata().counts.accepted, 12);

    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();
    for (label, scale) in RAGAS.iter() {
        let tonic = rng.gen_range(120.0f32..200.0);
        let cents = synth_cents(&mut rng, scale, 60, true);
        let track = to_track(&cents, tonic, &mut rng);
        let outcome = engine.recognize(&track).unwrap();

        let estimate = outcome.tonic.as_ref().unwrap();
        let error_cents = (1200.0 * (estimate.tonic_hz / tonic).log2()).abs();
        assert!(error_cents < 15.0, "tonic off by {:.1} cents", error_cents);
        assert_eq!(outcome.ranking[0].label, *label);
    }
}

#[test]
fn test_ranking_independent_of_signature_order() {
    let mut rng = StdRng::seed_from_u64(3);
    let corpus = corpus_features(&mut rng, 2);
    let aggregator = SignatureAggregator::new(feature_config(), AggregationConfig::default());
    let set = aggregator.aggregate_features(&corpus).unwrap();

    let mut reversed: Vec<_> = set.iter().cloned().collect();
    reversed.reverse();
    let reordered = SignatureSet::new(set.metadata().clone(), reversed).unwrap();

    let a = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();
    let b = RecognitionEngine::new(Arc::new(reordered), RecognitionConfig::default()).unwrap();

    let query = &corpus[1].features;
    let ra = a.recognize_features(query).unwrap();
    let rb = b.recognize_features(query).unwrap();
    assert_eq!(ra.ranking, rb.ranking);
    assert_eq!(ra.verdict, rb.verdict);
}

#[test]
fn test_empty_gate_is_unknown() {
    let mut rng = StdRng::seed_from_u64(5);
    let corpus = corpus_features(&mut rng, 1);
    let aggregator = SignatureAggregator::new(feature_config(), AggregationConfig::default());
    let set = aggregator.aggregate_features(&corpus).unwrap();
    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();

    // Continuous sawtooth glide: voiced throughout, never held.
    let pitch: Vec<f32> = (0..300)
        .map(|i| 150.0 * 2f32.powf(((i % 60) as f32 * 20.0) / 1200.0))
        .collect();
    let track = PitchTrack::from_pitch(pitch, FRAME_RATE).unwrap();
    let outcome = engine.recognize(&track).unwrap();

    assert_eq!(outcome.verdict, Verdict::Unknown(AbstentionReason::EmptyFeatures));
    assert_eq!(outcome.verdict.to_string(), "UNKNOWN/LOW CONFIDENCE");
    assert!(outcome.ranking.is_empty());
    assert!(outcome.tonic.is_some());
}

#[test]
fn test_too_few_voiced_frames_is_error() {
    let mut rng = StdRng::seed_from_u64(5);
    let corpus = corpus_features(&mut rng, 1);
    let set = SignatureAggregator::new(feature_config(), AggregationConfig::default())
        .aggregate_features(&corpus)
        .unwrap();
    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();

    let track = PitchTrack::from_pitch(vec![150.0; 150], FRAME_RATE).unwrap();
    assert!(matches!(
        engine.recognize(&track),
        Err(swara_dsp::RecognitionError::InsufficientVoicedFrames { found: 150, required: 200 })
    ));
}

fn two_bin_clip(label: &str, pcd: [f32; 2], up: [f32; 4], down: [f32; 4]) -> LabeledFeatures {
    LabeledFeatures {
        id: format!("{}_0", label),
        label: label.to_string(),
        features: ClipFeatures::new(
            FeatureSchema::DirectionalV12,
            pcd.to_vec(),
            up.to_vec(),
            down.to_vec(),
            100,
            0.9,
            500,
        )
        .unwrap(),
    }
}

fn sibling_fixture() -> (SignatureSet, ClipFeatures) {
    let query_up = [0.1, 0.6, 0.1, 0.2];
    let query_down = [0.2, 0.1, 0.6, 0.1];
    let corpus = vec![
        // Same PCD as the query, different ascent
        two_bin_clip("Kalyani", [0.5, 0.5], [0.2, 0.2, 0.2, 0.4], query_down),
        // Same dyads as the query, different PCD
        two_bin_clip("Shankarabharanam", [0.125, 0.875], query_up, query_down),
        two_bin_clip("Todi", [0.9, 0.1], [0.6, 0.1, 0.2, 0.1], [0.1, 0.6, 0.1, 0.2]),
    ];
    let config = FeatureConfig {
        bins: 2,
        ..FeatureConfig::default()
    };
    let set = SignatureAggregator::new(config, AggregationConfig::default())
        .aggregate_features(&corpus)
        .unwrap();
    let query = two_bin_clip("query", [0.5, 0.5], query_up, query_down).features;
    (set, query)
}

#[test]
fn test_sibling_escalation_decides_verdict() {
    let (set, query) = sibling_fixture();
    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();
    let outcome = engine.recognize_features(&query).unwrap();

    assert!(outcome.escalated);
    assert_eq!(outcome.ranking[0].label, "Shankarabharanam");
    assert_eq!(outcome.verdict, Verdict::Raga("Shankarabharanam".to_string()));
    assert!(outcome.margin_12.unwrap() > 0.06);
}

#[test]
fn test_no_escalation_without_sibling_pair() {
    let (set, query) = sibling_fixture();
    let config = RecognitionConfig {
        siblings: SiblingPairs::new(),
        ..RecognitionConfig::default()
    };
    let engine = RecognitionEngine::new(Arc::new(set), config).unwrap();
    let outcome = engine.recognize_features(&query).unwrap();

    assert!(!outcome.escalated);
    assert_eq!(outcome.ranking[0].label, "Kalyani");
    // Default-weight lead is too narrow to name.
    assert_eq!(outcome.verdict, Verdict::Unknown(AbstentionReason::NarrowLead));
}

/// Same layout as the sibling fixture, tuned for Jensen-Shannon scoring
fn js_sibling_fixture() -> (SignatureSet, ClipFeatures) {
    let query_up = [0.1, 0.6, 0.1, 0.2];
    let query_down = [0.2, 0.1, 0.6, 0.1];
    let corpus = vec![
        two_bin_clip("Kalyani", [0.5, 0.5], [0.95, 0.05, 0.2, 0.4], query_down),
        two_bin_clip("Shankarabharanam", [0.2, 0.8], query_up, query_down),
        two_bin_clip("Todi", [0.9, 0.1], [0.6, 0.1, 0.2, 0.1], [0.1, 0.6, 0.1, 0.2]),
    ];
    let config = FeatureConfig {
        bins: 2,
        ..FeatureConfig::default()
    };
    let set = SignatureAggregator::new(config, AggregationConfig::default())
        .aggregate_features(&corpus)
        .unwrap();
    let query = two_bin_clip("query", [0.5, 0.5], query_up, query_down).features;
    (set, query)
}

fn js_config() -> RecognitionConfig {
    RecognitionConfig {
        scoring: ScoringMethod::JensenShannon,
        ..RecognitionConfig::default()
    }
}

fn assert_weighted(outcome: &swara_dsp::RecognitionOutcome, weights: ScoreWeights) {
    for c in &outcome.ranking {
        let expected = weights.pcd * c.pcd_similarity + weights.dyad * c.dyad_similarity;
        assert!((c.raw_score - expected).abs() < 1e-5, "{}: {} vs {}", c.label, c.raw_score, expected);
        assert!((0.0..=1.0).contains(&c.pcd_similarity));
        assert!((0.0..=1.0).contains(&c.dyad_similarity));
    }
}

#[test]
fn test_jensen_shannon_default_weighting() {
    let (set, query) = js_sibling_fixture();
    let config = RecognitionConfig {
        siblings: SiblingPairs::new(),
        ..js_config()
    };
    assert_eq!(config.default_weights(), ScoreWeights { pcd: 0.6, dyad: 0.4 });
    let engine = RecognitionEngine::new(Arc::new(set), config).unwrap();
    let outcome = engine.recognize_features(&query).unwrap();

    assert!(!outcome.escalated);
    assert_weighted(&outcome, ScoreWeights { pcd: 0.6, dyad: 0.4 });
    let labels: Vec<&str> = outcome.ranking.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Kalyani", "Shankarabharanam", "Todi"]);
    // Identical PCD to the query
    assert!((outcome.ranking[0].pcd_similarity - 1.0).abs() < 1e-5);
    let margin = outcome.margin_12.unwrap();
    assert!(margin > 0.03 && margin < 0.06, "margin {:.4}", margin);
    assert_eq!(outcome.verdict, Verdict::Raga("Kalyani".to_string()));
}

#[test]
fn test_jensen_shannon_sibling_escalation() {
    let (set, query) = js_sibling_fixture();
    let engine = RecognitionEngine::new(Arc::new(set), js_config()).unwrap();
    let outcome = engine.recognize_features(&query).unwrap();

    assert!(outcome.escalated);
    assert_weighted(&outcome, ScoreWeights { pcd: 0.2, dyad: 0.8 });
    assert_eq!(outcome.ranking[0].label, "Shankarabharanam");
    assert!((outcome.ranking[0].dyad_similarity - 1.0).abs() < 1e-5);
    assert!(outcome.margin_12.unwrap() > 0.1);
    assert_eq!(outcome.verdict, Verdict::Raga("Shankarabharanam".to_string()));
}

#[test]
fn test_signature_store_round_trip_recognizes_identically() {
    let mut rng = StdRng::seed_from_u64(19);
    let corpus = corpus_features(&mut rng, 2);
    let set = SignatureAggregator::new(feature_config(), AggregationConfig::default())
        .aggregate_features(&corpus)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    save_signature_set(&set, dir.path()).unwrap();
    let loaded = load_signature_set(dir.path()).unwrap();
    assert_eq!(loaded, set);

    let engine = RecognitionEngine::new(Arc::new(loaded), RecognitionConfig::default()).unwrap();
    let outcome = engine.recognize_features(&corpus[0].features).unwrap();
    assert_eq!(outcome.ranking[0].label, corpus[0].label);
}

#[test]
fn test_evaluation_excludes_missing_signature_from_accuracy() {
    let mut rng = StdRng::seed_from_u64(23);
    let training = corpus_tracks(&mut rng, 3);
    let set = SignatureAggregator::new(feature_config(), AggregationConfig::default())
        .aggregate_tracks(&training)
        .unwrap();
    let engine = RecognitionEngine::new(Arc::new(set), RecognitionConfig::default()).unwrap();

    let mut clips = corpus_tracks(&mut rng, 1);
    let cents = synth_cents(&mut rng, &[0, 6, 15, 21, 30], 60, true);
    clips.push(LabeledPitchTrack {
        id: "unseen_0".to_string(),
        label: "Hindolam".to_string(),
        track: to_track(&cents, 160.0, &mut rng),
    });
    clips.push(LabeledPitchTrack {
        id: "short_0".to_string(),
        label: "Mohanam".to_string(),
        track: PitchTrack::from_pitch(vec![150.0; 50], FRAME_RATE).unwrap(),
    });

    let report = evaluate_corpus(&engine, &clips);
    assert_eq!(report.rows.len(), 5);
    assert_eq!(report.rows[3].id, "unseen_0");
    assert!(report.rows[3].missing_signature);
    assert!(!report.rows[3].correct);
    assert!(report.rows[4].error.is_some());

    let summary = &report.summary;
    assert_eq!(summary.total, 5);
    assert_eq!(summary.missing_signature, 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.per_raga.contains_key("Hindolam"));
    let scored: usize = summary.per_raga.values().map(|t| t.total).sum();
    assert_eq!(scored, 3);
    assert!((summary.accuracy - summary.correct as f32 / 3.0).abs() < 1e-6);
}
