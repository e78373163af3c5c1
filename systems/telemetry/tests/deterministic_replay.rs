use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use harpia_core::{
    derive_stream_seed, ConfigParams, OracleKind, SimulationConfig, TelemetryRecord,
    RNG_STREAM_ORACLE, RNG_STREAM_PERTURBATION, RNG_STREAM_SIMULATOR,
};
use harpia_system_oracle::{QubitSimulator, SelectedOracle};
use harpia_system_reversion::GainSelection;
use harpia_system_telemetry::{SeededPerturbation, TelemetryEngine, TelemetryRun};

#[test]
fn deterministic_replay_is_bit_identical() {
    for kind in [OracleKind::Simulator, OracleKind::Classical] {
        let first = replay(kind, 0x5eed);
        let second = replay(kind, 0x5eed);

        assert_eq!(first, second, "{kind} replay diverged between runs");
        assert_eq!(fingerprint(&first), fingerprint(&second));
    }
}

#[test]
fn distinct_seeds_produce_distinct_runs() {
    let first = replay(OracleKind::Classical, 1);
    let second = replay(OracleKind::Classical, 2);
    assert_ne!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn seeded_runs_keep_every_frame() {
    let run = replay(OracleKind::Simulator, 0x5eed);
    assert_eq!(run.records.len(), 240);
    assert!(run.statistics.rejected_frames.is_empty());

    let frames: Vec<usize> = run.records.iter().map(|r| r.frame.frame_index).collect();
    assert!(frames.windows(2).all(|pair| pair[1] == pair[0] + 1));

    let summary = run.statistics.coherence.expect("frames recorded");
    assert!(summary.min > 0.0 && summary.max <= 1.0);
    assert!(summary.min <= summary.mean && summary.mean <= summary.max);
}

fn replay(kind: OracleKind, run_seed: u64) -> TelemetryRun {
    let config = SimulationConfig::new(ConfigParams {
        entity_count: 12,
        frame_count: 240,
        ..ConfigParams::default()
    })
    .expect("valid config");

    let mut backend = QubitSimulator::from_seed(derive_stream_seed(run_seed, RNG_STREAM_SIMULATOR));
    let oracle = SelectedOracle::select(
        kind,
        &mut backend,
        derive_stream_seed(run_seed, RNG_STREAM_ORACLE),
    );
    let gain = GainSelection::resolve(&config, None);
    let perturbation =
        SeededPerturbation::from_seed(derive_stream_seed(run_seed, RNG_STREAM_PERTURBATION));

    TelemetryEngine::new(config, oracle, gain, perturbation).run()
}

fn fingerprint(run: &TelemetryRun) -> u64 {
    let mut hasher = DefaultHasher::new();
    for record in &run.records {
        hash_record(record, &mut hasher);
    }
    run.statistics.phoenix_trigger_count.hash(&mut hasher);
    hasher.finish()
}

fn hash_record(record: &TelemetryRecord, hasher: &mut DefaultHasher) {
    let frame = &record.frame;
    frame.frame_index.hash(hasher);
    for value in [
        frame.time,
        frame.chaos_raw,
        frame.chaos_clamped,
        frame.ambient_noise,
        frame.oracle_flux,
    ] {
        value.to_bits().hash(hasher);
    }
    for entity in &record.entities {
        for value in [
            entity.x,
            entity.y,
            entity.z,
            entity.coherence,
            entity.gain,
            entity.torque,
        ] {
            value.to_bits().hash(hasher);
        }
    }
}
