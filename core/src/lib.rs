#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Harpia telemetry engine.
//!
//! This crate defines the data surface that connects the pure systems, the
//! telemetry engine and the adapters. Callers build a validated
//! [`SimulationConfig`], inject the [`NoiseOracle`], [`GainEngine`] and
//! [`PerturbationSource`] capabilities, and receive one [`TelemetryRecord`] per
//! frame through a [`TelemetrySink`] together with the final
//! [`RunStatistics`].

use std::{convert::Infallible, f64::consts::TAU, fmt};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Golden ratio used as the natural frequency of the coherence operator.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Simulated time that elapses between two consecutive frames.
pub const TIME_STEP: f64 = 0.05;

/// Chaos level at which the phoenix clamp engages (φ² truncated to three decimals).
pub const CRITICAL_THRESHOLD: f64 = 2.618;

/// Default number of entities simulated on the torus.
pub const DEFAULT_ENTITY_COUNT: usize = 120;
/// Default number of frames produced by a run.
pub const DEFAULT_FRAME_COUNT: usize = 1_000;
/// Default major radius of the torus.
pub const DEFAULT_MAJOR_RADIUS: f64 = 21.0;
/// Default minor radius of the torus.
pub const DEFAULT_MINOR_RADIUS: f64 = 2.5;
/// Default vertical flattening applied to the torus.
pub const DEFAULT_FLATTEN_FACTOR: f64 = 0.000_001;

/// Seed used when the caller does not supply one.
pub const DEFAULT_RUN_SEED: u64 = 0x1977_0815;

/// Stream label for the noise oracle's classical randomness.
pub const RNG_STREAM_ORACLE: &str = "oracle";
/// Stream label for the per-entity perturbation draws.
pub const RNG_STREAM_PERTURBATION: &str = "perturbation";
/// Stream label for the qubit simulator's measurement sampling.
pub const RNG_STREAM_SIMULATOR: &str = "simulator";

/// Raw, unvalidated configuration values.
///
/// Every field defaults to the canonical torus geometry so partial TOML
/// documents deserialize cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigParams {
    /// Number of entities placed on the torus.
    pub entity_count: usize,
    /// Number of frames generated by the run.
    pub frame_count: usize,
    /// Radius of the torus' major circle.
    pub major_radius: f64,
    /// Radius of the torus' tube.
    pub minor_radius: f64,
    /// Vertical scale applied to the tube's z component.
    pub flatten_factor: f64,
    /// Whether the reversion gain engine shields perturbations.
    pub reversion_enabled: bool,
}

impl Default for ConfigParams {
    fn default() -> Self {
        Self {
            entity_count: DEFAULT_ENTITY_COUNT,
            frame_count: DEFAULT_FRAME_COUNT,
            major_radius: DEFAULT_MAJOR_RADIUS,
            minor_radius: DEFAULT_MINOR_RADIUS,
            flatten_factor: DEFAULT_FLATTEN_FACTOR,
            reversion_enabled: true,
        }
    }
}

/// Validated configuration that stays immutable for the duration of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigParams", into = "ConfigParams")]
pub struct SimulationConfig {
    entity_count: usize,
    frame_count: usize,
    major_radius: f64,
    minor_radius: f64,
    flatten_factor: f64,
    reversion_enabled: bool,
}

impl SimulationConfig {
    /// Validates the provided parameters and freezes them into a configuration.
    pub fn new(params: ConfigParams) -> Result<Self, ConfigError> {
        if params.entity_count == 0 {
            return Err(ConfigError::NoEntities);
        }
        if params.frame_count == 0 {
            return Err(ConfigError::NoFrames);
        }
        ensure_positive(ConfigField::MajorRadius, params.major_radius)?;
        ensure_positive(ConfigField::MinorRadius, params.minor_radius)?;
        ensure_positive(ConfigField::FlattenFactor, params.flatten_factor)?;

        Ok(Self {
            entity_count: params.entity_count,
            frame_count: params.frame_count,
            major_radius: params.major_radius,
            minor_radius: params.minor_radius,
            flatten_factor: params.flatten_factor,
            reversion_enabled: params.reversion_enabled,
        })
    }

    /// Number of entities placed on the torus.
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Number of frames generated by the run.
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Radius of the torus' major circle.
    #[must_use]
    pub const fn major_radius(&self) -> f64 {
        self.major_radius
    }

    /// Radius of the torus' tube before coherence distortion.
    #[must_use]
    pub const fn minor_radius(&self) -> f64 {
        self.minor_radius
    }

    /// Vertical scale applied to the tube's z component.
    #[must_use]
    pub const fn flatten_factor(&self) -> f64 {
        self.flatten_factor
    }

    /// Whether the reversion gain engine shields perturbations.
    #[must_use]
    pub const fn reversion_enabled(&self) -> bool {
        self.reversion_enabled
    }

    /// Angular offsets distributing the configured entities around the major circle.
    #[must_use]
    pub fn offsets(&self) -> Vec<f64> {
        entity_offsets(self.entity_count)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let params = ConfigParams::default();
        Self {
            entity_count: params.entity_count,
            frame_count: params.frame_count,
            major_radius: params.major_radius,
            minor_radius: params.minor_radius,
            flatten_factor: params.flatten_factor,
            reversion_enabled: params.reversion_enabled,
        }
    }
}

impl TryFrom<ConfigParams> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(params: ConfigParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<SimulationConfig> for ConfigParams {
    fn from(config: SimulationConfig) -> Self {
        Self {
            entity_count: config.entity_count,
            frame_count: config.frame_count,
            major_radius: config.major_radius,
            minor_radius: config.minor_radius,
            flatten_factor: config.flatten_factor,
            reversion_enabled: config.reversion_enabled,
        }
    }
}

fn ensure_positive(field: ConfigField, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Configuration fields subject to positivity checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Radius of the torus' major circle.
    MajorRadius,
    /// Radius of the torus' tube.
    MinorRadius,
    /// Vertical flattening factor.
    FlattenFactor,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MajorRadius => write!(f, "major_radius"),
            Self::MinorRadius => write!(f, "minor_radius"),
            Self::FlattenFactor => write!(f, "flatten_factor"),
        }
    }
}

/// Reasons a configuration is rejected before any frame is processed.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The run must simulate at least one entity.
    #[error("entity_count must be greater than zero")]
    NoEntities,
    /// The run must produce at least one frame.
    #[error("frame_count must be greater than zero")]
    NoFrames,
    /// A geometric parameter was zero, negative or not finite.
    #[error("{field} must be a finite value greater than zero, got {value}")]
    NonPositive {
        /// Field that failed validation.
        field: ConfigField,
        /// Rejected value.
        value: f64,
    },
}

/// Computes `offset[i] = i * 2π / count`, uniformly partitioning the circle.
#[must_use]
pub fn entity_offsets(count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let step = TAU / count as f64;
    (0..count).map(|index| index as f64 * step).collect()
}

/// Simulated time associated with a frame index.
#[must_use]
pub fn frame_time(frame_index: usize) -> f64 {
    frame_index as f64 * TIME_STEP
}

/// Scalar bundle shared by every entity within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    /// Zero-based frame index.
    pub frame_index: usize,
    /// Simulated time of the frame.
    pub time: f64,
    /// Chaos level produced by the escalator.
    pub chaos_raw: f64,
    /// Chaos level after the phoenix clamp.
    pub chaos_clamped: f64,
    /// Ambient vibrational noise injected during the burst window.
    pub ambient_noise: f64,
    /// Perturbation sampled from the noise oracle.
    pub oracle_flux: f64,
}

/// Metrics and position produced for one entity within one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityFrameRecord {
    /// Projected x coordinate on the torus.
    pub x: f64,
    /// Projected y coordinate on the torus.
    pub y: f64,
    /// Projected z coordinate on the torus.
    pub z: f64,
    /// Coherence score in `(0, 1]`.
    pub coherence: f64,
    /// Reversion gain applied to the perturbation.
    pub gain: f64,
    /// Restoring torque opposing the perturbation.
    pub torque: f64,
}

/// Atomic unit appended to the telemetry output: one frame and all its entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Shared frame scalars.
    pub frame: FrameState,
    /// Per-entity records ordered by entity index.
    pub entities: Vec<EntityFrameRecord>,
}

impl TelemetryRecord {
    /// Number of entities captured in the record.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Arithmetic mean of the entity coherence scores, if any entity exists.
    #[must_use]
    pub fn mean_coherence(&self) -> Option<f64> {
        mean(self.entities.iter().map(|entity| entity.coherence))
    }

    /// Arithmetic mean of the entity reversion gains, if any entity exists.
    #[must_use]
    pub fn mean_gain(&self) -> Option<f64> {
        mean(self.entities.iter().map(|entity| entity.gain))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

/// Destination that receives telemetry records in ascending frame order.
pub trait TelemetrySink {
    /// Error raised when the record cannot be persisted.
    type Error;

    /// Appends a completed record to the sink.
    fn push_record(&mut self, record: TelemetryRecord) -> Result<(), Self::Error>;
}

impl TelemetrySink for Vec<TelemetryRecord> {
    type Error = Infallible;

    fn push_record(&mut self, record: TelemetryRecord) -> Result<(), Self::Error> {
        self.push(record);
        Ok(())
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    type Error = S::Error;

    fn push_record(&mut self, record: TelemetryRecord) -> Result<(), Self::Error> {
        (**self).push_record(record)
    }
}

/// Identifies which noise oracle implementation serves a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// One-qubit circuit executed on the owned simulator backend.
    #[default]
    Simulator,
    /// Classical uniform draw in `[-0.1, 0.1]`.
    Classical,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulator => write!(f, "simulator"),
            Self::Classical => write!(f, "classical"),
        }
    }
}

/// External capability that supplies a bounded stochastic perturbation.
///
/// Implementations must never panic; failures collapse to `0.0`.
pub trait NoiseOracle {
    /// Samples a perturbation for the provided phase parameter.
    fn sample(&mut self, phase: f64) -> f64;

    /// Reports which implementation backs the oracle.
    fn kind(&self) -> OracleKind;
}

impl<O: NoiseOracle + ?Sized> NoiseOracle for &mut O {
    fn sample(&mut self, phase: f64) -> f64 {
        (**self).sample(phase)
    }

    fn kind(&self) -> OracleKind {
        (**self).kind()
    }
}

impl<O: NoiseOracle + ?Sized> NoiseOracle for Box<O> {
    fn sample(&mut self, phase: f64) -> f64 {
        (**self).sample(phase)
    }

    fn kind(&self) -> OracleKind {
        (**self).kind()
    }
}

/// Maps a perturbation magnitude and a chaos level to a damping gain.
///
/// Implementations must return a finite positive value for all finite inputs.
pub trait GainEngine {
    /// Computes the gain applied to `perturbation` under the given chaos level.
    fn gain(&self, perturbation: f64, chaos: f64) -> f64;
}

impl<G: GainEngine + ?Sized> GainEngine for &G {
    fn gain(&self, perturbation: f64, chaos: f64) -> f64 {
        (**self).gain(perturbation, chaos)
    }
}

impl<G: GainEngine + ?Sized> GainEngine for Box<G> {
    fn gain(&self, perturbation: f64, chaos: f64) -> f64 {
        (**self).gain(perturbation, chaos)
    }
}

/// Source of the per-entity perturbation draws.
pub trait PerturbationSource {
    /// Draws a value uniformly from `[0, upper)`; returns `0.0` when `upper` is zero.
    fn sample(&mut self, upper: f64) -> f64;
}

impl<P: PerturbationSource + ?Sized> PerturbationSource for &mut P {
    fn sample(&mut self, upper: f64) -> f64 {
        (**self).sample(upper)
    }
}

/// Derives an independent seed for a named random stream from the run seed.
#[must_use]
pub fn derive_stream_seed(run_seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

/// Value that failed the data-quality guard for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectedField {
    /// Raw chaos level.
    ChaosRaw,
    /// Clamped chaos level.
    ChaosClamped,
    /// Ambient vibrational noise.
    AmbientNoise,
    /// Oracle perturbation.
    OracleFlux,
    /// Projected x coordinate.
    X,
    /// Projected y coordinate.
    Y,
    /// Projected z coordinate.
    Z,
    /// Coherence score.
    Coherence,
    /// Reversion gain; also raised for non-positive gains.
    Gain,
    /// Restoring torque.
    Torque,
}

/// Describes a frame withheld from the output because of a non-finite value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRejection {
    /// Index of the rejected frame.
    pub frame_index: usize,
    /// Entity that produced the value, or `None` for frame scalars.
    pub entity: Option<usize>,
    /// Field that failed validation.
    pub field: RejectedField,
}

/// Summary of per-frame mean coherence across a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoherenceSummary {
    /// Mean of the per-frame mean coherence values.
    pub mean: f64,
    /// Lowest per-frame mean coherence.
    pub min: f64,
    /// Highest per-frame mean coherence.
    pub max: f64,
}

/// Commutative accumulator over per-frame mean coherence values.
///
/// Partial accumulators can be merged in any order, which keeps frame-parallel
/// reductions equivalent to the sequential fold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoherenceAccumulator {
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl CoherenceAccumulator {
    /// Folds one frame's mean coherence into the accumulator.
    pub fn record(&mut self, frame_mean: f64) {
        self.sum += frame_mean;
        self.count += 1;
        self.min = Some(self.min.map_or(frame_mean, |min| min.min(frame_mean)));
        self.max = Some(self.max.map_or(frame_mean, |max| max.max(frame_mean)));
    }

    /// Combines two partial accumulators.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
            min: combine(self.min, other.min, f64::min),
            max: combine(self.max, other.max, f64::max),
        }
    }

    /// Number of frames folded so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.count
    }

    /// Finalizes the accumulator, returning `None` when no frame was recorded.
    #[must_use]
    pub fn summary(&self) -> Option<CoherenceSummary> {
        let (min, max) = (self.min?, self.max?);
        if self.count == 0 {
            return None;
        }
        Some(CoherenceSummary {
            mean: self.sum / self.count as f64,
            min,
            max,
        })
    }
}

fn combine(left: Option<f64>, right: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (left, right) {
        (Some(left), Some(right)) => Some(pick(left, right)),
        (value, None) | (None, value) => value,
    }
}

/// Statistics accumulated over a run and finalized after the last frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Number of frames in which the phoenix clamp engaged.
    pub phoenix_trigger_count: usize,
    /// Number of frames appended to the output.
    pub frames_recorded: usize,
    /// Coherence summary over recorded frames, absent when none were recorded.
    pub coherence: Option<CoherenceSummary>,
    /// Frames withheld because of data-quality violations.
    pub rejected_frames: Vec<FrameRejection>,
}

impl RunStatistics {
    /// Mean of the per-frame mean coherence values.
    #[must_use]
    pub fn coherence_mean(&self) -> Option<f64> {
        self.coherence.map(|summary| summary.mean)
    }

    /// Lowest per-frame mean coherence.
    #[must_use]
    pub fn coherence_min(&self) -> Option<f64> {
        self.coherence.map(|summary| summary.min)
    }

    /// Highest per-frame mean coherence.
    #[must_use]
    pub fn coherence_max(&self) -> Option<f64> {
        self.coherence.map(|summary| summary.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entity_count: usize, frame_count: usize) -> ConfigParams {
        ConfigParams {
            entity_count,
            frame_count,
            ..ConfigParams::default()
        }
    }

    #[test]
    fn default_params_validate() {
        let config = SimulationConfig::new(ConfigParams::default()).expect("defaults are valid");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.entity_count(), 120);
        assert_eq!(config.frame_count(), 1_000);
        assert!(config.reversion_enabled());
    }

    #[test]
    fn zero_entities_are_rejected() {
        assert_eq!(
            SimulationConfig::new(params(0, 10)),
            Err(ConfigError::NoEntities)
        );
    }

    #[test]
    fn zero_frames_are_rejected() {
        assert_eq!(
            SimulationConfig::new(params(3, 0)),
            Err(ConfigError::NoFrames)
        );
    }

    #[test]
    fn non_positive_radii_are_rejected() {
        let mut raw = params(3, 3);
        raw.minor_radius = 0.0;
        assert!(matches!(
            SimulationConfig::new(raw),
            Err(ConfigError::NonPositive {
                field: ConfigField::MinorRadius,
                ..
            })
        ));

        raw.minor_radius = 2.5;
        raw.major_radius = f64::NAN;
        assert!(matches!(
            SimulationConfig::new(raw),
            Err(ConfigError::NonPositive {
                field: ConfigField::MajorRadius,
                ..
            })
        ));
    }

    #[test]
    fn toml_deserialization_runs_validation() {
        let parsed: SimulationConfig =
            toml::from_str("entity_count = 4\nframe_count = 9\n").expect("valid document");
        assert_eq!(parsed.entity_count(), 4);
        assert_eq!(parsed.frame_count(), 9);
        assert!((parsed.major_radius() - DEFAULT_MAJOR_RADIUS).abs() < f64::EPSILON);

        let rejected = toml::from_str::<SimulationConfig>("entity_count = 0\n");
        assert!(rejected.is_err());
    }

    #[test]
    fn offsets_partition_the_circle() {
        let offsets = entity_offsets(4);
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], 0.0);
        for (index, offset) in offsets.iter().enumerate() {
            assert_eq!(*offset, index as f64 * TAU / 4.0);
        }
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(offsets.iter().all(|offset| *offset < TAU));
        assert!(entity_offsets(0).is_empty());
    }

    #[test]
    fn frame_time_scales_by_time_step() {
        assert_eq!(frame_time(0), 0.0);
        assert!((frame_time(20) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stream_seeds_are_stable_and_distinct() {
        let oracle = derive_stream_seed(7, RNG_STREAM_ORACLE);
        assert_eq!(oracle, derive_stream_seed(7, RNG_STREAM_ORACLE));
        assert_ne!(oracle, derive_stream_seed(7, RNG_STREAM_PERTURBATION));
        assert_ne!(oracle, derive_stream_seed(8, RNG_STREAM_ORACLE));
    }

    #[test]
    fn accumulator_merge_is_order_independent() {
        let values = [0.91, 0.97, 1.0, 0.88];
        let mut sequential = CoherenceAccumulator::default();
        for value in values {
            sequential.record(value);
        }

        let mut left = CoherenceAccumulator::default();
        left.record(values[2]);
        left.record(values[3]);
        let mut right = CoherenceAccumulator::default();
        right.record(values[0]);
        right.record(values[1]);

        let merged = left.merge(right);
        let swapped = right.merge(left);
        assert_eq!(merged.summary(), swapped.summary());

        let expected = sequential.summary().expect("frames recorded");
        let actual = merged.summary().expect("frames recorded");
        assert!((expected.mean - actual.mean).abs() < 1e-12);
        assert_eq!(expected.min, 0.88);
        assert_eq!(actual.max, 1.0);
        assert_eq!(merged.frames(), 4);
    }

    #[test]
    fn empty_accumulator_has_no_summary() {
        let empty = CoherenceAccumulator::default();
        assert!(empty.summary().is_none());
        assert_eq!(empty.merge(empty).frames(), 0);
    }

    #[test]
    fn record_means_cover_entities() {
        let entity = |coherence, gain| EntityFrameRecord {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            coherence,
            gain,
            torque: 0.0,
        };
        let record = TelemetryRecord {
            frame: FrameState {
                frame_index: 0,
                time: 0.0,
                chaos_raw: 0.0,
                chaos_clamped: 0.0,
                ambient_noise: 0.0,
                oracle_flux: 0.0,
            },
            entities: vec![entity(1.0, 1.0), entity(0.5, 2.0)],
        };
        assert_eq!(record.entity_count(), 2);
        assert_eq!(record.mean_coherence(), Some(0.75));
        assert_eq!(record.mean_gain(), Some(1.5));
    }

    #[test]
    fn vec_sink_collects_records_in_order() {
        let mut sink: Vec<TelemetryRecord> = Vec::new();
        for frame_index in 0..3 {
            let record = TelemetryRecord {
                frame: FrameState {
                    frame_index,
                    time: frame_time(frame_index),
                    chaos_raw: 0.0,
                    chaos_clamped: 0.0,
                    ambient_noise: 0.0,
                    oracle_flux: 0.0,
                },
                entities: Vec::new(),
            };
            match sink.push_record(record) {
                Ok(()) => {}
                Err(never) => match never {},
            }
        }
        let indices: Vec<usize> = sink.iter().map(|record| record.frame.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
