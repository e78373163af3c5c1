#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Telemetry engine orchestrating the chaos, oracle, reversion and coherence
//! systems into one record per frame.
//!
//! Frames are produced in ascending order. Within a frame every entity depends
//! only on its own offset and the frame's shared scalars. Frames containing a
//! non-finite value, or a non-positive gain, are withheld from the output and
//! reported through [`RunStatistics::rejected_frames`].

use harpia_core::{
    frame_time, CoherenceAccumulator, EntityFrameRecord, FrameRejection, FrameState, GainEngine,
    NoiseOracle, PerturbationSource, RejectedField, RunStatistics, SimulationConfig,
    TelemetryRecord, TelemetrySink, PHI,
};
use harpia_system_chaos::{ambient_noise, ChaosEscalator, PhoenixClamp};
use harpia_system_coherence::CoherenceFilter;
use harpia_system_reversion::torque;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

const FLUX_PERTURBATION_WEIGHT: f64 = 0.1;
const PERTURBATION_NOISE_WEIGHT: f64 = 0.08;
const FLUX_NOISE_WEIGHT: f64 = 0.02;

/// Perturbation source drawing `upper * U[0, 1)` from a seeded ChaCha stream.
#[derive(Debug)]
pub struct SeededPerturbation {
    rng: ChaCha8Rng,
}

impl SeededPerturbation {
    /// Creates a source whose draws derive from `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PerturbationSource for SeededPerturbation {
    fn sample(&mut self, upper: f64) -> f64 {
        upper * self.rng.gen::<f64>()
    }
}

/// Records and statistics collected by [`TelemetryEngine::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryRun {
    /// Accepted records in ascending frame order.
    pub records: Vec<TelemetryRecord>,
    /// Finalized run statistics.
    pub statistics: RunStatistics,
}

/// Per-frame, per-entity telemetry generator.
#[derive(Debug)]
pub struct TelemetryEngine<O, G, P> {
    config: SimulationConfig,
    offsets: Vec<f64>,
    escalator: ChaosEscalator,
    clamp: PhoenixClamp,
    filter: CoherenceFilter,
    oracle: O,
    gain: G,
    perturbation: P,
}

impl<O, G, P> TelemetryEngine<O, G, P>
where
    O: NoiseOracle,
    G: GainEngine,
    P: PerturbationSource,
{
    /// Wires the injected capabilities to a validated configuration.
    #[must_use]
    pub fn new(config: SimulationConfig, oracle: O, gain: G, perturbation: P) -> Self {
        Self {
            offsets: config.offsets(),
            config,
            escalator: ChaosEscalator,
            clamp: PhoenixClamp::default(),
            filter: CoherenceFilter::default(),
            oracle,
            gain,
            perturbation,
        }
    }

    /// Configuration driving the run.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generates every frame and collects the accepted records in memory.
    #[must_use]
    pub fn run(self) -> TelemetryRun {
        let mut records = Vec::with_capacity(self.config.frame_count());
        let statistics = match self.run_into(&mut records) {
            Ok(statistics) => statistics,
            Err(never) => match never {},
        };
        TelemetryRun {
            records,
            statistics,
        }
    }

    /// Generates every frame, streaming accepted records into `sink`.
    ///
    /// Sink failures abort the run; numeric problems never do.
    pub fn run_into<S>(mut self, mut sink: S) -> Result<RunStatistics, S::Error>
    where
        S: TelemetrySink,
    {
        let frame_count = self.config.frame_count();
        info!(
            entities = self.config.entity_count(),
            frames = frame_count,
            oracle = %self.oracle.kind(),
            reversion = self.config.reversion_enabled(),
            "starting telemetry run"
        );

        let mut triggers = 0;
        let mut coherence = CoherenceAccumulator::default();
        let mut rejected_frames = Vec::new();

        for frame_index in 0..frame_count {
            let (triggered, outcome) = self.compute_frame(frame_index);
            if triggered {
                triggers += 1;
            }

            match outcome {
                Ok(record) => {
                    if let Some(frame_mean) = record.mean_coherence() {
                        coherence.record(frame_mean);
                        debug!(
                            frame = frame_index,
                            chaos = record.frame.chaos_clamped,
                            triggered,
                            mean_coherence = frame_mean,
                            "frame recorded"
                        );
                    }
                    sink.push_record(record)?;
                }
                Err(rejection) => {
                    warn!(
                        frame = rejection.frame_index,
                        entity = ?rejection.entity,
                        field = ?rejection.field,
                        "withholding frame with invalid telemetry"
                    );
                    rejected_frames.push(rejection);
                }
            }
        }

        let statistics = RunStatistics {
            phoenix_trigger_count: triggers,
            frames_recorded: coherence.frames(),
            coherence: coherence.summary(),
            rejected_frames,
        };
        info!(
            phoenix_triggers = statistics.phoenix_trigger_count,
            frames_recorded = statistics.frames_recorded,
            rejected = statistics.rejected_frames.len(),
            coherence_mean = ?statistics.coherence_mean(),
            "telemetry run finished"
        );
        Ok(statistics)
    }

    /// Computes one frame, returning whether the phoenix clamp engaged and
    /// either the assembled record or the reason it was withheld.
    fn compute_frame(
        &mut self,
        frame_index: usize,
    ) -> (bool, Result<TelemetryRecord, FrameRejection>) {
        let time = frame_time(frame_index);
        let flux = self.oracle.sample(time);

        let chaos_raw = self
            .escalator
            .escalate(frame_index, self.config.frame_count());
        let clamped = self.clamp.clamp(chaos_raw);
        let chaos = clamped.chaos;
        let ambient = ambient_noise(frame_index);

        let frame = FrameState {
            frame_index,
            time,
            chaos_raw,
            chaos_clamped: chaos,
            ambient_noise: ambient,
            oracle_flux: flux,
        };
        if let Err(field) = check_frame(&frame) {
            // Consume this frame's draws so later frames see the same stream.
            for _ in 0..self.offsets.len() {
                let _ = self.perturbation.sample(chaos);
            }
            return (
                clamped.triggered,
                Err(FrameRejection {
                    frame_index,
                    entity: None,
                    field,
                }),
            );
        }

        let major_radius = self.config.major_radius();
        let minor_radius = self.config.minor_radius();
        let flatten = self.config.flatten_factor();

        let mut entities = Vec::with_capacity(self.offsets.len());
        let mut first_rejection = None;
        for (entity, offset) in self.offsets.iter().enumerate() {
            let perturbation =
                self.perturbation.sample(chaos) + FLUX_PERTURBATION_WEIGHT * flux;
            let gain = self.gain.gain(perturbation, -chaos);
            let torque = torque(perturbation, gain);

            let ideal_phase = PHI * time + offset + (perturbation + torque);
            let noise =
                ambient + PERTURBATION_NOISE_WEIGHT * perturbation + FLUX_NOISE_WEIGHT * flux;
            let outcome = self
                .filter
                .filter(frame_index, ideal_phase, noise, minor_radius);

            let radial = major_radius + outcome.radius * time.cos();
            let record = EntityFrameRecord {
                x: radial * outcome.phase.cos(),
                y: radial * outcome.phase.sin(),
                z: outcome.radius * flatten * time.sin(),
                coherence: outcome.coherence,
                gain,
                torque,
            };

            if first_rejection.is_none() {
                if let Err(field) = check_entity(&record) {
                    first_rejection = Some(FrameRejection {
                        frame_index,
                        entity: Some(entity),
                        field,
                    });
                }
            }
            entities.push(record);
        }

        let outcome = match first_rejection {
            Some(rejection) => Err(rejection),
            None => Ok(TelemetryRecord { frame, entities }),
        };
        (clamped.triggered, outcome)
    }
}

fn check_frame(frame: &FrameState) -> Result<(), RejectedField> {
    ensure_finite(frame.chaos_raw, RejectedField::ChaosRaw)?;
    ensure_finite(frame.chaos_clamped, RejectedField::ChaosClamped)?;
    ensure_finite(frame.ambient_noise, RejectedField::AmbientNoise)?;
    ensure_finite(frame.oracle_flux, RejectedField::OracleFlux)
}

fn check_entity(record: &EntityFrameRecord) -> Result<(), RejectedField> {
    if !(record.gain.is_finite() && record.gain > 0.0) {
        return Err(RejectedField::Gain);
    }
    ensure_finite(record.torque, RejectedField::Torque)?;
    ensure_finite(record.coherence, RejectedField::Coherence)?;
    ensure_finite(record.x, RejectedField::X)?;
    ensure_finite(record.y, RejectedField::Y)?;
    ensure_finite(record.z, RejectedField::Z)
}

fn ensure_finite(value: f64, field: RejectedField) -> Result<(), RejectedField> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(field)
    }
}
