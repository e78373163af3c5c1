#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Noise oracles supplying the bounded per-frame flux.
//!
//! Two interchangeable implementations exist. [`SimulatorOracle`] runs a
//! one-qubit circuit (superposition, phase rotation, measurement) on a
//! caller-owned [`QubitSimulator`] and maps the collapsed bit to `±0.05`.
//! [`ClassicalOracle`] draws uniformly from `[-0.1, 0.1]`. Neither provides
//! cryptographic or physically grounded randomness. The variant is chosen once
//! per run through [`SelectedOracle::select`].

mod simulator;

use harpia_core::{NoiseOracle, OracleKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

pub use simulator::{Circuit, Gate, QubitSimulator, SimulatorError};

/// Flux produced when the measured qubit collapses to `1`.
pub const SIMULATOR_FLUX: f64 = 0.05;

/// Half-width of the classical fallback's uniform interval.
pub const CLASSICAL_BOUND: f64 = 0.1;

/// Oracle backed by a single-shot circuit on the borrowed simulator.
#[derive(Debug)]
pub struct SimulatorOracle<'backend> {
    backend: &'backend mut QubitSimulator,
}

impl<'backend> SimulatorOracle<'backend> {
    /// Lends the simulator to the oracle for the lifetime of the run.
    #[must_use]
    pub fn new(backend: &'backend mut QubitSimulator) -> Self {
        Self { backend }
    }
}

impl NoiseOracle for SimulatorOracle<'_> {
    fn sample(&mut self, phase: f64) -> f64 {
        let circuit = Circuit::new().hadamard().rz(phase).measure();
        match self.backend.run(&circuit, 1) {
            Ok(bits) => match bits.first() {
                Some(0) => -SIMULATOR_FLUX,
                Some(_) => SIMULATOR_FLUX,
                None => 0.0,
            },
            Err(error) => {
                warn!(%error, phase, "simulator oracle failed, substituting neutral flux");
                0.0
            }
        }
    }

    fn kind(&self) -> OracleKind {
        OracleKind::Simulator
    }
}

/// Pseudo-random fallback oracle drawing from `[-0.1, 0.1]`.
#[derive(Debug)]
pub struct ClassicalOracle {
    rng: ChaCha8Rng,
}

impl ClassicalOracle {
    /// Creates an oracle whose draws derive from `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl NoiseOracle for ClassicalOracle {
    fn sample(&mut self, _phase: f64) -> f64 {
        -CLASSICAL_BOUND + 2.0 * CLASSICAL_BOUND * self.rng.gen::<f64>()
    }

    fn kind(&self) -> OracleKind {
        OracleKind::Classical
    }
}

/// Oracle variant resolved once at the start of a run.
#[derive(Debug)]
pub enum SelectedOracle<'backend> {
    /// Circuit-backed oracle.
    Simulator(SimulatorOracle<'backend>),
    /// Classical fallback oracle.
    Classical(ClassicalOracle),
}

impl<'backend> SelectedOracle<'backend> {
    /// Resolves `kind` into a concrete oracle.
    ///
    /// The simulator is only borrowed when the simulator variant is requested;
    /// `classical_seed` seeds the fallback otherwise.
    #[must_use]
    pub fn select(
        kind: OracleKind,
        backend: &'backend mut QubitSimulator,
        classical_seed: u64,
    ) -> Self {
        match kind {
            OracleKind::Simulator => Self::Simulator(SimulatorOracle::new(backend)),
            OracleKind::Classical => Self::Classical(ClassicalOracle::from_seed(classical_seed)),
        }
    }
}

impl NoiseOracle for SelectedOracle<'_> {
    fn sample(&mut self, phase: f64) -> f64 {
        match self {
            Self::Simulator(oracle) => oracle.sample(phase),
            Self::Classical(oracle) => oracle.sample(phase),
        }
    }

    fn kind(&self) -> OracleKind {
        match self {
            Self::Simulator(oracle) => oracle.kind(),
            Self::Classical(oracle) => oracle.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_oracle_emits_symmetric_kicks() {
        let mut backend = QubitSimulator::from_seed(5);
        let mut oracle = SimulatorOracle::new(&mut backend);
        let samples: Vec<f64> = (0..200).map(|frame| oracle.sample(frame as f64 * 0.05)).collect();

        assert!(samples
            .iter()
            .all(|value| *value == SIMULATOR_FLUX || *value == -SIMULATOR_FLUX));
        assert!(samples.iter().any(|value| *value > 0.0));
        assert!(samples.iter().any(|value| *value < 0.0));
    }

    #[test]
    fn failing_backend_returns_neutral_flux() {
        let mut backend = QubitSimulator::from_seed(5);
        let mut oracle = SimulatorOracle::new(&mut backend);
        assert_eq!(oracle.sample(f64::NAN), 0.0);
        assert_eq!(oracle.sample(f64::INFINITY), 0.0);
    }

    #[test]
    fn classical_oracle_respects_bounds() {
        let mut oracle = ClassicalOracle::from_seed(99);
        for frame in 0..1_000 {
            let value = oracle.sample(frame as f64);
            assert!((-CLASSICAL_BOUND..=CLASSICAL_BOUND).contains(&value));
        }
    }

    #[test]
    fn classical_oracle_is_reproducible_per_seed() {
        let mut first = ClassicalOracle::from_seed(42);
        let mut second = ClassicalOracle::from_seed(42);
        for _ in 0..16 {
            assert_eq!(first.sample(0.0), second.sample(0.0));
        }
    }

    #[test]
    fn selection_honours_requested_kind() {
        let mut backend = QubitSimulator::from_seed(1);
        let selected = SelectedOracle::select(OracleKind::Classical, &mut backend, 7);
        assert_eq!(selected.kind(), OracleKind::Classical);

        let selected = SelectedOracle::select(OracleKind::Simulator, &mut backend, 7);
        assert_eq!(selected.kind(), OracleKind::Simulator);
    }
}
