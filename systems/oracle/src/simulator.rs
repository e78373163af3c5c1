use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

const NORM_TOLERANCE: f64 = 1e-9;

/// Single-qubit operation supported by the simulator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gate {
    /// Equal-superposition operation.
    Hadamard,
    /// Phase rotation about the Z axis by the contained angle in radians.
    Rz(f64),
    /// Computational-basis measurement; must terminate the circuit.
    Measure,
}

/// Ordered list of gates applied to a qubit prepared in `|0⟩`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circuit {
    gates: Vec<Gate>,
}

impl Circuit {
    /// Creates an empty circuit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a Hadamard gate.
    #[must_use]
    pub fn hadamard(mut self) -> Self {
        self.gates.push(Gate::Hadamard);
        self
    }

    /// Appends a Z rotation by `theta` radians.
    #[must_use]
    pub fn rz(mut self, theta: f64) -> Self {
        self.gates.push(Gate::Rz(theta));
        self
    }

    /// Appends the terminal measurement.
    #[must_use]
    pub fn measure(mut self) -> Self {
        self.gates.push(Gate::Measure);
        self
    }

    /// Gates in application order.
    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }
}

/// Failures raised while executing a circuit.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SimulatorError {
    /// At least one shot is required.
    #[error("circuit must be executed for at least one shot")]
    NoShots,
    /// The circuit never measures the qubit.
    #[error("circuit has no terminal measurement")]
    MissingMeasurement,
    /// A gate follows the measurement.
    #[error("gate at position {position} follows the measurement")]
    GateAfterMeasurement {
        /// Index of the offending gate.
        position: usize,
    },
    /// A rotation angle was NaN or infinite.
    #[error("rotation angle {angle} is not finite")]
    NonFiniteAngle {
        /// Rejected angle.
        angle: f64,
    },
    /// The state vector drifted away from unit norm.
    #[error("state vector norm drifted to {norm}")]
    NormalisationLost {
        /// Squared norm observed after the offending gate.
        norm: f64,
    },
}

/// State-vector simulator for a single qubit.
///
/// The simulator owns its measurement random stream. It is created by the
/// caller and lent to oracles for the duration of a run.
#[derive(Debug)]
pub struct QubitSimulator {
    rng: ChaCha8Rng,
}

impl QubitSimulator {
    /// Creates a simulator whose measurement outcomes derive from `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Executes `circuit` for `shots` trials and returns the measured bits.
    pub fn run(&mut self, circuit: &Circuit, shots: u32) -> Result<Vec<u8>, SimulatorError> {
        if shots == 0 {
            return Err(SimulatorError::NoShots);
        }

        let probability_zero = evolve(circuit.gates())?;
        let outcomes = (0..shots)
            .map(|_| {
                if self.rng.gen::<f64>() < probability_zero {
                    0
                } else {
                    1
                }
            })
            .collect();
        Ok(outcomes)
    }
}

/// Applies every gate to `|0⟩` and returns the probability of measuring `0`.
fn evolve(gates: &[Gate]) -> Result<f64, SimulatorError> {
    let mut state = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
    let mut measured = false;

    for (position, gate) in gates.iter().enumerate() {
        if measured {
            return Err(SimulatorError::GateAfterMeasurement { position });
        }

        match *gate {
            Gate::Hadamard => {
                let [zero, one] = state;
                state = [(zero + one) * FRAC_1_SQRT_2, (zero - one) * FRAC_1_SQRT_2];
            }
            Gate::Rz(angle) => {
                if !angle.is_finite() {
                    return Err(SimulatorError::NonFiniteAngle { angle });
                }
                let half = angle / 2.0;
                state[0] *= Complex64::from_polar(1.0, -half);
                state[1] *= Complex64::from_polar(1.0, half);
            }
            Gate::Measure => measured = true,
        }

        let norm = state[0].norm_sqr() + state[1].norm_sqr();
        if !norm.is_finite() || (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(SimulatorError::NormalisationLost { norm });
        }
    }

    if !measured {
        return Err(SimulatorError::MissingMeasurement);
    }

    Ok(state[0].norm_sqr())
}
