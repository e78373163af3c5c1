#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reversion gain engines mapping a perturbation and a chaos level to the
//! damping gain that scales the restoring torque.

use std::fmt;

use harpia_core::{GainEngine, SimulationConfig};

/// Coefficients of the documented reversion formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReversionTuning {
    /// Exponential decay applied to `|perturbation|` in the base gain.
    pub base_decay: f64,
    /// Weight of `tanh(chaos)` in the symbiotic amplifier.
    pub amplifier_weight: f64,
    /// Weight of `exp(-|chaos|)` in the saturation boost.
    pub boost_weight: f64,
}

impl Default for ReversionTuning {
    fn default() -> Self {
        Self {
            base_decay: 0.15,
            amplifier_weight: 0.9,
            boost_weight: 0.1,
        }
    }
}

/// Documented reversion formula used whenever shielding is enabled and no
/// alternative engine was injected.
///
/// ```text
/// base      = exp(-0.15 * |p|)
/// amplifier = 1 + 0.9 * tanh(c)
/// boost     = 1 + 0.1 * exp(-|c|)
/// gain      = base * amplifier * boost
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReversionGain {
    tuning: ReversionTuning,
}

impl ReversionGain {
    /// Creates the engine from explicit coefficients.
    #[must_use]
    pub const fn new(tuning: ReversionTuning) -> Self {
        Self { tuning }
    }

    /// Coefficients in use.
    #[must_use]
    pub const fn tuning(&self) -> &ReversionTuning {
        &self.tuning
    }
}

impl GainEngine for ReversionGain {
    fn gain(&self, perturbation: f64, chaos: f64) -> f64 {
        let base = (-self.tuning.base_decay * perturbation.abs()).exp();
        let amplifier = 1.0 + self.tuning.amplifier_weight * chaos.tanh();
        let boost = 1.0 + self.tuning.boost_weight * (-chaos.abs()).exp();
        base * amplifier * boost
    }
}

/// Unshielded damping used when reversion is disabled: `exp(-0.5 * |p|)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassiveDamping {
    decay: f64,
}

impl Default for PassiveDamping {
    fn default() -> Self {
        Self { decay: 0.5 }
    }
}

impl GainEngine for PassiveDamping {
    fn gain(&self, perturbation: f64, _chaos: f64) -> f64 {
        (-self.decay * perturbation.abs()).exp()
    }
}

/// Restoring torque opposing `perturbation`, scaled by `gain`.
#[must_use]
pub fn torque(perturbation: f64, gain: f64) -> f64 {
    -perturbation * gain
}

/// Alternative gain engine supplied by the caller.
pub type CustomGain = Box<dyn GainEngine + Send + Sync>;

/// Gain engine resolved once at construction.
pub enum GainSelection {
    /// Reversion disabled; perturbations are only passively damped.
    Passive(PassiveDamping),
    /// Documented reversion formula.
    Reversion(ReversionGain),
    /// Caller-provided engine replacing the documented formula.
    Custom(CustomGain),
}

impl GainSelection {
    /// Chooses the engine for a run.
    ///
    /// Disabled reversion always selects [`PassiveDamping`]. Otherwise the
    /// injected engine wins, and its absence selects [`ReversionGain`].
    #[must_use]
    pub fn resolve(config: &SimulationConfig, custom: Option<CustomGain>) -> Self {
        if !config.reversion_enabled() {
            return Self::Passive(PassiveDamping::default());
        }
        match custom {
            Some(engine) => Self::Custom(engine),
            None => Self::Reversion(ReversionGain::default()),
        }
    }

    /// Short label describing the selected engine.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passive(_) => "passive",
            Self::Reversion(_) => "reversion",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for GainSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passive(engine) => f.debug_tuple("Passive").field(engine).finish(),
            Self::Reversion(engine) => f.debug_tuple("Reversion").field(engine).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl GainEngine for GainSelection {
    fn gain(&self, perturbation: f64, chaos: f64) -> f64 {
        match self {
            Self::Passive(engine) => engine.gain(perturbation, chaos),
            Self::Reversion(engine) => engine.gain(perturbation, chaos),
            Self::Custom(engine) => engine.gain(perturbation, chaos),
        }
    }
}
