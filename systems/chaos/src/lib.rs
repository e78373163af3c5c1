#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure chaos systems: the per-frame escalation ramp, the phoenix clamp that
//! bounds it, and the ambient vibrational burst injected mid-run.

use harpia_core::CRITICAL_THRESHOLD;

const CHAOS_CEILING: f64 = 10.0;
const PHOENIX_DAMPING: f64 = 0.95;

const BURST_FIRST_EXCLUDED_FRAME: usize = 50;
const BURST_LAST_EXCLUDED_FRAME: usize = 150;
const BURST_AMPLITUDE: f64 = 0.25;
const BURST_FREQUENCY: f64 = 0.5;

/// Produces the monotonic chaos ramp.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChaosEscalator;

impl ChaosEscalator {
    /// Computes `(frame_index / frame_count) * 10`.
    ///
    /// Callers guarantee `frame_count > 0`; configuration validation enforces it.
    #[must_use]
    pub fn escalate(&self, frame_index: usize, frame_count: usize) -> f64 {
        debug_assert!(frame_count > 0, "frame_count must be validated upstream");
        (frame_index as f64 / frame_count as f64) * CHAOS_CEILING
    }
}

/// Result of passing a chaos level through the phoenix clamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampOutcome {
    /// Whether the threshold was reached.
    pub triggered: bool,
    /// Chaos level handed to the rest of the frame.
    pub chaos: f64,
}

/// Hard threshold clamp that replaces escalating chaos with a fixed damped value.
#[derive(Clone, Copy, Debug)]
pub struct PhoenixClamp {
    threshold: f64,
}

impl Default for PhoenixClamp {
    fn default() -> Self {
        Self::new(CRITICAL_THRESHOLD)
    }
}

impl PhoenixClamp {
    /// Creates a clamp engaging at the provided threshold.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Threshold at which the clamp engages.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns `threshold * 0.95` once `chaos_raw` reaches the threshold and
    /// passes the value through unchanged otherwise.
    ///
    /// The damped value does not depend on how far past the threshold the
    /// input lies.
    #[must_use]
    pub fn clamp(&self, chaos_raw: f64) -> ClampOutcome {
        if chaos_raw >= self.threshold {
            ClampOutcome {
                triggered: true,
                chaos: self.threshold * PHOENIX_DAMPING,
            }
        } else {
            ClampOutcome {
                triggered: false,
                chaos: chaos_raw,
            }
        }
    }
}

/// Ambient noise injected strictly between frames 50 and 150, zero elsewhere.
#[must_use]
pub fn ambient_noise(frame_index: usize) -> f64 {
    if frame_index > BURST_FIRST_EXCLUDED_FRAME && frame_index < BURST_LAST_EXCLUDED_FRAME {
        BURST_AMPLITUDE * (BURST_FREQUENCY * frame_index as f64).sin()
    } else {
        0.0
    }
}
