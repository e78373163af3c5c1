#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-layer coherence filter (the "Delta-Phi" operator).
//!
//! Each call turns an ideal phase plus raw noise into a realized phase, a
//! dynamic tube radius and a coherence score in `(0, 1]`:
//!
//! 1. spike attenuation: `f = n * exp(-0.3 |n|)`;
//! 2. φ-resonant damping: `d = 0.5 + 0.2 cos(frame / φ)`, within `[0.3, 0.7]`;
//! 3. short-term coherence `exp(-d |f|)` and long-term coherence `exp(-0.2 |f|)`;
//! 4. `S = 0.7 long + 0.3 short`;
//! 5. `phase = ideal + f (1 - S) 0.2`;
//! 6. `radius = r (1 + (1 - S) 0.02 sin(frame / φ))`.
//!
//! The output is a pure function of the inputs; zero noise is an identity
//! pass-through.

use harpia_core::PHI;

/// Weights and rates of the filter layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoherenceTuning {
    /// Decay used to attenuate large noise spikes.
    pub spike_attenuation: f64,
    /// Midpoint of the φ-resonant damping oscillation.
    pub damping_center: f64,
    /// Amplitude of the φ-resonant damping oscillation.
    pub damping_amplitude: f64,
    /// Decay of the long-term coherence component.
    pub long_term_decay: f64,
    /// Share of the long-term component in the blended score.
    pub long_term_weight: f64,
    /// Share of the short-term component in the blended score.
    pub short_term_weight: f64,
    /// Fraction of the residual noise leaking into the realized phase.
    pub phase_leak: f64,
    /// Amplitude of the geodesic radius distortion.
    pub radius_distortion: f64,
}

impl Default for CoherenceTuning {
    fn default() -> Self {
        Self {
            spike_attenuation: 0.3,
            damping_center: 0.5,
            damping_amplitude: 0.2,
            long_term_decay: 0.2,
            long_term_weight: 0.7,
            short_term_weight: 0.3,
            phase_leak: 0.2,
            radius_distortion: 0.02,
        }
    }
}

/// Realized phase, radius and coherence produced for one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoherenceOutcome {
    /// Realized phase in radians.
    pub phase: f64,
    /// Dynamic tube radius.
    pub radius: f64,
    /// Coherence score in `(0, 1]`.
    pub coherence: f64,
}

/// Deterministic filter converting ideal phase and noise into a realized state.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoherenceFilter {
    tuning: CoherenceTuning,
}

impl CoherenceFilter {
    /// Creates a filter from explicit layer coefficients.
    #[must_use]
    pub const fn new(tuning: CoherenceTuning) -> Self {
        Self { tuning }
    }

    /// Oscillating damping factor for `frame_index`, period `2πφ` frames.
    #[must_use]
    pub fn damping_factor(&self, frame_index: usize) -> f64 {
        let tuning = &self.tuning;
        tuning.damping_center + tuning.damping_amplitude * resonant_angle(frame_index).cos()
    }

    /// Runs every filter layer in order.
    #[must_use]
    pub fn filter(
        &self,
        frame_index: usize,
        ideal_phase: f64,
        raw_noise: f64,
        base_minor_radius: f64,
    ) -> CoherenceOutcome {
        let tuning = &self.tuning;

        let filtered = raw_noise * (-tuning.spike_attenuation * raw_noise.abs()).exp();
        let magnitude = filtered.abs();

        let short_term = (-self.damping_factor(frame_index) * magnitude).exp();
        let long_term = (-tuning.long_term_decay * magnitude).exp();
        let coherence = tuning.long_term_weight * long_term + tuning.short_term_weight * short_term;

        let decoherence = 1.0 - coherence;
        let phase = ideal_phase + filtered * decoherence * tuning.phase_leak;
        let radius = base_minor_radius
            * (1.0 + decoherence * tuning.radius_distortion * resonant_angle(frame_index).sin());

        CoherenceOutcome {
            phase,
            radius,
            coherence,
        }
    }
}

fn resonant_angle(frame_index: usize) -> f64 {
    frame_index as f64 / PHI
}
