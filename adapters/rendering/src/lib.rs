#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared replay presentation contracts for Harpia adapters.
//!
//! A [`Presentation`] wraps recorded telemetry and turns any playback index
//! into a [`PlaybackFrame`]: entity markers sized by coherence, trailing
//! paths, a status classification, a rotating camera and HUD text. Backends
//! implementing [`RenderingBackend`] decide how those frames are shown.

use std::{f64::consts::TAU, time::Duration};

use anyhow::Result as AnyResult;
use glam::DVec3;
use harpia_core::{
    FrameState, SimulationConfig, TelemetryRecord, DEFAULT_FLATTEN_FACTOR, DEFAULT_MAJOR_RADIUS,
    DEFAULT_MINOR_RADIUS,
};
use thiserror::Error;

/// Ambient noise magnitude above which a frame is shown as decoherent.
pub const CRITICAL_NOISE: f64 = 0.3;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Linearly blends towards `other`; `amount` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn mix(self, other: Self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let blend = |from: f32, to: f32| from + (to - from) * amount;
        Self {
            red: blend(self.red, other.red),
            green: blend(self.green, other.green),
            blue: blend(self.blue, other.blue),
            alpha: blend(self.alpha, other.alpha),
        }
    }

    /// Returns the color with its alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

const PLASMA_STOPS: [Color; 4] = [
    Color::from_rgb_u8(13, 8, 135),
    Color::from_rgb_u8(156, 23, 158),
    Color::from_rgb_u8(237, 121, 83),
    Color::from_rgb_u8(240, 249, 33),
];

/// Evenly spaced colors along a plasma-like gradient, one per entity.
#[must_use]
pub fn entity_palette(entity_count: usize) -> Vec<Color> {
    if entity_count == 1 {
        return vec![PLASMA_STOPS[0]];
    }
    let segments = (PLASMA_STOPS.len() - 1) as f32;
    (0..entity_count)
        .map(|entity| {
            let position = entity as f32 / (entity_count - 1) as f32 * segments;
            let lower = (position.floor() as usize).min(PLASMA_STOPS.len() - 2);
            PLASMA_STOPS[lower].mix(PLASMA_STOPS[lower + 1], position - lower as f32)
        })
        .collect()
}

/// Torus dimensions used for the static wireframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorusGeometry {
    /// Distance from the torus centre to the tube centre.
    pub major_radius: f64,
    /// Tube radius.
    pub minor_radius: f64,
    /// Vertical compression applied to the tube.
    pub flatten_factor: f64,
}

impl TorusGeometry {
    /// Geometry matching a simulation configuration.
    #[must_use]
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            major_radius: config.major_radius(),
            minor_radius: config.minor_radius(),
            flatten_factor: config.flatten_factor(),
        }
    }
}

impl Default for TorusGeometry {
    fn default() -> Self {
        Self {
            major_radius: DEFAULT_MAJOR_RADIUS,
            minor_radius: DEFAULT_MINOR_RADIUS,
            flatten_factor: DEFAULT_FLATTEN_FACTOR,
        }
    }
}

/// Samples the torus surface on an inclusive `u_steps × v_steps` grid.
///
/// Each inner vector is one meridian ring at fixed `u`. Both angles span
/// `[0, 2π]` with the endpoints included, so the first and last rings
/// coincide and close the mesh.
#[must_use]
pub fn torus_wireframe(
    geometry: &TorusGeometry,
    u_steps: usize,
    v_steps: usize,
) -> Vec<Vec<DVec3>> {
    let angles = |steps: usize| -> Vec<f64> {
        match steps {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => (0..steps)
                .map(|step| TAU * step as f64 / (steps - 1) as f64)
                .collect(),
        }
    };
    let tube_height = geometry.minor_radius * geometry.flatten_factor;

    angles(u_steps)
        .into_iter()
        .map(|u| {
            angles(v_steps)
                .into_iter()
                .map(|v| {
                    let radial = geometry.major_radius + geometry.minor_radius * v.cos();
                    DVec3::new(radial * u.cos(), radial * u.sin(), tube_height * v.sin())
                })
                .collect()
        })
        .collect()
}

/// Visual parameters of one playback mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackStyle {
    /// Number of previous frames drawn behind each marker.
    pub trail: usize,
    /// Marker size at zero coherence.
    pub marker_base: f64,
    /// Additional marker size per unit coherence.
    pub marker_gain: f64,
    /// Marker opacity at zero coherence.
    pub alpha_base: f64,
    /// Additional opacity per unit coherence.
    pub alpha_gain: f64,
    /// Camera azimuth advance per frame, in degrees.
    pub azimuth_per_frame: f64,
    /// Fixed camera elevation, in degrees.
    pub elevation: f64,
    /// Delay between frames for real-time backends.
    pub frame_interval: Duration,
    /// Caption shown under the HUD.
    pub caption: &'static str,
}

impl PlaybackStyle {
    /// Style used when replaying a recorded table.
    #[must_use]
    pub const fn replay() -> Self {
        Self {
            trail: 25,
            marker_base: 6.0,
            marker_gain: 12.0,
            alpha_base: 0.7,
            alpha_gain: 0.3,
            azimuth_per_frame: 0.3,
            elevation: 30.0,
            frame_interval: Duration::from_millis(30),
            caption: "REPLAY MODE - EXTERNAL PLAYER",
        }
    }

    /// Style used right after generating a run.
    #[must_use]
    pub const fn live() -> Self {
        Self {
            trail: 30,
            marker_base: 7.0,
            marker_gain: 10.0,
            alpha_base: 0.8,
            alpha_gain: 0.2,
            azimuth_per_frame: 0.4,
            elevation: 30.0,
            frame_interval: Duration::from_millis(20),
            caption: "LIVE MODE - GENERATED RUN",
        }
    }

    /// Marker size for an entity with coherence `coherence`.
    #[must_use]
    pub fn marker_size(&self, coherence: f64) -> f64 {
        self.marker_base + self.marker_gain * coherence
    }

    /// Marker opacity for an entity with coherence `coherence`.
    #[must_use]
    pub fn marker_alpha(&self, coherence: f64) -> f64 {
        self.alpha_base + self.alpha_gain * coherence
    }

    /// Camera orientation for playback index `index`.
    #[must_use]
    pub fn camera(&self, index: usize) -> Camera {
        Camera {
            elevation: self.elevation,
            azimuth: index as f64 * self.azimuth_per_frame,
        }
    }
}

impl Default for PlaybackStyle {
    fn default() -> Self {
        Self::replay()
    }
}

/// Orbiting camera orientation in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Angle above the equatorial plane.
    pub elevation: f64,
    /// Rotation about the vertical axis.
    pub azimuth: f64,
}

/// Health classification of a recorded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemStatus {
    /// Ambient noise exceeded the critical magnitude.
    CriticalDecoherence,
    /// The phoenix clamp reduced the chaos level.
    PhoenixEngaged,
    /// Neither condition applies.
    Stable,
}

impl SystemStatus {
    /// Classifies a frame, giving critical noise precedence over the clamp.
    #[must_use]
    pub fn classify(frame: &FrameState) -> Self {
        if frame.ambient_noise.abs() > CRITICAL_NOISE {
            Self::CriticalDecoherence
        } else if frame.chaos_clamped < frame.chaos_raw {
            Self::PhoenixEngaged
        } else {
            Self::Stable
        }
    }

    /// HUD label for the status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CriticalDecoherence => "CRITICAL DECOHERENCE",
            Self::PhoenixEngaged => "PHOENIX PROTOCOL ENGAGED",
            Self::Stable => "SYSTEM STABLE (VR SHIELD)",
        }
    }

    /// HUD color for the status.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::CriticalDecoherence => Color::from_rgb_u8(255, 0, 0),
            Self::PhoenixEngaged => Color::from_rgb_u8(255, 165, 0),
            Self::Stable => Color::from_rgb_u8(0, 255, 0),
        }
    }
}

/// Current position and appearance of one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityMarker {
    /// Position on the torus.
    pub position: DVec3,
    /// Marker size derived from coherence.
    pub size: f64,
    /// Marker color, with opacity derived from coherence.
    pub color: Color,
}

/// Everything a backend needs to draw one playback step.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackFrame {
    /// Looped index into the recorded frames.
    pub index: usize,
    /// Number of recorded frames.
    pub total: usize,
    /// Frame index stored in the telemetry row.
    pub frame_index: usize,
    /// Status classification of the row.
    pub status: SystemStatus,
    /// Whether the oracle contributed a non-zero flux.
    pub oracle_event: bool,
    /// Clamped chaos level.
    pub chaos: f64,
    /// Mean coherence across entities.
    pub mean_coherence: f64,
    /// Mean reversion gain across entities.
    pub mean_gain: f64,
    /// One marker per entity.
    pub markers: Vec<EntityMarker>,
    /// Trailing positions per entity, oldest first, ending at the marker.
    pub trails: Vec<Vec<DVec3>>,
    /// Camera orientation.
    pub camera: Camera,
}

impl PlaybackFrame {
    /// Heads-up display lines.
    #[must_use]
    pub fn hud_lines(&self) -> Vec<String> {
        let oracle_tag = if self.oracle_event {
            " [oracle event]"
        } else {
            ""
        };
        vec![
            format!("PLAYBACK: Frame {}/{}", self.index, self.total),
            format!("STATUS: {}{oracle_tag}", self.status.label()),
            "---------------------------".to_owned(),
            format!(
                "COHERENCE: {:.2}% | VR: {:.3}",
                self.mean_coherence * 100.0,
                self.mean_gain
            ),
            format!("CHAOS FACTOR: {:.4}", self.chaos),
        ]
    }
}

/// Errors raised while assembling a presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PresentationError {
    /// No frames were supplied.
    #[error("telemetry contains no frames to present")]
    NoFrames,
    /// Frames carried no entities.
    #[error("telemetry contains no entities to present")]
    NoEntities,
    /// A frame disagrees with the first frame's entity count.
    #[error("frame at position {position} has {found} entities, expected {expected}")]
    InconsistentEntities {
        /// Position of the frame within the supplied records.
        position: usize,
        /// Entity count of the first frame.
        expected: usize,
        /// Entity count of the offending frame.
        found: usize,
    },
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    title: String,
    style: PlaybackStyle,
    wireframe: Vec<Vec<DVec3>>,
    palette: Vec<Color>,
    records: Vec<TelemetryRecord>,
}

impl Presentation {
    /// Wireframe resolution along the major circle.
    pub const WIREFRAME_U_STEPS: usize = 100;
    /// Wireframe resolution around the tube.
    pub const WIREFRAME_V_STEPS: usize = 50;

    /// Validates `records` and precomputes the static scene.
    pub fn new<T>(
        title: T,
        style: PlaybackStyle,
        geometry: TorusGeometry,
        records: Vec<TelemetryRecord>,
    ) -> Result<Self, PresentationError>
    where
        T: Into<String>,
    {
        let expected = records
            .first()
            .map(TelemetryRecord::entity_count)
            .ok_or(PresentationError::NoFrames)?;
        if expected == 0 {
            return Err(PresentationError::NoEntities);
        }
        if let Some((position, record)) = records
            .iter()
            .enumerate()
            .find(|(_, record)| record.entity_count() != expected)
        {
            return Err(PresentationError::InconsistentEntities {
                position,
                expected,
                found: record.entity_count(),
            });
        }

        Ok(Self {
            title: title.into(),
            style,
            wireframe: torus_wireframe(&geometry, Self::WIREFRAME_U_STEPS, Self::WIREFRAME_V_STEPS),
            palette: entity_palette(expected),
            records,
        })
    }

    /// Title shown by the backend.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Playback style in use.
    #[must_use]
    pub const fn style(&self) -> &PlaybackStyle {
        &self.style
    }

    /// Static torus mesh.
    #[must_use]
    pub fn wireframe(&self) -> &[Vec<DVec3>] {
        &self.wireframe
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; construction rejects empty telemetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of entities per frame.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.palette.len()
    }

    /// Builds the playback step for `step`, looping past the last frame.
    #[must_use]
    pub fn frame(&self, step: usize) -> PlaybackFrame {
        let total = self.records.len();
        let index = step % total;
        let record = &self.records[index];
        let window = &self.records[index.saturating_sub(self.style.trail)..=index];

        let markers = record
            .entities
            .iter()
            .zip(&self.palette)
            .map(|(entity, color)| EntityMarker {
                position: DVec3::new(entity.x, entity.y, entity.z),
                size: self.style.marker_size(entity.coherence),
                color: color.with_alpha(self.style.marker_alpha(entity.coherence) as f32),
            })
            .collect();

        let trails = (0..self.entity_count())
            .map(|entity| {
                window
                    .iter()
                    .map(|past| {
                        let state = &past.entities[entity];
                        DVec3::new(state.x, state.y, state.z)
                    })
                    .collect()
            })
            .collect();

        PlaybackFrame {
            index,
            total,
            frame_index: record.frame.frame_index,
            status: SystemStatus::classify(&record.frame),
            oracle_event: record.frame.oracle_flux != 0.0,
            chaos: record.frame.chaos_clamped,
            mean_coherence: record.mean_coherence().unwrap_or_default(),
            mean_gain: record.mean_gain().unwrap_or_default(),
            markers,
            trails,
            camera: self.style.camera(index),
        }
    }
}

/// Rendering backend capable of presenting Harpia replays.
pub trait RenderingBackend {
    /// Runs the backend until playback completes or it is asked to exit.
    fn run(self, presentation: Presentation) -> AnyResult<()>;
}
