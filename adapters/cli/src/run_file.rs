use std::{fs, path::Path};

use anyhow::{Context, Result};
use harpia_core::{ConfigParams, OracleKind, SimulationConfig, DEFAULT_RUN_SEED};
use serde::Deserialize;

/// Optional TOML file describing a generation run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunFile {
    /// Run seed split into the named random streams.
    pub(crate) seed: Option<u64>,
    /// Oracle requested for the run.
    pub(crate) oracle: Option<OracleKind>,
    /// Simulation parameters; missing keys take their defaults.
    pub(crate) simulation: ConfigParams,
}

impl RunFile {
    /// Reads and parses the run file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read run file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse run file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("run file is not valid toml")
    }
}

/// Values supplied on the command line, overriding the run file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Overrides {
    pub(crate) entity_count: Option<usize>,
    pub(crate) frame_count: Option<usize>,
    pub(crate) major_radius: Option<f64>,
    pub(crate) minor_radius: Option<f64>,
    pub(crate) flatten_factor: Option<f64>,
    pub(crate) disable_reversion: bool,
    pub(crate) seed: Option<u64>,
    pub(crate) oracle: Option<OracleKind>,
}

/// Fully resolved generation request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RunPlan {
    pub(crate) config: SimulationConfig,
    pub(crate) seed: u64,
    pub(crate) oracle: OracleKind,
}

impl RunPlan {
    /// Layers `overrides` on top of `file` and validates the result.
    pub(crate) fn resolve(file: RunFile, overrides: Overrides) -> Result<Self> {
        let mut params = file.simulation;
        if let Some(entity_count) = overrides.entity_count {
            params.entity_count = entity_count;
        }
        if let Some(frame_count) = overrides.frame_count {
            params.frame_count = frame_count;
        }
        if let Some(major_radius) = overrides.major_radius {
            params.major_radius = major_radius;
        }
        if let Some(minor_radius) = overrides.minor_radius {
            params.minor_radius = minor_radius;
        }
        if let Some(flatten_factor) = overrides.flatten_factor {
            params.flatten_factor = flatten_factor;
        }
        if overrides.disable_reversion {
            params.reversion_enabled = false;
        }

        let config = SimulationConfig::new(params).context("invalid simulation configuration")?;
        Ok(Self {
            config,
            seed: overrides.seed.or(file.seed).unwrap_or(DEFAULT_RUN_SEED),
            oracle: overrides.oracle.or(file.oracle).unwrap_or_default(),
        })
    }
}
