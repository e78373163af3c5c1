use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use harpia_core::{
    derive_stream_seed, OracleKind, RunStatistics, SimulationConfig, TelemetryRecord,
    TelemetrySink, RNG_STREAM_ORACLE, RNG_STREAM_PERTURBATION, RNG_STREAM_SIMULATOR,
};
use indicatif::{ProgressBar, ProgressStyle};
use harpia_system_oracle::{QubitSimulator, SelectedOracle};
use harpia_system_reversion::GainSelection;
use harpia_system_telemetry::{SeededPerturbation, TelemetryEngine};
use harpia_telemetry_csv::CsvTelemetryWriter;

use crate::run_file::RunPlan;

/// Summary printed once a run has been written.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunReport {
    pub(crate) config: SimulationConfig,
    pub(crate) seed: u64,
    pub(crate) oracle: OracleKind,
    pub(crate) gain: &'static str,
    pub(crate) statistics: RunStatistics,
    pub(crate) output: PathBuf,
}

/// Runs the engine described by `plan`, streaming rows into `output`.
pub(crate) fn generate(plan: &RunPlan, output: &Path) -> Result<RunReport> {
    let config = plan.config;

    let mut simulator =
        QubitSimulator::from_seed(derive_stream_seed(plan.seed, RNG_STREAM_SIMULATOR));
    let oracle = SelectedOracle::select(
        plan.oracle,
        &mut simulator,
        derive_stream_seed(plan.seed, RNG_STREAM_ORACLE),
    );
    let gain = GainSelection::resolve(&config, None);
    let gain_label = gain.label();
    let perturbation =
        SeededPerturbation::from_seed(derive_stream_seed(plan.seed, RNG_STREAM_PERTURBATION));

    let mut writer = CsvTelemetryWriter::create(output, config.entity_count())
        .with_context(|| format!("failed to create telemetry table at {}", output.display()))?;
    let bar = progress_bar(config.frame_count())?;
    let statistics = TelemetryEngine::new(config, oracle, gain, perturbation)
        .run_into(ProgressSink::new(&mut writer, bar.clone()))
        .with_context(|| format!("failed to write telemetry to {}", output.display()))?;
    bar.finish_and_clear();
    drop(
        writer
            .finish()
            .with_context(|| format!("failed to flush telemetry to {}", output.display()))?,
    );

    Ok(RunReport {
        config,
        seed: plan.seed,
        oracle: plan.oracle,
        gain: gain_label,
        statistics,
        output: output.to_path_buf(),
    })
}

fn progress_bar(frame_count: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(frame_count as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} frames")
            .context("invalid progress template")?
            .progress_chars("=>-"),
    );
    bar.set_message("generating telemetry");
    Ok(bar)
}

/// Sink forwarding records while advancing a progress bar to the last frame seen.
struct ProgressSink<S> {
    inner: S,
    bar: ProgressBar,
}

impl<S> ProgressSink<S> {
    fn new(inner: S, bar: ProgressBar) -> Self {
        Self { inner, bar }
    }
}

impl<S: TelemetrySink> TelemetrySink for ProgressSink<S> {
    type Error = S::Error;

    fn push_record(&mut self, record: TelemetryRecord) -> Result<(), Self::Error> {
        // Rejected frames never reach the sink, so track position by frame index.
        let position = record.frame.frame_index as u64 + 1;
        self.inner.push_record(record)?;
        self.bar.set_position(position);
        Ok(())
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |value| format!("{:.4}%", value * 100.0))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statistics = &self.statistics;
        let reversion = if self.config.reversion_enabled() {
            "enabled"
        } else {
            "disabled"
        };

        writeln!(f, "Harpia telemetry run")?;
        writeln!(f, "  entities:          {}", self.config.entity_count())?;
        writeln!(f, "  frames:            {}", self.config.frame_count())?;
        writeln!(f, "  reversion:         {reversion} ({} gain)", self.gain)?;
        writeln!(f, "  flatten factor:    {:.8}", self.config.flatten_factor())?;
        writeln!(f, "  oracle:            {}", self.oracle)?;
        writeln!(f, "  seed:              {:#x}", self.seed)?;
        writeln!(f, "Phoenix triggers:    {}", statistics.phoenix_trigger_count)?;
        writeln!(
            f,
            "Frames recorded:     {} (rejected: {})",
            statistics.frames_recorded,
            statistics.rejected_frames.len()
        )?;
        writeln!(f, "Coherence mean:      {}", percent(statistics.coherence_mean()))?;
        writeln!(
            f,
            "Coherence min/max:   {} / {}",
            percent(statistics.coherence_min()),
            percent(statistics.coherence_max())
        )?;
        write!(f, "Telemetry saved:     {}", self.output.display())
    }
}
