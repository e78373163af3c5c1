use std::{io::Write, num::NonZeroUsize, thread};

use anyhow::{Context, Result as AnyResult};
use harpia_rendering::{Presentation, RenderingBackend};

/// Backend printing the HUD of each playback step as plain text.
#[derive(Debug)]
pub(crate) struct TerminalBackend<W: Write> {
    out: W,
    every: NonZeroUsize,
    loops: NonZeroUsize,
    limit: Option<usize>,
    realtime: bool,
}

impl<W: Write> TerminalBackend<W> {
    pub(crate) fn new(out: W, every: NonZeroUsize, loops: NonZeroUsize) -> Self {
        Self {
            out,
            every,
            loops,
            limit: None,
            realtime: false,
        }
    }

    /// Stops after `limit` playback steps.
    pub(crate) fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Sleeps for the style's frame interval between printed steps.
    pub(crate) fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

impl<W: Write> RenderingBackend for TerminalBackend<W> {
    fn run(mut self, presentation: Presentation) -> AnyResult<()> {
        let style = *presentation.style();
        writeln!(self.out, "{}", presentation.title()).context("failed to write title")?;
        writeln!(
            self.out,
            "{} | {} entities | {} frames",
            style.caption,
            presentation.entity_count(),
            presentation.len()
        )
        .context("failed to write caption")?;

        let steps = presentation.len().saturating_mul(self.loops.get());
        let steps = self.limit.map_or(steps, |limit| limit.min(steps));
        let pause = style
            .frame_interval
            .saturating_mul(u32::try_from(self.every.get()).unwrap_or(u32::MAX));

        for step in (0..steps).step_by(self.every.get()) {
            let frame = presentation.frame(step);
            writeln!(self.out).context("failed to write frame separator")?;
            for line in frame.hud_lines() {
                writeln!(self.out, "{line}").context("failed to write hud")?;
            }
            if self.realtime {
                self.out.flush().context("failed to flush hud")?;
                thread::sleep(pause);
            }
        }

        self.out.flush().context("failed to flush hud")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harpia_core::{EntityFrameRecord, FrameState, TelemetryRecord};
    use harpia_rendering::{PlaybackStyle, TorusGeometry};

    fn presentation(frames: usize) -> Presentation {
        let records = (0..frames)
            .map(|frame_index| TelemetryRecord {
                frame: FrameState {
                    frame_index,
                    time: frame_index as f64 * 0.05,
                    chaos_raw: 0.0,
                    chaos_clamped: 0.0,
                    ambient_noise: 0.0,
                    oracle_flux: 0.0,
                },
                entities: vec![EntityFrameRecord {
                    x: 23.5,
                    y: 0.0,
                    z: 0.0,
                    coherence: 1.0,
                    gain: 1.1,
                    torque: 0.0,
                }],
            })
            .collect();
        Presentation::new(
            "HARPIA REPLAY",
            PlaybackStyle::replay(),
            TorusGeometry::default(),
            records,
        )
        .expect("valid telemetry")
    }

    fn render(
        every: NonZeroUsize,
        loops: NonZeroUsize,
        limit: Option<usize>,
        frames: usize,
    ) -> String {
        let mut out = Vec::new();
        TerminalBackend::new(&mut out, every, loops)
            .with_limit(limit)
            .run(presentation(frames))
            .expect("rendered");
        String::from_utf8(out).expect("utf-8")
    }

    fn count(text: &str, needle: &str) -> usize {
        text.matches(needle).count()
    }

    #[test]
    fn prints_every_requested_step() {
        let one = NonZeroUsize::MIN;
        let text = render(one, one, None, 3);
        assert!(text.starts_with(
            "HARPIA REPLAY\nREPLAY MODE - EXTERNAL PLAYER | 1 entities | 3 frames\n"
        ));
        assert_eq!(count(&text, "PLAYBACK: Frame"), 3);
        assert!(text.contains("PLAYBACK: Frame 2/3"));
        assert!(text.contains("STATUS: SYSTEM STABLE (VR SHIELD)"));
    }

    #[test]
    fn stride_and_limit_bound_output() {
        let two = NonZeroUsize::new(2).expect("non-zero");
        let three = NonZeroUsize::new(3).expect("non-zero");
        let text = render(two, three, Some(7), 4);

        assert_eq!(count(&text, "PLAYBACK: Frame"), 4);
        assert_eq!(count(&text, "PLAYBACK: Frame 0/4"), 2);
        assert_eq!(count(&text, "PLAYBACK: Frame 2/4"), 2);
    }
}
