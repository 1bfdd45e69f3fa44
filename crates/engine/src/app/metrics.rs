use std::time::{Duration, Instant};

/// Rates measured over the last completed interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    /// Frames actually presented per second.
    pub fps: f32,
    /// Logic ticks run per second.
    pub tps: f32,
}

impl LoopMetricsSnapshot {
    /// Counter text drawn in the corner of the screen.
    pub fn fps_label(&self) -> String {
        format!("{} FPS", self.fps.round().max(0.0) as u32)
    }
}

/// Counts presented frames and logic ticks, closing an interval once it
/// has run for `interval`.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    rendered_frames: u32,
    logic_ticks: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            rendered_frames: 0,
            logic_ticks: 0,
        }
    }

    pub(crate) fn record_frame(&mut self) {
        self.rendered_frames = self.rendered_frames.saturating_add(1);
    }

    pub(crate) fn record_tick(&mut self) {
        self.logic_ticks = self.logic_ticks.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            fps: self.rendered_frames as f32 / elapsed_seconds,
            tps: self.logic_ticks as f32 / elapsed_seconds,
        };

        self.interval_start = now;
        self.rendered_frames = 0;
        self.logic_ticks = 0;
        Some(snapshot)
    }
}
