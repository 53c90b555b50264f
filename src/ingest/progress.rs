use std::time::{Duration, Instant};
use tracing::debug;

/// One progress tick from an in-flight upload or batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    /// 0..=100
    Percent(u8),
    /// Bytes are moving but the total size is unknown.
    Indeterminate,
}

/// Folds per-file progress into one percentage across a batch.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    total: usize,
    last_percent: u8,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            last_percent: 0,
        }
    }

    /// Maps a signal from file `index` to the overall signal. Indeterminate
    /// ticks pass through and leave the last determinate value untouched.
    pub fn item_signal(&mut self, index: usize, signal: ProgressSignal) -> ProgressSignal {
        match signal {
            ProgressSignal::Percent(percent) => {
                let overall = self.overall(index as f64 + f64::from(percent.min(100)) / 100.0);
                self.last_percent = overall;
                ProgressSignal::Percent(overall)
            }
            ProgressSignal::Indeterminate => ProgressSignal::Indeterminate,
        }
    }

    /// Forced value once file `index` is done, whether it succeeded or not.
    pub fn complete_item(&mut self, index: usize) -> u8 {
        let overall = self.overall((index + 1) as f64);
        self.last_percent = overall;
        overall
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    fn overall(&self, files_done: f64) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = (files_done / self.total as f64 * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Determinate,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Idle,
    Active(ProgressMode),
    Settling { since: Instant },
}

/// What a renderer should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub visible: bool,
    pub percent: u8,
    pub indeterminate: bool,
}

/// Renders progress snapshots; the terminal renderer lives in `console`.
pub trait ProgressView {
    fn render(&mut self, snapshot: &ProgressSnapshot);
}

/// Presentation state machine: `Idle -> Active -> Settling -> Idle`.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    phase: ProgressPhase,
    percent: u8,
    hold: Duration,
}

impl ProgressTracker {
    pub fn new(hold: Duration) -> Self {
        Self {
            phase: ProgressPhase::Idle,
            percent: 0,
            hold,
        }
    }

    pub fn phase(&self) -> ProgressPhase {
        self.phase
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub fn apply(&mut self, signal: ProgressSignal) -> ProgressSnapshot {
        let mode = match signal {
            ProgressSignal::Percent(percent) => {
                self.percent = percent.min(100);
                ProgressMode::Determinate
            }
            ProgressSignal::Indeterminate => ProgressMode::Indeterminate,
        };

        if !matches!(self.phase, ProgressPhase::Active(_)) {
            debug!("Progress active");
        }
        self.phase = ProgressPhase::Active(mode);
        self.snapshot()
    }

    /// Operation finished: pin at 100 and start the display hold.
    pub fn complete(&mut self, now: Instant) -> ProgressSnapshot {
        self.percent = 100;
        self.phase = ProgressPhase::Settling { since: now };
        self.snapshot()
    }

    /// Returns the idle snapshot once the hold has elapsed since completion.
    pub fn poll(&mut self, now: Instant) -> Option<ProgressSnapshot> {
        match self.phase {
            ProgressPhase::Settling { since } if now.saturating_duration_since(since) >= self.hold => {
                self.phase = ProgressPhase::Idle;
                self.percent = 0;
                debug!("Progress idle");
                Some(self.snapshot())
            }
            _ => None,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        match self.phase {
            ProgressPhase::Idle => ProgressSnapshot {
                visible: false,
                percent: 0,
                indeterminate: false,
            },
            ProgressPhase::Active(mode) => ProgressSnapshot {
                visible: true,
                percent: self.percent,
                indeterminate: mode == ProgressMode::Indeterminate,
            },
            ProgressPhase::Settling { .. } => ProgressSnapshot {
                visible: true,
                percent: 100,
                indeterminate: false,
            },
        }
    }
}
