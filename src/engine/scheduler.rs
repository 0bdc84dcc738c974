//! Scatter/chase interval timer and the frightened countdown.
//!
//! Both timers count whole seconds. The interval timer is paused while a
//! frightened period is running, and everything stops while the scheduler is
//! frozen (post-eaten freeze).

use crate::config::LevelConfig;
use crate::constants::FRIGHTENED_WARNING_SECS;
use crate::types::ScatterChase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecondTimer {
    seconds_left: u32,
    carry_ms: u64,
}

impl SecondTimer {
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds_left: seconds,
            carry_ms: 0,
        }
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// Returns true once the timer has run out.
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        self.carry_ms += dt_ms;
        while self.carry_ms >= 1_000 && self.seconds_left > 0 {
            self.carry_ms -= 1_000;
            self.seconds_left -= 1;
        }
        self.seconds_left == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrightenedPhase {
    Active,
    EndingSoon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrightenedTimer {
    phase: FrightenedPhase,
    timer: SecondTimer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerSignal {
    ModeChanged(ScatterChase),
    FrightenedEndingSoon,
    FrightenedEnded,
}

#[derive(Clone, Debug)]
pub struct ModeScheduler {
    schedule: Vec<Option<u32>>,
    index: usize,
    mode: ScatterChase,
    mode_timer: Option<SecondTimer>,
    frightened_secs: u32,
    frightened: Option<FrightenedTimer>,
    frozen: bool,
}

impl ModeScheduler {
    pub fn new(level: &LevelConfig) -> Self {
        let schedule = level.mode_schedule.clone();
        let mode_timer = schedule.first().copied().flatten().map(SecondTimer::new);
        Self {
            schedule,
            index: 0,
            mode: ScatterChase::Scatter,
            mode_timer,
            frightened_secs: level.frightened_secs,
            frightened: None,
            frozen: false,
        }
    }

    pub fn mode(&self) -> ScatterChase {
        self.mode
    }

    pub fn frightened_phase(&self) -> Option<FrightenedPhase> {
        self.frightened.map(|f| f.phase)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Starts (or restarts) the frightened countdown. Returns false when the
    /// level has no frightened time at all.
    pub fn start_frightened(&mut self) -> bool {
        if self.frightened_secs == 0 {
            self.frightened = None;
            return false;
        }
        let active = self.frightened_secs.saturating_sub(FRIGHTENED_WARNING_SECS);
        self.frightened = Some(if active == 0 {
            FrightenedTimer {
                phase: FrightenedPhase::EndingSoon,
                timer: SecondTimer::new(self.frightened_secs),
            }
        } else {
            FrightenedTimer {
                phase: FrightenedPhase::Active,
                timer: SecondTimer::new(active),
            }
        });
        true
    }

    pub fn advance(&mut self, dt_ms: u64) -> Vec<SchedulerSignal> {
        let mut signals = Vec::new();
        if self.frozen {
            return signals;
        }

        if let Some(frightened) = self.frightened.as_mut() {
            if frightened.timer.advance(dt_ms) {
                match frightened.phase {
                    FrightenedPhase::Active => {
                        frightened.phase = FrightenedPhase::EndingSoon;
                        frightened.timer = SecondTimer::new(FRIGHTENED_WARNING_SECS);
                        signals.push(SchedulerSignal::FrightenedEndingSoon);
                    }
                    FrightenedPhase::EndingSoon => {
                        self.frightened = None;
                        signals.push(SchedulerSignal::FrightenedEnded);
                    }
                }
            }
            return signals;
        }

        let Some(timer) = self.mode_timer.as_mut() else {
            return signals;
        };
        if timer.advance(dt_ms) {
            self.index += 1;
            self.mode = match self.mode {
                ScatterChase::Scatter => ScatterChase::Chase,
                ScatterChase::Chase => ScatterChase::Scatter,
            };
            self.mode_timer = self
                .schedule
                .get(self.index)
                .copied()
                .flatten()
                .map(SecondTimer::new);
            signals.push(SchedulerSignal::ModeChanged(self.mode));
        }
        signals
    }
}
