use std::collections::VecDeque;

use crate::constants::{GLOBAL_HOUSE_THRESHOLDS, HOUSE_FALLBACK_SECS};
use crate::types::GhostName;

/// Release order out of the house; Blinky starts outside.
pub const HOUSE_ORDER: [GhostName; 3] = [GhostName::Pinky, GhostName::Inky, GhostName::Clyde];

fn order_slot(ghost: GhostName) -> usize {
    match ghost {
        GhostName::Blinky | GhostName::Pinky => 0,
        GhostName::Inky => 1,
        GhostName::Clyde => 2,
    }
}

/// Decides when the pursuers waiting in the house are let out.
///
/// Only the first waiting pursuer counts pellets on its personal counter.
/// After a life loss a shared counter takes over until the last pursuer
/// leaves, and a stall timer forces a release when no pellet is eaten for a
/// while.
#[derive(Clone, Debug)]
pub struct HouseGate {
    waiting: VecDeque<GhostName>,
    personal_thresholds: [u32; 3],
    personal_counts: [u32; 3],
    global_count: Option<u32>,
    stall_ms: u64,
}

impl HouseGate {
    pub fn new(personal_thresholds: [u32; 3]) -> Self {
        Self {
            waiting: HOUSE_ORDER.into_iter().collect(),
            personal_thresholds,
            personal_counts: [0; 3],
            global_count: None,
            stall_ms: 0,
        }
    }

    pub fn waiting(&self) -> impl Iterator<Item = GhostName> + '_ {
        self.waiting.iter().copied()
    }

    pub fn is_global_active(&self) -> bool {
        self.global_count.is_some()
    }

    /// Everyone is back inside; the shared counter replaces personal ones.
    pub fn on_life_lost(&mut self) {
        self.waiting = HOUSE_ORDER.into_iter().collect();
        self.global_count = Some(0);
        self.stall_ms = 0;
    }

    pub fn on_pellet_eaten(&mut self) -> Option<GhostName> {
        self.stall_ms = 0;
        let first = *self.waiting.front()?;
        match self.global_count.as_mut() {
            Some(count) => *count += 1,
            None => self.personal_counts[order_slot(first)] += 1,
        }
        self.poll()
    }

    /// Releases the first waiting pursuer if one of its counters has reached
    /// its threshold.
    pub fn poll(&mut self) -> Option<GhostName> {
        let first = *self.waiting.front()?;
        let slot = order_slot(first);
        let personal_ready = self.global_count.is_none()
            && self.personal_counts[slot] >= self.personal_thresholds[slot];
        let global_ready = self
            .global_count
            .is_some_and(|count| count >= GLOBAL_HOUSE_THRESHOLDS[slot]);
        if personal_ready || global_ready {
            return self.release_first();
        }
        None
    }

    pub fn advance(&mut self, dt_ms: u64) -> Option<GhostName> {
        if self.waiting.is_empty() {
            return None;
        }
        self.stall_ms += dt_ms;
        if self.stall_ms < u64::from(HOUSE_FALLBACK_SECS) * 1_000 {
            return None;
        }
        self.stall_ms = 0;
        self.release_first()
    }

    fn release_first(&mut self) -> Option<GhostName> {
        let ghost = self.waiting.pop_front()?;
        if ghost == GhostName::Clyde {
            self.global_count = None;
        }
        Some(ghost)
    }
}
