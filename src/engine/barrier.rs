use std::collections::{BTreeMap, BTreeSet};

use crate::engine::messages::PositionUpdate;
use crate::types::AgentId;

#[derive(Debug, PartialEq, Eq)]
pub enum BarrierOutcome {
    Accepted,
    /// Every expected agent has replied; the frame is ready to commit.
    Complete(BTreeMap<AgentId, PositionUpdate>),
    /// Wrong tick, or the barrier already closed.
    Stale,
    Duplicate,
    Unexpected,
}

/// Collects one reply per expected agent for a single tick.
#[derive(Debug, Default)]
pub struct TickBarrier {
    tick: u64,
    open: bool,
    expected: BTreeSet<AgentId>,
    received: BTreeMap<AgentId, PositionUpdate>,
}

impl TickBarrier {
    pub fn open(&mut self, tick: u64, expected: impl IntoIterator<Item = AgentId>) {
        self.tick = tick;
        self.open = true;
        self.expected = expected.into_iter().collect();
        self.received.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pending(&self) -> usize {
        self.expected.len().saturating_sub(self.received.len())
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.received.clear();
    }

    pub fn offer(&mut self, update: PositionUpdate) -> BarrierOutcome {
        if !self.open || update.tick != self.tick {
            return BarrierOutcome::Stale;
        }
        if !self.expected.contains(&update.agent) {
            return BarrierOutcome::Unexpected;
        }
        if self.received.contains_key(&update.agent) {
            return BarrierOutcome::Duplicate;
        }
        self.received.insert(update.agent, update);
        if self.received.len() < self.expected.len() {
            return BarrierOutcome::Accepted;
        }
        self.open = false;
        BarrierOutcome::Complete(std::mem::take(&mut self.received))
    }
}
