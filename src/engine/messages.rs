//! Typed traffic between the orchestrator and its agents.

use std::collections::BTreeMap;

use crate::constants::SpeedTable;
use crate::position::Position;
use crate::types::{AgentId, Direction, GhostName, ModeTags};

/// Read-mirrored position of one agent in the last committed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentFrame {
    pub position: Position,
    pub direction: Direction,
}

/// Broadcast once per tick; every expected agent answers with a [`PositionUpdate`].
#[derive(Clone, Debug, PartialEq)]
pub struct GameSync {
    pub tick: u64,
    pub dt_ms: u64,
    pub player: AgentFrame,
    pub ghosts: BTreeMap<GhostName, AgentFrame>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    NewLevel(SpeedTable),
    Reposition,
    GetReady,
    Pause,
    Resume,
    Hide,
    Show,
    LifeLost,
    AtePellet,
    AtePowerPellet,
    Scatter,
    Chase,
    Frightened,
    FrightenedEndingSoon,
    FrightenedEnded,
    Eaten,
    LeaveHouse,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AgentCommand {
    Sync(GameSync),
    Input(Direction),
    Notify(Notification),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionUpdate {
    pub agent: AgentId,
    pub tick: u64,
    pub position: Position,
    pub direction: Direction,
    pub tags: ModeTags,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub to: AgentId,
    pub command: AgentCommand,
}

impl Envelope {
    pub fn notify(to: AgentId, notification: Notification) -> Self {
        Self {
            to,
            command: AgentCommand::Notify(notification),
        }
    }
}
