use super::*;

use crate::engine::ghost::GhostAgent;
use crate::engine::player::PlayerAgent;

/// An owned agent; drivers keep these in a map keyed by [`AgentId`].
pub enum Agent {
    Player(PlayerAgent),
    Ghost(GhostAgent),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Self::Player(_) => AgentId::Player,
            Self::Ghost(ghost) => AgentId::Ghost(ghost.name()),
        }
    }

    pub fn handle(&mut self, command: AgentCommand) -> Option<PositionUpdate> {
        match self {
            Self::Player(player) => player.handle(command),
            Self::Ghost(ghost) => ghost.handle(command),
        }
    }
}

impl Orchestrator {
    /// Creates one agent per [`AGENT_IDS`] entry over the shared read-only
    /// layout. They stay idle until [`Orchestrator::start`] positions them.
    pub fn spawn_agents(&self) -> Vec<Agent> {
        let speeds = self.level_config.speeds.clone();
        let mut agents = Vec::with_capacity(AGENT_IDS.len());
        agents.push(Agent::Player(PlayerAgent::new(
            self.layout(),
            speeds.clone(),
        )));
        for ghost in GhostName::ALL {
            agents.push(Agent::Ghost(GhostAgent::new(
                ghost,
                self.layout(),
                speeds.clone(),
                self.config.seed,
            )));
        }
        agents
    }
}
