use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use crate::config::GameConfig;
use crate::engine::messages::Envelope;
use crate::engine::{Agent, LevelPhase, Orchestrator};
use crate::error::GameError;
use crate::maze::Maze;
use crate::types::{AgentId, Direction, GameSummary, Snapshot};

/// Single-threaded driver: agents and the orchestrator exchange envelopes
/// through one in-process queue, so a run is fully determined by its config
/// and the sequence of `step`/`input` calls.
pub struct Session {
    orchestrator: Orchestrator,
    agents: BTreeMap<AgentId, Agent>,
    queue: VecDeque<Envelope>,
}

impl Session {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let layout = Arc::new(Maze::classic()?);
        let orchestrator = Orchestrator::new(config, layout);
        let agents = orchestrator
            .spawn_agents()
            .into_iter()
            .map(|agent| (agent.id(), agent))
            .collect();
        let mut session = Self {
            orchestrator,
            agents,
            queue: VecDeque::new(),
        };
        let spawned = session.orchestrator.start();
        session.route(spawned);
        Ok(session)
    }

    /// Advances the clock by one tick and delivers everything that results,
    /// including the replies that close this tick's barrier.
    pub fn step(&mut self, dt_ms: u64) {
        let envelopes = self.orchestrator.on_timer(dt_ms);
        self.route(envelopes);
    }

    pub fn input(&mut self, direction: Direction) {
        let envelopes = self.orchestrator.on_input(direction);
        self.route(envelopes);
    }

    pub fn snapshot(&mut self) -> Snapshot {
        self.orchestrator.build_snapshot(true)
    }

    pub fn summary(&self) -> GameSummary {
        self.orchestrator.build_summary()
    }

    pub fn is_game_over(&self) -> bool {
        self.orchestrator.is_game_over()
    }

    pub fn phase(&self) -> LevelPhase {
        self.orchestrator.phase()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    fn route(&mut self, envelopes: Vec<Envelope>) {
        self.queue.extend(envelopes);
        while let Some(envelope) = self.queue.pop_front() {
            let Some(agent) = self.agents.get_mut(&envelope.to) else {
                debug!(to = ?envelope.to, "envelope for unknown agent dropped");
                continue;
            };
            if let Some(update) = agent.handle(envelope.command) {
                let replies = self.orchestrator.on_update(update);
                self.queue.extend(replies);
            }
        }
    }
}
