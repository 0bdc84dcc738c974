//! Async driver: every agent runs on its own tokio task and talks to the
//! orchestrator loop over mpsc channels.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::engine::messages::{AgentCommand, Envelope, PositionUpdate};
use crate::engine::{Agent, Orchestrator};
use crate::error::GameError;
use crate::maze::Maze;
use crate::types::{AgentId, Direction, GameSummary, Snapshot};

const INPUT_QUEUE: usize = 64;
const SNAPSHOT_QUEUE: usize = 256;

type Mailboxes = BTreeMap<AgentId, mpsc::UnboundedSender<AgentCommand>>;

pub struct SessionHandle {
    layout: Arc<Maze>,
    inputs: mpsc::Sender<Direction>,
    snapshots: mpsc::Receiver<Snapshot>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<GameSummary, GameError>>,
}

impl SessionHandle {
    /// The untouched level layout, for clients that draw the maze once.
    pub fn layout(&self) -> Arc<Maze> {
        Arc::clone(&self.layout)
    }

    pub fn input_sender(&self) -> mpsc::Sender<Direction> {
        self.inputs.clone()
    }

    /// Next per-tick snapshot; `None` once the session has ended.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Waits for game over (or [`SessionHandle::stop`]) and returns the summary.
    pub async fn finish(mut self) -> Result<GameSummary, GameError> {
        self.snapshots.close();
        self.task.await?
    }
}

/// Starts a session on the current tokio runtime.
pub fn spawn_session(config: GameConfig) -> Result<SessionHandle, GameError> {
    let tick_ms = config.tick_ms;
    let layout = Arc::new(Maze::classic()?);
    let orchestrator = Orchestrator::new(config, Arc::clone(&layout));

    let (update_tx, update_rx) = mpsc::unbounded_channel::<PositionUpdate>();
    let mut mailboxes = Mailboxes::new();
    for agent in orchestrator.spawn_agents() {
        // Unbounded: a dropped command would stall the barrier.
        let (tx, rx) = mpsc::unbounded_channel();
        mailboxes.insert(agent.id(), tx);
        tokio::spawn(run_agent(agent, rx, update_tx.clone()));
    }
    drop(update_tx);

    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_QUEUE);
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(run_orchestrator(
        orchestrator,
        tick_ms,
        mailboxes,
        Channels {
            updates: update_rx,
            inputs: input_rx,
            snapshots: snapshot_tx,
            stop: stop_rx,
        },
    ));

    Ok(SessionHandle {
        layout,
        inputs: input_tx,
        snapshots: snapshot_rx,
        stop: Some(stop_tx),
        task,
    })
}

async fn run_agent(
    mut agent: Agent,
    mut mailbox: mpsc::UnboundedReceiver<AgentCommand>,
    updates: mpsc::UnboundedSender<PositionUpdate>,
) {
    let id = agent.id();
    while let Some(command) = mailbox.recv().await {
        if let Some(update) = agent.handle(command) {
            if updates.send(update).is_err() {
                break;
            }
        }
    }
    debug!(agent = ?id, "agent task stopped");
}

struct Channels {
    updates: mpsc::UnboundedReceiver<PositionUpdate>,
    inputs: mpsc::Receiver<Direction>,
    snapshots: mpsc::Sender<Snapshot>,
    stop: oneshot::Receiver<()>,
}

async fn run_orchestrator(
    mut orchestrator: Orchestrator,
    tick_ms: u64,
    mailboxes: Mailboxes,
    mut channels: Channels,
) -> Result<GameSummary, GameError> {
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    dispatch(&mailboxes, orchestrator.start())?;
    loop {
        tokio::select! {
            _ = &mut channels.stop => {
                info!(tick = orchestrator.tick(), "session stopped");
                break;
            }
            Some(update) = channels.updates.recv() => {
                dispatch(&mailboxes, orchestrator.on_update(update))?;
            }
            Some(direction) = channels.inputs.recv() => {
                dispatch(&mailboxes, orchestrator.on_input(direction))?;
            }
            _ = interval.tick() => {
                dispatch(&mailboxes, orchestrator.on_timer(tick_ms))?;
                publish(&channels.snapshots, orchestrator.build_snapshot(true));
                if orchestrator.is_game_over() {
                    break;
                }
            }
        }
    }

    Ok(orchestrator.build_summary())
}

fn dispatch(mailboxes: &Mailboxes, envelopes: Vec<Envelope>) -> Result<(), GameError> {
    for Envelope { to, command } in envelopes {
        let Some(mailbox) = mailboxes.get(&to) else {
            debug!(?to, "envelope for unknown agent dropped");
            continue;
        };
        mailbox
            .send(command)
            .map_err(|_| GameError::ChannelClosed("agent mailbox"))?;
    }
    Ok(())
}

/// Snapshots are best effort: a slow reader loses frames, never the game.
fn publish(snapshots: &mpsc::Sender<Snapshot>, snapshot: Snapshot) {
    if let Err(error) = snapshots.try_send(snapshot) {
        debug!(%error, "snapshot dropped");
    }
}
