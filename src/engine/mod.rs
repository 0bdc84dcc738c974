use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{GameConfig, LevelConfig};
use crate::constants::{
    GET_READY_MS, LEVEL_FADE_OUT_MS, LOST_LIFE_DYING_MS, LOST_LIFE_FINISHED_MS,
};
use crate::maze::Maze;
use crate::rng::Rng;
use crate::types::{
    AgentId, Direction, GameSummary, GhostName, GhostView, ModeTag, ModeTags, PlayerView,
    RuntimeEvent, ScatterChase, ScoreView, Snapshot,
};

pub mod barrier;
pub mod fruit;
pub mod ghost;
pub mod house;
pub mod messages;
pub mod player;
pub mod scheduler;

mod collision_system;
mod spawn_system;
mod utils;

use self::barrier::{BarrierOutcome, TickBarrier};
use self::fruit::FruitLifecycle;
use self::house::HouseGate;
use self::messages::{
    AgentCommand, AgentFrame, Envelope, GameSync, Notification, PositionUpdate,
};
use self::scheduler::{ModeScheduler, SchedulerSignal};

pub use self::spawn_system::Agent;
pub use self::utils::{start_pose, AGENT_IDS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LostLifeStage {
    Stopped,
    Dying,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelCompleteStage {
    MazeFlash,
    FadeOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelPhase {
    Initial,
    GetReady {
        remaining_ms: u64,
    },
    /// `freeze_ms > 0` while the post-eaten freeze holds everything still.
    Playing {
        freeze_ms: u64,
    },
    LostLife {
        stage: LostLifeStage,
        remaining_ms: u64,
    },
    LevelComplete {
        stage: LevelCompleteStage,
        remaining_ms: u64,
    },
    GameOver,
}

#[derive(Clone, Debug, Default)]
struct Score {
    total_points: u64,
    level_pellets: u32,
    pellets_eaten: u32,
    ghosts_eaten: u32,
    extra_life_awarded: bool,
}

/// Level orchestrator.
///
/// A pure state machine: every input (`start`, `on_timer`, `on_update`,
/// `on_input`) returns the envelopes the driver must route to the agents. It
/// owns the mutable maze, the score and every timer; agents only ever see the
/// committed frame carried in [`GameSync`].
pub struct Orchestrator {
    config: GameConfig,
    level_config: LevelConfig,
    layout: Arc<Maze>,
    maze: Maze,
    rng: Rng,
    phase: LevelPhase,
    level: u32,
    lives: u32,
    tick: u64,
    elapsed_ms: u64,
    barrier: TickBarrier,
    committed: BTreeMap<AgentId, PositionUpdate>,
    score: Score,
    fright_chain: u32,
    dead_ghosts: BTreeSet<GhostName>,
    revived_ghosts: BTreeSet<GhostName>,
    scheduler: ModeScheduler,
    house: HouseGate,
    fruit: FruitLifecycle,
    events: Vec<RuntimeEvent>,
}

impl Orchestrator {
    pub fn new(config: GameConfig, layout: Arc<Maze>) -> Self {
        let level = config.start_level.max(1);
        let level_config = LevelConfig::for_level(level);
        let committed = AGENT_IDS
            .into_iter()
            .map(|agent| {
                let (position, direction) = start_pose(agent);
                let update = PositionUpdate {
                    agent,
                    tick: 0,
                    position,
                    direction,
                    tags: ModeTags::from([ModeTag::MovementPaused]),
                };
                (agent, update)
            })
            .collect();
        Self {
            maze: (*layout).clone(),
            rng: Rng::new(config.seed),
            phase: LevelPhase::Initial,
            level,
            lives: config.starting_lives,
            tick: 0,
            elapsed_ms: 0,
            barrier: TickBarrier::default(),
            committed,
            score: Score::default(),
            fright_chain: 0,
            dead_ghosts: BTreeSet::new(),
            revived_ghosts: BTreeSet::new(),
            scheduler: ModeScheduler::new(&level_config),
            house: HouseGate::new(level_config.personal_house_thresholds),
            fruit: FruitLifecycle::new(config.fruit_pellet_thresholds),
            events: Vec::new(),
            level_config,
            layout,
            config,
        }
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == LevelPhase::GameOver
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn total_points(&self) -> u64 {
        self.score.total_points
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn layout(&self) -> Arc<Maze> {
        Arc::clone(&self.layout)
    }

    pub fn scatter_chase(&self) -> ScatterChase {
        self.scheduler.mode()
    }

    pub fn committed(&self, agent: AgentId) -> Option<&PositionUpdate> {
        self.committed.get(&agent)
    }

    /// Spawns the level: every agent is told the level speeds, placed at its
    /// start position and held for the get-ready delay.
    pub fn start(&mut self) -> Vec<Envelope> {
        if self.phase != LevelPhase::Initial {
            return Vec::new();
        }
        info!(level = self.level, lives = self.lives, "game starting");
        self.events.push(RuntimeEvent::LevelStarted { level: self.level });
        self.enter_get_ready(true)
    }

    pub fn on_input(&mut self, direction: Direction) -> Vec<Envelope> {
        match self.phase {
            LevelPhase::Initial | LevelPhase::GameOver => {
                debug!(?direction, "input ignored");
                Vec::new()
            }
            _ => vec![Envelope {
                to: AgentId::Player,
                command: AgentCommand::Input(direction),
            }],
        }
    }

    /// Fixed-rate tick: advances phase timers and, while the game runs,
    /// broadcasts a [`GameSync`] and opens the barrier for this tick.
    pub fn on_timer(&mut self, dt_ms: u64) -> Vec<Envelope> {
        if matches!(self.phase, LevelPhase::Initial | LevelPhase::GameOver) {
            return Vec::new();
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        let live = LevelPhase::Playing { freeze_ms: 0 };
        let was_live = self.phase == live;
        let mut out = Vec::new();
        self.advance_phase(dt_ms, &mut out);
        if was_live && self.phase == live {
            self.advance_playing(dt_ms, &mut out);
        }
        if self.is_game_over() {
            return out;
        }

        if self.barrier.is_open() {
            debug!(
                tick = self.barrier.tick(),
                pending = self.barrier.pending(),
                "barrier still open, skipping tick"
            );
            return out;
        }
        self.tick += 1;
        self.barrier.open(self.tick, AGENT_IDS);
        let sync = self.game_sync(dt_ms);
        out.extend(AGENT_IDS.into_iter().map(|to| Envelope {
            to,
            command: AgentCommand::Sync(sync.clone()),
        }));
        out
    }

    pub fn on_update(&mut self, update: PositionUpdate) -> Vec<Envelope> {
        let agent = update.agent;
        let tick = update.tick;
        match self.barrier.offer(update) {
            BarrierOutcome::Accepted => Vec::new(),
            BarrierOutcome::Complete(frame) => self.commit(frame),
            BarrierOutcome::Stale => {
                debug!(?agent, tick, current = self.barrier.tick(), "late update ignored");
                Vec::new()
            }
            BarrierOutcome::Duplicate => {
                debug!(?agent, tick, "duplicate update ignored");
                Vec::new()
            }
            BarrierOutcome::Unexpected => {
                debug!(?agent, tick, "update from unexpected agent ignored");
                Vec::new()
            }
        }
    }

    fn game_sync(&self, dt_ms: u64) -> GameSync {
        let frame = |agent: AgentId| {
            let (position, direction) = self
                .committed
                .get(&agent)
                .map(|update| (update.position, update.direction))
                .unwrap_or_else(|| start_pose(agent));
            AgentFrame {
                position,
                direction,
            }
        };
        GameSync {
            tick: self.tick,
            dt_ms,
            player: frame(AgentId::Player),
            ghosts: GhostName::ALL
                .into_iter()
                .map(|ghost| (ghost, frame(AgentId::Ghost(ghost))))
                .collect(),
        }
    }

    /// Commits a complete frame, then resolves it while play is live.
    fn commit(&mut self, frame: BTreeMap<AgentId, PositionUpdate>) -> Vec<Envelope> {
        self.committed = frame;
        self.track_revivals();

        let mut out = Vec::new();
        if self.phase != (LevelPhase::Playing { freeze_ms: 0 }) {
            return out;
        }
        if self.check_collisions(&mut out) {
            return out;
        }
        self.check_consumption(&mut out);
        self.check_win(&mut out);
        out
    }

    fn track_revivals(&mut self) {
        for ghost in GhostName::ALL {
            let Some(update) = self.committed.get(&AgentId::Ghost(ghost)) else {
                continue;
            };
            let still_dead = update.tags.contains(&ModeTag::Dead)
                || update.tags.contains(&ModeTag::ReturningHome);
            if !still_dead && self.dead_ghosts.remove(&ghost) {
                self.revived_ghosts.remove(&ghost);
                self.events.push(RuntimeEvent::GhostRevived { ghost });
            }
        }
    }

    fn advance_phase(&mut self, dt_ms: u64, out: &mut Vec<Envelope>) {
        match self.phase {
            LevelPhase::Initial | LevelPhase::GameOver => {}
            LevelPhase::GetReady { remaining_ms } => {
                let remaining_ms = remaining_ms.saturating_sub(dt_ms);
                if remaining_ms > 0 {
                    self.phase = LevelPhase::GetReady { remaining_ms };
                    return;
                }
                info!(level = self.level, "playing");
                self.phase = LevelPhase::Playing { freeze_ms: 0 };
                broadcast(out, Notification::Resume);
            }
            LevelPhase::Playing { freeze_ms } => {
                if freeze_ms == 0 {
                    return;
                }
                let freeze_ms = freeze_ms.saturating_sub(dt_ms);
                self.phase = LevelPhase::Playing { freeze_ms };
                if freeze_ms == 0 {
                    self.scheduler.set_frozen(false);
                    broadcast(out, Notification::Resume);
                }
            }
            LevelPhase::LostLife {
                stage,
                remaining_ms,
            } => {
                let remaining_ms = remaining_ms.saturating_sub(dt_ms);
                if remaining_ms > 0 {
                    self.phase = LevelPhase::LostLife {
                        stage,
                        remaining_ms,
                    };
                    return;
                }
                self.advance_lost_life(stage, out);
            }
            LevelPhase::LevelComplete {
                stage,
                remaining_ms,
            } => {
                let remaining_ms = remaining_ms.saturating_sub(dt_ms);
                if remaining_ms > 0 {
                    self.phase = LevelPhase::LevelComplete {
                        stage,
                        remaining_ms,
                    };
                    return;
                }
                match stage {
                    LevelCompleteStage::MazeFlash => {
                        self.phase = LevelPhase::LevelComplete {
                            stage: LevelCompleteStage::FadeOut,
                            remaining_ms: LEVEL_FADE_OUT_MS,
                        };
                        broadcast(out, Notification::Hide);
                    }
                    LevelCompleteStage::FadeOut => self.start_next_level(out),
                }
            }
        }
    }

    fn advance_lost_life(&mut self, stage: LostLifeStage, out: &mut Vec<Envelope>) {
        match stage {
            LostLifeStage::Stopped => {
                self.phase = LevelPhase::LostLife {
                    stage: LostLifeStage::Dying,
                    remaining_ms: LOST_LIFE_DYING_MS,
                };
                out.push(Envelope::notify(AgentId::Player, Notification::LifeLost));
                for ghost in GhostName::ALL {
                    out.push(Envelope::notify(AgentId::Ghost(ghost), Notification::Hide));
                }
            }
            LostLifeStage::Dying => {
                self.phase = LevelPhase::LostLife {
                    stage: LostLifeStage::Finished,
                    remaining_ms: LOST_LIFE_FINISHED_MS,
                };
                out.push(Envelope::notify(AgentId::Player, Notification::Hide));
            }
            LostLifeStage::Finished => {
                if self.lives == 0 {
                    info!(
                        points = self.score.total_points,
                        level = self.level,
                        "game over"
                    );
                    self.phase = LevelPhase::GameOver;
                    self.barrier.cancel();
                    self.events.push(RuntimeEvent::GameOver);
                    return;
                }
                self.scheduler = ModeScheduler::new(&self.level_config);
                out.extend(self.enter_get_ready(false));
            }
        }
    }

    fn start_next_level(&mut self, out: &mut Vec<Envelope>) {
        self.level += 1;
        self.level_config = LevelConfig::for_level(self.level);
        self.maze = (*self.layout).clone();
        self.scheduler = ModeScheduler::new(&self.level_config);
        self.house = HouseGate::new(self.level_config.personal_house_thresholds);
        self.fruit = FruitLifecycle::new(self.config.fruit_pellet_thresholds);
        self.score.level_pellets = 0;
        info!(level = self.level, "level started");
        self.events.push(RuntimeEvent::LevelStarted { level: self.level });
        out.extend(self.enter_get_ready(true));
    }

    /// Puts every agent back at its start and holds it for the get-ready delay.
    fn enter_get_ready(&mut self, new_level: bool) -> Vec<Envelope> {
        self.fright_chain = 0;
        self.dead_ghosts.clear();
        self.revived_ghosts.clear();
        self.phase = LevelPhase::GetReady {
            remaining_ms: GET_READY_MS,
        };

        let mut out = Vec::new();
        for agent in AGENT_IDS {
            if new_level {
                out.push(Envelope::notify(
                    agent,
                    Notification::NewLevel(self.level_config.speeds.clone()),
                ));
            }
            out.push(Envelope::notify(agent, Notification::Reposition));
            out.push(Envelope::notify(agent, Notification::Show));
            out.push(Envelope::notify(agent, Notification::GetReady));
        }
        out
    }

    fn advance_playing(&mut self, dt_ms: u64, out: &mut Vec<Envelope>) {
        for signal in self.scheduler.advance(dt_ms) {
            match signal {
                SchedulerSignal::ModeChanged(mode) => {
                    debug!(?mode, "scatter/chase switch");
                    self.events.push(RuntimeEvent::ModeChanged { mode });
                    let notification = match mode {
                        ScatterChase::Scatter => Notification::Scatter,
                        ScatterChase::Chase => Notification::Chase,
                    };
                    broadcast_ghosts(out, notification);
                }
                SchedulerSignal::FrightenedEndingSoon => {
                    self.events.push(RuntimeEvent::FrightenedEndingSoon);
                    broadcast_ghosts(out, Notification::FrightenedEndingSoon);
                }
                SchedulerSignal::FrightenedEnded => {
                    self.fright_chain = 0;
                    self.events.push(RuntimeEvent::FrightenedEnded);
                    broadcast(out, Notification::FrightenedEnded);
                }
            }
        }

        let released = [self.house.advance(dt_ms), self.house.poll()];
        for ghost in released.into_iter().flatten() {
            self.release_ghost(ghost, out);
        }

        if self.fruit.advance(dt_ms) {
            self.events.push(RuntimeEvent::FruitExpired);
        }
    }

    fn release_ghost(&mut self, ghost: GhostName, out: &mut Vec<Envelope>) {
        debug!(?ghost, "released from house");
        self.events.push(RuntimeEvent::GhostReleased { ghost });
        out.push(Envelope::notify(
            AgentId::Ghost(ghost),
            Notification::LeaveHouse,
        ));
    }

    fn level_tags(&self) -> ModeTags {
        let mut tags = ModeTags::new();
        match self.phase {
            LevelPhase::Initial | LevelPhase::GetReady { .. } => {
                tags.insert(ModeTag::GetReady);
            }
            LevelPhase::Playing { freeze_ms } => {
                tags.insert(ModeTag::Playing);
                if freeze_ms > 0 {
                    tags.insert(ModeTag::MovementPaused);
                }
            }
            LevelPhase::LostLife { stage, .. } => {
                tags.insert(ModeTag::MovementPaused);
                if stage != LostLifeStage::Stopped {
                    tags.insert(ModeTag::Dying);
                }
            }
            LevelPhase::LevelComplete { stage, .. } => {
                tags.insert(match stage {
                    LevelCompleteStage::MazeFlash => ModeTag::MazeFlashing,
                    LevelCompleteStage::FadeOut => ModeTag::LevelFadeOut,
                });
            }
            LevelPhase::GameOver => {
                tags.insert(ModeTag::GameOver);
            }
        }
        tags
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        let player = self.committed.get(&AgentId::Player);
        let (position, direction) = start_pose(AgentId::Player);
        Snapshot {
            tick: self.tick,
            level: self.level,
            level_tags: self.level_tags(),
            score: ScoreView {
                total_points: self.score.total_points,
                pellets_eaten: self.score.pellets_eaten,
                pellets_remaining: self.maze.pellets_remaining(),
                ghosts_eaten: self.score.ghosts_eaten,
                lives_remaining: self.lives,
            },
            player: PlayerView {
                position: player.map_or(position, |update| update.position),
                direction: player.map_or(direction, |update| update.direction),
                tags: player.map(|update| update.tags.clone()).unwrap_or_default(),
            },
            ghosts: GhostName::ALL
                .into_iter()
                .filter_map(|name| {
                    self.committed
                        .get(&AgentId::Ghost(name))
                        .map(|update| GhostView {
                            name,
                            position: update.position,
                            direction: update.direction,
                            tags: update.tags.clone(),
                        })
                })
                .collect(),
            fruit: self.fruit.view(),
            events,
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            level_reached: self.level,
            total_points: self.score.total_points,
            pellets_eaten: self.score.pellets_eaten,
            ghosts_eaten: self.score.ghosts_eaten,
            ticks: self.tick,
            duration_ms: self.elapsed_ms,
            finished_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn broadcast(out: &mut Vec<Envelope>, notification: Notification) {
    out.extend(
        AGENT_IDS
            .into_iter()
            .map(|agent| Envelope::notify(agent, notification.clone())),
    );
}

fn broadcast_ghosts(out: &mut Vec<Envelope>, notification: Notification) {
    out.extend(
        GhostName::ALL
            .into_iter()
            .map(|ghost| Envelope::notify(AgentId::Ghost(ghost), notification.clone())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        FRUIT_DROP_TILE, GHOST_BASE_POINTS, GHOST_EATEN_FREEZE_MS, LOST_LIFE_STOPPED_MS,
        MAZE_FLASH_MS, PELLET_POINTS,
    };
    use crate::maze::TileType;
    use crate::position::{Position, TilePoint};

    fn orchestrator(config: GameConfig) -> Orchestrator {
        let layout = Arc::new(Maze::classic().expect("classic maze"));
        Orchestrator::new(config, layout)
    }

    /// Started and past get-ready, with the first tick's barrier open.
    fn playing(config: GameConfig) -> Orchestrator {
        let mut o = orchestrator(config);
        o.start();
        o.on_timer(GET_READY_MS);
        assert_eq!(o.phase(), LevelPhase::Playing { freeze_ms: 0 });
        assert!(o.barrier.is_open());
        o
    }

    /// Playing with a frightened period running.
    fn frightened(config: GameConfig) -> Orchestrator {
        let mut o = playing(config);
        assert!(o.scheduler.start_frightened());
        o
    }

    fn parked(ghost: GhostName) -> Position {
        Position::centered(32, 1 + ghost.index() as i32 * 3)
    }

    fn update(agent: AgentId, tick: u64, position: Position, tags: &[ModeTag]) -> PositionUpdate {
        PositionUpdate {
            agent,
            tick,
            position,
            direction: Direction::Left,
            tags: tags.iter().copied().collect(),
        }
    }

    /// Answers the open barrier for every agent; ghosts not listed sit far away.
    fn reply(
        o: &mut Orchestrator,
        player: Position,
        ghosts: &[(GhostName, Position, &[ModeTag])],
    ) -> Vec<Envelope> {
        let tick = o.barrier.tick();
        let mut out = o.on_update(update(AgentId::Player, tick, player, &[ModeTag::Playing]));
        for name in GhostName::ALL {
            let (position, tags) = ghosts
                .iter()
                .find(|(ghost, _, _)| *ghost == name)
                .map(|(_, position, tags)| (*position, *tags))
                .unwrap_or((parked(name), &[ModeTag::Playing][..]));
            out.extend(o.on_update(update(AgentId::Ghost(name), tick, position, tags)));
        }
        out
    }

    fn has_notification(out: &[Envelope], to: AgentId, notification: &Notification) -> bool {
        out.iter().any(|envelope| {
            envelope.to == to && envelope.command == AgentCommand::Notify(notification.clone())
        })
    }

    #[test]
    fn start_spawns_every_agent_into_get_ready() {
        let mut o = orchestrator(GameConfig::default());
        let out = o.start();
        for agent in AGENT_IDS {
            assert!(has_notification(&out, agent, &Notification::Reposition));
            assert!(has_notification(&out, agent, &Notification::GetReady));
        }
        assert!(matches!(o.phase(), LevelPhase::GetReady { .. }));
        assert!(o.start().is_empty());
        let snapshot = o.build_snapshot(true);
        assert!(snapshot.level_tags.contains(&ModeTag::GetReady));
        assert_eq!(snapshot.events, vec![RuntimeEvent::LevelStarted { level: 1 }]);
    }

    #[test]
    fn get_ready_expiry_resumes_agents_and_releases_first_pursuer() {
        let mut o = orchestrator(GameConfig::default());
        o.start();
        assert!(o.on_timer(GET_READY_MS - 16).iter().all(|e| !matches!(
            e.command,
            AgentCommand::Notify(Notification::Resume)
        )));
        reply(&mut o, Position::centered(26, 13), &[]);
        let out = o.on_timer(16);
        assert!(has_notification(&out, AgentId::Player, &Notification::Resume));
        // tick timers run in the first playing tick; Pinky's threshold is zero
        let out = {
            reply(&mut o, Position::centered(26, 13), &[]);
            o.on_timer(16)
        };
        assert!(has_notification(
            &out,
            AgentId::Ghost(GhostName::Pinky),
            &Notification::LeaveHouse
        ));
    }

    #[test]
    fn sync_is_broadcast_to_every_agent() {
        let o = &mut playing(GameConfig::default());
        reply(o, Position::centered(26, 13), &[]);
        let out = o.on_timer(16);
        let synced: BTreeSet<AgentId> = out
            .iter()
            .filter(|e| matches!(e.command, AgentCommand::Sync(_)))
            .map(|e| e.to)
            .collect();
        assert_eq!(synced.len(), AGENT_IDS.len());
    }

    #[test]
    fn open_barrier_skips_the_next_tick() {
        let mut o = playing(GameConfig::default());
        let tick = o.tick();
        let out = o.on_timer(16);
        assert!(out.iter().all(|e| !matches!(e.command, AgentCommand::Sync(_))));
        assert_eq!(o.tick(), tick);
    }

    #[test]
    fn pellet_consumption_scores_and_skips_frames() {
        let mut o = playing(GameConfig::default());
        let out = reply(&mut o, Position::centered(4, 1), &[]);
        assert_eq!(o.total_points(), PELLET_POINTS);
        assert_eq!(o.maze().get_tile_type(TilePoint::new(4, 1)), TileType::Empty);
        assert!(has_notification(&out, AgentId::Player, &Notification::AtePellet));
        let events = o.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PelletEaten { row: 4, col: 1 }));
    }

    #[test]
    fn seventieth_pellet_spawns_fruit_at_drop_tile() {
        let mut o = playing(GameConfig::default());
        o.score.level_pellets = 69;
        reply(&mut o, Position::centered(4, 2), &[]);
        let snapshot = o.build_snapshot(true);
        let fruit = snapshot.fruit.expect("fruit spawned");
        assert_eq!((fruit.row, fruit.col), FRUIT_DROP_TILE);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::FruitSpawned { .. })));

        o.on_timer(16);
        let drop = Position::centered(FRUIT_DROP_TILE.0, FRUIT_DROP_TILE.1);
        reply(&mut o, drop, &[]);
        assert_eq!(o.total_points(), PELLET_POINTS + fruit.value);
        assert!(o.build_snapshot(true).fruit.is_none());
    }

    #[test]
    fn frightened_collision_kills_pursuer_once() {
        let mut o = frightened(GameConfig::default());
        let spot = Position::centered(14, 13);
        let out = reply(
            &mut o,
            spot,
            &[(GhostName::Blinky, spot, &[ModeTag::Frightened])],
        );
        let blinky = AgentId::Ghost(GhostName::Blinky);
        assert!(has_notification(&out, blinky, &Notification::Eaten));
        assert!(has_notification(&out, AgentId::Player, &Notification::Pause));
        assert_eq!(o.total_points(), GHOST_BASE_POINTS);
        assert_eq!(
            o.phase(),
            LevelPhase::Playing {
                freeze_ms: GHOST_EATEN_FREEZE_MS
            }
        );

        let out = o.on_timer(GHOST_EATEN_FREEZE_MS);
        assert!(has_notification(&out, blinky, &Notification::Resume));
        reply(&mut o, spot, &[(GhostName::Blinky, spot, &[ModeTag::ReturningHome])]);
        o.on_timer(16);
        reply(&mut o, spot, &[(GhostName::Blinky, spot, &[ModeTag::Dead])]);

        assert_eq!(o.total_points(), GHOST_BASE_POINTS);
        assert_eq!(o.build_snapshot(true).score.ghosts_eaten, 1);
        assert_eq!(o.phase(), LevelPhase::Playing { freeze_ms: 0 });
        assert_eq!(o.lives(), GameConfig::default().starting_lives);
    }

    #[test]
    fn stale_frightened_tag_after_the_period_ends_is_lethal() {
        let mut o = playing(GameConfig::default());
        assert!(o.scheduler.frightened_phase().is_none());
        let spot = Position::centered(14, 13);
        let out = reply(
            &mut o,
            spot,
            &[(GhostName::Blinky, spot, &[ModeTag::Frightened])],
        );
        assert!(!has_notification(
            &out,
            AgentId::Ghost(GhostName::Blinky),
            &Notification::Eaten
        ));
        assert!(o.dead_ghosts.is_empty());
        assert_eq!(o.total_points(), 0);
        assert_eq!(o.lives(), GameConfig::default().starting_lives - 1);
    }

    #[test]
    fn collisions_are_not_checked_during_the_freeze() {
        let mut o = frightened(GameConfig::default());
        let spot = Position::centered(14, 13);
        reply(&mut o, spot, &[(GhostName::Blinky, spot, &[ModeTag::Frightened])]);
        o.on_timer(16);
        reply(&mut o, spot, &[(GhostName::Pinky, spot, &[ModeTag::Playing])]);
        assert_eq!(o.lives(), GameConfig::default().starting_lives);
    }

    #[test]
    fn successive_pursuers_score_double() {
        let mut o = frightened(GameConfig::default());
        let spot = Position::centered(14, 13);
        reply(
            &mut o,
            spot,
            &[
                (GhostName::Blinky, spot, &[ModeTag::Frightened]),
                (GhostName::Pinky, spot, &[ModeTag::Frightened]),
            ],
        );
        assert_eq!(o.total_points(), GHOST_BASE_POINTS * 3);
    }

    #[test]
    fn revived_pursuer_leaves_the_dead_set() {
        let mut o = frightened(GameConfig::default());
        let spot = Position::centered(14, 13);
        reply(&mut o, spot, &[(GhostName::Blinky, spot, &[ModeTag::Frightened])]);
        assert!(o.dead_ghosts.contains(&GhostName::Blinky));
        o.on_timer(GHOST_EATEN_FREEZE_MS);
        reply(&mut o, Position::centered(26, 13), &[(GhostName::Blinky, spot, &[ModeTag::Playing])]);
        assert!(o.dead_ghosts.is_empty());
        assert!(o
            .build_snapshot(true)
            .events
            .contains(&RuntimeEvent::GhostRevived {
                ghost: GhostName::Blinky
            }));
    }

    #[test]
    fn power_pellet_spares_dead_pursuers() {
        let mut o = playing(GameConfig::default());
        o.dead_ghosts.insert(GhostName::Inky);
        let out = reply(
            &mut o,
            Position::centered(6, 1),
            &[(GhostName::Inky, parked(GhostName::Inky), &[ModeTag::ReturningHome])],
        );
        assert!(has_notification(&out, AgentId::Player, &Notification::AtePowerPellet));
        assert!(has_notification(
            &out,
            AgentId::Ghost(GhostName::Blinky),
            &Notification::Frightened
        ));
        assert!(!has_notification(
            &out,
            AgentId::Ghost(GhostName::Inky),
            &Notification::Frightened
        ));
        assert!(o.revived_ghosts.contains(&GhostName::Inky));
    }

    #[test]
    fn lethal_collision_to_game_over_ignores_input() {
        let mut o = playing(GameConfig {
            starting_lives: 1,
            ..GameConfig::default()
        });
        let spot = Position::centered(20, 6);
        let out = reply(&mut o, spot, &[(GhostName::Clyde, spot, &[ModeTag::Playing])]);
        assert!(has_notification(&out, AgentId::Player, &Notification::Pause));
        assert_eq!(o.lives(), 0);

        let out = o.on_timer(LOST_LIFE_STOPPED_MS);
        assert!(has_notification(&out, AgentId::Player, &Notification::LifeLost));
        o.on_timer(LOST_LIFE_DYING_MS);
        o.on_timer(LOST_LIFE_FINISHED_MS);
        assert!(o.is_game_over());

        assert!(o.on_input(Direction::Up).is_empty());
        assert!(o.on_timer(16).is_empty());
        let snapshot = o.build_snapshot(true);
        assert!(snapshot.level_tags.contains(&ModeTag::GameOver));
        assert!(snapshot.events.contains(&RuntimeEvent::GameOver));
    }

    #[test]
    fn life_loss_with_lives_left_returns_to_get_ready() {
        let mut o = playing(GameConfig::default());
        let spot = Position::centered(20, 6);
        reply(&mut o, spot, &[(GhostName::Blinky, spot, &[ModeTag::Playing])]);
        o.on_timer(LOST_LIFE_STOPPED_MS);
        o.on_timer(LOST_LIFE_DYING_MS);
        let out = o.on_timer(LOST_LIFE_FINISHED_MS);
        assert!(matches!(o.phase(), LevelPhase::GetReady { .. }));
        assert_eq!(o.lives(), GameConfig::default().starting_lives - 1);
        assert!(has_notification(&out, AgentId::Player, &Notification::Reposition));
        assert!(o.house.is_global_active());
    }

    #[test]
    fn late_and_duplicate_updates_leave_the_frame_alone() {
        let mut o = playing(GameConfig::default());
        let tick = o.barrier.tick();
        let first = Position::centered(26, 13);
        o.on_update(update(AgentId::Player, tick, first, &[ModeTag::Playing]));
        o.on_update(update(
            AgentId::Player,
            tick,
            Position::centered(20, 6),
            &[ModeTag::Playing],
        ));
        for name in GhostName::ALL {
            o.on_update(update(AgentId::Ghost(name), tick, parked(name), &[ModeTag::Playing]));
        }
        assert_eq!(o.committed(AgentId::Player).map(|u| u.position), Some(first));

        // a ghost standing on the player arrives after the barrier closed
        let late = o.on_update(update(
            AgentId::Ghost(GhostName::Blinky),
            tick,
            first,
            &[ModeTag::Playing],
        ));
        assert!(late.is_empty());
        assert_eq!(
            o.committed(AgentId::Ghost(GhostName::Blinky)).map(|u| u.position),
            Some(parked(GhostName::Blinky))
        );
        assert_eq!(o.lives(), GameConfig::default().starting_lives);
    }

    #[test]
    fn extra_life_is_awarded_once() {
        let mut o = playing(GameConfig::default());
        o.score.total_points = o.config.extra_life_score - PELLET_POINTS;
        reply(&mut o, Position::centered(4, 1), &[]);
        assert_eq!(o.lives(), GameConfig::default().starting_lives + 1);
        o.on_timer(16);
        reply(&mut o, Position::centered(4, 2), &[]);
        assert_eq!(o.lives(), GameConfig::default().starting_lives + 1);
    }

    #[test]
    fn clearing_the_maze_advances_to_the_next_level() {
        let mut o = playing(GameConfig::default());
        for row in 0..o.maze.rows() {
            for col in 0..o.maze.cols() {
                let tile = TilePoint::new(row, col);
                if (row, col) != (4, 1) && o.maze.get_tile_type(tile).is_pellet() {
                    o.maze.set_tile_type(tile, TileType::Empty);
                }
            }
        }
        assert_eq!(o.maze.pellets_remaining(), 1);
        let out = reply(&mut o, Position::centered(4, 1), &[]);
        assert!(has_notification(&out, AgentId::Player, &Notification::Pause));
        assert!(matches!(
            o.phase(),
            LevelPhase::LevelComplete {
                stage: LevelCompleteStage::MazeFlash,
                ..
            }
        ));

        o.on_timer(MAZE_FLASH_MS);
        let out = o.on_timer(LEVEL_FADE_OUT_MS);
        assert_eq!(o.level(), 2);
        assert!(matches!(o.phase(), LevelPhase::GetReady { .. }));
        assert_eq!(o.maze.pellets_remaining(), o.layout.pellets_remaining());
        assert!(out.iter().any(|e| matches!(
            &e.command,
            AgentCommand::Notify(Notification::NewLevel(speeds)) if speeds.player == 90
        )));
    }

    #[test]
    fn scheduler_switches_pursuers_to_chase() {
        let mut o = playing(GameConfig::default());
        let mut switched = false;
        for _ in 0..(7_000 / 100) {
            reply(&mut o, Position::centered(26, 13), &[]);
            let out = o.on_timer(100);
            if has_notification(&out, AgentId::Ghost(GhostName::Blinky), &Notification::Chase) {
                switched = true;
                break;
            }
        }
        assert!(switched);
        assert_eq!(o.scatter_chase(), ScatterChase::Chase);
    }
}
