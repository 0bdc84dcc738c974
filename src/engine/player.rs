//! Player agent.
//!
//! Movement is resolved one sub-tile step at a time through [`MOVEMENT_RULES`],
//! an ordered guard list where the first matching rule wins. Pellet frame
//! skips and the speed mode are independent of the movement state and survive
//! changes to it.

use std::sync::Arc;

use crate::constants::{SpeedTable, LOST_LIFE_DYING_MS, PELLET_FRAME_SKIP, POWER_PELLET_FRAME_SKIP};
use crate::engine::messages::{AgentCommand, GameSync, Notification, PositionUpdate};
use crate::engine::utils::{drain_move_buffer, start_pose};
use crate::maze::Maze;
use crate::position::{is_centered_across, project_position, recenter_across, Position};
use crate::types::{AgentId, Direction, ModeTag, ModeTags};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Normal,
    Turning,
    Cornering,
    Reversing,
    Walled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedMode {
    Normal,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPhase {
    Moving,
    Paused,
    Dying { remaining_ms: u64 },
    WaitingToRestart,
}

pub struct MovementRule {
    pub name: &'static str,
    applies: fn(&PlayerAgent) -> bool,
    apply: fn(&mut PlayerAgent),
}

pub const MOVEMENT_RULES: [MovementRule; 5] = [
    MovementRule {
        name: "corner",
        applies: |p| p.turn_is_open() && p.in_cornering_window(),
        apply: PlayerAgent::begin_cornering,
    },
    MovementRule {
        name: "snap_turn",
        applies: |p| p.turn_is_open() && p.position.is_centered_along(p.direction),
        apply: PlayerAgent::snap_turn,
    },
    MovementRule {
        name: "reverse",
        applies: |p| p.requested == Some(p.direction.reverse()),
        apply: PlayerAgent::reverse,
    },
    MovementRule {
        name: "walled",
        applies: |p| p.position.is_centered_along(p.direction) && p.blocked(p.direction),
        apply: |p| p.movement = Movement::Walled,
    },
    MovementRule {
        name: "straight",
        applies: |_| true,
        apply: PlayerAgent::go_straight,
    },
];

pub struct PlayerAgent {
    maze: Arc<Maze>,
    speeds: SpeedTable,
    phase: PlayerPhase,
    position: Position,
    direction: Direction,
    requested: Option<Direction>,
    movement: Movement,
    frame_skip: u8,
    speed_mode: SpeedMode,
    move_buffer: f32,
    hidden: bool,
}

impl PlayerAgent {
    pub fn new(maze: Arc<Maze>, speeds: SpeedTable) -> Self {
        let (position, direction) = start_pose(AgentId::Player);
        Self {
            maze,
            speeds,
            phase: PlayerPhase::Paused,
            position,
            direction,
            requested: None,
            movement: Movement::Normal,
            frame_skip: 0,
            speed_mode: SpeedMode::Normal,
            move_buffer: 0.0,
            hidden: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn requested(&self) -> Option<Direction> {
        self.requested
    }

    pub fn handle(&mut self, command: AgentCommand) -> Option<PositionUpdate> {
        match command {
            AgentCommand::Sync(sync) => Some(self.on_sync(&sync)),
            AgentCommand::Input(direction) => {
                if matches!(
                    self.phase,
                    PlayerPhase::Moving | PlayerPhase::Paused
                ) {
                    self.requested = Some(direction);
                }
                None
            }
            AgentCommand::Notify(notification) => {
                self.notify(notification);
                None
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::NewLevel(speeds) => self.speeds = speeds,
            Notification::Reposition => self.reset(),
            Notification::GetReady | Notification::Pause => {
                if self.phase == PlayerPhase::Moving {
                    self.phase = PlayerPhase::Paused;
                }
            }
            Notification::Resume => {
                if self.phase == PlayerPhase::Paused {
                    self.phase = PlayerPhase::Moving;
                }
            }
            Notification::Hide => self.hidden = true,
            Notification::Show => self.hidden = false,
            Notification::LifeLost => {
                if matches!(self.phase, PlayerPhase::Paused | PlayerPhase::Moving) {
                    self.phase = PlayerPhase::Dying {
                        remaining_ms: LOST_LIFE_DYING_MS,
                    };
                    self.requested = None;
                }
            }
            Notification::AtePellet => self.frame_skip = self.frame_skip.max(PELLET_FRAME_SKIP),
            Notification::AtePowerPellet => {
                self.frame_skip = self.frame_skip.max(POWER_PELLET_FRAME_SKIP)
            }
            Notification::Frightened => self.speed_mode = SpeedMode::Frightened,
            Notification::FrightenedEnded => self.speed_mode = SpeedMode::Normal,
            Notification::FrightenedEndingSoon
            | Notification::Scatter
            | Notification::Chase
            | Notification::Eaten
            | Notification::LeaveHouse => {}
        }
    }

    fn reset(&mut self) {
        let (position, direction) = start_pose(AgentId::Player);
        self.position = position;
        self.direction = direction;
        self.requested = None;
        self.movement = Movement::Normal;
        self.frame_skip = 0;
        self.speed_mode = SpeedMode::Normal;
        self.move_buffer = 0.0;
        self.phase = PlayerPhase::Paused;
    }

    fn on_sync(&mut self, sync: &GameSync) -> PositionUpdate {
        self.advance(sync.dt_ms);
        PositionUpdate {
            agent: AgentId::Player,
            tick: sync.tick,
            position: self.position,
            direction: self.direction,
            tags: self.tags(),
        }
    }

    fn advance(&mut self, dt_ms: u64) {
        match self.phase {
            PlayerPhase::Dying { remaining_ms } => {
                let remaining_ms = remaining_ms.saturating_sub(dt_ms);
                self.phase = if remaining_ms == 0 {
                    PlayerPhase::WaitingToRestart
                } else {
                    PlayerPhase::Dying { remaining_ms }
                };
            }
            PlayerPhase::Moving => {
                let speed_pct = self.speed_pct();
                let steps = drain_move_buffer(&mut self.move_buffer, speed_pct, dt_ms);
                for _ in 0..steps {
                    if self.frame_skip > 0 {
                        self.frame_skip -= 1;
                        continue;
                    }
                    self.step();
                }
            }
            PlayerPhase::Paused | PlayerPhase::WaitingToRestart => {}
        }
    }

    fn speed_pct(&self) -> u32 {
        match self.speed_mode {
            SpeedMode::Normal => self.speeds.player,
            SpeedMode::Frightened => self.speeds.player_frightened,
        }
    }

    /// One sub-tile unit of movement.
    pub fn step(&mut self) {
        if self.movement == Movement::Cornering {
            self.corner_step();
            return;
        }
        if self.requested == Some(self.direction) {
            self.requested = None;
        }
        if let Some(rule) = MOVEMENT_RULES.iter().find(|rule| (rule.applies)(&*self)) {
            (rule.apply)(self);
        }
    }

    pub fn tags(&self) -> ModeTags {
        let mut tags = ModeTags::new();
        match self.phase {
            PlayerPhase::Moving => {
                tags.insert(ModeTag::Playing);
                if self.movement == Movement::Walled {
                    tags.insert(ModeTag::Walled);
                }
            }
            PlayerPhase::Paused => {
                tags.insert(ModeTag::MovementPaused);
            }
            PlayerPhase::Dying { .. } => {
                tags.insert(ModeTag::Dying);
            }
            PlayerPhase::WaitingToRestart => {
                tags.insert(ModeTag::Hidden);
            }
        }
        if self.hidden {
            tags.insert(ModeTag::Hidden);
        }
        tags
    }

    fn blocked(&self, direction: Direction) -> bool {
        let ahead = project_position(&self.maze, self.position, direction, true);
        self.maze.is_blocking(ahead.tile())
    }

    fn perpendicular_request(&self) -> Option<Direction> {
        self.requested
            .filter(|requested| requested.is_perpendicular_to(self.direction))
    }

    fn turn_is_open(&self) -> bool {
        self.perpendicular_request()
            .is_some_and(|requested| !self.blocked(requested))
    }

    fn in_cornering_window(&self) -> bool {
        self.position.is_past_center(self.direction) && !self.position.is_at_edge(self.direction)
    }

    fn take_request(&mut self) -> Direction {
        self.requested.take().unwrap_or(self.direction)
    }

    fn begin_cornering(&mut self) {
        self.direction = self.take_request();
        self.movement = Movement::Cornering;
        self.corner_step();
    }

    /// Moves along the new heading while pulling the old axis back to centre.
    fn corner_step(&mut self) {
        let moved = project_position(&self.maze, self.position, self.direction, false);
        self.position = recenter_across(moved, self.direction);
        if is_centered_across(self.position, self.direction) {
            self.movement = Movement::Normal;
        }
    }

    fn snap_turn(&mut self) {
        self.direction = self.take_request();
        self.movement = Movement::Turning;
        self.advance_one();
    }

    fn reverse(&mut self) {
        self.direction = self.take_request();
        self.movement = Movement::Reversing;
        self.advance_one();
    }

    fn go_straight(&mut self) {
        self.movement = Movement::Normal;
        self.advance_one();
    }

    fn advance_one(&mut self) {
        self.position = project_position(&self.maze, self.position, self.direction, false);
    }
}
