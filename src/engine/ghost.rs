//! Pursuer agent: house exit, target-driven pathing and the chase-mode machine.

use std::sync::Arc;

use tracing::warn;

use crate::constants::{
    SpeedTable, HOUSE_DOOR_COL_OFFSET, HOUSE_EXIT_TILE, RETURNING_HOME_SPEED_PCT,
    TILE_CENTER_ROW_OFFSET, TILE_SUBDIVISIONS,
};
use crate::engine::messages::{AgentCommand, GameSync, Notification, PositionUpdate};
use crate::engine::utils::{drain_move_buffer, start_pose};
use crate::maze::{Maze, ZoneKind};
use crate::position::{project_position, Position, TilePoint};
use crate::rng::Rng;
use crate::targeting::{target_tile, TargetContext};
use crate::types::{AgentId, Direction, GhostName, ModeTag, ModeTags, ScatterChase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChaseMode {
    /// Scatter or chase, whichever the saved `history` says.
    Normal,
    Frightened { ending_soon: bool },
    Dead,
    ReturningHome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HouseState {
    Inside,
    Leaving,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneState {
    Open,
    Tunnel,
    RedZone,
}

fn neighbor(maze: &Maze, tile: TilePoint, direction: Direction) -> TilePoint {
    project_position(maze, Position::centered(tile.row, tile.col), direction, true).tile()
}

/// Directions a pursuer may take from `tile`, in priority order: never back
/// the way it came, never into a blocking tile, and never up when `forbid_up`.
pub fn legal_directions(
    maze: &Maze,
    tile: TilePoint,
    heading: Direction,
    forbid_up: bool,
) -> Vec<Direction> {
    Direction::PRIORITY
        .into_iter()
        .filter(|direction| *direction != heading.reverse())
        .filter(|direction| !(forbid_up && *direction == Direction::Up))
        .filter(|direction| !maze.is_blocking(neighbor(maze, tile, *direction)))
        .collect()
}

/// Legal direction whose next tile is closest to `target`. Ties keep the
/// earlier direction in up, left, down, right order. `None` means the pursuer
/// is boxed in and has to reverse.
pub fn select_direction(
    maze: &Maze,
    tile: TilePoint,
    heading: Direction,
    target: TilePoint,
    forbid_up: bool,
) -> Option<Direction> {
    let mut best: Option<(Direction, i64)> = None;
    for direction in legal_directions(maze, tile, heading, forbid_up) {
        let distance = neighbor(maze, tile, direction).distance_sq(target);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((direction, distance)),
        }
    }
    best.map(|(direction, _)| direction)
}

pub struct GhostAgent {
    name: GhostName,
    maze: Arc<Maze>,
    rng: Rng,
    speeds: SpeedTable,
    position: Position,
    direction: Direction,
    chase: ChaseMode,
    history: ScatterChase,
    house: HouseState,
    zone: ZoneState,
    reverse_pending: bool,
    paused: bool,
    hidden: bool,
    move_buffer: f32,
    context: Option<TargetContext>,
}

impl GhostAgent {
    pub fn new(name: GhostName, maze: Arc<Maze>, speeds: SpeedTable, seed: u32) -> Self {
        let mut ghost = Self {
            name,
            maze,
            rng: Rng::fork(seed, name.index() as u32 + 1),
            speeds,
            position: Position::centered(0, 0),
            direction: Direction::Left,
            chase: ChaseMode::Normal,
            history: ScatterChase::Scatter,
            house: HouseState::Inside,
            zone: ZoneState::Open,
            reverse_pending: false,
            paused: true,
            hidden: false,
            move_buffer: 0.0,
            context: None,
        };
        ghost.reset();
        ghost
    }

    pub fn name(&self) -> GhostName {
        self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn chase_mode(&self) -> ChaseMode {
        self.chase
    }

    pub fn house_state(&self) -> HouseState {
        self.house
    }

    pub fn history(&self) -> ScatterChase {
        self.history
    }

    pub fn handle(&mut self, command: AgentCommand) -> Option<PositionUpdate> {
        match command {
            AgentCommand::Sync(sync) => Some(self.on_sync(&sync)),
            AgentCommand::Input(_) => None,
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
            Notification::GetReady | Notification::Pause => self.paused = true,
            Notification::Resume => {
                self.paused = false;
                if self.chase == ChaseMode::Dead {
                    self.chase = ChaseMode::ReturningHome;
                }
            }
            Notification::Hide => self.hidden = true,
            Notification::Show => self.hidden = false,
            Notification::Scatter => self.set_history(ScatterChase::Scatter),
            Notification::Chase => self.set_history(ScatterChase::Chase),
            Notification::Frightened => match self.chase {
                ChaseMode::Normal => {
                    self.chase = ChaseMode::Frightened { ending_soon: false };
                    self.reverse_pending = self.house == HouseState::Outside;
                }
                ChaseMode::Frightened { .. } => {
                    self.chase = ChaseMode::Frightened { ending_soon: false };
                }
                ChaseMode::Dead | ChaseMode::ReturningHome => {}
            },
            Notification::FrightenedEndingSoon => {
                if let ChaseMode::Frightened { .. } = self.chase {
                    self.chase = ChaseMode::Frightened { ending_soon: true };
                }
            }
            Notification::FrightenedEnded => {
                if let ChaseMode::Frightened { .. } = self.chase {
                    self.chase = ChaseMode::Normal;
                }
            }
            Notification::Eaten => {
                if let ChaseMode::Frightened { .. } = self.chase {
                    self.chase = ChaseMode::Dead;
                    self.reverse_pending = false;
                }
            }
            Notification::LeaveHouse => {
                if self.house == HouseState::Inside {
                    self.house = HouseState::Leaving;
                }
            }
            Notification::LifeLost | Notification::AtePellet | Notification::AtePowerPellet => {}
        }
    }

    fn set_history(&mut self, mode: ScatterChase) {
        self.history = mode;
        if self.chase == ChaseMode::Normal && self.house == HouseState::Outside {
            self.reverse_pending = true;
        }
    }

    fn reset(&mut self) {
        let (position, direction) = start_pose(AgentId::Ghost(self.name));
        self.position = position;
        self.direction = direction;
        self.chase = ChaseMode::Normal;
        self.history = ScatterChase::Scatter;
        self.house = if self.name == GhostName::Blinky {
            HouseState::Outside
        } else {
            HouseState::Inside
        };
        self.zone = ZoneState::Open;
        self.reverse_pending = false;
        self.paused = true;
        self.move_buffer = 0.0;
        self.context = None;
    }

    fn on_sync(&mut self, sync: &GameSync) -> PositionUpdate {
        let blinky_tile = sync
            .ghosts
            .get(&GhostName::Blinky)
            .map(|frame| frame.position.tile())
            .unwrap_or_else(|| self.position.tile());
        self.context = Some(TargetContext {
            player_tile: sync.player.position.tile(),
            player_direction: sync.player.direction,
            blinky_tile,
            own_tile: self.position.tile(),
        });
        self.advance(sync.dt_ms);
        PositionUpdate {
            agent: AgentId::Ghost(self.name),
            tick: sync.tick,
            position: self.position,
            direction: self.direction,
            tags: self.tags(),
        }
    }

    fn advance(&mut self, dt_ms: u64) {
        if self.paused || self.chase == ChaseMode::Dead || self.house == HouseState::Inside {
            return;
        }
        let speed_pct = self.speed_pct();
        let steps = drain_move_buffer(&mut self.move_buffer, speed_pct, dt_ms);
        for _ in 0..steps {
            self.step();
        }
    }

    fn speed_pct(&self) -> u32 {
        match (self.chase, self.zone) {
            (ChaseMode::ReturningHome, _) => RETURNING_HOME_SPEED_PCT,
            (ChaseMode::Dead, _) => 0,
            (ChaseMode::Frightened { .. }, ZoneState::Tunnel) => {
                self.speeds.ghost_frightened.min(self.speeds.ghost_tunnel)
            }
            (ChaseMode::Frightened { .. }, _) => self.speeds.ghost_frightened,
            (ChaseMode::Normal, ZoneState::Tunnel) => self.speeds.ghost_tunnel,
            (ChaseMode::Normal, _) => self.speeds.ghost,
        }
    }

    pub fn step(&mut self) {
        match self.house {
            HouseState::Inside => {}
            HouseState::Leaving => self.leave_house_step(),
            HouseState::Outside => self.roam_step(),
        }
    }

    /// Line up with the door column, then rise to the exit tile.
    fn leave_house_step(&mut self) {
        let sub = TILE_SUBDIVISIONS as i32;
        let door = HOUSE_EXIT_TILE.1 * sub + HOUSE_DOOR_COL_OFFSET as i32;
        let col = self.position.absolute_along(Direction::Left);
        let exit_row = HOUSE_EXIT_TILE.0;

        if col != door {
            self.direction = if col < door {
                Direction::Right
            } else {
                Direction::Left
            };
        } else if self.position.row > exit_row || self.position.row_offset > TILE_CENTER_ROW_OFFSET {
            self.direction = Direction::Up;
        }
        if col != door || self.position.row != exit_row || self.position.row_offset != TILE_CENTER_ROW_OFFSET {
            self.position = project_position(&self.maze, self.position, self.direction, false);
        }

        if self.position.row == exit_row
            && self.position.row_offset == TILE_CENTER_ROW_OFFSET
            && self.position.absolute_along(Direction::Left) == door
        {
            self.house = HouseState::Outside;
            self.direction = Direction::Left;
        }
    }

    fn roam_step(&mut self) {
        self.update_zone();
        if self.reverse_pending {
            self.reverse_pending = false;
            self.direction = self.direction.reverse();
        } else if self.position.is_at_tile_center() {
            let home = TilePoint::new(HOUSE_EXIT_TILE.0, HOUSE_EXIT_TILE.1);
            if self.chase == ChaseMode::ReturningHome && self.position.tile() == home {
                self.chase = ChaseMode::Normal;
            }
            self.direction = self.choose_direction();
        }
        self.position = project_position(&self.maze, self.position, self.direction, false);
    }

    fn update_zone(&mut self) {
        let tile = self.position.tile();
        self.zone = if self.maze.in_zone_kind(tile, ZoneKind::Tunnel) {
            ZoneState::Tunnel
        } else if self.maze.in_zone_kind(tile, ZoneKind::RedZone) {
            ZoneState::RedZone
        } else {
            ZoneState::Open
        };
    }

    fn choose_direction(&mut self) -> Direction {
        let tile = self.position.tile();
        let chosen = match self.chase {
            ChaseMode::Frightened { .. } => {
                let legal = legal_directions(&self.maze, tile, self.direction, false);
                if legal.is_empty() {
                    None
                } else {
                    Some(legal[self.rng.pick_index(legal.len())])
                }
            }
            ChaseMode::ReturningHome => {
                let home = TilePoint::new(HOUSE_EXIT_TILE.0, HOUSE_EXIT_TILE.1);
                select_direction(&self.maze, tile, self.direction, home, false)
            }
            ChaseMode::Normal => {
                let ctx = self.context.unwrap_or(TargetContext {
                    player_tile: tile,
                    player_direction: self.direction,
                    blinky_tile: tile,
                    own_tile: tile,
                });
                let ctx = TargetContext {
                    own_tile: tile,
                    ..ctx
                };
                let target = target_tile(self.name, self.history, &ctx);
                let forbid_up = self.zone == ZoneState::RedZone;
                select_direction(&self.maze, tile, self.direction, target, forbid_up)
            }
            ChaseMode::Dead => Some(self.direction),
        };
        chosen.unwrap_or_else(|| {
            warn!(ghost = ?self.name, row = tile.row, col = tile.col, "no legal move, reversing");
            self.direction.reverse()
        })
    }

    pub fn tags(&self) -> ModeTags {
        let mut tags = ModeTags::new();
        match self.chase {
            ChaseMode::Normal => {
                tags.insert(ModeTag::Playing);
            }
            ChaseMode::Frightened { ending_soon } => {
                tags.insert(ModeTag::Frightened);
                if ending_soon {
                    tags.insert(ModeTag::FrightenedEnding);
                }
            }
            ChaseMode::Dead => {
                tags.insert(ModeTag::Dead);
            }
            ChaseMode::ReturningHome => {
                tags.insert(ModeTag::ReturningHome);
            }
        }
        if self.paused {
            tags.insert(ModeTag::MovementPaused);
        }
        if self.hidden {
            tags.insert(ModeTag::Hidden);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::constants::get_speed_table;
    use crate::engine::messages::AgentFrame;

    const OPEN_ROOM: [&str; 5] = ["┌──", "│..", "│..", "│..", "└──"];
    const CORRIDOR: [&str; 3] = ["┌──", "│..", "└──"];

    fn classic() -> Arc<Maze> {
        Arc::new(Maze::classic().expect("classic maze"))
    }

    fn ghost(name: GhostName) -> GhostAgent {
        GhostAgent::new(name, classic(), get_speed_table(1), 7)
    }

    fn sync(tick: u64, dt_ms: u64, player: Position) -> AgentCommand {
        AgentCommand::Sync(GameSync {
            tick,
            dt_ms,
            player: AgentFrame {
                position: player,
                direction: Direction::Left,
            },
            ghosts: BTreeMap::new(),
        })
    }

    #[test]
    fn equal_distances_break_toward_left_over_right() {
        let maze = Maze::from_template(&OPEN_ROOM, &[]).expect("room");
        let chosen = select_direction(
            &maze,
            TilePoint::new(2, 2),
            Direction::Up,
            TilePoint::new(10, 2),
            false,
        );
        assert_eq!(chosen, Some(Direction::Left));
    }

    #[test]
    fn equal_distances_break_toward_up_over_left() {
        let maze = Maze::from_template(&OPEN_ROOM, &[]).expect("room");
        let chosen = select_direction(
            &maze,
            TilePoint::new(2, 2),
            Direction::Left,
            TilePoint::new(-1, -1),
            false,
        );
        assert_eq!(chosen, Some(Direction::Up));
    }

    #[test]
    fn reversal_is_excluded_while_other_moves_exist() {
        let maze = Maze::from_template(&OPEN_ROOM, &[]).expect("room");
        // target straight behind: still may not reverse
        let chosen = select_direction(
            &maze,
            TilePoint::new(2, 2),
            Direction::Up,
            TilePoint::new(3, 2),
            false,
        );
        assert_ne!(chosen, Some(Direction::Down));
    }

    #[test]
    fn dead_end_yields_no_candidate() {
        let maze = Maze::from_template(&CORRIDOR, &[]).expect("corridor");
        let chosen = select_direction(
            &maze,
            TilePoint::new(1, 1),
            Direction::Left,
            TilePoint::new(1, 4),
            false,
        );
        assert_eq!(chosen, None);
    }

    #[test]
    fn red_zone_forbids_turning_up() {
        let maze = classic();
        let tile = TilePoint::new(14, 12);
        let target = TilePoint::new(0, 12);
        assert_eq!(
            select_direction(&maze, tile, Direction::Left, target, false),
            Some(Direction::Up)
        );
        assert_eq!(
            select_direction(&maze, tile, Direction::Left, target, true),
            Some(Direction::Left)
        );
    }

    #[test]
    fn house_entrance_is_never_a_candidate() {
        let maze = classic();
        // (14, 13) sits right above the entrance
        let legal = legal_directions(&maze, TilePoint::new(14, 13), Direction::Left, false);
        assert!(!legal.contains(&Direction::Down));
    }

    #[test]
    fn leaves_house_through_the_door() {
        let mut inky = ghost(GhostName::Inky);
        inky.handle(AgentCommand::Notify(Notification::Resume));
        inky.handle(AgentCommand::Notify(Notification::LeaveHouse));
        assert_eq!(inky.house_state(), HouseState::Leaving);
        for _ in 0..64 {
            inky.step();
            if inky.house_state() == HouseState::Outside {
                break;
            }
        }
        assert_eq!(inky.house_state(), HouseState::Outside);
        assert_eq!(inky.position(), Position::new(14, 13, 4, 7));
        assert_eq!(inky.direction(), Direction::Left);
    }

    #[test]
    fn waits_inside_until_released() {
        let mut pinky = ghost(GhostName::Pinky);
        pinky.handle(AgentCommand::Notify(Notification::Resume));
        let start = pinky.position();
        let update = pinky.handle(sync(1, 1_000, Position::centered(26, 13))).expect("reply");
        assert_eq!(update.position, start);
    }

    #[test]
    fn mode_change_reverses_outside_pursuers() {
        let mut blinky = ghost(GhostName::Blinky);
        blinky.handle(AgentCommand::Notify(Notification::Resume));
        assert_eq!(blinky.direction(), Direction::Left);
        blinky.handle(AgentCommand::Notify(Notification::Chase));
        blinky.step();
        assert_eq!(blinky.direction(), Direction::Right);
        assert_eq!(blinky.history(), ScatterChase::Chase);

        let mut pinky = ghost(GhostName::Pinky);
        pinky.handle(AgentCommand::Notify(Notification::Chase));
        assert!(!pinky.reverse_pending);
    }

    #[test]
    fn frightened_then_eaten_then_home() {
        let mut blinky = ghost(GhostName::Blinky);
        blinky.handle(AgentCommand::Notify(Notification::Resume));
        blinky.handle(AgentCommand::Notify(Notification::Frightened));
        assert!(blinky.tags().contains(&ModeTag::Frightened));
        blinky.handle(AgentCommand::Notify(Notification::FrightenedEndingSoon));
        assert!(blinky.tags().contains(&ModeTag::FrightenedEnding));

        blinky.handle(AgentCommand::Notify(Notification::Eaten));
        assert_eq!(blinky.chase_mode(), ChaseMode::Dead);
        let frozen = blinky.position();
        blinky.handle(sync(1, 500, Position::centered(26, 13)));
        assert_eq!(blinky.position(), frozen);

        // a late frightened notification does not resurrect the vulnerable state
        blinky.handle(AgentCommand::Notify(Notification::Frightened));
        assert_eq!(blinky.chase_mode(), ChaseMode::Dead);

        blinky.handle(AgentCommand::Notify(Notification::Pause));
        blinky.handle(AgentCommand::Notify(Notification::Resume));
        assert_eq!(blinky.chase_mode(), ChaseMode::ReturningHome);
        assert!(blinky.tags().contains(&ModeTag::ReturningHome));
        assert_eq!(blinky.speed_pct(), RETURNING_HOME_SPEED_PCT);
    }

    #[test]
    fn returning_home_revives_at_the_exit_tile() {
        let mut blinky = ghost(GhostName::Blinky);
        blinky.paused = false;
        blinky.chase = ChaseMode::ReturningHome;
        blinky.position = Position::new(14, 16, 4, 3);
        blinky.direction = Direction::Left;
        for _ in 0..(3 * TILE_SUBDIVISIONS as usize + 1) {
            blinky.step();
            if blinky.chase_mode() == ChaseMode::Normal {
                break;
            }
        }
        assert_eq!(blinky.chase_mode(), ChaseMode::Normal);
        assert_eq!(blinky.position().tile(), TilePoint::new(14, 13));
    }

    #[test]
    fn frightened_wandering_is_seed_deterministic() {
        let run = || {
            let mut blinky = ghost(GhostName::Blinky);
            blinky.handle(AgentCommand::Notify(Notification::Resume));
            blinky.handle(AgentCommand::Notify(Notification::Frightened));
            let mut trail = Vec::new();
            for tick in 1..=120 {
                let update = blinky
                    .handle(sync(tick, 16, Position::centered(26, 13)))
                    .expect("reply");
                trail.push(update.position);
            }
            trail
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn pursuers_never_enter_walls() {
        let maze = classic();
        for name in GhostName::ALL {
            let mut agent = ghost(name);
            agent.handle(AgentCommand::Notify(Notification::Resume));
            agent.handle(AgentCommand::Notify(Notification::LeaveHouse));
            for tick in 1..=2_000 {
                let update = agent
                    .handle(sync(tick, 16, Position::centered(26, 13)))
                    .expect("reply");
                if agent.house_state() == HouseState::Outside {
                    assert!(
                        !maze.get_tile_type(update.position.tile()).is_blocking()
                            || update.position.tile() == TilePoint::new(15, 13),
                        "{name:?} inside a wall at {:?}",
                        update.position
                    );
                }
            }
        }
    }

    /// Runs Blinky left from `start` for `syncs` 16 ms frames and returns it
    /// with the number of sub-tile units covered.
    fn run_left_from(start: Position, syncs: u64) -> (GhostAgent, i32) {
        let mut blinky = ghost(GhostName::Blinky);
        blinky.handle(AgentCommand::Notify(Notification::Resume));
        blinky.position = start;
        blinky.direction = Direction::Left;
        for tick in 1..=syncs {
            blinky.handle(sync(tick, 16, Position::centered(26, 13)));
        }
        let covered = start.absolute_along(Direction::Left)
            - blinky.position().absolute_along(Direction::Left);
        (blinky, covered)
    }

    #[test]
    fn tunnel_slows_pursuers_down() {
        // row 4 between cols 7 and 11 has walls above and below
        let (open, open_covered) = run_left_from(Position::centered(4, 10), 30);
        assert_eq!(open.zone, ZoneState::Open);
        assert_eq!(open.position().row, 4);

        let (tunnel, tunnel_covered) = run_left_from(Position::centered(17, 3), 30);
        assert_eq!(tunnel.zone, ZoneState::Tunnel);
        assert_eq!(tunnel.position().row, 17);
        assert!(tunnel_covered > 0);
        assert!(
            tunnel_covered < open_covered,
            "tunnel {tunnel_covered} vs open {open_covered}"
        );
    }
}
