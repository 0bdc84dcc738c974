use crate::types::FruitKind;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const TILE_SUBDIVISIONS: u8 = 8;
pub const TILE_CENTER_ROW_OFFSET: u8 = 4;
pub const TILE_CENTER_COL_OFFSET: u8 = 3;

pub const MAZE_ROWS: i32 = 36;
pub const MAZE_COLS: i32 = 28;

/// Sub-tile units per second at 100% speed.
pub const BASE_SPEED_UNITS_PER_SEC: f32 = 75.75;
pub const RETURNING_HOME_SPEED_PCT: u32 = 160;
pub const MAX_STEPS_PER_SYNC: u32 = 6;

pub const STARTING_LIVES: u32 = 3;
pub const EXTRA_LIFE_SCORE: u64 = 10_000;

pub const PELLET_POINTS: u64 = 10;
pub const POWER_PELLET_POINTS: u64 = 50;
pub const GHOST_BASE_POINTS: u64 = 200;

pub const PELLET_FRAME_SKIP: u8 = 1;
pub const POWER_PELLET_FRAME_SKIP: u8 = 3;

pub const GET_READY_MS: u64 = 2_000;
pub const LOST_LIFE_STOPPED_MS: u64 = 1_000;
pub const LOST_LIFE_DYING_MS: u64 = 1_500;
pub const LOST_LIFE_FINISHED_MS: u64 = 500;
pub const MAZE_FLASH_MS: u64 = 2_000;
pub const LEVEL_FADE_OUT_MS: u64 = 500;
pub const GHOST_EATEN_FREEZE_MS: u64 = 1_000;
pub const FRIGHTENED_WARNING_SECS: u32 = 2;

pub const FRUIT_PELLET_THRESHOLDS: [u32; 2] = [70, 170];
pub const FRUIT_DROP_TILE: (i32, i32) = (20, 13);
pub const FRUIT_MIN_LIFETIME_MS: i32 = 9_000;
pub const FRUIT_MAX_LIFETIME_MS: i32 = 10_000;

pub const HOUSE_FALLBACK_SECS: u32 = 4;
pub const GLOBAL_HOUSE_THRESHOLDS: [u32; 3] = [7, 17, 32];

/// Tile just outside the house door; pursuers exit to it and dead pursuers return to it.
pub const HOUSE_EXIT_TILE: (i32, i32) = (14, 13);
/// Column offset that lines a pursuer up with the house door (between columns 13 and 14).
pub const HOUSE_DOOR_COL_OFFSET: u8 = 7;

/// Distance (in tiles) inside which the distance-gated pursuer retreats to its corner.
pub const CLYDE_RETREAT_DISTANCE: i32 = 8;
pub const PINKY_AMBUSH_TILES: i32 = 4;
pub const INKY_PIVOT_TILES: i32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeedTable {
    pub player: u32,
    pub player_frightened: u32,
    pub ghost: u32,
    pub ghost_tunnel: u32,
    pub ghost_frightened: u32,
}

pub fn get_speed_table(level: u32) -> SpeedTable {
    if level <= 1 {
        return SpeedTable {
            player: 80,
            player_frightened: 90,
            ghost: 75,
            ghost_tunnel: 40,
            ghost_frightened: 50,
        };
    }
    if level <= 4 {
        return SpeedTable {
            player: 90,
            player_frightened: 95,
            ghost: 85,
            ghost_tunnel: 45,
            ghost_frightened: 55,
        };
    }
    let player = if level <= 20 { 100 } else { 90 };
    SpeedTable {
        player,
        player_frightened: 100,
        ghost: 95,
        ghost_tunnel: 50,
        ghost_frightened: 60,
    }
}

pub fn get_frightened_secs(level: u32) -> u32 {
    match level {
        0 | 1 => 6,
        2 | 6 | 10 => 5,
        3 => 4,
        4 | 14 => 3,
        5 | 7 | 8 | 11 => 2,
        9 | 12 | 13 | 15 | 16 | 18 => 1,
        _ => 0,
    }
}

/// Alternating scatter/chase durations in seconds; `None` holds the last mode forever.
pub fn get_mode_schedule(level: u32) -> Vec<Option<u32>> {
    if level <= 1 {
        return vec![
            Some(7),
            Some(20),
            Some(7),
            Some(20),
            Some(5),
            Some(20),
            Some(5),
            None,
        ];
    }
    if level <= 4 {
        return vec![
            Some(7),
            Some(20),
            Some(7),
            Some(20),
            Some(5),
            Some(1033),
            Some(1),
            None,
        ];
    }
    vec![
        Some(5),
        Some(20),
        Some(5),
        Some(20),
        Some(5),
        Some(1037),
        Some(1),
        None,
    ]
}

pub fn get_fruit_kind(level: u32) -> FruitKind {
    match level {
        0 | 1 => FruitKind::Cherry,
        2 => FruitKind::Strawberry,
        3 | 4 => FruitKind::Orange,
        5 | 6 => FruitKind::Apple,
        7 | 8 => FruitKind::Melon,
        9 | 10 => FruitKind::Galaxian,
        11 | 12 => FruitKind::Bell,
        _ => FruitKind::Key,
    }
}

/// Personal pellet thresholds for the second, third and fourth pursuer to leave the house.
pub fn get_personal_house_thresholds(level: u32) -> [u32; 3] {
    match level {
        0 | 1 => [0, 30, 60],
        2 => [0, 0, 50],
        _ => [0, 0, 0],
    }
}
