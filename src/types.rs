use std::collections::BTreeSet;

use serde::Serialize;

use crate::position::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Candidate order for pursuer decisions; earlier entries win distance ties.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// `(row, col)` unit step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        self.is_vertical() != other.is_vertical()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostName {
    /// Spawn and house-release order.
    pub const ALL: [GhostName; 4] = [
        GhostName::Blinky,
        GhostName::Pinky,
        GhostName::Inky,
        GhostName::Clyde,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Blinky => 0,
            Self::Pinky => 1,
            Self::Inky => 2,
            Self::Clyde => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum AgentId {
    Player,
    Ghost(GhostName),
}

/// Presentation labels attached to agents and to the level as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeTag {
    Playing,
    Walled,
    Dying,
    Frightened,
    FrightenedEnding,
    Dead,
    ReturningHome,
    Hidden,
    MovementPaused,
    GetReady,
    GameOver,
    MazeFlashing,
    LevelFadeOut,
}

pub type ModeTags = BTreeSet<ModeTag>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Cherry,
    Strawberry,
    Orange,
    Apple,
    Melon,
    Galaxian,
    Bell,
    Key,
}

impl FruitKind {
    pub fn points(self) -> u64 {
        match self {
            Self::Cherry => 100,
            Self::Strawberry => 300,
            Self::Orange => 500,
            Self::Apple => 700,
            Self::Melon => 1_000,
            Self::Galaxian => 2_000,
            Self::Bell => 3_000,
            Self::Key => 5_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatterChase {
    Scatter,
    Chase,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub position: Position,
    pub direction: Direction,
    pub tags: ModeTags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GhostView {
    pub name: GhostName,
    pub position: Position,
    pub direction: Direction,
    pub tags: ModeTags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FruitView {
    #[serde(rename = "type")]
    pub kind: FruitKind,
    pub value: u64,
    pub row: i32,
    pub col: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreView {
    #[serde(rename = "totalPoints")]
    pub total_points: u64,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "livesRemaining")]
    pub lives_remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        row: i32,
        col: i32,
    },
    PowerPelletEaten {
        row: i32,
        col: i32,
    },
    FruitSpawned {
        fruit: FruitView,
    },
    FruitEaten {
        fruit: FruitView,
    },
    FruitExpired,
    GhostEaten {
        ghost: GhostName,
        points: u64,
    },
    GhostRevived {
        ghost: GhostName,
    },
    GhostReleased {
        ghost: GhostName,
    },
    ModeChanged {
        mode: ScatterChase,
    },
    FrightenedStarted,
    FrightenedEndingSoon,
    FrightenedEnded,
    LifeLost {
        #[serde(rename = "livesRemaining")]
        lives_remaining: u32,
    },
    ExtraLife,
    LevelComplete {
        level: u32,
    },
    LevelStarted {
        level: u32,
    },
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub level: u32,
    #[serde(rename = "levelTags")]
    pub level_tags: ModeTags,
    pub score: ScoreView,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub fruit: Option<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    #[serde(rename = "levelReached")]
    pub level_reached: u32,
    #[serde(rename = "totalPoints")]
    pub total_points: u64,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    pub ticks: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "finishedAt")]
    pub finished_at: String,
}
