use clap::Parser;
use pacmaze::config::GameConfig;
use pacmaze::maze::Maze;
use pacmaze::position::TilePoint;
use pacmaze::session::Session;
use pacmaze::types::{Direction, GameSummary, ModeTag, RuntimeEvent, Snapshot};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 15;

/// Headless run driven by a pellet-seeking autopilot.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
    #[arg(long)]
    lives: Option<u32>,
    #[arg(long)]
    level: Option<u32>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Print every snapshot as a JSON line on stdout.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    GameOver,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    seed: u32,
    outcome: Outcome,
    #[serde(rename = "livesRemaining")]
    lives_remaining: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "fruitEaten")]
    fruit_eaten: u32,
    #[serde(flatten)]
    game: GameSummary,
}

#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    levels_cleared: u32,
    fruit_eaten: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli);
    let seed = config.seed;
    let tick_ms = config.tick_ms;
    info!(seed, max_ticks = cli.max_ticks, "simulation starting");

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(error) => {
            error!(%error, "failed to build session");
            std::process::exit(2);
        }
    };

    let mut tally = Tally::default();
    let mut last_snapshot = session.snapshot();
    for _ in 0..cli.max_ticks {
        if session.is_game_over() {
            break;
        }
        let threats = threat_tiles(&last_snapshot);
        if let Some(direction) = autopilot(
            session.orchestrator().maze(),
            last_snapshot.player.position.tile(),
            &threats,
        ) {
            if direction != last_snapshot.player.direction {
                session.input(direction);
            }
        }
        session.step(tick_ms);

        last_snapshot = session.snapshot();
        tally.record(&last_snapshot.events);
        if cli.trace {
            match serde_json::to_string(&last_snapshot) {
                Ok(line) => println!("{line}"),
                Err(error) => warn!(%error, "snapshot not serializable"),
            }
        }
    }

    let outcome = if session.is_game_over() {
        Outcome::GameOver
    } else {
        Outcome::TickLimit
    };
    let summary = RunSummary {
        seed,
        outcome,
        lives_remaining: last_snapshot.score.lives_remaining,
        levels_cleared: tally.levels_cleared,
        fruit_eaten: tally.fruit_eaten,
        game: session.summary(),
    };
    info!(
        ?outcome,
        points = summary.game.total_points,
        level = summary.game.level_reached,
        ticks = summary.game.ticks,
        "simulation finished"
    );

    match serde_json::to_string(&summary) {
        Ok(line) => println!("{line}"),
        Err(error) => {
            error!(%error, "summary not serializable");
            std::process::exit(2);
        }
    }

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(%error, path = %path.display(), "summary write failed");
            std::process::exit(2);
        }
    }
}

fn resolve_config(cli: &Cli) -> GameConfig {
    let defaults = GameConfig::from_env();
    GameConfig {
        seed: cli.seed.unwrap_or_else(rand::random),
        starting_lives: cli.lives.unwrap_or(defaults.starting_lives).max(1),
        start_level: cli.level.unwrap_or(defaults.start_level).max(1),
        ..defaults
    }
}

impl Tally {
    fn record(&mut self, events: &[RuntimeEvent]) {
        for event in events {
            match event {
                RuntimeEvent::LevelComplete { .. } => self.levels_cleared += 1,
                RuntimeEvent::FruitEaten { .. } => self.fruit_eaten += 1,
                _ => {}
            }
        }
    }
}

/// Tiles held by pursuers that would cost a life on contact.
fn threat_tiles(snapshot: &Snapshot) -> Vec<TilePoint> {
    snapshot
        .ghosts
        .iter()
        .filter(|ghost| {
            ![ModeTag::Frightened, ModeTag::Dead, ModeTag::ReturningHome]
                .iter()
                .any(|tag| ghost.tags.contains(tag))
        })
        .map(|ghost| ghost.position.tile())
        .collect()
}

/// First step of the shortest path to the nearest pellet, routing around
/// threat tiles. `None` when no pellet is reachable.
fn autopilot(maze: &Maze, from: TilePoint, threats: &[TilePoint]) -> Option<Direction> {
    let blocked: HashSet<TilePoint> = threats.iter().copied().collect();
    let mut visited = HashSet::from([from]);
    let mut queue = VecDeque::new();

    for direction in Direction::PRIORITY {
        let next = wrap(maze, from.offset(direction, 1));
        if maze.is_blocking(next) || blocked.contains(&next) || !visited.insert(next) {
            continue;
        }
        queue.push_back((next, direction));
    }

    while let Some((tile, first)) = queue.pop_front() {
        if maze.get_tile_type(tile).is_pellet() {
            return Some(first);
        }
        for direction in Direction::PRIORITY {
            let next = wrap(maze, tile.offset(direction, 1));
            if maze.is_blocking(next) || blocked.contains(&next) || !visited.insert(next) {
                continue;
            }
            queue.push_back((next, first));
        }
    }
    None
}

fn wrap(maze: &Maze, tile: TilePoint) -> TilePoint {
    TilePoint::new(tile.row.rem_euclid(maze.rows()), tile.col.rem_euclid(maze.cols()))
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacmaze::maze::TileType;
    use std::time::{SystemTime, UNIX_EPOCH};

    const OPEN_ROOM: [&str; 5] = ["┌──", "│..", "│..", "│..", "└──"];

    fn room_with_single_pellet(pellet: TilePoint) -> Maze {
        let mut maze = Maze::from_template(&OPEN_ROOM, &[]).expect("room template is valid");
        for row in 0..maze.rows() {
            for col in 0..maze.cols() {
                let tile = TilePoint::new(row, col);
                if maze.get_tile_type(tile).is_pellet() && tile != pellet {
                    maze.set_tile_type(tile, TileType::Empty);
                }
            }
        }
        maze
    }

    #[test]
    fn autopilot_heads_for_the_nearest_pellet() {
        let maze = room_with_single_pellet(TilePoint::new(3, 1));
        assert_eq!(
            autopilot(&maze, TilePoint::new(1, 1), &[]),
            Some(Direction::Down)
        );
    }

    #[test]
    fn autopilot_routes_around_threats() {
        let maze = room_with_single_pellet(TilePoint::new(3, 1));
        assert_eq!(
            autopilot(&maze, TilePoint::new(1, 1), &[TilePoint::new(2, 1)]),
            Some(Direction::Right)
        );
    }

    #[test]
    fn autopilot_gives_up_without_pellets() {
        let maze = room_with_single_pellet(TilePoint::new(0, 0));
        assert_eq!(maze.pellets_remaining(), 0);
        assert_eq!(autopilot(&maze, TilePoint::new(1, 1), &[]), None);
    }

    #[test]
    fn tally_counts_cleared_levels_and_fruit() {
        let mut tally = Tally::default();
        tally.record(&[
            RuntimeEvent::LevelComplete { level: 1 },
            RuntimeEvent::FruitExpired,
            RuntimeEvent::LevelStarted { level: 2 },
        ]);
        assert_eq!(tally.levels_cleared, 1);
        assert_eq!(tally.fruit_eaten, 0);
    }

    #[test]
    fn autopilot_finishes_a_short_run() {
        let mut session = Session::new(GameConfig::default()).expect("session builds");
        let mut snapshot = session.snapshot();
        for _ in 0..600 {
            let threats = threat_tiles(&snapshot);
            if let Some(direction) = autopilot(
                session.orchestrator().maze(),
                snapshot.player.position.tile(),
                &threats,
            ) {
                session.input(direction);
            }
            session.step(16);
            snapshot = session.snapshot();
        }
        assert!(snapshot.score.pellets_eaten > 0);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("pacmaze-missing-{now}"))
            .join("summary.json");
        let session = Session::new(GameConfig::default()).expect("session builds");
        let summary = RunSummary {
            seed: 1,
            outcome: Outcome::TickLimit,
            lives_remaining: 3,
            levels_cleared: 0,
            fruit_eaten: 0,
            game: session.summary(),
        };
        assert!(write_summary(&target, &summary).is_err());
    }
}
