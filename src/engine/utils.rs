use crate::constants::{BASE_SPEED_UNITS_PER_SEC, GHOST_BASE_POINTS, MAX_STEPS_PER_SYNC};
use crate::position::Position;
use crate::types::{AgentId, Direction, GhostName};

pub const AGENT_IDS: [AgentId; 5] = [
    AgentId::Player,
    AgentId::Ghost(GhostName::Blinky),
    AgentId::Ghost(GhostName::Pinky),
    AgentId::Ghost(GhostName::Inky),
    AgentId::Ghost(GhostName::Clyde),
];

/// Fixed start position and heading of every agent.
pub fn start_pose(agent: AgentId) -> (Position, Direction) {
    match agent {
        AgentId::Player => (Position::new(26, 13, 4, 7), Direction::Left),
        AgentId::Ghost(GhostName::Blinky) => (Position::new(14, 13, 4, 7), Direction::Left),
        AgentId::Ghost(GhostName::Pinky) => (Position::new(17, 13, 4, 7), Direction::Down),
        AgentId::Ghost(GhostName::Inky) => (Position::new(17, 11, 4, 7), Direction::Up),
        AgentId::Ghost(GhostName::Clyde) => (Position::new(17, 15, 4, 7), Direction::Up),
    }
}

/// Fills `buffer` at `speed_pct` of base speed and returns how many whole
/// sub-tile steps are due, capped per sync.
pub(crate) fn drain_move_buffer(buffer: &mut f32, speed_pct: u32, dt_ms: u64) -> u32 {
    let dt_sec = dt_ms as f32 / 1000.0;
    *buffer += BASE_SPEED_UNITS_PER_SEC * speed_pct as f32 / 100.0 * dt_sec;
    let mut steps = 0;
    while *buffer >= 1.0 {
        *buffer -= 1.0;
        steps += 1;
        if steps >= MAX_STEPS_PER_SYNC {
            *buffer = buffer.fract();
            break;
        }
    }
    steps
}

/// 200, 400, 800, 1600 for successive pursuers eaten in one frightened period.
pub(crate) fn ghost_points(eaten_this_period: u32) -> u64 {
    GHOST_BASE_POINTS << eaten_this_period.min(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_buffer_accumulates_fractional_steps() {
        let mut buffer = 0.0;
        let mut total = 0;
        for _ in 0..60 {
            total += drain_move_buffer(&mut buffer, 100, 16);
        }
        // 60 * 16ms at 75.75 units/s
        assert_eq!(total, 72);
        assert_eq!(drain_move_buffer(&mut buffer, 0, 1_000), 0);
    }

    #[test]
    fn move_buffer_caps_large_gaps() {
        let mut buffer = 0.0;
        assert_eq!(drain_move_buffer(&mut buffer, 100, 10_000), MAX_STEPS_PER_SYNC);
        assert!(buffer < 1.0);
    }

    #[test]
    fn ghost_points_double_then_cap() {
        let points: Vec<u64> = (0..5).map(ghost_points).collect();
        assert_eq!(points, vec![200, 400, 800, 1600, 1600]);
    }
}
