//! Target-tile selection per pursuer archetype.
//!
//! Every function here is a pure function of the [`TargetContext`] built from
//! the latest committed frame; nothing reads or writes shared state.

use crate::constants::{CLYDE_RETREAT_DISTANCE, INKY_PIVOT_TILES, MAZE_COLS, MAZE_ROWS, PINKY_AMBUSH_TILES};
use crate::position::TilePoint;
use crate::types::{Direction, GhostName, ScatterChase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetContext {
    pub player_tile: TilePoint,
    pub player_direction: Direction,
    pub blinky_tile: TilePoint,
    pub own_tile: TilePoint,
}

pub fn scatter_corner(ghost: GhostName) -> TilePoint {
    match ghost {
        GhostName::Blinky => TilePoint::new(0, MAZE_COLS - 3),
        GhostName::Pinky => TilePoint::new(0, 2),
        GhostName::Inky => TilePoint::new(MAZE_ROWS - 1, MAZE_COLS - 1),
        GhostName::Clyde => TilePoint::new(MAZE_ROWS - 1, 0),
    }
}

pub fn direct_chase(ctx: &TargetContext) -> TilePoint {
    ctx.player_tile
}

pub fn ambush(ctx: &TargetContext) -> TilePoint {
    ctx.player_tile.offset(ctx.player_direction, PINKY_AMBUSH_TILES)
}

/// Doubles the vector from the direct chaser to a pivot just ahead of the player.
pub fn flank(ctx: &TargetContext) -> TilePoint {
    let pivot = ctx.player_tile.offset(ctx.player_direction, INKY_PIVOT_TILES);
    TilePoint::new(
        2 * pivot.row - ctx.blinky_tile.row,
        2 * pivot.col - ctx.blinky_tile.col,
    )
}

pub fn distance_gated(ctx: &TargetContext, corner: TilePoint) -> TilePoint {
    let limit = (CLYDE_RETREAT_DISTANCE as i64) * (CLYDE_RETREAT_DISTANCE as i64);
    if ctx.own_tile.distance_sq(ctx.player_tile) >= limit {
        ctx.player_tile
    } else {
        corner
    }
}

pub fn chase_target(ghost: GhostName, ctx: &TargetContext) -> TilePoint {
    match ghost {
        GhostName::Blinky => direct_chase(ctx),
        GhostName::Pinky => ambush(ctx),
        GhostName::Inky => flank(ctx),
        GhostName::Clyde => distance_gated(ctx, scatter_corner(GhostName::Clyde)),
    }
}

pub fn target_tile(ghost: GhostName, mode: ScatterChase, ctx: &TargetContext) -> TilePoint {
    match mode {
        ScatterChase::Scatter => scatter_corner(ghost),
        ScatterChase::Chase => chase_target(ghost, ctx),
    }
}
