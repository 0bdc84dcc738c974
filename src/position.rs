use serde::Serialize;

use crate::constants::{TILE_CENTER_COL_OFFSET, TILE_CENTER_ROW_OFFSET, TILE_SUBDIVISIONS};
use crate::maze::Maze;
use crate::types::Direction;

const LAST_OFFSET: u8 = TILE_SUBDIVISIONS - 1;

/// Tile coordinates plus a sub-tile offset on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
    #[serde(rename = "rowOffset")]
    pub row_offset: u8,
    #[serde(rename = "colOffset")]
    pub col_offset: u8,
}

/// A whole tile, possibly off the grid (pursuer targets may lie outside the maze).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TilePoint {
    pub row: i32,
    pub col: i32,
}

impl TilePoint {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, direction: Direction, tiles: i32) -> Self {
        let (dr, dc) = direction.delta();
        Self {
            row: self.row + dr * tiles,
            col: self.col + dc * tiles,
        }
    }

    pub fn distance_sq(self, other: TilePoint) -> i64 {
        let dr = (self.row - other.row) as i64;
        let dc = (self.col - other.col) as i64;
        dr * dr + dc * dc
    }
}

impl Position {
    pub fn new(row: i32, col: i32, row_offset: u8, col_offset: u8) -> Self {
        debug_assert!(row_offset < TILE_SUBDIVISIONS, "row offset {row_offset} out of range");
        debug_assert!(col_offset < TILE_SUBDIVISIONS, "col offset {col_offset} out of range");
        Self {
            row,
            col,
            row_offset,
            col_offset,
        }
    }

    /// Centre of a tile.
    pub fn centered(row: i32, col: i32) -> Self {
        Self::new(row, col, TILE_CENTER_ROW_OFFSET, TILE_CENTER_COL_OFFSET)
    }

    pub fn tile(&self) -> TilePoint {
        TilePoint::new(self.row, self.col)
    }

    /// Offset along the axis `direction` travels on.
    pub fn axis_offset(&self, direction: Direction) -> u8 {
        if direction.is_vertical() {
            self.row_offset
        } else {
            self.col_offset
        }
    }

    pub fn is_centered_along(&self, direction: Direction) -> bool {
        self.axis_offset(direction) == axis_center(direction)
    }

    pub fn is_at_tile_center(&self) -> bool {
        self.row_offset == TILE_CENTER_ROW_OFFSET && self.col_offset == TILE_CENTER_COL_OFFSET
    }

    /// Strictly beyond the tile centre in the direction of travel.
    pub fn is_past_center(&self, direction: Direction) -> bool {
        let offset = self.axis_offset(direction);
        let center = axis_center(direction);
        match direction {
            Direction::Right | Direction::Down => offset > center,
            Direction::Left | Direction::Up => offset < center,
        }
    }

    /// On the last sub-tile unit before crossing into the next tile.
    pub fn is_at_edge(&self, direction: Direction) -> bool {
        let offset = self.axis_offset(direction);
        match direction {
            Direction::Right | Direction::Down => offset == LAST_OFFSET,
            Direction::Left | Direction::Up => offset == 0,
        }
    }

    /// Absolute sub-tile coordinate along the axis `direction` travels on.
    pub fn absolute_along(&self, direction: Direction) -> i32 {
        let sub = TILE_SUBDIVISIONS as i32;
        if direction.is_vertical() {
            self.row * sub + self.row_offset as i32
        } else {
            self.col * sub + self.col_offset as i32
        }
    }
}

pub fn axis_center(direction: Direction) -> u8 {
    if direction.is_vertical() {
        TILE_CENTER_ROW_OFFSET
    } else {
        TILE_CENTER_COL_OFFSET
    }
}

pub fn reverse_of(direction: Direction) -> Direction {
    direction.reverse()
}

/// Advances `position` by one sub-tile unit (or one whole tile when
/// `ignore_sub_tile_offset` is set), wrapping around the grid edges.
pub fn project_position(
    maze: &Maze,
    position: Position,
    direction: Direction,
    ignore_sub_tile_offset: bool,
) -> Position {
    let (dr, dc) = direction.delta();
    let mut next = position;

    if ignore_sub_tile_offset {
        next.row += dr;
        next.col += dc;
    } else if direction.is_vertical() {
        let (offset, crossed) = step_offset(position.row_offset, dr);
        next.row_offset = offset;
        next.row += crossed;
    } else {
        let (offset, crossed) = step_offset(position.col_offset, dc);
        next.col_offset = offset;
        next.col += crossed;
    }

    next.row = next.row.rem_euclid(maze.rows());
    next.col = next.col.rem_euclid(maze.cols());
    next
}

fn step_offset(offset: u8, delta: i32) -> (u8, i32) {
    if delta > 0 {
        if offset >= LAST_OFFSET {
            (0, 1)
        } else {
            (offset + 1, 0)
        }
    } else if offset == 0 {
        (LAST_OFFSET, -1)
    } else {
        (offset - 1, 0)
    }
}

/// One unit toward the tile centre on the axis perpendicular to `direction`.
pub fn recenter_across(position: Position, direction: Direction) -> Position {
    let mut next = position;
    if direction.is_vertical() {
        if next.col_offset < TILE_CENTER_COL_OFFSET {
            next.col_offset += 1;
        } else if next.col_offset > TILE_CENTER_COL_OFFSET {
            next.col_offset -= 1;
        }
    } else if next.row_offset < TILE_CENTER_ROW_OFFSET {
        next.row_offset += 1;
    } else if next.row_offset > TILE_CENTER_ROW_OFFSET {
        next.row_offset -= 1;
    }
    next
}

pub fn is_centered_across(position: Position, direction: Direction) -> bool {
    if direction.is_vertical() {
        position.col_offset == TILE_CENTER_COL_OFFSET
    } else {
        position.row_offset == TILE_CENTER_ROW_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Maze;

    fn classic() -> Maze {
        Maze::classic().expect("classic maze builds")
    }

    #[test]
    fn round_trip_returns_to_origin_for_every_offset() {
        let maze = classic();
        for row in 5..30 {
            for col in 2..26 {
                for row_offset in 0..TILE_SUBDIVISIONS {
                    for col_offset in 0..TILE_SUBDIVISIONS {
                        let origin = Position::new(row, col, row_offset, col_offset);
                        for dir in Direction::PRIORITY {
                            let there = project_position(&maze, origin, dir, false);
                            let back = project_position(&maze, there, reverse_of(dir), false);
                            assert_eq!(back, origin, "{dir:?} from {origin:?}");

                            let leap = project_position(&maze, origin, dir, true);
                            let back = project_position(&maze, leap, reverse_of(dir), true);
                            assert_eq!(back, origin);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn crossing_the_edge_enters_the_next_tile() {
        let maze = classic();
        let edge = Position::new(10, 5, 4, 7);
        let next = project_position(&maze, edge, Direction::Right, false);
        assert_eq!(next, Position::new(10, 6, 4, 0));

        let top = Position::new(10, 5, 0, 3);
        let next = project_position(&maze, top, Direction::Up, false);
        assert_eq!(next, Position::new(9, 5, 7, 3));
    }

    #[test]
    fn tunnel_wraps_horizontally() {
        let maze = classic();
        let left_edge = Position::new(17, 0, 4, 0);
        let wrapped = project_position(&maze, left_edge, Direction::Left, false);
        assert_eq!(wrapped.col, maze.cols() - 1);
        assert_eq!(wrapped.col_offset, TILE_SUBDIVISIONS - 1);

        let right = Position::centered(17, maze.cols() - 1);
        let leap = project_position(&maze, right, Direction::Right, true);
        assert_eq!(leap.col, 0);
    }

    #[test]
    fn projection_does_not_mutate_input() {
        let maze = classic();
        let origin = Position::centered(26, 13);
        let _ = project_position(&maze, origin, Direction::Left, true);
        assert_eq!(origin, Position::centered(26, 13));
    }

    #[test]
    fn past_center_depends_on_heading() {
        let pos = Position::new(5, 5, 4, 5);
        assert!(pos.is_past_center(Direction::Right));
        assert!(!pos.is_past_center(Direction::Left));
        assert!(Position::new(5, 5, 4, 7).is_at_edge(Direction::Right));
        assert!(Position::new(5, 5, 0, 3).is_at_edge(Direction::Up));
    }

    #[test]
    fn recenter_moves_one_unit_toward_center() {
        let pos = Position::new(5, 5, 4, 6);
        let next = recenter_across(pos, Direction::Up);
        assert_eq!(next.col_offset, 5);
        assert!(is_centered_across(Position::new(5, 5, 2, 3), Direction::Down));
    }
}
