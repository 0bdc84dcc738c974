use serde::Serialize;

use crate::error::MazeError;
use crate::position::{Position, TilePoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TileType {
    Wall,
    Pellet,
    PowerPellet,
    Empty,
    Tunnel,
    HouseEntrance,
}

impl TileType {
    pub fn is_pellet(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }

    /// Agents never enter these tiles through ordinary movement.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Wall | Self::HouseEntrance)
    }
}

/// Wall rendering variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WallShape {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Horizontal,
    Vertical,
    Fill,
}

pub const WALL_GLYPHS: [(char, WallShape); 7] = [
    ('┌', WallShape::TopLeft),
    ('┐', WallShape::TopRight),
    ('└', WallShape::BottomLeft),
    ('┘', WallShape::BottomRight),
    ('─', WallShape::Horizontal),
    ('│', WallShape::Vertical),
    ('█', WallShape::Fill),
];

/// Mirror image of each wall shape across the vertical axis.
pub const REFLECTION_TABLE: [(WallShape, WallShape); 7] = [
    (WallShape::TopLeft, WallShape::TopRight),
    (WallShape::TopRight, WallShape::TopLeft),
    (WallShape::BottomLeft, WallShape::BottomRight),
    (WallShape::BottomRight, WallShape::BottomLeft),
    (WallShape::Horizontal, WallShape::Horizontal),
    (WallShape::Vertical, WallShape::Vertical),
    (WallShape::Fill, WallShape::Fill),
];

impl WallShape {
    pub fn from_glyph(glyph: char) -> Option<Self> {
        WALL_GLYPHS
            .iter()
            .find(|(candidate, _)| *candidate == glyph)
            .map(|(_, shape)| *shape)
    }

    pub fn glyph(self) -> char {
        WALL_GLYPHS
            .iter()
            .find(|(_, shape)| *shape == self)
            .map(|(glyph, _)| *glyph)
            .unwrap_or('█')
    }

    pub fn reflect(self) -> Self {
        match REFLECTION_TABLE.iter().find(|(from, _)| *from == self) {
            Some((_, to)) => *to,
            None => unreachable!("wall shape {self:?} missing from reflection table"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    #[serde(rename = "type")]
    pub tile_type: TileType,
    pub display: Option<WallShape>,
}

impl Tile {
    fn open(tile_type: TileType) -> Self {
        Self {
            tile_type,
            display: None,
        }
    }

    fn wall(shape: WallShape) -> Self {
        Self {
            tile_type: TileType::Wall,
            display: Some(shape),
        }
    }

    fn parse(glyph: char, row: usize, col: usize) -> Result<Self, MazeError> {
        let tile = match glyph {
            ' ' => Self::open(TileType::Empty),
            '.' => Self::open(TileType::Pellet),
            'o' => Self::open(TileType::PowerPellet),
            'T' => Self::open(TileType::Tunnel),
            '=' => Self::open(TileType::HouseEntrance),
            other => match WallShape::from_glyph(other) {
                Some(shape) => Self::wall(shape),
                None => return Err(MazeError::UnknownGlyph { row, col, glyph }),
            },
        };
        Ok(tile)
    }

    fn glyph(&self) -> char {
        match self.tile_type {
            TileType::Wall => self.display.map(WallShape::glyph).unwrap_or('█'),
            TileType::Pellet => '.',
            TileType::PowerPellet => 'o',
            TileType::Empty => ' ',
            TileType::Tunnel => 'T',
            TileType::HouseEntrance => '=',
        }
    }

    fn mirrored(self) -> Self {
        Self {
            tile_type: self.tile_type,
            display: self.display.map(WallShape::reflect),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneKind {
    RedZone,
    Tunnel,
    GhostHouse,
    HouseEntrance,
}

/// Inclusive rectangle in row/col space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Zone {
    pub const fn new(kind: ZoneKind, top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            kind,
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn contains(&self, tile: TilePoint) -> bool {
        tile.row >= self.top
            && tile.row <= self.bottom
            && tile.col >= self.left
            && tile.col <= self.right
    }
}

/// Left half of the playfield; the right half is its mirror image.
pub const CLASSIC_TEMPLATE: [&str; 36] = [
    "              ",
    "              ",
    "              ",
    "┌─────────────",
    "│............│",
    "│.┌──┐.┌───┐.│",
    "│o│██│.│███│.│",
    "│.└──┘.└───┘.└",
    "│.............",
    "│.┌──┐.┌┐.┌───",
    "│.└──┘.││.└──┐",
    "│......││....│",
    "└────┐.│└──┐ │",
    "     │.│┌──┘ └",
    "     │.││     ",
    "     │.││ ┌──=",
    "─────┘.└┘ │   ",
    "TTTTTT.   │   ",
    "─────┐.┌┐ │   ",
    "     │.││ └───",
    "     │.││     ",
    "     │.││ ┌───",
    "┌────┘.└┘ └──┐",
    "│............│",
    "│.┌──┐.┌───┐.│",
    "│.└─┐│.└───┘.└",
    "│o..││....... ",
    "│─┐.││.┌┐.┌───",
    "│─┘.└┘.││.└──┐",
    "│......││....│",
    "│.┌────┘└──┐.│",
    "│.└────────┘.└",
    "│.............",
    "└─────────────",
    "              ",
    "              ",
];

pub const CLASSIC_ZONES: [Zone; 6] = [
    Zone::new(ZoneKind::RedZone, 14, 10, 14, 17),
    Zone::new(ZoneKind::RedZone, 26, 10, 26, 17),
    Zone::new(ZoneKind::Tunnel, 17, 0, 17, 5),
    Zone::new(ZoneKind::Tunnel, 17, 22, 17, 27),
    Zone::new(ZoneKind::GhostHouse, 16, 11, 18, 16),
    Zone::new(ZoneKind::HouseEntrance, 15, 13, 15, 14),
];

#[derive(Clone, Debug, Serialize)]
pub struct MazeView {
    pub rows: i32,
    pub cols: i32,
    pub tiles: Vec<String>,
    pub zones: Vec<Zone>,
}

#[derive(Clone, Debug)]
pub struct Maze {
    tiles: Vec<Vec<Tile>>,
    zones: Vec<Zone>,
    pellets_remaining: u32,
}

impl Maze {
    pub fn classic() -> Result<Self, MazeError> {
        Self::from_template(&CLASSIC_TEMPLATE, &CLASSIC_ZONES)
    }

    /// Builds a symmetric maze by mirroring `half_rows` across the vertical axis.
    pub fn from_template(half_rows: &[&str], zones: &[Zone]) -> Result<Self, MazeError> {
        let Some(first) = half_rows.first() else {
            return Err(MazeError::EmptyTemplate);
        };
        let half_width = first.chars().count();
        if half_width == 0 {
            return Err(MazeError::EmptyTemplate);
        }

        let mut tiles = Vec::with_capacity(half_rows.len());
        for (row, raw) in half_rows.iter().enumerate() {
            let glyphs: Vec<char> = raw.chars().collect();
            if glyphs.len() != half_width {
                return Err(MazeError::RaggedRow {
                    row,
                    expected: half_width,
                    found: glyphs.len(),
                });
            }
            let mut left = Vec::with_capacity(half_width * 2);
            for (col, glyph) in glyphs.into_iter().enumerate() {
                left.push(Tile::parse(glyph, row, col)?);
            }
            let right: Vec<Tile> = left.iter().rev().map(|tile| tile.mirrored()).collect();
            left.extend(right);
            tiles.push(left);
        }

        let rows = tiles.len() as i32;
        let cols = (half_width * 2) as i32;
        for zone in zones {
            if zone.top < 0 || zone.left < 0 || zone.bottom >= rows || zone.right >= cols {
                return Err(MazeError::ZoneOutOfBounds { kind: zone.kind });
            }
        }

        let pellets_remaining = tiles
            .iter()
            .flatten()
            .filter(|tile| tile.tile_type.is_pellet())
            .count() as u32;

        Ok(Self {
            tiles,
            zones: zones.to_vec(),
            pellets_remaining,
        })
    }

    pub fn rows(&self) -> i32 {
        self.tiles.len() as i32
    }

    pub fn cols(&self) -> i32 {
        self.tiles.first().map(|row| row.len() as i32).unwrap_or(0)
    }

    pub fn pellets_remaining(&self) -> u32 {
        self.pellets_remaining
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn tile(&self, at: TilePoint) -> Option<&Tile> {
        if at.row < 0 || at.col < 0 {
            return None;
        }
        self.tiles
            .get(at.row as usize)
            .and_then(|row| row.get(at.col as usize))
    }

    /// Off-grid tiles read as walls.
    pub fn get_tile_type(&self, at: TilePoint) -> TileType {
        self.tile(at)
            .map(|tile| tile.tile_type)
            .unwrap_or(TileType::Wall)
    }

    /// Out-of-bounds writes are ignored.
    pub fn set_tile_type(&mut self, at: TilePoint, tile_type: TileType) {
        if at.row < 0 || at.col < 0 {
            return;
        }
        let Some(tile) = self
            .tiles
            .get_mut(at.row as usize)
            .and_then(|row| row.get_mut(at.col as usize))
        else {
            return;
        };
        let was_pellet = tile.tile_type.is_pellet();
        tile.tile_type = tile_type;
        if tile_type != TileType::Wall {
            tile.display = None;
        }
        match (was_pellet, tile_type.is_pellet()) {
            (true, false) => self.pellets_remaining = self.pellets_remaining.saturating_sub(1),
            (false, true) => self.pellets_remaining += 1,
            _ => {}
        }
    }

    pub fn is_blocking(&self, at: TilePoint) -> bool {
        self.get_tile_type(at).is_blocking()
    }

    pub fn in_zone_kind(&self, at: TilePoint, kind: ZoneKind) -> bool {
        self.zones
            .iter()
            .any(|zone| zone.kind == kind && zone.contains(at))
    }

    pub fn to_view(&self) -> MazeView {
        MazeView {
            rows: self.rows(),
            cols: self.cols(),
            tiles: self
                .tiles
                .iter()
                .map(|row| row.iter().map(Tile::glyph).collect::<String>())
                .collect(),
            zones: self.zones.clone(),
        }
    }
}

pub fn is_within_zone(position: &Position, zone: &Zone) -> bool {
    zone.contains(position.tile())
}
