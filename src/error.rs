use crate::maze::ZoneKind;

#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    #[error("maze template has no rows")]
    EmptyTemplate,

    #[error("maze template row {row} has {found} glyphs, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown maze glyph {glyph:?} at row {row}, col {col}")]
    UnknownGlyph { row: usize, col: usize, glyph: char },

    #[error("{kind:?} zone lies outside the maze")]
    ZoneOutOfBounds { kind: ZoneKind },
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("maze construction failed: {0}")]
    Maze(#[from] MazeError),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),

    #[error("session task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
