use serde::{Deserialize, Serialize};

/// One grid-cell move. Forward advances toward the finish row (+Y).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Integer cell coordinates. Signed so that speculative moves can leave the
/// map before a bounds check rejects them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position one cell over in `dir`, without any bounds check.
    pub fn stepped(self, dir: Direction) -> Self {
        match dir {
            Direction::Forward => Self::new(self.x, self.y + 1),
            Direction::Backward => Self::new(self.x, self.y - 1),
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
        }
    }
}

/// Half-open map bounds: `[0, width) x [0, height)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MapBounds {
    pub width: i32,
    pub height: i32,
}

impl MapBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    /// The finish row. Reaching it ends the race for that player.
    pub fn last_row(&self) -> i32 {
        self.height - 1
    }
}
