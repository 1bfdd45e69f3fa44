use serde::{Deserialize, Serialize};

/// Side of one map tile in pixels.
pub const TILE_SIZE_PX: f32 = 64.0;

/// Grid coordinates. `x` indexes rows (changed by `Up`/`Down`), `y` indexes
/// columns (changed by `Left`/`Right`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(row delta, column delta)` of one step.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Sub-tile interpolation of a one-tile step.
///
/// Offsets are the pixels still separating the drawn position from the
/// occupant's grid position. They decay toward zero by the mover's speed each
/// tick; the direction clears once both reach zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub direction: Option<Direction>,
    pub row_offset: f32,
    pub col_offset: f32,
}

impl Motion {
    /// Motion of an occupant that has just been relocated one tile toward
    /// `direction`: it is drawn back at its origin and slides forward.
    pub fn toward(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            direction: Some(direction),
            row_offset: -(dx as f32) * TILE_SIZE_PX,
            col_offset: -(dy as f32) * TILE_SIZE_PX,
        }
    }

    /// Motion of the view origin after it shifted one tile toward `direction`;
    /// the whole scene is offset the other way and glides back.
    pub fn away(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            direction: Some(direction),
            row_offset: dx as f32 * TILE_SIZE_PX,
            col_offset: dy as f32 * TILE_SIZE_PX,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.direction.is_some()
    }

    pub fn advance(&mut self, speed: f32) {
        if self.direction.is_none() {
            return;
        }
        let step = normalized_speed(speed);
        self.row_offset = approach_zero(self.row_offset, step);
        self.col_offset = approach_zero(self.col_offset, step);
        if self.row_offset == 0.0 && self.col_offset == 0.0 {
            self.direction = None;
        }
    }
}

fn normalized_speed(speed: f32) -> f32 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    }
}

fn approach_zero(value: f32, step: f32) -> f32 {
    if value > 0.0 {
        (value - step).max(0.0)
    } else if value < 0.0 {
        (value + step).min(0.0)
    } else {
        0.0
    }
}
