use serde::{Deserialize, Serialize};

use super::geometry::{Coords, Direction, Motion};

pub const VIEW_ROWS: i32 = 11;
pub const VIEW_COLS: i32 = 13;
pub const HALF_VIEW_ROWS: i32 = 5;
pub const HALF_VIEW_COLS: i32 = 6;
/// Rows the player may stray from the camera before it follows.
pub const FOLLOW_SLACK_ROWS: i32 = 2;
/// Columns the player may stray from the camera before it follows.
pub const FOLLOW_SLACK_COLS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Coords,
    #[serde(default)]
    pub motion: Motion,
}

impl Camera {
    pub fn new(position: Coords) -> Self {
        Self {
            position,
            motion: Motion::default(),
        }
    }

    /// Shifts one tile toward `direction` once `target` leaves the slack box.
    pub fn follow(&mut self, target: Coords, direction: Direction) -> bool {
        let rows_away = (target.x - self.position.x).abs();
        let cols_away = (target.y - self.position.y).abs();
        if rows_away <= FOLLOW_SLACK_ROWS && cols_away <= FOLLOW_SLACK_COLS {
            return false;
        }
        self.position = self.position.step(direction);
        self.motion = Motion::away(direction);
        true
    }

    pub fn jump_to(&mut self, position: Coords) {
        self.position = position;
        self.motion = Motion::default();
    }

    pub fn update(&mut self, speed: f32) {
        self.motion.advance(speed);
    }

    /// Map coordinates drawn in the top-left cell of the view.
    pub fn view_origin(&self) -> Coords {
        self.position.offset(-HALF_VIEW_ROWS, -HALF_VIEW_COLS)
    }

    /// Every map cell the view covers, including a one-cell margin so
    /// sliding occupants entering the view are drawn and updated.
    pub fn visible_cells(&self) -> impl Iterator<Item = Coords> {
        let origin = self.view_origin();
        (-1..=VIEW_ROWS).flat_map(move |row| {
            (-1..=VIEW_COLS).map(move |col| origin.offset(row, col))
        })
    }
}
