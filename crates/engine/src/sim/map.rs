use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::entity::Player;
use super::geometry::Coords;
use super::lenient;
use super::occupant::{Occupant, OccupantId, OccupantIdAllocator};

pub const DEFAULT_TERRAIN: &str = "grass";

/// Ordered occupants of one cell; the last one is topmost.
pub type TileStack = Vec<Occupant>;

/// Map-definition cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Empty,
    /// Where the player is placed when the map initializes.
    Start,
    Single(Occupant),
    Layers(Vec<Occupant>),
}

/// Which layer of a stack a lookup addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMode {
    Top,
    /// The layer right beneath the topmost one.
    IgnoreTop,
}

impl StackMode {
    fn index(self, len: usize) -> Option<usize> {
        match self {
            StackMode::Top => len.checked_sub(1),
            StackMode::IgnoreTop => len.checked_sub(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    #[serde(deserialize_with = "deserialize_squares")]
    squares: Vec<Vec<TileStack>>,
    default_square: String,
    #[serde(skip)]
    start: Option<Coords>,
}

impl Map {
    pub fn from_cells(rows: Vec<Vec<Cell>>, default_square: impl Into<String>) -> Self {
        let mut start = None;
        let squares = rows
            .into_iter()
            .enumerate()
            .map(|(x, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(y, cell)| match cell {
                        Cell::Empty => Vec::new(),
                        Cell::Start => {
                            start = Some(Coords::new(x as i32, y as i32));
                            Vec::new()
                        }
                        Cell::Single(occupant) => vec![occupant],
                        Cell::Layers(layers) => layers,
                    })
                    .collect()
            })
            .collect();
        Self {
            squares,
            default_square: default_square.into(),
            start,
        }
    }

    pub fn default_square(&self) -> &str {
        &self.default_square
    }

    pub fn start(&self) -> Option<Coords> {
        self.start
    }

    pub fn row_count(&self) -> usize {
        self.squares.len()
    }

    pub fn column_count(&self) -> usize {
        self.squares.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether `coords` lies inside the map's rectangular extent. Cells
    /// past the end of a ragged row are inside but absent.
    pub fn contains(&self, coords: Coords) -> bool {
        coords.x >= 0
            && coords.y >= 0
            && (coords.x as usize) < self.row_count()
            && (coords.y as usize) < self.column_count()
    }

    pub fn stack(&self, coords: Coords) -> Option<&TileStack> {
        if coords.x < 0 || coords.y < 0 {
            return None;
        }
        self.squares
            .get(coords.x as usize)?
            .get(coords.y as usize)
    }

    pub(crate) fn stack_mut(&mut self, coords: Coords) -> Option<&mut TileStack> {
        if coords.x < 0 || coords.y < 0 {
            return None;
        }
        self.squares
            .get_mut(coords.x as usize)?
            .get_mut(coords.y as usize)
    }

    pub fn get(&self, coords: Coords, mode: StackMode) -> Option<&Occupant> {
        let stack = self.stack(coords)?;
        stack.get(mode.index(stack.len())?)
    }

    pub fn get_mut(&mut self, coords: Coords, mode: StackMode) -> Option<&mut Occupant> {
        let stack = self.stack_mut(coords)?;
        let index = mode.index(stack.len())?;
        stack.get_mut(index)
    }

    pub fn find(&self, coords: Coords, uid: OccupantId) -> Option<&Occupant> {
        self.stack(coords)?.iter().find(|occupant| occupant.uid == uid)
    }

    pub fn find_mut(&mut self, coords: Coords, uid: OccupantId) -> Option<&mut Occupant> {
        self.stack_mut(coords)?
            .iter_mut()
            .find(|occupant| occupant.uid == uid)
    }

    pub fn remove(&mut self, coords: Coords, mode: StackMode) -> Option<Occupant> {
        let stack = self.stack_mut(coords)?;
        let index = mode.index(stack.len())?;
        let mut occupant = stack.remove(index);
        occupant.coordinates = None;
        Some(occupant)
    }

    /// Removes the topmost layer matching `predicate`, wherever it sits in
    /// the stack.
    pub fn remove_matching(
        &mut self,
        coords: Coords,
        predicate: impl Fn(&Occupant) -> bool,
    ) -> Option<Occupant> {
        let stack = self.stack_mut(coords)?;
        let index = stack.iter().rposition(|occupant| predicate(occupant))?;
        let mut occupant = stack.remove(index);
        occupant.coordinates = None;
        Some(occupant)
    }

    /// Pops the topmost layer and pushes `occupant` in its place.
    pub fn replace_top(&mut self, coords: Coords, mut occupant: Occupant) -> Option<Occupant> {
        let stack = self.stack_mut(coords)?;
        let displaced = stack.pop().map(|mut displaced| {
            displaced.coordinates = None;
            displaced
        });
        occupant.coordinates = Some(coords);
        stack.push(occupant);
        displaced
    }

    /// Pushes `occupant` on top, creating the cell (and extending a ragged
    /// row) when absent. Negative coordinates are rejected.
    pub fn add(&mut self, coords: Coords, occupant: Occupant) -> bool {
        self.insert_at(coords, occupant, StackMode::Top)
    }

    /// Slides `occupant` beneath the current topmost layer.
    pub fn insert_below_top(&mut self, coords: Coords, occupant: Occupant) -> bool {
        self.insert_at(coords, occupant, StackMode::IgnoreTop)
    }

    fn insert_at(&mut self, coords: Coords, mut occupant: Occupant, mode: StackMode) -> bool {
        let Some(stack) = self.ensure_stack(coords) else {
            return false;
        };
        occupant.coordinates = Some(coords);
        match mode {
            StackMode::Top => stack.push(occupant),
            StackMode::IgnoreTop => {
                let index = stack.len().saturating_sub(1);
                stack.insert(index, occupant);
            }
        }
        true
    }

    fn ensure_stack(&mut self, coords: Coords) -> Option<&mut TileStack> {
        if !self.contains(coords) {
            return None;
        }
        let (x, y) = (coords.x as usize, coords.y as usize);
        if self.squares.len() <= x {
            self.squares.resize_with(x + 1, Vec::new);
        }
        let row = &mut self.squares[x];
        if row.len() <= y {
            row.resize_with(y + 1, Vec::new);
        }
        row.get_mut(y)
    }

    /// Moves the topmost occupant of `from` onto `to` and returns `to`.
    pub fn move_occupant(&mut self, from: Coords, to: Coords) -> Coords {
        if let Some(occupant) = self.remove(from, StackMode::Top) {
            if !self.add(to, occupant) {
                warn!(from_x = from.x, from_y = from.y, to_x = to.x, to_y = to.y, "move_target_rejected");
            }
        }
        to
    }

    pub fn stacks(&self) -> impl Iterator<Item = (Coords, &TileStack)> {
        self.squares.iter().enumerate().flat_map(|(x, row)| {
            row.iter()
                .enumerate()
                .map(move |(y, stack)| (Coords::new(x as i32, y as i32), stack))
        })
    }

    fn stacks_mut(&mut self) -> impl Iterator<Item = (Coords, &mut TileStack)> {
        self.squares.iter_mut().enumerate().flat_map(|(x, row)| {
            row.iter_mut()
                .enumerate()
                .map(move |(y, stack)| (Coords::new(x as i32, y as i32), stack))
        })
    }

    fn prepare_layers(&mut self, ids: &mut OccupantIdAllocator) {
        for (coords, stack) in self.stacks_mut() {
            for occupant in stack.iter_mut() {
                occupant.coordinates = Some(coords);
                ids.assign(occupant);
            }
        }
    }
}

fn deserialize_squares<'de, D>(deserializer: D) -> Result<Vec<Vec<TileStack>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Vec<Vec<serde_json::Value>>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|stack| stack.into_iter().filter_map(lenient::decode_node).collect())
                .collect()
        })
        .collect())
}

/// Named maps plus the key of the one currently played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRegistry {
    maps: BTreeMap<String, Map>,
    current_map_key: String,
    #[serde(default)]
    ids: OccupantIdAllocator,
}

impl MapRegistry {
    pub fn new(current_map_key: impl Into<String>) -> Self {
        Self {
            maps: BTreeMap::new(),
            current_map_key: current_map_key.into(),
            ids: OccupantIdAllocator::default(),
        }
    }

    pub fn with_map(mut self, key: impl Into<String>, map: Map) -> Self {
        self.insert(key, map);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, map: Map) {
        self.maps.insert(key.into(), map);
    }

    pub fn current_key(&self) -> &str {
        &self.current_map_key
    }

    pub fn has_current(&self) -> bool {
        self.maps.contains_key(&self.current_map_key)
    }

    pub fn get(&self, key: &str) -> Option<&Map> {
        self.maps.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    pub fn current(&self) -> Option<&Map> {
        self.maps.get(&self.current_map_key)
    }

    pub fn current_mut(&mut self) -> Option<&mut Map> {
        self.maps.get_mut(&self.current_map_key)
    }

    /// Switches the active map. Unknown keys leave the current map in place.
    pub fn set_current(&mut self, key: &str) -> bool {
        if !self.maps.contains_key(key) {
            return false;
        }
        self.current_map_key = key.to_string();
        true
    }

    pub fn allocate_id(&mut self) -> OccupantId {
        self.ids.allocate()
    }

    pub fn assign_ids(&mut self, occupant: &mut Occupant) {
        self.ids.assign(occupant);
    }

    /// Stamps coordinates and ids on every layer and swaps the current map's
    /// start sentinel for the player marker. Returns where the player stands.
    pub fn initialize(&mut self, player: &mut Player) -> Option<Coords> {
        let mut placed = None;
        for (key, map) in self.maps.iter_mut() {
            map.prepare_layers(&mut self.ids);
            let Some(start) = map.start.take() else {
                continue;
            };
            if *key != self.current_map_key {
                warn!(map = %key, "start_sentinel_ignored_outside_current_map");
                continue;
            }
            let mut marker = Occupant::player_marker();
            self.ids.assign(&mut marker);
            map.add(start, marker);
            player.position = start;
            placed = Some(start);
        }
        placed
    }
}
