//! Layouts of the default world.
//!
//! Each map is a list of rows; a row is whitespace-separated cell tokens.
//! `..` is an empty cell, `@@` the player's start, and `a+b` stacks `b` on
//! top of `a`. See [`occupant_for`] for the rest of the legend.

use engine::sim::{Cell, Coords, Map, MapRegistry, Occupant, DEFAULT_TERRAIN};
use tracing::warn;

use super::items::{health_potion, pickaxe, speed_potion};
use super::npcs::{horse, house_door, miner, slime, start_character, village_shop_owner, woman};

pub(crate) const VILLAGE: &str = "village";
pub(crate) const HOUSE: &str = "house";
pub(crate) const VILLAGE_SHOP: &str = "village_shop";
pub(crate) const CAVE: &str = "cave";

const CAVE_TERRAIN: &str = "rock";

const HOUSE_ROWS: &[&str] = &[
    "wa wa wa wa wa wa wa",
    "wa pl pl+hp pl pl+sp pl wa",
    "wa pl pl pl pl pl wa",
    "wa pl pl pl pl pl wa",
    "wa pl pl pl pl pl wa",
    "wa wa wa hx wa wa wa",
];

const VILLAGE_SHOP_ROWS: &[&str] = &[
    "wa wa wa wa wa wa wa",
    "wa pl pl pl+so pl pl wa",
    "wa pl pl pl pl pl wa",
    "wa pl pl pl pl pl wa",
    "wa pl pl pl pl pl wa",
    "wa wa wa sx wa wa wa",
];

const CAVE_ROWS: &[&str] = &[
    "rk rk rk rk rk rk rk",
    "rk cf cf cf+px cf cf rk",
    "rk cf cf cf cf cf rk",
    "rk cf cf cf+sl cf cf rk",
    "rk rk rk cf rk rk rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cf rk",
    ".. .. rk cx rk",
];

const VILLAGE_ROWS: &[&str] = &[
    ".. .. .. .. rk rk rk rk rk st rk rk rk rk rk rk rk",
    ".. .. rk rk rk rk rk cf+br cf+ph cf+tl rk rk rk rk rk rk rk rk",
    ".. rk rk rk rk rk rk st rk rk rk rk ce rk rk rk rk rk rk rk",
    "",
    "",
    "",
    ".. .. .. .. .. .. .. .. .. sl",
    "ro ro ro .. .. le le le .. .. ho",
    "wa wa wa .. .. le le le",
    "wa he wa .. .. .. lo",
    ".. pv .. .. .. .. lo .. .. ro ro ro",
    ".. pv .. .. ch .. @@ .. .. ws wa wa",
    ".. tr ph ph ph ph ph bl sl wa se wa",
    ".. .. .. ro ro ro .. pv .. .. pv",
    ".. .. .. wa wa wa .. tr xb ph xt el",
    ".. .. .. wa hd wa .. .. pv",
    ".. .. .. .. pv .. mi .. pv .. wo",
    ".. .. .. .. tr ph ph ph pa ph el",
    ".. .. .. .. .. .. .. .. et",
    ".. .. .. .. .. ..",
    ".. .. .. .. .. .. .. ..",
    ".. .. .. ..",
    ".. .. .. .. .. .. .. .. .. ..",
    ".. .. .. .. .. .. .. .. .. .. .. wt wt .. .. .. wt wt wt",
    ".. .. .. .. .. .. le le le .. wt wt wt wt wt wt wt wt wt",
    ".. .. .. .. .. .. le le le .. wt wt wt wt wt wt wt wt wt",
    ".. .. .. .. .. .. .. lo .. .. wt wt wt wt wt wt wt wt wt",
    "..",
    "le le le",
    "le le le",
    ".. lo",
    ".. lo",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    ".. .. .. .. pa pa pa pa",
];

pub(crate) fn default_maps() -> MapRegistry {
    MapRegistry::new(VILLAGE)
        .with_map(VILLAGE, parse_map(VILLAGE_ROWS, DEFAULT_TERRAIN))
        .with_map(HOUSE, parse_map(HOUSE_ROWS, DEFAULT_TERRAIN))
        .with_map(VILLAGE_SHOP, parse_map(VILLAGE_SHOP_ROWS, DEFAULT_TERRAIN))
        .with_map(CAVE, parse_map(CAVE_ROWS, CAVE_TERRAIN))
}

fn parse_map(rows: &[&str], terrain: &str) -> Map {
    let cells = rows
        .iter()
        .map(|row| row.split_whitespace().map(parse_cell).collect())
        .collect();
    Map::from_cells(cells, terrain)
}

fn parse_cell(token: &str) -> Cell {
    match token {
        ".." => return Cell::Empty,
        "@@" => return Cell::Start,
        _ => {}
    }
    let mut layers: Vec<Occupant> = token
        .split('+')
        .filter_map(|part| {
            let occupant = occupant_for(part);
            if occupant.is_none() {
                warn!(token = part, "map_token_unknown");
            }
            occupant
        })
        .collect();
    match layers.len() {
        0 => Cell::Empty,
        1 => layers.pop().map_or(Cell::Empty, Cell::Single),
        _ => Cell::Layers(layers),
    }
}

fn occupant_for(token: &str) -> Option<Occupant> {
    let occupant = match token {
        "wa" => Occupant::square("wall", false, false),
        "ws" => Occupant::square("wallShopSign", false, false),
        "ro" => Occupant::square("roof", false, false),
        "le" => Occupant::square("leaf", false, false),
        "lo" => Occupant::square("log", false, true),
        "rk" => Occupant::square("rock", false, false),
        "wt" => Occupant::square("water", false, false),
        "st" => Occupant::square("stair", true, false),
        "pl" => Occupant::square("plank", true, false),
        "cf" => Occupant::square("caveFloor", true, false),
        "pa" => path(""),
        "pv" => path("Vertical"),
        "ph" => path("Horizontal"),
        "tr" => path("CornerTopRight"),
        "tl" => path("CornerTopLeft"),
        "br" => path("CornerBottomRight"),
        "bl" => path("CornerBottomLeft"),
        "xt" => path("CrossTop"),
        "xb" => path("CrossBottom"),
        "el" => path("EndLeft"),
        "et" => path("EndTop"),
        "he" => Occupant::portal("houseDoor", HOUSE, Coords::new(4, 3)),
        "hx" => Occupant::portal("houseDoor", VILLAGE, Coords::new(10, 1)),
        "ce" => Occupant::portal("caveEntrance", CAVE, Coords::new(14, 3)),
        "cx" => Occupant::portal("caveEntrance", VILLAGE, Coords::new(3, 12)),
        "se" => Occupant::portal("houseDoor", VILLAGE_SHOP, Coords::new(4, 3)),
        "sx" => Occupant::portal("houseDoor", VILLAGE, Coords::new(13, 10)),
        "hp" => Occupant::item(health_potion()),
        "sp" => Occupant::item(speed_potion()),
        "px" => Occupant::item(pickaxe()),
        "sl" => slime(),
        "ho" => horse(),
        "ch" => start_character(),
        "wo" => woman(),
        "mi" => miner(),
        "hd" => house_door(),
        "so" => village_shop_owner(),
        _ => return None,
    };
    Some(occupant)
}

fn path(variant: &str) -> Occupant {
    Occupant::square(format!("path{variant}"), true, true)
}

#[cfg(test)]
mod tests {
    use engine::sim::{Body, Direction, Entity, OccupantKind, Player, StackMode};

    use super::*;

    fn all_rows() -> [(&'static str, &'static [&'static str]); 4] {
        [
            (VILLAGE, VILLAGE_ROWS),
            (HOUSE, HOUSE_ROWS),
            (VILLAGE_SHOP, VILLAGE_SHOP_ROWS),
            (CAVE, CAVE_ROWS),
        ]
    }

    #[test]
    fn every_token_is_in_the_legend() {
        for (key, rows) in all_rows() {
            for token in rows.iter().flat_map(|row| row.split_whitespace()) {
                if token == ".." || token == "@@" {
                    continue;
                }
                for part in token.split('+') {
                    assert!(occupant_for(part).is_some(), "unknown token {part} in {key}");
                }
            }
        }
    }

    #[test]
    fn start_sits_in_the_village_only() {
        let maps = default_maps();
        assert_eq!(maps.current_key(), VILLAGE);
        assert_eq!(maps.get(VILLAGE).and_then(Map::start), Some(Coords::new(11, 6)));
        for key in [HOUSE, VILLAGE_SHOP, CAVE] {
            assert_eq!(maps.get(key).and_then(Map::start), None, "{key}");
        }
    }

    #[test]
    fn layered_tokens_stack_bottom_to_top() {
        let maps = default_maps();
        let cave = maps.get(CAVE).expect("cave");
        let stack = cave.stack(Coords::new(1, 3)).expect("pickaxe cell");
        let ids: Vec<&str> = stack.iter().map(|occupant| occupant.id.as_str()).collect();
        assert_eq!(ids, vec!["caveFloor", "pickaxe"]);
        assert_eq!(cave.default_square(), CAVE_TERRAIN);
    }

    #[test]
    fn every_portal_lands_on_a_walkable_cell_beside_its_twin() {
        let mut maps = default_maps();
        maps.initialize(&mut Player::new(Entity::new(5, 1.0, 1)));
        let mut portals = 0;
        let keys: Vec<String> = maps.keys().map(str::to_string).collect();
        for key in &keys {
            let map = maps.get(key).expect("map");
            for (_, stack) in map.stacks() {
                for occupant in stack {
                    let Body::MapAccessSquare(portal) = &occupant.body else {
                        continue;
                    };
                    portals += 1;
                    let target = maps.get(&portal.map_key).expect("portal target map");
                    let landing = target.get(portal.dest, StackMode::Top);
                    assert!(
                        landing.map_or(true, Occupant::is_walkable),
                        "{key} portal lands on a blocked cell in {}",
                        portal.map_key
                    );
                    let beside_exit = Direction::ALL.iter().any(|direction| {
                        let (dx, dy) = direction.delta();
                        let next = Coords::new(portal.dest.x + dx, portal.dest.y + dy);
                        target.get(next, StackMode::Top).is_some_and(|neighbour| {
                            neighbour.kind() == OccupantKind::MapAccessSquare
                        })
                    });
                    assert!(
                        beside_exit,
                        "{key} portal to {} lands away from the way back",
                        portal.map_key
                    );
                }
            }
        }
        assert_eq!(portals, 6);
    }
}
