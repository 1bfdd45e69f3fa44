//! Whole-world save documents: JSON wrapped in standard base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::camera::Camera;
use super::entity::Player;
use super::map::MapRegistry;
use super::occupant::Occupant;
use super::quest::QuestRegistry;
use super::session::Session;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode save base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("save payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("parse save json{}: {source}", at_path(.path))]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at save_version: expected {expected}, got {actual}")]
    Version { expected: u32, actual: u32 },
    #[error("validation failed at map_handler.current_map_key: no map named '{0}'")]
    UnknownCurrentMap(String),
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

#[derive(Serialize)]
struct SaveGameRef<'a> {
    save_version: u32,
    player: &'a Player,
    map_handler: &'a MapRegistry,
    quest_handler: &'a QuestRegistry,
    camera: &'a Camera,
}

#[derive(Debug, Deserialize)]
pub struct SaveGame {
    pub save_version: u32,
    pub player: Player,
    pub map_handler: MapRegistry,
    #[serde(default)]
    pub quest_handler: QuestRegistry,
    pub camera: Camera,
}

pub fn encode_session(session: &Session) -> Result<String, SaveError> {
    let document = SaveGameRef {
        save_version: SAVE_VERSION,
        player: session.player(),
        map_handler: session.world(),
        quest_handler: session.quests(),
        camera: session.camera(),
    };
    let json = serde_json::to_string(&document).map_err(SaveError::Encode)?;
    Ok(BASE64.encode(json))
}

pub fn parse_save_game_json(raw: &str) -> Result<SaveGame, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        SaveError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

pub fn decode_save_game(payload: &str) -> Result<SaveGame, SaveError> {
    let bytes = BASE64.decode(payload.trim())?;
    let raw = String::from_utf8(bytes)?;
    let save = parse_save_game_json(&raw)?;
    validate_save_game(&save)?;
    Ok(save)
}

fn validate_save_game(save: &SaveGame) -> Result<(), SaveError> {
    if save.save_version != SAVE_VERSION {
        return Err(SaveError::Version {
            expected: SAVE_VERSION,
            actual: save.save_version,
        });
    }
    if !save.map_handler.has_current() {
        return Err(SaveError::UnknownCurrentMap(
            save.map_handler.current_key().to_string(),
        ));
    }
    Ok(())
}

/// Decodes a payload into a ready-to-run session sharing `seed`.
pub fn decode_session(payload: &str, seed: u64) -> Result<Session, SaveError> {
    let SaveGame {
        player,
        mut map_handler,
        quest_handler,
        camera,
        ..
    } = decode_save_game(payload)?;

    let position = player.position;
    let marker_present = map_handler
        .current()
        .and_then(|map| map.stack(position))
        .is_some_and(|stack| stack.iter().any(Occupant::is_player));
    if !marker_present {
        warn!(x = position.x, y = position.y, "save_player_marker_restored");
        let mut marker = Occupant::player_marker();
        map_handler.assign_ids(&mut marker);
        if let Some(map) = map_handler.current_mut() {
            map.add(position, marker);
        }
    }
    Ok(Session::from_parts(
        player,
        map_handler,
        quest_handler,
        camera,
        seed,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::sim::dialog::{DialogNode, DialogOption, Talkable};
    use crate::sim::effect::{Condition, Effect};
    use crate::sim::entity::Entity;
    use crate::sim::geometry::{Coords, Direction};
    use crate::sim::inventory::ShopInventory;
    use crate::sim::item::{Item, ItemEffect, SpeedBoost};
    use crate::sim::map::{Cell, Map, DEFAULT_TERRAIN};
    use crate::sim::occupant::Body;
    use crate::sim::quest::Quest;
    use crate::sim::session::Command;

    fn played_session() -> Session {
        let slime = Occupant::new_entity(
            "slime",
            false,
            true,
            Entity::new(3, 0.5, 1).with_hand(Item::new("fang", "Fang", "", ItemEffect::Weapon { damage: 1 })),
        );
        let woman = Occupant::talkable(
            "woman",
            true,
            Talkable::new([
                ("start", DialogNode::says("Hi").then("later")),
                ("later", DialogNode::one_of(&["Bye", "See you"])),
            ]),
        );
        let shop = Occupant::shop_owner(
            "shopOwner",
            Talkable::new([("start", DialogNode::says("Buy?"))]),
            ShopInventory::new("shop").with_listing(
                Item::new("armor", "Armor", "", ItemEffect::Armor { reduction: 1 }).with_size(64, 64),
                10,
            ),
        );
        let rows = vec![
            vec![
                Cell::Start,
                Cell::Single(woman),
                Cell::Layers(vec![Occupant::square("path", true, true), slime]),
            ],
            vec![Cell::Single(shop)],
        ];
        let world = MapRegistry::new("field").with_map("field", Map::from_cells(rows, DEFAULT_TERRAIN));
        let player = Player::new(Entity::new(5, 1.0, 1))
            .with_money(30)
            .with_items([Item::new("healthPotion", "Health Potion", "", ItemEffect::HealthPotion { amount: 5 })]);
        let mut quests = QuestRegistry::default();
        quests.add(Quest::new("q", "Quest", "desc"));

        let mut session = Session::new(player, world, quests, 3);
        session.action(Direction::Right);
        session.tick(None);
        session.player_mut().boosts.push(SpeedBoost {
            amount: 1.0,
            remaining_ticks: 100,
        });
        session.dispatch(Command::Move(Direction::Down));
        session
    }

    fn document(session: &Session) -> Value {
        let payload = encode_session(session).expect("encode");
        let bytes = BASE64.decode(payload).expect("base64");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[test]
    fn round_trip_preserves_world_state() {
        let session = played_session();
        let payload = encode_session(&session).expect("encode");
        let restored = decode_session(&payload, session.seed()).expect("decode");

        assert_eq!(restored.player(), session.player());
        assert_eq!(restored.world(), session.world());
        assert_eq!(restored.quests(), session.quests());
        assert_eq!(restored.camera(), session.camera());
        assert_eq!(
            encode_session(&restored).expect("re-encode"),
            payload,
            "second encode should be byte-identical"
        );
    }

    #[test]
    fn occupants_carry_type_tags() {
        let document = document(&played_session());
        let stack = &document["map_handler"]["maps"]["field"]["squares"][0][2];
        assert_eq!(stack[0]["body"]["type"], "Square");
        assert_eq!(stack[1]["body"]["type"], "Entity");
        assert_eq!(document["quest_handler"]["quests"][0]["type"], "Quest");
    }

    #[test]
    fn unknown_tags_degrade_to_absent() {
        let session = played_session();
        let mut document = document(&session);
        document["map_handler"]["maps"]["field"]["squares"][0][2][1]["body"]["type"] =
            Value::from("Dragon");
        document["player"]["inventory"]["items"][0]["effect"]["kind"] = Value::from("Elixir");
        document["quest_handler"]["quests"][0]["type"] = Value::from("SideQuest");
        let payload = BASE64.encode(document.to_string());

        let restored = decode_session(&payload, 3).expect("document should still load");
        let map = restored.current_map().expect("current map");
        assert_eq!(map.stack(Coords::new(0, 2)).map(Vec::len), Some(1));
        assert!(restored.player().inventory.is_empty());
        assert!(restored.quests().is_empty());
        assert_eq!(restored.player().money, 30);
    }

    #[test]
    fn unknown_option_effect_drops_only_that_effect() {
        let woman = Occupant::talkable(
            "woman",
            true,
            Talkable::new([
                (
                    "start",
                    DialogNode::says("Greeting").with_options([
                        DialogOption::new("shop", "Show me").with_action(Effect::OpenShop),
                        DialogOption::new("gift", "A gift?")
                            .with_action(Effect::GiveItem {
                                item: Item::new("axe", "Axe", "", ItemEffect::Weapon { damage: 3 }),
                            })
                            .available_when(Condition::PlayerHas {
                                item_id: "pickaxe".to_string(),
                            }),
                    ]),
                ),
                ("shop", DialogNode::says("Here")),
                ("gift", DialogNode::says("Take it")),
            ]),
        );
        let map = Map::from_cells(
            vec![vec![Cell::Layers(vec![
                Occupant::square("grass", true, true),
                woman,
            ])]],
            DEFAULT_TERRAIN,
        );
        let mut document = serde_json::to_value(&map).expect("map json");
        let options = &mut document["squares"][0][0][1]["body"]["dialogs"]["start"]["options"];
        options[0]["action"]["kind"] = Value::from("Teleport");
        options[1]["action"]["item"]["effect"]["kind"] = Value::from("Elixir");
        options[1]["available"]["kind"] = Value::from("PlayerIsRich");

        let restored: Map = serde_json::from_value(document).expect("map should still load");
        let stack = restored.stack(Coords::new(0, 0)).expect("stack");
        let ids: Vec<&str> = stack.iter().map(|occupant| occupant.id.as_str()).collect();
        assert_eq!(ids, vec!["grass", "woman"]);

        let Body::Talkable(dialog) = &stack[1].body else {
            panic!("woman should stay talkable");
        };
        let options = &dialog.node("start").expect("start node").options;
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].key, "shop");
        assert!(options[0].action.is_none());
        assert!(options[1].action.is_none());
        assert!(options[1].available.is_none());
    }

    #[test]
    fn malformed_envelopes_fail_with_typed_errors() {
        assert!(matches!(decode_session("%%%", 0), Err(SaveError::Base64(_))));

        let not_json = BASE64.encode("{ nope");
        assert!(matches!(decode_session(&not_json, 0), Err(SaveError::Parse { .. })));

        let mut document = document(&played_session());
        document["save_version"] = Value::from(SAVE_VERSION + 1);
        let payload = BASE64.encode(document.to_string());
        assert!(matches!(
            decode_session(&payload, 0),
            Err(SaveError::Version { .. })
        ));
    }

    #[test]
    fn parse_errors_report_json_path() {
        let mut document = document(&played_session());
        document["player"]["money"] = Value::from("lots");
        let error = parse_save_game_json(&document.to_string()).expect_err("bad money");
        match error {
            SaveError::Parse { path, .. } => assert_eq!(path, "player.money"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_current_map_is_rejected() {
        let mut document = document(&played_session());
        document["map_handler"]["current_map_key"] = Value::from("nowhere");
        let payload = BASE64.encode(document.to_string());
        assert!(matches!(
            decode_session(&payload, 0),
            Err(SaveError::UnknownCurrentMap(key)) if key == "nowhere"
        ));
    }
}
