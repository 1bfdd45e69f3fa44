use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::dialog::Talkable;
use super::entity::Entity;
use super::geometry::{Coords, TILE_SIZE_PX};
use super::inventory::ShopInventory;
use super::item::Item;

pub const TILE_PX: u32 = TILE_SIZE_PX as u32;

/// Session-unique occupant identity, allocated by the map registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(pub u64);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantIdAllocator {
    next: u64,
}

impl OccupantIdAllocator {
    pub fn allocate(&mut self) -> OccupantId {
        self.next = self.next.saturating_add(1);
        OccupantId(self.next)
    }

    /// Gives `occupant` and everything it carries a fresh id unless already
    /// assigned.
    pub fn assign(&mut self, occupant: &mut Occupant) {
        if occupant.uid == OccupantId::default() {
            occupant.uid = self.allocate();
        }
        if let Body::Entity(entity) = &mut occupant.body {
            if let Some(drop) = entity.drop.as_deref_mut() {
                self.assign(drop);
            }
        }
    }
}

/// Destination of a map portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub map_key: String,
    pub dest: Coords,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shopkeeper {
    pub dialog: Talkable,
    pub shop: ShopInventory,
}

/// Category payload of an occupant. The `type` tag is the deserialization
/// registry key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Body {
    Square,
    MapAccessSquare(Portal),
    Talkable(Talkable),
    ShopOwner(Shopkeeper),
    Item(Item),
    Entity(Entity),
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupantKind {
    Square,
    MapAccessSquare,
    Talkable,
    ShopOwner,
    Item,
    Entity,
    Player,
}

/// What the resolver does after bumping into an occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionHook {
    None,
    OpenDialog,
    Travel(Portal),
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    #[serde(default)]
    pub uid: OccupantId,
    pub id: String,
    pub walkable: bool,
    pub transparent: bool,
    pub height: u32,
    pub width: u32,
    #[serde(default)]
    pub coordinates: Option<Coords>,
    pub body: Body,
}

impl Occupant {
    pub fn new(id: impl Into<String>, walkable: bool, transparent: bool, body: Body) -> Self {
        Self {
            uid: OccupantId::default(),
            id: id.into(),
            walkable,
            transparent,
            height: TILE_PX,
            width: TILE_PX,
            coordinates: None,
            body,
        }
    }

    pub fn square(id: impl Into<String>, walkable: bool, transparent: bool) -> Self {
        Self::new(id, walkable, transparent, Body::Square)
    }

    pub fn portal(id: impl Into<String>, map_key: impl Into<String>, dest: Coords) -> Self {
        Self::new(
            id,
            false,
            false,
            Body::MapAccessSquare(Portal {
                map_key: map_key.into(),
                dest,
            }),
        )
    }

    pub fn talkable(id: impl Into<String>, transparent: bool, dialog: Talkable) -> Self {
        Self::new(id, false, transparent, Body::Talkable(dialog))
    }

    pub fn shop_owner(id: impl Into<String>, dialog: Talkable, shop: ShopInventory) -> Self {
        Self::new(id, false, true, Body::ShopOwner(Shopkeeper { dialog, shop }))
    }

    pub fn item(item: Item) -> Self {
        let mut occupant = Self::new(item.id.clone(), true, true, Body::Square);
        occupant.height = item.height;
        occupant.width = item.width;
        occupant.body = Body::Item(item);
        occupant
    }

    pub fn new_entity(id: impl Into<String>, walkable: bool, transparent: bool, entity: Entity) -> Self {
        Self::new(id, walkable, transparent, Body::Entity(entity))
    }

    pub fn player_marker() -> Self {
        Self::new("player", false, true, Body::Player)
    }

    pub fn kind(&self) -> OccupantKind {
        match self.body {
            Body::Square => OccupantKind::Square,
            Body::MapAccessSquare(_) => OccupantKind::MapAccessSquare,
            Body::Talkable(_) => OccupantKind::Talkable,
            Body::ShopOwner(_) => OccupantKind::ShopOwner,
            Body::Item(_) => OccupantKind::Item,
            Body::Entity(_) => OccupantKind::Entity,
            Body::Player => OccupantKind::Player,
        }
    }

    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    pub fn is_player(&self) -> bool {
        matches!(self.body, Body::Player)
    }

    /// Entities and the player marker animate and render in the second pass.
    pub fn is_moving_kind(&self) -> bool {
        matches!(self.body, Body::Entity(_) | Body::Player)
    }

    pub fn can_be_picked(&self) -> bool {
        matches!(&self.body, Body::Item(item) if item.can_be_picked)
    }

    pub fn health(&self) -> Option<i32> {
        self.entity().map(|entity| entity.health)
    }

    pub fn is_mount(&self) -> bool {
        self.entity().is_some_and(|entity| entity.rideable)
    }

    pub fn entity(&self) -> Option<&Entity> {
        match &self.body {
            Body::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn entity_mut(&mut self) -> Option<&mut Entity> {
        match &mut self.body {
            Body::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn talkable_mut(&mut self) -> Option<&mut Talkable> {
        match &mut self.body {
            Body::Talkable(dialog) => Some(dialog),
            Body::ShopOwner(keeper) => Some(&mut keeper.dialog),
            _ => None,
        }
    }

    pub fn shop(&self) -> Option<&ShopInventory> {
        match &self.body {
            Body::ShopOwner(keeper) => Some(&keeper.shop),
            _ => None,
        }
    }

    pub fn shop_mut(&mut self) -> Option<&mut ShopInventory> {
        match &mut self.body {
            Body::ShopOwner(keeper) => Some(&mut keeper.shop),
            _ => None,
        }
    }

    pub fn into_item(self) -> Option<Item> {
        match self.body {
            Body::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn hook(&self) -> ActionHook {
        match &self.body {
            Body::Talkable(_) | Body::ShopOwner(_) => ActionHook::OpenDialog,
            Body::MapAccessSquare(portal) => ActionHook::Travel(portal.clone()),
            Body::Entity(_) => ActionHook::Hold,
            Body::Square | Body::Item(_) | Body::Player => ActionHook::None,
        }
    }

    /// Sprite id for the current state. Wandering entities show their `1`
    /// frame while stepping or attacking and a hurt frame after a hit;
    /// everything else renders as its id.
    pub fn render_id(&self) -> Cow<'_, str> {
        match &self.body {
            Body::Entity(entity) if entity.behavior != super::entity::Behavior::Idle => {
                if entity.damaged > 0 {
                    Cow::Owned(format!("{}Damaged", self.id))
                } else if entity.is_moving() || entity.attacking > 0 {
                    Cow::Owned(format!("{}1", self.id))
                } else {
                    Cow::Borrowed(self.id.as_str())
                }
            }
            _ => Cow::Borrowed(self.id.as_str()),
        }
    }

    /// Id with the first letter upper-cased, used to compose rider sprites.
    pub fn added_id(&self) -> String {
        let mut chars = self.id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::{Direction, Motion};
    use crate::sim::entity::Behavior;
    use crate::sim::item::ItemEffect;

    #[test]
    fn hooks_follow_category() {
        let door = Occupant::portal("houseEntrance", "house", Coords::new(4, 3));
        assert!(matches!(door.hook(), ActionHook::Travel(portal) if portal.map_key == "house"));
        assert_eq!(Occupant::square("wall", false, false).hook(), ActionHook::None);
        let slime = Occupant::new_entity("slime", false, true, Entity::new(3, 0.5, 1));
        assert_eq!(slime.hook(), ActionHook::Hold);
    }

    #[test]
    fn item_occupant_takes_item_footprint() {
        let money = Item::new("money", "Money", "", ItemEffect::Money { value: 5 }).with_size(64, 64);
        let occupant = Occupant::item(money);
        assert!(occupant.can_be_picked());
        assert!(occupant.is_walkable());
        assert_eq!((occupant.height, occupant.width), (64, 64));
    }

    #[test]
    fn wanderers_switch_frames_only_when_active() {
        let mut slime = Occupant::new_entity(
            "slime",
            false,
            true,
            Entity::new(3, 0.5, 1).with_behavior(Behavior::Wander),
        );
        assert_eq!(slime.render_id(), "slime");

        if let Some(entity) = slime.entity_mut() {
            entity.start_move(Direction::Left);
        }
        assert_eq!(slime.render_id(), "slime1");

        if let Some(entity) = slime.entity_mut() {
            entity.motion = Motion::default();
            entity.attacking = 2;
        }
        assert_eq!(slime.render_id(), "slime1");

        if let Some(entity) = slime.entity_mut() {
            entity.damaged = 3;
        }
        assert_eq!(slime.render_id(), "slimeDamaged");

        if let Some(entity) = slime.entity_mut() {
            entity.damaged = 0;
            entity.attacking = 0;
        }
        assert_eq!(slime.render_id(), "slime");
    }

    #[test]
    fn added_id_capitalizes() {
        let horse = Occupant::new_entity("horse", true, true, Entity::new(20, 2.0, 0).rideable());
        assert_eq!(horse.added_id(), "Horse");
    }

    #[test]
    fn allocator_assigns_nested_drops() {
        let money = Occupant::item(Item::new("money", "Money", "", ItemEffect::Money { value: 5 }));
        let mut slime = Occupant::new_entity("slime", false, true, Entity::new(3, 0.5, 1).with_drop(money));
        let mut ids = OccupantIdAllocator::default();
        ids.assign(&mut slime);

        let drop_uid = slime
            .entity()
            .and_then(|entity| entity.drop.as_ref())
            .map(|drop| drop.uid)
            .expect("drop");
        assert_ne!(slime.uid, OccupantId::default());
        assert_ne!(drop_uid, OccupantId::default());
        assert_ne!(drop_uid, slime.uid);
    }

    #[test]
    fn unknown_category_tag_fails_to_decode() {
        let raw = r#"{"id":"ghost","walkable":true,"transparent":true,"height":64,"width":64,"body":{"type":"Ghost"}}"#;
        assert!(serde_json::from_str::<Occupant>(raw).is_err());
    }
}
