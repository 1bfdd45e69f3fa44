use serde::{Deserialize, Serialize};

use super::geometry::{Coords, Direction, Motion};
use super::inventory::Inventory;
use super::item::{Item, SpeedBoost};
use super::lenient;
use super::occupant::Occupant;

/// Ticks an entity shows its hurt sprite after taking damage.
pub const DAMAGED_TICKS: u32 = 16;
pub const PLAYER_ATTACK_TICKS: u32 = 32;
pub const WANDER_ATTACK_TICKS: u32 = 64;
pub const PLAYER_HEIGHT_PX: u32 = 64;
pub const MOUNTED_PLAYER_HEIGHT_PX: u32 = 96;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    #[default]
    Idle,
    /// Picks a random direction every AI tick; attacks the player when it
    /// would walk into them.
    Wander,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub health: i32,
    pub speed: f32,
    pub damage: i32,
    #[serde(default, deserialize_with = "lenient::option")]
    pub hand: Option<Item>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub drop: Option<Box<Occupant>>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub armor: Option<Item>,
    #[serde(default)]
    pub damaged: u32,
    #[serde(default)]
    pub attacking: u32,
    #[serde(default)]
    pub motion: Motion,
    #[serde(default)]
    pub behavior: Behavior,
    #[serde(default)]
    pub rideable: bool,
}

impl Entity {
    pub fn new(health: i32, speed: f32, damage: i32) -> Self {
        Self {
            health,
            speed,
            damage,
            hand: None,
            drop: None,
            armor: None,
            damaged: 0,
            attacking: 0,
            motion: Motion::default(),
            behavior: Behavior::Idle,
            rideable: false,
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_hand(mut self, hand: Item) -> Self {
        self.hand = Some(hand);
        self
    }

    pub fn with_drop(mut self, drop: Occupant) -> Self {
        self.drop = Some(Box::new(drop));
        self
    }

    pub fn rideable(mut self) -> Self {
        self.rideable = true;
        self
    }

    /// Held-weapon damage when non-zero, base damage otherwise.
    pub fn attack(&self) -> i32 {
        match self.hand.as_ref().and_then(Item::weapon_damage) {
            Some(damage) if damage != 0 => damage,
            _ => self.damage,
        }
    }

    pub fn apply_damage(&mut self, damage: i32) {
        let taken = match &self.armor {
            Some(armor) => armor.reduce_damage(damage),
            None => damage.max(0),
        };
        self.health = self.health.saturating_sub(taken);
        self.damaged = DAMAGED_TICKS;
    }

    pub fn start_move(&mut self, direction: Direction) {
        self.motion = Motion::toward(direction);
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_moving()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Per-tick countdowns plus motion decay at `speed`.
    pub fn update(&mut self, speed: f32) {
        self.damaged = self.damaged.saturating_sub(1);
        self.attacking = self.attacking.saturating_sub(1);
        self.motion.advance(speed);
    }
}

/// The single player-controlled entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub entity: Entity,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub money: u32,
    pub position: Coords,
    #[serde(default, deserialize_with = "lenient::option")]
    pub mount: Option<Box<Occupant>>,
    #[serde(default)]
    pub boosts: Vec<SpeedBoost>,
}

impl Player {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            inventory: Inventory::default(),
            money: 0,
            position: Coords::new(0, 0),
            mount: None,
            boosts: Vec::new(),
        }
    }

    pub fn with_money(mut self, money: u32) -> Self {
        self.money = money;
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        for item in items {
            self.inventory.add(item);
        }
        self
    }

    pub fn attack(&self) -> i32 {
        self.entity.attack()
    }

    pub fn is_dead(&self) -> bool {
        !self.entity.is_alive()
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    /// Mount speed while riding, base speed otherwise, plus active boosts.
    pub fn effective_speed(&self) -> f32 {
        let base = self
            .mount
            .as_ref()
            .and_then(|mount| mount.entity())
            .map_or(self.entity.speed, |mount| mount.speed);
        base + self.boosts.iter().map(|boost| boost.amount).sum::<f32>()
    }

    pub fn height(&self) -> u32 {
        if self.is_mounted() {
            MOUNTED_PLAYER_HEIGHT_PX
        } else {
            PLAYER_HEIGHT_PX
        }
    }

    /// Takes an item lifted from the map. A weapon is equipped only when it
    /// beats the current attack; money credits the balance; anything else is
    /// stored.
    pub fn pick(&mut self, item: Item) {
        if let Some(damage) = item.weapon_damage() {
            if damage > self.attack() {
                if let Some(previous) = self.entity.hand.replace(item) {
                    self.inventory.add(previous);
                }
                return;
            }
        }
        if let Some(value) = item.money_value() {
            self.money = self.money.saturating_add(value);
            return;
        }
        self.inventory.add(item);
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.inventory.has(item_id)
            || self.entity.hand.as_ref().is_some_and(|hand| hand.id == item_id)
    }

    /// Removes one item with `item_id`, looking at the held weapon first.
    pub fn remove(&mut self, item_id: &str) -> Option<Item> {
        if self.entity.hand.as_ref().is_some_and(|hand| hand.id == item_id) {
            return self.entity.hand.take();
        }
        self.inventory.remove(item_id)
    }

    pub fn use_item(&mut self, item_id: &str) -> bool {
        match self.inventory.remove(item_id) {
            Some(item) => {
                item.affect(self);
                true
            }
            None => false,
        }
    }

    pub fn use_selected(&mut self) -> bool {
        match self.inventory.take_selected() {
            Some(item) => {
                item.affect(self);
                true
            }
            None => false,
        }
    }

    /// Drinks the first health potion carried, if any.
    pub fn quick_heal(&mut self) -> bool {
        match self.inventory.take_first(Item::is_health_potion) {
            Some(item) => {
                item.affect(self);
                true
            }
            None => false,
        }
    }

    pub fn climb(&mut self, mount: Occupant) {
        self.mount = Some(Box::new(mount));
    }

    pub fn dismount(&mut self) -> Option<Occupant> {
        self.mount.take().map(|mount| *mount)
    }

    pub fn update(&mut self) {
        let speed = self.effective_speed();
        self.entity.update(speed);
        for boost in &mut self.boosts {
            boost.remaining_ticks = boost.remaining_ticks.saturating_sub(1);
        }
        self.boosts.retain(|boost| boost.remaining_ticks > 0);
    }
}
