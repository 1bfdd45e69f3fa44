use serde::{Deserialize, Serialize};

use super::entity::Player;

pub const ITEM_SIZE_PX: u32 = 32;
/// 60 seconds of logic ticks.
pub const SPEED_POTION_TICKS: u32 = 7680;

/// What an item does when used, picked or equipped. The `kind` tag is the
/// deserialization key for held and stored items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ItemEffect {
    Money { value: u32 },
    HealthPotion { amount: i32 },
    SpeedPotion { amount: f32, duration_ticks: u32 },
    Weapon { damage: i32 },
    Armor { reduction: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub height: u32,
    pub width: u32,
    #[serde(default = "default_can_be_picked")]
    pub can_be_picked: bool,
    pub effect: ItemEffect,
}

fn default_can_be_picked() -> bool {
    true
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        effect: ItemEffect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            height: ITEM_SIZE_PX,
            width: ITEM_SIZE_PX,
            can_be_picked: true,
            effect,
        }
    }

    pub fn with_size(mut self, height: u32, width: u32) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn weapon_damage(&self) -> Option<i32> {
        match self.effect {
            ItemEffect::Weapon { damage } => Some(damage),
            _ => None,
        }
    }

    pub fn money_value(&self) -> Option<u32> {
        match self.effect {
            ItemEffect::Money { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_health_potion(&self) -> bool {
        matches!(self.effect, ItemEffect::HealthPotion { .. })
    }

    /// Damage left after this item absorbs a hit. Non-armor items absorb
    /// nothing; the result never drops below zero.
    pub fn reduce_damage(&self, damage: i32) -> i32 {
        let reduction = match self.effect {
            ItemEffect::Armor { reduction } => reduction,
            _ => 0,
        };
        reduce_damage(damage, reduction)
    }

    /// Consumes the item onto `target`.
    pub fn affect(self, target: &mut Player) {
        match self.effect {
            ItemEffect::Money { value } => {
                target.money = target.money.saturating_add(value);
            }
            ItemEffect::HealthPotion { amount } => {
                target.entity.health = target.entity.health.saturating_add(amount);
            }
            ItemEffect::SpeedPotion {
                amount,
                duration_ticks,
            } => target.boosts.push(SpeedBoost {
                amount,
                remaining_ticks: duration_ticks,
            }),
            ItemEffect::Weapon { .. } => {
                if let Some(previous) = target.entity.hand.replace(self) {
                    target.inventory.add(previous);
                }
            }
            ItemEffect::Armor { .. } => {
                if let Some(previous) = target.entity.armor.replace(self) {
                    target.inventory.add(previous);
                }
            }
        }
    }
}

pub fn reduce_damage(damage: i32, reduction: i32) -> i32 {
    damage.saturating_sub(reduction.max(0)).max(0)
}

/// A time-boxed additive speed bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBoost {
    pub amount: f32,
    pub remaining_ticks: u32,
}
