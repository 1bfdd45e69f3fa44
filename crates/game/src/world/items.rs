use engine::sim::item::SPEED_POTION_TICKS;
use engine::sim::{Item, ItemEffect, TILE_SIZE_PX};

const TILE: u32 = TILE_SIZE_PX as u32;

pub(crate) fn health_potion() -> Item {
    Item::new(
        "healthPotion",
        "Health Potion",
        "Give 5 health points",
        ItemEffect::HealthPotion { amount: 5 },
    )
}

pub(crate) fn speed_potion() -> Item {
    Item::new(
        "speedPotion",
        "Speed Potion",
        "Give 100% speed boost for 1 minutes",
        ItemEffect::SpeedPotion {
            amount: 1.0,
            duration_ticks: SPEED_POTION_TICKS,
        },
    )
}

pub(crate) fn sword() -> Item {
    Item::new(
        "sword",
        "Sword",
        "A simple sword that deal 2 damage per hit",
        ItemEffect::Weapon { damage: 2 },
    )
}

pub(crate) fn axe() -> Item {
    Item::new(
        "axe",
        "Axe",
        "A basic axe that deal 3 damage per hit",
        ItemEffect::Weapon { damage: 3 },
    )
}

pub(crate) fn pickaxe() -> Item {
    Item::new(
        "pickaxe",
        "Pickaxe",
        "A pickaxe for mining, deal 1 damage per hit",
        ItemEffect::Weapon { damage: 1 },
    )
}

pub(crate) fn simple_armor() -> Item {
    Item::new(
        "armor",
        "Simple armor",
        "Reduce damage dealt by enemies by 1",
        ItemEffect::Armor { reduction: 1 },
    )
    .with_size(TILE, TILE)
}

/// Coins left behind by a defeated enemy.
pub(crate) fn dropped_money(value: u32) -> Item {
    Item::new("money", "Money", "Money", ItemEffect::Money { value }).with_size(TILE, TILE)
}
