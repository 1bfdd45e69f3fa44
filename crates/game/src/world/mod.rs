//! The default world: a village with a house, a shop and a cave.

mod assets;
mod items;
mod maps;
mod npcs;

use engine::sim::{Entity, Player, QuestRegistry};
use engine::{Session, WorldFactory};

pub(crate) struct DefaultWorld;

impl WorldFactory for DefaultWorld {
    fn build(&self, seed: u64) -> Session {
        Session::new(
            starting_player(),
            maps::default_maps(),
            QuestRegistry::default(),
            seed,
        )
    }

    fn asset_manifest(&self) -> &[&'static str] {
        assets::MANIFEST
    }
}

fn starting_player() -> Player {
    Player::new(Entity::new(5, 1.0, 1).with_hand(items::sword()))
        .with_money(30)
        .with_items([items::health_potion(), items::speed_potion()])
}
