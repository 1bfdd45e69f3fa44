//! Pure-data side effects and conditions attached to dialog options and
//! quest hooks. The session interprets them.

use serde::{Deserialize, Serialize};

use super::entity::Player;
use super::item::Item;
use super::quest::Quest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Effect {
    AddQuest { quest: Quest },
    CompleteQuest { quest_id: String },
    FailQuest { quest_id: String },
    /// Opens the shop of the occupant currently talked to.
    OpenShop,
    GiveItem { item: Item },
    TakeItem { item_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Condition {
    PlayerHas { item_id: String },
}

impl Condition {
    pub fn holds(&self, player: &Player) -> bool {
        match self {
            Condition::PlayerHas { item_id } => player.has(item_id),
        }
    }
}
