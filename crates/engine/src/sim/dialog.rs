use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::effect::{Condition, Effect};
use super::entity::Player;
use super::lenient;
use super::seeded::dialog_variant;

pub const START_NODE: &str = "start";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogText {
    One(String),
    Variants(Vec<String>),
}

impl DialogText {
    /// Variant texts resolve through a seeded pick keyed by the node, so the
    /// same node reads the same way for the whole session.
    pub fn resolve(&self, node_key: &str, seed: u64) -> &str {
        match self {
            DialogText::One(text) => text,
            DialogText::Variants(variants) => variants
                .get(dialog_variant(seed, node_key, variants.len()))
                .map_or("", String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogOption {
    /// Node the dialog moves to when this option is chosen.
    pub key: String,
    pub label: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub available: Option<Condition>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub action: Option<Effect>,
}

impl DialogOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            available: None,
            action: None,
        }
    }

    pub fn with_action(mut self, action: Effect) -> Self {
        self.action = Some(action);
        self
    }

    pub fn available_when(mut self, condition: Condition) -> Self {
        self.available = Some(condition);
        self
    }

    pub fn is_available(&self, player: &Player) -> bool {
        self.available
            .as_ref()
            .map_or(true, |condition| condition.holds(player))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogNode {
    pub text: DialogText,
    #[serde(default)]
    pub options: Vec<DialogOption>,
    #[serde(default)]
    pub next: Option<String>,
}

impl DialogNode {
    pub fn says(text: impl Into<String>) -> Self {
        Self {
            text: DialogText::One(text.into()),
            options: Vec::new(),
            next: None,
        }
    }

    pub fn one_of(variants: &[&str]) -> Self {
        Self {
            text: DialogText::Variants(variants.iter().map(|text| text.to_string()).collect()),
            options: Vec::new(),
            next: None,
        }
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = DialogOption>) -> Self {
        self.options.extend(options);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: String,
    pub available: bool,
}

/// A fetched dialog node, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub node_key: String,
    pub text: String,
    pub options: Vec<OptionView>,
    pub has_next: bool,
}

/// Keyed dialog graph with a cursor on the node shown next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talkable {
    dialogs: BTreeMap<String, DialogNode>,
    current_key: String,
}

impl Talkable {
    pub fn new<K: Into<String>>(nodes: impl IntoIterator<Item = (K, DialogNode)>) -> Self {
        Self {
            dialogs: nodes
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
            current_key: START_NODE.to_string(),
        }
    }

    pub fn current_key(&self) -> &str {
        &self.current_key
    }

    pub fn node(&self, key: &str) -> Option<&DialogNode> {
        self.dialogs.get(key)
    }

    /// Returns the current node for display and advances the cursor to its
    /// `next` key when it declares one.
    pub fn fetch(&mut self, seed: u64, player: &Player) -> Option<DialogView> {
        let node_key = self.current_key.clone();
        let node = self.dialogs.get(&node_key)?;
        let view = DialogView {
            text: node.text.resolve(&node_key, seed).to_string(),
            options: node
                .options
                .iter()
                .map(|option| OptionView {
                    label: option.label.clone(),
                    available: option.is_available(player),
                })
                .collect(),
            has_next: node.next.is_some(),
            node_key,
        };
        if let Some(next) = &node.next {
            self.current_key = next.clone();
        }
        Some(view)
    }

    /// Applies option `index` of the node last shown and returns the effect
    /// to run. An unavailable or missing option falls through to the node's
    /// `next` key.
    ///
    /// `fetch` has already advanced past nodes with a `next`, so options are
    /// read from the node under the cursor.
    pub fn choose_option(&mut self, index: usize, player: &Player) -> Option<Effect> {
        let node = self.dialogs.get(&self.current_key)?;
        match node.options.get(index) {
            Some(option) if option.is_available(player) => {
                let action = option.action.clone();
                self.current_key = option.key.clone();
                action
            }
            _ => {
                if let Some(next) = node.next.clone() {
                    self.current_key = next;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Entity;
    use crate::sim::item::{Item, ItemEffect};

    fn player() -> Player {
        Player::new(Entity::new(5, 1.0, 1))
    }

    fn miner() -> Talkable {
        Talkable::new([
            (
                "start",
                DialogNode::says("Did you see my pickaxe?").with_options([
                    DialogOption::new("yes", "Yes, here it is")
                        .available_when(Condition::PlayerHas {
                            item_id: "pickaxe".to_string(),
                        })
                        .with_action(Effect::TakeItem {
                            item_id: "pickaxe".to_string(),
                        }),
                    DialogOption::new("no", "No"),
                ]),
            ),
            ("yes", DialogNode::says("Thanks!")),
            ("no", DialogNode::says("Too bad.").then("start")),
        ])
    }

    #[test]
    fn fetch_advances_exactly_one_step() {
        let mut talkable = Talkable::new([
            ("start", DialogNode::says("one").then("second")),
            ("second", DialogNode::says("two").then("third")),
            ("third", DialogNode::says("three")),
        ]);
        let player = player();

        assert_eq!(talkable.fetch(0, &player).map(|view| view.text), Some("one".into()));
        assert_eq!(talkable.current_key(), "second");
        assert_eq!(talkable.fetch(0, &player).map(|view| view.text), Some("two".into()));
        assert_eq!(talkable.fetch(0, &player).map(|view| view.text), Some("three".into()));
        assert_eq!(talkable.current_key(), "third", "terminal nodes keep the cursor");
    }

    #[test]
    fn unavailable_option_does_not_move() {
        let mut talkable = miner();
        let player = player();
        let view = talkable.fetch(0, &player).expect("start node");
        assert!(!view.options[0].available);

        assert!(talkable.choose_option(0, &player).is_none());
        assert_eq!(talkable.current_key(), "start");
    }

    #[test]
    fn available_option_returns_action_and_moves() {
        let mut talkable = miner();
        let player = player().with_items([Item::new(
            "pickaxe",
            "Pickaxe",
            "",
            ItemEffect::Weapon { damage: 1 },
        )]);
        talkable.fetch(0, &player);

        let action = talkable.choose_option(0, &player);
        assert_eq!(
            action,
            Some(Effect::TakeItem {
                item_id: "pickaxe".to_string()
            })
        );
        assert_eq!(talkable.current_key(), "yes");
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut talkable = miner();
        let player = player();
        assert!(talkable.choose_option(7, &player).is_none());
        assert_eq!(talkable.current_key(), "start");
    }

    #[test]
    fn variant_text_is_stable_within_a_session() {
        let mut talkable = Talkable::new([(
            "start",
            DialogNode::one_of(&["Hello", "Hi", "Good morning"]),
        )]);
        let player = player();
        let first = talkable.fetch(99, &player).expect("node").text;
        for _ in 0..5 {
            assert_eq!(talkable.fetch(99, &player).expect("node").text, first);
        }
    }

    #[test]
    fn missing_current_node_fetches_nothing() {
        let mut talkable = Talkable::new([("other", DialogNode::says("x"))]);
        assert!(talkable.fetch(0, &player()).is_none());
    }
}
