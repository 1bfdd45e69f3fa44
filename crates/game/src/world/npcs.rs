//! Talkable characters of the default world and the quest they hand out.

use engine::sim::{
    Behavior, Condition, DialogNode, DialogOption, Effect, Entity, Occupant, Quest, ShopInventory,
    Talkable,
};

use super::items::{axe, dropped_money, health_potion, simple_armor, speed_potion};

pub(crate) const MINER_QUEST_ID: &str = "minerQuest";

/// The locked door of the house nobody may enter.
pub(crate) fn house_door() -> Occupant {
    let dialog = Talkable::new([
        ("start", DialogNode::says("The door is closed").then("no")),
        ("no", DialogNode::says("No, you can't enter").then("end")),
        ("end", DialogNode::says("Stop trying")),
    ]);
    Occupant::talkable("houseDoor", false, dialog)
}

pub(crate) fn start_character() -> Occupant {
    let dialog = Talkable::new([
        ("start", DialogNode::says("Greeting stranger!").then("want")),
        (
            "want",
            DialogNode::says("Are you looking for an adventure ?")
                .with_options([DialogOption::new("no", "Indeed !")]),
        ),
        ("no", DialogNode::says("There is no adventure!").then("lol")),
        ("lol", DialogNode::says("No, I'm joking").then("yes")),
        ("yes", DialogNode::says("There is one, but...").then("end")),
        (
            "end",
            DialogNode::one_of(&[
                "I won't tell you anything more",
                "Are you trying to mess with me ?",
                "Stop bothering me !",
            ]),
        ),
    ]);
    Occupant::talkable("character", true, dialog)
}

pub(crate) fn woman() -> Occupant {
    let dialog = Talkable::new([
        (
            "start",
            DialogNode::says("Greeting").with_options([DialogOption::new("question", "Hello !")]),
        ),
        (
            "question",
            DialogNode::one_of(&["What are you doing here ?", "Why are you here ?"]).with_options([
                DialogOption::new("adventure", "I'm looking for an adventure !"),
                DialogOption::new("nothing", "I don't know"),
            ]),
        ),
        ("adventure", DialogNode::says("An adventure ?").then("no")),
        ("nothing", DialogNode::says("Ho, ok...").then("no")),
        ("no", DialogNode::says("To be honest, I don't care...").then("end")),
        ("end", DialogNode::one_of(&["Now go away !", "No, shut up"])),
    ]);
    Occupant::talkable("woman", true, dialog)
}

pub(crate) fn miner_quest() -> Quest {
    Quest::new(
        MINER_QUEST_ID,
        "The miner quest",
        "The miner lost his pickaxe in the cave at the north of the village after a slime \
         attack. Help him recover it and you will be recompensed",
    )
    .on_succeed([
        Effect::TakeItem {
            item_id: "pickaxe".to_string(),
        },
        Effect::GiveItem { item: axe() },
    ])
}

pub(crate) fn miner() -> Occupant {
    let dialog = Talkable::new([
        (
            "start",
            DialogNode::says("Hello there adventurer ! Could you help me with something ?")
                .with_options([
                    DialogOption::new("yes", "Yes"),
                    DialogOption::new("no", "No, I have not time for this"),
                ]),
        ),
        (
            "yes",
            DialogNode::says(
                "Well you see, I was mining in the cave at the north of the village when a \
                 slime attacked me",
            )
            .then("yesNext"),
        ),
        (
            "yesNext",
            DialogNode::says("Scared in the moment, I dropped my pickaxe and flee the cave")
                .then("proposeQuest"),
        ),
        (
            "proposeQuest",
            DialogNode::says("Could you recover it for me ? And maybe take care of that slime ?")
                .with_options([
                    DialogOption::new("yesQuest", "Of course").with_action(Effect::AddQuest {
                        quest: miner_quest(),
                    }),
                    DialogOption::new("noQuest", "Sorry, I would prefer not"),
                ]),
        ),
        (
            "yesQuest",
            DialogNode::says("Thanks you ! I will be sure to have a reward for you")
                .then("didYouFind"),
        ),
        (
            "noQuest",
            DialogNode::says("Well then I will have to find another way..."),
        ),
        ("no", DialogNode::says("Okay")),
        (
            "didYouFind",
            DialogNode::says("Did you find my pickaxe ?").with_options([
                DialogOption::new("yesFind", "Yes ! Here it is !")
                    .with_action(Effect::CompleteQuest {
                        quest_id: MINER_QUEST_ID.to_string(),
                    })
                    .available_when(Condition::PlayerHas {
                        item_id: "pickaxe".to_string(),
                    }),
                DialogOption::new("noFind", "No I'm still looking for it"),
            ]),
        ),
        (
            "noFind",
            DialogNode::says("Well take you time").then("didYouFind"),
        ),
        (
            "yesFind",
            DialogNode::says("It's perfect ! Here is you reward").then("reward"),
        ),
        (
            "reward",
            DialogNode::says(
                "It's an axe from a friend of mine, I am sure it will be useful to you. He \
                 doesn't need it anymore",
            )
            .then("end"),
        ),
        ("end", DialogNode::says("Thanks for the help")),
    ]);
    Occupant::talkable("miner", true, dialog)
}

/// Greets the player and opens the shop overlay on "Yes".
fn shopkeeper_dialog() -> Talkable {
    Talkable::new([
        (
            "start",
            DialogNode::says("Hello, do you whish to buy equipment ?").with_options([
                DialogOption::new("yes", "Yes").with_action(Effect::OpenShop),
                DialogOption::new("no", "No"),
            ]),
        ),
        ("yes", DialogNode::says("Suit yourself !").then("start")),
        ("no", DialogNode::says("Well, good day to you then !").then("start")),
    ])
}

pub(crate) fn village_shop_owner() -> Occupant {
    let shop = ShopInventory::new("Old village shop")
        .with_listing(health_potion(), 5)
        .with_listing(health_potion(), 5)
        .with_listing(speed_potion(), 5)
        .with_listing(speed_potion(), 5)
        .with_listing(simple_armor(), 10);
    Occupant::shop_owner("villageShopOwner", shopkeeper_dialog(), shop)
}

/// Wandering enemy worth five coins.
pub(crate) fn slime() -> Occupant {
    let entity = Entity::new(3, 0.5, 1)
        .with_behavior(Behavior::Wander)
        .with_drop(Occupant::item(dropped_money(5)));
    Occupant::new_entity("slime", false, true, entity)
}

pub(crate) fn horse() -> Occupant {
    Occupant::new_entity("horse", true, true, Entity::new(20, 2.0, 0).rideable())
}
