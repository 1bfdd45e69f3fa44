//! Simulation core: world state, interaction rules and the tick loop.
//!
//! Nothing here touches the window, the clock or the filesystem; the host
//! drives a [`Session`] one logic tick at a time and reads it back to draw.

pub mod camera;
pub mod combat;
pub mod dialog;
pub mod effect;
pub mod entity;
pub mod geometry;
pub mod inventory;
pub mod item;
mod lenient;
pub mod map;
pub mod occupant;
pub mod quest;
mod resolver;
pub mod save;
pub mod seeded;
pub mod session;

pub use camera::Camera;
pub use combat::CombatSession;
pub use dialog::{DialogNode, DialogOption, DialogText, DialogView, Talkable};
pub use effect::{Condition, Effect};
pub use entity::{Behavior, Entity, Player};
pub use geometry::{Coords, Direction, Motion, TILE_SIZE_PX};
pub use inventory::{Inventory, PurchaseOutcome, ShopInventory};
pub use item::{Item, ItemEffect, SpeedBoost};
pub use map::{Cell, Map, MapRegistry, StackMode, DEFAULT_TERRAIN};
pub use occupant::{Body, Occupant, OccupantId, OccupantKind};
pub use quest::{Quest, QuestRegistry};
pub use save::{decode_session, encode_session, SaveError};
pub use session::{Command, Session};
