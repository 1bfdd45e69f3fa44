use tracing::{debug, info};

use super::camera::Camera;
use super::combat::CombatSession;
use super::dialog::DialogView;
use super::effect::Effect;
use super::entity::{Behavior, Player, WANDER_ATTACK_TICKS};
use super::geometry::{Coords, Direction};
use super::inventory::ShopInventory;
use super::map::{Map, MapRegistry, StackMode};
use super::occupant::{Occupant, OccupantId};
use super::quest::QuestRegistry;
use super::seeded::wander_direction;

pub const LOGIC_TICKS_PER_SECOND: u32 = 128;
/// Autonomous entities act on every tick divisible by this.
pub const AI_TICK_INTERVAL: u64 = 256;

/// One interpreted key, fed to the session every logic tick while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    PickOption(usize),
    ToggleInventory,
    ToggleQuests,
    QuickHeal,
    UseSelected,
    Buy,
    Mount,
    Escape,
}

/// An occupant addressed by cell and identity, so a stale reference simply
/// stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupantRef {
    pub coords: Coords,
    pub uid: OccupantId,
}

/// The whole mutable game state plus the transient interaction state around
/// it. Replaced wholesale on load and on death restart.
#[derive(Debug, Clone)]
pub struct Session {
    pub(super) seed: u64,
    pub(super) player: Player,
    pub(super) world: MapRegistry,
    pub(super) quests: QuestRegistry,
    pub(super) camera: Camera,
    pub(super) tick: u64,
    pub(super) last_direction: Direction,
    pub(super) waiting_for_key_up: bool,
    pub(super) last_interacted: Option<OccupantRef>,
    pub(super) current_dialog: Option<DialogView>,
    pub(super) current_shop: Option<OccupantRef>,
    pub(super) show_inventory: bool,
    pub(super) show_quests: bool,
    pub(super) combat: Option<CombatSession>,
}

impl Session {
    /// Builds a fresh session: initializes every map and centres the camera
    /// on the player's start cell.
    pub fn new(mut player: Player, mut world: MapRegistry, quests: QuestRegistry, seed: u64) -> Self {
        let start = world.initialize(&mut player).unwrap_or(player.position);
        info!(
            map = world.current_key(),
            start_x = start.x,
            start_y = start.y,
            seed,
            "session_started"
        );
        Self::from_parts(player, world, quests, Camera::new(start), seed)
    }

    /// Assembles a session from already-initialized state, as after a load.
    pub fn from_parts(
        player: Player,
        world: MapRegistry,
        quests: QuestRegistry,
        camera: Camera,
        seed: u64,
    ) -> Self {
        Self {
            seed,
            player,
            world,
            quests,
            camera,
            tick: 0,
            last_direction: Direction::Left,
            waiting_for_key_up: false,
            last_interacted: None,
            current_dialog: None,
            current_shop: None,
            show_inventory: false,
            show_quests: false,
            combat: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn world(&self) -> &MapRegistry {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut MapRegistry {
        &mut self.world
    }

    pub fn current_map(&self) -> Option<&Map> {
        self.world.current()
    }

    pub fn quests(&self) -> &QuestRegistry {
        &self.quests
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    pub fn is_waiting_for_key_up(&self) -> bool {
        self.waiting_for_key_up
    }

    pub fn last_interacted(&self) -> Option<OccupantRef> {
        self.last_interacted
    }

    pub fn current_dialog(&self) -> Option<&DialogView> {
        self.current_dialog.as_ref()
    }

    pub fn show_inventory(&self) -> bool {
        self.show_inventory
    }

    pub fn show_quests(&self) -> bool {
        self.show_quests
    }

    pub fn combat(&self) -> Option<&CombatSession> {
        self.combat.as_ref()
    }

    pub fn is_dead(&self) -> bool {
        self.player.is_dead()
    }

    /// The shop overlay's inventory, while one is open.
    pub fn shop(&self) -> Option<&ShopInventory> {
        let handle = self.current_shop?;
        self.world.current()?.find(handle.coords, handle.uid)?.shop()
    }

    pub(super) fn shop_mut(&mut self) -> Option<&mut ShopInventory> {
        let handle = self.current_shop?;
        self.world
            .current_mut()?
            .find_mut(handle.coords, handle.uid)?
            .shop_mut()
    }

    pub fn overlay_open(&self) -> bool {
        self.show_inventory || self.show_quests || self.shop().is_some()
    }

    /// Advances the simulation by one logic tick with the currently held
    /// command, if any.
    pub fn tick(&mut self, held: Option<Command>) {
        if held.is_none() {
            self.waiting_for_key_up = false;
        }
        if !self.is_dead() && !self.waiting_for_key_up && !self.player.entity.is_moving() {
            if let Some(command) = held {
                self.dispatch(command);
            }
        }

        self.player.update();
        self.update_visible();
        if self.tick % AI_TICK_INTERVAL == 0 {
            self.run_ai();
        }
        self.camera.update(self.player.effective_speed());
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Move(direction) => self.handle_direction(direction),
            Command::PickOption(index) => {
                if self.current_dialog.is_some() {
                    self.pick_dialog(index);
                }
                self.waiting_for_key_up = true;
            }
            Command::ToggleInventory => {
                self.show_inventory = !self.show_inventory;
                self.waiting_for_key_up = true;
            }
            Command::ToggleQuests => {
                self.show_quests = !self.show_quests;
                self.waiting_for_key_up = true;
            }
            Command::QuickHeal => {
                self.player.quick_heal();
                self.waiting_for_key_up = true;
            }
            Command::UseSelected => {
                if self.show_inventory {
                    self.player.use_selected();
                } else if self.show_quests {
                    self.quests.set_selected_as_current();
                }
                self.waiting_for_key_up = true;
            }
            Command::Buy => {
                self.buy_selected();
                self.waiting_for_key_up = true;
            }
            Command::Mount => {
                self.climb_mount();
                self.waiting_for_key_up = true;
            }
            Command::Escape => {
                self.show_inventory = false;
                self.show_quests = false;
                self.current_shop = None;
                self.current_dialog = None;
                self.dismount();
            }
        }
    }

    fn handle_direction(&mut self, direction: Direction) {
        if self.overlay_open() {
            if direction.is_horizontal() {
                self.move_overlay_cursor(direction == Direction::Right);
                self.waiting_for_key_up = true;
            }
            return;
        }
        if self.current_dialog.is_some() {
            self.continue_dialog();
            return;
        }
        self.action(direction);
    }

    fn move_overlay_cursor(&mut self, forward: bool) {
        if self.show_inventory {
            let inventory = &mut self.player.inventory;
            if forward {
                inventory.select_next();
            } else {
                inventory.select_previous();
            }
        } else if self.show_quests {
            if forward {
                self.quests.select_next();
            } else {
                self.quests.select_previous();
            }
        } else if let Some(shop) = self.shop_mut() {
            if forward {
                shop.select_next();
            } else {
                shop.select_previous();
            }
        }
    }

    fn buy_selected(&mut self) {
        let Some(handle) = self.current_shop else {
            return;
        };
        let Some(shop) = self
            .world
            .current_mut()
            .and_then(|map| map.find_mut(handle.coords, handle.uid))
            .and_then(Occupant::shop_mut)
        else {
            return;
        };
        let outcome = shop.buy_selected(&mut self.player);
        info!(?outcome, balance = self.player.money, "shop_purchase");
    }

    /// Interprets a pure-data effect against this session.
    pub fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AddQuest { quest } => {
                info!(quest_id = %quest.id, "quest_added");
                self.quests.add(quest);
            }
            Effect::CompleteQuest { quest_id } => {
                if let Some(quest) = self.quests.complete(&quest_id) {
                    info!(quest_id = %quest.id, "quest_completed");
                    for effect in quest.on_succeed {
                        self.apply_effect(effect);
                    }
                }
            }
            Effect::FailQuest { quest_id } => {
                if let Some(quest) = self.quests.fail(&quest_id) {
                    info!(quest_id = %quest.id, "quest_failed");
                    for effect in quest.on_failed {
                        self.apply_effect(effect);
                    }
                }
            }
            Effect::OpenShop => {
                let talker = self.last_interacted.filter(|handle| {
                    self.world
                        .current()
                        .and_then(|map| map.find(handle.coords, handle.uid))
                        .is_some_and(|occupant| occupant.shop().is_some())
                });
                self.current_shop = talker;
            }
            Effect::GiveItem { item } => {
                debug!(item_id = %item.id, "item_given");
                self.player.inventory.add(item);
            }
            Effect::TakeItem { item_id } => {
                if self.player.remove(&item_id).is_some() {
                    debug!(item_id = %item_id, "item_taken");
                }
            }
        }
    }

    pub fn start_combat(&mut self, allies: Vec<OccupantId>, enemies: Vec<OccupantId>) {
        info!(allies = allies.len(), enemies = enemies.len(), "combat_started");
        self.combat = Some(CombatSession::new(allies, enemies));
    }

    pub fn end_combat_turn(&mut self) {
        if let Some(combat) = &mut self.combat {
            combat.end_turn();
        }
    }

    pub(super) fn forget_in_combat(&mut self, uid: OccupantId) {
        let Some(combat) = &mut self.combat else {
            return;
        };
        combat.remove(uid);
        if combat.has_ended() {
            info!("combat_ended");
            self.combat = None;
        }
    }

    fn update_visible(&mut self) {
        let Some(map) = self.world.current_mut() else {
            return;
        };
        for coords in self.camera.visible_cells() {
            let Some(stack) = map.stack_mut(coords) else {
                continue;
            };
            for entity in stack.iter_mut().filter_map(Occupant::entity_mut) {
                let speed = entity.speed;
                entity.update(speed);
            }
        }
    }

    fn run_ai(&mut self) {
        let Some(map) = self.world.current() else {
            return;
        };
        let wanderers: Vec<(Coords, OccupantId)> = self
            .camera
            .visible_cells()
            .filter_map(|coords| {
                let occupant = map.get(coords, StackMode::Top)?;
                let entity = occupant.entity()?;
                (entity.behavior == Behavior::Wander && !entity.is_moving())
                    .then_some((coords, occupant.uid))
            })
            .collect();

        for (coords, uid) in wanderers {
            let direction = wander_direction(self.seed, self.tick, coords);
            let target = coords.step(direction);
            let Some(map) = self.world.current_mut() else {
                return;
            };

            if target == self.player.position {
                let Some(entity) = map.find_mut(coords, uid).and_then(Occupant::entity_mut) else {
                    continue;
                };
                entity.attacking = WANDER_ATTACK_TICKS;
                let attack = entity.attack();
                self.player.entity.apply_damage(attack);
                debug!(attack, health = self.player.entity.health, "player_hit");
                continue;
            }

            let target_free = map.contains(target)
                && map
                    .get(target, StackMode::Top)
                    .map_or(true, Occupant::is_walkable);
            if !target_free {
                continue;
            }
            let Some(mover) = map.get_mut(coords, StackMode::Top) else {
                continue;
            };
            if mover.uid != uid {
                continue;
            }
            if let Some(entity) = mover.entity_mut() {
                entity.start_move(direction);
            }
            map.move_occupant(coords, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Entity, DAMAGED_TICKS};
    use crate::sim::item::{Item, ItemEffect};
    use crate::sim::map::{Cell, DEFAULT_TERRAIN};

    fn wanderer(damage: i32) -> Occupant {
        Occupant::new_entity(
            "slime",
            false,
            true,
            Entity::new(3, 0.5, damage).with_behavior(Behavior::Wander),
        )
    }

    fn armored_player() -> Player {
        let mut entity = Entity::new(5, 1.0, 1);
        entity.armor = Some(Item::new("armor", "Armor", "", ItemEffect::Armor { reduction: 1 }));
        Player::new(entity)
    }

    /// First seed whose wander picks match every `(tick, coords, direction)`.
    fn seed_for(picks: &[(u64, Coords, Direction)]) -> u64 {
        (0u64..)
            .find(|seed| {
                picks
                    .iter()
                    .all(|&(tick, coords, direction)| wander_direction(*seed, tick, coords) == direction)
            })
            .expect("some seed matches")
    }

    fn session_with(rows: Vec<Vec<Cell>>, seed: u64) -> Session {
        let world = MapRegistry::new("field").with_map("field", Map::from_cells(rows, DEFAULT_TERRAIN));
        Session::new(armored_player(), world, QuestRegistry::default(), seed)
    }

    fn ids_at(session: &Session, coords: Coords) -> Vec<String> {
        session
            .current_map()
            .and_then(|map| map.stack(coords))
            .map(|stack| stack.iter().map(|occupant| occupant.id.clone()).collect())
            .unwrap_or_default()
    }

    fn slime_at(session: &Session, coords: Coords) -> Option<&Entity> {
        session
            .current_map()
            .and_then(|map| map.stack(coords))
            .and_then(|stack| stack.iter().find_map(Occupant::entity))
    }

    #[test]
    fn wanderer_beside_player_strikes_through_armor() {
        let slime_cell = Coords::new(0, 1);
        let seed = seed_for(&[(0, slime_cell, Direction::Left)]);
        let mut session = session_with(vec![vec![Cell::Start, Cell::Single(wanderer(2))]], seed);

        session.tick(None);

        assert_eq!(session.player().entity.health, 4);
        assert_eq!(session.player().entity.damaged, DAMAGED_TICKS);
        let slime = slime_at(&session, slime_cell).expect("slime stays put");
        assert_eq!(slime.attacking, WANDER_ATTACK_TICKS);
        assert!(!slime.is_moving());
    }

    #[test]
    fn wanderers_act_only_on_interval_ticks() {
        let slime_cell = Coords::new(0, 1);
        let seed = seed_for(&[
            (0, slime_cell, Direction::Left),
            (AI_TICK_INTERVAL, slime_cell, Direction::Left),
        ]);
        let mut session = session_with(vec![vec![Cell::Start, Cell::Single(wanderer(2))]], seed);

        session.tick(None);
        assert_eq!(session.player().entity.health, 4);
        for _ in 1..AI_TICK_INTERVAL {
            session.tick(None);
        }
        assert_eq!(session.tick_count(), AI_TICK_INTERVAL);
        assert_eq!(session.player().entity.health, 4, "no hits between interval ticks");

        session.tick(None);
        assert_eq!(session.player().entity.health, 3);
    }

    #[test]
    fn wanderer_steps_into_free_cell() {
        let slime_cell = Coords::new(0, 2);
        let seed = seed_for(&[(0, slime_cell, Direction::Right)]);
        let rows = vec![vec![Cell::Start, Cell::Empty, Cell::Single(wanderer(1)), Cell::Empty]];
        let mut session = session_with(rows, seed);

        session.tick(None);

        assert!(ids_at(&session, slime_cell).is_empty());
        assert_eq!(ids_at(&session, Coords::new(0, 3)), vec!["slime".to_string()]);
        let slime = slime_at(&session, Coords::new(0, 3)).expect("moved slime");
        assert!(slime.is_moving());
        assert_eq!(session.player().entity.health, 5);
    }

    #[test]
    fn walls_and_map_edges_block_wanderers() {
        let slime_cell = Coords::new(0, 2);
        for direction in Direction::ALL {
            let seed = seed_for(&[(0, slime_cell, direction)]);
            let rows = vec![vec![
                Cell::Start,
                Cell::Single(Occupant::square("wall", false, false)),
                Cell::Single(wanderer(1)),
            ]];
            let mut session = session_with(rows, seed);

            session.tick(None);

            assert_eq!(ids_at(&session, slime_cell), vec!["slime".to_string()], "{direction:?}");
            let slime = slime_at(&session, slime_cell).expect("slime");
            assert!(!slime.is_moving(), "{direction:?}");
            assert_eq!(slime.attacking, 0, "{direction:?}");
        }
    }

    #[test]
    fn buried_idle_moving_and_distant_entities_stay_put() {
        let buried_cell = Coords::new(0, 2);
        let idle_cell = Coords::new(0, 4);
        let moving_cell = Coords::new(0, 6);
        let distant_cell = Coords::new(0, 20);
        let seed = seed_for(&[
            (0, buried_cell, Direction::Right),
            (0, idle_cell, Direction::Right),
            (0, moving_cell, Direction::Right),
            (0, distant_cell, Direction::Left),
        ]);

        let mut moving = wanderer(1);
        if let Some(entity) = moving.entity_mut() {
            entity.start_move(Direction::Left);
        }
        let idle = Occupant::new_entity("slime", false, true, Entity::new(3, 0.5, 1));
        let mut row = vec![Cell::Empty; 22];
        row[0] = Cell::Start;
        row[2] = Cell::Layers(vec![wanderer(1), Occupant::square("leaf", true, true)]);
        row[4] = Cell::Single(idle);
        row[6] = Cell::Single(moving);
        row[20] = Cell::Single(wanderer(1));
        let mut session = session_with(vec![row], seed);

        session.tick(None);

        assert_eq!(ids_at(&session, buried_cell), vec!["slime".to_string(), "leaf".to_string()]);
        assert_eq!(ids_at(&session, idle_cell), vec!["slime".to_string()]);
        assert_eq!(ids_at(&session, moving_cell), vec!["slime".to_string()]);
        assert_eq!(ids_at(&session, distant_cell), vec!["slime".to_string()]);
        for cell in [Coords::new(0, 3), Coords::new(0, 5), Coords::new(0, 7), Coords::new(0, 19)] {
            assert!(ids_at(&session, cell).is_empty(), "{cell:?}");
        }
    }
}
