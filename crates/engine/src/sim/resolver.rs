//! Interaction resolution: what happens when the player pushes toward a
//! cell, picks a dialog option, mounts or travels.

use tracing::{debug, info, warn};

use super::dialog::DialogView;
use super::entity::PLAYER_ATTACK_TICKS;
use super::geometry::{Coords, Direction};
use super::map::StackMode;
use super::occupant::{ActionHook, Occupant, OccupantId};
use super::session::{OccupantRef, Session};

impl Session {
    /// Resolves a directional push from the player's cell: attack, pick up,
    /// run the target's hook, then step if the target lets the player in.
    pub fn action(&mut self, direction: Direction) {
        let to = self.player.position.step(direction);
        self.current_dialog = None;
        if direction.is_horizontal() {
            self.last_direction = direction;
        }

        let target = self
            .world
            .current()
            .and_then(|map| map.get(to, StackMode::Top))
            .map(|occupant| {
                (
                    occupant.uid,
                    occupant.is_walkable(),
                    occupant.can_be_picked(),
                    occupant.hook(),
                )
            });
        self.last_interacted = target
            .as_ref()
            .map(|(uid, ..)| OccupantRef { coords: to, uid: *uid });

        let mut hold = true;
        let enterable = match target {
            None => true,
            Some((uid, walkable, pickable, hook)) => {
                if !self.player.is_mounted() {
                    self.strike(to);
                }
                if pickable {
                    self.pick_up(to);
                }
                hold = self.run_hook(to, uid, hook);
                walkable
            }
        };

        let in_bounds = self.world.current().is_some_and(|map| map.contains(to));
        if enterable && in_bounds {
            self.move_player(direction);
            hold = false;
        }
        self.waiting_for_key_up = hold;
    }

    fn strike(&mut self, at: Coords) {
        let attack = self.player.attack();
        let Some(map) = self.world.current_mut() else {
            return;
        };
        let Some(target) = map.get_mut(at, StackMode::Top) else {
            return;
        };
        let uid = target.uid;
        let Some(entity) = target.entity_mut() else {
            return;
        };
        if entity.health <= 0 {
            return;
        }
        entity.apply_damage(attack);
        self.player.entity.attacking = PLAYER_ATTACK_TICKS;
        debug!(attack, remaining = entity.health, "player_strike");
        if entity.is_alive() {
            return;
        }

        let drop = entity.drop.take();
        match drop {
            Some(drop) => {
                map.replace_top(at, *drop);
            }
            None => {
                map.remove(at, StackMode::Top);
            }
        }
        info!(x = at.x, y = at.y, "entity_killed");
        self.forget_in_combat(uid);
    }

    fn pick_up(&mut self, at: Coords) {
        let Some(item) = self
            .world
            .current_mut()
            .and_then(|map| map.remove(at, StackMode::Top))
            .and_then(Occupant::into_item)
        else {
            return;
        };
        debug!(item_id = %item.id, "item_picked");
        self.player.pick(item);
    }

    fn run_hook(&mut self, at: Coords, uid: OccupantId, hook: ActionHook) -> bool {
        match hook {
            ActionHook::OpenDialog => {
                self.current_dialog = self.fetch_dialog(OccupantRef { coords: at, uid });
                true
            }
            ActionHook::Travel(portal) => {
                self.go_to_map(&portal.map_key, portal.dest);
                false
            }
            ActionHook::Hold => true,
            ActionHook::None => false,
        }
    }

    fn fetch_dialog(&mut self, handle: OccupantRef) -> Option<DialogView> {
        let seed = self.seed;
        let talkable = self
            .world
            .current_mut()?
            .find_mut(handle.coords, handle.uid)?
            .talkable_mut()?;
        talkable.fetch(seed, &self.player)
    }

    /// Chooses option `index` of the open dialog, runs its effect and shows
    /// the node it leads to.
    pub fn pick_dialog(&mut self, index: usize) {
        let Some(talker) = self.last_interacted else {
            return;
        };
        let effect = self
            .world
            .current_mut()
            .and_then(|map| map.find_mut(talker.coords, talker.uid))
            .and_then(Occupant::talkable_mut)
            .and_then(|talkable| talkable.choose_option(index, &self.player));
        if let Some(effect) = effect {
            self.apply_effect(effect);
        }
        self.current_dialog = self.fetch_dialog(talker);
        self.waiting_for_key_up = true;
    }

    /// Directional input while a dialog is shown: show the next node when the
    /// shown one declared one, close the dialog otherwise.
    pub fn continue_dialog(&mut self) {
        let has_next = self
            .current_dialog
            .as_ref()
            .is_some_and(|dialog| dialog.has_next);
        self.current_dialog = match (has_next, self.last_interacted) {
            (true, Some(talker)) => self.fetch_dialog(talker),
            _ => None,
        };
        self.waiting_for_key_up = true;
    }

    fn move_player(&mut self, direction: Direction) {
        let from = self.player.position;
        let to = from.step(direction);
        let Some(map) = self.world.current_mut() else {
            return;
        };
        let Some(marker) = map.remove_matching(from, Occupant::is_player) else {
            warn!(x = from.x, y = from.y, "player_marker_missing");
            return;
        };
        map.add(to, marker);
        self.player.position = to;
        self.player.entity.start_move(direction);
        self.camera.follow(to, direction);
    }

    /// Climbs a mount lying beneath the player.
    pub fn climb_mount(&mut self) {
        if self.player.is_mounted() {
            return;
        }
        let at = self.player.position;
        let Some(map) = self.world.current_mut() else {
            return;
        };
        if !map.get(at, StackMode::IgnoreTop).is_some_and(Occupant::is_mount) {
            return;
        }
        if let Some(mount) = map.remove(at, StackMode::IgnoreTop) {
            info!(mount = %mount.id, "mounted");
            self.player.climb(mount);
        }
    }

    /// Leaves the mount beneath the player.
    pub fn dismount(&mut self) {
        let at = self.player.position;
        let Some(mount) = self.player.dismount() else {
            return;
        };
        info!(mount = %mount.id, "dismounted");
        if let Some(map) = self.world.current_mut() {
            map.insert_below_top(at, mount);
        }
    }

    /// Moves the player marker onto `dest` of map `key` and recentres the
    /// camera there. Unknown maps are ignored.
    pub fn go_to_map(&mut self, key: &str, dest: Coords) -> bool {
        if self.world.get(key).is_none() {
            warn!(map = key, "map_transition_unknown_target");
            return false;
        }
        let from = self.player.position;
        let marker = self
            .world
            .current_mut()
            .and_then(|map| map.remove_matching(from, Occupant::is_player));
        let marker = match marker {
            Some(marker) => marker,
            None => {
                let mut marker = Occupant::player_marker();
                self.world.assign_ids(&mut marker);
                marker
            }
        };
        self.world.set_current(key);
        if let Some(map) = self.world.current_mut() {
            map.add(dest, marker);
        }
        self.player.position = dest;
        self.camera.jump_to(dest);
        self.current_shop = None;
        info!(map = key, x = dest.x, y = dest.y, "map_transition");
        true
    }
}
