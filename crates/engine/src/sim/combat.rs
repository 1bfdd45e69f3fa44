use super::occupant::OccupantId;

pub use super::item::reduce_damage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Allies,
    Enemies,
}

/// Turn-based overlay: two rosters take turns, one entity at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatSession {
    allies: Vec<OccupantId>,
    enemies: Vec<OccupantId>,
    side: Side,
    index: usize,
}

impl CombatSession {
    pub fn new(allies: Vec<OccupantId>, enemies: Vec<OccupantId>) -> Self {
        Self {
            allies,
            enemies,
            side: Side::Allies,
            index: 0,
        }
    }

    pub fn allies(&self) -> &[OccupantId] {
        &self.allies
    }

    pub fn enemies(&self) -> &[OccupantId] {
        &self.enemies
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn current(&self) -> Option<OccupantId> {
        self.roster(self.side).get(self.index).copied()
    }

    /// Advances within the current roster, handing over to the other side
    /// after its last member.
    pub fn end_turn(&mut self) {
        if self.has_ended() {
            return;
        }
        self.index += 1;
        if self.index >= self.roster(self.side).len() {
            self.side = other(self.side);
            self.index = 0;
        }
    }

    pub fn remove(&mut self, id: OccupantId) {
        let current = self.current();
        self.allies.retain(|member| *member != id);
        self.enemies.retain(|member| *member != id);
        if current == Some(id) || self.index >= self.roster(self.side).len() {
            // The removed entity's successor now sits at the same index.
            if self.index >= self.roster(self.side).len() {
                self.side = other(self.side);
                self.index = 0;
            }
        } else if let Some(current) = current {
            if let Some(index) = self.roster(self.side).iter().position(|member| *member == current) {
                self.index = index;
            }
        }
    }

    pub fn has_ended(&self) -> bool {
        self.allies.is_empty() || self.enemies.is_empty()
    }

    fn roster(&self, side: Side) -> &[OccupantId] {
        match side {
            Side::Allies => &self.allies,
            Side::Enemies => &self.enemies,
        }
    }
}

fn other(side: Side) -> Side {
    match side {
        Side::Allies => Side::Enemies,
        Side::Enemies => Side::Allies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<OccupantId> {
        raw.iter().copied().map(OccupantId).collect()
    }

    #[test]
    fn turns_alternate_between_rosters() {
        let mut combat = CombatSession::new(ids(&[1, 2]), ids(&[10]));
        assert_eq!(combat.current(), Some(OccupantId(1)));
        combat.end_turn();
        assert_eq!(combat.current(), Some(OccupantId(2)));
        combat.end_turn();
        assert_eq!(combat.side(), Side::Enemies);
        assert_eq!(combat.current(), Some(OccupantId(10)));
        combat.end_turn();
        assert_eq!(combat.current(), Some(OccupantId(1)));
    }

    #[test]
    fn removing_last_enemy_ends_combat() {
        let mut combat = CombatSession::new(ids(&[1]), ids(&[10]));
        combat.remove(OccupantId(10));
        assert!(combat.has_ended());
    }

    #[test]
    fn removing_current_passes_turn_to_successor() {
        let mut combat = CombatSession::new(ids(&[1, 2]), ids(&[10, 11]));
        combat.end_turn();
        combat.end_turn();
        assert_eq!(combat.current(), Some(OccupantId(10)));
        combat.remove(OccupantId(10));
        assert_eq!(combat.current(), Some(OccupantId(11)));
        combat.remove(OccupantId(11));
        assert!(combat.has_ended());
    }

    #[test]
    fn removing_earlier_member_keeps_current() {
        let mut combat = CombatSession::new(ids(&[1, 2, 3]), ids(&[10]));
        combat.end_turn();
        assert_eq!(combat.current(), Some(OccupantId(2)));
        combat.remove(OccupantId(1));
        assert_eq!(combat.current(), Some(OccupantId(2)));
    }
}
