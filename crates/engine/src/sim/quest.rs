use serde::{Deserialize, Serialize};

use super::effect::Effect;
use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestKind {
    Quest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    #[serde(rename = "type")]
    pub kind: QuestKind,
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub on_succeed: Vec<Effect>,
    #[serde(default)]
    pub on_failed: Vec<Effect>,
}

impl Quest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: QuestKind::Quest,
            id: id.into(),
            name: name.into(),
            description: description.into(),
            on_succeed: Vec::new(),
            on_failed: Vec::new(),
        }
    }

    pub fn on_succeed(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.on_succeed.extend(effects);
        self
    }

    pub fn on_failed(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.on_failed.extend(effects);
        self
    }
}

/// Active quests in insertion order, the current quest and a selection
/// cursor for the quest overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestRegistry {
    #[serde(default, deserialize_with = "lenient::vec")]
    quests: Vec<Quest>,
    #[serde(default)]
    current_quest_id: Option<String>,
    #[serde(default)]
    selected_index: usize,
}

impl QuestRegistry {
    /// Adds a quest, replacing one with the same id in place. The first quest
    /// added to an empty registry becomes current.
    pub fn add(&mut self, quest: Quest) {
        if self.quests.is_empty() {
            self.current_quest_id = Some(quest.id.clone());
        }
        match self.quests.iter_mut().find(|existing| existing.id == quest.id) {
            Some(existing) => *existing = quest,
            None => self.quests.push(quest),
        }
    }

    pub fn get(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id == quest_id)
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.get(quest_id).is_some()
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn current(&self) -> Option<&Quest> {
        self.current_quest_id
            .as_deref()
            .and_then(|quest_id| self.get(quest_id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_quest_id.as_deref()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&Quest> {
        self.quests.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.quests.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn reset_selection(&mut self) {
        self.selected_index = 0;
    }

    pub fn set_selected_as_current(&mut self) {
        if let Some(quest) = self.quests.get(self.selected_index) {
            self.current_quest_id = Some(quest.id.clone());
        }
    }

    /// Removes the quest and returns it so the caller can run its success
    /// hook. Unknown ids return `None`.
    pub fn complete(&mut self, quest_id: &str) -> Option<Quest> {
        self.take(quest_id)
    }

    /// Removes the quest and returns it so the caller can run its failure
    /// hook. Unknown ids return `None`.
    pub fn fail(&mut self, quest_id: &str) -> Option<Quest> {
        self.take(quest_id)
    }

    fn take(&mut self, quest_id: &str) -> Option<Quest> {
        let index = self.quests.iter().position(|quest| quest.id == quest_id)?;
        let quest = self.quests.remove(index);
        if self.current_quest_id.as_deref() == Some(quest_id) {
            self.current_quest_id = None;
        }
        if self.selected_index >= self.quests.len() {
            self.selected_index = self.quests.len().saturating_sub(1);
        }
        Some(quest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest(id: &str) -> Quest {
        Quest::new(id, format!("{id} name"), "")
    }

    #[test]
    fn first_added_quest_becomes_current() {
        let mut quests = QuestRegistry::default();
        quests.add(quest("a"));
        quests.add(quest("b"));
        assert_eq!(quests.current_id(), Some("a"));
        assert_eq!(quests.len(), 2);
    }

    #[test]
    fn re_adding_replaces_in_place() {
        let mut quests = QuestRegistry::default();
        quests.add(quest("a"));
        quests.add(quest("b"));
        quests.add(Quest::new("a", "renamed", ""));
        assert_eq!(quests.len(), 2);
        assert_eq!(quests.quests()[0].name, "renamed");
    }

    #[test]
    fn completing_current_clears_it_and_returns_quest() {
        let mut quests = QuestRegistry::default();
        quests.add(quest("a"));
        let done = quests.complete("a").expect("quest");
        assert_eq!(done.id, "a");
        assert!(quests.current().is_none());
        assert!(quests.is_empty());
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut quests = QuestRegistry::default();
        quests.add(quest("a"));
        assert!(quests.complete("missing").is_none());
        assert!(quests.fail("missing").is_none());
        assert_eq!(quests.len(), 1);
    }

    #[test]
    fn selected_quest_can_become_current() {
        let mut quests = QuestRegistry::default();
        quests.add(quest("a"));
        quests.add(quest("b"));
        quests.select_next();
        quests.set_selected_as_current();
        assert_eq!(quests.current_id(), Some("b"));

        quests.fail("b");
        assert_eq!(quests.selected_index(), 0);
        assert!(quests.current().is_none());
    }
}
