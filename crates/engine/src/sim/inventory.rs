use serde::{Deserialize, Serialize};

use super::entity::Player;
use super::item::Item;
use super::lenient;

/// Ordered items plus a selection cursor. The cursor always points at an
/// item, or the inventory is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default, deserialize_with = "lenient::vec")]
    items: Vec<Item>,
    #[serde(default)]
    selected_index: usize,
}

impl Inventory {
    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }

    /// Removes the first item with `item_id`.
    pub fn remove(&mut self, item_id: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        let item = self.items.remove(index);
        self.clamp_cursor();
        Some(item)
    }

    pub fn take_first(&mut self, predicate: impl Fn(&Item) -> bool) -> Option<Item> {
        let index = self.items.iter().position(|item| predicate(item))?;
        let item = self.items.remove(index);
        self.clamp_cursor();
        Some(item)
    }

    /// Removes the selected item and resets the cursor.
    pub fn take_selected(&mut self) -> Option<Item> {
        if self.selected_index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(self.selected_index);
        self.reset_selection();
        Some(item)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&Item> {
        self.items.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.items.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn reset_selection(&mut self) {
        self.selected_index = 0;
    }

    fn clamp_cursor(&mut self) {
        if self.selected_index >= self.items.len() {
            self.selected_index = self.items.len().saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopListing {
    pub item: Item,
    pub price: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Bought { price: u32 },
    InsufficientFunds { price: u32, balance: u32 },
    NothingSelected,
}

/// Priced listings a shopkeeper sells from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopInventory {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::vec")]
    listings: Vec<ShopListing>,
    #[serde(default)]
    selected_index: usize,
}

impl ShopInventory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listings: Vec::new(),
            selected_index: 0,
        }
    }

    pub fn with_listing(mut self, item: Item, price: u32) -> Self {
        self.listings.push(ShopListing { item, price });
        self
    }

    pub fn listings(&self) -> &[ShopListing] {
        &self.listings
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&ShopListing> {
        self.listings.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.listings.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn reset_selection(&mut self) {
        self.selected_index = 0;
    }

    pub fn buy_selected(&mut self, buyer: &mut Player) -> PurchaseOutcome {
        let Some(listing) = self.listings.get(self.selected_index) else {
            return PurchaseOutcome::NothingSelected;
        };
        let price = listing.price;
        if buyer.money < price {
            return PurchaseOutcome::InsufficientFunds {
                price,
                balance: buyer.money,
            };
        }
        let listing = self.listings.remove(self.selected_index);
        buyer.money -= price;
        buyer.inventory.add(listing.item);
        self.reset_selection();
        PurchaseOutcome::Bought { price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Entity;
    use crate::sim::item::ItemEffect;

    fn potion(id: &str) -> Item {
        Item::new(id, id, "", ItemEffect::HealthPotion { amount: 5 })
    }

    fn shop() -> ShopInventory {
        ShopInventory::new("Old village shop")
            .with_listing(potion("healthPotion"), 5)
            .with_listing(potion("speedPotion"), 5)
    }

    #[test]
    fn cursor_stays_within_bounds() {
        let mut inventory = Inventory::default();
        inventory.select_next();
        assert_eq!(inventory.selected_index(), 0);

        inventory.add(potion("a"));
        inventory.add(potion("b"));
        inventory.select_next();
        inventory.select_next();
        assert_eq!(inventory.selected_index(), 1);

        inventory.remove("b");
        assert_eq!(inventory.selected_index(), 0);
        inventory.select_previous();
        assert_eq!(inventory.selected_index(), 0);
    }

    #[test]
    fn take_selected_resets_cursor() {
        let mut inventory = Inventory::default();
        inventory.add(potion("a"));
        inventory.add(potion("b"));
        inventory.select_next();
        let taken = inventory.take_selected().expect("selected item");
        assert_eq!(taken.id, "b");
        assert_eq!(inventory.selected_index(), 0);
        assert!(inventory.has("a"));
    }

    #[test]
    fn remove_only_takes_first_match() {
        let mut inventory = Inventory::default();
        inventory.add(potion("a"));
        inventory.add(potion("a"));
        assert!(inventory.remove("a").is_some());
        assert!(inventory.has("a"));
        assert!(inventory.remove("missing").is_none());
    }

    #[test]
    fn purchase_succeeds_with_exact_balance() {
        let mut shop = shop();
        let mut buyer = Player::new(Entity::new(5, 1.0, 1)).with_money(5);

        assert_eq!(shop.buy_selected(&mut buyer), PurchaseOutcome::Bought { price: 5 });
        assert_eq!(buyer.money, 0);
        assert!(buyer.inventory.has("healthPotion"));
        assert_eq!(shop.listings().len(), 1);
        assert_eq!(shop.selected_index(), 0);
    }

    #[test]
    fn purchase_rejected_when_short_leaves_everything_unchanged() {
        let mut shop = shop();
        shop.select_next();
        let mut buyer = Player::new(Entity::new(5, 1.0, 1)).with_money(4);

        assert_eq!(
            shop.buy_selected(&mut buyer),
            PurchaseOutcome::InsufficientFunds { price: 5, balance: 4 }
        );
        assert_eq!(buyer.money, 4);
        assert!(buyer.inventory.is_empty());
        assert_eq!(shop.listings().len(), 2);
        assert_eq!(shop.selected_index(), 1);
    }

    #[test]
    fn empty_shop_reports_nothing_selected() {
        let mut shop = ShopInventory::new("empty");
        let mut buyer = Player::new(Entity::new(5, 1.0, 1)).with_money(50);
        assert_eq!(shop.buy_selected(&mut buyer), PurchaseOutcome::NothingSelected);
    }
}
