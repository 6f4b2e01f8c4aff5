//! Equipment inventory: four equip slots plus an unordered collection of
//! owned items. An item can only ever occupy the slot matching its own
//! [`ItemSlot`], enforced structurally by keying the equipped array with the
//! item's slot at equip time.

use crate::id::ItemId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Slots and rarity
// ---------------------------------------------------------------------------

/// The closed set of equip slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemSlot {
    Weapon,
    Helmet,
    Armor,
    Boots,
}

impl ItemSlot {
    /// All equip slots, in declaration order.
    pub const ALL: [ItemSlot; 4] = [
        ItemSlot::Weapon,
        ItemSlot::Helmet,
        ItemSlot::Armor,
        ItemSlot::Boots,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Item rarity, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// An owned piece of equipment. Bonuses start at zero and grow only through
/// upgrades ([`crate::economy::upgrade_item`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub slot: ItemSlot,
    pub rarity: Rarity,
    pub level: u32,
    pub tap_income_bonus: i64,
    pub passive_income_bonus: i64,
    pub energy_bonus: i64,
}

impl InventoryItem {
    /// A fresh level-1 item with zeroed bonuses and a newly assigned id.
    pub fn new(slot: ItemSlot, rarity: Rarity) -> Self {
        Self {
            id: ItemId::new(),
            slot,
            rarity,
            level: 1,
            tap_income_bonus: 0,
            passive_income_bonus: 0,
            energy_bonus: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Equipped-item id per slot plus the collection of owned items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    equipped: [Option<ItemId>; 4],
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the collection. Does not equip it.
    pub fn add(&mut self, item: InventoryItem) {
        self.items.push(item);
    }

    pub fn get(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut InventoryItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Remove an item from the collection, unequipping it first if needed.
    pub fn remove(&mut self, id: ItemId) -> Option<InventoryItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(index);
        if self.equipped[item.slot.index()] == Some(id) {
            self.equipped[item.slot.index()] = None;
        }
        Some(item)
    }

    /// Equip an owned item into the slot dictated by its own type.
    /// Returns false for an unknown id. Cross-slot equips cannot be
    /// expressed: the slot is taken from the item itself.
    pub fn equip(&mut self, id: ItemId) -> bool {
        match self.get(id) {
            Some(item) => {
                self.equipped[item.slot.index()] = Some(id);
                true
            }
            None => false,
        }
    }

    /// Clear a slot.
    pub fn unequip(&mut self, slot: ItemSlot) {
        self.equipped[slot.index()] = None;
    }

    /// Id currently equipped in a slot, if any.
    pub fn equipped_in(&self, slot: ItemSlot) -> Option<ItemId> {
        self.equipped[slot.index()]
    }

    /// Whether this item is equipped in its own slot.
    pub fn is_equipped(&self, item: &InventoryItem) -> bool {
        match item.slot {
            ItemSlot::Weapon => self.equipped_in(ItemSlot::Weapon) == Some(item.id),
            ItemSlot::Helmet => self.equipped_in(ItemSlot::Helmet) == Some(item.id),
            ItemSlot::Armor => self.equipped_in(ItemSlot::Armor) == Some(item.id),
            ItemSlot::Boots => self.equipped_in(ItemSlot::Boots) == Some(item.id),
        }
    }

    /// Iterate over the items currently equipped in their slots.
    pub fn equipped_items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| self.is_equipped(i))
    }

    /// All owned items, equipped or not.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
