//! Change notifications published by the inventory store.
//!
//! Every committed mutation publishes exactly one [`InventoryEvent`] together
//! with the snapshot it produced. Observers register through
//! `InventoryStore::subscribe` and are called synchronously, in subscription
//! order, after the new snapshot is in place.

use serde::{Deserialize, Serialize};

use crate::inventory_model::InventoryState;

/// What a committed mutation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum InventoryEvent {
    PackCreated { pack_id: String },
    PackUpdated { pack_id: String },
    PackDeleted { pack_id: String },
    CategoryAdded { pack_id: String, category_id: Option<String> },
    CategoryUpdated { pack_id: String, category_id: String },
    CategoryDeleted { pack_id: String, category_id: String },
    /// `mirrored` is true when the item was also appended to gear.
    ItemAdded {
        pack_id: String,
        category_id: String,
        item_id: Option<String>,
        mirrored: bool,
    },
    /// Reports which of the two copies were replaced.
    ItemUpdated {
        pack_id: String,
        category_id: String,
        item_id: String,
        in_pack: bool,
        in_gear: bool,
    },
    ItemRemovedFromPack {
        pack_id: String,
        category_id: String,
        item_id: String,
    },
    ItemRemovedFromGear { item_id: String },
}

impl InventoryEvent {
    /// Whether the pack tree may differ from the previous snapshot.
    pub fn touches_packs(&self) -> bool {
        match self {
            InventoryEvent::ItemRemovedFromGear { .. } => false,
            InventoryEvent::ItemUpdated { in_pack, .. } => *in_pack,
            _ => true,
        }
    }

    /// Whether the gear catalog may differ from the previous snapshot.
    pub fn touches_gear(&self) -> bool {
        match self {
            InventoryEvent::ItemAdded { mirrored, .. } => *mirrored,
            InventoryEvent::ItemUpdated { in_gear, .. } => *in_gear,
            InventoryEvent::ItemRemovedFromGear { .. } => true,
            _ => false,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

pub type Listener = Box<dyn FnMut(&InventoryState, &InventoryEvent)>;

/// Registered listeners, kept in subscription order.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Observers {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn notify(&mut self, state: &InventoryState, event: &InventoryEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(state, event);
        }
    }
}
