//! The inventory store: packs, their categories and items, and the gear catalog.
//!
//! [`InventoryStore`] owns the current [`InventoryState`] snapshot and is the
//! only place it changes. Each mutation rebuilds the path from the pack list
//! down to the node it targets and shares every other branch with the
//! previous snapshot, then publishes the result to subscribers in one step.
//!
//! Lookups are by identifier. A missing pack, category or item is reported
//! as a [`StoreError`] and leaves the state untouched.
//!
//! ```rust
//! use packbook_core::inventory_model::{Category, Item};
//! use packbook_core::inventory_state::InventoryStore;
//!
//! let mut store = InventoryStore::init("trip_planner");
//! let pack_id = store.new_pack()?.pack_id.clone();
//!
//! let shelter = Category { category_id: Some("c1".into()), ..Default::default() };
//! store.new_category(&pack_id, shelter)?;
//!
//! let tent = Item { item_id: Some("i1".into()), item_name: "Tent".into(), item_quantity: 1, ..Default::default() };
//! store.new_item(&pack_id, "c1", tent)?;
//!
//! assert_eq!(store.gear().len(), 1);
//! # Ok::<(), packbook_core::store_error::StoreError>(())
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::id_generator::{IdGenerator, UuidGenerator};
use crate::inventory_event::{InventoryEvent, Observers, SubscriptionId};
use crate::inventory_model::{Category, InventoryState, Item, Pack, PackSummary};
use crate::store_error::{StoreError, StoreResult};

/// Which copies of an item `update_item` replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSync {
    pub in_pack: bool,
    pub in_gear: bool,
}

pub struct InventoryStore {
    name: String,
    state: Arc<InventoryState>,
    ids: Box<dyn IdGenerator>,
    observers: Observers,
}

impl InventoryStore {
    /// Creates an empty store that names new packs with random UUIDs.
    pub fn init(name: impl Into<String>) -> Self {
        Self::with_id_generator(name, Box::new(UuidGenerator))
    }

    pub fn with_id_generator(name: impl Into<String>, ids: Box<dyn IdGenerator>) -> Self {
        let name = name.into();
        info!("Inventory store '{}' initialized", name);

        Self {
            name,
            state: Arc::new(InventoryState::default()),
            ids,
            observers: Observers::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================
    // Reads
    // ========================

    /// The current snapshot. It never changes; later mutations publish new ones.
    pub fn state(&self) -> Arc<InventoryState> {
        Arc::clone(&self.state)
    }

    pub fn packs(&self) -> &[Arc<Pack>] {
        &self.state.packs
    }

    pub fn gear(&self) -> &[Arc<Item>] {
        &self.state.gear
    }

    pub fn pack(&self, pack_id: &str) -> Option<&Arc<Pack>> {
        self.state.pack(pack_id)
    }

    pub fn category(&self, pack_id: &str, category_id: &str) -> Option<&Arc<Category>> {
        self.state.category(pack_id, category_id)
    }

    pub fn gear_item(&self, item_id: &str) -> Option<&Arc<Item>> {
        self.state.gear_item(item_id)
    }

    pub fn pack_summary(&self, pack_id: &str) -> StoreResult<PackSummary> {
        self.pack(pack_id)
            .map(|pack| PackSummary::of(pack))
            .ok_or_else(|| StoreError::PackNotFound(pack_id.to_string()))
    }

    // ========================
    // Observation
    // ========================

    /// Registers a listener called after every committed mutation.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&InventoryState, &InventoryEvent) + 'static,
    ) -> SubscriptionId {
        let id = self.observers.add(Box::new(listener));
        debug!("[{}] subscriber {:?} added ({} total)", self.name, id, self.observers.len());
        id
    }

    /// Returns false when the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    // ========================
    // Creation
    // ========================

    /// Appends an empty pack and returns it.
    ///
    /// Fails only if the generator hands out an identifier already in use.
    pub fn new_pack(&mut self) -> StoreResult<Arc<Pack>> {
        let pack_id = self.ids.next_id();

        if self.state.pack(&pack_id).is_some() {
            return Err(self.rejected("new_pack", StoreError::duplicate("pack", &pack_id)));
        }

        let pack = Arc::new(Pack::empty(pack_id.clone()));
        let packs = append(&self.state.packs, Arc::clone(&pack));
        self.commit(Some(packs), None, InventoryEvent::PackCreated { pack_id });
        Ok(pack)
    }

    pub fn new_category(&mut self, pack_id: &str, payload: Category) -> StoreResult<()> {
        let category_id = payload.category_id.clone();
        check_category_payload(&payload).map_err(|err| self.rejected("new_category", err))?;

        let packs = rewrite_pack(&self.state.packs, pack_id, |pack| {
            if let Some(id) = payload.category_id.as_deref() {
                if pack.category(id).is_some() {
                    return Err(StoreError::duplicate("category", id));
                }
            }
            Ok(pack.with_categories(append(&pack.categories, Arc::new(payload))))
        })
        .map_err(|err| self.rejected("new_category", err))?;

        self.commit(
            Some(packs),
            None,
            InventoryEvent::CategoryAdded {
                pack_id: pack_id.to_string(),
                category_id,
            },
        );
        Ok(())
    }

    /// Appends an item to a category and mirrors it into gear.
    ///
    /// Returns whether the item was added to gear: it is when no gear entry
    /// carries the same `item_id`. A missing identifier counts as a value
    /// of its own, so only the first unidentified item reaches gear.
    pub fn new_item(&mut self, pack_id: &str, category_id: &str, payload: Item) -> StoreResult<bool> {
        let item = Arc::new(payload);

        let packs = rewrite_category(&self.state.packs, pack_id, category_id, |category| {
            if let Some(id) = item.item_id.as_deref() {
                if category.item(id).is_some() {
                    return Err(StoreError::duplicate("item", id));
                }
            }
            Ok(category.with_items(append(&category.items, Arc::clone(&item))))
        })
        .map_err(|err| self.rejected("new_item", err))?;

        let mirrored = self.state.gear.iter().all(|entry| entry.item_id != item.item_id);
        let gear = mirrored.then(|| append(&self.state.gear, Arc::clone(&item)));

        self.commit(
            Some(packs),
            gear,
            InventoryEvent::ItemAdded {
                pack_id: pack_id.to_string(),
                category_id: category_id.to_string(),
                item_id: item.item_id.clone(),
                mirrored,
            },
        );
        Ok(mirrored)
    }

    // ========================
    // Replacement
    // ========================

    /// Replaces the pack wholesale; `payload` may carry a new `pack_id`.
    pub fn update_pack(&mut self, pack_id: &str, payload: Pack) -> StoreResult<()> {
        let packs = rewrite_pack(&self.state.packs, pack_id, |_| {
            if payload.pack_id != pack_id && self.state.pack(&payload.pack_id).is_some() {
                return Err(StoreError::duplicate("pack", &payload.pack_id));
            }
            check_pack_payload(&payload)?;
            Ok(payload)
        })
        .map_err(|err| self.rejected("update_pack", err))?;

        self.commit(
            Some(packs),
            None,
            InventoryEvent::PackUpdated {
                pack_id: pack_id.to_string(),
            },
        );
        Ok(())
    }

    pub fn update_category(&mut self, pack_id: &str, category_id: &str, payload: Category) -> StoreResult<()> {
        let packs = rewrite_pack(&self.state.packs, pack_id, |pack| {
            let index = category_index(pack, category_id)?;
            if let Some(new_id) = payload.category_id.as_deref() {
                if new_id != category_id && pack.category(new_id).is_some() {
                    return Err(StoreError::duplicate("category", new_id));
                }
            }
            check_category_payload(&payload)?;
            Ok(pack.with_categories(replace_at(&pack.categories, index, Arc::new(payload))))
        })
        .map_err(|err| self.rejected("update_category", err))?;

        self.commit(
            Some(packs),
            None,
            InventoryEvent::CategoryUpdated {
                pack_id: pack_id.to_string(),
                category_id: category_id.to_string(),
            },
        );
        Ok(())
    }

    /// Replaces an item in a pack's category and in gear.
    ///
    /// The two replacements are independent: a side with no item carrying
    /// `item_id` is left alone, so the pack copy and the gear copy can
    /// diverge. Fails when neither side matched, when the payload has no
    /// `item_id`, or when it renames the item onto an identifier already
    /// taken on a side it would replace.
    pub fn update_item(
        &mut self,
        pack_id: &str,
        category_id: &str,
        item_id: &str,
        payload: Item,
    ) -> StoreResult<ItemSync> {
        let new_id = match payload.item_id.as_deref() {
            Some(id) => id.to_string(),
            None => return Err(self.rejected("update_item", StoreError::MissingId("item"))),
        };
        let item = Arc::new(payload);
        let renamed_to = Some(new_id.as_str()).filter(|id| *id != item_id);

        let pack_side = rewrite_category(&self.state.packs, pack_id, category_id, |category| {
            let index = item_index(pack_id, category, item_id)?;
            if let Some(new_id) = renamed_to {
                if category.item(new_id).is_some() {
                    return Err(StoreError::duplicate("item", new_id));
                }
            }
            Ok(category.with_items(replace_at(&category.items, index, Arc::clone(&item))))
        });

        let (packs, pack_miss) = match pack_side {
            Ok(packs) => (Some(packs), None),
            Err(err) if err.is_not_found() => (None, Some(err)),
            Err(err) => return Err(self.rejected("update_item", err)),
        };

        let gear = match self.state.gear.iter().position(|entry| entry.has_id(item_id)) {
            Some(index) => {
                if let Some(new_id) = renamed_to {
                    if self.state.gear_item(new_id).is_some() {
                        let err = StoreError::duplicate("gear item", new_id);
                        return Err(self.rejected("update_item", err));
                    }
                }
                Some(replace_at(&self.state.gear, index, Arc::clone(&item)))
            }
            None => None,
        };

        if gear.is_none() {
            if let Some(err) = pack_miss {
                return Err(self.rejected("update_item", err));
            }
        }

        let sync = ItemSync {
            in_pack: packs.is_some(),
            in_gear: gear.is_some(),
        };
        if !(sync.in_pack && sync.in_gear) {
            warn!(
                "[{}] item '{}' replaced only in {}; pack and gear copies now differ",
                self.name,
                item_id,
                if sync.in_pack { "pack" } else { "gear" }
            );
        }

        self.commit(
            packs,
            gear,
            InventoryEvent::ItemUpdated {
                pack_id: pack_id.to_string(),
                category_id: category_id.to_string(),
                item_id: item_id.to_string(),
                in_pack: sync.in_pack,
                in_gear: sync.in_gear,
            },
        );
        Ok(sync)
    }

    // ========================
    // Deletion
    // ========================

    /// Removes a pack with everything in it. Gear is not touched.
    pub fn delete_pack(&mut self, pack_id: &str) -> StoreResult<()> {
        let index = pack_index(&self.state.packs, pack_id)
            .map_err(|err| self.rejected("delete_pack", err))?;
        let packs = remove_at(&self.state.packs, index);

        self.commit(
            Some(packs),
            None,
            InventoryEvent::PackDeleted {
                pack_id: pack_id.to_string(),
            },
        );
        Ok(())
    }

    pub fn delete_category(&mut self, pack_id: &str, category_id: &str) -> StoreResult<()> {
        let packs = rewrite_pack(&self.state.packs, pack_id, |pack| {
            let index = category_index(pack, category_id)?;
            Ok(pack.with_categories(remove_at(&pack.categories, index)))
        })
        .map_err(|err| self.rejected("delete_category", err))?;

        self.commit(
            Some(packs),
            None,
            InventoryEvent::CategoryDeleted {
                pack_id: pack_id.to_string(),
                category_id: category_id.to_string(),
            },
        );
        Ok(())
    }

    /// Removes an item from one category. Its gear entry stays.
    pub fn delete_item_from_pack(&mut self, pack_id: &str, category_id: &str, item_id: &str) -> StoreResult<()> {
        let packs = rewrite_category(&self.state.packs, pack_id, category_id, |category| {
            let index = item_index(pack_id, category, item_id)?;
            Ok(category.with_items(remove_at(&category.items, index)))
        })
        .map_err(|err| self.rejected("delete_item_from_pack", err))?;

        self.commit(
            Some(packs),
            None,
            InventoryEvent::ItemRemovedFromPack {
                pack_id: pack_id.to_string(),
                category_id: category_id.to_string(),
                item_id: item_id.to_string(),
            },
        );
        Ok(())
    }

    /// Removes an item from gear only; pack copies stay.
    pub fn delete_item_from_inventory(&mut self, item_id: &str) -> StoreResult<()> {
        let index = match self.state.gear.iter().position(|entry| entry.has_id(item_id)) {
            Some(index) => index,
            None => {
                let err = StoreError::GearItemNotFound(item_id.to_string());
                return Err(self.rejected("delete_item_from_inventory", err));
            }
        };
        let gear = remove_at(&self.state.gear, index);

        self.commit(
            None,
            Some(gear),
            InventoryEvent::ItemRemovedFromGear {
                item_id: item_id.to_string(),
            },
        );
        Ok(())
    }

    // ========================
    // Internals
    // ========================

    /// Publishes the next snapshot. A `None` collection is shared unchanged.
    fn commit(&mut self, packs: Option<Vec<Arc<Pack>>>, gear: Option<Vec<Arc<Item>>>, event: InventoryEvent) {
        let next = InventoryState {
            packs: packs.map(Arc::new).unwrap_or_else(|| Arc::clone(&self.state.packs)),
            gear: gear.map(Arc::new).unwrap_or_else(|| Arc::clone(&self.state.gear)),
        };
        self.state = Arc::new(next);

        debug!("[{}] committed {:?}", self.name, event);
        self.observers.notify(&self.state, &event);
    }

    fn rejected(&self, operation: &str, err: StoreError) -> StoreError {
        warn!("[{}] {} rejected: {}", self.name, operation, err);
        err
    }
}

fn pack_index(packs: &[Arc<Pack>], pack_id: &str) -> StoreResult<usize> {
    packs
        .iter()
        .position(|pack| pack.pack_id == pack_id)
        .ok_or_else(|| StoreError::PackNotFound(pack_id.to_string()))
}

fn category_index(pack: &Pack, category_id: &str) -> StoreResult<usize> {
    pack.categories
        .iter()
        .position(|category| category.has_id(category_id))
        .ok_or_else(|| StoreError::category_not_found(&pack.pack_id, category_id))
}

fn item_index(pack_id: &str, category: &Category, item_id: &str) -> StoreResult<usize> {
    category
        .items
        .iter()
        .position(|item| item.has_id(item_id))
        .ok_or_else(|| {
            let category_id = category.category_id.as_deref().unwrap_or_default();
            StoreError::item_not_found(pack_id, category_id, item_id)
        })
}

/// First non-null id that appears more than once.
fn first_repeated_id<'a>(ids: impl Iterator<Item = Option<&'a str>>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    ids.flatten().find(|id| !seen.insert(*id))
}

/// Rejects a category payload whose items repeat an identifier.
fn check_category_payload(category: &Category) -> StoreResult<()> {
    match first_repeated_id(category.items.iter().map(|item| item.item_id.as_deref())) {
        Some(id) => Err(StoreError::duplicate("item", id)),
        None => Ok(()),
    }
}

fn check_pack_payload(pack: &Pack) -> StoreResult<()> {
    let category_ids = pack.categories.iter().map(|category| category.category_id.as_deref());
    if let Some(id) = first_repeated_id(category_ids) {
        return Err(StoreError::duplicate("category", id));
    }
    pack.categories
        .iter()
        .try_for_each(|category| check_category_payload(category))
}

/// Rebuilds the pack list with the matching pack replaced by `edit`'s result.
fn rewrite_pack(
    packs: &[Arc<Pack>],
    pack_id: &str,
    edit: impl FnOnce(&Pack) -> StoreResult<Pack>,
) -> StoreResult<Vec<Arc<Pack>>> {
    let index = pack_index(packs, pack_id)?;
    let pack = edit(&packs[index])?;
    Ok(replace_at(packs, index, Arc::new(pack)))
}

/// Rebuilds pack list, pack and category list down to one category.
fn rewrite_category(
    packs: &[Arc<Pack>],
    pack_id: &str,
    category_id: &str,
    edit: impl FnOnce(&Category) -> StoreResult<Category>,
) -> StoreResult<Vec<Arc<Pack>>> {
    rewrite_pack(packs, pack_id, |pack| {
        let index = category_index(pack, category_id)?;
        let category = edit(&pack.categories[index])?;
        Ok(pack.with_categories(replace_at(&pack.categories, index, Arc::new(category))))
    })
}

// The list helpers copy `Arc` handles only; nodes are never cloned.

fn append<T>(list: &[Arc<T>], node: Arc<T>) -> Vec<Arc<T>> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend(list.iter().cloned());
    next.push(node);
    next
}

fn replace_at<T>(list: &[Arc<T>], index: usize, node: Arc<T>) -> Vec<Arc<T>> {
    let mut next = list.to_vec();
    next[index] = node;
    next
}

fn remove_at<T>(list: &[Arc<T>], index: usize) -> Vec<Arc<T>> {
    let mut next = list.to_vec();
    next.remove(index);
    next
}
