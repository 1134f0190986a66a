//! Data model definitions for the inventory store.
//!
//! This module defines the nodes of the inventory tree: a [`Pack`] owns
//! ordered [`Category`] values, which own ordered [`Item`] values. The flat
//! gear catalog reuses [`Item`]. Child collections hold `Arc` nodes so two
//! consecutive snapshots share every branch a mutation did not touch.
//!
//! Field names match the JSON the presentation layer exchanges with the
//! store, so every model is usable directly with `serde_json`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single piece of gear.
///
/// Items are attached to a category by full payload and replaced wholesale
/// on update. The same item (by `item_id`) is mirrored into the gear catalog
/// the first time it is added to any pack.
///
/// # Examples
///
/// ```rust
/// use packbook_core::inventory_model::Item;
/// use serde_json::json;
///
/// let tent: Item = serde_json::from_value(json!({
///     "item_id": "i1",
///     "item_name": "Tent",
///     "item_weight": 1.2,
///     "item_unit": "kg",
///     "item_quantity": 1
/// }))?;
///
/// assert_eq!(tent.item_id.as_deref(), Some("i1"));
/// assert_eq!(tent.item_price, None);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Identifier, `None` until the host assigns one.
    pub item_id: Option<String>,
    pub item_name: String,
    pub item_brand: String,
    pub item_type: String,
    pub item_link: String,
    pub item_weight: Option<f64>,
    /// Unit `item_weight` is expressed in ("g", "oz", ...).
    pub item_unit: String,
    pub item_price: Option<f64>,
    #[serde(alias = "quantity")]
    pub item_quantity: u32,
}

impl Item {
    /// Whether this item carries the given identifier.
    ///
    /// Items without an identifier never match.
    pub fn has_id(&self, item_id: &str) -> bool {
        self.item_id.as_deref() == Some(item_id)
    }
}

/// A named grouping of items within a pack ("Shelter", "Cooking").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Identifier, `None` until the host assigns one.
    pub category_id: Option<String>,
    pub category_name: String,
    pub category_desc: String,
    pub items: Vec<Arc<Item>>,
}

impl Category {
    pub fn has_id(&self, category_id: &str) -> bool {
        self.category_id.as_deref() == Some(category_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Arc<Item>> {
        self.items.iter().find(|item| item.has_id(item_id))
    }

    /// Copy of this category with a new item list; the other fields are cloned.
    pub(crate) fn with_items(&self, items: Vec<Arc<Item>>) -> Category {
        Category {
            category_id: self.category_id.clone(),
            category_name: self.category_name.clone(),
            category_desc: self.category_desc.clone(),
            items,
        }
    }
}

/// One trip's gear list.
///
/// A pack is created empty by the store with a generated `pack_id`, then
/// replaced wholesale through `update_pack`.
///
/// ```rust
/// use packbook_core::inventory_model::Pack;
///
/// let pack: Pack = serde_json::from_str(r#"{"pack_id":"p1","pack_name":"JMT","trail":"John Muir Trail"}"#)?;
/// assert!(pack.categories.is_empty());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub pack_id: String,
    #[serde(default)]
    pub pack_name: String,
    #[serde(default)]
    pub trail: String,
    #[serde(default)]
    pub categories: Vec<Arc<Category>>,
}

impl Pack {
    /// An empty pack with blank name and trail.
    pub fn empty(pack_id: impl Into<String>) -> Self {
        Pack {
            pack_id: pack_id.into(),
            ..Default::default()
        }
    }

    pub fn category(&self, category_id: &str) -> Option<&Arc<Category>> {
        self.categories
            .iter()
            .find(|category| category.has_id(category_id))
    }

    pub(crate) fn with_categories(&self, categories: Vec<Arc<Category>>) -> Pack {
        Pack {
            pack_id: self.pack_id.clone(),
            pack_name: self.pack_name.clone(),
            trail: self.trail.clone(),
            categories,
        }
    }
}

/// Totals shown on a pack page.
///
/// Quantities multiply both price and weight. Weights are grouped by their
/// unit string because the store does not convert between units; items
/// without a weight or price simply do not contribute to that total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackSummary {
    pub pack_id: String,
    pub category_count: usize,
    /// Sum of `item_quantity` across every category.
    pub item_count: u64,
    pub total_price: f64,
    /// `(unit, total weight)` pairs in first-seen order.
    pub weight_by_unit: Vec<(String, f64)>,
}

impl PackSummary {
    pub fn of(pack: &Pack) -> Self {
        let mut summary = PackSummary {
            pack_id: pack.pack_id.clone(),
            category_count: pack.categories.len(),
            ..Default::default()
        };

        for item in pack.categories.iter().flat_map(|c| c.items.iter()) {
            let quantity = f64::from(item.item_quantity);
            summary.item_count += u64::from(item.item_quantity);

            if let Some(price) = item.item_price {
                summary.total_price += price * quantity;
            }

            if let Some(weight) = item.item_weight {
                match summary
                    .weight_by_unit
                    .iter_mut()
                    .find(|(unit, _)| *unit == item.item_unit)
                {
                    Some((_, total)) => *total += weight * quantity,
                    None => summary
                        .weight_by_unit
                        .push((item.item_unit.clone(), weight * quantity)),
                }
            }
        }

        summary
    }
}

/// An immutable snapshot of the whole inventory.
///
/// The store publishes a new snapshot per committed mutation. Collections
/// that a mutation did not touch are the same `Arc` in both snapshots, which
/// lets observers detect change with [`Arc::ptr_eq`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryState {
    pub packs: Arc<Vec<Arc<Pack>>>,
    pub gear: Arc<Vec<Arc<Item>>>,
}

impl InventoryState {
    pub fn pack(&self, pack_id: &str) -> Option<&Arc<Pack>> {
        self.packs.iter().find(|pack| pack.pack_id == pack_id)
    }

    pub fn category(&self, pack_id: &str, category_id: &str) -> Option<&Arc<Category>> {
        self.pack(pack_id)?.category(category_id)
    }

    pub fn gear_item(&self, item_id: &str) -> Option<&Arc<Item>> {
        self.gear.iter().find(|item| item.has_id(item_id))
    }
}
