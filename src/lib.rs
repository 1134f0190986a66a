//! # Packbook Core
//!
//! An in-memory inventory store for backpacking gear. Users organize packs
//! that hold categories that hold items, and a flat gear catalog keeps one
//! entry per item ever added to any pack.
//!
//! ## Features
//!
//! - **Persistent snapshots**: every mutation publishes a new
//!   [`InventoryState`](inventory_model::InventoryState) that shares all
//!   untouched branches with the previous one
//! - **Explicit outcomes**: a missing pack, category or item is reported, never swallowed
//! - **Observable**: subscribers are told what changed after every commit
//! - **FFI-ready**: C-compatible JSON functions for UI hosts
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use packbook_core::{create_inventory, new_pack, get_state, free_response};
//! use std::ffi::CString;
//!
//! let name = CString::new("trip_planner").unwrap();
//! let store = create_inventory(name.as_ptr());
//!
//! let created = new_pack(store);
//! free_response(created as *mut _);
//!
//! let snapshot = get_state(store);
//! free_response(snapshot as *mut _);
//! ```
//!
//! ## FFI Functions
//!
//! Every function except [`create_inventory`] and [`free_response`] returns
//! a JSON-encoded [`AppResponse`](app_response::AppResponse) that the caller
//! releases with [`free_response`].
//!
//! - [`create_inventory`] / [`close_inventory`] - store lifecycle
//! - [`new_pack`], [`new_category`], [`new_item`] - creation
//! - [`update_pack`], [`update_category`], [`update_item`] - wholesale replacement
//! - [`delete_pack`], [`delete_category`], [`delete_item_from_pack`],
//!   [`delete_item_from_inventory`] - removal
//! - [`get_state`], [`get_pack`], [`get_gear`], [`get_pack_summary`] - reads

pub mod app_response;
pub mod id_generator;
pub mod inventory_event;
pub mod inventory_model;
pub mod inventory_state;
pub mod store_error;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::app_response::AppResponse;
use crate::inventory_model::{Category, Item, Pack};
use crate::inventory_state::InventoryStore;
use crate::store_error::StoreResult;

/// Creates an empty inventory store.
///
/// # Parameters
///
/// * `name` - A null-terminated C string naming the store, used in log output
///
/// # Returns
///
/// Returns a pointer to the [`InventoryStore`] on success, or a null pointer
/// if `name` is null or not valid UTF-8. Release it with [`close_inventory`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use packbook_core::create_inventory;
///
/// let name = CString::new("trip_planner").unwrap();
/// let store = create_inventory(name.as_ptr());
/// assert!(!store.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_inventory(name: *const c_char) -> *mut InventoryStore {
    if name.is_null() {
        warn!("Null name pointer passed to create_inventory");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(InventoryStore::init(name_str)))
}

/// Appends an empty pack with a generated id.
///
/// `Ok` carries the new pack as JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn new_pack(store: *mut InventoryStore) -> *const c_char {
    let store = match store_mut(store, "new_pack") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match store.new_pack() {
        Ok(pack) => respond_json(&*pack),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Appends a category to a pack.
///
/// # Parameters
///
/// * `store` - Pointer to the store
/// * `pack_id` - Null-terminated id of the target pack
/// * `json_ptr` - Null-terminated JSON [`Category`] payload
///
/// # JSON Format
///
/// ```json
/// {
///   "category_id": "c1",
///   "category_name": "Shelter",
///   "category_desc": "Tent and stakes",
///   "items": []
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn new_category(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "new_category") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let pack_id = match c_ptr_to_string(pack_id, "pack_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    let payload: Category = match parse_payload(json_ptr) {
        Ok(p) => p,
        Err(err) => return err,
    };

    acknowledge(store.new_category(&pack_id, payload), "Category added")
}

/// Appends an item to a category and mirrors it into gear.
///
/// `Ok` carries `{"mirrored": bool}`, true when a gear entry was created.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn new_item(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    category_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "new_item") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let (pack_id, category_id) = match (
        c_ptr_to_string(pack_id, "pack_id"),
        c_ptr_to_string(category_id, "category_id"),
    ) {
        (Ok(p), Ok(c)) => (p, c),
        (Err(err), _) | (_, Err(err)) => return err,
    };
    let payload: Item = match parse_payload(json_ptr) {
        Ok(p) => p,
        Err(err) => return err,
    };

    respond(
        store
            .new_item(&pack_id, &category_id, payload)
            .map(|mirrored| json!({ "mirrored": mirrored })),
    )
}

/// Replaces a pack wholesale with the JSON [`Pack`] payload.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_pack(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "update_pack") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let pack_id = match c_ptr_to_string(pack_id, "pack_id") {
        Ok(id) => id,
        Err(err) => return err,
    };
    let payload: Pack = match parse_payload(json_ptr) {
        Ok(p) => p,
        Err(err) => return err,
    };

    acknowledge(store.update_pack(&pack_id, payload), "Pack updated")
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_category(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    category_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "update_category") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let (pack_id, category_id) = match (
        c_ptr_to_string(pack_id, "pack_id"),
        c_ptr_to_string(category_id, "category_id"),
    ) {
        (Ok(p), Ok(c)) => (p, c),
        (Err(err), _) | (_, Err(err)) => return err,
    };
    let payload: Category = match parse_payload(json_ptr) {
        Ok(p) => p,
        Err(err) => return err,
    };

    acknowledge(store.update_category(&pack_id, &category_id, payload), "Category updated")
}

/// Replaces an item in its category and in gear.
///
/// `Ok` carries `{"in_pack": bool, "in_gear": bool}` telling which copies
/// were replaced. `NotFound` is returned only when neither was.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_item(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    category_id: *const c_char,
    item_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "update_item") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let (pack_id, category_id, item_id) = match (
        c_ptr_to_string(pack_id, "pack_id"),
        c_ptr_to_string(category_id, "category_id"),
        c_ptr_to_string(item_id, "item_id"),
    ) {
        (Ok(p), Ok(c), Ok(i)) => (p, c, i),
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => return err,
    };
    let payload: Item = match parse_payload(json_ptr) {
        Ok(p) => p,
        Err(err) => return err,
    };

    respond(store.update_item(&pack_id, &category_id, &item_id, payload))
}

/// Deletes a pack and everything in it. Gear entries survive.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_pack(store: *mut InventoryStore, pack_id: *const c_char) -> *const c_char {
    let store = match store_mut(store, "delete_pack") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let pack_id = match c_ptr_to_string(pack_id, "pack_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    acknowledge(store.delete_pack(&pack_id), "Pack deleted")
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_category(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    category_id: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "delete_category") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let (pack_id, category_id) = match (
        c_ptr_to_string(pack_id, "pack_id"),
        c_ptr_to_string(category_id, "category_id"),
    ) {
        (Ok(p), Ok(c)) => (p, c),
        (Err(err), _) | (_, Err(err)) => return err,
    };

    acknowledge(store.delete_category(&pack_id, &category_id), "Category deleted")
}

/// Removes an item from one category. Its gear entry is kept.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_item_from_pack(
    store: *mut InventoryStore,
    pack_id: *const c_char,
    category_id: *const c_char,
    item_id: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "delete_item_from_pack") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let (pack_id, category_id, item_id) = match (
        c_ptr_to_string(pack_id, "pack_id"),
        c_ptr_to_string(category_id, "category_id"),
        c_ptr_to_string(item_id, "item_id"),
    ) {
        (Ok(p), Ok(c), Ok(i)) => (p, c, i),
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => return err,
    };

    acknowledge(store.delete_item_from_pack(&pack_id, &category_id, &item_id), "Item removed from pack")
}

/// Removes an item from gear. Copies inside packs are kept.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_item_from_inventory(store: *mut InventoryStore, item_id: *const c_char) -> *const c_char {
    let store = match store_mut(store, "delete_item_from_inventory") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let item_id = match c_ptr_to_string(item_id, "item_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    acknowledge(store.delete_item_from_inventory(&item_id), "Item removed from gear")
}

/// Returns the whole current snapshot: `{"packs": [...], "gear": [...]}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_state(store: *mut InventoryStore) -> *const c_char {
    match store_mut(store, "get_state") {
        Ok(s) => respond_json(&*s.state()),
        Err(err) => err,
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_pack(store: *mut InventoryStore, pack_id: *const c_char) -> *const c_char {
    let store = match store_mut(store, "get_pack") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let pack_id = match c_ptr_to_string(pack_id, "pack_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match store.pack(&pack_id) {
        Some(pack) => respond_json(&**pack),
        None => {
            let error = AppResponse::NotFound(format!("No pack found with id: {pack_id}"));
            response_to_c_string(&error)
        }
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_gear(store: *mut InventoryStore) -> *const c_char {
    match store_mut(store, "get_gear") {
        Ok(s) => respond_json(s.gear()),
        Err(err) => err,
    }
}

/// Item count, total price and weight per unit for one pack.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_pack_summary(store: *mut InventoryStore, pack_id: *const c_char) -> *const c_char {
    let store = match store_mut(store, "get_pack_summary") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let pack_id = match c_ptr_to_string(pack_id, "pack_id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    respond(store.pack_summary(&pack_id))
}

/// Drops the store. The pointer must not be used afterwards.
///
/// # Notes
///
/// The inventory lives only in memory; closing discards it. Hosts that want
/// to keep it read [`get_state`] first.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_inventory(store: *mut InventoryStore) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to close_inventory".to_string());
        return response_to_c_string(&error);
    }

    let store = unsafe { Box::from_raw(store) };
    info!("Inventory store '{}' closed", store.name());
    drop(store);

    response_to_c_string(&AppResponse::success("Inventory closed"))
}

/// Releases a string returned by any other function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

fn respond_json<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    response_to_c_string(&AppResponse::json(value))
}

fn acknowledge(result: StoreResult<()>, message: &str) -> *const c_char {
    match result {
        Ok(()) => response_to_c_string(&AppResponse::success(message)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// `Ok` with the JSON-encoded value, or the store error mapped to its envelope.
fn respond<T: Serialize>(result: StoreResult<T>) -> *const c_char {
    match result {
        Ok(value) => respond_json(&value),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

fn store_mut<'a>(store: *mut InventoryStore, operation: &str) -> Result<&'a mut InventoryStore, *const c_char> {
    match unsafe { store.as_mut() } {
        Some(s) => Ok(s),
        None => {
            warn!("Null store pointer passed to {operation}");
            let error = AppResponse::BadRequest(format!("Null store pointer passed to {operation}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_payload<T: DeserializeOwned>(json_ptr: *const c_char) -> Result<T, *const c_char> {
    let json_str = c_ptr_to_string(json_ptr, "JSON")?;

    serde_json::from_str(&json_str).map_err(|e| {
        warn!("Rejected payload: {e}");
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Converts a C string pointer to a Rust String.
///
/// # Returns
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - `BadRequest` response for a null pointer or invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
