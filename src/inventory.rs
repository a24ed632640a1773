// 🧾 Inventory Lists - Named count sheets
//
// A list maps a storage key to one counted line:
// - Fixed-price items use the bare canonical code as key, so repeated
//   scans MERGE (quantities add)
// - Scale labels get a synthesized key {code}-{cents:04}-{token}, so every
//   sticker stays its own line with its own price
//
// The token is a per-list monotonic counter persisted with the list.

use crate::barcode::{CanonicalCode, ResolvedItem};
use crate::price::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("list name is empty")]
    EmptyName,

    #[error("quantity change must not be zero")]
    ZeroDelta,

    #[error("no line {0:?} in this list")]
    LineNotFound(String),

    #[error("quantity change {delta} on {key:?} leaves the line outside ±1000000000")]
    QuantityOutOfRange { key: String, delta: i64 },
}

/// Largest quantity a line may hold, either way.
pub const MAX_QTY: i64 = 1_000_000_000;

fn checked_qty(key: &str, current: i64, delta: i64) -> Result<i64, InventoryError> {
    current
        .checked_add(delta)
        .filter(|qty| qty.unsigned_abs() <= MAX_QTY.unsigned_abs())
        .ok_or_else(|| InventoryError::QuantityOutOfRange {
            key: key.to_string(),
            delta,
        })
}

// ============================================================================
// LINE ITEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: CanonicalCode,
    pub brand: String,
    pub description: String,
    pub price: Price,
    pub qty: i64,

    /// Counted from a scale label (price is the sticker price)
    #[serde(default)]
    pub scale: bool,
}

impl LineItem {
    /// qty × price, in cents
    pub fn total_cents(&self) -> i64 {
        self.price.times(self.qty)
    }
}

/// Brand/description/price typed by the user for items the catalogue
/// does not know. `None` keeps whatever the line already has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualDetails {
    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub price: Option<Price>,
}

impl ManualDetails {
    pub fn new(brand: Option<String>, description: Option<String>, price: Option<Price>) -> Self {
        ManualDetails {
            brand,
            description,
            price,
        }
    }
}

/// Result of changing one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub key: String,

    /// Line as it stands after the change (qty 0 when removed)
    pub item: LineItem,

    pub removed: bool,
}

/// Storage key for one scale-label line.
pub fn scale_storage_key(code: &CanonicalCode, price: Price, token: u64) -> String {
    format!("{}-{:04}-{}", code, price.cents(), token)
}

// ============================================================================
// INVENTORY LIST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryList {
    pub name: String,
    pub created: DateTime<Utc>,

    /// Next token handed out for a scale line key
    #[serde(default = "first_token")]
    pub next_token: u64,

    pub items: BTreeMap<String, LineItem>,
}

fn first_token() -> u64 {
    1
}

impl InventoryList {
    pub fn new(name: &str) -> Result<Self, InventoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InventoryError::EmptyName);
        }

        Ok(InventoryList {
            name: name.to_string(),
            created: Utc::now(),
            next_token: first_token(),
            items: BTreeMap::new(),
        })
    }

    /// Count `delta` units of a resolved scan into this list.
    ///
    /// Catalogue data always wins over manual details. A scale label's
    /// embedded price always wins over both.
    pub fn apply_scan(
        &mut self,
        resolved: &ResolvedItem,
        manual: &ManualDetails,
        delta: i64,
    ) -> Result<ScanOutcome, InventoryError> {
        if delta == 0 {
            return Err(InventoryError::ZeroDelta);
        }
        checked_qty(resolved.code.as_str(), 0, delta)?;

        let key = match resolved.override_price {
            Some(price) => {
                let token = self.next_token;
                self.next_token += 1;
                scale_storage_key(&resolved.code, price, token)
            }
            None => resolved.code.to_string(),
        };

        let qty = checked_qty(&key, self.items.get(&key).map_or(0, |i| i.qty), delta)?;
        let mut item = self.items.remove(&key).unwrap_or_else(|| LineItem {
            code: resolved.code.clone(),
            brand: String::new(),
            description: String::new(),
            price: Price::ZERO,
            qty: 0,
            scale: resolved.is_scale(),
        });

        match &resolved.entry {
            Some(entry) => {
                item.brand = entry.brand.clone();
                item.description = entry.description.clone();
                item.price = entry.price;
            }
            None => {
                if let Some(brand) = &manual.brand {
                    item.brand = brand.clone();
                }
                if let Some(description) = &manual.description {
                    item.description = description.clone();
                }
                if let Some(price) = manual.price {
                    item.price = price;
                }
            }
        }
        if let Some(price) = resolved.override_price {
            item.price = price;
        }

        item.qty = qty;
        Ok(self.store(key, item))
    }

    /// Change the quantity of an existing line by its storage key.
    pub fn adjust_line(&mut self, key: &str, delta: i64) -> Result<ScanOutcome, InventoryError> {
        if delta == 0 {
            return Err(InventoryError::ZeroDelta);
        }
        let item = self
            .items
            .get_mut(key)
            .ok_or_else(|| InventoryError::LineNotFound(key.to_string()))?;

        item.qty = checked_qty(key, item.qty, delta)?;
        let item = item.clone();
        Ok(self.store(key.to_string(), item))
    }

    fn store(&mut self, key: String, item: LineItem) -> ScanOutcome {
        let removed = item.qty == 0;
        if removed {
            self.items.remove(&key);
        } else {
            self.items.insert(key.clone(), item.clone());
        }
        ScanOutcome { key, item, removed }
    }

    /// Details previously typed for a fixed-price code on this list.
    pub fn previous_details(&self, code: &CanonicalCode) -> Option<&LineItem> {
        self.items.get(code.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&LineItem> {
        self.items.get(key)
    }

    /// Lines in key order.
    pub fn lines(&self) -> impl Iterator<Item = (&String, &LineItem)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_qty(&self) -> i64 {
        self.items.values().fold(0, |acc, i| acc.saturating_add(i.qty))
    }

    pub fn grand_total_cents(&self) -> i64 {
        self.items
            .values()
            .fold(0, |acc, i| acc.saturating_add(i.total_cents()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
