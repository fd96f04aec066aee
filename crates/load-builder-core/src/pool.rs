use crate::error::{LoadBuilderError, Result};
use crate::model::InventoryItem;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed nesting table: `(source_point, included_point)` pairs meaning a
/// wish at `source_point` may also consume inventory at `included_point`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NestedOrigins {
    pairs: Vec<(String, String)>,
}

impl NestedOrigins {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// True if a wish at `origin` can see inventory held at `held_at`.
    pub fn sees(&self, origin: &str, held_at: &str) -> bool {
        origin == held_at
            || self
                .pairs
                .iter()
                .any(|(src, inc)| src == origin && inc == held_at)
    }
}

/// The shared inventory pool, mutated by reservation and release.
///
/// Reservation walks records in input order, so runs are deterministic.
/// Records with identical `(origin, material_number, future)` triples are
/// merged by summation at construction.
#[derive(Debug, Clone, Default)]
pub struct InventoryPool {
    items: Vec<InventoryItem>,
    reserved: Vec<u32>,
    ever_reserved: Vec<bool>,
    initial: Vec<u32>,
}

impl InventoryPool {
    pub fn new(records: Vec<InventoryItem>) -> Self {
        let mut items: Vec<InventoryItem> = Vec::with_capacity(records.len());
        for rec in records {
            match items.iter_mut().find(|it| {
                it.origin == rec.origin
                    && it.material_number == rec.material_number
                    && it.is_future() == rec.is_future()
            }) {
                Some(existing) => existing.quantity += rec.quantity,
                None => items.push(rec),
            }
        }
        let n = items.len();
        let initial = items.iter().map(|it| it.quantity).collect();
        Self {
            items,
            reserved: vec![0; n],
            ever_reserved: vec![false; n],
            initial,
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn initial_quantity(&self, idx: usize) -> u32 {
        self.initial[idx]
    }

    pub fn reserved_quantity(&self, idx: usize) -> u32 {
        self.reserved[idx]
    }

    pub fn was_ever_reserved(&self, idx: usize) -> bool {
        self.ever_reserved[idx]
    }

    /// Reserves one unit for a wish at `origin`, walking the pool in order.
    /// Future stock is only eligible inside the lane's `horizon_days`.
    pub fn reserve(
        &mut self,
        origin: &str,
        material_number: &str,
        horizon_days: u32,
        nested: &NestedOrigins,
    ) -> Option<usize> {
        for (idx, item) in self.items.iter_mut().enumerate() {
            if item.quantity == 0 {
                continue;
            }
            if item.material_number != material_number {
                continue;
            }
            if !nested.sees(origin, &item.origin) {
                continue;
            }
            if item.is_future() && (horizon_days == 0 || item.available_in_days > horizon_days) {
                continue;
            }
            item.quantity -= 1;
            self.reserved[idx] += 1;
            self.ever_reserved[idx] = true;
            return Some(idx);
        }
        None
    }

    /// Returns one reserved unit to the pool.
    pub fn release(&mut self, idx: usize) -> Result<()> {
        if self.reserved[idx] == 0 {
            return Err(LoadBuilderError::PoolUnderflow { index: idx });
        }
        self.reserved[idx] -= 1;
        self.items[idx].quantity += 1;
        Ok(())
    }

    /// Marks one reserved unit as placed on a trailer; the unit leaves the
    /// reservation ledger without returning to the pool.
    pub fn consume(&mut self, idx: usize) -> Result<()> {
        if self.reserved[idx] == 0 {
            return Err(LoadBuilderError::PoolUnderflow { index: idx });
        }
        self.reserved[idx] -= 1;
        debug!(index = idx, material = %self.items[idx].material_number, "unit consumed");
        Ok(())
    }
}
