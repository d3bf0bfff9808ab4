//! Locations and inventory levels on the REST surface.

use serde::{Deserialize, Serialize};

use super::id::LocationId;

/// A stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

/// One (inventory item, location) stock record.
///
/// `available` is null when the location is connected but the platform has
/// no count for it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub location_id: LocationId,
    pub available: Option<i64>,
}

impl InventoryLevel {
    /// Quantity with missing counts read as zero.
    #[must_use]
    pub fn quantity(&self) -> i64 {
        self.available.unwrap_or(0)
    }
}
