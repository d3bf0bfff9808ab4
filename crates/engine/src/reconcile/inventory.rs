//! Two-location stock reallocation.
//!
//! Steps run strictly in order: connect and fill the promotional location
//! first, pause for the platform's inventory projection to catch up, then
//! drain and disconnect the warehouse. Reversing this risks a window where
//! the product shows zero total stock or double-counts it.

use std::time::Duration;

use tokio::time;
use tracing::instrument;

use outlet_sync_core::{InventoryItemId, ReconcileStep, RemoteVariant, SourceItemGroup};

use crate::gateway::CatalogGateway;

use super::{ReconcileSettings, StepContext, StepFailure, variant_matches};

/// Checks of the warehouse "not stocked" assertion before giving up.
const VERIFY_ATTEMPTS: u32 = 3;

/// Pause between verification checks.
const VERIFY_PAUSE: Duration = Duration::from_secs(1);

/// Moves one product's stock from the warehouse to the promotional
/// location.
pub struct InventoryReconciler<'a, G> {
    gateway: &'a G,
    settings: &'a ReconcileSettings,
}

impl<'a, G: CatalogGateway> InventoryReconciler<'a, G> {
    #[must_use]
    pub(crate) const fn new(gateway: &'a G, settings: &'a ReconcileSettings) -> Self {
        Self { gateway, settings }
    }

    /// Run the full reallocation protocol for one product's variants.
    #[instrument(skip_all, fields(sku = %group.sku, variants = variants.len()))]
    pub(crate) async fn reallocate(
        &self,
        variants: &[RemoteVariant],
        group: &SourceItemGroup,
    ) -> Result<(), StepFailure> {
        let items = tracked_items(variants);
        self.allocate_promo(&items, variants, group).await?;

        // let the platform's inventory projection settle before draining
        time::sleep(self.settings.propagation_delay).await;

        self.deallocate_warehouse(&items).await
    }

    /// Connect every inventory item to the promotional location, zero it,
    /// then set the declared target quantities.
    async fn allocate_promo(
        &self,
        items: &[InventoryItemId],
        variants: &[RemoteVariant],
        group: &SourceItemGroup,
    ) -> Result<(), StepFailure> {
        let step = ReconcileStep::AllocatePromoInventory;
        let promo = self.settings.promo_location;

        for item in items {
            self.gateway.force_inventory_tracking(item).await.at_step(step)?;
            let levels = self.gateway.inventory_levels_for_item(item).await.at_step(step)?;
            if !levels.iter().any(|level| level.location_id == promo) {
                self.gateway.connect_inventory(item, promo).await.at_step(step)?;
            }
        }

        for item in items {
            self.gateway.set_inventory(item, promo, 0).await.at_step(step)?;
        }

        for declaration in &group.declarations {
            let Some(variant) =
                variants.iter().find(|v| variant_matches(v, &declaration.option_value))
            else {
                tracing::warn!(
                    sku = %group.sku,
                    option = %declaration.option_value,
                    "no variant for declared size, quantity not placed"
                );
                continue;
            };
            let Some(item) = &variant.inventory_item_id else {
                continue;
            };
            self.gateway
                .set_inventory(item, promo, declaration.quantity)
                .await
                .at_step(step)?;
        }

        tracing::info!(location = %promo, total = group.total_quantity(), "promo stock placed");
        Ok(())
    }

    /// Zero the warehouse, delete its level records, and verify the
    /// location reports no stock for any of the items.
    async fn deallocate_warehouse(&self, items: &[InventoryItemId]) -> Result<(), StepFailure> {
        let step = ReconcileStep::DeallocateWarehouseInventory;
        let warehouse = self.settings.warehouse_location;

        for item in items {
            self.gateway.set_inventory(item, warehouse, 0).await.at_step(step)?;
        }
        for item in items {
            self.gateway.delete_inventory_level(item, warehouse).await.at_step(step)?;
            self.verify_not_stocked(item).await?;
        }

        tracing::info!(location = %warehouse, "warehouse drained and disconnected");
        Ok(())
    }

    // A lingering level record means the disconnect has not landed yet;
    // re-delete and re-check a few times before failing the group.
    async fn verify_not_stocked(&self, item: &InventoryItemId) -> Result<(), StepFailure> {
        let step = ReconcileStep::DeallocateWarehouseInventory;
        let warehouse = self.settings.warehouse_location;

        for attempt in 1..=VERIFY_ATTEMPTS {
            let levels = self.gateway.inventory_levels_for_item(item).await.at_step(step)?;
            if !levels.iter().any(|level| level.location_id == warehouse) {
                return Ok(());
            }
            if attempt == VERIFY_ATTEMPTS {
                break;
            }
            tracing::warn!(
                item = %item,
                location = %warehouse,
                attempt,
                "warehouse still reports a level record, retrying the disconnect"
            );
            time::sleep(VERIFY_PAUSE).await;
            self.gateway.delete_inventory_level(item, warehouse).await.at_step(step)?;
        }

        Err(StepFailure {
            step,
            reason: format!(
                "warehouse location {warehouse} still stocked for item {item} after {VERIFY_ATTEMPTS} checks"
            ),
        })
    }
}

/// Inventory items behind a product's variants; variants without one are
/// skipped with a warning.
fn tracked_items(variants: &[RemoteVariant]) -> Vec<InventoryItemId> {
    variants
        .iter()
        .filter_map(|variant| {
            if variant.inventory_item_id.is_none() {
                tracing::warn!(variant = %variant.id, "variant has no inventory item, skipped");
            }
            variant.inventory_item_id.clone()
        })
        .collect()
}
