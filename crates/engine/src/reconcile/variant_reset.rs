//! Destructive variant recreate protocol.
//!
//! Some platform states leave a product's variants in an order or
//! consistency no update can fix; the only repair is delete plus recreate.
//! The protocol snapshots every variant and its inventory levels in memory,
//! tears the variants down, and rebuilds them from the snapshot. A crash
//! mid-sequence can leave the product variant-deficient: the snapshot lives
//! only for the duration of the call, and recovery is a full re-run of the
//! reconciliation.

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::time;
use tracing::instrument;

use outlet_sync_core::{
    InventoryItemId, InventoryLevel, LocationId, Price, ProductId, RemoteVariant,
    VariantRecreateInput,
};

use crate::gateway::CatalogGateway;
use crate::shopify::ShopifyError;

use super::ReconcileSettings;

/// Failures that leave the reset protocol unable to proceed or unable to
/// prove the product came out intact.
#[derive(Debug, Error)]
pub enum VariantResetError {
    #[error(transparent)]
    Gateway(#[from] ShopifyError),

    #[error("product {0} has no variants eligible for a reset")]
    NoVariants(ProductId),

    #[error("product {product} ended the reset with {actual} variants, expected {expected}")]
    StructurallyDeficient { product: ProductId, expected: usize, actual: usize },
}

/// One variant's full field set plus its inventory level pairs.
#[derive(Debug, Clone)]
struct VariantSnapshot {
    variant: RemoteVariant,
    levels: Vec<InventoryLevel>,
}

/// Rebuilds a product's variants from an in-memory snapshot.
pub struct VariantResetEngine<'a, G> {
    gateway: &'a G,
    settings: &'a ReconcileSettings,
}

impl<'a, G: CatalogGateway> VariantResetEngine<'a, G> {
    #[must_use]
    pub(crate) const fn new(gateway: &'a G, settings: &'a ReconcileSettings) -> Self {
        Self { gateway, settings }
    }

    /// Run the reset. Individual mutation failures are logged and the
    /// protocol continues; the final variant count decides the outcome.
    #[instrument(skip(self), fields(product_id = %product))]
    pub async fn reset(&self, product: &ProductId) -> Result<(), VariantResetError> {
        let all = self.gateway.product_variants(product).await?;
        let skip_filter = self.settings.variant_reset_skip_filter.to_lowercase();
        let skipped = all
            .iter()
            .filter(|v| is_skipped(v, &skip_filter))
            .count();
        let eligible: Vec<&RemoteVariant> =
            all.iter().filter(|v| !is_skipped(v, &skip_filter)).collect();

        if eligible.is_empty() {
            return Err(VariantResetError::NoVariants(product.clone()));
        }
        if eligible.len() == 1 {
            tracing::info!(product_id = %product, "single variant, nothing to reset");
            return Ok(());
        }

        let mut snapshots = Vec::with_capacity(eligible.len());
        for variant in eligible {
            let levels = match &variant.inventory_item_id {
                Some(item) => self.gateway.inventory_levels_for_item(item).await?,
                None => Vec::new(),
            };
            snapshots.push(VariantSnapshot { variant: variant.clone(), levels });
        }
        tracing::info!(
            product_id = %product,
            variants = snapshots.len(),
            skipped,
            "snapshot taken, rebuilding variants"
        );

        // The platform refuses to delete a product's last variant, so the
        // first one stays up while the rest are rebuilt, then follows.
        if let Some((first, rest)) = snapshots.split_first() {
            for snapshot in rest {
                self.delete_variant(product, snapshot).await;
            }
            for snapshot in rest {
                self.recreate_variant(product, snapshot).await;
            }
            self.delete_variant(product, first).await;
            self.recreate_variant(product, first).await;
        }

        let rebuilt = self.gateway.product_variants(product).await?;
        let expected = snapshots.len() + skipped;
        if rebuilt.len() < expected {
            return Err(VariantResetError::StructurallyDeficient {
                product: product.clone(),
                expected,
                actual: rebuilt.len(),
            });
        }
        tracing::info!(product_id = %product, variants = rebuilt.len(), "variant reset complete");
        Ok(())
    }

    async fn delete_variant(&self, product: &ProductId, snapshot: &VariantSnapshot) {
        if let Err(err) = self.gateway.delete_variant(product, &snapshot.variant.id).await {
            tracing::warn!(
                variant = %snapshot.variant.id,
                error = %err,
                "variant delete failed, continuing"
            );
        }
        time::sleep(self.settings.variant_reset_delay).await;
    }

    async fn recreate_variant(&self, product: &ProductId, snapshot: &VariantSnapshot) {
        let input = recreate_input(&snapshot.variant);
        let created = match self.gateway.create_variant(product, &input).await {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(
                    title = %snapshot.variant.title,
                    error = %err,
                    "variant recreate failed, continuing"
                );
                return;
            }
        };
        time::sleep(self.settings.variant_reset_delay).await;

        if let Some(item) = &created.inventory_item_id {
            self.restore_levels(item, &snapshot.levels).await;
        }
    }

    /// Put the snapshotted levels back on the fresh inventory item and
    /// strip any level the platform injected at a location the original
    /// never had.
    async fn restore_levels(&self, item: &InventoryItemId, levels: &[InventoryLevel]) {
        for level in levels {
            if let Err(err) = self.gateway.connect_inventory(item, level.location_id).await {
                tracing::warn!(item = %item, location = %level.location_id, error = %err, "level connect failed");
                continue;
            }
            if let Err(err) =
                self.gateway.set_inventory(item, level.location_id, level.quantity()).await
            {
                tracing::warn!(item = %item, location = %level.location_id, error = %err, "level restore failed");
            }
        }

        let snapshotted: Vec<LocationId> = levels.iter().map(|l| l.location_id).collect();
        let current = match self.gateway.inventory_levels_for_item(item).await {
            Ok(current) => current,
            Err(err) => {
                tracing::warn!(item = %item, error = %err, "cannot read back levels for cleanup");
                return;
            }
        };
        for level in current.iter().filter(|l| !snapshotted.contains(&l.location_id)) {
            if let Err(err) =
                self.gateway.delete_inventory_level(item, level.location_id).await
            {
                tracing::warn!(item = %item, location = %level.location_id, error = %err, "default level cleanup failed");
            }
        }
    }
}

fn is_skipped(variant: &RemoteVariant, skip_filter: &str) -> bool {
    !skip_filter.is_empty() && variant.title.to_lowercase().contains(skip_filter)
}

fn recreate_input(variant: &RemoteVariant) -> VariantRecreateInput {
    let mut options = variant.option_values.iter().cloned();
    VariantRecreateInput {
        option1: options.next(),
        option2: options.next(),
        option3: options.next(),
        price: variant
            .price
            .or(variant.compare_at_price)
            .unwrap_or_else(|| Price::new(Decimal::ZERO)),
        compare_at_price: variant.compare_at_price,
        sku: variant.sku.clone(),
        barcode: variant.barcode.clone(),
        inventory_management: variant
            .inventory_item_id
            .is_some()
            .then(|| "shopify".to_owned()),
        inventory_policy: "deny".to_owned(),
        requires_shipping: true,
        taxable: true,
        weight: 0.0,
        weight_unit: "kg".to_owned(),
    }
}
