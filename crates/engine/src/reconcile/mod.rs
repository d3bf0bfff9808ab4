//! Per-group reconciliation: the outlet pipeline and the run driver.
//!
//! Each source item group runs LOOKUP_SOURCE through WRITE_BACK. A failure
//! inside one group is caught at the group boundary and recorded; the
//! driver moves on to the next group. Re-running converges: an active
//! outlet short-circuits to a skip, a stale draft is deleted and rebuilt
//! from scratch.

pub mod inventory;
pub mod variant_reset;

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use outlet_sync_core::{
    IdentityUpdate, LocationId, PlannedAction, Price, ProductId, ProductStatus, ReconcileOutcome,
    ReconcileStep, RemoteVariant, RunSummary, SourceItemGroup, VariantDeclaration,
    VariantPriceUpdate, naming,
};

use crate::config::{Config, LocationRef};
use crate::gateway::CatalogGateway;
use crate::shopify::ShopifyError;

use inventory::InventoryReconciler;
use variant_reset::VariantResetEngine;

/// Publications never removed by channel restriction.
const KEEP_PUBLICATIONS: [&str; 3] = ["Online Store", "Negozio online", "Point of Sale"];

/// Numbered handle alternates tried after a collision.
const MAX_HANDLE_ALTERNATES: u32 = 5;

/// Failures that abort a run before any group is processed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Gateway(#[from] ShopifyError),

    #[error("location {0:?} not found on the platform")]
    LocationNotFound(String),
}

/// A pipeline step failure, annotated for the group outcome.
#[derive(Debug)]
pub(crate) struct StepFailure {
    pub(crate) step: ReconcileStep,
    pub(crate) reason: String,
}

pub(crate) trait StepContext<T> {
    /// Tag an error with the pipeline step it occurred in.
    fn at_step(self, step: ReconcileStep) -> Result<T, StepFailure>;
}

impl<T, E: fmt::Display> StepContext<T> for Result<T, E> {
    fn at_step(self, step: ReconcileStep) -> Result<T, StepFailure> {
        self.map_err(|err| StepFailure { step, reason: err.to_string() })
    }
}

/// Whether a variant answers to a declaration's option value.
pub(crate) fn variant_matches(variant: &RemoteVariant, option_value: &str) -> bool {
    let wanted = option_value.trim();
    variant.option_values.iter().any(|value| value.trim().eq_ignore_ascii_case(wanted))
        || variant.title.trim().eq_ignore_ascii_case(wanted)
}

/// Everything the pipeline needs beyond the gateway.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Promotional location stock is moved into.
    pub promo_location: LocationId,
    /// Warehouse location stock is drained from.
    pub warehouse_location: LocationId,
    /// Run channel restriction after each outlet is built.
    pub restrict_channels: bool,
    /// Run the variant reset protocol after each outlet is built.
    pub variant_reset: bool,
    pub metafield_batch_size: usize,
    /// Pause between stocking promo and draining the warehouse.
    pub propagation_delay: Duration,
    /// Reset protocol: skip variants whose title contains this fragment.
    pub variant_reset_skip_filter: String,
    /// Reset protocol: pause after each destructive call.
    pub variant_reset_delay: Duration,
}

impl ReconcileSettings {
    /// Combine configuration with the resolved location ids.
    #[must_use]
    pub fn from_config(config: &Config, promo: LocationId, warehouse: LocationId) -> Self {
        Self {
            promo_location: promo,
            warehouse_location: warehouse,
            restrict_channels: config.features.channel_restriction,
            variant_reset: config.features.variant_reset,
            metafield_batch_size: config.tuning.metafield_batch_size,
            propagation_delay: config.tuning.inventory_propagation_delay,
            variant_reset_skip_filter: config.tuning.variant_reset_skip_filter.clone(),
            variant_reset_delay: config.tuning.variant_reset_delay,
        }
    }
}

/// Drives one source item group to its target outlet state.
pub struct ProductReconciler<'a, G> {
    gateway: &'a G,
    settings: &'a ReconcileSettings,
    apply: bool,
}

impl<'a, G: CatalogGateway> ProductReconciler<'a, G> {
    #[must_use]
    pub const fn new(gateway: &'a G, settings: &'a ReconcileSettings, apply: bool) -> Self {
        Self { gateway, settings, apply }
    }

    /// Execute the pipeline; failures collapse into a `Failed` outcome.
    #[instrument(skip(self, group), fields(sku = %group.sku, title = %group.title))]
    pub async fn reconcile(&self, group: &SourceItemGroup) -> ReconcileOutcome {
        match self.run_pipeline(group).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::error!(step = %failure.step, reason = %failure.reason, "group failed");
                ReconcileOutcome::Failed { step: failure.step, reason: failure.reason }
            }
        }
    }

    async fn run_pipeline(&self, group: &SourceItemGroup) -> Result<ReconcileOutcome, StepFailure> {
        let source = self
            .gateway
            .find_source_by_title(&group.title)
            .await
            .at_step(ReconcileStep::LookupSource)?
            .ok_or_else(|| StepFailure {
                step: ReconcileStep::LookupSource,
                reason: format!("no active source product titled {:?}", group.title),
            })?;

        let target_title = naming::outlet_title(&group.title);
        let existing = self
            .gateway
            .find_outlet_by_title(&target_title)
            .await
            .at_step(ReconcileStep::LookupOutlet)?;

        let replacing_draft = match existing {
            Some(outlet) if outlet.status.is_active() => {
                tracing::info!(outlet = %outlet.id, "active outlet already exists, skipping");
                return Ok(ReconcileOutcome::SkippedExistingActive { outlet: outlet.id });
            }
            Some(outlet) => {
                if !self.apply {
                    tracing::info!(outlet = %outlet.id, status = %outlet.status, "would delete the stale outlet and recreate it");
                    return Ok(ReconcileOutcome::Planned {
                        action: PlannedAction::ReplaceDraftOutlet,
                    });
                }
                self.gateway
                    .delete_product(&outlet.id)
                    .await
                    .at_step(ReconcileStep::DeleteDraft)?;
                tracing::info!(outlet = %outlet.id, "stale outlet deleted");
                true
            }
            None => {
                if !self.apply {
                    tracing::info!(title = %target_title, "would create the outlet");
                    return Ok(ReconcileOutcome::Planned { action: PlannedAction::CreateOutlet });
                }
                false
            }
        };

        let outlet = self
            .gateway
            .duplicate_product(&source.id, &target_title)
            .await
            .at_step(ReconcileStep::Duplicate)?;
        tracing::info!(source = %source.id, outlet = %outlet.id, "source duplicated");

        self.update_identity(&outlet.id, &group.title, &outlet.tags).await?;
        self.replace_images(&source.id, &outlet.id).await?;
        self.copy_metafields(&source.id, &outlet.id).await?;
        self.purge_collections(&outlet.id).await?;

        let variants = self
            .gateway
            .product_variants(&outlet.id)
            .await
            .at_step(ReconcileStep::SetPrices)?;
        self.set_prices(&outlet.id, &variants, group).await?;

        InventoryReconciler::new(self.gateway, self.settings)
            .reallocate(&variants, group)
            .await?;

        if self.settings.restrict_channels {
            self.restrict_channels(&outlet.id).await;
        }

        if self.settings.variant_reset {
            VariantResetEngine::new(self.gateway, self.settings)
                .reset(&outlet.id)
                .await
                .at_step(ReconcileStep::VariantReset)?;
        }

        tracing::info!(outlet = %outlet.id, rows = ?group.row_indices(), "outlet ready, id queued for write-back");
        Ok(if replacing_draft {
            ReconcileOutcome::RecreatedFromDraft { outlet: outlet.id }
        } else {
            ReconcileOutcome::Created { outlet: outlet.id }
        })
    }

    /// Set title, handle, active status, and the outlet tag; on a handle
    /// collision, retry with numbered alternates.
    async fn update_identity(
        &self,
        outlet: &ProductId,
        source_title: &str,
        existing_tags: &[String],
    ) -> Result<(), StepFailure> {
        let title = naming::outlet_title(source_title);
        let base_handle = naming::outlet_handle(source_title);
        let mut tags = existing_tags.to_vec();
        if !tags.iter().any(|tag| tag.eq_ignore_ascii_case(naming::OUTLET_TAG)) {
            tags.push(naming::OUTLET_TAG.to_owned());
        }

        let mut handle = base_handle.clone();
        let mut alternate = 0u32;
        loop {
            let update = IdentityUpdate {
                title: Some(title.clone()),
                handle: Some(handle.clone()),
                status: Some(ProductStatus::Active),
                tags: Some(tags.clone()),
            };
            match self.gateway.update_product_identity(outlet, &update).await {
                Ok(updated) => {
                    tracing::info!(outlet = %outlet, handle = %updated.handle, "identity updated");
                    return Ok(());
                }
                Err(err) if is_handle_collision(&err) && alternate < MAX_HANDLE_ALTERNATES => {
                    alternate += 1;
                    handle = naming::suffixed_handle(&base_handle, alternate);
                    tracing::warn!(outlet = %outlet, retry_handle = %handle, "handle taken, trying a numbered alternate");
                }
                Err(err) => {
                    return Err(StepFailure {
                        step: ReconcileStep::UpdateIdentity,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// Delete every image on the outlet, then recreate from the source's
    /// media in gallery order.
    async fn replace_images(
        &self,
        source: &ProductId,
        outlet: &ProductId,
    ) -> Result<(), StepFailure> {
        let step = ReconcileStep::ReplaceImages;
        let existing = self.gateway.product_images(outlet).await.at_step(step)?;
        for image in &existing {
            self.gateway.delete_image(outlet, image.id).await.at_step(step)?;
        }
        let source_media = self.gateway.product_media(source).await.at_step(step)?;
        for media in &source_media {
            self.gateway.create_product_image(outlet, &media.url).await.at_step(step)?;
        }
        tracing::info!(outlet = %outlet, removed = existing.len(), added = source_media.len(), "images replaced");
        Ok(())
    }

    async fn copy_metafields(
        &self,
        source: &ProductId,
        outlet: &ProductId,
    ) -> Result<(), StepFailure> {
        let step = ReconcileStep::CopyMetafields;
        let fields = self.gateway.product_metafields(source).await.at_step(step)?;
        if fields.is_empty() {
            return Ok(());
        }
        self.gateway
            .set_metafields(outlet, &fields, self.settings.metafield_batch_size)
            .await
            .at_step(step)?;
        tracing::info!(outlet = %outlet, count = fields.len(), "metafields copied");
        Ok(())
    }

    /// Remove the manual collection memberships duplication carried over.
    async fn purge_collections(&self, outlet: &ProductId) -> Result<(), StepFailure> {
        let step = ReconcileStep::PurgeCollections;
        let collects = self.gateway.collects_for_product(outlet).await.at_step(step)?;
        for collect in &collects {
            self.gateway.delete_collect(collect.id).await.at_step(step)?;
        }
        if !collects.is_empty() {
            tracing::info!(outlet = %outlet, removed = collects.len(), "collection memberships purged");
        }
        Ok(())
    }

    /// Price every variant from its matching declaration, falling back to
    /// the group's first declaration.
    async fn set_prices(
        &self,
        outlet: &ProductId,
        variants: &[RemoteVariant],
        group: &SourceItemGroup,
    ) -> Result<(), StepFailure> {
        let updates: Vec<VariantPriceUpdate> = variants
            .iter()
            .map(|variant| {
                let declaration = group
                    .declarations
                    .iter()
                    .find(|d| variant_matches(variant, &d.option_value))
                    .or_else(|| group.declarations.first());
                let (price, compare_at) =
                    declaration.map_or((None, None), VariantDeclaration::effective_prices);
                VariantPriceUpdate {
                    id: variant.id.clone(),
                    price: price.unwrap_or_else(|| Price::new(Decimal::ZERO)),
                    compare_at_price: compare_at,
                }
            })
            .collect();
        self.gateway
            .set_variant_prices(outlet, &updates)
            .await
            .at_step(ReconcileStep::SetPrices)?;
        tracing::info!(outlet = %outlet, variants = updates.len(), "prices set");
        Ok(())
    }

    /// Unpublish the outlet from every channel outside the keep list.
    /// Failures degrade to warnings and never fail the group.
    async fn restrict_channels(&self, outlet: &ProductId) {
        let step = ReconcileStep::RestrictChannels;
        let publications = match self.gateway.publications().await {
            Ok(publications) => publications,
            Err(err) => {
                tracing::warn!(outlet = %outlet, %step, error = %err, "cannot list publications, channel restriction skipped");
                return;
            }
        };

        let keep_matches = |name: &str| {
            let name = name.to_lowercase();
            KEEP_PUBLICATIONS.iter().any(|keep| name.contains(&keep.to_lowercase()))
        };
        if !publications.iter().any(|p| keep_matches(&p.name)) {
            tracing::warn!(outlet = %outlet, %step, "no keep-listed publication found, leaving channels untouched");
            return;
        }

        let mut removed = 0usize;
        let mut total = 0usize;
        for publication in publications.iter().filter(|p| !keep_matches(&p.name)) {
            total += 1;
            match self.gateway.unpublish(outlet, &publication.id).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    tracing::warn!(outlet = %outlet, %step, publication = %publication.name, error = %err, "unpublish failed");
                }
            }
        }
        tracing::info!(outlet = %outlet, %step, removed, total, "channel restriction done");
    }
}

/// Resolve a location reference; a pre-known id bypasses the lookup.
pub async fn resolve_location<G: CatalogGateway>(
    gateway: &G,
    reference: &LocationRef,
) -> Result<LocationId, ReconcileError> {
    match reference {
        LocationRef::Id(id) => Ok(*id),
        LocationRef::Name(name) => {
            let locations = gateway.locations().await?;
            locations
                .iter()
                .find(|location| location.name.eq_ignore_ascii_case(name))
                .map(|location| location.id)
                .ok_or_else(|| ReconcileError::LocationNotFound(name.clone()))
        }
    }
}

/// Resolve the configured locations and reconcile every group.
///
/// Group failures are recorded in the summary and the run continues; only
/// an unresolvable location aborts up front.
pub async fn run_sync<G: CatalogGateway>(
    gateway: &G,
    config: &Config,
    groups: &[SourceItemGroup],
    apply: bool,
) -> Result<RunSummary, ReconcileError> {
    let promo = resolve_location(gateway, &config.locations.promo).await?;
    let warehouse = resolve_location(gateway, &config.locations.warehouse).await?;
    tracing::info!(%promo, %warehouse, groups = groups.len(), apply, "reconciliation starting");

    let settings = ReconcileSettings::from_config(config, promo, warehouse);
    let reconciler = ProductReconciler::new(gateway, &settings, apply);

    let mut summary = RunSummary::default();
    for group in groups {
        let outcome = reconciler.reconcile(group).await;
        tracing::info!(sku = %group.sku, %outcome, "group finished");
        summary.record(group.sku.clone(), outcome);
    }
    tracing::info!(%summary, "reconciliation finished");
    Ok(summary)
}

fn is_handle_collision(err: &ShopifyError) -> bool {
    matches!(err, ShopifyError::UserError(message) if message.to_lowercase().contains("handle"))
}
