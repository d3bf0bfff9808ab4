//! Forced price repair for already-built outlet products.
//!
//! The sync pipeline only prices products it creates; this mode revisits
//! outlets recorded in the catalog write-back and overwrites every variant
//! price from the declarations, whatever the platform currently holds.
//! Groups without a usable recorded id are skipped, never guessed at.

use rust_decimal::Decimal;
use tracing::instrument;

use outlet_sync_core::{
    Price, ProductId, ProductStatus, SourceItemGroup, VariantDeclaration, VariantPriceUpdate,
};

use crate::gateway::CatalogGateway;
use crate::reconcile::variant_matches;

/// Why a group was fixed, skipped, or lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Prices overwritten on this many variants.
    Fixed { variants: usize },
    /// Preview mode; this many variants would be overwritten.
    WouldFix { variants: usize },
    /// The catalog row carries no recorded outlet id.
    SkippedNoProductId,
    /// The recorded id no longer resolves to a product.
    SkippedNotFound,
    /// The outlet exists but is not active.
    SkippedDraft,
    /// A platform call failed; the run continues with the next group.
    Failed { reason: String },
}

/// One group's result, keyed by SKU.
#[derive(Debug, Clone)]
pub struct FixResult {
    pub sku: String,
    pub outcome: FixOutcome,
}

/// Per-category statistics for a whole fix run.
#[derive(Debug, Default)]
pub struct PriceFixSummary {
    pub results: Vec<FixResult>,
    pub fixed: usize,
    pub would_fix: usize,
    pub skipped_no_product_id: usize,
    pub skipped_not_found: usize,
    pub skipped_draft: usize,
    pub failed: usize,
}

impl PriceFixSummary {
    fn record(&mut self, sku: &str, outcome: FixOutcome) {
        match outcome {
            FixOutcome::Fixed { .. } => self.fixed += 1,
            FixOutcome::WouldFix { .. } => self.would_fix += 1,
            FixOutcome::SkippedNoProductId => self.skipped_no_product_id += 1,
            FixOutcome::SkippedNotFound => self.skipped_not_found += 1,
            FixOutcome::SkippedDraft => self.skipped_draft += 1,
            FixOutcome::Failed { .. } => self.failed += 1,
        }
        self.results.push(FixResult { sku: sku.to_owned(), outcome });
    }

    #[must_use]
    pub const fn had_errors(&self) -> bool {
        self.failed > 0
    }
}

/// Recorded ids arrive either as full gids or as bare numeric strings,
/// depending on which tool wrote them back.
fn recorded_product_id(group: &SourceItemGroup) -> Option<ProductId> {
    let raw = group.recorded_product_id.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    ProductId::parse(raw).or_else(|| raw.parse::<u64>().ok().map(ProductId::from_numeric))
}

/// Overwrite prices on every recorded outlet in the catalog.
#[instrument(skip_all, fields(groups = groups.len(), apply))]
pub async fn run_price_fix<G: CatalogGateway>(
    gateway: &G,
    groups: &[SourceItemGroup],
    apply: bool,
) -> PriceFixSummary {
    let mut summary = PriceFixSummary::default();
    for group in groups {
        let outcome = fix_group(gateway, group, apply).await;
        tracing::info!(sku = %group.sku, outcome = ?outcome, "group finished");
        summary.record(&group.sku, outcome);
    }
    tracing::info!(
        fixed = summary.fixed,
        would_fix = summary.would_fix,
        skipped_no_product_id = summary.skipped_no_product_id,
        skipped_not_found = summary.skipped_not_found,
        skipped_draft = summary.skipped_draft,
        failed = summary.failed,
        "price fix run finished"
    );
    summary
}

async fn fix_group<G: CatalogGateway>(
    gateway: &G,
    group: &SourceItemGroup,
    apply: bool,
) -> FixOutcome {
    let Some(id) = recorded_product_id(group) else {
        return FixOutcome::SkippedNoProductId;
    };

    let summary = match gateway.product_summary(&id).await {
        Ok(Some(summary)) => summary,
        Ok(None) => return FixOutcome::SkippedNotFound,
        Err(err) => return FixOutcome::Failed { reason: err.to_string() },
    };
    if summary.status != ProductStatus::Active {
        return FixOutcome::SkippedDraft;
    }

    let variants = match gateway.product_variants(&id).await {
        Ok(variants) => variants,
        Err(err) => return FixOutcome::Failed { reason: err.to_string() },
    };
    let updates = price_updates(&variants, group);
    if !apply {
        return FixOutcome::WouldFix { variants: updates.len() };
    }
    match gateway.set_variant_prices(&id, &updates).await {
        Ok(()) => FixOutcome::Fixed { variants: updates.len() },
        Err(err) => FixOutcome::Failed { reason: err.to_string() },
    }
}

/// Same declaration mapping the sync pipeline uses: each variant takes its
/// matching declaration's effective prices, falling back to the group's
/// first declaration.
fn price_updates(
    variants: &[outlet_sync_core::RemoteVariant],
    group: &SourceItemGroup,
) -> Vec<VariantPriceUpdate> {
    variants
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
        .collect()
}
