//! Discount-ordered collection sorting.
//!
//! Walks a collection page by page, ranks every product by its first
//! variant's discount percentage, and submits batched reorder moves. The
//! platform runs each batch as a background job; the poller watches them
//! with a bounded wait and a timeout is only a warning.

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time;
use tracing::instrument;

use outlet_sync_core::{CollectionId, CollectionProduct};

use crate::gateway::CatalogGateway;
use crate::poller::AsyncJobPoller;
use crate::shopify::ShopifyError;
use crate::shopify::collections::ProductMove;

/// Moves submitted per reorder mutation.
const REORDER_BATCH: usize = 250;

/// Pause between consecutive reorder batches.
const BATCH_PAUSE: Duration = Duration::from_secs(1);

/// A collection member with its computed discount rank.
#[derive(Debug, Clone)]
pub struct RankedProduct {
    pub product: CollectionProduct,
    pub discount_percent: Decimal,
}

/// What a reorder run did (or, in preview, would do).
#[derive(Debug)]
pub struct ReorderReport {
    /// Products in their computed target order.
    pub ranked: Vec<RankedProduct>,
    /// Reorder batches submitted; zero in preview mode.
    pub batches: usize,
    /// Background jobs still pending when the wait budget ran out.
    pub timed_out_jobs: usize,
    pub applied: bool,
}

/// Discount percentage from the first variant's prices, rounded to two
/// decimals; products without a meaningful compare-at price rank at zero.
#[must_use]
pub fn discount_percent(product: &CollectionProduct) -> Decimal {
    match (product.price, product.compare_at_price) {
        (Some(price), Some(compare_at))
            if !compare_at.amount().is_zero() && price.amount() < compare_at.amount() =>
        {
            ((compare_at.amount() - price.amount()) / compare_at.amount()
                * Decimal::ONE_HUNDRED)
                .round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

/// Rank a collection's products by (discount desc, lowercase title asc).
fn rank(products: Vec<CollectionProduct>) -> Vec<RankedProduct> {
    let mut ranked: Vec<RankedProduct> = products
        .into_iter()
        .map(|product| RankedProduct { discount_percent: discount_percent(&product), product })
        .collect();
    ranked.sort_by(|a, b| {
        b.discount_percent
            .cmp(&a.discount_percent)
            .then_with(|| a.product.title.to_lowercase().cmp(&b.product.title.to_lowercase()))
    });
    ranked
}

/// Sort one collection by discount. Preview mode computes and reports the
/// order without submitting any moves.
#[instrument(skip(gateway), fields(collection_id = %collection, apply))]
pub async fn run_reorder<G: CatalogGateway>(
    gateway: &G,
    collection: &CollectionId,
    apply: bool,
) -> Result<ReorderReport, ShopifyError> {
    let mut products = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = gateway.collection_products_page(collection, cursor.as_deref()).await?;
        products.extend(page.products);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    tracing::info!(products = products.len(), "collection fetched");

    let ranked = rank(products);
    if !apply {
        for (position, entry) in ranked.iter().enumerate() {
            tracing::info!(
                position,
                title = %entry.product.title,
                discount = %entry.discount_percent,
                "would place"
            );
        }
        return Ok(ReorderReport { ranked, batches: 0, timed_out_jobs: 0, applied: false });
    }

    let moves: Vec<ProductMove> = ranked
        .iter()
        .enumerate()
        .map(|(position, entry)| ProductMove {
            id: entry.product.id.clone(),
            new_position: position,
        })
        .collect();

    let mut handles = Vec::new();
    let mut batches = 0usize;
    for (index, chunk) in moves.chunks(REORDER_BATCH).enumerate() {
        if index > 0 {
            time::sleep(BATCH_PAUSE).await;
        }
        if let Some(handle) = gateway.reorder_collection_batch(collection, chunk).await? {
            handles.push(handle);
        }
        batches += 1;
    }
    tracing::info!(batches, jobs = handles.len(), "reorder batches submitted");

    let wait = AsyncJobPoller::default().wait(gateway, handles).await;
    if !wait.timed_out.is_empty() {
        tracing::warn!(
            pending = wait.timed_out.len(),
            "reorder jobs still running after the wait budget, proceeding"
        );
    }

    Ok(ReorderReport {
        ranked,
        batches,
        timed_out_jobs: wait.timed_out.len(),
        applied: true,
    })
}
