//! Declared source items from the spreadsheet catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::price::Price;

/// One declared variant row (size, target quantity, prices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDeclaration {
    /// Option value for the single size option.
    pub option_value: String,
    /// Declared stock for the promotional location.
    pub quantity: i64,
    /// Original (compare-at) price.
    pub full_price: Option<Price>,
    /// Discounted selling price.
    pub discounted_price: Option<Price>,
    /// 1-based spreadsheet row, kept for identifier write-back.
    pub row: u32,
}

impl VariantDeclaration {
    /// Selling price and compare-at price with the fallback rules applied:
    /// a missing discounted price falls back to the full price, and a
    /// missing or zero full price falls back to the discounted one.
    #[must_use]
    pub fn effective_prices(&self) -> (Option<Price>, Option<Price>) {
        let price = self.discounted_price.or(self.full_price);
        let compare_at = self
            .full_price
            .filter(|p| !p.amount().is_zero())
            .or(self.discounted_price);
        (price, compare_at)
    }
}

/// All declared rows for one SKU, reconciled as a unit.
///
/// Invariant, upheld by the loader: every declaration shares the SKU, was
/// flagged for selection, and has quantity > 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItemGroup {
    /// Stable source identifier.
    pub sku: String,
    /// Source product title used for the remote lookups.
    pub title: String,
    /// Previously written-back outlet identifier, when the sheet has one.
    pub recorded_product_id: Option<String>,
    /// Size declarations in sheet order.
    pub declarations: Vec<VariantDeclaration>,
}

impl SourceItemGroup {
    /// Spreadsheet rows backing this group, for write-back.
    #[must_use]
    pub fn row_indices(&self) -> Vec<u32> {
        self.declarations.iter().map(|d| d.row).collect()
    }

    /// Total declared target quantity across sizes.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.declarations.iter().map(|d| d.quantity).sum()
    }
}

/// Selection flag semantics for the `online` column.
///
/// The sheet mixes booleans, numbers, and a grab bag of affirmative strings.
#[must_use]
pub fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| (1.0..2.0).contains(&f)),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "si" | "sì" | "x" | "ok"
        ),
        _ => false,
    }
}
