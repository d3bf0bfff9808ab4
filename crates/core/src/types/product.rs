//! Remote product, variant, media, and publication models.
//!
//! These mirror what the platform returns. The engine observes and mutates
//! them through the gateway but never caches them across runs; the platform
//! stays authoritative.

use serde::{Deserialize, Serialize};

use super::id::{CollectId, ImageId, InventoryItemId, MediaId, ProductId, PublicationId, VariantId};
use super::price::Price;
use super::status::ProductStatus;

/// Product fields returned by catalog searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Global product id.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// URL handle, unique per shop.
    pub handle: String,
    /// Lifecycle status.
    pub status: ProductStatus,
    /// Current tag set.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A variant as observed on a remote product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVariant {
    /// Global variant id.
    pub id: VariantId,
    /// Variant title, usually the joined option values.
    pub title: String,
    /// Merchant SKU, when set.
    pub sku: Option<String>,
    /// Barcode, when set.
    pub barcode: Option<String>,
    /// Current selling price.
    pub price: Option<Price>,
    /// Struck-through compare-at price.
    pub compare_at_price: Option<Price>,
    /// Option values in option-position order (the platform caps at 3).
    pub option_values: Vec<String>,
    /// Backing inventory item, when inventory is managed.
    pub inventory_item_id: Option<InventoryItemId>,
}

/// Ids of a variant freshly created on the REST surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVariant {
    pub id: VariantId,
    pub inventory_item_id: Option<InventoryItemId>,
}

/// An image on the GraphQL media surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaImage {
    pub id: MediaId,
    pub url: String,
    pub alt: String,
}

/// An image on the REST surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub src: String,
}

/// A product metafield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// A sales channel publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: PublicationId,
    pub name: String,
}

/// A manual collection membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collect {
    pub id: CollectId,
    pub collection_id: u64,
}

/// A collection member with first-variant pricing, as read by the reorder
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Option<Price>,
    pub compare_at_price: Option<Price>,
}

/// Partial product update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// One entry of a batched variant price update.
///
/// A `None` compare-at price clears the strike-through on the platform, so
/// it serializes as an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPriceUpdate {
    pub id: VariantId,
    pub price: Price,
    pub compare_at_price: Option<Price>,
}

/// REST payload for recreating a variant from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct VariantRecreateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// `"shopify"` when the original variant tracked inventory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_management: Option<String>,
    pub inventory_policy: String,
    pub requires_shipping: bool,
    pub taxable: bool,
    pub weight: f64,
    pub weight_unit: String,
}
