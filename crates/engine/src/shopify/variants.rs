//! Individual variant creation and deletion on the REST surface.
//!
//! The reset protocol needs per-variant deletes and creates, which the
//! GraphQL bulk mutations do not offer in the same shape.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use outlet_sync_core::{
    CreatedVariant, InventoryItemId, ProductId, VariantId, VariantRecreateInput,
};

use super::client::ShopifyClient;
use super::products::numeric_id;
use super::transport::{HttpRequest, HttpSend};
use super::ShopifyError;

impl<S: HttpSend> ShopifyClient<S> {
    /// Delete one variant.
    #[instrument(skip(self), fields(product_id = %product, variant_id = %variant))]
    pub async fn delete_variant(
        &self,
        product: &ProductId,
        variant: &VariantId,
    ) -> Result<(), ShopifyError> {
        let product_numeric = numeric_id(product)?;
        let variant_numeric = variant
            .numeric()
            .ok_or_else(|| ShopifyError::InvalidId(variant.to_string()))?;
        self.rest_empty(HttpRequest::delete(self.rest_url(&format!(
            "/products/{product_numeric}/variants/{variant_numeric}.json"
        ))))
        .await
    }

    /// Create one variant from a snapshot payload.
    #[instrument(skip(self, input), fields(product_id = %product))]
    pub async fn create_variant(
        &self,
        product: &ProductId,
        input: &VariantRecreateInput,
    ) -> Result<CreatedVariant, ShopifyError> {
        let numeric = numeric_id(product)?;

        #[derive(Deserialize)]
        struct Data {
            variant: RestVariant,
        }
        #[derive(Deserialize)]
        struct RestVariant {
            id: u64,
            inventory_item_id: Option<u64>,
        }

        let data: Data = self
            .rest(HttpRequest::post(
                self.rest_url(&format!("/products/{numeric}/variants.json")),
                json!({ "variant": input }),
            ))
            .await?;
        Ok(CreatedVariant {
            id: VariantId::from_numeric(data.variant.id),
            inventory_item_id: data.variant.inventory_item_id.map(InventoryItemId::from_numeric),
        })
    }
}
