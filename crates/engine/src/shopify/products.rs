//! Product search, duplication, identity updates, deletion, variant reads,
//! and batched price writes.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use outlet_sync_core::{
    IdentityUpdate, InventoryItemId, Price, ProductId, ProductSummary, RemoteVariant, VariantId,
    VariantPriceUpdate,
};

use super::client::ShopifyClient;
use super::transport::{HttpRequest, HttpSend};
use super::{ShopifyError, UserError, ensure_no_user_errors};

impl<S: HttpSend> ShopifyClient<S> {
    /// Search for the source product: exact title match, active only.
    #[instrument(skip(self))]
    pub async fn find_source_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        let escaped = escape_search_term(title);
        self.find_product(&format!("title:\"{escaped}\" status:active"), title).await
    }

    /// Search for an outlet derivative by its derived title, any status.
    #[instrument(skip(self))]
    pub async fn find_outlet_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        let escaped = escape_search_term(title);
        self.find_product(&format!("title:\"{escaped}\""), title).await
    }

    /// Look a product up by its exact handle.
    #[instrument(skip(self))]
    pub async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        const QUERY: &str = r"
            query($q: String!) {
                products(first: 10, query: $q) {
                    nodes { id title handle status tags }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            products: Products,
        }
        #[derive(Deserialize)]
        struct Products {
            nodes: Vec<ProductSummary>,
        }

        let escaped = escape_search_term(handle);
        let data: Data =
            self.graphql(QUERY, json!({ "q": format!("handle:\"{escaped}\"") })).await?;
        Ok(data.products.nodes.into_iter().find(|product| product.handle == handle))
    }

    // The search syntax matches loosely ("Scarpa" also hits "Scarpa -
    // Outlet"), so the exact title is re-checked on the results.
    async fn find_product(
        &self,
        search: &str,
        exact_title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        const QUERY: &str = r"
            query($q: String!) {
                products(first: 10, query: $q) {
                    nodes { id title handle status tags }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            products: Products,
        }
        #[derive(Deserialize)]
        struct Products {
            nodes: Vec<ProductSummary>,
        }

        let data: Data = self.graphql(QUERY, json!({ "q": search })).await?;
        let wanted = exact_title.trim().to_lowercase();
        Ok(data
            .products
            .nodes
            .into_iter()
            .find(|product| product.title.trim().to_lowercase() == wanted))
    }

    /// Fetch one product's summary fields.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_summary(
        &self,
        id: &ProductId,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!) {
                product(id: $id) { id title handle status tags }
            }";

        #[derive(Deserialize)]
        struct Data {
            product: Option<ProductSummary>,
        }

        let data: Data = self.graphql(QUERY, json!({ "id": id })).await?;
        Ok(data.product)
    }

    /// Duplicate a product under a new title. The platform cannot set the
    /// handle or status in the same call; an identity update follows.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn duplicate_product(
        &self,
        source: &ProductId,
        new_title: &str,
    ) -> Result<ProductSummary, ShopifyError> {
        const QUERY: &str = r"
            mutation($productId: ID!, $newTitle: String!) {
                productDuplicate(productId: $productId, newTitle: $newTitle) {
                    newProduct { id title handle status tags }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "productDuplicate")]
            product_duplicate: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "newProduct")]
            new_product: Option<ProductSummary>,
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let data: Data = self
            .graphql(QUERY, json!({ "productId": source, "newTitle": new_title }))
            .await?;
        ensure_no_user_errors(&data.product_duplicate.user_errors)?;
        data.product_duplicate.new_product.ok_or_else(|| {
            ShopifyError::NotFound(format!("duplicate of {source} missing from response"))
        })
    }

    /// Partial product update: title, handle, status, tags.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product_identity(
        &self,
        id: &ProductId,
        update: &IdentityUpdate,
    ) -> Result<ProductSummary, ShopifyError> {
        const QUERY: &str = r"
            mutation($input: ProductInput!) {
                productUpdate(input: $input) {
                    product { id title handle status tags }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "productUpdate")]
            product_update: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            product: Option<ProductSummary>,
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let mut input = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut input {
            map.insert("id".to_owned(), json!(id));
        }

        let data: Data = self.graphql(QUERY, json!({ "input": input })).await?;
        ensure_no_user_errors(&data.product_update.user_errors)?;
        data.product_update
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))
    }

    /// Delete a product outright. Used to purge stale drafts.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ShopifyError> {
        let numeric = numeric_id(id)?;
        self.rest_empty(HttpRequest::delete(self.rest_url(&format!("/products/{numeric}.json"))))
            .await
    }

    /// All variants of a product with options, prices, and inventory items.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_variants(
        &self,
        id: &ProductId,
    ) -> Result<Vec<RemoteVariant>, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!) {
                product(id: $id) {
                    variants(first: 100) {
                        nodes {
                            id
                            title
                            sku
                            barcode
                            price
                            compareAtPrice
                            selectedOptions { value }
                            inventoryItem { id }
                        }
                    }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            product: Option<Product>,
        }
        #[derive(Deserialize)]
        struct Product {
            variants: Variants,
        }
        #[derive(Deserialize)]
        struct Variants {
            nodes: Vec<VariantNode>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct VariantNode {
            id: VariantId,
            title: String,
            sku: Option<String>,
            barcode: Option<String>,
            price: Option<Price>,
            compare_at_price: Option<Price>,
            selected_options: Vec<SelectedOption>,
            inventory_item: Option<InventoryItemRef>,
        }
        #[derive(Deserialize)]
        struct SelectedOption {
            value: String,
        }
        #[derive(Deserialize)]
        struct InventoryItemRef {
            id: InventoryItemId,
        }

        let data: Data = self.graphql(QUERY, json!({ "id": id })).await?;
        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))?;
        Ok(product
            .variants
            .nodes
            .into_iter()
            .map(|node| RemoteVariant {
                id: node.id,
                title: node.title,
                sku: node.sku,
                barcode: node.barcode,
                price: node.price,
                compare_at_price: node.compare_at_price,
                option_values: node.selected_options.into_iter().map(|o| o.value).collect(),
                inventory_item_id: node.inventory_item.map(|item| item.id),
            })
            .collect())
    }

    /// Batched price update across a product's variants.
    #[instrument(skip(self, updates), fields(product_id = %id, variants = updates.len()))]
    pub async fn set_variant_prices(
        &self,
        id: &ProductId,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError> {
        if updates.is_empty() {
            return Ok(());
        }

        const QUERY: &str = r"
            mutation($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
                productVariantsBulkUpdate(productId: $productId, variants: $variants) {
                    productVariants { id }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "productVariantsBulkUpdate")]
            bulk_update: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let data: Data =
            self.graphql(QUERY, json!({ "productId": id, "variants": updates })).await?;
        ensure_no_user_errors(&data.bulk_update.user_errors)
    }
}

/// Numeric tail of a gid, as the REST surface wants it.
pub(crate) fn numeric_id(id: &ProductId) -> Result<u64, ShopifyError> {
    id.numeric().ok_or_else(|| ShopifyError::InvalidId(id.to_string()))
}

fn escape_search_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use crate::testing::{ScriptedSend, http_response, test_config};

    use super::*;

    fn search_body() -> String {
        json!({
            "data": {
                "products": {
                    "nodes": [
                        {
                            "id": "gid://shopify/Product/42",
                            "title": "Scarpa Trail - Outlet",
                            "handle": "scarpa-trail-outlet",
                            "status": "ACTIVE",
                            "tags": ["outlet"],
                        },
                        {
                            "id": "gid://shopify/Product/41",
                            "title": "Scarpa Trail",
                            "handle": "scarpa-trail",
                            "status": "ACTIVE",
                            "tags": ["estate"],
                        },
                    ]
                }
            }
        })
        .to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn title_search_returns_only_the_exact_match() {
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, &search_body()))]),
            &test_config(),
        );

        let found = client.find_source_by_title("Scarpa Trail").await.unwrap().unwrap();

        assert_eq!(found.id.as_str(), "gid://shopify/Product/41");
        assert_eq!(found.title, "Scarpa Trail");
    }

    #[tokio::test(start_paused = true)]
    async fn search_terms_are_escaped() {
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(
                200,
                r#"{"data":{"products":{"nodes":[]}}}"#,
            ))]),
            &test_config(),
        );

        client.find_outlet_by_title(r#"Giacca "Vento""#).await.unwrap();

        let requests = client.transport_requests();
        let variables = &requests[0].body.as_ref().unwrap()["variables"];
        assert_eq!(variables["q"], r#"title:"Giacca \"Vento\"""#);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_surfaces_user_errors() {
        let body = json!({
            "data": {
                "productDuplicate": {
                    "newProduct": null,
                    "userErrors": [{"field": ["productId"], "message": "Product not found"}],
                }
            }
        })
        .to_string();
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, &body))]),
            &test_config(),
        );

        let result = client
            .duplicate_product(&ProductId::from_numeric(9), "Nuovo - Outlet")
            .await;

        assert!(matches!(
            result,
            Err(ShopifyError::UserError(message)) if message.contains("Product not found")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_product_requires_a_numeric_gid() {
        let client = ShopifyClient::with_sender(ScriptedSend::new(vec![]), &test_config());

        let result = client.delete_product(&ProductId::new("gid://shopify/Product/oops")).await;

        assert!(matches!(result, Err(ShopifyError::InvalidId(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn variants_map_options_and_inventory_items() {
        let body = json!({
            "data": {
                "product": {
                    "variants": {
                        "nodes": [{
                            "id": "gid://shopify/ProductVariant/7",
                            "title": "42",
                            "sku": "SKU-7",
                            "barcode": null,
                            "price": "129.90",
                            "compareAtPrice": null,
                            "selectedOptions": [{"value": "42"}],
                            "inventoryItem": {"id": "gid://shopify/InventoryItem/70"},
                        }]
                    }
                }
            }
        })
        .to_string();
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, &body))]),
            &test_config(),
        );

        let variants = client.product_variants(&ProductId::from_numeric(1)).await.unwrap();

        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].option_values, vec!["42"]);
        assert_eq!(variants[0].price.unwrap().to_string(), "129.90");
        assert_eq!(
            variants[0].inventory_item_id.as_ref().unwrap().as_str(),
            "gid://shopify/InventoryItem/70"
        );
    }
}
