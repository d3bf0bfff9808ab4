//! Manual collection memberships and collection reordering.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use outlet_sync_core::{
    Collect, CollectId, CollectionId, CollectionProduct, JobHandle, Price, ProductId,
};

use super::client::ShopifyClient;
use super::products::numeric_id;
use super::transport::{HttpRequest, HttpSend};
use super::{ShopifyError, UserError, ensure_no_user_errors};

/// Page size used when walking a collection.
const COLLECTION_PAGE: u32 = 50;

/// One page of collection members.
#[derive(Debug, Clone)]
pub struct CollectionPage {
    pub products: Vec<CollectionProduct>,
    pub next_cursor: Option<String>,
}

/// One move of a reorder batch; positions are zero-based ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMove {
    pub id: ProductId,
    pub new_position: usize,
}

impl<S: HttpSend> ShopifyClient<S> {
    /// Manual collection memberships of a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn collects_for_product(&self, id: &ProductId) -> Result<Vec<Collect>, ShopifyError> {
        let numeric = numeric_id(id)?;

        #[derive(Deserialize)]
        struct Data {
            collects: Vec<Collect>,
        }

        let request = HttpRequest::get(self.rest_url("/collects.json"))
            .query("product_id", numeric.to_string())
            .query("limit", "250");
        let data: Data = self.rest(request).await?;
        Ok(data.collects)
    }

    /// Remove one manual collection membership.
    #[instrument(skip(self), fields(collect_id = %collect))]
    pub async fn delete_collect(&self, collect: CollectId) -> Result<(), ShopifyError> {
        self.rest_empty(HttpRequest::delete(self.rest_url(&format!("/collects/{collect}.json"))))
            .await
    }

    /// One page of a collection's products with first-variant pricing.
    #[instrument(skip(self), fields(collection_id = %collection))]
    pub async fn collection_products_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&str>,
    ) -> Result<CollectionPage, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!, $first: Int!, $after: String) {
                collection(id: $id) {
                    products(first: $first, after: $after) {
                        pageInfo { hasNextPage endCursor }
                        nodes {
                            id
                            title
                            variants(first: 1) {
                                nodes { price compareAtPrice }
                            }
                        }
                    }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            collection: Option<Collection>,
        }
        #[derive(Deserialize)]
        struct Collection {
            products: Products,
        }
        #[derive(Deserialize)]
        struct Products {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Vec<ProductNode>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PageInfo {
            has_next_page: bool,
            end_cursor: Option<String>,
        }
        #[derive(Deserialize)]
        struct ProductNode {
            id: ProductId,
            title: String,
            variants: Variants,
        }
        #[derive(Deserialize)]
        struct Variants {
            nodes: Vec<VariantNode>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct VariantNode {
            price: Option<Price>,
            compare_at_price: Option<Price>,
        }

        let data: Data = self
            .graphql(
                QUERY,
                json!({ "id": collection, "first": COLLECTION_PAGE, "after": cursor }),
            )
            .await?;
        let collection_data = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("collection {collection} not found")))?;

        let products = collection_data
            .products
            .nodes
            .into_iter()
            .map(|node| {
                let first_variant = node.variants.nodes.into_iter().next();
                let (price, compare_at_price) = first_variant
                    .map_or((None, None), |v| (v.price, v.compare_at_price));
                CollectionProduct { id: node.id, title: node.title, price, compare_at_price }
            })
            .collect();

        let page_info = collection_data.products.page_info;
        let next_cursor = page_info.has_next_page.then_some(page_info.end_cursor).flatten();
        Ok(CollectionPage { products, next_cursor })
    }

    /// Submit one reorder batch; the platform runs it as an async job.
    #[instrument(skip(self, moves), fields(collection_id = %collection, moves = moves.len()))]
    pub async fn reorder_collection_batch(
        &self,
        collection: &CollectionId,
        moves: &[ProductMove],
    ) -> Result<Option<JobHandle>, ShopifyError> {
        const QUERY: &str = r"
            mutation($id: ID!, $moves: [MoveInput!]!) {
                collectionReorderProducts(id: $id, moves: $moves) {
                    job { id done }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "collectionReorderProducts")]
            reorder: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            job: Option<JobHandle>,
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        // newPosition is typed as a string by the platform
        let moves_payload: Vec<Value> = moves
            .iter()
            .map(|m| json!({ "id": m.id, "newPosition": m.new_position.to_string() }))
            .collect();
        let data: Data = self
            .graphql(QUERY, json!({ "id": collection, "moves": moves_payload }))
            .await?;
        ensure_no_user_errors(&data.reorder.user_errors)?;
        Ok(data.reorder.job)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use crate::testing::{ScriptedSend, http_response, test_config};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn collection_page_carries_the_cursor_only_when_more_pages_exist() {
        let body = json!({
            "data": {
                "collection": {
                    "products": {
                        "pageInfo": {"hasNextPage": false, "endCursor": "abc"},
                        "nodes": [{
                            "id": "gid://shopify/Product/5",
                            "title": "Scarpa",
                            "variants": {"nodes": [{"price": "64.95", "compareAtPrice": "129.90"}]},
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

        let page = client
            .collection_products_page(&CollectionId::from_numeric(9), None)
            .await
            .unwrap();

        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].price.unwrap().to_string(), "64.95");
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_collection_is_a_not_found_error() {
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, r#"{"data":{"collection":null}}"#))]),
            &test_config(),
        );

        let result = client.collection_products_page(&CollectionId::from_numeric(9), None).await;

        assert!(matches!(result, Err(ShopifyError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn reorder_moves_serialize_positions_as_strings() {
        let body = json!({
            "data": {
                "collectionReorderProducts": {
                    "job": {"id": "gid://shopify/Job/1", "done": false},
                    "userErrors": [],
                }
            }
        })
        .to_string();
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, &body))]),
            &test_config(),
        );
        let moves = vec![
            ProductMove { id: ProductId::from_numeric(5), new_position: 0 },
            ProductMove { id: ProductId::from_numeric(6), new_position: 1 },
        ];

        let job = client
            .reorder_collection_batch(&CollectionId::from_numeric(9), &moves)
            .await
            .unwrap()
            .unwrap();

        assert!(!job.done);
        let requests = client.transport_requests();
        let sent = &requests[0].body.as_ref().unwrap()["variables"]["moves"];
        assert_eq!(sent[0]["newPosition"], "0");
        assert_eq!(sent[1]["newPosition"], "1");
    }
}
