//! Metafield reads and batched writes.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use outlet_sync_core::{Metafield, ProductId};

use super::client::ShopifyClient;
use super::transport::HttpSend;
use super::{ShopifyError, UserError, ensure_no_user_errors};

impl<S: HttpSend> ShopifyClient<S> {
    /// Every metafield on a product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_metafields(
        &self,
        id: &ProductId,
    ) -> Result<Vec<Metafield>, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!) {
                product(id: $id) {
                    metafields(first: 250) {
                        nodes { namespace key type value }
                    }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            product: Option<Product>,
        }
        #[derive(Deserialize)]
        struct Product {
            metafields: Metafields,
        }
        #[derive(Deserialize)]
        struct Metafields {
            nodes: Vec<Metafield>,
        }

        let data: Data = self.graphql(QUERY, json!({ "id": id })).await?;
        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))?;
        Ok(product.metafields.nodes)
    }

    /// Upsert metafields onto a product, `batch_size` per mutation.
    #[instrument(skip(self, fields), fields(product_id = %owner, count = fields.len()))]
    pub async fn set_metafields(
        &self,
        owner: &ProductId,
        fields: &[Metafield],
        batch_size: usize,
    ) -> Result<(), ShopifyError> {
        const QUERY: &str = r"
            mutation($metafields: [MetafieldsSetInput!]!) {
                metafieldsSet(metafields: $metafields) {
                    metafields { id }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "metafieldsSet")]
            set: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        for chunk in fields.chunks(batch_size.max(1)) {
            let payload: Vec<Value> = chunk
                .iter()
                .map(|field| {
                    json!({
                        "ownerId": owner,
                        "namespace": field.namespace,
                        "key": field.key,
                        "type": field.kind,
                        "value": field.value,
                    })
                })
                .collect();
            let data: Data = self.graphql(QUERY, json!({ "metafields": payload })).await?;
            ensure_no_user_errors(&data.set.user_errors)?;
        }
        Ok(())
    }
}
