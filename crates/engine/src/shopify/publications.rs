//! Sales channel publications.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use outlet_sync_core::{ProductId, Publication, PublicationId};

use super::client::ShopifyClient;
use super::transport::HttpSend;
use super::{ShopifyError, UserError, ensure_no_user_errors};

impl<S: HttpSend> ShopifyClient<S> {
    /// Every publication (sales channel) of the shop.
    #[instrument(skip(self))]
    pub async fn publications(&self) -> Result<Vec<Publication>, ShopifyError> {
        const QUERY: &str = r"
            query {
                publications(first: 50) {
                    nodes { id name }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            publications: Publications,
        }
        #[derive(Deserialize)]
        struct Publications {
            nodes: Vec<Publication>,
        }

        let data: Data = self.graphql(QUERY, json!({})).await?;
        Ok(data.publications.nodes)
    }

    /// Remove a product from one publication.
    #[instrument(skip(self), fields(product_id = %id, publication = %publication))]
    pub async fn unpublish(
        &self,
        id: &ProductId,
        publication: &PublicationId,
    ) -> Result<(), ShopifyError> {
        const QUERY: &str = r"
            mutation($id: ID!, $input: [PublicationInput!]!) {
                publishableUnpublish(id: $id, input: $input) {
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "publishableUnpublish")]
            unpublish: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let data: Data = self
            .graphql(
                QUERY,
                json!({ "id": id, "input": [{ "publicationId": publication }] }),
            )
            .await?;
        ensure_no_user_errors(&data.unpublish.user_errors)
    }
}
