//! Locations and inventory levels on the REST surface, plus inventory item
//! tracking on the GraphQL surface.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use outlet_sync_core::{InventoryItemId, InventoryLevel, Location, LocationId};

use super::client::ShopifyClient;
use super::transport::{HttpRequest, HttpSend};
use super::{ShopifyError, UserError, ensure_no_user_errors};

fn numeric_item(item: &InventoryItemId) -> Result<u64, ShopifyError> {
    item.numeric().ok_or_else(|| ShopifyError::InvalidId(item.to_string()))
}

impl<S: HttpSend> ShopifyClient<S> {
    /// The shop's locations, cached per client when enabled.
    #[instrument(skip(self))]
    pub async fn locations(&self) -> Result<Vec<Location>, ShopifyError> {
        if let Some(cached) = self.cached_locations() {
            return Ok(cached);
        }

        #[derive(Deserialize)]
        struct Data {
            locations: Vec<Location>,
        }

        let data: Data =
            self.rest(HttpRequest::get(self.rest_url("/locations.json"))).await?;
        self.store_locations(&data.locations);
        Ok(data.locations)
    }

    /// Levels of one inventory item across all connected locations.
    #[instrument(skip(self), fields(item = %item))]
    pub async fn inventory_levels_for_item(
        &self,
        item: &InventoryItemId,
    ) -> Result<Vec<InventoryLevel>, ShopifyError> {
        let numeric = numeric_item(item)?;

        #[derive(Deserialize)]
        struct Data {
            inventory_levels: Vec<InventoryLevel>,
        }

        let request = HttpRequest::get(self.rest_url("/inventory_levels.json"))
            .query("inventory_item_ids", numeric.to_string())
            .query("limit", "250");
        let data: Data = self.rest(request).await?;
        Ok(data.inventory_levels)
    }

    /// Connect an item to a location without activating any stock.
    #[instrument(skip(self), fields(item = %item, location = %location))]
    pub async fn connect_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        let numeric = numeric_item(item)?;
        let body = json!({
            "location_id": location.as_u64(),
            "inventory_item_id": numeric,
        });
        self.rest_empty(HttpRequest::post(
            self.rest_url("/inventory_levels/connect.json"),
            body,
        ))
        .await
    }

    /// Set the absolute available quantity at a location.
    #[instrument(skip(self), fields(item = %item, location = %location, quantity))]
    pub async fn set_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
        quantity: i64,
    ) -> Result<(), ShopifyError> {
        let numeric = numeric_item(item)?;
        let body = json!({
            "location_id": location.as_u64(),
            "inventory_item_id": numeric,
            "available": quantity,
        });
        self.rest_empty(HttpRequest::post(self.rest_url("/inventory_levels/set.json"), body))
            .await
    }

    /// Disconnect an item from a location by deleting its level record.
    ///
    /// A platform rejection (e.g. the last connected location cannot be
    /// removed) is logged and tolerated; transport exhaustion still fails.
    #[instrument(skip(self), fields(item = %item, location = %location))]
    pub async fn delete_inventory_level(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        let numeric = numeric_item(item)?;
        let request = HttpRequest::delete(self.rest_url("/inventory_levels.json"))
            .query("inventory_item_id", numeric.to_string())
            .query("location_id", location.to_string());
        match self.rest_empty(request).await {
            Ok(()) => Ok(()),
            Err(ShopifyError::Status { status, body }) => {
                tracing::warn!(item = %item, location = %location, status, body, "level delete rejected");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Turn inventory tracking on for an item.
    #[instrument(skip(self), fields(item = %item))]
    pub async fn force_inventory_tracking(
        &self,
        item: &InventoryItemId,
    ) -> Result<(), ShopifyError> {
        const QUERY: &str = r"
            mutation($id: ID!, $input: InventoryItemInput!) {
                inventoryItemUpdate(id: $id, input: $input) {
                    inventoryItem { id tracked }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "inventoryItemUpdate")]
            update: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let data: Data = self
            .graphql(QUERY, json!({ "id": item, "input": { "tracked": true } }))
            .await?;
        ensure_no_user_errors(&data.update.user_errors)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use crate::testing::{ScriptedSend, http_response, test_config};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn locations_are_cached_after_the_first_read() {
        let body = r#"{"locations":[{"id":11,"name":"Promo"},{"id":22,"name":"Magazzino"}]}"#;
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, body))]),
            &test_config(),
        );

        let first = client.locations().await.unwrap();
        let second = client.locations().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "Promo");
        // only one request was scripted; the second read hit the cache
        assert_eq!(client.transport_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn level_delete_tolerates_platform_rejections() {
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(422, r#"{"errors":"cannot remove"}"#))]),
            &test_config(),
        );

        client
            .delete_inventory_level(&InventoryItemId::from_numeric(70), LocationId::new(22))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn set_inventory_posts_the_absolute_quantity() {
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, r"{}"))]),
            &test_config(),
        );

        client
            .set_inventory(&InventoryItemId::from_numeric(70), LocationId::new(11), 3)
            .await
            .unwrap();

        let requests = client.transport_requests();
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["inventory_item_id"], 70);
        assert_eq!(body["location_id"], 11);
        assert_eq!(body["available"], 3);
        assert!(requests[0].url.ends_with("/inventory_levels/set.json"));
    }
}
