//! GraphQL and REST client over the throttled transport.

use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use outlet_sync_core::Location;

use super::transport::{
    Channel, HttpRequest, HttpResponse, HttpSend, REQUEST_TIMEOUT, ReqwestSend, ThrottledTransport,
};
use super::{GraphQLError, ShopifyError};
use crate::config::Config;

/// Typed Admin API client.
///
/// Generic over the sending backend so tests can script responses; the
/// default instantiation sends over reqwest.
#[derive(Debug)]
pub struct ShopifyClient<S = ReqwestSend> {
    transport: ThrottledTransport<S>,
    rest_base: String,
    graphql_url: String,
    location_cache_enabled: bool,
    location_cache: Mutex<Option<Vec<Location>>>,
}

impl ShopifyClient<ReqwestSend> {
    /// Build the production client from configuration.
    pub fn new(config: &Config) -> Result<Self, ShopifyError> {
        let sender = ReqwestSend::new(config.shopify.admin_token.clone(), REQUEST_TIMEOUT)?;
        Ok(Self::with_sender(sender, config))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

impl<S: HttpSend> ShopifyClient<S> {
    /// Build a client over a custom sending backend.
    pub fn with_sender(sender: S, config: &Config) -> Self {
        let store = config.shopify.store.trim_end_matches('/');
        let rest_base = format!("https://{store}/admin/api/{}", config.shopify.api_version);
        let graphql_url = format!("{rest_base}/graphql.json");
        Self {
            transport: ThrottledTransport::new(
                sender,
                config.shopify.min_interval,
                config.shopify.max_retries,
            ),
            rest_base,
            graphql_url,
            location_cache_enabled: config.features.location_cache,
            location_cache: Mutex::new(None),
        }
    }

    /// Execute a GraphQL query or mutation and deserialize its `data`.
    pub(crate) async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ShopifyError> {
        let request = HttpRequest::post(
            self.graphql_url.clone(),
            json!({ "query": query, "variables": variables }),
        );
        let response = self.transport.send(&request, Channel::Graphql).await?;
        if !response.status.is_success() {
            return Err(status_error(&response));
        }

        let envelope: GraphQLResponse<T> = serde_json::from_str(&response.body)?;
        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(errors));
        }
        envelope.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError { message: "no data in response".to_owned() }])
        })
    }

    /// Issue a REST request and deserialize the JSON body.
    pub(crate) async fn rest<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, ShopifyError> {
        let response = self.transport.send(&request, Channel::Rest).await?;
        if !response.status.is_success() {
            return Err(status_error(&response));
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Issue a REST request and discard the body.
    pub(crate) async fn rest_empty(&self, request: HttpRequest) -> Result<(), ShopifyError> {
        let response = self.transport.send(&request, Channel::Rest).await?;
        if !response.status.is_success() {
            return Err(status_error(&response));
        }
        Ok(())
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}{path}", self.rest_base)
    }

    pub(crate) fn cached_locations(&self) -> Option<Vec<Location>> {
        if !self.location_cache_enabled {
            return None;
        }
        self.location_cache.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn store_locations(&self, locations: &[Location]) {
        if self.location_cache_enabled {
            *self.location_cache.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(locations.to_vec());
        }
    }
}

#[cfg(test)]
impl ShopifyClient<crate::testing::ScriptedSend> {
    pub(crate) fn transport_requests(&self) -> Vec<HttpRequest> {
        self.transport.sender().requests()
    }
}

fn status_error(response: &HttpResponse) -> ShopifyError {
    // keep failure bodies readable in logs
    let body: String = response.body.chars().take(300).collect();
    ShopifyError::Status { status: response.status.as_u16(), body }
}
