//! Shopify Admin API integration.
//!
//! # Architecture
//!
//! - [`transport`]: one paced, retrying HTTP transport shared by both
//!   calling conventions.
//! - [`client`]: the GraphQL + REST client built on the transport.
//! - Operation modules ([`products`], [`media`], [`metafields`],
//!   [`inventory`], [`collections`], [`publications`], [`variants`],
//!   [`jobs`]) grouping the typed Admin API calls by concern.
//!
//! Every operation returns [`ShopifyError`], one taxonomy for transport
//! exhaustion, terminal HTTP statuses, GraphQL envelope errors, and
//! platform-reported user errors.
//!
//! # Security
//!
//! The admin token lives in a [`secrecy::SecretString`] and is only exposed
//! when the request headers are built.

pub mod client;
pub mod collections;
pub mod inventory;
pub mod jobs;
pub mod media;
pub mod metafields;
pub mod products;
pub mod publications;
pub mod transport;
pub mod variants;

use serde::Deserialize;
use thiserror::Error;

pub use client::ShopifyClient;
pub use transport::{HttpSend, ReqwestSend, ThrottledTransport, TransportError};

/// Errors surfaced by Admin API operations.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Transport gave up after its retry budget.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Underlying HTTP client could not be built or driven.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Terminal HTTP status, typically a non-429 4xx.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Errors reported in the GraphQL response envelope.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// `userErrors` returned inside an otherwise successful mutation.
    #[error("user errors: {0}")]
    UserError(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A gid without the numeric tail the REST surface needs.
    #[error("invalid id for a REST call: {0}")]
    InvalidId(String),

    /// Response body did not match the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single error from a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One entry of a mutation payload's `userErrors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Collapse a `userErrors` list into an error, or pass when it is empty.
pub(crate) fn ensure_no_user_errors(errors: &[UserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let joined = errors
        .iter()
        .map(|error| match &error.field {
            Some(field) if !field.is_empty() => {
                format!("{}: {}", field.join("."), error.message)
            }
            _ => error.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(ShopifyError::UserError(joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_errors_join_their_messages() {
        let error = ShopifyError::GraphQL(vec![
            GraphQLError { message: "Throttled".to_owned() },
            GraphQLError { message: "Field deprecated".to_owned() },
        ]);
        assert_eq!(error.to_string(), "GraphQL errors: Throttled; Field deprecated");
    }

    #[test]
    fn user_errors_carry_their_field_path() {
        let result = ensure_no_user_errors(&[
            UserError {
                field: Some(vec!["input".to_owned(), "handle".to_owned()]),
                message: "Handle is already taken".to_owned(),
            },
            UserError { field: None, message: "Something else".to_owned() },
        ]);
        let error = result.unwrap_err();
        assert_eq!(
            error.to_string(),
            "user errors: input.handle: Handle is already taken; Something else"
        );
    }

    #[test]
    fn empty_user_errors_pass() {
        assert!(ensure_no_user_errors(&[]).is_ok());
    }

    #[test]
    fn status_error_displays_status_and_body() {
        let error = ShopifyError::Status { status: 422, body: "Unprocessable".to_owned() };
        assert_eq!(error.to_string(), "HTTP 422: Unprocessable");
    }
}
