//! Reconciliation engine for outlet-sync.
//!
//! Layers, bottom up:
//!
//! - [`shopify`]: the paced, retrying transport and the typed Admin API
//!   client over both calling conventions.
//! - [`gateway`]: the capability-oriented [`gateway::CatalogGateway`] trait
//!   every higher layer is generic over.
//! - [`poller`]: bounded polling of asynchronous job handles.
//! - [`reconcile`]: the per-group pipeline plus the inventory and variant
//!   reset protocols.
//! - [`reorder`]: discount-ordered collection sorting.
//! - [`price_fix`]: the price-only correction mode.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod gateway;
pub mod poller;
pub mod price_fix;
pub mod reconcile;
pub mod reorder;
pub mod shopify;

#[cfg(test)]
pub(crate) mod testing;
