//! Core types for outlet-sync.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the reconciliation engine and the CLI.

pub mod id;
pub mod inventory;
pub mod job;
pub mod outcome;
pub mod price;
pub mod product;
pub mod source;
pub mod status;

pub use id::*;
pub use inventory::{InventoryLevel, Location};
pub use job::JobHandle;
pub use outcome::{GroupResult, PlannedAction, ReconcileOutcome, ReconcileStep, RunSummary};
pub use price::Price;
pub use product::{
    Collect, CollectionProduct, CreatedVariant, IdentityUpdate, MediaImage, Metafield,
    ProductImage, ProductSummary, Publication, RemoteVariant, VariantPriceUpdate,
    VariantRecreateInput,
};
pub use source::{SourceItemGroup, VariantDeclaration, is_truthy_flag};
pub use status::ProductStatus;
