//! Product lifecycle status on the remote platform.

use serde::{Deserialize, Serialize};

/// Remote product status.
///
/// The GraphQL surface speaks SCREAMING_SNAKE_CASE; REST payloads use the
/// lowercase form, accepted here as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "draft")]
    Draft,
    #[serde(alias = "archived")]
    Archived,
}

impl ProductStatus {
    /// Whether the product is live on sales channels.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the product is an unpublished draft.
    #[must_use]
    pub const fn is_draft(self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Draft => "DRAFT",
            Self::Archived => "ARCHIVED",
        };
        write!(f, "{s}")
    }
}
