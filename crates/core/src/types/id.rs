//! Newtype identifiers for remote catalog entities.
//!
//! The platform addresses the same resource two ways: the GraphQL surface
//! uses global id strings (`gid://shopify/Product/123`) while the REST
//! surface wants the bare numeric tail. The GID wrappers keep both views
//! together so a variant id can never be handed to a product endpoint.

/// Macro to define a type-safe GID wrapper.
///
/// Creates a newtype around the `gid://shopify/...` string form with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Constructors: `new()` (unchecked), `from_numeric()`, `parse()`
/// - Accessors: `as_str()`, `numeric()`
///
/// # Example
///
/// ```rust
/// # use outlet_sync_core::define_gid;
/// define_gid!(WidgetId, "gid://shopify/Widget/");
///
/// let id = WidgetId::from_numeric(42);
/// assert_eq!(id.as_str(), "gid://shopify/Widget/42");
/// assert_eq!(id.numeric(), Some(42));
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// GID prefix shared by every identifier of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap a gid string without validating the prefix.
            #[must_use]
            pub fn new(gid: impl Into<String>) -> Self {
                Self(gid.into())
            }

            /// Build the gid from the bare numeric id.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("{}{id}", Self::PREFIX))
            }

            /// Accept only strings carrying this type's prefix.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                value
                    .starts_with(Self::PREFIX)
                    .then(|| Self(value.to_owned()))
            }

            /// The full gid string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing path segment as a number, for the REST surface.
            #[must_use]
            pub fn numeric(&self) -> Option<u64> {
                self.0.rsplit('/').next()?.parse().ok()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Macro to define a numeric REST resource id.
///
/// Same role as [`define_gid!`] for resources the platform only ever
/// addresses in bare numeric form (locations, images, collects).
#[macro_export]
macro_rules! define_resource_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new id from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Entity ids on the GraphQL surface
define_gid!(ProductId, "gid://shopify/Product/");
define_gid!(VariantId, "gid://shopify/ProductVariant/");
define_gid!(InventoryItemId, "gid://shopify/InventoryItem/");
define_gid!(MediaId, "gid://shopify/MediaImage/");
define_gid!(CollectionId, "gid://shopify/Collection/");
define_gid!(PublicationId, "gid://shopify/Publication/");
define_gid!(JobId, "gid://shopify/Job/");

// Resource ids on the REST surface
define_resource_id!(LocationId);
define_resource_id!(ImageId);
define_resource_id!(CollectId);
