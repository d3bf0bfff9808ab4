//! Capability-oriented surface over the platform's two calling conventions.
//!
//! Reconcilers, the poller, and both run modes are generic over
//! [`CatalogGateway`], so the whole pipeline runs against an in-memory fake
//! in tests. [`ShopifyClient`] is the production implementation; callers
//! never see whether GraphQL or REST backs an operation.

use outlet_sync_core::{
    Collect, CollectId, CollectionId, CreatedVariant, IdentityUpdate, ImageId, InventoryItemId,
    InventoryLevel, JobHandle, JobId, Location, LocationId, MediaId, MediaImage, Metafield,
    ProductId, ProductImage, ProductSummary, Publication, PublicationId, RemoteVariant, VariantId,
    VariantPriceUpdate, VariantRecreateInput,
};

use crate::shopify::collections::{CollectionPage, ProductMove};
use crate::shopify::transport::HttpSend;
use crate::shopify::{ShopifyClient, ShopifyError};

#[allow(async_fn_in_trait)] // engine futures never leave the driver task
pub trait CatalogGateway {
    async fn find_source_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError>;
    async fn find_outlet_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError>;
    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError>;
    async fn product_summary(
        &self,
        id: &ProductId,
    ) -> Result<Option<ProductSummary>, ShopifyError>;
    async fn duplicate_product(
        &self,
        source: &ProductId,
        new_title: &str,
    ) -> Result<ProductSummary, ShopifyError>;
    async fn update_product_identity(
        &self,
        id: &ProductId,
        update: &IdentityUpdate,
    ) -> Result<ProductSummary, ShopifyError>;
    async fn delete_product(&self, id: &ProductId) -> Result<(), ShopifyError>;
    async fn product_variants(&self, id: &ProductId) -> Result<Vec<RemoteVariant>, ShopifyError>;
    async fn set_variant_prices(
        &self,
        id: &ProductId,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError>;

    async fn product_media(&self, id: &ProductId) -> Result<Vec<MediaImage>, ShopifyError>;
    async fn product_images(&self, id: &ProductId) -> Result<Vec<ProductImage>, ShopifyError>;
    async fn delete_image(&self, id: &ProductId, image: ImageId) -> Result<(), ShopifyError>;
    async fn create_product_image(
        &self,
        id: &ProductId,
        source_url: &str,
    ) -> Result<MediaId, ShopifyError>;

    async fn product_metafields(&self, id: &ProductId) -> Result<Vec<Metafield>, ShopifyError>;
    async fn set_metafields(
        &self,
        owner: &ProductId,
        fields: &[Metafield],
        batch_size: usize,
    ) -> Result<(), ShopifyError>;

    async fn locations(&self) -> Result<Vec<Location>, ShopifyError>;
    async fn inventory_levels_for_item(
        &self,
        item: &InventoryItemId,
    ) -> Result<Vec<InventoryLevel>, ShopifyError>;
    async fn connect_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError>;
    async fn set_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
        quantity: i64,
    ) -> Result<(), ShopifyError>;
    async fn delete_inventory_level(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError>;
    async fn force_inventory_tracking(&self, item: &InventoryItemId) -> Result<(), ShopifyError>;

    async fn publications(&self) -> Result<Vec<Publication>, ShopifyError>;
    async fn unpublish(
        &self,
        id: &ProductId,
        publication: &PublicationId,
    ) -> Result<(), ShopifyError>;

    async fn collects_for_product(&self, id: &ProductId) -> Result<Vec<Collect>, ShopifyError>;
    async fn delete_collect(&self, collect: CollectId) -> Result<(), ShopifyError>;
    async fn collection_products_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&str>,
    ) -> Result<CollectionPage, ShopifyError>;
    async fn reorder_collection_batch(
        &self,
        collection: &CollectionId,
        moves: &[ProductMove],
    ) -> Result<Option<JobHandle>, ShopifyError>;
    async fn job_status(&self, id: &JobId) -> Result<Option<JobHandle>, ShopifyError>;

    async fn delete_variant(
        &self,
        product: &ProductId,
        variant: &VariantId,
    ) -> Result<(), ShopifyError>;
    async fn create_variant(
        &self,
        product: &ProductId,
        input: &VariantRecreateInput,
    ) -> Result<CreatedVariant, ShopifyError>;
}

// Inherent methods win resolution, so each body calls the typed operation
// of the same name.
impl<S: HttpSend> CatalogGateway for ShopifyClient<S> {
    async fn find_source_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        self.find_source_by_title(title).await
    }

    async fn find_outlet_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        self.find_outlet_by_title(title).await
    }

    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        self.find_product_by_handle(handle).await
    }

    async fn product_summary(
        &self,
        id: &ProductId,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        self.product_summary(id).await
    }

    async fn duplicate_product(
        &self,
        source: &ProductId,
        new_title: &str,
    ) -> Result<ProductSummary, ShopifyError> {
        self.duplicate_product(source, new_title).await
    }

    async fn update_product_identity(
        &self,
        id: &ProductId,
        update: &IdentityUpdate,
    ) -> Result<ProductSummary, ShopifyError> {
        self.update_product_identity(id, update).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ShopifyError> {
        self.delete_product(id).await
    }

    async fn product_variants(&self, id: &ProductId) -> Result<Vec<RemoteVariant>, ShopifyError> {
        self.product_variants(id).await
    }

    async fn set_variant_prices(
        &self,
        id: &ProductId,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError> {
        self.set_variant_prices(id, updates).await
    }

    async fn product_media(&self, id: &ProductId) -> Result<Vec<MediaImage>, ShopifyError> {
        self.product_media(id).await
    }

    async fn product_images(&self, id: &ProductId) -> Result<Vec<ProductImage>, ShopifyError> {
        self.product_images(id).await
    }

    async fn delete_image(&self, id: &ProductId, image: ImageId) -> Result<(), ShopifyError> {
        self.delete_image(id, image).await
    }

    async fn create_product_image(
        &self,
        id: &ProductId,
        source_url: &str,
    ) -> Result<MediaId, ShopifyError> {
        self.create_product_image(id, source_url).await
    }

    async fn product_metafields(&self, id: &ProductId) -> Result<Vec<Metafield>, ShopifyError> {
        self.product_metafields(id).await
    }

    async fn set_metafields(
        &self,
        owner: &ProductId,
        fields: &[Metafield],
        batch_size: usize,
    ) -> Result<(), ShopifyError> {
        self.set_metafields(owner, fields, batch_size).await
    }

    async fn locations(&self) -> Result<Vec<Location>, ShopifyError> {
        self.locations().await
    }

    async fn inventory_levels_for_item(
        &self,
        item: &InventoryItemId,
    ) -> Result<Vec<InventoryLevel>, ShopifyError> {
        self.inventory_levels_for_item(item).await
    }

    async fn connect_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        self.connect_inventory(item, location).await
    }

    async fn set_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
        quantity: i64,
    ) -> Result<(), ShopifyError> {
        self.set_inventory(item, location, quantity).await
    }

    async fn delete_inventory_level(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        self.delete_inventory_level(item, location).await
    }

    async fn force_inventory_tracking(&self, item: &InventoryItemId) -> Result<(), ShopifyError> {
        self.force_inventory_tracking(item).await
    }

    async fn publications(&self) -> Result<Vec<Publication>, ShopifyError> {
        self.publications().await
    }

    async fn unpublish(
        &self,
        id: &ProductId,
        publication: &PublicationId,
    ) -> Result<(), ShopifyError> {
        self.unpublish(id, publication).await
    }

    async fn collects_for_product(&self, id: &ProductId) -> Result<Vec<Collect>, ShopifyError> {
        self.collects_for_product(id).await
    }

    async fn delete_collect(&self, collect: CollectId) -> Result<(), ShopifyError> {
        self.delete_collect(collect).await
    }

    async fn collection_products_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&str>,
    ) -> Result<CollectionPage, ShopifyError> {
        self.collection_products_page(collection, cursor).await
    }

    async fn reorder_collection_batch(
        &self,
        collection: &CollectionId,
        moves: &[ProductMove],
    ) -> Result<Option<JobHandle>, ShopifyError> {
        self.reorder_collection_batch(collection, moves).await
    }

    async fn job_status(&self, id: &JobId) -> Result<Option<JobHandle>, ShopifyError> {
        self.job_status(id).await
    }

    async fn delete_variant(
        &self,
        product: &ProductId,
        variant: &VariantId,
    ) -> Result<(), ShopifyError> {
        self.delete_variant(product, variant).await
    }

    async fn create_variant(
        &self,
        product: &ProductId,
        input: &VariantRecreateInput,
    ) -> Result<CreatedVariant, ShopifyError> {
        self.create_variant(product, input).await
    }
}
