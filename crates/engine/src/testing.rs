//! Test doubles: a scripted HTTP sender for transport/client tests and an
//! in-memory catalog implementing [`CatalogGateway`] for reconciler tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::SecretString;

use outlet_sync_core::{
    Collect, CollectId, CollectionId, CollectionProduct, CreatedVariant, IdentityUpdate, ImageId,
    InventoryItemId, InventoryLevel, JobHandle, JobId, Location, LocationId, MediaId, MediaImage,
    Metafield, Price, ProductId, ProductImage, ProductStatus, ProductSummary, Publication,
    PublicationId, RemoteVariant, VariantId, VariantPriceUpdate, VariantRecreateInput, naming,
};

use crate::config::{Config, FeatureFlags, LocationRef, LocationsConfig, ShopifyConfig, TuningConfig};
use crate::gateway::CatalogGateway;
use crate::shopify::ShopifyError;
use crate::shopify::collections::{CollectionPage, ProductMove};
use crate::shopify::transport::{HttpRequest, HttpResponse, HttpSend, SendError};

/// Configuration used by every engine test: fixed locations 11 (promo) and
/// 22 (warehouse), optional features off so each protocol is tested on its
/// own.
pub(crate) fn test_config() -> Config {
    Config {
        shopify: ShopifyConfig {
            store: "outlet-demo.myshopify.com".to_owned(),
            admin_token: SecretString::from("shpat_test"),
            api_version: "2025-01".to_owned(),
            min_interval: Duration::from_secs_f64(0.7),
            max_retries: 5,
        },
        locations: LocationsConfig {
            promo: LocationRef::Id(LocationId::new(11)),
            warehouse: LocationRef::Id(LocationId::new(22)),
        },
        features: FeatureFlags {
            variant_reset: false,
            channel_restriction: false,
            location_cache: true,
        },
        tuning: TuningConfig {
            metafield_batch_size: 20,
            inventory_propagation_delay: Duration::from_secs_f64(1.5),
            variant_reset_skip_filter: "perso".to_owned(),
            variant_reset_delay: Duration::from_secs_f64(0.6),
        },
    }
}

/// Build an [`HttpResponse`] with no headers of interest.
pub(crate) fn http_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        retry_after: None,
        call_limit: None,
        body: body.to_owned(),
    }
}

/// [`HttpSend`] that replays a fixed script and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSend {
    script: Mutex<VecDeque<Result<HttpResponse, SendError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedSend {
    pub(crate) fn new(script: Vec<Result<HttpResponse, SendError>>) -> Self {
        Self { script: Mutex::new(script.into()), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl HttpSend for ScriptedSend {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .expect("no scripted response left for this request")
    }
}

/// A product as the fake platform stores it.
#[derive(Debug, Clone)]
pub(crate) struct FakeProduct {
    pub(crate) summary: ProductSummary,
    pub(crate) variants: Vec<RemoteVariant>,
    pub(crate) media: Vec<MediaImage>,
    pub(crate) metafields: Vec<Metafield>,
}

#[derive(Debug, Default)]
struct FakeState {
    products: Vec<FakeProduct>,
    collects: Vec<(Collect, ProductId)>,
    locations: Vec<Location>,
    levels: HashMap<(InventoryItemId, LocationId), i64>,
    publications: Vec<Publication>,
    unpublished: Vec<(ProductId, PublicationId)>,
    // job id -> polls remaining until done
    jobs: HashMap<JobId, u32>,
    collection_products: HashMap<CollectionId, Vec<CollectionProduct>>,
    reorder_moves: Vec<ProductMove>,
    calls: Vec<String>,
    next_id: u64,
    fail_price_titles: Vec<String>,
    fail_job_polls: bool,
    refuse_level_deletes: bool,
}

/// In-memory stand-in for the remote platform.
///
/// Every mutation mirrors the contract the production gateway documents:
/// duplication copies media, collects and variants (with fresh ids and
/// zeroed stock) but not metafields, identity updates reject taken handles,
/// created variants get auto-connected to every known location the way the
/// platform injects defaults.
#[derive(Debug)]
pub(crate) struct FakeCatalog {
    state: Mutex<FakeState>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self { state: Mutex::new(FakeState { next_id: 100, ..FakeState::default() }) }
    }
}

impl FakeCatalog {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn alloc(state: &mut FakeState) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    /// Seed an active source product with media, a metafield, a manual
    /// collection membership, and warehouse stock per size.
    pub(crate) fn seed_source(&self, title: &str, sizes: &[&str]) -> ProductId {
        let id = self.seed_product(title, ProductStatus::Active, sizes);
        let mut state = self.state();
        let slug = naming::slugify_handle(title);
        let media = (1..=2)
            .map(|n| MediaImage {
                id: MediaId::from_numeric(Self::alloc(&mut state)),
                url: format!("https://cdn.test/{slug}-{n}.jpg"),
                alt: String::new(),
            })
            .collect();
        let collect_id = CollectId::new(Self::alloc(&mut state));
        state.collects.push((Collect { id: collect_id, collection_id: 900 }, id.clone()));
        let product = state.products.iter_mut().find(|p| p.summary.id == id).unwrap();
        product.summary.tags = vec!["estate".to_owned()];
        product.media = media;
        product.metafields = vec![Metafield {
            namespace: "custom".to_owned(),
            key: "materiale".to_owned(),
            kind: "single_line_text_field".to_owned(),
            value: "pelle".to_owned(),
        }];
        id
    }

    /// Seed a bare product with one variant per size, each stocked with 5
    /// units at the warehouse location.
    pub(crate) fn seed_product(
        &self,
        title: &str,
        status: ProductStatus,
        sizes: &[&str],
    ) -> ProductId {
        let mut state = self.state();
        let id = ProductId::from_numeric(Self::alloc(&mut state));
        let variants = sizes
            .iter()
            .map(|size| {
                let variant_id = VariantId::from_numeric(Self::alloc(&mut state));
                let item = InventoryItemId::from_numeric(Self::alloc(&mut state));
                state.levels.insert((item.clone(), LocationId::new(22)), 5);
                RemoteVariant {
                    id: variant_id,
                    title: (*size).to_owned(),
                    sku: Some(format!("{}-{size}", naming::slugify_handle(title))),
                    barcode: None,
                    price: Some(Price::parse_lenient("129.90").unwrap()),
                    compare_at_price: None,
                    option_values: vec![(*size).to_owned()],
                    inventory_item_id: Some(item),
                }
            })
            .collect();
        state.products.push(FakeProduct {
            summary: ProductSummary {
                id: id.clone(),
                title: title.to_owned(),
                handle: naming::slugify_handle(title),
                status,
                tags: Vec::new(),
            },
            variants,
            media: Vec::new(),
            metafields: Vec::new(),
        });
        id
    }

    /// Seed a variant-less product occupying a specific handle.
    pub(crate) fn seed_product_with_handle(
        &self,
        title: &str,
        handle: &str,
        status: ProductStatus,
    ) -> ProductId {
        let mut state = self.state();
        let id = ProductId::from_numeric(Self::alloc(&mut state));
        state.products.push(FakeProduct {
            summary: ProductSummary {
                id: id.clone(),
                title: title.to_owned(),
                handle: handle.to_owned(),
                status,
                tags: Vec::new(),
            },
            variants: Vec::new(),
            media: Vec::new(),
            metafields: Vec::new(),
        });
        id
    }

    pub(crate) fn seed_location(&self, id: u64, name: &str) {
        self.state()
            .locations
            .push(Location { id: LocationId::new(id), name: name.to_owned() });
    }

    pub(crate) fn seed_publication(&self, name: &str) -> PublicationId {
        let mut state = self.state();
        let id = PublicationId::from_numeric(Self::alloc(&mut state));
        state.publications.push(Publication { id: id.clone(), name: name.to_owned() });
        id
    }

    /// Seed a background job that reports done after `polls` status checks.
    pub(crate) fn seed_job(&self, polls: u32) -> JobId {
        let mut state = self.state();
        let id = JobId::from_numeric(Self::alloc(&mut state));
        state.jobs.insert(id.clone(), polls);
        id
    }

    pub(crate) fn seed_collection_product(
        &self,
        collection: &CollectionId,
        title: &str,
        price: &str,
        compare_at: Option<&str>,
    ) -> ProductId {
        let mut state = self.state();
        let id = ProductId::from_numeric(Self::alloc(&mut state));
        state.collection_products.entry(collection.clone()).or_default().push(
            CollectionProduct {
                id: id.clone(),
                title: title.to_owned(),
                price: Price::parse_lenient(price),
                compare_at_price: compare_at.and_then(Price::parse_lenient),
            },
        );
        id
    }

    // -- scripted failures ------------------------------------------------

    /// Fail every price update on the product carrying this title.
    pub(crate) fn fail_price_updates_for(&self, title: &str) {
        self.state().fail_price_titles.push(title.to_owned());
    }

    pub(crate) fn fail_job_polls(&self) {
        self.state().fail_job_polls = true;
    }

    /// Make level deletes silently keep the record, like a platform that
    /// rejects the disconnect.
    pub(crate) fn refuse_level_deletes(&self) {
        self.state().refuse_level_deletes = true;
    }

    // -- assertions -------------------------------------------------------

    pub(crate) fn product(&self, id: &ProductId) -> Option<FakeProduct> {
        self.state().products.iter().find(|p| &p.summary.id == id).cloned()
    }

    pub(crate) fn product_by_title(&self, title: &str) -> Option<FakeProduct> {
        self.state().products.iter().find(|p| p.summary.title == title).cloned()
    }

    pub(crate) fn product_count(&self) -> usize {
        self.state().products.len()
    }

    pub(crate) fn collects_of(&self, id: &ProductId) -> Vec<Collect> {
        self.state()
            .collects
            .iter()
            .filter(|(_, product)| product == id)
            .map(|(collect, _)| *collect)
            .collect()
    }

    pub(crate) fn level(&self, item: &InventoryItemId, location: LocationId) -> Option<i64> {
        self.state().levels.get(&(item.clone(), location)).copied()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub(crate) fn unpublished(&self) -> Vec<(ProductId, PublicationId)> {
        self.state().unpublished.clone()
    }

    pub(crate) fn reorder_moves(&self) -> Vec<ProductMove> {
        self.state().reorder_moves.clone()
    }
}

fn user_error(message: impl Into<String>) -> ShopifyError {
    ShopifyError::UserError(message.into())
}

impl CatalogGateway for FakeCatalog {
    async fn find_source_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|p| p.summary.title == title && p.summary.status.is_active())
            .map(|p| p.summary.clone()))
    }

    async fn find_outlet_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|p| p.summary.title == title)
            .map(|p| p.summary.clone()))
    }

    async fn find_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|p| p.summary.handle == handle)
            .map(|p| p.summary.clone()))
    }

    async fn product_summary(
        &self,
        id: &ProductId,
    ) -> Result<Option<ProductSummary>, ShopifyError> {
        Ok(self.product(id).map(|p| p.summary))
    }

    async fn duplicate_product(
        &self,
        source: &ProductId,
        new_title: &str,
    ) -> Result<ProductSummary, ShopifyError> {
        let mut state = self.state();
        let original = state
            .products
            .iter()
            .find(|p| &p.summary.id == source)
            .cloned()
            .ok_or_else(|| user_error("Product not found"))?;

        let id = ProductId::from_numeric(Self::alloc(&mut state));
        let variants: Vec<RemoteVariant> = original
            .variants
            .iter()
            .map(|variant| {
                let new_variant_id = VariantId::from_numeric(Self::alloc(&mut state));
                let new_item = InventoryItemId::from_numeric(Self::alloc(&mut state));
                if let Some(item) = &variant.inventory_item_id {
                    // same connected locations as the original, empty stock
                    let connected: Vec<LocationId> = state
                        .levels
                        .keys()
                        .filter(|(existing, _)| existing == item)
                        .map(|(_, location)| *location)
                        .collect();
                    for location in connected {
                        state.levels.insert((new_item.clone(), location), 0);
                    }
                }
                RemoteVariant {
                    id: new_variant_id,
                    inventory_item_id: variant.inventory_item_id.as_ref().map(|_| new_item),
                    ..variant.clone()
                }
            })
            .collect();
        let media = original
            .media
            .iter()
            .map(|image| MediaImage {
                id: MediaId::from_numeric(Self::alloc(&mut state)),
                ..image.clone()
            })
            .collect();
        let collects: Vec<(Collect, ProductId)> = state
            .collects
            .iter()
            .filter(|(_, product)| product == source)
            .map(|(collect, _)| *collect)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|collect| {
                (
                    Collect {
                        id: CollectId::new(Self::alloc(&mut state)),
                        collection_id: collect.collection_id,
                    },
                    id.clone(),
                )
            })
            .collect();
        state.collects.extend(collects);

        let numeric = id.numeric().unwrap();
        let summary = ProductSummary {
            id: id.clone(),
            title: new_title.to_owned(),
            handle: format!("duplicate-{numeric}"),
            status: ProductStatus::Draft,
            tags: original.summary.tags.clone(),
        };
        state.products.push(FakeProduct {
            summary: summary.clone(),
            variants,
            media,
            // metafields are not carried over; the copy step does that
            metafields: Vec::new(),
        });
        Ok(summary)
    }

    async fn update_product_identity(
        &self,
        id: &ProductId,
        update: &IdentityUpdate,
    ) -> Result<ProductSummary, ShopifyError> {
        let mut state = self.state();
        if let Some(handle) = &update.handle
            && state
                .products
                .iter()
                .any(|p| &p.summary.id != id && &p.summary.handle == handle)
        {
            return Err(user_error("handle: Handle has already been taken"));
        }
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == id)
            .ok_or_else(|| user_error("Product not found"))?;
        if let Some(title) = &update.title {
            product.summary.title = title.clone();
        }
        if let Some(handle) = &update.handle {
            product.summary.handle = handle.clone();
        }
        if let Some(status) = update.status {
            product.summary.status = status;
        }
        if let Some(tags) = &update.tags {
            product.summary.tags = tags.clone();
        }
        Ok(product.summary.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ShopifyError> {
        let mut state = self.state();
        state.products.retain(|p| &p.summary.id != id);
        state.collects.retain(|(_, product)| product != id);
        Ok(())
    }

    async fn product_variants(&self, id: &ProductId) -> Result<Vec<RemoteVariant>, ShopifyError> {
        self.product(id)
            .map(|p| p.variants)
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))
    }

    async fn set_variant_prices(
        &self,
        id: &ProductId,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        let failing = {
            let titles = &state.fail_price_titles;
            state
                .products
                .iter()
                .any(|p| &p.summary.id == id && titles.contains(&p.summary.title))
        };
        if failing {
            return Err(user_error("price: scripted price rejection"));
        }
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == id)
            .ok_or_else(|| user_error("Product not found"))?;
        for update in updates {
            if let Some(variant) = product.variants.iter_mut().find(|v| v.id == update.id) {
                variant.price = Some(update.price);
                variant.compare_at_price = update.compare_at_price;
            }
        }
        Ok(())
    }

    async fn product_media(&self, id: &ProductId) -> Result<Vec<MediaImage>, ShopifyError> {
        self.product(id)
            .map(|p| p.media)
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))
    }

    async fn product_images(&self, id: &ProductId) -> Result<Vec<ProductImage>, ShopifyError> {
        Ok(self
            .product(id)
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))?
            .media
            .iter()
            .map(|image| ProductImage {
                id: ImageId::new(image.id.numeric().unwrap()),
                src: image.url.clone(),
            })
            .collect())
    }

    async fn delete_image(&self, id: &ProductId, image: ImageId) -> Result<(), ShopifyError> {
        let mut state = self.state();
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == id)
            .ok_or_else(|| user_error("Product not found"))?;
        product.media.retain(|m| m.id.numeric() != Some(image.as_u64()));
        Ok(())
    }

    async fn create_product_image(
        &self,
        id: &ProductId,
        source_url: &str,
    ) -> Result<MediaId, ShopifyError> {
        let mut state = self.state();
        let media_id = MediaId::from_numeric(Self::alloc(&mut state));
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == id)
            .ok_or_else(|| user_error("Product not found"))?;
        product.media.push(MediaImage {
            id: media_id.clone(),
            url: source_url.to_owned(),
            alt: String::new(),
        });
        Ok(media_id)
    }

    async fn product_metafields(&self, id: &ProductId) -> Result<Vec<Metafield>, ShopifyError> {
        self.product(id)
            .map(|p| p.metafields)
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))
    }

    async fn set_metafields(
        &self,
        owner: &ProductId,
        fields: &[Metafield],
        _batch_size: usize,
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == owner)
            .ok_or_else(|| user_error("Product not found"))?;
        for field in fields {
            match product
                .metafields
                .iter_mut()
                .find(|f| f.namespace == field.namespace && f.key == field.key)
            {
                Some(existing) => *existing = field.clone(),
                None => product.metafields.push(field.clone()),
            }
        }
        Ok(())
    }

    async fn locations(&self) -> Result<Vec<Location>, ShopifyError> {
        Ok(self.state().locations.clone())
    }

    async fn inventory_levels_for_item(
        &self,
        item: &InventoryItemId,
    ) -> Result<Vec<InventoryLevel>, ShopifyError> {
        Ok(self
            .state()
            .levels
            .iter()
            .filter(|((existing, _), _)| existing == item)
            .map(|((_, location), quantity)| InventoryLevel {
                location_id: *location,
                available: Some(*quantity),
            })
            .collect())
    }

    async fn connect_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        state.calls.push(format!("connect {location} {item}"));
        state.levels.entry((item.clone(), location)).or_insert(0);
        Ok(())
    }

    async fn set_inventory(
        &self,
        item: &InventoryItemId,
        location: LocationId,
        quantity: i64,
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        state.calls.push(format!("set {location} {quantity} {item}"));
        state.levels.insert((item.clone(), location), quantity);
        Ok(())
    }

    async fn delete_inventory_level(
        &self,
        item: &InventoryItemId,
        location: LocationId,
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        state.calls.push(format!("delete-level {location} {item}"));
        if !state.refuse_level_deletes {
            state.levels.remove(&(item.clone(), location));
        }
        Ok(())
    }

    async fn force_inventory_tracking(&self, item: &InventoryItemId) -> Result<(), ShopifyError> {
        self.state().calls.push(format!("track {item}"));
        Ok(())
    }

    async fn publications(&self) -> Result<Vec<Publication>, ShopifyError> {
        Ok(self.state().publications.clone())
    }

    async fn unpublish(
        &self,
        id: &ProductId,
        publication: &PublicationId,
    ) -> Result<(), ShopifyError> {
        self.state().unpublished.push((id.clone(), publication.clone()));
        Ok(())
    }

    async fn collects_for_product(&self, id: &ProductId) -> Result<Vec<Collect>, ShopifyError> {
        Ok(self.collects_of(id))
    }

    async fn delete_collect(&self, collect: CollectId) -> Result<(), ShopifyError> {
        self.state().collects.retain(|(existing, _)| existing.id != collect);
        Ok(())
    }

    async fn collection_products_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&str>,
    ) -> Result<CollectionPage, ShopifyError> {
        const PAGE: usize = 50;
        let state = self.state();
        let products = state
            .collection_products
            .get(collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("collection {collection} not found")))?;
        let offset: usize = cursor.map_or(0, |c| c.parse().unwrap());
        let page: Vec<CollectionProduct> =
            products.iter().skip(offset).take(PAGE).cloned().collect();
        let next = offset + page.len();
        let next_cursor = (next < products.len()).then(|| next.to_string());
        Ok(CollectionPage { products: page, next_cursor })
    }

    async fn reorder_collection_batch(
        &self,
        _collection: &CollectionId,
        moves: &[ProductMove],
    ) -> Result<Option<JobHandle>, ShopifyError> {
        let mut state = self.state();
        state.reorder_moves.extend(moves.iter().cloned());
        let id = JobId::from_numeric(Self::alloc(&mut state));
        Ok(Some(JobHandle { id, done: true }))
    }

    async fn job_status(&self, id: &JobId) -> Result<Option<JobHandle>, ShopifyError> {
        let mut state = self.state();
        if state.fail_job_polls {
            return Err(user_error("scripted poll failure"));
        }
        let Some(remaining) = state.jobs.get_mut(id) else {
            return Ok(None);
        };
        *remaining = remaining.saturating_sub(1);
        let done = *remaining == 0;
        Ok(Some(JobHandle { id: id.clone(), done }))
    }

    async fn delete_variant(
        &self,
        product: &ProductId,
        variant: &VariantId,
    ) -> Result<(), ShopifyError> {
        let mut state = self.state();
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == product)
            .ok_or_else(|| user_error("Product not found"))?;
        product.variants.retain(|v| &v.id != variant);
        Ok(())
    }

    async fn create_variant(
        &self,
        product: &ProductId,
        input: &VariantRecreateInput,
    ) -> Result<CreatedVariant, ShopifyError> {
        let mut state = self.state();
        let variant_id = VariantId::from_numeric(Self::alloc(&mut state));
        let item = input
            .inventory_management
            .is_some()
            .then(|| InventoryItemId::from_numeric(Self::alloc(&mut state)));
        if let Some(item) = &item {
            // the platform auto-connects fresh items to existing locations
            let known: Vec<LocationId> = state.locations.iter().map(|l| l.id).collect();
            for location in known {
                state.levels.insert((item.clone(), location), 0);
            }
        }
        let options: Vec<String> = [&input.option1, &input.option2, &input.option3]
            .into_iter()
            .filter_map(|o| o.clone())
            .collect();
        let found = state
            .products
            .iter_mut()
            .find(|p| &p.summary.id == product)
            .ok_or_else(|| user_error("Product not found"))?;
        found.variants.push(RemoteVariant {
            id: variant_id.clone(),
            title: options.join(" / "),
            sku: input.sku.clone(),
            barcode: input.barcode.clone(),
            price: Some(input.price),
            compare_at_price: input.compare_at_price,
            option_values: options,
            inventory_item_id: item.clone(),
        });
        Ok(CreatedVariant { id: variant_id, inventory_item_id: item })
    }
}
