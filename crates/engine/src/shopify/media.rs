//! Product images on both surfaces: GraphQL media reads and creation, REST
//! deletion.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use outlet_sync_core::{ImageId, MediaId, MediaImage, ProductId, ProductImage};

use super::client::ShopifyClient;
use super::products::numeric_id;
use super::transport::{HttpRequest, HttpSend};
use super::{ShopifyError, UserError, ensure_no_user_errors};

impl<S: HttpSend> ShopifyClient<S> {
    /// Image media of a product, in gallery order.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_media(&self, id: &ProductId) -> Result<Vec<MediaImage>, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!) {
                product(id: $id) {
                    media(first: 100) {
                        nodes {
                            alt
                            ... on MediaImage {
                                id
                                image { url }
                            }
                        }
                    }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            product: Option<Product>,
        }
        #[derive(Deserialize)]
        struct Product {
            media: Media,
        }
        #[derive(Deserialize)]
        struct Media {
            nodes: Vec<MediaNode>,
        }
        // Non-image media deserialize with id and image absent and are
        // filtered out.
        #[derive(Deserialize)]
        struct MediaNode {
            alt: Option<String>,
            id: Option<MediaId>,
            image: Option<Image>,
        }
        #[derive(Deserialize)]
        struct Image {
            url: String,
        }

        let data: Data = self.graphql(QUERY, json!({ "id": id })).await?;
        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("product {id} not found")))?;
        Ok(product
            .media
            .nodes
            .into_iter()
            .filter_map(|node| match (node.id, node.image) {
                (Some(media_id), Some(image)) => Some(MediaImage {
                    id: media_id,
                    url: image.url,
                    alt: node.alt.unwrap_or_default(),
                }),
                _ => None,
            })
            .collect())
    }

    /// Current images on the REST surface.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_images(&self, id: &ProductId) -> Result<Vec<ProductImage>, ShopifyError> {
        let numeric = numeric_id(id)?;

        #[derive(Deserialize)]
        struct Data {
            images: Vec<ProductImage>,
        }

        let data: Data = self
            .rest(HttpRequest::get(self.rest_url(&format!("/products/{numeric}/images.json"))))
            .await?;
        Ok(data.images)
    }

    /// Remove one image.
    #[instrument(skip(self), fields(product_id = %id, image_id = %image))]
    pub async fn delete_image(&self, id: &ProductId, image: ImageId) -> Result<(), ShopifyError> {
        let numeric = numeric_id(id)?;
        self.rest_empty(HttpRequest::delete(
            self.rest_url(&format!("/products/{numeric}/images/{image}.json")),
        ))
        .await
    }

    /// Add one image by URL with empty alt text, then rename its backing
    /// file to carry the outlet suffix.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn create_product_image(
        &self,
        id: &ProductId,
        source_url: &str,
    ) -> Result<MediaId, ShopifyError> {
        const QUERY: &str = r"
            mutation($productId: ID!, $media: [CreateMediaInput!]!) {
                productCreateMedia(productId: $productId, media: $media) {
                    media { id }
                    mediaUserErrors { field message }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "productCreateMedia")]
            create_media: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            media: Vec<CreatedMedia>,
            #[serde(rename = "mediaUserErrors")]
            media_user_errors: Vec<UserError>,
            #[serde(rename = "userErrors", default)]
            user_errors: Vec<UserError>,
        }
        #[derive(Deserialize)]
        struct CreatedMedia {
            id: MediaId,
        }

        let media = json!([{
            "originalSource": source_url,
            "mediaContentType": "IMAGE",
            "alt": "",
        }]);
        let data: Data = self.graphql(QUERY, json!({ "productId": id, "media": media })).await?;
        let payload = data.create_media;
        ensure_no_user_errors(&payload.media_user_errors)?;
        ensure_no_user_errors(&payload.user_errors)?;
        let media_id = payload
            .media
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| ShopifyError::NotFound("created media missing from response".into()))?;

        if let Some(stem) = filename_stem(source_url) {
            self.rename_media_file(&media_id, &stem).await?;
        }
        Ok(media_id)
    }

    // A failed rename is tolerated: the image itself is already in place.
    async fn rename_media_file(&self, media: &MediaId, stem: &str) -> Result<(), ShopifyError> {
        const QUERY: &str = r"
            mutation($files: [FileUpdateInput!]!) {
                fileUpdate(files: $files) {
                    files { id }
                    userErrors { field message }
                }
            }";

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "fileUpdate")]
            file_update: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            #[serde(rename = "userErrors")]
            user_errors: Vec<UserError>,
        }

        let files = json!([{ "id": media, "filename": format!("{stem}-Outlet") }]);
        let data: Data = self.graphql(QUERY, json!({ "files": files })).await?;
        if let Err(err) = ensure_no_user_errors(&data.file_update.user_errors) {
            tracing::warn!(media_id = %media, error = %err, "file rename rejected");
        }
        Ok(())
    }
}

/// Last path segment of an image URL, without its extension.
#[must_use]
pub fn filename_stem(source_url: &str) -> Option<String> {
    let parsed = url::Url::parse(source_url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let stem = segment.rsplit_once('.').map_or(segment, |(stem, _)| stem);
    (!stem.is_empty()).then(|| stem.to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use crate::testing::{ScriptedSend, http_response, test_config};

    use super::*;

    #[test]
    fn filename_stem_strips_extension_and_query() {
        assert_eq!(
            filename_stem("https://cdn.shopify.com/s/files/1/scarpa-trail_600x.jpg?v=17"),
            Some("scarpa-trail_600x".to_owned())
        );
        assert_eq!(filename_stem("https://cdn.test/a/b/photo.v2.png"), Some("photo.v2".to_owned()));
        assert_eq!(filename_stem("https://cdn.test/"), None);
        assert_eq!(filename_stem("not a url"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn media_read_skips_non_image_nodes() {
        let body = json!({
            "data": {
                "product": {
                    "media": {
                        "nodes": [
                            {"alt": "video"},
                            {
                                "alt": "",
                                "id": "gid://shopify/MediaImage/5",
                                "image": {"url": "https://cdn.test/a.jpg"},
                            },
                        ]
                    }
                }
            }
        })
        .to_string();
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![Ok(http_response(200, &body))]),
            &test_config(),
        );

        let media = client.product_media(&ProductId::from_numeric(1)).await.unwrap();

        assert_eq!(media.len(), 1);
        assert_eq!(media[0].url, "https://cdn.test/a.jpg");
    }

    #[tokio::test(start_paused = true)]
    async fn image_creation_renames_the_file_with_the_outlet_suffix() {
        let create_body = json!({
            "data": {
                "productCreateMedia": {
                    "media": [{"id": "gid://shopify/MediaImage/31"}],
                    "mediaUserErrors": [],
                    "userErrors": [],
                }
            }
        })
        .to_string();
        let rename_body = json!({
            "data": {"fileUpdate": {"files": [{"id": "gid://shopify/MediaImage/31"}], "userErrors": []}}
        })
        .to_string();
        let client = ShopifyClient::with_sender(
            ScriptedSend::new(vec![
                Ok(http_response(200, &create_body)),
                Ok(http_response(200, &rename_body)),
            ]),
            &test_config(),
        );

        let media_id = client
            .create_product_image(&ProductId::from_numeric(1), "https://cdn.test/scarpa.jpg")
            .await
            .unwrap();

        assert_eq!(media_id.as_str(), "gid://shopify/MediaImage/31");
        let requests = client.transport_requests();
        assert_eq!(requests.len(), 2);
        let files = &requests[1].body.as_ref().unwrap()["variables"]["files"];
        assert_eq!(files[0]["filename"], "scarpa-Outlet");
    }
}
