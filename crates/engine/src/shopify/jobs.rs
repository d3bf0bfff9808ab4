//! Asynchronous job status checks.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use outlet_sync_core::{JobHandle, JobId};

use super::client::ShopifyClient;
use super::transport::HttpSend;
use super::ShopifyError;

impl<S: HttpSend> ShopifyClient<S> {
    /// Current status of one background job; `None` when the platform no
    /// longer knows the id.
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn job_status(&self, id: &JobId) -> Result<Option<JobHandle>, ShopifyError> {
        const QUERY: &str = r"
            query($id: ID!) {
                job(id: $id) { id done }
            }";

        #[derive(Deserialize)]
        struct Data {
            job: Option<JobHandle>,
        }

        let data: Data = self.graphql(QUERY, json!({ "id": id })).await?;
        Ok(data.job)
    }
}
