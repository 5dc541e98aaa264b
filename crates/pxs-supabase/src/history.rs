//! `upscale_history` table access.

use pxs_models::{UpscaleRecord, HISTORY_PAGE_LIMIT};

use crate::client::{eq, SupabaseClient};
use crate::error::SupabaseResult;

pub const HISTORY_TABLE: &str = "upscale_history";

#[derive(Debug, Clone)]
pub struct HistoryRepository {
    client: SupabaseClient,
}

impl HistoryRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn save(&self, record: &UpscaleRecord) -> SupabaseResult<()> {
        self.client
            .insert(HISTORY_TABLE, std::slice::from_ref(record))
            .await
    }

    /// Newest first, at most [`HISTORY_PAGE_LIMIT`] rows.
    pub async fn list(&self, user_id: &str) -> SupabaseResult<Vec<UpscaleRecord>> {
        self.client
            .select(
                HISTORY_TABLE,
                &[
                    ("user_id", eq(user_id)),
                    ("order", "created_at.desc".to_string()),
                    ("limit", HISTORY_PAGE_LIMIT.to_string()),
                ],
            )
            .await
    }

    pub async fn clear(&self, user_id: &str) -> SupabaseResult<()> {
        self.client
            .delete(HISTORY_TABLE, &[("user_id", eq(user_id))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SupabaseConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo(server: &MockServer) -> HistoryRepository {
        HistoryRepository::new(SupabaseClient::new(SupabaseConfig::new(server.uri(), "anon")).unwrap())
    }

    #[tokio::test]
    async fn test_list_orders_and_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/upscale_history"))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 3,
                "user_id": "u1",
                "original_filename": "cat.png",
                "output_filename": "cat.png_8x",
                "scale_factor": 8,
                "processing_time_ms": 1200,
                "created_at": "2025-03-02T10:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let records = repo(&server).list("u1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(3));
        assert_eq!(records[0].output_filename, "cat.png_8x");
    }

    #[tokio::test]
    async fn test_save_and_clear() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/upscale_history"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let repo = repo(&server);
        repo.save(&UpscaleRecord::new("u1", "cat.png", 4, 900)).await.unwrap();
        repo.clear("u1").await.unwrap();
    }
}
