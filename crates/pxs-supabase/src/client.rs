//! Supabase PostgREST client.
//!
//! Thin wrapper over `/rest/v1` with:
//! - `apikey` plus bearer auth on every request
//! - Retry with backoff for idempotent requests only
//! - Tracing spans and request metrics

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use crate::error::{SupabaseError, SupabaseResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// A PostgREST query pair, e.g. `("id", "eq.abc")`.
pub type QueryPair = (&'static str, String);

/// Build an equality filter value.
pub fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Supabase client configuration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key
    pub anon_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration for idempotent requests
    pub retry: RetryConfig,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let url = required_env("SUPABASE_URL")?;
        let anon_key = required_env("SUPABASE_ANON_KEY")?;

        let timeout_secs: u64 = std::env::var("SUPABASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryConfig::from_env(),
            ..Self::new(url, anon_key)
        })
    }
}

fn required_env(key: &str) -> SupabaseResult<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SupabaseError::config(format!("{} must be set", key))),
    }
}

/// Supabase REST client.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
    rest_url: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    /// Create a new client.
    pub fn new(config: SupabaseConfig) -> SupabaseResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("pxs-supabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SupabaseError::Network)?;

        let rest_url = format!("{}/rest/v1", config.url.trim_end_matches('/'));

        Ok(Self {
            http,
            config,
            rest_url,
            access_token: None,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    /// Copy of this client that acts as the signed-in user.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.config.retry
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.config.anon_key);
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    // =========================================================================
    // Table operations
    // =========================================================================

    /// `GET /rest/v1/{table}` with filters. Retried.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[QueryPair],
    ) -> SupabaseResult<Vec<T>> {
        let url = self.table_url(table);

        self.execute_request("select", table, async {
            with_retry(&self.config.retry, "select", || async {
                let response = self
                    .authorize(self.http.get(&url))
                    .query(&[("select", "*")])
                    .query(query)
                    .send()
                    .await?;
                let response = check_status(&url, response).await?;
                let rows: Vec<T> = response.json().await?;
                Ok(rows)
            })
            .await
        })
        .await
    }

    /// `POST /rest/v1/{table}`. Sent once.
    pub async fn insert<B: Serialize + ?Sized>(&self, table: &str, rows: &B) -> SupabaseResult<()> {
        let url = self.table_url(table);

        self.execute_request("insert", table, async {
            let response = self
                .authorize(self.http.post(&url))
                .header("Prefer", "return=minimal")
                .json(rows)
                .send()
                .await?;
            check_status(&url, response).await?;
            Ok(())
        })
        .await
    }

    /// `PATCH /rest/v1/{table}?{filters}`. Retried, so patches must set
    /// absolute values.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[QueryPair],
        patch: &B,
    ) -> SupabaseResult<()> {
        if filters.is_empty() {
            return Err(SupabaseError::request_failed("update without filter"));
        }
        let url = self.table_url(table);

        self.execute_request("update", table, async {
            with_retry(&self.config.retry, "update", || async {
                let response = self
                    .authorize(self.http.patch(&url))
                    .header("Prefer", "return=minimal")
                    .query(filters)
                    .json(patch)
                    .send()
                    .await?;
                check_status(&url, response).await?;
                Ok(())
            })
            .await
        })
        .await
    }

    /// `DELETE /rest/v1/{table}?{filters}`. Retried.
    pub async fn delete(&self, table: &str, filters: &[QueryPair]) -> SupabaseResult<()> {
        if filters.is_empty() {
            return Err(SupabaseError::request_failed("delete without filter"));
        }
        let url = self.table_url(table);

        self.execute_request("delete", table, async {
            with_retry(&self.config.retry, "delete", || async {
                let response = self
                    .authorize(self.http.delete(&url))
                    .query(filters)
                    .send()
                    .await?;
                check_status(&url, response).await?;
                Ok(())
            })
            .await
        })
        .await
    }

    /// `POST /rest/v1/rpc/{function}`. Sent once.
    pub async fn rpc<A, T>(&self, function: &str, args: &A) -> SupabaseResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/rpc/{}", self.rest_url, function);

        self.execute_request("rpc", function, async {
            let response = self
                .authorize(self.http.post(&url))
                .json(args)
                .send()
                .await?;
            let response = check_status(&url, response).await?;
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                SupabaseError::InvalidResponse(format!("{} returned {:?}: {}", function, body, e))
            })
        })
        .await
    }

    /// Check if the REST endpoint answers.
    pub async fn health_check(&self) -> SupabaseResult<bool> {
        let url = format!("{}/", self.rest_url);

        match self.authorize(self.http.get(&url)).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Supabase health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Supabase health check error: {}", e);
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn execute_request<T, F>(&self, operation: &str, table: &str, fut: F) -> SupabaseResult<T>
    where
        F: std::future::Future<Output = SupabaseResult<T>>,
    {
        let span = info_span!("supabase_request", operation = %operation, table = %table);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, table, status, latency_ms);

        result
    }
}

async fn check_status(url: &str, response: Response) -> SupabaseResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "Supabase request to {} failed: {}", url, body);
    Err(SupabaseError::from_http_status(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
                max_delay_ms: 2,
            },
            ..SupabaseConfig::new(server.uri(), "anon-key")
        })
        .unwrap()
    }

    #[test]
    #[serial]
    fn test_config_from_env_requires_url_and_key() {
        std::env::remove_var("SUPABASE_URL");
        std::env::set_var("SUPABASE_ANON_KEY", "anon");
        assert!(matches!(SupabaseConfig::from_env(), Err(SupabaseError::Config(_))));

        std::env::set_var("SUPABASE_URL", "https://proj.supabase.co");
        std::env::set_var("SUPABASE_TIMEOUT_SECS", "12");
        let config = SupabaseConfig::from_env().unwrap();
        assert_eq!(config.url, "https://proj.supabase.co");
        assert_eq!(config.timeout, Duration::from_secs(12));

        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("SUPABASE_TIMEOUT_SECS");
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(eq("abc"), "eq.abc");
        assert_eq!(eq(5), "eq.5");
    }

    #[tokio::test]
    async fn test_select_sends_auth_headers_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("id", "eq.u1"))
            .and(query_param("select", "*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "u1" }])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<serde_json::Value> = client_for(&server)
            .select("profiles", &[("id", eq("u1"))])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_access_token_replaces_anon_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<serde_json::Value> = client_for(&server)
            .with_access_token("user-jwt")
            .select("profiles", &[])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_select_retries_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let rows: Vec<serde_json::Value> = client_for(&server).select("profiles", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_insert_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/support_tickets"))
            .and(header("prefer", "return=minimal"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .insert("support_tickets", &serde_json::json!([{ "subject": "hi" }]))
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::ServerError(503, _)));
    }

    #[tokio::test]
    async fn test_update_sends_patch_with_filter() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.u1"))
            .and(body_json(serde_json::json!({ "credits": 4 })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update("profiles", &[("id", eq("u1"))], &serde_json::json!({ "credits": 4 }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_without_filter_is_refused() {
        let server = MockServer::start().await;
        let err = client_for(&server)
            .update("profiles", &[], &serde_json::json!({ "credits": 0 }))
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_rpc_decodes_scalar() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/process_referral"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(1)
            .mount(&server)
            .await;

        let ok: bool = client_for(&server)
            .rpc("process_referral", &serde_json::json!({}))
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_rpc_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .rpc::<_, bool>("process_referral", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(500));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await.unwrap());
    }
}
