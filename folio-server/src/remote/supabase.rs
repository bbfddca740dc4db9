//! Supabase (PostgREST) client for the remote record table
//!
//! Talks to `{url}/rest/v1/{table}` with the project's anonymous key. No
//! timeout or retry is configured: a slow remote only delays its own sync
//! attempt, never the caller.

use async_trait::async_trait;
use folio_common::config::RemoteConfig;
use folio_common::model::{Assignment, AssignmentPatch};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::debug;

use super::{RemoteError, RemoteInsert, RemoteRow, RemoteSync, RemoteUpdate};

const USER_AGENT: &str = concat!("folio-server/", env!("CARGO_PKG_VERSION"));

/// PostgREST client for one table
pub struct SupabaseClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl SupabaseClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.anon_key)
                .map_err(|e| RemoteError::Config(format!("invalid API key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
                .map_err(|e| RemoteError::Config(format!("invalid API key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/rest/v1/{}", config.url, config.table),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Turn non-success statuses into `RemoteError::Api`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(RemoteError::Api(status.as_u16(), error_text))
    }

    fn id_filter(id: i64) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

#[async_trait]
impl RemoteSync for SupabaseClient {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn pull(&self) -> Result<Vec<Assignment>, RemoteError> {
        debug!(endpoint = %self.endpoint, "Pulling remote assignments");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let rows: Vec<RemoteRow> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn push_create(&self, assignment: &Assignment) -> Result<(), RemoteError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Prefer", "return=minimal")
            .json(&RemoteInsert::from(assignment))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn push_update(&self, id: i64, patch: &AssignmentPatch) -> Result<(), RemoteError> {
        let response = self
            .http_client
            .patch(&self.endpoint)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=minimal")
            .json(&RemoteUpdate::from(patch))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn push_delete(&self, id: i64) -> Result<(), RemoteError> {
        let response = self
            .http_client
            .delete(&self.endpoint)
            .query(&Self::id_filter(id))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            url: "https://example.supabase.co".to_string(),
            anon_key: "anon-key".to_string(),
            table: "assignments".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = SupabaseClient::new(&config()).unwrap();
        assert_eq!(client.endpoint(), "https://example.supabase.co/rest/v1/assignments");
        assert_eq!(client.name(), "supabase");
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut config = config();
        config.anon_key = "line\nbreak".to_string();

        assert!(matches!(
            SupabaseClient::new(&config),
            Err(RemoteError::Config(_))
        ));
    }
}
