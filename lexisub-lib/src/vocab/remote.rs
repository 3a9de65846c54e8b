//! Remote vocabulary store client

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{LexisubError, Result};

use super::types::{LookupRequest, LookupResponse, UpdateBatch};

/// Batched access to the server-side vocabulary store.
///
/// Updates must be idempotent on the remote side: a batch may be delivered
/// more than once, and the latest `timestamp` per word wins.
#[async_trait]
pub trait VocabRemote: Send + Sync {
    /// Send a batch of pending updates.
    async fn push_updates(&self, batch: &UpdateBatch) -> Result<()>;

    /// Fetch stored entries for a set of words.
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse>;
}

/// JSON-over-HTTP implementation of [`VocabRemote`].
#[derive(Debug, Clone)]
pub struct HttpVocabRemote {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpVocabRemote {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url).map_err(|e| {
            LexisubError::Config(format!("Invalid vocabulary remote URL {}: {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LexisubError::Config(format!(
                "Vocabulary remote URL must use http or https: {}",
                base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.post(self.build_url(path)).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LexisubError::Remote(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl VocabRemote for HttpVocabRemote {
    async fn push_updates(&self, batch: &UpdateBatch) -> Result<()> {
        self.post("/vocabulary/batch-update", batch).await?;
        Ok(())
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse> {
        let response = self.post("/vocabulary/lookup", request).await?;
        Ok(response.json::<LookupResponse>().await?)
    }
}
