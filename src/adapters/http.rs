use crate::config::toml_config::SourcesConfig;
use crate::utils::error::{CostError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// 共用的 HTTP 客戶端，負責超時、重試與錯誤轉換
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(timeout: Duration, retry_attempts: u32, retry_delay: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            retry_attempts: retry_attempts.max(1),
            retry_delay,
        })
    }

    pub fn from_config(sources: &SourcesConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(sources.timeout_seconds),
            sources.retry_attempts,
            Duration::from_secs(sources.retry_delay_seconds),
        )
    }

    /// GET `url` with `query` and decode the JSON body as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source_name: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            match self.try_get(source_name, url, query).await {
                Ok(body) => {
                    return serde_json::from_str(&body).map_err(|e| CostError::ParseError {
                        source_name: source_name.to_string(),
                        message: e.to_string(),
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    tracing::warn!(
                        "⚠️ {} request failed (attempt {}/{}): {}",
                        source_name,
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, source_name: &str, url: &str, query: &[(&str, String)]) -> Result<String> {
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        tracing::debug!("{} response status: {}", source_name, status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(CostError::UpstreamError {
                source_name: source_name.to_string(),
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }
        Ok(body)
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
