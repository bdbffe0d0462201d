use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Single GET, no retry. Returns the body text of a 2xx response.
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!(url = %redact_api_key(url), "GET upstream");
        let res = self
            .client
            .get(url)
            .send()
            .await
            // reqwest errors embed the full URL, api key included
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        res.text()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))
    }
}

/// Replaces the value of any `api_key` query parameter with `***`.
pub fn redact_api_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("api_key=") {
                "api_key=***"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_key_anywhere_in_query() {
        assert_eq!(
            redact_api_key("https://x/3/movie/1?api_key=secret&page=2"),
            "https://x/3/movie/1?api_key=***&page=2"
        );
        assert_eq!(
            redact_api_key("https://x/3/search/movie?query=a&api_key=secret"),
            "https://x/3/search/movie?query=a&api_key=***"
        );
    }

    #[test]
    fn leaves_urls_without_query_untouched() {
        assert_eq!(redact_api_key("https://x/3/genre"), "https://x/3/genre");
    }
}
