use crate::protocol::{GatewayResult, QueryRequest};
use reqwest::Client as HttpClient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Talks to a running `railmadad serve` instance.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    http: HttpClient,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            http: HttpClient::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ask(&self, query: &str) -> Result<GatewayResult, ClientError> {
        let request = QueryRequest {
            query: query.to_string(),
        };
        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slashes() {
        let client = GatewayClient::new("http://127.0.0.1:3400//");
        assert_eq!(client.base_url(), "http://127.0.0.1:3400");
    }
}
