use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Response body from the token server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "rtcToken")]
    rtc_token: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("http error: {0}")]
    Http(String),
    #[error("token server returned status {0}")]
    Status(u16),
    #[error("invalid token response: {0}")]
    Invalid(String),
}

/// Issues short-lived channel tokens bound to a channel/uid pair.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch(
        &self,
        server_url: &str,
        channel: &str,
        uid: u32,
        expiry_secs: u64,
    ) -> Result<String, TokenError>;
}

/// Token provider backed by the HTTP token server.
pub struct HttpTokenProvider;

impl HttpTokenProvider {
    /// Build the publisher-token request URL for a channel/uid pair.
    fn token_url(server_url: &str, channel: &str, uid: u32, expiry_secs: u64) -> String {
        let base = server_url.trim_end_matches('/');
        let channel = urlencoding::encode(channel);
        format!("{base}/rtc/{channel}/publisher/uid/{uid}/?expiry={expiry_secs}")
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch(
        &self,
        server_url: &str,
        channel: &str,
        uid: u32,
        expiry_secs: u64,
    ) -> Result<String, TokenError> {
        let url = Self::token_url(server_url, channel, uid, expiry_secs);
        tracing::info!("requesting channel token: {url}");

        let resp = reqwest::get(&url)
            .await
            .map_err(|e| TokenError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TokenError::Status(resp.status().as_u16()));
        }

        let data: TokenResponse = resp
            .json()
            .await
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(data.rtc_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn token_url_shape() {
        let url = HttpTokenProvider::token_url("https://tokens.example.com", "main", 7, 600);
        assert_eq!(
            url,
            "https://tokens.example.com/rtc/main/publisher/uid/7/?expiry=600"
        );
    }

    #[test]
    fn token_url_strips_trailing_slash() {
        let url = HttpTokenProvider::token_url("https://tokens.example.com/", "main", 0, 3600);
        assert_eq!(
            url,
            "https://tokens.example.com/rtc/main/publisher/uid/0/?expiry=3600"
        );
    }

    #[test]
    fn token_url_encodes_channel_name() {
        let url = HttpTokenProvider::token_url("https://t.example.com", "my room", 1, 60);
        assert_eq!(url, "https://t.example.com/rtc/my%20room/publisher/uid/1/?expiry=60");
    }

    #[tokio::test]
    async fn fetch_parses_token_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rtc/test-channel/publisher/uid/7/"))
            .and(query_param("expiry", "600"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "rtcToken": "abc123" })),
            )
            .mount(&server)
            .await;

        let token = HttpTokenProvider
            .fetch(&server.uri(), "test-channel", 7, 600)
            .await
            .unwrap();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn fetch_fails_on_non_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = HttpTokenProvider
            .fetch(&server.uri(), "test-channel", 7, 600)
            .await
            .unwrap_err();
        match err {
            TokenError::Status(status) => assert_eq!(status, 403),
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_fails_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = HttpTokenProvider
            .fetch(&server.uri(), "test-channel", 7, 600)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
