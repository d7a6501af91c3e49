//! Object storage client

use bytes::Bytes;
use reqwest::Client;

use crate::error::Result;
use crate::{check_status, normalize_base_url};

/// HTTP client for path-style object storage (`{base}/{container}/{key}`)
#[derive(Debug, Clone)]
pub struct StorageClient {
    base_url: String,
    client: Client,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches an object's raw bytes
    pub async fn get_object(&self, container: &str, key: &str) -> Result<Bytes> {
        let url = format!("{}/{}/{}", self.base_url, container, key);
        let response = self.client.get(&url).send().await?;

        Ok(check_status(response).await?.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kb-bucket/knowledge_base.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"cpu":"scale"}"#))
            .mount(&server)
            .await;

        let client = StorageClient::new(format!("{}/", server.uri()));
        let body = client
            .get_object("kb-bucket", "knowledge_base.json")
            .await
            .unwrap();

        assert_eq!(body, r#"{"cpu":"scale"}"#);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("NoSuchKey"))
            .mount(&server)
            .await;

        let client = StorageClient::new(server.uri());
        let err = client
            .get_object("kb-bucket", "knowledge_base.json")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
