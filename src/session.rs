//! Authenticated HTTP session shared by all reports.

use crate::error::ClientError;
use reqwest::cookie::Jar;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout applied to every client built here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds an HTTP client that stores cookies in `jar`.
///
/// `follow_redirects` is false for the login handshake, which needs to read
/// each `Location` header itself.
pub fn create_http_client(
    jar: Arc<Jar>,
    user_agent: &str,
    follow_redirects: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    let policy = if follow_redirects {
        reqwest::redirect::Policy::default()
    } else {
        reqwest::redirect::Policy::none()
    };

    reqwest::Client::builder()
        .user_agent(user_agent)
        .cookie_provider(jar)
        .redirect(policy)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Cookie-bearing HTTP handle.
///
/// Cloning is cheap and shares the cookie jar.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// Wraps an existing cookie jar in a redirect-following client.
    pub fn new(jar: Arc<Jar>, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = create_http_client(jar, user_agent, true)?;
        Ok(Self { client })
    }

    /// The underlying client, for requests the reports don't cover.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GETs `url` and returns the body parsed as JSON.
    ///
    /// Non-success statuses and undecodable bodies are errors.
    pub async fn get_json_value(&self, url: &str) -> Result<JsonValue, ClientError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::data_shape(url, e))
    }

    /// GETs `url` and deserializes the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let value = self.get_json_value(url).await?;
        serde_json::from_value(value).map_err(|e| ClientError::data_shape(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session() -> Session {
        Session::new(Arc::new(Jar::default()), "test-agent").unwrap()
    }

    #[tokio::test]
    async fn test_get_json_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .and(header("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[1,2]}"#))
            .mount(&server)
            .await;

        let value = test_session()
            .get_json_value(&format!("{}/data.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(value["data"][1], 2);
    }

    #[tokio::test]
    async fn test_get_json_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_session()
            .get_json_value(&format!("{}/missing.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = test_session()
            .get_json_value(&server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::DataShape { .. }));
    }
}
