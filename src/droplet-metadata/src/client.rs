// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::MetadataDocument;
use crate::build_errors::Error as BuildError;
use crate::errors::FetchError;
use reqwest::Client as ReqwestClient;
use reqwest::redirect::Policy;
use std::time::Duration;

pub(crate) const METADATA_HOST: &str = "169.254.169.254";
pub(crate) const METADATA_PORT: u16 = 80;
pub(crate) const METADATA_PATH: &str = "/metadata/v1.json";

/// How long to wait for the connection to the metadata service.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for each read from the metadata service.
///
/// The whole request is also bounded by `CONNECT_TIMEOUT + READ_TIMEOUT`.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level keys removed from the metadata document.
///
/// `vendor_data` is a large MIME-encoded blob, and `user_data` is the
/// user-supplied cloud-init script. Neither is worth storing with the fact.
pub const REDACTED_KEYS: [&str; 2] = ["vendor_data", "user_data"];

/// Creates [Client] instances.
///
/// The default configuration targets the droplet metadata service at
/// `http://169.254.169.254:80`. The timeouts and the request path are fixed.
#[derive(Debug, Default)]
pub struct Builder {
    endpoint: Option<String>,
}

impl Builder {
    /// Sets the base URL of the metadata service.
    ///
    /// If not set, the client uses `http://169.254.169.254:80`. Overriding the
    /// endpoint is mostly useful to run against a local simulator.
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns a [Client] with the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [BuildError] if the endpoint override is not an `http` or
    /// `https` URL, or if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<Client, BuildError> {
        let endpoint = resolve_endpoint(self.endpoint)?;
        let inner = ReqwestClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(CONNECT_TIMEOUT + READ_TIMEOUT)
            // One request per connection, closed before `fetch()` returns.
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .no_proxy()
            .build()
            .map_err(BuildError::transport)?;
        Ok(Client {
            url: format!("{endpoint}{METADATA_PATH}"),
            inner,
        })
    }
}

fn resolve_endpoint(endpoint_override: Option<String>) -> Result<String, BuildError> {
    let Some(endpoint) = endpoint_override else {
        return Ok(format!("http://{METADATA_HOST}:{METADATA_PORT}"));
    };
    let parsed = url::Url::parse(&endpoint).map_err(BuildError::endpoint)?;
    match parsed.scheme() {
        "http" | "https" => Ok(endpoint.trim_end_matches('/').to_string()),
        scheme => Err(BuildError::endpoint(format!(
            "unsupported scheme `{scheme}` in `{endpoint}`"
        ))),
    }
}

/// A client for the DigitalOcean droplet metadata service.
///
/// Each call to [fetch](Client::fetch) or [try_fetch](Client::try_fetch)
/// makes exactly one request, on a fresh connection, with no retries.
#[derive(Clone, Debug)]
pub struct Client {
    url: String,
    inner: ReqwestClient,
}

impl Client {
    /// Creates a client for the default metadata service endpoint.
    pub fn new() -> Result<Self, BuildError> {
        Builder::default().build()
    }

    /// The URL of the metadata document.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the redacted metadata document.
    ///
    /// Any failure is logged as a single `WARN` event and returns `None`.
    /// Successful requests do not log.
    pub async fn fetch(&self) -> Option<MetadataDocument> {
        match self.try_fetch().await {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(
                    url = %self.url,
                    error.kind = e.kind(),
                    error.message = %e,
                    "DigitalOcean metadata request to {} failed: ({}) {}",
                    self.url,
                    e.kind(),
                    e
                );
                None
            }
        }
    }

    /// Fetches the redacted metadata document, returning any error.
    ///
    /// A non-success status is an error, and the body is not parsed in that
    /// case. The body must be a JSON object.
    pub async fn try_fetch(&self) -> crate::Result<MetadataDocument> {
        let response = self
            .inner
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::from_http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::bad_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_http_error)?;
        let mut document = serde_json::from_slice::<MetadataDocument>(&body)
            .map_err(FetchError::malformed_payload)?;
        redact(&mut document);
        Ok(document)
    }
}

/// Removes the [REDACTED_KEYS] from `document`.
///
/// Missing keys are ignored, and the order of the remaining keys is kept.
pub fn redact(document: &mut MetadataDocument) {
    for key in REDACTED_KEYS {
        document.shift_remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplet_metadata_test_utils::test_layer::TestLayer;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    type TestResult = anyhow::Result<()>;

    fn document(value: Value) -> MetadataDocument {
        match value {
            Value::Object(map) => map,
            v => panic!("expected a JSON object, got {v:?}"),
        }
    }

    fn test_client(server: &Server) -> anyhow::Result<Client> {
        let client = Builder::default()
            .endpoint(format!("http://{}", server.addr()))
            .build()?;
        Ok(client)
    }

    #[test]
    fn default_endpoint() -> TestResult {
        let client = Client::new()?;
        assert_eq!(client.url(), "http://169.254.169.254:80/metadata/v1.json");
        Ok(())
    }

    #[test]
    fn endpoint_override() -> TestResult {
        let client = Builder::default()
            .endpoint("http://127.0.0.1:8080/")
            .build()?;
        assert_eq!(client.url(), "http://127.0.0.1:8080/metadata/v1.json");
        Ok(())
    }

    #[test]
    fn endpoint_override_invalid() {
        let err = Builder::default()
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(err.is_endpoint(), "{err:?}");

        let err = Builder::default()
            .endpoint("ftp://169.254.169.254")
            .build()
            .unwrap_err();
        assert!(err.is_endpoint(), "{err:?}");
        assert!(err.to_string().contains("ftp"), "{err}");
    }

    #[test]
    fn redact_removes_keys() {
        let mut got = document(json!({
            "droplet_id": 123,
            "vendor_data": "x",
            "user_data": "y",
            "region": "nyc1",
        }));
        redact(&mut got);
        assert_eq!(got, document(json!({"droplet_id": 123, "region": "nyc1"})));

        let once = got.clone();
        redact(&mut got);
        assert_eq!(got, once);
    }

    #[test]
    fn redact_missing_keys() {
        let mut got = document(json!({"a": 1}));
        redact(&mut got);
        assert_eq!(got, document(json!({"a": 1})));
    }

    #[test]
    fn redact_keeps_order_and_nested_keys() {
        let mut got = document(json!({
            "region": "nyc1",
            "user_data": "#cloud-config",
            "droplet_id": 123,
            "vendor_data": "Content-Type: multipart/mixed",
            "interfaces": {"public": [{"user_data": "nested"}]},
            "hostname": "web-01",
        }));
        redact(&mut got);
        let keys = got.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["region", "droplet_id", "interfaces", "hostname"]);
        assert_eq!(
            got.get("interfaces"),
            Some(&json!({"public": [{"user_data": "nested"}]}))
        );
    }

    #[tokio::test]
    async fn fetch_success() -> TestResult {
        const TEST_ID: &str = "client_fetch_success";
        let _guard = TestLayer::initialize(TEST_ID);

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/metadata/v1.json"))
                .times(1)
                .respond_with(
                    status_code(200)
                        .insert_header("Content-Type", "application/json")
                        .body(
                            r#"{"droplet_id":123,"vendor_data":"x","user_data":"y","region":"nyc1"}"#,
                        ),
                ),
        );

        let client = test_client(&server)?;
        let got = client.fetch().await;
        assert_eq!(
            got,
            Some(document(json!({"droplet_id": 123, "region": "nyc1"})))
        );
        let events = TestLayer::capture_target(TEST_ID, "droplet_metadata");
        assert!(events.is_empty(), "{events:?}");
        Ok(())
    }

    #[tokio::test]
    async fn try_fetch_bad_status() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/metadata/v1.json"))
                .respond_with(status_code(500).body("not json")),
        );

        let client = test_client(&server)?;
        let err = client.try_fetch().await.unwrap_err();
        assert!(err.is_bad_status(), "{err:?}");
        assert_eq!(err.status(), Some(http::StatusCode::INTERNAL_SERVER_ERROR));
        Ok(())
    }

    #[tokio::test]
    async fn try_fetch_redirect_is_bad_status() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/metadata/v1.json"))
                .times(1)
                .respond_with(
                    status_code(302).insert_header("Location", "/metadata/v1/index.json"),
                ),
        );

        let client = test_client(&server)?;
        let err = client.try_fetch().await.unwrap_err();
        assert!(err.is_bad_status(), "{err:?}");
        assert_eq!(err.status(), Some(http::StatusCode::FOUND));
        Ok(())
    }

    #[tokio::test]
    async fn try_fetch_malformed_payload() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/metadata/v1.json"))
                .times(2)
                .respond_with(httptest::cycle![
                    status_code(200).body("not json"),
                    status_code(200).body(r#"["droplet_id", 123]"#),
                ]),
        );

        let client = test_client(&server)?;
        let err = client.try_fetch().await.unwrap_err();
        assert!(err.is_malformed_payload(), "{err:?}");

        let err = client.try_fetch().await.unwrap_err();
        assert!(err.is_malformed_payload(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn try_fetch_connection_refused() -> TestResult {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let client = Builder::default()
            .endpoint(format!("http://{addr}"))
            .build()?;
        let err = client.try_fetch().await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");
        assert!(!err.is_connect_timeout(), "{err:?}");
        Ok(())
    }
}
