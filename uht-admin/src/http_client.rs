//! HTTP gateway
//!
//! Responsible for
//!  - mapping the three gateway operations onto controller endpoints
//!  - logging/tracing
//!  - retries and backoff (for timeouts and connection errors, idempotent requests only)
//!  - mapping http status codes into `AdminError`s
//!
//! Endpoints, relative to `base_url`:
//!
//! | operation                    | request                              |
//! |------------------------------|--------------------------------------|
//! | `available_objects`          | `GET  /objects`                      |
//! | `object_fields`              | `GET  /objects/{objectApiName}/fields` |
//! | `save_tracked_configuration` | `POST /tracked-configuration`        |

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::{debug, error, trace, warn};

use crate::{
    Result,
    client::GatewayConfig,
    delta::SelectionDelta,
    error::{AdminError, HttpSnafu, SerializationSnafu},
    gateway::Gateway,
    model::{FieldInfo, ObjectInfo},
};

/// status codes where it's ok to retry and backoff
fn retry_for_status(code: StatusCode) -> bool {
    match code {
      StatusCode::GATEWAY_TIMEOUT /* 504 */ |
      StatusCode::REQUEST_TIMEOUT /* 408 */ => true,
      _ => false,
    }
}

#[derive(Clone)]
struct HttpRequest {
    method: Method,
    url: Url,
    body: Option<Bytes>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("body", &self.body.as_ref().map_or(0, Bytes::len))
            .finish()
    }
}

/// Gateway that talks to the tracking controller over HTTP
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u32,
}

impl HttpGateway {
    /// Creates a gateway with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(GatewayConfig::default())
    }

    pub fn with_config(config: GatewayConfig) -> Result<Self> {
        let builder = reqwest::Client::builder().timeout(config.request_timeout);
        Self::with_client(builder, config)
    }

    /// Creates a gateway from a `reqwest::ClientBuilder` and configuration.
    /// The builder can be customized with proxies, dns servers, user_agent, etc.
    pub fn with_client(builder: reqwest::ClientBuilder, config: GatewayConfig) -> Result<Self> {
        debug!(url = %config.base_url, "new gateway");
        let base_url = Url::parse(&config.base_url).map_err(|e| AdminError::Other {
            message: format!("invalid base url {:?}: {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AdminError::Other {
                message: format!("invalid base url {:?}", config.base_url),
            });
        }
        let client = builder.build().context(HttpSnafu {
            method: "client-init",
            url: "",
        })?;
        Ok(HttpGateway {
            client,
            base_url,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Builds an endpoint url by appending (percent-encoded) path segments to the base url
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let req = HttpRequest {
            method: Method::GET,
            url: self.endpoint(segments),
            body: None,
        };
        let body = self.send(req).await?;
        deserialize_json(&body)
    }

    /// Sends a request and returns the response body.
    /// - retries up to `max_retries` times for connection failures or server timeout,
    ///   for idempotent methods only
    /// - maps http error codes into AdminErrors
    async fn send(&self, req: HttpRequest) -> Result<Bytes> {
        let mut attempt = 0u32;
        log_request(&req);

        loop {
            let mut builder = self.client.request(req.method.clone(), req.url.clone());
            if let Some(body) = &req.body {
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }

            match builder.send().await {
                Ok(response) => {
                    let code = response.status();
                    if code.is_success() {
                        // If we fail to fully read the response, don't retry. The controller
                        // may have applied the request, and saves are not idempotent.
                        let body = response.bytes().await.context(HttpSnafu {
                            method: req.method.to_string(),
                            url: req.url.to_string(),
                        })?;
                        log_response(&req.url, &body);
                        return Ok(body);
                    }
                    let message = response.text().await.unwrap_or_default();
                    error!(?code, ?req, %message, attempt, "http");
                    if attempt < self.max_retries
                        && retry_for_status(code)
                        && is_idempotent_method(&req.method)
                    {
                        log_and_backoff(attempt, code.to_string()).await;
                        attempt += 1;
                        continue;
                    }
                    if retry_for_status(code) && attempt > 0 {
                        return Err(AdminError::TooManyRetries {
                            n: attempt + 1,
                            code: code.as_u16(),
                            message,
                        });
                    }
                    return Err(AdminError::ApiError {
                        code: code.as_u16(),
                        method: req.method.to_string(),
                        url: req.url.path().to_string(),
                        message,
                    });
                }
                Err(e) => {
                    error!(source = ?e, ?req, "http");
                    if (e.is_connect() || e.is_timeout())
                        && is_idempotent_method(&req.method)
                        && attempt < self.max_retries
                    {
                        log_and_backoff(attempt, e.to_string()).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(AdminError::Http {
                        method: req.method.to_string(),
                        url: req.url.path().to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}

impl Gateway for HttpGateway {
    async fn available_objects(&self) -> Result<Vec<ObjectInfo>> {
        self.get_json(&["objects"]).await
    }

    async fn object_fields(&self, object_api_name: &str) -> Result<Vec<FieldInfo>> {
        self.get_json(&["objects", object_api_name, "fields"]).await
    }

    async fn save_tracked_configuration(&self, delta: &SelectionDelta) -> Result<String> {
        let body = serde_json::to_vec(delta).context(SerializationSnafu)?;
        let req = HttpRequest {
            method: Method::POST,
            url: self.endpoint(&["tracked-configuration"]),
            body: Some(Bytes::from(body)),
        };
        let body = self.send(req).await?;
        Ok(unwrap_serialized(&body))
    }
}

/// The save endpoint returns a serialized structure. Some controllers wrap it in a
/// json string literal; unwrap that layer so the caller always sees the structure.
fn unwrap_serialized(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(inner)) => inner,
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}

// dump request
// requires RUST_LOG=uht::http_json=trace
fn log_request(req: &HttpRequest) {
    if tracing::enabled!(target: "uht::http_json", tracing::Level::TRACE) {
        let body = req
            .body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
            .unwrap_or_default();
        trace!(target: "uht::http_json", "{} url={} body={body}", req.method, req.url);
    }
}

// dump json response, for debugging
fn log_response(url: &Url, body: &Bytes) {
    if tracing::enabled!(target: "uht::http_json", tracing::Level::TRACE) {
        trace!(target: "uht::http_json", "Response url={url} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("Deserialization failed at {}: {}", err.path(), err);
            Err(AdminError::Deserialization {
                source: err.into_inner(),
            })
        }
    }
}

// log attempt and sleep for exponential backoff
async fn log_and_backoff(attempt: u32, err: String) {
    // exponential backoff: 250ms, 500ms, 1s, with jitter
    let base_delay = 250u64 * 2u64.pow(attempt);
    let jitter = f64::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    ) / 1_000_000_000.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let delay = ((base_delay as f64) * (0.5 + jitter)).round() as u64;
    warn!("Recoverable error {err}. Attempt {attempt}. Waiting {delay}ms before retry");
    tokio::time::sleep(Duration::from_millis(delay.max(1))).await;
}

fn is_idempotent_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::with_config(GatewayConfig::default().base_url(base)).expect("gateway")
    }

    #[test]
    fn test_retry_for_status() {
        assert!(retry_for_status(StatusCode::REQUEST_TIMEOUT));
        assert!(retry_for_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!retry_for_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!retry_for_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn endpoints_append_encoded_segments() {
        let gw = gateway("http://localhost:8080/uht");
        assert_eq!(
            gw.endpoint(&["objects"]).as_str(),
            "http://localhost:8080/uht/objects"
        );
        assert_eq!(
            gw.endpoint(&["objects", "Custom Object__c", "fields"]).as_str(),
            "http://localhost:8080/uht/objects/Custom%20Object__c/fields"
        );

        let gw = gateway("http://localhost:8080");
        assert_eq!(
            gw.endpoint(&["tracked-configuration"]).as_str(),
            "http://localhost:8080/tracked-configuration"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpGateway::with_config(GatewayConfig::default().base_url("not a url"))
            .expect_err("invalid url");
        assert!(matches!(err, AdminError::Other { .. }));
    }

    #[test]
    fn save_payload_is_unwrapped_from_string_literal() {
        let inner = r#"{"mdtDeploymentId":"123","triggerDeploymentIds":[],"triggerErrors":[]}"#;
        let wrapped = serde_json::to_vec(inner).expect("wrap");
        assert_eq!(unwrap_serialized(&wrapped), inner);
        assert_eq!(unwrap_serialized(inner.as_bytes()), inner);
    }

    #[test]
    fn only_reads_are_retried() {
        assert!(is_idempotent_method(&Method::GET));
        assert!(!is_idempotent_method(&Method::POST));
    }
}
