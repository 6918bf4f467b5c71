//! Signed request/response cycle against the CareHQ API.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{ClientError, RateLimit};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::params::MultiValueDict;
use crate::signature::{
    ACCOUNT_ID_HEADER, API_KEY_HEADER, SIGNATURE_HEADER, Signer, TIMESTAMP_HEADER, canonical_body,
    unix_timestamp,
};

/// Typed HTTP client for the CareHQ API.
///
/// Each request is signed with `DIGEST("{timestamp}{canonical_body}{secret}")`
/// where the canonical body is built from the query parameters of a `GET`
/// and from the form data of every other method. Only one side is ever
/// signed.
///
/// The client remembers the rate-limit headers of the last response in a
/// plain field. [`request`](Self::request) therefore takes `&mut self`: a
/// single client serves one call at a time, and sharing it between tasks is
/// left to the caller (e.g. behind a mutex), in which case the snapshot is
/// only as fresh as the last call that finished.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    signer: Signer,
    rate_limit: RateLimit,
}

impl ApiClient {
    /// Create a new `ApiClient`.
    ///
    /// The configured timeout, if any, is applied to the underlying
    /// `reqwest::Client`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
            signer: Signer::default(),
            rate_limit: RateLimit::default(),
        })
    }

    /// Create a client for the production API from bare credentials.
    pub fn with_credentials(
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(account_id, api_key, api_secret))
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure a proxy). The configured timeout is not applied to it.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Sign with a different digest algorithm.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Rate-limit values from the most recent responses.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    /// `GET /v1/{path}` with signed query parameters.
    pub async fn get(
        &mut self,
        path: &str,
        params: Option<&MultiValueDict>,
    ) -> Result<Value, ClientError> {
        self.request(Method::GET, path, params, None).await
    }

    /// `POST /v1/{path}` with signed form data.
    pub async fn post(
        &mut self,
        path: &str,
        data: Option<&MultiValueDict>,
    ) -> Result<Value, ClientError> {
        self.request(Method::POST, path, None, data).await
    }

    /// `PUT /v1/{path}` with signed form data.
    pub async fn put(
        &mut self,
        path: &str,
        data: Option<&MultiValueDict>,
    ) -> Result<Value, ClientError> {
        self.request(Method::PUT, path, None, data).await
    }

    /// `DELETE /v1/{path}` with signed form data.
    pub async fn delete(
        &mut self,
        path: &str,
        data: Option<&MultiValueDict>,
    ) -> Result<Value, ClientError> {
        self.request(Method::DELETE, path, None, data).await
    }

    /// Make a request to the API and return the parsed JSON response.
    ///
    /// * `params` – sent as the query string; signed for `GET`.
    /// * `data` – sent as a form-encoded body; signed for every other method.
    ///
    /// Statuses 200 and 204 succeed. Any other status fails with
    /// [`ClientError::Api`]. The rate-limit snapshot is refreshed from the
    /// response headers either way.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        params: Option<&MultiValueDict>,
        data: Option<&MultiValueDict>,
    ) -> Result<Value, ClientError> {
        let signed = if method == Method::GET { params } else { data };
        let timestamp = unix_timestamp();
        let signature = self
            .signer
            .sign(&timestamp, &canonical_body(signed), &self.config.api_secret);

        let mut url = Url::parse(&self.config.endpoint(path))?;
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.set_query(Some(&params.to_query_string()));
        }

        debug!(%method, %url, "sending CareHQ API request");

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header(ACCOUNT_ID_HEADER, &self.config.account_id)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp);
        if let Some(data) = data {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(data.to_form_body());
        }

        let resp = builder.send().await.map_err(|e| {
            let err = ClientError::transport(e);
            if err.is_timeout() {
                warn!(%method, %url, "CareHQ API request timed out");
            }
            err
        })?;

        self.rate_limit.update(resp.headers());

        let status = resp.status();
        debug!(%method, %url, %status, "received CareHQ API response");

        let bytes = resp.bytes().await.map_err(ClientError::transport)?;
        let document = parse_document(&bytes)?;

        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(document);
        }

        Err(ApiError::from_body(status.as_u16(), &document)?.into())
    }
}

/// Parse a response body; an empty body (e.g. a bare 204) becomes `null`.
fn parse_document(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
}
