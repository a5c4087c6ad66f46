//! mailcow REST Client
//!
//! Native REST implementation for the mailcow API (`/api/v1`).
//! Uses reqwest with rustls and authenticates with the `X-API-Key` header.
//!
//! Every request goes through [`response::check_response`], which turns the
//! several error conventions of the API into a [`MailcowError`] before the
//! body is decoded.
//!
//! References:
//! - [mailcow API](https://mailcow.docs.apiary.io/)

mod error;
mod operations;
mod requests;
pub mod response;
mod responses;

// Re-export types
pub use error::MailcowError;
pub use requests::*;
pub use responses::*;

use crate::constants::{API_KEY_HEADER, API_PATH_PREFIX};
use crate::observability::metrics;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};
use zeroize::Zeroizing;

/// mailcow REST client bound to one instance
pub struct MailcowClient {
    http_client: Client,
    base_url: String,
    api_key: Zeroizing<String>,
}

impl std::fmt::Debug for MailcowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailcowClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MailcowClient {
    /// Create a client for `endpoint`
    ///
    /// `endpoint` is the instance URL; the `/api/v1` prefix is appended here.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        endpoint: &str,
        api_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, MailcowError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let base_url = format!("{}{}", endpoint.trim_end_matches('/'), API_PATH_PREFIX);

        debug!("Initialized mailcow client for {}", base_url);

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// Base URL including the API prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<Vec<u8>, MailcowError> {
        self.execute::<()>(operation, Method::GET, path, None).await
    }

    pub(crate) async fn post<T: Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &T,
    ) -> Result<Vec<u8>, MailcowError> {
        self.execute(operation, Method::POST, path, Some(body)).await
    }

    /// Send a request, buffer the body and classify the response
    async fn execute<T: Serialize + Sync>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<Vec<u8>, MailcowError> {
        let span = info_span!(
            "mailcow.api",
            mailcow.operation = operation,
            http.method = %method,
            http.path = path
        );

        async move {
            let start = Instant::now();
            let url = format!("{}{}", self.base_url, path);

            let mut request = self
                .http_client
                .request(method, &url)
                .header(API_KEY_HEADER, self.api_key.as_str());
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(bytes) => {
                            response::check_response(status, &bytes).map(|()| bytes.to_vec())
                        }
                        Err(e) => Err(MailcowError::from(e)),
                    }
                }
                Err(e) => Err(MailcowError::from(e)),
            };

            metrics::record_mailcow_call(operation, start.elapsed().as_secs_f64());
            if let Err(ref e) = result {
                metrics::increment_mailcow_call_errors(operation);
                warn!("mailcow {} failed: {}", operation, e);
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Characters escaped in identifiers placed in a URL path
///
/// Identifiers are addresses and domain names; `@` and `.` stay readable.
pub(crate) const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'@');

/// `<prefix>/<id>` with `id` percent-encoded
pub(crate) fn lookup_path(prefix: &str, id: &str) -> String {
    format!("{prefix}/{}", utf8_percent_encode(id, PATH_SEGMENT))
}
