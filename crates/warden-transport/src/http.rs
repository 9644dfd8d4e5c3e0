//! HTTP transport implementation using `reqwest`.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// A [`Transport`] that sends requests over HTTP(S).
///
/// Request paths are appended to the base URL rather than resolved against
/// it, so a base of `http://host/api` and a path of `/auth/me` produce
/// `http://host/api/auth/me`.
///
/// The client keeps a cookie store: cookies the server sets (such as an
/// HttpOnly refresh cookie) are sent back on later calls, including the
/// renewal call.
pub struct HttpTransport {
    base: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport for the given base URL.
    ///
    /// `timeout` bounds each call end to end; `None` leaves calls unbounded.
    ///
    /// # Errors
    /// - [`TransportError::InvalidUrl`] if `base_url` does not parse
    /// - [`TransportError::Http`] if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Http)?;

        tracing::debug!(base_url, ?timeout, "HTTP transport ready");
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base, path);
        Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            "response received"
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
