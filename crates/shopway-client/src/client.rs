//! HTTP client for the route backend.
//!
//! One endpoint, `GET {base}/route`, answering a `{"success", "data"}`
//! envelope. Failures come back as [`RouteError`]; a success without a
//! drawable vehicle segment is [`RouteError::EmptyGeometry`].

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use shopway_core::Route;

use crate::error::RouteError;
use crate::types::{Envelope, FailureData, RouteRequest};

/// Anything able to answer a route request.
///
/// The widget is generic over this so tests can script responses and their
/// arrival order without a network.
pub trait RouteSource: Send + Sync {
    fn fetch_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Route, RouteError>> + Send;
}

/// Client for the route backend.
///
/// Use [`RouteClient::new`] with the configured base URL; tests point it at a
/// wiremock server the same way.
pub struct RouteClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl RouteClient {
    /// Creates a client with a request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RouteError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, RouteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join("route")` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| RouteError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            timeout_secs,
        })
    }

    /// Builds the route URL with percent-encoded query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidBaseUrl`] if the endpoint cannot be joined.
    pub fn route_url(&self, request: &RouteRequest) -> Result<Url, RouteError> {
        let mut url = self
            .base_url
            .join("route")
            .map_err(|e| RouteError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    /// Requests a route and validates it.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Timeout`] when the request exceeds the configured timeout.
    /// - [`RouteError::Http`] on any other network failure.
    /// - [`RouteError::Api`] when the envelope says `"success": false`.
    /// - [`RouteError::UnexpectedStatus`] on a non-2xx status without a message.
    /// - [`RouteError::Deserialize`] when the body does not match the wire shape.
    /// - [`RouteError::EmptyGeometry`] when no vehicle segment can be drawn.
    pub async fn get_route(&self, request: &RouteRequest) -> Result<Route, RouteError> {
        let url = self.route_url(request)?;
        tracing::debug!(
            commerce_id = request.commerce_id,
            profile = %request.profile,
            "requesting route"
        );

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(source) if status.is_success() => {
                return Err(RouteError::Deserialize {
                    context: url.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(RouteError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        };

        if !envelope.success {
            let message = serde_json::from_value::<FailureData>(envelope.data)
                .ok()
                .and_then(|d| d.message)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(RouteError::Api(message));
        }

        if !status.is_success() {
            return Err(RouteError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let route: Route =
            serde_json::from_value(envelope.data).map_err(|e| RouteError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        route.into_drawable().ok_or(RouteError::EmptyGeometry)
    }

    fn classify(&self, err: reqwest::Error) -> RouteError {
        if err.is_timeout() {
            RouteError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RouteError::Http(err)
        }
    }
}

impl RouteSource for RouteClient {
    fn fetch_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Route, RouteError>> + Send {
        self.get_route(request)
    }
}

#[cfg(test)]
mod tests {
    use shopway_core::{Position, TransportMode};

    use super::*;

    fn request() -> RouteRequest {
        RouteRequest {
            start: Position::new(48.86, 2.34).unwrap(),
            profile: TransportMode::Car,
            commerce_id: Some(7),
            destination_id: Some(1),
        }
    }

    #[test]
    fn route_url_appends_endpoint_and_query() {
        let client = RouteClient::new("https://example.test/wp-json/shopway/v1", 5, "test").unwrap();
        let url = client.route_url(&request()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/wp-json/shopway/v1/route?startLat=48.86&startLng=2.34&profile=car&commerceId=7&destinationId=1"
        );
    }

    #[test]
    fn route_url_strips_duplicate_trailing_slashes() {
        let client = RouteClient::new("https://example.test/api//", 5, "test").unwrap();
        let url = client.route_url(&request()).unwrap();
        assert!(url.as_str().starts_with("https://example.test/api/route?"), "{url}");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = RouteClient::new("not a url", 5, "test");
        assert!(matches!(result, Err(RouteError::InvalidBaseUrl { .. })));
    }
}
