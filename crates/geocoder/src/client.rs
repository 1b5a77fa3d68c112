//! Nominatim search client

use crate::config::GeocoderConfig;
use crate::error::{GeocodeError, GeocodeResult};
use async_trait::async_trait;
use portmatch_core::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use portmatch_ports::{PortEntry, PortGeocoder, PortSource, PortsError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Nominatim caps `limit` at 40.
const MAX_LIMIT: usize = 40;

/// One element of a Nominatim `jsonv2` search response.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    /// Latitude as a decimal string
    pub lat: String,
    /// Longitude as a decimal string
    pub lon: String,
    /// Short name, often empty for unnamed features
    #[serde(default)]
    pub name: String,
    /// Comma-separated full label
    #[serde(default)]
    pub display_name: String,
    /// OSM feature type, e.g. `ferry_terminal`
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Address breakdown when `addressdetails=1`
    #[serde(default)]
    pub address: HashMap<String, String>,
}

impl NominatimPlace {
    /// Convert to a [`PortEntry`], `None` when unusable.
    pub fn into_port(self) -> Option<PortEntry> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lng = self.lon.trim().parse::<f64>().ok()?;

        let name = if self.name.trim().is_empty() {
            self.display_name.split(',').next().unwrap_or_default().trim().to_string()
        } else {
            self.name.trim().to_string()
        };

        let mut entry = PortEntry::new(name, lat, lng, PortSource::Online);
        entry.country = self.address.get("country_code").map(|cc| cc.to_uppercase());
        entry.region_code = self
            .address
            .get("ISO3166-2-lvl4")
            .and_then(|iso| iso.split_once('-'))
            .map(|(_, region)| region.to_string());
        if self.kind == "ferry_terminal" || entry.name.to_lowercase().contains("cruise") {
            entry.is_cruise = Some(true);
        }

        entry.validate().ok().map(|()| entry)
    }
}

/// Client for a Nominatim-compatible `/search` endpoint
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker so a dead provider stops being called
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct NominatimClient {
    inner: Client,
    config: Arc<GeocoderConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl NominatimClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> GeocodeResult<Self> {
        Self::with_config(GeocoderConfig::from_env()?)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: GeocoderConfig) -> GeocodeResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| GeocodeError::config("user_agent is not a valid header value"))?;
        default_headers.insert(USER_AGENT, agent);

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(GeocodeError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker: Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Search URL for `query`
    pub fn search_url(&self, query: &str, limit: usize) -> GeocodeResult<Url> {
        let endpoint = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let limit = limit.clamp(1, MAX_LIMIT).to_string();

        let mut params = vec![
            ("q", query),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
        ];
        if let Some(email) = &self.config.email {
            params.push(("email", email.as_str()));
        }

        Url::parse_with_params(&endpoint, &params).map_err(|e| GeocodeError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// Search for places matching `query`, best first
    #[instrument(skip(self), fields(request_id))]
    pub async fn search(&self, query: &str, limit: usize) -> GeocodeResult<Vec<PortEntry>> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if !self.circuit_breaker.can_execute() {
            warn!(request_id = %request_id, "Circuit breaker is open, rejecting request");
            return Err(GeocodeError::CircuitOpen);
        }

        let url = self.search_url(query, limit)?;
        let places = self.execute_with_retry(&request_id, &url).await?;

        let total = places.len();
        let ports: Vec<PortEntry> = places.into_iter().filter_map(NominatimPlace::into_port).collect();
        if ports.len() < total {
            debug!(request_id = %request_id, dropped = total - ports.len(), "Dropped unusable places");
        }
        Ok(ports)
    }

    /// Execute request with retry logic
    async fn execute_with_retry(&self, request_id: &str, url: &Url) -> GeocodeResult<Vec<NominatimPlace>> {
        let retry_config = &self.config.retry;
        let mut last_error: Option<GeocodeError> = None;

        for attempt in 0..retry_config.max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self.execute_single_request(request_id, url).await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        results = value.len(),
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(GeocodeError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request(&self, request_id: &str, url: &Url) -> GeocodeResult<Vec<NominatimPlace>> {
        let response = self
            .inner
            .get(url.clone())
            .header(X_REQUEST_ID, request_id)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    async fn handle_response(response: Response) -> GeocodeResult<Vec<NominatimPlace>> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(GeocodeError::api_response(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl PortGeocoder for NominatimClient {
    async fn search_ports_online(&self, query: &str, limit: usize) -> Result<Vec<PortEntry>, PortsError> {
        self.search(query, limit).await.map_err(PortsError::from)
    }

    fn name(&self) -> &str {
        "nominatim"
    }
}
