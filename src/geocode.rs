//! Remote geocoding lookups over HTTP.
//!
//! One blocking GET per lookup, no retry and no backoff; each invocation is
//! the unit counted toward the monthly quota. A lookup either resolves to a
//! coordinate pair or reports a miss: transport errors, a non-`OK` service
//! status, and an empty candidate list are all misses, never run-fatal
//! errors. The credential travels only in the request query and is never
//! logged.
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Service-level status marking a resolved lookup.
const STATUS_OK: &str = "OK";

/// A resolved coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Lookup seam for the enrichment workflow.
///
/// The workflow only needs "query in, maybe coordinates out"; tests inject a
/// stub so no run-time path depends on the network.
pub trait Geocoder {
    fn lookup(&self, query: &str) -> Option<Coordinates>;
}

/// HTTP client for a Google-style geocoding endpoint.
pub struct GeocodeClient {
    agent: ureq::Agent,
    endpoint: String,
    language: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(endpoint: &str, language: &str, api_key: String) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint.to_string(),
            language: language.to_string(),
            api_key,
        }
    }

    fn request(&self, query: &str) -> Result<GeocodeResponse> {
        let mut response = self
            .agent
            .get(self.endpoint.as_str())
            .query("address", query)
            .query("language", self.language.as_str())
            .query("key", self.api_key.as_str())
            .call()
            .context("send geocode request")?;
        let body: GeocodeResponse = response
            .body_mut()
            .read_json()
            .context("decode geocode response")?;
        Ok(body)
    }
}

impl Geocoder for GeocodeClient {
    fn lookup(&self, query: &str) -> Option<Coordinates> {
        match self.request(query) {
            Ok(response) => {
                let hit = response.first_match();
                if hit.is_none() {
                    debug!(status = %response.status, query, "geocode query not resolved");
                }
                hit
            }
            Err(err) => {
                debug!(error = %err, query, "geocode request failed");
                None
            }
        }
    }
}

/// Top-level geocoding response: a service status plus candidate results.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeCandidate>,
}

impl GeocodeResponse {
    /// Return the first candidate's coordinates when the service resolved
    /// the query.
    pub fn first_match(&self) -> Option<Coordinates> {
        if self.status != STATUS_OK {
            return None;
        }
        self.results.first().map(|candidate| Coordinates {
            latitude: candidate.geometry.location.lat,
            longitude: candidate.geometry.location.lng,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeCandidate {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Location,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}
