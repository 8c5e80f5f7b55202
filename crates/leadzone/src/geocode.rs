use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::GeocodeConfig;
use crate::store::{StoreError, load_json, save_json};
use crate::types::{Coordinates, Lead};

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid geocoding response: {0}")]
    DecodeError(#[from] serde_json::Error),
    #[error("Invalid geocoding endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// Address search returning the best match, if any.
pub trait Geocode {
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<Coordinates>, GeocodeError>> + Send;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: longitude first.
    coordinates: Vec<f64>,
}

/// Reads the first feature of a GeoJSON search response.
pub fn parse_geocode_response(body: &str) -> Result<Option<Coordinates>, GeocodeError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;

    Ok(collection
        .features
        .into_iter()
        .next()
        .and_then(|feature| match feature.geometry.coordinates[..] {
            [lng, lat, ..] => Some(Coordinates { lat, lng }),
            _ => None,
        }))
}

/// Client for the national address search API.
#[derive(Debug, Clone)]
pub struct AddressApi {
    client: Client,
    endpoint: Url,
}

impl AddressApi {
    pub fn new(endpoint: &str) -> Result<Self, GeocodeError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| GeocodeError::InvalidEndpoint(endpoint.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

impl Geocode for AddressApi {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", "1");

        let body = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await?;

        parse_geocode_response(&body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    pub updated: usize,
    pub already_geocoded: usize,
    pub no_address: usize,
    pub failed: usize,
    pub total: usize,
}

impl Display for GeocodeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nGeocoding complete:")?;
        writeln!(f, "  Updated:             {}", self.updated)?;
        writeln!(f, "  Already geocoded:    {}", self.already_geocoded)?;
        writeln!(f, "  Skipped (no address): {}", self.no_address)?;
        writeln!(f, "  Not found / failed:  {}", self.failed)?;
        writeln!(f, "  Total:               {}", self.total)
    }
}

/// Adds coordinates to every lead lacking them, in order, saving progress as it goes.
///
/// Leads that already carry both coordinates are not sent to the API. A lookup that finds
/// nothing or errors leaves the lead untouched.
pub async fn geocode_leads<G: Geocode>(
    geocoder: &G,
    leads: &mut [Lead],
    config: &GeocodeConfig,
    output: &Path,
) -> Result<GeocodeSummary, StoreError> {
    let mut summary = GeocodeSummary {
        total: leads.len(),
        ..Default::default()
    };
    let total = leads.len();
    let mut queried = 0;

    for i in 0..total {
        let lead = &mut leads[i];
        if lead.is_geocoded() {
            summary.already_geocoded += 1;
            continue;
        }
        if !lead.has_location() {
            log::warn!("Skipping {} (no address)", lead.name);
            summary.no_address += 1;
            continue;
        }

        if queried > 0 {
            crate::pause(config.request_delay).await;
        }

        log::info!("Geocoding ({}/{}): {}...", i + 1, total, lead.name);
        let query = lead.geocode_query();
        match geocoder.geocode(&query).await {
            Ok(Some(coords)) => {
                log::debug!("{} -> {}", lead.name, coords);
                lead.set_coordinates(coords);
                summary.updated += 1;
            }
            Ok(None) => {
                log::warn!("Could not geocode {}: no match for '{}'", lead.name, query);
                summary.failed += 1;
            }
            Err(e) => {
                log::warn!("Error geocoding {}: {}", lead.name, e);
                summary.failed += 1;
            }
        }

        queried += 1;
        if config.checkpoint_every > 0 && queried % config.checkpoint_every == 0 {
            save_json(output, leads)?;
        }
    }

    save_json(output, leads)?;
    Ok(summary)
}

/// Loads `path`, geocodes its leads and writes them back to the same file.
pub async fn geocode_file<G: Geocode>(
    geocoder: &G,
    path: &Path,
    config: &GeocodeConfig,
) -> Result<GeocodeSummary, StoreError> {
    let mut leads: Vec<Lead> = load_json(path)?;
    log::info!("Loaded {} leads.", leads.len());
    geocode_leads(geocoder, &mut leads, config, path).await
}
