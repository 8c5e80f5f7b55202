pub mod config;
pub mod directory;
pub mod geocode;
pub mod http;
pub mod matcher;
pub mod store;
pub mod types;
pub mod utils;
pub mod zones;

pub use http::{Fetch, ScraperError, WebScraper};

pub(crate) const DIRECTORY_URL: &str =
    "https://www.terresdemontaigu.fr/entreprendre/annuaire-entreprises/";
pub(crate) const ZONES_SITE_URL: &str = "https://simplanter.fr";
pub(crate) const ZONES_LISTING_URL: &str =
    "https://simplanter.fr/departements/vendee/zones-activite";
pub(crate) const GEOCODE_URL: &str = "https://api-adresse.data.gouv.fr/search/";

/// Waits between two outbound requests. A zero delay returns immediately.
pub(crate) async fn pause(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
