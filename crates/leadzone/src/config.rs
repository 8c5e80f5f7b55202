use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LEADS_FILE: &str = "leads.json";
pub const ZONES_FILE: &str = "zones.json";

/// Locations of the files shared between jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub leads: PathBuf,
    pub zones: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            leads: dir.join(LEADS_FILE),
            zones: dir.join(ZONES_FILE),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::in_dir("data")
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub max_pages: u32,
    pub page_delay: Duration,
    /// Save the accumulated leads after every n-th page.
    pub checkpoint_every: u32,
    /// Leading digits of the regional postal codes, e.g. `85` for Vendée.
    pub region_prefix: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: crate::DIRECTORY_URL.to_string(),
            max_pages: 120,
            page_delay: Duration::from_millis(1000),
            checkpoint_every: 5,
            region_prefix: "85".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub endpoint: String,
    pub request_delay: Duration,
    /// Save after every n-th lead sent to the API.
    pub checkpoint_every: usize,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::GEOCODE_URL.to_string(),
            request_delay: Duration::from_millis(100),
            checkpoint_every: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoneConfig {
    pub site_url: String,
    pub listing_url: String,
    pub zone_delay: Duration,
    /// Delay between a zone's detail page and its companies page.
    pub roster_delay: Duration,
    pub checkpoint_every: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            site_url: crate::ZONES_SITE_URL.to_string(),
            listing_url: crate::ZONES_LISTING_URL.to_string(),
            zone_delay: Duration::from_millis(100),
            roster_delay: Duration::from_millis(200),
            checkpoint_every: 5,
        }
    }
}
