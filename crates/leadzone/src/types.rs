use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One business discovered in the directory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl Lead {
    pub fn is_geocoded(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }

    pub fn has_location(&self) -> bool {
        !self.address.trim().is_empty() || !self.city.trim().is_empty()
    }

    /// Free-text query for the address search API: street, zip code, then city.
    pub fn geocode_query(&self) -> String {
        [&self.address, &self.zip_code, &self.city]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = Some(coords.lat);
        self.lng = Some(coords.lng);
    }
}

impl Display for Lead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.category.is_empty() {
            write!(f, " [{}]", self.category)?;
        }
        if !self.city.is_empty() {
            write!(f, " ({} {})", self.zip_code, self.city)?;
        }
        if let Some(zone) = &self.zone {
            write!(f, " @ {}", zone)?;
        }
        Ok(())
    }
}

/// One activity zone and the companies listed on its roster page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies_url: Option<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl ZoneInfo {
    pub fn geocode_query(&self) -> String {
        match &self.city {
            Some(city) => format!("{} {}", self.name.trim(), city.trim()),
            None => self.name.trim().to_string(),
        }
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = Some(coords.lat);
        self.lng = Some(coords.lng);
    }
}

impl Display for ZoneInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(city) = &self.city {
            write!(f, " ({})", city)?;
        }
        write!(f, ": {} companies", self.companies.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}
