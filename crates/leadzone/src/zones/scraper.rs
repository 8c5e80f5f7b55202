use std::collections::HashSet;
use std::fmt::Display;

use super::parser::{parse_companies, parse_companies_link, parse_zone_listing};
use crate::config::{DataPaths, ZoneConfig};
use crate::geocode::Geocode;
use crate::http::{Fetch, ScraperError};
use crate::matcher::{NameIndex, assign_zone, assign_zones};
use crate::store::{StoreError, load_json, save_json};
use crate::types::{Lead, ZoneInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSummary {
    pub listed: usize,
    pub relevant: usize,
    pub with_companies: usize,
    pub companies: usize,
    pub matched: usize,
}

impl Display for ZoneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nZone scrape complete:")?;
        writeln!(f, "  Zones listed:          {}", self.listed)?;
        writeln!(f, "  Relevant zones:        {}", self.relevant)?;
        writeln!(f, "  Zones with a roster:   {}", self.with_companies)?;
        writeln!(f, "  Companies collected:   {}", self.companies)?;
        writeln!(f, "  Leads matched to zone: {}", self.matched)
    }
}

/// Keeps the zones that plausibly concern the leads.
///
/// A zone is kept when its city equals a lead city, or when its name contains a lead city or a
/// lead zip code. All comparisons ignore case.
pub fn relevant_zones(zones: Vec<ZoneInfo>, leads: &[Lead]) -> Vec<ZoneInfo> {
    let cities: HashSet<String> = leads
        .iter()
        .map(|l| l.city.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    let zips: HashSet<&str> = leads
        .iter()
        .map(|l| l.zip_code.trim())
        .filter(|z| !z.is_empty())
        .collect();

    zones
        .into_iter()
        .filter(|zone| {
            if zone
                .city
                .as_ref()
                .is_some_and(|city| cities.contains(&city.trim().to_uppercase()))
            {
                return true;
            }
            let name = zone.name.to_uppercase();
            cities.iter().any(|city| name.contains(city.as_str()))
                || zips.iter().any(|zip| name.contains(zip))
        })
        .collect()
}

/// Builds the zone catalogue for the leads in `paths.leads` and tags matching leads.
///
/// Only a missing or unreadable leads file and failed saves are errors. A zone whose pages
/// cannot be fetched is kept with an empty roster.
pub async fn scrape_zones<F: Fetch, G: Geocode>(
    fetcher: &F,
    geocoder: &G,
    config: &ZoneConfig,
    paths: &DataPaths,
) -> Result<ZoneSummary, StoreError> {
    let mut leads: Vec<Lead> = load_json(&paths.leads)?;
    log::info!("Loaded {} leads.", leads.len());

    let listed = fetch_zone_listing(fetcher, config).await;
    let mut summary = ZoneSummary {
        listed: listed.len(),
        ..Default::default()
    };

    let relevant = relevant_zones(listed, &leads);
    summary.relevant = relevant.len();
    log::info!("Filtered down to {} relevant zones.", relevant.len());

    let index = NameIndex::new(&leads);
    let mut enriched: Vec<ZoneInfo> = Vec::with_capacity(relevant.len());
    let total = relevant.len();

    for (i, mut zone) in relevant.into_iter().enumerate() {
        if i > 0 {
            crate::pause(config.zone_delay).await;
        }
        log::info!("[{}/{}] Processing {}...", i + 1, total, zone.name);

        match geocoder.geocode(&zone.geocode_query()).await {
            Ok(Some(coords)) => zone.set_coordinates(coords),
            Ok(None) => log::debug!("No coordinates for zone {}", zone.name),
            Err(e) => log::warn!("Error geocoding zone {}: {}", zone.name, e),
        }

        match fetch_roster(fetcher, config, &zone.url).await {
            Ok((companies_url, companies)) => {
                zone.companies_url = companies_url;
                zone.companies = companies;
            }
            Err(e) => log::warn!("Error scraping companies for zone {}: {}", zone.name, e),
        }

        if !zone.companies.is_empty() {
            summary.with_companies += 1;
            summary.companies += zone.companies.len();
            summary.matched += assign_zone(&mut leads, &index, &zone);
        }
        log::debug!("{}", zone);
        enriched.push(zone);

        if config.checkpoint_every > 0 && (i + 1) % config.checkpoint_every == 0 {
            save_json(&paths.leads, &leads)?;
            save_json(&paths.zones, &enriched)?;
        }
    }

    save_json(&paths.leads, &leads)?;
    save_json(&paths.zones, &enriched)?;
    Ok(summary)
}

async fn fetch_zone_listing<F: Fetch>(fetcher: &F, config: &ZoneConfig) -> Vec<ZoneInfo> {
    log::info!("Scraping zones list from {}...", config.listing_url);

    match fetcher.get_html(&config.listing_url).await {
        Ok(html) => {
            let (zones, diagnostics) = parse_zone_listing(&html, &config.site_url);
            log::info!(
                "Found {} headings and {} zone links.",
                diagnostics.headings,
                diagnostics.links
            );
            if diagnostics.headings != diagnostics.links {
                log::warn!("Zone listing layout mismatch, pairing the first {} only", zones.len());
            }
            log::info!("Successfully parsed {} zones.", zones.len());
            zones
        }
        Err(e) => {
            log::error!("Error scraping zones list: {}", e);
            Vec::new()
        }
    }
}

/// Companies page URL and company names of one zone. A zone without a companies page has an
/// empty roster.
async fn fetch_roster<F: Fetch>(
    fetcher: &F,
    config: &ZoneConfig,
    zone_url: &str,
) -> Result<(Option<String>, Vec<String>), ScraperError> {
    let detail = fetcher.get_html(zone_url).await?;
    let Some(companies_url) = parse_companies_link(&detail, &config.site_url) else {
        log::debug!("No companies page linked from {}", zone_url);
        return Ok((None, Vec::new()));
    };

    crate::pause(config.roster_delay).await;
    let roster = fetcher.get_html(&companies_url).await?;
    let companies = parse_companies(&roster);
    Ok((Some(companies_url), companies))
}

/// Re-applies an existing zone catalogue to the leads file without any network access.
pub fn rematch_files(paths: &DataPaths) -> Result<usize, StoreError> {
    let mut leads: Vec<Lead> = load_json(&paths.leads)?;
    let zones: Vec<ZoneInfo> = load_json(&paths.zones)?;
    log::info!("Matching {} leads against {} zones.", leads.len(), zones.len());

    let matched = assign_zones(&mut leads, &zones);
    save_json(&paths.leads, &leads)?;
    Ok(matched)
}
