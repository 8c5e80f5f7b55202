use std::fmt::Display;
use std::path::Path;

use super::parser::{AddressPattern, ParseError, parse_directory_page};
use crate::config::DirectoryConfig;
use crate::http::Fetch;
use crate::store::{StoreError, save_json};
use crate::types::Lead;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ParseError),
    #[error("Failed to save leads: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub pages: u32,
    pub leads: usize,
    pub reached_end: bool,
}

impl Display for ScrapeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nDirectory scrape complete:")?;
        writeln!(f, "  Pages with listings: {}", self.pages)?;
        writeln!(f, "  Leads collected:     {}", self.leads)?;
        writeln!(
            f,
            "  Stopped on:          {}",
            if self.reached_end {
                "empty page"
            } else {
                "page limit"
            }
        )
    }
}

/// URL of a directory page: the bare base for page 1, `<base>page/<n>/` afterwards.
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{}/page/{}/", base_url.trim_end_matches('/'), page)
    }
}

/// Crawls the directory page by page and writes every lead found to `output`.
///
/// Crawling stops at the first page that yields nothing, whether the page is past the end of
/// the listing or failed to load. The accumulated leads are saved every
/// `checkpoint_every` pages and once more when the crawl ends.
pub async fn scrape_directory<F: Fetch>(
    fetcher: &F,
    config: &DirectoryConfig,
    output: &Path,
) -> Result<ScrapeSummary, DirectoryError> {
    let addresses = AddressPattern::new(&config.region_prefix)?;
    let mut leads: Vec<Lead> = Vec::new();
    let mut pages = 0;
    let mut reached_end = false;

    log::info!("Starting scrape for up to {} pages...", config.max_pages);

    for page in 1..=config.max_pages {
        let page_leads = scrape_page(fetcher, config, &addresses, page).await;
        if page_leads.is_empty() {
            log::info!("No leads found on page {page}, likely reached end or error.");
            reached_end = true;
            break;
        }

        pages = page;
        leads.extend(page_leads);
        log::info!("Page {page}: total accumulated {}", leads.len());

        if config.checkpoint_every > 0 && page % config.checkpoint_every == 0 {
            save_json(output, &leads)?;
            log::debug!("Checkpoint after page {page}");
        }

        if page < config.max_pages {
            crate::pause(config.page_delay).await;
        }
    }

    save_json(output, &leads)?;
    log::info!("Saved {} leads to {}", leads.len(), output.display());

    Ok(ScrapeSummary {
        pages,
        leads: leads.len(),
        reached_end,
    })
}

async fn scrape_page<F: Fetch>(
    fetcher: &F,
    config: &DirectoryConfig,
    addresses: &AddressPattern,
    page: u32,
) -> Vec<Lead> {
    let url = page_url(&config.base_url, page);
    log::info!("Scraping page {}/{}: {}", page, config.max_pages, url);

    match fetcher.get_html(&url).await {
        Ok(html) => {
            let leads = parse_directory_page(&html, addresses);
            log::debug!("Found {} leads on page {}", leads.len(), page);
            for lead in &leads {
                log::trace!("  {}", lead);
            }
            leads
        }
        Err(e) => {
            log::warn!("Error scraping page {page}: {e}");
            Vec::new()
        }
    }
}
