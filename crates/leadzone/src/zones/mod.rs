mod parser;
pub mod scraper;

pub use parser::{ListingDiagnostics, parse_companies, parse_companies_link, parse_zone_listing};
pub use scraper::{ZoneSummary, relevant_zones, rematch_files, scrape_zones};
