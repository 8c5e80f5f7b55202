mod parser;
pub mod scraper;

pub use parser::{AddressParts, AddressPattern, ParseError, parse_directory_page};
pub use scraper::{DirectoryError, ScrapeSummary, page_url, scrape_directory};
