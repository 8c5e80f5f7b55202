use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use leadzone::WebScraper;
use leadzone::config::{DataPaths, DirectoryConfig, GeocodeConfig, ZoneConfig};
use leadzone::directory::scrape_directory;
use leadzone::geocode::{AddressApi, geocode_file};
use leadzone::store::load_json;
use leadzone::types::Lead;
use leadzone::utils::LeadStats;
use leadzone::zones::{rematch_files, scrape_zones};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "leadzone")]
#[command(about = "Business directory scraper, geocoder and activity zone matcher", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'd',
        long = "data-dir",
        default_value = "data",
        global = true,
        help = "Directory holding leads.json and zones.json"
    )]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the business directory and write leads.json
    Scrape {
        #[arg(
            long,
            help = "Upper bound on the number of directory pages",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        max_pages: Option<u32>,

        #[arg(long, value_name = "MS", help = "Delay between pages in milliseconds")]
        delay_ms: Option<u64>,

        #[arg(long, help = "Save progress every N pages")]
        checkpoint_every: Option<u32>,
    },
    /// Add coordinates to leads that do not have them yet
    Geocode {
        #[arg(long, value_name = "MS", help = "Delay between API calls in milliseconds")]
        delay_ms: Option<u64>,

        #[arg(long, help = "Save progress every N geocoded leads")]
        checkpoint_every: Option<usize>,
    },
    /// Scrape activity zones relevant to the leads, then tag leads with their zone
    Zones {
        #[arg(long, value_name = "MS", help = "Delay between zones in milliseconds")]
        delay_ms: Option<u64>,

        #[arg(long, help = "Save progress every N zones")]
        checkpoint_every: Option<usize>,
    },
    /// Re-apply zones.json to leads.json without fetching anything
    Rematch,
    /// Print a summary of leads.json
    Stats,
    /// Run scrape, geocode and zones in sequence with default settings
    Run,
}

fn directory_config(
    max_pages: Option<u32>,
    delay_ms: Option<u64>,
    checkpoint_every: Option<u32>,
) -> DirectoryConfig {
    let mut config = DirectoryConfig::default();
    if let Some(max) = max_pages {
        config.max_pages = max;
    }
    if let Some(ms) = delay_ms {
        config.page_delay = Duration::from_millis(ms);
    }
    if let Some(n) = checkpoint_every {
        config.checkpoint_every = n;
    }
    config
}

fn geocode_config(delay_ms: Option<u64>, checkpoint_every: Option<usize>) -> GeocodeConfig {
    let mut config = GeocodeConfig::default();
    if let Some(ms) = delay_ms {
        config.request_delay = Duration::from_millis(ms);
    }
    if let Some(n) = checkpoint_every {
        config.checkpoint_every = n;
    }
    config
}

fn zone_config(delay_ms: Option<u64>, checkpoint_every: Option<usize>) -> ZoneConfig {
    let mut config = ZoneConfig::default();
    if let Some(ms) = delay_ms {
        config.zone_delay = Duration::from_millis(ms);
    }
    if let Some(n) = checkpoint_every {
        config.checkpoint_every = n;
    }
    config
}

fn web_scraper() -> WebScraper {
    WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

fn address_api(config: &GeocodeConfig) -> AddressApi {
    AddressApi::new(&config.endpoint).unwrap_or_else(|e| {
        log::error!("Error creating geocoding client: {}", e);
        process::exit(1);
    })
}

async fn run_scrape(paths: &DataPaths, config: &DirectoryConfig) {
    let summary = scrape_directory(&web_scraper(), config, &paths.leads)
        .await
        .unwrap_or_else(|e| {
            log::error!("Directory scrape failed: {}", e);
            process::exit(1);
        });
    print!("{}", summary);
}

async fn run_geocode(paths: &DataPaths, config: &GeocodeConfig) {
    let summary = geocode_file(&address_api(config), &paths.leads, config)
        .await
        .unwrap_or_else(|e| {
            log::error!("Geocoding failed: {}", e);
            process::exit(1);
        });
    print!("{}", summary);
}

async fn run_zones(paths: &DataPaths, config: &ZoneConfig) {
    let geocoder = address_api(&GeocodeConfig::default());
    let summary = scrape_zones(&web_scraper(), &geocoder, config, paths)
        .await
        .unwrap_or_else(|e| {
            log::error!("Zone scrape failed: {}", e);
            process::exit(1);
        });
    print!("{}", summary);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let paths = DataPaths::in_dir(&cli.data_dir);

    match cli.command {
        Commands::Scrape {
            max_pages,
            delay_ms,
            checkpoint_every,
        } => {
            let config = directory_config(max_pages, delay_ms, checkpoint_every);
            run_scrape(&paths, &config).await;
        }

        Commands::Geocode {
            delay_ms,
            checkpoint_every,
        } => {
            let config = geocode_config(delay_ms, checkpoint_every);
            run_geocode(&paths, &config).await;
        }

        Commands::Zones {
            delay_ms,
            checkpoint_every,
        } => {
            let config = zone_config(delay_ms, checkpoint_every);
            run_zones(&paths, &config).await;
        }

        Commands::Rematch => {
            let matched = rematch_files(&paths).unwrap_or_else(|e| {
                log::error!("Rematch failed: {}", e);
                process::exit(1);
            });
            println!("Matched {} leads to zones.", matched);
        }

        Commands::Stats => {
            let leads: Vec<Lead> = load_json(&paths.leads).unwrap_or_else(|e| {
                log::error!("Error reading leads: {}", e);
                process::exit(1);
            });
            print!("{}", LeadStats::from_leads(&leads));
        }

        Commands::Run => {
            run_scrape(&paths, &DirectoryConfig::default()).await;
            run_geocode(&paths, &GeocodeConfig::default()).await;
            run_zones(&paths, &ZoneConfig::default()).await;
        }
    }
}
