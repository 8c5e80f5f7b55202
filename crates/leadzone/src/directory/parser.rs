use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::types::Lead;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid region prefix '{0}': expected 1 to 4 digits")]
    InvalidRegionPrefix(String),
}

static SEL_ARTICLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".modal-monterritoire article.article-monterritoire")
        .expect("invalid selector: article")
});
static SEL_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".article-title").expect("invalid selector: title"));
static SEL_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".line-tags .tag").expect("invalid selector: tag"));
static SEL_INFO_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul.line-informations li").expect("invalid selector: information item")
});
static SEL_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("invalid selector: icon"));
static SEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: link"));

static RE_ACTIVITY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^activit[ée]\s*:\s*").expect("invalid regex: activity label")
});

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Text of an element with a line break between text nodes, so `<br>`-separated lines stay
/// apart.
fn elem_lines(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactKind {
    Address,
    Phone,
    Email,
    Website,
}

impl ContactKind {
    fn from_class(class: &str) -> Option<Self> {
        if class.contains("fa-map-marker") || class.contains("fa-map-pin") {
            Some(ContactKind::Address)
        } else if class.contains("fa-phone") {
            Some(ContactKind::Phone)
        } else if class.contains("fa-envelope") {
            Some(ContactKind::Email)
        } else if class.contains("fa-globe") {
            Some(ContactKind::Website)
        } else {
            None
        }
    }

    fn of_item(item: ElementRef) -> Option<Self> {
        item.select(&SEL_ICON).find_map(|icon| {
            icon.value()
                .classes()
                .find_map(ContactKind::from_class)
        })
    }
}

/// Splits a raw address blob into street line, zip code and city.
#[derive(Debug, Clone)]
pub struct AddressPattern {
    regex: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressParts {
    pub address: String,
    pub zip_code: String,
    pub city: String,
}

/// Zip code followed by the city, which runs to the end of its line.
fn address_regex(region_prefix: &str) -> String {
    format!(
        r"\b({}\d{{{}}})\s+(\S[^\n]*)",
        region_prefix,
        5 - region_prefix.len()
    )
}

impl AddressPattern {
    pub fn new(region_prefix: &str) -> Result<Self, ParseError> {
        let valid = (1..=4).contains(&region_prefix.len())
            && region_prefix.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(ParseError::InvalidRegionPrefix(region_prefix.to_string()));
        }

        let regex = Regex::new(&address_regex(region_prefix))
            .map_err(|_| ParseError::InvalidRegionPrefix(region_prefix.to_string()))?;
        Ok(Self { regex })
    }

    /// Splits a blob whose lines are separated by `\n`.
    ///
    /// The city runs to the end of the line it starts on; later lines are dropped. Whitespace is
    /// normalized in each part after the split.
    pub fn split(&self, raw: &str) -> AddressParts {
        let Some(caps) = self.regex.captures(raw) else {
            return AddressParts {
                address: normalize_whitespace(raw),
                ..Default::default()
            };
        };

        let (Some(whole), Some(zip), Some(city)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            return AddressParts {
                address: normalize_whitespace(raw),
                ..Default::default()
            };
        };

        let street = normalize_whitespace(&raw[..whole.start()])
            .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
            .to_string();

        AddressParts {
            address: street,
            zip_code: zip.as_str().to_string(),
            city: normalize_whitespace(city.as_str()),
        }
    }
}

impl Default for AddressPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(&address_regex("85")).expect("invalid regex: address"),
        }
    }
}

/// Extracts every listed business from one directory page.
///
/// Listings without a title are skipped. A page with no listing at all yields an empty vector,
/// which the crawler takes as the end of the directory.
pub fn parse_directory_page(html: &str, addresses: &AddressPattern) -> Vec<Lead> {
    let document = Html::parse_document(html);
    let mut leads = Vec::new();

    for article in document.select(&SEL_ARTICLE) {
        match parse_listing(article, addresses) {
            Some(lead) => leads.push(lead),
            None => log::debug!("Skipping listing without a name"),
        }
    }

    leads
}

fn parse_listing(article: ElementRef, addresses: &AddressPattern) -> Option<Lead> {
    let name = article
        .select(&SEL_TITLE)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .filter(|n| !n.is_empty())?;

    let category = parse_category(article);

    let mut raw_address = String::new();
    let mut phone = None;
    let mut email = None;
    let mut website = None;

    for item in article.select(&SEL_INFO_ITEM) {
        let href = item
            .select(&SEL_LINK)
            .next()
            .and_then(|a| a.value().attr("href"));

        match ContactKind::of_item(item) {
            Some(ContactKind::Address) => raw_address = elem_lines(item),
            Some(ContactKind::Phone) => {
                phone = href
                    .and_then(|h| non_empty(h.trim().trim_start_matches("tel:")))
                    .or_else(|| non_empty(&normalize_whitespace(&elem_text(item))));
            }
            Some(ContactKind::Email) => {
                email = href.and_then(|h| non_empty(h.trim().trim_start_matches("mailto:")));
            }
            Some(ContactKind::Website) => website = href.and_then(non_empty),
            None => {}
        }
    }

    let parts = addresses.split(&raw_address);

    Some(Lead {
        name,
        category,
        address: parts.address,
        zip_code: parts.zip_code,
        city: parts.city,
        phone,
        email,
        website,
        ..Default::default()
    })
}

fn parse_category(article: ElementRef) -> String {
    let tags: Vec<String> = article
        .select(&SEL_TAG)
        .map(|t| normalize_whitespace(&elem_text(t)))
        .filter(|t| !t.is_empty())
        .collect();

    tags.iter()
        .find_map(|t| {
            RE_ACTIVITY_LABEL
                .find(t)
                .map(|m| t[m.end()..].trim().to_string())
        })
        .or_else(|| tags.first().cloned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn listing(inner: &str) -> String {
        format!(
            r#"<div class="modal modal-monterritoire"><article class="article-monterritoire">{}</article></div>"#,
            inner
        )
    }

    #[test]
    fn test_split_address_with_region_code() {
        let pattern = AddressPattern::new("85").expect("valid prefix");
        let parts = pattern.split("12 rue de la Paix 85600 MONTAIGU");

        assert_eq!(parts.zip_code, "85600");
        assert_eq!(parts.city, "MONTAIGU");
        assert_eq!(parts.address, "12 rue de la Paix");
    }

    #[test]
    fn test_split_address_multiline_blob() {
        let pattern = AddressPattern::default();
        let parts = pattern.split("\n   ZA de la Motte,\n   85260 LES BROUZILS\n ");

        assert_eq!(parts.address, "ZA de la Motte");
        assert_eq!(parts.zip_code, "85260");
        assert_eq!(parts.city, "LES BROUZILS");
    }

    #[test]
    fn test_split_address_city_stops_at_end_of_line() {
        let parts = AddressPattern::default().split("2 place du Champ de Foire\n85600 BOUFFERE\nFrance");

        assert_eq!(parts.address, "2 place du Champ de Foire");
        assert_eq!(parts.zip_code, "85600");
        assert_eq!(parts.city, "BOUFFERE");
    }

    #[test]
    fn test_split_address_zip_at_start_of_line() {
        let parts = AddressPattern::default().split("Bâtiment B\n12 rue de la Paix\n85600\tMONTAIGU  ");

        assert_eq!(parts.address, "Bâtiment B 12 rue de la Paix");
        assert_eq!(parts.zip_code, "85600");
        assert_eq!(parts.city, "MONTAIGU");
    }

    #[test]
    fn test_split_address_city_on_line_after_zip() {
        let parts = AddressPattern::default().split("12 rue de la Paix 85600\nMONTAIGU\nFrance");

        assert_eq!(parts.address, "12 rue de la Paix");
        assert_eq!(parts.zip_code, "85600");
        assert_eq!(parts.city, "MONTAIGU");
    }

    #[test]
    fn test_address_lines_split_by_br() {
        let html = listing(
            r#"
            <h2 class="article-title">Dupont</h2>
            <ul class="line-informations">
                <li><i class="fa fa-map-marker"></i>12 rue de la Paix<br>85600 MONTAIGU</li>
            </ul>
            "#,
        );

        let leads = parse_directory_page(&html, &AddressPattern::default());

        assert_eq!(leads[0].address, "12 rue de la Paix");
        assert_eq!(leads[0].zip_code, "85600");
        assert_eq!(leads[0].city, "MONTAIGU");
    }

    #[test]
    fn test_split_address_outside_region_is_kept_whole() {
        let pattern = AddressPattern::default();
        let parts = pattern.split("3 place du Commerce 44000 NANTES");

        assert_eq!(parts.address, "3 place du Commerce 44000 NANTES");
        assert!(parts.zip_code.is_empty());
        assert!(parts.city.is_empty());
    }

    #[test]
    fn test_split_address_ignores_longer_digit_runs() {
        let pattern = AddressPattern::default();
        let parts = pattern.split("Lot 1285600 Parc");

        assert!(parts.zip_code.is_empty());
        assert_eq!(parts.address, "Lot 1285600 Parc");
    }

    #[test]
    fn test_address_pattern_rejects_bad_prefix() {
        assert!(AddressPattern::new("8a").is_err());
        assert!(AddressPattern::new("").is_err());
        assert!(AddressPattern::new("123456").is_err());
        assert!(AddressPattern::new("440").is_ok());
    }

    #[test]
    fn test_parse_full_listing() {
        let html = listing(
            r#"
            <h2 class="article-title"> Boulangerie   Martin </h2>
            <div class="line-tags">
                <span class="tag">Commerce</span>
                <span class="tag">Activité : Boulangerie, pâtisserie</span>
            </div>
            <ul class="line-informations">
                <li><i class="fa fa-map-marker"></i> 4 place de l'Église 85600 MONTAIGU-VENDEE</li>
                <li><i class="fa fa-phone"></i><a href="tel:0251000000">02 51 00 00 00</a></li>
                <li><i class="fa fa-envelope"></i><a href="mailto:contact@martin.fr">Écrire</a></li>
                <li><i class="fa fa-globe"></i><a href="https://www.martin.fr">Site web</a></li>
            </ul>
            "#,
        );

        let leads = parse_directory_page(&html, &AddressPattern::default());

        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.name, "Boulangerie Martin");
        assert_eq!(lead.category, "Boulangerie, pâtisserie");
        assert_eq!(lead.address, "4 place de l'Église");
        assert_eq!(lead.zip_code, "85600");
        assert_eq!(lead.city, "MONTAIGU-VENDEE");
        assert_eq!(lead.phone.as_deref(), Some("0251000000"));
        assert_eq!(lead.email.as_deref(), Some("contact@martin.fr"));
        assert_eq!(lead.website.as_deref(), Some("https://www.martin.fr"));
        assert!(lead.zone.is_none());
        assert!(!lead.is_geocoded());
    }

    #[test]
    fn test_category_falls_back_to_first_tag() {
        let html = listing(
            r#"
            <h2 class="article-title">Garage Durand</h2>
            <div class="line-tags"><span class="tag">Automobile</span><span class="tag">Services</span></div>
            "#,
        );

        let leads = parse_directory_page(&html, &AddressPattern::default());
        assert_eq!(leads[0].category, "Automobile");
        assert!(leads[0].address.is_empty());
        assert!(leads[0].phone.is_none());
    }

    #[test]
    fn test_phone_falls_back_to_text() {
        let html = listing(
            r#"
            <h2 class="article-title">Plomberie Bernard</h2>
            <ul class="line-informations">
                <li><span class="fas fa-phone-alt"></span> 06 12 34 56 78 </li>
                <li><i class="fa fa-envelope"></i> pas de lien</li>
            </ul>
            "#,
        );

        let leads = parse_directory_page(&html, &AddressPattern::default());
        assert_eq!(leads[0].phone.as_deref(), Some("06 12 34 56 78"));
        assert!(leads[0].email.is_none());
    }

    #[test]
    fn test_listing_without_name_is_skipped() {
        let html = format!(
            "{}{}",
            listing(r#"<h2 class="article-title">   </h2>"#),
            listing(r#"<h2 class="article-title">Menuiserie Petit</h2>"#)
        );

        let leads = parse_directory_page(&html, &AddressPattern::default());
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Menuiserie Petit");
    }

    #[test]
    fn test_articles_outside_modals_are_ignored() {
        let html = r#"
            <article class="article-monterritoire"><h2 class="article-title">Teaser</h2></article>
        "#;
        assert!(parse_directory_page(html, &AddressPattern::default()).is_empty());
    }

    #[test]
    fn test_parse_directory_page_from_fixture() {
        let html = fs::read_to_string("fixtures/directory_page.html")
            .expect("Failed to read fixture");

        let leads = parse_directory_page(&html, &AddressPattern::default());

        assert_eq!(leads.len(), 3, "Listing without title should be skipped");

        let first = &leads[0];
        assert_eq!(first.name, "SARL Dupont Menuiserie");
        assert_eq!(first.category, "Menuiserie");
        assert_eq!(first.address, "12 rue de la Paix");
        assert_eq!(first.zip_code, "85600");
        assert_eq!(first.city, "MONTAIGU");
        assert_eq!(first.phone.as_deref(), Some("+33251123456"));

        let second = &leads[1];
        assert_eq!(second.name, "Café des Halles");
        assert_eq!(second.address, "2 place du Champ de Foire");
        assert_eq!(second.zip_code, "85600");
        assert_eq!(second.city, "BOUFFERE");
        assert_eq!(second.email.as_deref(), Some("bonjour@cafedeshalles.fr"));
        assert!(second.website.is_none());

        let third = &leads[2];
        assert_eq!(third.name, "Transports Gendreau");
        assert_eq!(third.category, "Transport");
        assert_eq!(third.address, "Route de Nantes, Cholet");
        assert!(third.city.is_empty());
        assert_eq!(third.website.as_deref(), Some("https://gendreau.example"));
    }
}
