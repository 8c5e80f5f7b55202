use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::http::absolute_url;
use crate::types::ZoneInfo;

static SEL_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("invalid selector: heading"));
static SEL_ZONE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="/zone-activites/"]"#).expect("invalid selector: zone link")
});
static SEL_COMPANIES_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href$="/entreprises"]"#).expect("invalid selector: companies link")
});
static SEL_COMPANY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".list-group-item h4, .card-title, h4, h5")
        .expect("invalid selector: company")
});

/// "Zone artisanale - LA BRUFFIERE (85)" style descriptions.
static RE_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\s+([A-ZÀ-ÖØ-Þ'\s\-]+)\s+\(").expect("invalid regex: city")
});

/// Headings of the roster page that are not company names.
const BOILERPLATE_PREFIXES: &[&str] = &["Répartition", "Toutes", "Les zones"];
const MIN_COMPANY_NAME_CHARS: usize = 3;

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element counts seen on the listing page, logged to spot layout changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingDiagnostics {
    pub headings: usize,
    pub links: usize,
}

/// Pairs the i-th zone heading with the i-th zone link.
///
/// Both sequences are read in document order and only the first `min(headings, links)` pairs
/// are used.
pub fn parse_zone_listing(html: &str, site_url: &str) -> (Vec<ZoneInfo>, ListingDiagnostics) {
    let document = Html::parse_document(html);

    let headings: Vec<ElementRef> = document.select(&SEL_HEADING).collect();
    let links: Vec<ElementRef> = document.select(&SEL_ZONE_LINK).collect();
    let diagnostics = ListingDiagnostics {
        headings: headings.len(),
        links: links.len(),
    };

    let zones = headings
        .iter()
        .zip(links.iter())
        .filter_map(|(heading, link)| {
            let name = normalize_whitespace(&elem_text(*heading));
            let href = link.value().attr("href").map(str::trim).unwrap_or_default();
            if name.is_empty() || href.is_empty() {
                return None;
            }

            Some(ZoneInfo {
                name,
                url: absolute_url(site_url, href),
                city: heading_city(*heading),
                ..Default::default()
            })
        })
        .collect();

    (zones, diagnostics)
}

/// City named in the paragraph right after a zone heading, if that sibling is a `<p>`.
fn heading_city(heading: ElementRef) -> Option<String> {
    let next = heading.next_siblings().find_map(ElementRef::wrap)?;
    if next.value().name() != "p" {
        return None;
    }

    let description = elem_text(next);
    RE_CITY
        .captures(&description)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_whitespace(m.as_str()).trim_matches('-').trim().to_string())
        .filter(|city| !city.is_empty())
}

/// Absolute URL of the zone's companies page, when the detail page links to one.
pub fn parse_companies_link(html: &str, site_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SEL_COMPANIES_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(|href| absolute_url(site_url, href))
}

/// Company names listed on a roster page, de-duplicated in first-seen order.
pub fn parse_companies(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&SEL_COMPANY)
        .map(|e| normalize_whitespace(&elem_text(e)))
        .filter(|text| text.chars().count() >= MIN_COMPANY_NAME_CHARS)
        .filter(|text| !BOILERPLATE_PREFIXES.iter().any(|p| text.starts_with(p)))
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SITE: &str = "https://simplanter.fr";

    #[test]
    fn test_parse_zone_listing_pairs_headings_and_links() {
        let html = r#"
            <div class="zone">
                <h3>ZA de la Bretonnière</h3>
                <p>Zone artisanale - BOUFFERE (85)</p>
                <a href="/zone-activites/za-de-la-bretonniere">Voir</a>
            </div>
            <div class="zone">
                <h3>Parc d'activités Actipôle 85</h3>
                <p>Parc d'activités - MONTAIGU-VENDEE (85)</p>
                <a href="https://simplanter.fr/zone-activites/actipole-85">Voir</a>
            </div>
        "#;

        let (zones, diagnostics) = parse_zone_listing(html, SITE);

        assert_eq!(diagnostics, ListingDiagnostics { headings: 2, links: 2 });
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "ZA de la Bretonnière");
        assert_eq!(
            zones[0].url,
            "https://simplanter.fr/zone-activites/za-de-la-bretonniere"
        );
        assert_eq!(zones[0].city.as_deref(), Some("BOUFFERE"));
        assert_eq!(zones[1].city.as_deref(), Some("MONTAIGU-VENDEE"));
        assert!(zones[1].companies.is_empty());
    }

    #[test]
    fn test_parse_zone_listing_tolerates_count_mismatch() {
        let html = r#"
            <h3>Zone A</h3><a href="/zone-activites/a">A</a>
            <h3>Zone B</h3><a href="/zone-activites/b">B</a>
            <h3>Zone C</h3>
            <h3>Zone D</h3>
        "#;

        let (zones, diagnostics) = parse_zone_listing(html, SITE);

        assert_eq!(diagnostics.headings, 4);
        assert_eq!(diagnostics.links, 2);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].name, "Zone B");
    }

    #[test]
    fn test_city_only_read_from_immediate_paragraph() {
        let html = r#"
            <h3>Zone A</h3>
            <div>Zone artisanale - CUGAND (85)</div>
            <a href="/zone-activites/a">A</a>
            <h3>Zone B</h3>
            <p>Sans ville connue</p>
            <a href="/zone-activites/b">B</a>
        "#;

        let (zones, _) = parse_zone_listing(html, SITE);

        assert!(zones[0].city.is_none());
        assert!(zones[1].city.is_none());
    }

    #[test]
    fn test_parse_companies_link() {
        let html = r#"
            <a href="/zone-activites/za-test/plan">Plan</a>
            <a href="/zone-activites/za-test/entreprises">Entreprises</a>
        "#;
        assert_eq!(
            parse_companies_link(html, SITE).as_deref(),
            Some("https://simplanter.fr/zone-activites/za-test/entreprises")
        );
        assert!(parse_companies_link("<a href='/contact'>Contact</a>", SITE).is_none());
    }

    #[test]
    fn test_parse_companies_filters_and_dedupes() {
        let html = r#"
            <h4>Répartition des entreprises</h4>
            <ul>
                <li class="list-group-item"><h4>SARL Dupont</h4></li>
                <li class="list-group-item"><h4>AB</h4></li>
                <li class="list-group-item"><h4>Garage Durand</h4></li>
                <li class="list-group-item"><h4>SARL Dupont</h4></li>
            </ul>
            <h5 class="card-title">Menuiserie Petit</h5>
            <h5>Toutes les zones</h5>
            <h5>Les zones voisines</h5>
        "#;

        let companies = parse_companies(html);

        assert_eq!(companies, ["SARL Dupont", "Garage Durand", "Menuiserie Petit"]);
    }

    #[test]
    fn test_parse_zone_listing_from_fixture() {
        let html = fs::read_to_string("fixtures/zones_listing.html").expect("Failed to read fixture");

        let (zones, diagnostics) = parse_zone_listing(&html, SITE);

        assert_eq!(diagnostics.headings, 4);
        assert_eq!(diagnostics.links, 4);
        assert_eq!(zones.len(), 4);

        let bretonniere = &zones[0];
        assert_eq!(bretonniere.name, "ZA de la Bretonnière");
        assert_eq!(bretonniere.city.as_deref(), Some("BOUFFERE"));

        assert_eq!(zones[2].city.as_deref(), Some("LES HERBIERS"));
        assert!(zones[3].city.is_none());
        assert!(zones.iter().all(|z| z.url.starts_with("https://simplanter.fr/zone-activites/")));
    }

    #[test]
    fn test_parse_roster_pages_from_fixtures() {
        let detail = fs::read_to_string("fixtures/zone_detail.html").expect("Failed to read fixture");
        let roster =
            fs::read_to_string("fixtures/zone_companies.html").expect("Failed to read fixture");

        assert_eq!(
            parse_companies_link(&detail, SITE).as_deref(),
            Some("https://simplanter.fr/zone-activites/za-de-la-bretonniere/entreprises")
        );

        let companies = parse_companies(&roster);
        assert_eq!(
            companies,
            [
                "SARL Dupont Menuiserie",
                "Café des Halles",
                "Métallerie Vendéenne SAS",
            ]
        );
    }
}
