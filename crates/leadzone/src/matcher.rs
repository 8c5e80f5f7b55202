use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::{Lead, ZoneInfo};

/// Company-form abbreviations dropped from either end of a name.
const LEGAL_FORMS: &[&str] = &["sarl", "sasu", "sas", "sci", "eurl", "snc", "sa"];

/// Canonical form of a business name for fuzzy comparison.
///
/// The result only contains `[a-z0-9 ]`, never has doubled or surrounding spaces, and has at
/// most one legal-form token removed from each end.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'a'..='z' | '0'..='9' | ' ' => c,
            _ => ' ',
        })
        .collect();

    let mut tokens: Vec<&str> = folded.split_whitespace().collect();

    if tokens.len() > 1 && LEGAL_FORMS.contains(&tokens[0]) {
        tokens.remove(0);
    }
    if tokens.len() > 1 && tokens.last().is_some_and(|t| LEGAL_FORMS.contains(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}

fn names_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.starts_with(b) || b.starts_with(a))
}

/// Normalized lead names, computed once and kept in lead order.
#[derive(Debug, Clone)]
pub struct NameIndex {
    names: Vec<String>,
}

impl NameIndex {
    pub fn new(leads: &[Lead]) -> Self {
        Self {
            names: leads.iter().map(|l| normalize_name(&l.name)).collect(),
        }
    }

    /// Position of the first lead whose name equals or prefixes `company`, or is prefixed by it.
    pub fn find(&self, company: &str) -> Option<usize> {
        let company = normalize_name(company);
        self.names.iter().position(|name| names_match(name, &company))
    }
}

/// Tags leads listed on `zone`'s roster and returns how many were newly tagged.
///
/// Each company goes to the first qualifying lead only. A lead that already belongs to a zone
/// keeps it. Index positions past the end of `leads` are ignored.
pub fn assign_zone(leads: &mut [Lead], index: &NameIndex, zone: &ZoneInfo) -> usize {
    let mut matched = 0;

    for company in &zone.companies {
        let Some(i) = index.find(company) else {
            continue;
        };
        let Some(lead) = leads.get_mut(i) else {
            continue;
        };
        if lead.zone.is_some() {
            continue;
        }
        lead.zone = Some(zone.name.clone());
        matched += 1;
        log::info!("   -> MATCH: {} in {}", lead.name, zone.name);
    }

    matched
}

/// Runs [`assign_zone`] for every zone in catalogue order.
pub fn assign_zones(leads: &mut [Lead], zones: &[ZoneInfo]) -> usize {
    let index = NameIndex::new(leads);
    zones
        .iter()
        .map(|zone| assign_zone(leads, &index, zone))
        .sum()
}
