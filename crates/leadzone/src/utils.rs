use std::collections::{BTreeMap, HashSet};

use crate::types::Lead;

#[derive(Debug)]
pub struct LeadStats {
    pub total: usize,
    pub geocoded: usize,
    pub zoned: usize,
    pub with_contact: usize,
    pub cities: usize,
    pub per_zone: BTreeMap<String, usize>,
}

impl LeadStats {
    pub fn from_leads(leads: &[Lead]) -> LeadStats {
        let mut per_zone = BTreeMap::new();
        for zone in leads.iter().filter_map(|l| l.zone.as_ref()) {
            *per_zone.entry(zone.clone()).or_insert(0) += 1;
        }

        LeadStats {
            total: leads.len(),
            geocoded: leads.iter().filter(|l| l.is_geocoded()).count(),
            zoned: leads.iter().filter(|l| l.zone.is_some()).count(),
            with_contact: leads
                .iter()
                .filter(|l| l.phone.is_some() || l.email.is_some() || l.website.is_some())
                .count(),
            cities: leads
                .iter()
                .map(|l| l.city.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect::<HashSet<_>>()
                .len(),
            per_zone,
        }
    }
}

impl std::fmt::Display for LeadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Leads:                {}", self.total)?;
        writeln!(f, "  Geocoded:             {}", self.geocoded)?;
        writeln!(f, "  In an activity zone:  {}", self.zoned)?;
        writeln!(f, "  With contact details: {}", self.with_contact)?;
        writeln!(f, "  Distinct cities:      {}", self.cities)?;
        if !self.per_zone.is_empty() {
            writeln!(f, "\nLeads per zone:")?;
            for (zone, count) in &self.per_zone {
                writeln!(f, "  {:>4}  {}", count, zone)?;
            }
        }
        Ok(())
    }
}
