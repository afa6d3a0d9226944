use std::collections::HashMap;
use tracing::{error, info};

use crate::error::RarityError;
use crate::models::query::ObserverQuery;
use crate::models::species::{EnrichedResult, SpeciesCountEntry};
use crate::services::enrichment::TaxonInfo;

#[derive(Debug, Clone)]
pub struct LeastObservedReport {
    pub query: ObserverQuery,
    pub distinct_species: usize,
    pub total_observations: u64,
    pub results: Vec<EnrichedResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
}

pub fn observation_link(link_base: &str, observer_id: &str, species_id: u64) -> String {
    format!(
        "{}?user_id={}&taxon_id={}",
        link_base.trim_end_matches('/'),
        observer_id,
        species_id
    )
}

/// Joins selected entries with their lookups and orders them by count, then species id.
pub fn assemble(
    selected: &[SpeciesCountEntry],
    enriched: &HashMap<u64, TaxonInfo>,
    observer_id: &str,
    link_base: &str,
) -> Vec<EnrichedResult> {
    let mut results: Vec<EnrichedResult> = selected
        .iter()
        .map(|entry| {
            let info = enriched
                .get(&entry.species_id)
                .cloned()
                .unwrap_or_else(|| TaxonInfo::placeholder(entry.species_id));
            EnrichedResult {
                display_name: info.display_name,
                species_id: entry.species_id,
                observation_count: entry.observation_count,
                iconic_type: entry.iconic_type.clone(),
                observation_link: observation_link(link_base, observer_id, entry.species_id),
                image_url: info.image_url,
                quality_grade: entry.quality_grade.clone(),
            }
        })
        .collect();

    results.sort_by_key(|r| (r.observation_count, r.species_id));
    results
}

/// Turns a request failure into the single message shown to the user.
pub fn classify(err: &RarityError) -> ErrorReport {
    if err.is_domain_outcome() {
        info!(reason = %err, "Request ended with a domain outcome");
    } else {
        error!(error = %err, "Request failed upstream");
    }
    ErrorReport {
        message: err.user_message(),
    }
}
