//! Wire shapes of the two iNaturalist endpoints this service reads.
//!
//! Only the fields the pipeline uses are modelled; everything else in the payload is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SpeciesCountsPage {
    #[serde(default)]
    pub results: Vec<SpeciesCountResult>,
    pub total_results: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeciesCountResult {
    pub taxon: CountedTaxon,
}

#[derive(Debug, Deserialize)]
pub struct CountedTaxon {
    pub id: u64,
    #[serde(default)]
    pub observations_count: u64,
    pub iconic_taxon_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaxonPage {
    #[serde(default)]
    pub results: Vec<TaxonDetail>,
}

#[derive(Debug, Deserialize)]
pub struct TaxonDetail {
    pub preferred_common_name: Option<String>,
    pub name: Option<String>,
    pub default_photo: Option<TaxonPhoto>,
}

#[derive(Debug, Deserialize)]
pub struct TaxonPhoto {
    pub square_url: Option<String>,
}
