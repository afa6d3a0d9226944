use serde::{Deserialize, Serialize};

use crate::models::species::EnrichedResult;

#[derive(Deserialize, Serialize, Debug)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct LeastObservedResponse {
    pub observer_id: String,
    pub species_type: Option<String>,
    pub quality_grade: Option<String>,
    pub result_count: usize,
    pub distinct_species: usize,
    pub total_observations: u64,
    pub generated_at: String,
    pub results: Vec<EnrichedResult>,
}
