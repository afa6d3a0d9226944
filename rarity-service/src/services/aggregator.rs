use tracing::{debug, info};

use crate::error::{GatewayError, RarityError};
use crate::models::inaturalist::SpeciesCountsPage;
use crate::models::query::ObserverQuery;
use crate::models::species::{FrequencyTable, SpeciesCountEntry, UNKNOWN_ICONIC_TYPE};
use crate::services::gateway::{fetch_with_retries, RetryPolicy, STATUS_UNPROCESSABLE};
use crate::services::source::HttpSource;

pub const PAGE_SIZE: u64 = 100;
const COUNT_FIELDS: &str =
    "taxon.name,taxon.rank,taxon.observations_count,taxon.iconic_taxon_name";
const ANY_QUALITY_GRADE: &str = "any";

fn quality_grade_param(query: &ObserverQuery) -> &'static str {
    query
        .quality_grade_filter
        .map(|g| g.api_name())
        .unwrap_or(ANY_QUALITY_GRADE)
}

fn base_params(query: &ObserverQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("user_id".to_string(), query.observer_id.clone()),
        ("fields".to_string(), COUNT_FIELDS.to_string()),
        ("per_page".to_string(), PAGE_SIZE.to_string()),
        ("quality_grade".to_string(), quality_grade_param(query).to_string()),
    ];
    if let Some(species_type) = query.species_type_filter {
        params.push(("iconic_taxa".to_string(), species_type.api_name().to_string()));
    }
    params
}

/// Walk every page of the observer's species counts and build the frequency table.
///
/// Pages are fetched strictly in order since the stop condition depends on the
/// `total_results` reported by the previous page.
pub async fn aggregate(
    source: &(dyn HttpSource + Send + Sync),
    url: &str,
    policy: &RetryPolicy,
    query: &ObserverQuery,
) -> Result<FrequencyTable, RarityError> {
    let params = base_params(query);
    let quality_grade = quality_grade_param(query);
    let mut table = FrequencyTable::new();
    let mut page: u64 = 1;

    loop {
        let mut page_params = params.clone();
        page_params.push(("page".to_string(), page.to_string()));

        let response = fetch_with_retries(source, url, &page_params, policy)
            .await
            .map_err(|e| RarityError::upstream(format!("species counts page {}", page), e))?;

        if response.status == STATUS_UNPROCESSABLE {
            info!(observer_id = %query.observer_id, page, "Observer not found upstream");
            return Err(RarityError::ObserverNotFound(query.observer_id.clone()));
        }

        let data: SpeciesCountsPage = serde_json::from_str(&response.body).map_err(|e| {
            RarityError::upstream(
                format!("species counts page {}", page),
                GatewayError::Decode(e.to_string()),
            )
        })?;

        for result in data.results {
            let taxon = result.taxon;
            table.upsert(SpeciesCountEntry {
                species_id: taxon.id,
                observation_count: taxon.observations_count,
                iconic_type: taxon
                    .iconic_taxon_name
                    .unwrap_or_else(|| UNKNOWN_ICONIC_TYPE.to_string()),
                quality_grade: quality_grade.to_string(),
            });
        }

        debug!(
            observer_id = %query.observer_id,
            page,
            total_results = data.total_results,
            distinct_species = table.len(),
            "Fetched species counts page"
        );

        if data.total_results <= page * PAGE_SIZE {
            break;
        }
        page += 1;
    }

    info!(
        observer_id = %query.observer_id,
        pages = page,
        distinct_species = table.len(),
        total_observations = table.total_observations(),
        "Species counts aggregated"
    );
    Ok(table)
}

pub fn ensure_sufficient(table: &FrequencyTable, query: &ObserverQuery) -> Result<(), RarityError> {
    if table.len() < query.result_count {
        return Err(RarityError::InsufficientData {
            observer_id: query.observer_id.clone(),
            available: table.len(),
            requested: query.result_count,
            species_type: query.species_type_filter,
            quality_grade: query.quality_grade_filter,
        });
    }
    Ok(())
}
