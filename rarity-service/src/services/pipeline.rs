use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{RarityError, SelectionError};
use crate::models::query::ObserverQuery;
use crate::services::aggregator::{aggregate, ensure_sufficient};
use crate::services::enrichment::EnrichmentEngine;
use crate::services::presenter::{assemble, LeastObservedReport};
use crate::services::selector::select_least;
use crate::AppState;

fn selection_failure(err: SelectionError, query: &ObserverQuery) -> RarityError {
    match err {
        SelectionError::TooFewEntries { available, requested } => RarityError::InsufficientData {
            observer_id: query.observer_id.clone(),
            available,
            requested,
            species_type: query.species_type_filter,
            quality_grade: query.quality_grade_filter,
        },
        SelectionError::ZeroRequested => RarityError::InvalidInput(err.to_string()),
    }
}

pub async fn find_least_observed(
    state: &AppState,
    query: ObserverQuery,
) -> Result<LeastObservedReport, RarityError> {
    let span = info_span!(
        "least_observed",
        request_id = %Uuid::new_v4(),
        observer_id = %query.observer_id
    );
    run(state, query).instrument(span).await
}

async fn run(state: &AppState, query: ObserverQuery) -> Result<LeastObservedReport, RarityError> {
    let settings = &state.settings;

    let table = aggregate(
        state.source.as_ref(),
        &settings.species_counts_url,
        &settings.retry,
        &query,
    )
    .await?;
    ensure_sufficient(&table, &query)?;

    let selected =
        select_least(&table, query.result_count).map_err(|e| selection_failure(e, &query))?;
    let species_ids: Vec<u64> = selected.iter().map(|e| e.species_id).collect();

    let engine = EnrichmentEngine::new(
        Arc::clone(&state.source),
        settings.taxa_url.clone(),
        settings.retry,
        settings.enrich_workers,
        settings.strict_fallback,
    );
    let enriched = engine.enrich_all(&species_ids).await?;

    let results = assemble(
        &selected,
        &enriched,
        &query.observer_id,
        &settings.observation_link_base,
    );
    info!(results = results.len(), "Least observed species ready");

    Ok(LeastObservedReport {
        distinct_species: table.len(),
        total_observations: table.total_observations(),
        query,
        results,
    })
}
