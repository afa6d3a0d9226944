use crate::error::ApiError;
use crate::models::query::{ApiQueryParams, ObserverQuery};
use crate::models::responses::LeastObservedResponse;
use crate::services::pipeline::find_least_observed;
use crate::services::presenter::classify;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;

pub async fn least_observed(
    State(state): State<AppState>,
    Query(params): Query<ApiQueryParams>,
) -> Result<Json<LeastObservedResponse>, ApiError> {
    let result = match ObserverQuery::from_api(&params, state.settings.max_result_count) {
        Ok(query) => find_least_observed(&state, query).await,
        Err(e) => Err(e),
    };

    let report = result.map_err(|e| {
        classify(&e);
        ApiError(e)
    })?;

    Ok(Json(LeastObservedResponse {
        observer_id: report.query.observer_id.clone(),
        species_type: report.query.species_type_filter.map(|t| t.to_string()),
        quality_grade: report.query.quality_grade_filter.map(|g| g.to_string()),
        result_count: report.query.result_count,
        distinct_species: report.distinct_species,
        total_observations: report.total_observations,
        generated_at: Utc::now().to_rfc3339(),
        results: report.results,
    }))
}
