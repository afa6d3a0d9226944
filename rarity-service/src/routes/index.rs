use crate::models::query::{ObserverForm, ObserverQuery};
use crate::services::pipeline::find_least_observed;
use crate::services::presenter::classify;
use crate::utils::html::{render_page, PageContent};
use crate::AppState;
use axum::{
    extract::{Form, State},
    response::Html,
};
use tracing::info;

pub async fn show_form() -> Html<String> {
    Html(render_page(PageContent::Form))
}

/// Every outcome, including failures, renders as a page with status 200.
pub async fn submit_form(State(state): State<AppState>, Form(form): Form<ObserverForm>) -> Html<String> {
    let outcome = match ObserverQuery::from_form(&form, state.settings.max_result_count) {
        Ok(query) => {
            info!(observer_id = %query.observer_id, result_count = query.result_count, "Form submitted");
            find_least_observed(&state, query).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(report) => Html(render_page(PageContent::Results(&report))),
        Err(e) => Html(render_page(PageContent::Error(&classify(&e)))),
    }
}
