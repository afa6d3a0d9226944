use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::query::{QualityGrade, SpeciesType};

/// Failure of a single outbound fetch after the retry budget is spent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("at least one result must be requested")]
    ZeroRequested,
    #[error("requested {requested} entries but only {available} are available")]
    TooFewEntries { requested: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum RarityError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("observer {0} not found")]
    ObserverNotFound(String),
    #[error("observer {observer_id} has {available} qualifying species, {requested} requested")]
    InsufficientData {
        observer_id: String,
        available: usize,
        requested: usize,
        species_type: Option<SpeciesType>,
        quality_grade: Option<QualityGrade>,
    },
    #[error("upstream failure at {context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: GatewayError,
    },
}

impl RarityError {
    pub fn upstream(context: impl Into<String>, source: GatewayError) -> Self {
        RarityError::Upstream {
            context: context.into(),
            source,
        }
    }

    /// Expected outcomes are rendered as friendly messages and not logged as failures.
    pub fn is_domain_outcome(&self) -> bool {
        !matches!(self, RarityError::Upstream { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            RarityError::InvalidInput(reason) => reason.clone(),
            RarityError::ObserverNotFound(observer_id) => format!(
                "The observer ID '{}' is invalid or does not exist. Please check it and try again.",
                observer_id
            ),
            RarityError::InsufficientData {
                observer_id,
                available,
                requested,
                species_type,
                quality_grade,
            } => {
                let noun = if *available == 1 {
                    "species type"
                } else {
                    "species types"
                };
                let mut filters = String::new();
                if let Some(species_type) = species_type {
                    filters.push_str(&format!(" in {}", species_type.label()));
                }
                if let Some(grade) = quality_grade {
                    filters.push_str(&format!(" with quality grade '{}'", grade.label()));
                }
                format!(
                    "Observer '{}' has only observed {} {}{}, but {} were requested. \
                     Please request fewer results or remove a filter.",
                    observer_id, available, noun, filters, requested
                )
            }
            RarityError::Upstream { .. } => {
                "The iNaturalist API could not be reached right now. Please try again later."
                    .to_string()
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RarityError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RarityError::ObserverNotFound(_) => StatusCode::NOT_FOUND,
            RarityError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RarityError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug)]
pub struct ApiError(pub RarityError);

impl From<RarityError> for ApiError {
    fn from(err: RarityError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.0.user_message(),
        }));
        (status, body).into_response()
    }
}
