use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, RarityError};
use crate::models::inaturalist::TaxonPage;
use crate::services::gateway::{fetch_with_retries, RetryPolicy};
use crate::services::source::{HttpSource, Source};

pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://www.inaturalist.org/assets/iconic_taxa/unknown-75px.png";
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonInfo {
    pub display_name: String,
    pub image_url: String,
}

impl TaxonInfo {
    pub fn placeholder(species_id: u64) -> Self {
        Self {
            display_name: format!("Unknown species (taxon {})", species_id),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

/// Result of one taxon lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum TaxonOutcome {
    Found(TaxonInfo),
    /// The API answered but knows nothing about the taxon.
    Unknown,
    Failed(GatewayError),
}

pub async fn enrich(
    source: &(dyn HttpSource + Send + Sync),
    taxa_url: &str,
    policy: &RetryPolicy,
    species_id: u64,
) -> TaxonOutcome {
    let url = format!("{}/{}", taxa_url.trim_end_matches('/'), species_id);

    let response = match fetch_with_retries(source, &url, &[], policy).await {
        Ok(response) => response,
        Err(e) => return TaxonOutcome::Failed(e),
    };
    if !response.is_success() {
        return TaxonOutcome::Failed(GatewayError::Status {
            status: response.status,
            url,
        });
    }

    let page: TaxonPage = match serde_json::from_str(&response.body) {
        Ok(page) => page,
        Err(e) => return TaxonOutcome::Failed(GatewayError::Decode(e.to_string())),
    };

    match page.results.into_iter().next() {
        Some(detail) => {
            let display_name = detail
                .preferred_common_name
                .filter(|n| !n.trim().is_empty())
                .or(detail.name.filter(|n| !n.trim().is_empty()))
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            let image_url = detail
                .default_photo
                .and_then(|p| p.square_url)
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());
            TaxonOutcome::Found(TaxonInfo {
                display_name,
                image_url,
            })
        }
        None => TaxonOutcome::Unknown,
    }
}

/// Looks up names and thumbnails for a batch of species.
///
/// Lookups first run concurrently on a request-scoped task group capped at `workers`
/// in-flight tasks. Anything that failed or came back unknown is retried one by one once
/// the group has drained. A species that is still unknown after the second pass gets a
/// placeholder row; one that still fails gets a placeholder too, unless `strict_fallback`
/// is set, in which case the whole batch fails.
pub struct EnrichmentEngine {
    source: Source,
    taxa_url: String,
    policy: RetryPolicy,
    workers: usize,
    strict_fallback: bool,
}

impl EnrichmentEngine {
    pub fn new(
        source: Source,
        taxa_url: impl Into<String>,
        policy: RetryPolicy,
        workers: usize,
        strict_fallback: bool,
    ) -> Self {
        Self {
            source,
            taxa_url: taxa_url.into(),
            policy,
            workers: workers.max(1),
            strict_fallback,
        }
    }

    pub async fn enrich_all(&self, species_ids: &[u64]) -> Result<HashMap<u64, TaxonInfo>, RarityError> {
        let mut resolved = HashMap::with_capacity(species_ids.len());
        let mut failed = self.concurrent_pass(species_ids, &mut resolved).await;

        if failed.is_empty() {
            return Ok(resolved);
        }

        failed.sort_unstable();
        info!(count = failed.len(), "Retrying taxon lookups sequentially");

        for species_id in failed {
            let info = match enrich(self.source.as_ref(), &self.taxa_url, &self.policy, species_id).await {
                TaxonOutcome::Found(info) => info,
                TaxonOutcome::Unknown => {
                    debug!(species_id, "Taxon still unknown, using placeholder");
                    TaxonInfo::placeholder(species_id)
                }
                TaxonOutcome::Failed(e) if self.strict_fallback => {
                    return Err(RarityError::upstream(format!("taxon {}", species_id), e));
                }
                TaxonOutcome::Failed(e) => {
                    warn!(species_id, error = %e, "Taxon lookup failed twice, using placeholder");
                    TaxonInfo::placeholder(species_id)
                }
            };
            resolved.insert(species_id, info);
        }

        Ok(resolved)
    }

    /// Returns the species ids that need a second, sequential attempt.
    async fn concurrent_pass(
        &self,
        species_ids: &[u64],
        resolved: &mut HashMap<u64, TaxonInfo>,
    ) -> Vec<u64> {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for &species_id in species_ids {
            let source = Arc::clone(&self.source);
            let taxa_url = self.taxa_url.clone();
            let policy = self.policy;
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = enrich(source.as_ref(), &taxa_url, &policy, species_id).await;
                (species_id, outcome)
            });
        }

        let mut pending: HashSet<u64> = species_ids.iter().copied().collect();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((species_id, outcome)) => {
                    pending.remove(&species_id);
                    match outcome {
                        TaxonOutcome::Found(info) => {
                            resolved.insert(species_id, info);
                        }
                        TaxonOutcome::Unknown => {
                            debug!(species_id, "Taxon unknown, deferring");
                            failed.push(species_id);
                        }
                        TaxonOutcome::Failed(e) => {
                            warn!(species_id, error = %e, "Taxon lookup failed, deferring");
                            failed.push(species_id);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Taxon lookup task aborted"),
            }
        }

        // ids whose task panicked never reported back
        failed.extend(pending);
        failed
    }
}
