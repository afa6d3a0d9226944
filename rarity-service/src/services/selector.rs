use crate::error::SelectionError;
use crate::models::species::{FrequencyTable, SpeciesCountEntry};

/// The `n` least-observed entries, ascending by count with ties broken by species id.
pub fn select_least(table: &FrequencyTable, n: usize) -> Result<Vec<SpeciesCountEntry>, SelectionError> {
    if n == 0 {
        return Err(SelectionError::ZeroRequested);
    }
    if n > table.len() {
        return Err(SelectionError::TooFewEntries {
            requested: n,
            available: table.len(),
        });
    }

    let mut ranked: Vec<&SpeciesCountEntry> = table.entries().collect();
    ranked.sort_unstable_by_key(|e| (e.observation_count, e.species_id));
    Ok(ranked.into_iter().take(n).cloned().collect())
}
