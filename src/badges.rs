use crate::{
    catalog::Catalog,
    models::{Badge, Status},
    progress::ProgressState,
};

fn understood_count(badge: &Badge, state: &ProgressState, catalog: &Catalog) -> usize {
    match &badge.category {
        Some(category) => catalog
            .cards()
            .iter()
            .filter(|card| &card.category == category)
            .filter(|card| state.status_of(&card.id) == Some(Status::Understood))
            .count(),
        None => state.stats().understood_count,
    }
}

/// Ids of badges whose threshold is met but which are not yet earned, in
/// catalog order.
pub fn evaluate(state: &ProgressState, catalog: &Catalog) -> Vec<String> {
    catalog
        .badges()
        .iter()
        .filter(|badge| !state.has_badge(&badge.id))
        .filter(|badge| understood_count(badge, state, catalog) >= badge.threshold as usize)
        .map(|badge| badge.id.clone())
        .collect()
}
