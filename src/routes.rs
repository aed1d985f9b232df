pub(crate) mod challenge;
pub(crate) mod deck;

use std::sync::Arc;

use askama::Template;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::{
    errors::ApiError,
    router::AppState,
    templates::{BadgeView, CardView, ChallengePanel, DeckTemplate, FilterChip},
};

fn handle_render(res: askama::Result<String>) -> Result<Html<String>, ApiError> {
    match res {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            error!("Template rendering failed: {}", e);
            Err(ApiError::TemplateError(e))
        }
    }
}

/// Render the deck page for the store's current state, consuming pending toasts.
/// The challenge panel belongs to `focus` when it names a known card, otherwise
/// to the current card.
pub(crate) async fn render_deck(
    state: &AppState,
    focus: Option<&str>,
) -> Result<Html<String>, ApiError> {
    let store = state.store.lock().await;
    let progress = store.state();
    let catalog = store.catalog();
    let deck = progress.session_deck(catalog);
    let current_filter = progress.current_filter().map(str::to_string);

    let chips = catalog
        .categories()
        .into_iter()
        .map(|category| FilterChip {
            label: category.to_string(),
            value: category.to_string(),
            active: current_filter.as_deref() == Some(category),
        })
        .collect();
    let card = deck
        .first()
        .map(|card| CardView::new(card, progress.status_of(&card.id)));
    let challenge = focus
        .and_then(|id| catalog.card(id))
        .or_else(|| deck.first().copied())
        .map(|card| (card, state.gateway.view(&card.id)))
        .filter(|(_, view)| view.loading || view.outcome.is_some())
        .map(|(card, view)| ChallengePanel::new(card, view));

    let template = DeckTemplate {
        stats: progress.stats(),
        total: catalog.cards().len(),
        chips,
        all_active: current_filter.is_none(),
        current_filter,
        badges: store.earned_badges().into_iter().map(BadgeView::from).collect(),
        remaining: deck.len(),
        card,
        challenge,
        toasts: state.toasts.drain(),
        storage_warning: store.persistence_unavailable(),
    };
    handle_render(template.render())
}

pub async fn styles() -> Result<impl IntoResponse, ApiError> {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/css")
        .body(include_str!("../templates/styles.css").to_owned())?;

    Ok(response)
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.lock().await;
    let persistence = if store.persistence_unavailable() {
        "unavailable"
    } else {
        "ok"
    };
    Json(serde_json::json!({
        "status": "healthy",
        "cards": store.catalog().cards().len(),
        "persistence": persistence,
    }))
}
