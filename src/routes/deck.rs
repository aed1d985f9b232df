use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::ApiError,
    models::{Badge, CardStats},
    progress::{Action, ProgressState},
    router::AppState,
    routes::render_deck,
};

#[derive(Deserialize)]
pub struct FilterForm {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct DeckQuery {
    /// Card whose challenge panel should be shown
    pub challenge: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub progress: ProgressState,
    pub stats: CardStats,
    pub earned_badges: Vec<Badge>,
    pub categories: Vec<String>,
    pub session_remaining: usize,
}

pub async fn show_deck(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeckQuery>,
) -> Result<impl IntoResponse, ApiError> {
    render_deck(&state, query.challenge.as_deref()).await
}

async fn mark(state: &AppState, action: Action, card_id: &str) -> Result<Redirect, ApiError> {
    let mut store = state.store.lock().await;
    if store.card(card_id).is_none() {
        return Err(ApiError::CardNotFound(card_id.to_string()));
    }
    let earned = store.dispatch(action);
    if !earned.is_empty() {
        info!("Card {} unlocked {:?}", card_id, earned);
    }
    Ok(Redirect::to("/"))
}

pub async fn mark_understood(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    mark(&state, Action::MarkUnderstood(id.clone()), &id).await
}

pub async fn mark_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    mark(&state, Action::MarkReview(id.clone()), &id).await
}

pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FilterForm>,
) -> impl IntoResponse {
    let filter = form.category.filter(|c| !c.trim().is_empty());
    state.store.lock().await.dispatch(Action::SetFilter(filter));
    Redirect::to("/")
}

pub async fn reset_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Resetting all progress");
    state.store.lock().await.dispatch(Action::ResetProgress);
    Redirect::to("/")
}

pub async fn progress_json(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.lock().await;
    let progress = store.state().clone();
    Json(ProgressResponse {
        stats: progress.stats(),
        earned_badges: store.earned_badges().into_iter().cloned().collect(),
        categories: store
            .catalog()
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect(),
        session_remaining: progress.session_deck(store.catalog()).len(),
        progress,
    })
}
