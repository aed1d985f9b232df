use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use reqwest::Url;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    challenge::ChallengeOutcome, errors::ApiError, events::Notification, models::Card,
    router::AppState,
};

async fn ensure_card(state: &AppState, card_id: &str) -> Result<Card, ApiError> {
    state
        .store
        .lock()
        .await
        .card(card_id)
        .cloned()
        .ok_or_else(|| ApiError::CardNotFound(card_id.to_string()))
}

pub async fn request_challenge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = ensure_card(&state, &id).await?;
    match state.gateway.request(&card, Utc::now()).await {
        Ok(Some(ChallengeOutcome::RateLimited { message })) => {
            warn!("Challenge endpoint rate limited card {}: {}", id, message);
        }
        Ok(Some(outcome)) => info!("Challenge for {} resolved: {:?}", id, outcome),
        Ok(None) => debug!("Challenge for {} was dismissed before it completed", id),
        Err(throttled) => {
            state.events.emit(&Notification::ChallengeThrottled {
                card_id: id.clone(),
                wait_secs: throttled.wait_secs,
            });
        }
    }
    Ok(Redirect::to(&deck_location(&id)))
}

/// The deck page with `card_id`'s challenge panel in focus
fn deck_location(card_id: &str) -> String {
    Url::parse_with_params("http://localhost/", [("challenge", card_id)])
        .ok()
        .and_then(|url| url.query().map(|query| format!("/?{query}")))
        .unwrap_or_else(|| "/".to_string())
}

pub async fn dismiss_challenge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_card(&state, &id).await?;
    state.gateway.dismiss(&id);
    Ok(Redirect::to("/"))
}

pub async fn challenge_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_card(&state, &id).await?;
    Ok(Json(state.gateway.view(&id)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deck_location_encodes_the_card_id() {
        assert_eq!(deck_location("ai-concept-04"), "/?challenge=ai-concept-04");
        assert_eq!(deck_location("a b&c"), "/?challenge=a+b%26c");
    }
}
