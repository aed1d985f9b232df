use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    catalog::Catalog,
    challenge::{ChallengeGateway, HttpChallengeClient},
    config::AppConfig,
    events::{NotificationHub, Toasts},
    persistence::ProgressPersistence,
    routes,
    store::ProgressStore,
};

const TOAST_CAPACITY: usize = 8;

pub struct AppState {
    pub store: Mutex<ProgressStore>,
    pub gateway: ChallengeGateway<HttpChallengeClient>,
    pub events: Arc<NotificationHub>,
    pub toasts: Arc<Toasts>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        persistence: ProgressPersistence,
        config: &AppConfig,
    ) -> Arc<Self> {
        let events = Arc::new(NotificationHub::new());
        let toasts = Arc::new(Toasts::new(TOAST_CAPACITY));
        {
            let toasts = toasts.clone();
            events.on_any(move |notification| {
                info!("🔔 {}", notification.message());
                toasts.push(notification.message());
            });
        }
        let store = ProgressStore::open(Arc::new(catalog), persistence, events.clone());
        let client = HttpChallengeClient::new(
            config.challenge_api_url.clone(),
            config.challenge_api_key.clone(),
            config.challenge_timeout,
        );
        Arc::new(Self {
            store: Mutex::new(store),
            gateway: ChallengeGateway::new(client, config.challenge_cooldown),
            events,
            toasts,
        })
    }
}

pub fn init_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::deck::show_deck))
        .route("/styles.css", get(routes::styles))
        .route("/health", get(routes::health))
        .route("/filter", post(routes::deck::set_filter))
        .route("/reset", post(routes::deck::reset_progress))
        .route("/cards/{id}/understood", post(routes::deck::mark_understood))
        .route("/cards/{id}/review", post(routes::deck::mark_review))
        .route(
            "/cards/{id}/challenge",
            post(routes::challenge::request_challenge),
        )
        .route(
            "/cards/{id}/challenge/dismiss",
            post(routes::challenge::dismiss_challenge),
        )
        .route("/api/progress", get(routes::deck::progress_json))
        .route(
            "/api/cards/{id}/challenge",
            get(routes::challenge::challenge_json),
        )
        .with_state(state)
}
