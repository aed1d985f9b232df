use askama::Template;

use crate::{
    challenge::{ChallengeOutcome, ChallengeView},
    models::{Badge, Card, CardStats, Status},
};

pub struct FilterChip {
    pub label: String,
    pub value: String,
    pub active: bool,
}

pub struct BadgeView {
    pub icon: String,
    pub name: String,
    pub description: String,
}

impl From<&Badge> for BadgeView {
    fn from(badge: &Badge) -> Self {
        Self {
            icon: badge.icon.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
        }
    }
}

pub struct CardView {
    pub id: String,
    pub category: String,
    pub term: String,
    pub definition: String,
    pub example: Option<String>,
    pub in_review: bool,
}

impl CardView {
    pub fn new(card: &Card, status: Option<Status>) -> Self {
        Self {
            id: card.id.clone(),
            category: card.category.clone(),
            term: card.term.clone(),
            definition: card.definition.clone(),
            example: card.example.clone(),
            in_review: status == Some(Status::Review),
        }
    }
}

pub struct ChallengePanel {
    pub card_id: String,
    pub term: String,
    pub loading: bool,
    pub text: Option<String>,
    pub notice: Option<String>,
    /// The notice is an error rather than an explanation
    pub is_error: bool,
}

impl ChallengePanel {
    pub fn new(card: &Card, view: ChallengeView) -> Self {
        let is_error = matches!(
            view.outcome,
            Some(ChallengeOutcome::Failed { .. } | ChallengeOutcome::RateLimited { .. })
        );
        Self {
            card_id: card.id.clone(),
            term: card.term.clone(),
            loading: view.loading,
            text: view.outcome.as_ref().and_then(|o| o.text()).map(str::to_string),
            notice: view.outcome.as_ref().and_then(|o| o.notice()).map(str::to_string),
            is_error,
        }
    }
}

#[derive(Template)]
#[template(path = "deck.html")]
pub struct DeckTemplate {
    pub stats: CardStats,
    pub total: usize,
    pub chips: Vec<FilterChip>,
    pub all_active: bool,
    pub current_filter: Option<String>,
    pub badges: Vec<BadgeView>,
    pub card: Option<CardView>,
    pub remaining: usize,
    pub challenge: Option<ChallengePanel>,
    pub toasts: Vec<String>,
    pub storage_warning: bool,
}
