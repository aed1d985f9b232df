//! The progress reducer: per-card status, earned badges and the category filter.
//!
//! `ProgressState::reduce` is pure. Badge evaluation, persistence and
//! notifications happen in [`crate::store::ProgressStore`] after each reduction.
use std::collections::HashSet;

use serde::Serialize;

use crate::{
    catalog::Catalog,
    models::{Card, CardStats, CardStatus, Status},
    persistence::PersistedSnapshot,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadCards(Vec<Card>),
    MarkUnderstood(String),
    MarkReview(String),
    SetFilter(Option<String>),
    AwardBadge(String),
    ResetProgress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    card_statuses: Vec<CardStatus>,
    earned_badges: Vec<String>,
    current_filter: Option<String>,
    card_stats: CardStats,
}

impl ProgressState {
    /// Every catalog card unseen, nothing earned, no filter
    pub fn initial(catalog: &Catalog) -> Self {
        Self::from_parts(
            catalog
                .cards()
                .iter()
                .map(|c| CardStatus::unseen(&c.id))
                .collect(),
            Vec::new(),
            None,
        )
    }

    pub(crate) fn from_parts(
        card_statuses: Vec<CardStatus>,
        earned_badges: Vec<String>,
        current_filter: Option<String>,
    ) -> Self {
        let card_stats = CardStats::from_statuses(&card_statuses);
        Self {
            card_statuses,
            earned_badges,
            current_filter,
            card_stats,
        }
    }

    pub fn reduce(self, action: &Action) -> Self {
        match action {
            Action::LoadCards(cards) => {
                let mut seen = HashSet::new();
                Self::from_parts(
                    cards
                        .iter()
                        .filter(|c| seen.insert(c.id.as_str()))
                        .map(|c| CardStatus::unseen(&c.id))
                        .collect(),
                    self.earned_badges,
                    self.current_filter,
                )
            }
            Action::MarkUnderstood(card_id) => self.with_status(card_id, Status::Understood),
            Action::MarkReview(card_id) => self.with_status(card_id, Status::Review),
            Action::SetFilter(filter) => Self {
                current_filter: filter.clone(),
                ..self
            },
            Action::AwardBadge(badge_id) => {
                if self.has_badge(badge_id) {
                    return self;
                }
                let mut earned_badges = self.earned_badges;
                earned_badges.push(badge_id.clone());
                Self {
                    earned_badges,
                    ..self
                }
            }
            Action::ResetProgress => Self::from_parts(
                self.card_statuses
                    .into_iter()
                    .map(|cs| CardStatus::unseen(cs.card_id))
                    .collect(),
                Vec::new(),
                None,
            ),
        }
    }

    fn with_status(self, card_id: &str, status: Status) -> Self {
        if !self.card_statuses.iter().any(|cs| cs.card_id == card_id) {
            return self;
        }
        let card_statuses = self
            .card_statuses
            .into_iter()
            .map(|cs| {
                if cs.card_id == card_id {
                    CardStatus { status, ..cs }
                } else {
                    cs
                }
            })
            .collect();
        Self::from_parts(card_statuses, self.earned_badges, self.current_filter)
    }

    pub fn card_statuses(&self) -> &[CardStatus] {
        &self.card_statuses
    }

    pub fn earned_badges(&self) -> &[String] {
        &self.earned_badges
    }

    pub fn current_filter(&self) -> Option<&str> {
        self.current_filter.as_deref()
    }

    pub fn stats(&self) -> CardStats {
        self.card_stats
    }

    pub fn status_of(&self, card_id: &str) -> Option<Status> {
        self.card_statuses
            .iter()
            .find(|cs| cs.card_id == card_id)
            .map(|cs| cs.status)
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.earned_badges.iter().any(|b| b == badge_id)
    }

    /// The durable subset of this state
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            card_statuses: self.card_statuses.clone(),
            earned_badges: self.earned_badges.clone(),
            current_filter: self.current_filter.clone(),
        }
    }

    /// Cards in the active category still needing study, in catalog order
    pub fn session_deck<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Card> {
        catalog
            .cards()
            .iter()
            .filter(|card| {
                self.current_filter
                    .as_deref()
                    .is_none_or(|filter| card.category == filter)
            })
            .filter(|card| self.status_of(&card.id).is_none_or(Status::needs_study))
            .collect()
    }
}
