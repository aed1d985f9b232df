use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info};

use crate::{
    badges,
    catalog::Catalog,
    events::{Notification, NotificationHub},
    models::{Badge, Card},
    persistence::ProgressPersistence,
    progress::{Action, ProgressState},
};

/// Owns the progress state and runs everything that follows a reduction:
/// badge awards, persistence and notifications.
pub struct ProgressStore {
    catalog: Arc<Catalog>,
    state: ProgressState,
    persistence: ProgressPersistence,
    events: Arc<NotificationHub>,
}

impl ProgressStore {
    /// Restore persisted progress and award any badge it already qualifies for
    pub fn open(
        catalog: Arc<Catalog>,
        persistence: ProgressPersistence,
        events: Arc<NotificationHub>,
    ) -> Self {
        let state = persistence.load(&catalog);
        let mut store = Self {
            catalog,
            state,
            persistence,
            events,
        };
        let before = store.state.snapshot();
        let earned = store.award_pending();
        if store.state.snapshot() != before {
            store.persistence.save(&store.state.snapshot());
        }
        store.notify(&earned);
        store
    }

    /// Apply `action`, then award newly met badges. Returns the ids of the
    /// badges earned by this dispatch.
    pub fn dispatch(&mut self, action: Action) -> Vec<String> {
        debug!("Dispatching {:?}", action);
        let action = match action {
            Action::LoadCards(cards) => {
                self.catalog = Arc::new(self.catalog.with_cards(cards));
                Action::LoadCards(self.catalog.cards().to_vec())
            }
            action => action,
        };
        let before = self.state.snapshot();
        self.state = std::mem::take(&mut self.state).reduce(&action);
        let earned = self.award_pending();
        let after = self.state.snapshot();
        if after != before {
            self.persistence.save(&after);
        }
        self.notify(&earned);
        earned
    }

    fn award_pending(&mut self) -> Vec<String> {
        let before: HashSet<String> = self.state.earned_badges().iter().cloned().collect();
        for badge_id in badges::evaluate(&self.state, &self.catalog) {
            self.state = std::mem::take(&mut self.state).reduce(&Action::AwardBadge(badge_id));
        }
        self.state
            .earned_badges()
            .iter()
            .filter(|id| !before.contains(*id))
            .cloned()
            .collect()
    }

    fn notify(&self, earned: &[String]) {
        for badge in earned.iter().filter_map(|id| self.catalog.badge(id)) {
            info!("Badge earned: {} ({})", badge.name, badge.id);
            self.events.emit(&Notification::BadgeEarned(badge.clone()));
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.catalog.card(id)
    }

    /// The card currently up for study, if any
    pub fn current_card(&self) -> Option<&Card> {
        self.state.session_deck(&self.catalog).into_iter().next()
    }

    pub fn earned_badges(&self) -> Vec<&Badge> {
        self.state
            .earned_badges()
            .iter()
            .filter_map(|id| self.catalog.badge(id))
            .collect()
    }

    pub fn persistence_unavailable(&self) -> bool {
        self.persistence.is_unavailable()
    }
}
