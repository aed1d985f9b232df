//! Rate-limited requests for generated practice challenges, with fallback to
//! a card's static challenge.
pub(crate) mod client;

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::Card;

pub use client::HttpChallengeClient;

pub const DEFAULT_COOLDOWN_SECS: i64 = 60;

/// Prefixes of challenge texts that report an upstream generation failure
pub const FAILURE_PREFIXES: [&str; 3] = [
    "Failed to generate challenge:",
    "Could not generate a challenge for",
    "An error occurred while generating the challenge",
];

pub const BUSY_NOTICE: &str = "The AI is a bit busy... Here's a standard challenge for this card:";
pub const DECLINED_NOTICE: &str =
    "The AI couldn't generate a new challenge... Here's a standard one for this card:";
pub const UNREACHABLE_NOTICE: &str =
    "Couldn't connect to the AI for a live challenge. Here's a standard one:";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
const EMPTY_CHALLENGE_MESSAGE: &str = "The AI returned an empty challenge.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub card_term: String,
    pub card_definition: String,
}

impl From<&Card> for ChallengeRequest {
    fn from(card: &Card) -> Self {
        Self {
            card_term: card.term.clone(),
            card_definition: card.definition.clone(),
        }
    }
}

/// What the challenge endpoint answered, short of a network failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeReply {
    Text(String),
    RateLimited(String),
    Rejected { status: u16, message: String },
}

pub trait ChallengeClient: Send + Sync {
    /// `Err` means the call never produced a usable HTTP response
    fn generate(
        &self,
        request: &ChallengeRequest,
    ) -> impl Future<Output = Result<ChallengeReply>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeOutcome {
    Generated { text: String },
    /// The card's static challenge, shown with a notice explaining why
    Standard { text: String, notice: String },
    Failed { message: String },
    RateLimited { message: String },
}

impl ChallengeOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ChallengeOutcome::Generated { text } | ChallengeOutcome::Standard { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    /// Notice or error shown above (or instead of) the challenge text
    pub fn notice(&self) -> Option<&str> {
        match self {
            ChallengeOutcome::Generated { .. } => None,
            ChallengeOutcome::Standard { notice, .. } => Some(notice),
            ChallengeOutcome::Failed { message } | ChallengeOutcome::RateLimited { message } => {
                Some(message)
            }
        }
    }
}

fn is_failure_sentinel(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || FAILURE_PREFIXES.iter().any(|p| text.starts_with(p))
}

fn standard_or(card: &Card, notice: &str, message: impl FnOnce() -> String) -> ChallengeOutcome {
    match &card.static_challenge {
        Some(text) => ChallengeOutcome::Standard {
            text: text.clone(),
            notice: notice.to_string(),
        },
        None => ChallengeOutcome::Failed { message: message() },
    }
}

/// Decide what the learner sees for `card` given the endpoint's answer.
/// A rate limit is always reported as is, never masked by the static challenge.
pub fn resolve(card: &Card, reply: Result<ChallengeReply>) -> ChallengeOutcome {
    match reply {
        Ok(ChallengeReply::Text(text)) if is_failure_sentinel(&text) => {
            standard_or(card, DECLINED_NOTICE, || {
                match text.trim() {
                    "" => EMPTY_CHALLENGE_MESSAGE.to_string(),
                    trimmed => trimmed.to_string(),
                }
            })
        }
        Ok(ChallengeReply::Text(text)) => ChallengeOutcome::Generated {
            text: text.trim().to_string(),
        },
        Ok(ChallengeReply::RateLimited(message)) => ChallengeOutcome::RateLimited { message },
        Ok(ChallengeReply::Rejected { message, .. }) => {
            standard_or(card, BUSY_NOTICE, || message)
        }
        Err(e) => standard_or(card, UNREACHABLE_NOTICE, || format!("{e:#}")),
    }
}

/// A request for one card was made too recently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled {
    pub wait_secs: i64,
}

impl std::fmt::Display for Throttled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Please wait {}s before generating another challenge for this card.",
            self.wait_secs
        )
    }
}

/// Proof of admission for one request; completing with a ticket that is no
/// longer active discards the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    card_id: String,
    seq: u64,
}

impl Ticket {
    pub fn card_id(&self) -> &str {
        &self.card_id
    }
}

#[derive(Debug, Default, Clone)]
struct Slot {
    last_requested: Option<DateTime<Utc>>,
    active: Option<u64>,
    outcome: Option<ChallengeOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub loading: bool,
    pub outcome: Option<ChallengeOutcome>,
}

pub struct ChallengeGateway<C> {
    client: C,
    cooldown: TimeDelta,
    slots: DashMap<String, Slot>,
    next_seq: AtomicU64,
}

impl<C: ChallengeClient> ChallengeGateway<C> {
    pub fn new(client: C, cooldown: TimeDelta) -> Self {
        Self {
            client,
            cooldown,
            slots: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Check the card's cooldown and, if clear, stamp `now` and open a request.
    /// The check and the stamp happen under the card's entry lock.
    pub fn admit(&self, card_id: &str, now: DateTime<Utc>) -> Result<Ticket, Throttled> {
        let mut slot = self.slots.entry(card_id.to_string()).or_default();
        if let Some(last) = slot.last_requested {
            let elapsed = now - last;
            if elapsed < self.cooldown {
                let remaining_ms = (self.cooldown - elapsed)
                    .num_milliseconds()
                    .min(self.cooldown.num_milliseconds());
                let wait_secs = (remaining_ms + 999) / 1000;
                debug!("Challenge for {} throttled for {}s", card_id, wait_secs);
                return Err(Throttled { wait_secs });
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        slot.last_requested = Some(now);
        slot.active = Some(seq);
        slot.outcome = None;
        Ok(Ticket {
            card_id: card_id.to_string(),
            seq,
        })
    }

    /// Record the outcome if `ticket` is still the card's active request.
    /// Returns false when the request was dismissed or superseded.
    pub fn complete(&self, ticket: &Ticket, outcome: ChallengeOutcome) -> bool {
        let Some(mut slot) = self.slots.get_mut(&ticket.card_id) else {
            return false;
        };
        if slot.active != Some(ticket.seq) {
            warn!(
                "Discarding stale challenge result for {} (request {})",
                ticket.card_id, ticket.seq
            );
            return false;
        }
        slot.active = None;
        slot.outcome = Some(outcome);
        true
    }

    /// Close the card's challenge: any in-flight result will be discarded.
    /// The cooldown stamp is kept.
    pub fn dismiss(&self, card_id: &str) {
        if let Some(mut slot) = self.slots.get_mut(card_id) {
            slot.active = None;
            slot.outcome = None;
        }
    }

    pub fn view(&self, card_id: &str) -> ChallengeView {
        self.slots
            .get(card_id)
            .map(|slot| ChallengeView {
                loading: slot.active.is_some(),
                outcome: slot.outcome.clone(),
            })
            .unwrap_or_default()
    }

    /// Admit, call the endpoint and record the outcome. `Ok(None)` means the
    /// request was dismissed while in flight.
    pub async fn request(
        &self,
        card: &Card,
        now: DateTime<Utc>,
    ) -> Result<Option<ChallengeOutcome>, Throttled> {
        let ticket = self.admit(&card.id, now)?;
        info!("Requesting challenge for {} ({})", card.id, card.term);
        let reply = self.client.generate(&ChallengeRequest::from(card)).await;
        if let Err(e) = &reply {
            warn!("Challenge request for {} failed: {:#}", card.id, e);
        }
        let outcome = resolve(card, reply);
        debug!("Challenge outcome for {}: {:?}", card.id, outcome);
        Ok(self.complete(&ticket, outcome.clone()).then_some(outcome))
    }
}
