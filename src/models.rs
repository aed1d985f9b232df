use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub category: String,
    pub term: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Shown when a generated challenge is unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_challenge: Option<String>,
}

/// Achievement unlocked once `threshold` cards are understood, either within
/// `category` or across the whole catalog when no category is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unseen,
    Review,
    Understood,
}

impl Status {
    /// Cards still to be studied in a session
    pub fn needs_study(self) -> bool {
        matches!(self, Status::Unseen | Status::Review)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Unseen => write!(f, "unseen"),
            Status::Review => write!(f, "review"),
            Status::Understood => write!(f, "understood"),
        }
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unseen" => Ok(Status::Unseen),
            "review" => Ok(Status::Review),
            "understood" => Ok(Status::Understood),
            _ => Err(anyhow::anyhow!("Invalid card status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStatus {
    pub card_id: String,
    pub status: Status,
}

impl CardStatus {
    pub fn unseen(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            status: Status::Unseen,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub understood_count: usize,
    pub review_count: usize,
    pub unseen_count: usize,
}

impl CardStats {
    pub fn from_statuses(statuses: &[CardStatus]) -> Self {
        statuses
            .iter()
            .fold(CardStats::default(), |mut acc, cs| {
                match cs.status {
                    Status::Understood => acc.understood_count += 1,
                    Status::Review => acc.review_count += 1,
                    Status::Unseen => acc.unseen_count += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.understood_count + self.review_count + self.unseen_count
    }
}
