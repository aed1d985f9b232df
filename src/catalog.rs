//! Static card and badge definitions the progress store works against
use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    import::import_delimited_cards,
    models::{Badge, Card},
};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Deserialize)]
struct CatalogFile {
    cards: Vec<Card>,
    #[serde(default)]
    badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    cards: Vec<Card>,
    badges: Vec<Badge>,
}

impl Catalog {
    pub fn new(cards: Vec<Card>, badges: Vec<Badge>) -> Result<Self> {
        let mut card_ids = HashSet::new();
        for card in &cards {
            if card.id.trim().is_empty() {
                bail!("Card with term {:?} has an empty id", card.term);
            }
            if !card_ids.insert(card.id.as_str()) {
                bail!("Duplicate card id: {}", card.id);
            }
        }
        let mut badge_ids = HashSet::new();
        for badge in &badges {
            if !badge_ids.insert(badge.id.as_str()) {
                bail!("Duplicate badge id: {}", badge.id);
            }
            if badge.threshold < 1 {
                bail!("Badge {} must have a threshold of at least 1", badge.id);
            }
        }
        Ok(Self { cards, badges })
    }

    /// The AI concepts deck shipped with the app
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(text).context("Malformed catalog JSON")?;
        Self::new(file.cards, file.badges)
    }

    /// Load a catalog from a `.json` file, or import any other file as a
    /// tab-separated deck named after the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)?
        } else {
            let category = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Catalog file name is not valid UTF-8")?;
            let cards = import_delimited_cards(category, 0, 1, &text);
            if cards.is_empty() {
                bail!("No cards found in {}", path.display());
            }
            let badges = Self::builtin()?
                .badges
                .into_iter()
                .filter(|b| b.category.is_none())
                .collect();
            Self::new(cards, badges)?
        };
        info!(
            "Loaded catalog {} with {} cards and {} badges",
            path.display(),
            catalog.cards.len(),
            catalog.badges.len()
        );
        Ok(catalog)
    }

    /// Same badges, new card list. Duplicate ids keep their first occurrence
    /// and cards with an empty id are dropped.
    pub fn with_cards(&self, cards: Vec<Card>) -> Self {
        let mut seen = HashSet::new();
        let cards = cards
            .into_iter()
            .filter(|card| {
                if card.id.trim().is_empty() {
                    warn!("Dropping card {:?} with an empty id from loaded cards", card.term);
                    return false;
                }
                let fresh = seen.insert(card.id.clone());
                if !fresh {
                    warn!("Dropping duplicate card id {} from loaded cards", card.id);
                }
                fresh
            })
            .collect();
        Self {
            cards,
            badges: self.badges.clone(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn badge(&self, id: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.card(id).is_some()
    }

    /// Unique categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.cards.iter().map(|c| c.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn card(id: &str, category: &str) -> Card {
        Card {
            id: id.to_string(),
            category: category.to_string(),
            term: format!("Term {id}"),
            definition: format!("Definition of {id}"),
            example: None,
            static_challenge: None,
        }
    }

    pub(crate) fn badge(id: &str, threshold: u32, category: Option<&str>) -> Badge {
        Badge {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: format!("Understood {threshold} concepts."),
            threshold,
            category: category.map(str::to_string),
            icon: "*".to_string(),
        }
    }

    /// Five Machine Learning cards, two NLP cards and three badges
    pub(crate) fn sample_catalog() -> Catalog {
        let mut cards: Vec<Card> = (1..=5)
            .map(|i| card(&format!("ml-{i}"), "Machine Learning"))
            .collect();
        cards.push(card("nlp-1", "NLP"));
        cards.push(card("nlp-2", "NLP"));
        Catalog::new(
            cards,
            vec![
                badge("ml-novice", 5, Some("Machine Learning")),
                badge("nlp-initiate", 2, Some("NLP")),
                badge("adept", 6, None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.cards().len(), 22);
        assert_eq!(catalog.badges().len(), 5);
        assert_eq!(
            catalog.card("ai-concept-04").and_then(|c| c.static_challenge.as_deref()),
            Some("What are two common techniques to mitigate overfitting in a machine learning model?")
        );
        assert_eq!(catalog.categories().first(), Some(&"AI Ethics"));
    }

    #[test]
    fn rejects_duplicate_ids_and_zero_thresholds() {
        let dup = Catalog::new(vec![card("a", "X"), card("a", "Y")], vec![]);
        assert!(dup.is_err());
        let zero = Catalog::new(vec![card("a", "X")], vec![badge("b", 0, None)]);
        assert!(zero.is_err());
        let empty_id = Catalog::new(vec![card(" ", "X")], vec![]);
        assert!(empty_id.is_err());
    }

    #[test]
    fn categories_are_sorted_and_unique() {
        let catalog = sample_catalog();
        assert_eq!(catalog.categories(), vec!["Machine Learning", "NLP"]);
    }

    #[test]
    fn with_cards_keeps_badges_and_first_duplicate() {
        let catalog = sample_catalog();
        let mut first = card("x", "One");
        first.term = "first".into();
        let replaced = catalog.with_cards(vec![first, card("x", "Two"), card("y", "Two")]);
        assert_eq!(replaced.cards().len(), 2);
        assert_eq!(replaced.card("x").unwrap().term, "first");
        assert_eq!(replaced.badges(), catalog.badges());
    }

    #[test]
    fn loads_json_and_delimited_files() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("deck.json");
        std::fs::write(
            &json,
            r#"{"cards":[{"id":"a","category":"C","term":"T","definition":"D"}]}"#,
        )
        .unwrap();
        let catalog = Catalog::load(&json).unwrap();
        assert_eq!(catalog.cards().len(), 1);
        assert!(catalog.badges().is_empty());

        let txt = dir.path().join("Statistics.txt");
        std::fs::write(&txt, "Mean\tAverage value\nMedian\tMiddle value\n").unwrap();
        let catalog = Catalog::load(&txt).unwrap();
        assert_eq!(catalog.cards().len(), 2);
        assert_eq!(catalog.cards()[0].id, "statistics-01");
        assert!(catalog.badges().iter().all(|b| b.category.is_none()));
        assert!(!catalog.badges().is_empty());
    }
}
