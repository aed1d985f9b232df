use std::collections::HashSet;

use crate::models::Card;

/// Parse an Anki-style delimited export into (front, back) pairs, in file order.
/// Later duplicates of the same front are skipped.
fn import_anki_text(front_idx: usize, back_idx: usize, file: &str) -> Vec<(String, String)> {
    let mut separator = '\t';
    let sep = "#separator:";
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for line in file.lines() {
        if line.starts_with('#') {
            if let Some(trimmed) = line.strip_prefix(sep) {
                /*
                Comma, Semicolon, Tab, Space, Pipe, Colon, or the according literal characters
                */
                separator = match trimmed {
                    t if t.starts_with("tab") => '\t',
                    t if t.starts_with("comma") => ',',
                    t if t.starts_with("semicolon") => ';',
                    t if t.starts_with("space") => ' ',
                    t if t.starts_with("pipe") => '|',
                    t if t.starts_with("colon") => ':',
                    t if t.starts_with('\'') => t.chars().nth(1).unwrap_or('\t'),
                    _ => separator,
                };
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let mut front = None;
        let mut back = None;
        for (i, part) in line.split(separator).enumerate() {
            if i == front_idx {
                front = Some(part.trim().to_string());
            } else if i == back_idx {
                back = Some(part.trim().to_string());
            }
            if i > back_idx && i > front_idx {
                break;
            }
        }
        if let (Some(front), Some(back)) = (front, back) {
            if !front.is_empty() && seen.insert(front.clone()) {
                pairs.push((front, back));
            }
        }
    }
    pairs
}

/// Lowercase ascii slug used as the id prefix of imported cards
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "card".to_string()
    } else {
        slug
    }
}

/// Turn a delimited export into catalog cards of a single category.
/// Card ids are `<category-slug>-NN` in file order.
pub fn import_delimited_cards(
    category: &str,
    front_idx: usize,
    back_idx: usize,
    file: &str,
) -> Vec<Card> {
    let prefix = slugify(category);
    import_anki_text(front_idx, back_idx, file)
        .into_iter()
        .enumerate()
        .map(|(i, (term, definition))| Card {
            id: format!("{}-{:02}", prefix, i + 1),
            category: category.to_string(),
            term,
            definition,
            example: None,
            static_challenge: None,
        })
        .collect()
}
