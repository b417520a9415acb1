//! Author name normalization
//!
//! Turns raw author input (an ordered list or one free-text string) into an
//! ordered, deduplicated list of canonical name strings. This is the single
//! definition of how author names are tokenized and how the cached display
//! string is rendered; every write path goes through it.

use serde::{Deserialize, Serialize};

/// Separator used when rendering the cached display string
pub const DISPLAY_SEPARATOR: &str = ", ";

/// Connector tokens that delimit names inside free text. Matched literally
/// and case-sensitively; "Anderson" must not split.
const CONNECTORS: [&str; 2] = [" and ", " & "];

/// Raw author input as accepted by the API
///
/// Either an ordered list of strings or one free-text string. List elements
/// may themselves contain delimiters ("Jane Doe, John Smith" as a single
/// element yields two names).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AuthorInput {
    List(Vec<String>),
    Text(String),
}

impl Default for AuthorInput {
    fn default() -> Self {
        AuthorInput::List(Vec::new())
    }
}

/// Normalize raw author input into an ordered, deduplicated name list
///
/// Splits on commas, semicolons and the literal connectors `" and "` /
/// `" & "`, trims each token, drops empties, and dedupes by exact string
/// equality preserving first-occurrence order. Total and idempotent:
/// normalizing an already-normalized list is a no-op.
pub fn normalize_authors(input: &AuthorInput) -> Vec<String> {
    let pieces: Vec<&str> = match input {
        AuthorInput::List(items) => items.iter().map(String::as_str).collect(),
        AuthorInput::Text(text) => vec![text.as_str()],
    };

    let mut names: Vec<String> = Vec::new();
    for piece in pieces {
        for token in split_free_text(piece) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if !names.iter().any(|n| n == token) {
                names.push(token.to_string());
            }
        }
    }
    names
}

/// Render the cached display string for a normalized name list
pub fn display_string(names: &[String]) -> String {
    names.join(DISPLAY_SEPARATOR)
}

/// Split one free-text chunk into name tokens
///
/// Commas and semicolons first, then the word connectors within each part.
fn split_free_text(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in text.split([',', ';']) {
        split_connectors(part, &mut tokens);
    }
    tokens
}

fn split_connectors(part: &str, out: &mut Vec<String>) {
    for connector in CONNECTORS {
        if let Some(idx) = part.find(connector) {
            let (head, tail) = part.split_at(idx);
            split_connectors(head, out);
            split_connectors(&tail[connector.len()..], out);
            return;
        }
    }
    out.push(part.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> AuthorInput {
        AuthorInput::List(items.iter().map(|s| s.to_string()).collect())
    }

    fn text(s: &str) -> AuthorInput {
        AuthorInput::Text(s.to_string())
    }

    #[test]
    fn test_splits_commas_and_semicolons() {
        assert_eq!(
            normalize_authors(&text("Jane Doe, John Smith; Alice Wu")),
            vec!["Jane Doe", "John Smith", "Alice Wu"]
        );
    }

    #[test]
    fn test_splits_word_connectors() {
        assert_eq!(
            normalize_authors(&text("Jane Doe and John Smith & Alice Wu")),
            vec!["Jane Doe", "John Smith", "Alice Wu"]
        );
    }

    #[test]
    fn test_connectors_are_case_sensitive() {
        // " AND " is not a connector token
        assert_eq!(
            normalize_authors(&text("Jane Doe AND John Smith")),
            vec!["Jane Doe AND John Smith"]
        );
    }

    #[test]
    fn test_embedded_and_does_not_split() {
        assert_eq!(
            normalize_authors(&text("Brandon Sanderson")),
            vec!["Brandon Sanderson"]
        );
    }

    #[test]
    fn test_list_elements_are_also_split() {
        assert_eq!(
            normalize_authors(&list(&["Jane Doe, John Smith"])),
            vec!["Jane Doe", "John Smith"]
        );
    }

    #[test]
    fn test_trims_and_drops_empty_tokens() {
        assert_eq!(
            normalize_authors(&text("  Jane Doe ,, ; , John Smith  ")),
            vec!["Jane Doe", "John Smith"]
        );
        assert!(normalize_authors(&text("   ")).is_empty());
        assert!(normalize_authors(&list(&[])).is_empty());
        assert!(normalize_authors(&list(&["", "  "])).is_empty());
    }

    #[test]
    fn test_dedup_preserves_first_occurrence_order() {
        assert_eq!(
            normalize_authors(&list(&["B", "A", "B", "C", "A"])),
            vec!["B", "A", "C"]
        );
    }

    #[test]
    fn test_dedup_is_exact_match() {
        // Case differences are distinct identities
        assert_eq!(
            normalize_authors(&list(&["j. smith", "J. Smith"])),
            vec!["j. smith", "J. Smith"]
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            text("Jane Doe and John Smith, Alice Wu & Bob Ng; Jane Doe"),
            list(&["X", " Y ", "X, Z"]),
            text(""),
        ];
        for input in inputs {
            let once = normalize_authors(&input);
            let twice = normalize_authors(&AuthorInput::List(once.clone()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_display_string_join() {
        let names = normalize_authors(&text("Jane Doe, John Smith"));
        assert_eq!(display_string(&names), "Jane Doe, John Smith");
        assert_eq!(display_string(&[]), "");
    }

    #[test]
    fn test_untagged_serde_shapes() {
        let from_list: AuthorInput = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(from_list, list(&["A", "B"]));

        let from_text: AuthorInput = serde_json::from_str(r#""A and B""#).unwrap();
        assert_eq!(from_text, text("A and B"));
    }
}
