// src/knowledge/search.rs
//
// searchNodes scoring (spec §4.6).

use std::collections::HashSet;

use serde::Serialize;

use super::data::NodeSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    And,
    Or,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(rename = "nodeType")]
    pub node_type: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub score: u32,
}

fn tokenize(s: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    for ch in s.chars() {
        if ch.is_uppercase() || ch == ' ' || ch == '-' || ch == '_' || ch == '.' {
            if !current.is_empty() {
                tokens.insert(current.to_lowercase());
                current.clear();
            }
            if ch.is_uppercase() {
                current.push(ch);
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.insert(current.to_lowercase());
    }
    tokens
}

fn is_one_char_deletion(a: &str, b: &str) -> bool {
    let (shorter, longer) = if a.len() < b.len() { (a, b) } else { (b, a) };
    if longer.len() != shorter.len() + 1 {
        return false;
    }
    let longer_chars: Vec<char> = longer.chars().collect();
    for skip in 0..longer_chars.len() {
        let candidate: String = longer_chars.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, c)| *c).collect();
        if candidate == shorter {
            return true;
        }
    }
    false
}

fn is_adjacent_swap(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let mut diffs: Vec<usize> = Vec::new();
    for i in 0..a_chars.len() {
        if a_chars[i] != b_chars[i] {
            diffs.push(i);
        }
    }
    diffs.len() == 2 && diffs[1] == diffs[0] + 1 && a_chars[diffs[0]] == b_chars[diffs[1]] && a_chars[diffs[1]] == b_chars[diffs[0]]
}

pub fn search_nodes(catalogue: &[NodeSchema], query: &str, mode: SearchMode, limit: usize, source: Option<&str>) -> Vec<SearchHit> {
    let tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = Vec::new();
    for schema in catalogue {
        if let Some(src) = source {
            if schema.source != src {
                continue;
            }
        }
        let type_lower = schema.node_type.to_lowercase();
        let display_lower = schema.display_name.to_lowercase();
        let search_tokens = tokenize(&display_lower).into_iter().chain(tokenize(&type_lower)).collect::<HashSet<_>>();

        let mut total = 0u32;
        let mut matched = 0usize;
        for token in &tokens {
            let mut best = 0u32;
            if type_lower == *token {
                best = best.max(100);
            }
            if display_lower == *token {
                best = best.max(90);
            }
            if type_lower.starts_with(token.as_str()) || display_lower.starts_with(token.as_str()) {
                best = best.max(70);
            }
            if display_lower.contains(token.as_str()) {
                best = best.max(50);
            }
            if type_lower.contains(token.as_str()) {
                best = best.max(40);
            }
            if search_tokens.contains(token) {
                best = best.max(20);
            }
            if mode == SearchMode::Fuzzy {
                for st in &search_tokens {
                    if is_one_char_deletion(token, st) {
                        best = best.max(15);
                    } else if is_adjacent_swap(token, st) {
                        best = best.max(12);
                    }
                }
            }
            if best > 0 {
                matched += 1;
            }
            total += best;
        }

        let include = match mode {
            SearchMode::And => matched == tokens.len(),
            SearchMode::Or | SearchMode::Fuzzy => matched > 0,
        };
        if include && total > 0 {
            hits.push(SearchHit { node_type: schema.node_type.clone(), display_name: schema.display_name.clone(), score: total });
        }
    }

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::data::load_embedded_catalogue;

    #[test]
    fn exact_type_outranks_contains() {
        let catalogue = load_embedded_catalogue();
        let hits = search_nodes(&catalogue, "set", SearchMode::Or, 10, None);
        assert_eq!(hits[0].node_type, "set");
    }

    #[test]
    fn and_mode_requires_every_token() {
        let catalogue = load_embedded_catalogue();
        let hits = search_nodes(&catalogue, "http nonexistentword", SearchMode::And, 10, None);
        assert!(hits.is_empty());
    }

    #[test]
    fn source_filter_restricts_results() {
        let catalogue = load_embedded_catalogue();
        let hits = search_nodes(&catalogue, "agent", SearchMode::Or, 10, Some("langchain"));
        assert!(hits.iter().all(|h| h.node_type.starts_with("langchain:")));
    }

    #[test]
    fn one_char_deletion_detected() {
        assert!(is_one_char_deletion("webhok", "webhook"));
        assert!(!is_one_char_deletion("webhook", "webhook"));
    }

    #[test]
    fn adjacent_swap_detected() {
        assert!(is_adjacent_swap("webhoko", "webhook"));
    }
}
