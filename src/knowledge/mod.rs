// src/knowledge/mod.rs
//
// In-memory node knowledge index (spec §4.6). Grounded on unifiedlab::dsl's
// BTreeMap<String, TypeSpec> catalogue-lookup shape.

pub mod data;
pub mod search;

use std::collections::HashMap;

use serde::Serialize;

use crate::codec::{compress_type, restore_type};

pub use data::{NodeSchema, PropertySchema, ResourceOperationSchema};
pub use search::{SearchHit, SearchMode};

#[derive(Debug, Clone, Serialize)]
pub struct PatternRecipe {
    pub name: String,
    pub keywords: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuirkNote {
    #[serde(rename = "nodeType")]
    pub node_type: String,
    pub keywords: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpressionRecipe {
    pub name: String,
    pub keywords: Vec<String>,
    pub expression: String,
}

#[derive(Debug)]
pub struct KnowledgeIndex {
    catalogue: Vec<NodeSchema>,
    by_type: HashMap<String, usize>,
    by_display_lower: HashMap<String, usize>,
    patterns: Vec<PatternRecipe>,
    quirks: Vec<QuirkNote>,
    expressions: Vec<ExpressionRecipe>,
}

impl KnowledgeIndex {
    pub fn embedded() -> Self {
        Self::from_catalogue(data::load_embedded_catalogue())
    }

    pub fn from_catalogue(catalogue: Vec<NodeSchema>) -> Self {
        let mut by_type = HashMap::new();
        let mut by_display_lower = HashMap::new();
        for (i, schema) in catalogue.iter().enumerate() {
            by_type.insert(schema.node_type.clone(), i);
            by_display_lower.insert(schema.display_name.to_lowercase(), i);
        }
        KnowledgeIndex {
            catalogue,
            by_type,
            by_display_lower,
            patterns: fixture_patterns(),
            quirks: fixture_quirks(),
            expressions: fixture_expressions(),
        }
    }

    /// Resolution chain: exact full type -> compact-prefix form -> display
    /// name case-insensitive -> the query with each recognised prefix
    /// re-prepended.
    pub fn get_node(&self, query: &str) -> Option<&NodeSchema> {
        if let Some(&idx) = self.by_type.get(query) {
            return self.catalogue.get(idx);
        }
        let compact = compress_type(query);
        if let Some(&idx) = self.by_type.get(&compact) {
            return self.catalogue.get(idx);
        }
        if let Some(&idx) = self.by_display_lower.get(&query.to_lowercase()) {
            return self.catalogue.get(idx);
        }
        let restored = restore_type(query);
        if let Some(&idx) = self.by_type.get(&restored) {
            return self.catalogue.get(idx);
        }
        None
    }

    pub fn search_nodes(&self, query: &str, mode: SearchMode, limit: usize, source: Option<&str>) -> Vec<SearchHit> {
        search::search_nodes(&self.catalogue, query, mode, limit, source)
    }

    pub fn search_patterns(&self, query: &str) -> Vec<&PatternRecipe> {
        keyword_filter(&self.patterns, query, |p| &p.keywords)
    }

    pub fn get_pattern(&self, name: &str) -> Option<&PatternRecipe> {
        self.patterns.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn search_quirks(&self, query: &str) -> Vec<&QuirkNote> {
        keyword_filter(&self.quirks, query, |q| &q.keywords)
    }

    pub fn search_expressions(&self, query: &str) -> Vec<&ExpressionRecipe> {
        keyword_filter(&self.expressions, query, |e| &e.keywords)
    }

    pub fn providers(&self) -> Vec<&str> {
        let mut set: Vec<&str> = self.catalogue.iter().map(|n| n.source.as_str()).collect();
        set.sort_unstable();
        set.dedup();
        set
    }
}

fn keyword_filter<'a, T>(items: &'a [T], query: &str, keywords_of: impl Fn(&'a T) -> &'a Vec<String>) -> Vec<&'a T> {
    let q = query.to_lowercase();
    items
        .iter()
        .filter(|item| keywords_of(item).iter().any(|k| k.contains(&q) || q.contains(k.as_str())))
        .collect()
}

fn fixture_patterns() -> Vec<PatternRecipe> {
    vec![PatternRecipe {
        name: "retry-with-backoff".to_string(),
        keywords: vec!["retry".to_string(), "backoff".to_string(), "error handling".to_string()],
        description: "Wrap an HTTP Request node in a loop with an incrementing wait node on failure.".to_string(),
    }]
}

fn fixture_quirks() -> Vec<QuirkNote> {
    vec![QuirkNote {
        node_type: "switch".to_string(),
        keywords: vec!["switch".to_string(), "fallback".to_string()],
        note: "Switch v3 requires an explicit fallback output or unmatched items are dropped silently.".to_string(),
    }]
}

fn fixture_expressions() -> Vec<ExpressionRecipe> {
    vec![ExpressionRecipe {
        name: "previous-node-json".to_string(),
        keywords: vec!["previous".to_string(), "json".to_string()],
        expression: "={{ $json.fieldName }}".to_string(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_node_resolves_via_compact_form() {
        let idx = KnowledgeIndex::embedded();
        let schema = idx.get_node("n8n-nodes-base.httpRequest").unwrap();
        assert_eq!(schema.node_type, "httpRequest");
    }

    #[test]
    fn get_node_resolves_via_display_name() {
        let idx = KnowledgeIndex::embedded();
        let schema = idx.get_node("Webhook").unwrap();
        assert_eq!(schema.node_type, "webhook");
    }

    #[test]
    fn get_node_unresolvable_is_none() {
        let idx = KnowledgeIndex::embedded();
        assert!(idx.get_node("totally-unknown-thing").is_none());
    }
}
