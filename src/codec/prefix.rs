// src/codec/prefix.rs
//
// Type-name compression (spec §4.2 "Type-name compression").

const BASE_PREFIX: &str = "n8n-nodes-base.";
const AI_PREFIX: &str = "@n8n/n8n-nodes-langchain.";
const AI_SHORTHAND: &str = "langchain:";

/// Strip a recognised prefix on read. Already-qualified types (containing a
/// dot, or already carrying the shorthand sigil) are left alone.
pub fn compress_type(full_type: &str) -> String {
    if let Some(rest) = full_type.strip_prefix(BASE_PREFIX) {
        return rest.to_string();
    }
    if let Some(rest) = full_type.strip_prefix(AI_PREFIX) {
        return format!("{AI_SHORTHAND}{rest}");
    }
    full_type.to_string()
}

/// Restore the prefix on write. A type already carrying a dot, or already
/// starting with the library sigil, is returned unchanged.
pub fn restore_type(short_type: &str) -> String {
    if let Some(rest) = short_type.strip_prefix(AI_SHORTHAND) {
        return format!("{AI_PREFIX}{rest}");
    }
    if short_type.contains('.') || short_type.starts_with('@') {
        return short_type.to_string();
    }
    format!("{BASE_PREFIX}{short_type}")
}
