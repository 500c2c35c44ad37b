// src/codec/credentials.rs
//
// Credential reduction (read) and restoration (write), spec §4.2.

use std::collections::HashMap;

use crate::model::RawCredentialRef;

/// Reduce engine-side credential refs to slot-name -> display-name, dropping
/// the engine identifier (it is restored from the original node on write).
pub fn reduce_credentials(raw: &HashMap<String, RawCredentialRef>) -> HashMap<String, String> {
    raw.iter().map(|(slot, cred)| (slot.clone(), cred.name.clone())).collect()
}

/// Re-attach engine-side identifiers by looking them up on the original raw
/// node, which the caller resolves by stable node id (survives a rename).
/// When none is known (new node or unknown credential slot) the identifier
/// is emitted as the empty string, which the engine interprets as "use
/// credential by name".
pub fn restore_credentials(
    lite_credentials: &HashMap<String, String>,
    original: Option<&HashMap<String, RawCredentialRef>>,
) -> HashMap<String, RawCredentialRef> {
    lite_credentials
        .iter()
        .map(|(slot, display_name)| {
            let id = original
                .and_then(|orig| orig.get(slot))
                .map(|cred| cred.id.clone())
                .unwrap_or_default();
            (slot.clone(), RawCredentialRef { id, name: display_name.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_drops_engine_id() {
        let mut raw = HashMap::new();
        raw.insert("main".to_string(), RawCredentialRef { id: "cred-123".to_string(), name: "My Slack".to_string() });
        let lite = reduce_credentials(&raw);
        assert_eq!(lite.get("main"), Some(&"My Slack".to_string()));
    }

    #[test]
    fn restore_recovers_known_id_and_defaults_unknown_to_empty() {
        let mut original = HashMap::new();
        original.insert("main".to_string(), RawCredentialRef { id: "cred-123".to_string(), name: "My Slack".to_string() });

        let mut lite = HashMap::new();
        lite.insert("main".to_string(), "My Slack".to_string());
        lite.insert("extra".to_string(), "New Cred".to_string());

        let restored = restore_credentials(&lite, Some(&original));
        assert_eq!(restored.get("main").unwrap().id, "cred-123");
        assert_eq!(restored.get("extra").unwrap().id, "");
    }

    #[test]
    fn restore_without_original_uses_empty_ids() {
        let mut lite = HashMap::new();
        lite.insert("main".to_string(), "Fresh".to_string());
        let restored = restore_credentials(&lite, None);
        assert_eq!(restored.get("main").unwrap().id, "");
    }
}
