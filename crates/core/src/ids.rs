//! Content-hashed identifiers
//!
//! Every passage, entity and fact gets a stable id derived from its content,
//! so re-indexing the same corpus reproduces the same graph. Node kind is
//! recoverable from the id prefix.

use sha2::{Digest, Sha256};

/// Prefix for passage (chunk) node ids.
pub const CHUNK_PREFIX: &str = "chunk-";
/// Prefix for entity node ids.
pub const ENTITY_PREFIX: &str = "entity-";
/// Prefix for fact ids.
pub const FACT_PREFIX: &str = "fact-";

/// Node kind, derived from the hash-id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Passage,
    Entity,
}

impl NodeKind {
    /// Classify a hash id by its prefix. Unknown prefixes are not valid
    /// graph nodes.
    pub fn of(hash_id: &str) -> Option<NodeKind> {
        if hash_id.starts_with(CHUNK_PREFIX) {
            Some(NodeKind::Passage)
        } else if hash_id.starts_with(ENTITY_PREFIX) {
            Some(NodeKind::Entity)
        } else {
            None
        }
    }
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Id for a passage chunk: `chunk-<sha256(text)>`.
pub fn passage_id(text: &str) -> String {
    format!("{}{}", CHUNK_PREFIX, sha256_hex(text))
}

/// Id for a canonical (lowercased) entity phrase: `entity-<sha256(phrase)>`.
pub fn entity_id(phrase: &str) -> String {
    format!("{}{}", ENTITY_PREFIX, sha256_hex(&phrase.to_lowercase()))
}

/// Id for a fact triple: `fact-<sha256 of the JSON-encoded triple>`.
pub fn fact_id(subject: &str, predicate: &str, object: &str) -> String {
    let triple = serde_json::json!([subject, predicate, object]);
    format!("{}{}", FACT_PREFIX, sha256_hex(&triple.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_id_stable() {
        let a = passage_id("ঢাকা বিশ্ববিদ্যালয় ভর্তি বিজ্ঞপ্তি");
        let b = passage_id("ঢাকা বিশ্ববিদ্যালয় ভর্তি বিজ্ঞপ্তি");
        assert_eq!(a, b);
        assert!(a.starts_with(CHUNK_PREFIX));
    }

    #[test]
    fn test_entity_id_case_folds() {
        assert_eq!(entity_id("BUET"), entity_id("buet"));
    }

    #[test]
    fn test_fact_id_sensitive_to_order() {
        let a = fact_id("buet", "requires", "hsc");
        let b = fact_id("hsc", "requires", "buet");
        assert_ne!(a, b);
        assert!(a.starts_with(FACT_PREFIX));
    }

    #[test]
    fn test_node_kind_from_prefix() {
        assert_eq!(NodeKind::of(&passage_id("x")), Some(NodeKind::Passage));
        assert_eq!(NodeKind::of(&entity_id("x")), Some(NodeKind::Entity));
        assert_eq!(NodeKind::of("fact-abc"), None);
    }
}
