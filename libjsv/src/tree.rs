//! The key-tree: the template's structural skeleton.
//!
//! Every node is an object with known keys, an array of element shapes, or
//! an opaque wildcard slot that accepts any JSON value. The tree drives the
//! encoder and the canonical text; the flat instruction program in
//! [`crate::program`] drives the decoder.

use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub(crate) enum KeyTree {
    /// An opaque slot: any JSON value, carried verbatim.
    Any,
    /// An object whose listed keys are elided from records.
    Object(IndexMap<String, KeyTree>),
    /// An array of element shapes; the last shape repeats for longer records.
    Array(Vec<KeyTree>),
}

/// Wildcard slot handed out when an array index runs past the template.
pub(crate) static WILDCARD: KeyTree = KeyTree::Any;

impl KeyTree {
    /// Structural equality, order-sensitive on object keys. Two templates
    /// are equal exactly when their canonical texts are, and key order is
    /// part of the canonical text.
    pub(crate) fn same_shape(&self, other: &KeyTree) -> bool {
        match (self, other) {
            (KeyTree::Any, KeyTree::Any) => true,
            (KeyTree::Object(a), KeyTree::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
            }
            (KeyTree::Array(a), KeyTree::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }
}

/// Drop trailing array elements that duplicate their predecessor. The last
/// element of an array template already repeats for any longer record, so
/// literal trailing copies add nothing.
pub(crate) fn prune_trailing(items: &mut Vec<KeyTree>) {
    while items.len() >= 2 {
        let last = items.len() - 1;
        if items[last].same_shape(&items[last - 1]) {
            items.pop();
        } else {
            break;
        }
    }
}

/// Infer a key-tree from a sample record. Object keys come out sorted
/// (samples are unordered data, unlike template text, which keeps parse
/// order); non-composite leaves and empty composites become wildcards.
pub(crate) fn from_sample(value: &Value) -> KeyTree {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut fields = IndexMap::new();
            for key in keys {
                // Key came out of the map above.
                if let Some(sub) = map.get(key) {
                    fields.insert(key.clone(), from_sample(sub));
                }
            }
            KeyTree::Object(fields)
        }
        Value::Array(items) if !items.is_empty() => {
            KeyTree::Array(items.iter().map(from_sample).collect())
        }
        _ => KeyTree::Any,
    }
}
