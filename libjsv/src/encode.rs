//! Canonical template text and record encoding.
//!
//! Both walk the key-tree. Encoding replaces each templated object with a
//! positional list of its field values (absent fields leave their slot
//! empty), appends untemplated keys as ordinary `"key":value` pairs, and
//! reuses the last array element shape for records longer than the
//! template.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::EncodeError;
use crate::json::quote;
use crate::tree::{KeyTree, WILDCARD};

/// Render a key-tree as canonical template text. The wildcard renders as
/// `{}`, which the grammar itself rejects; only inference produces it.
pub(crate) fn render_template(tree: &KeyTree) -> String {
    match tree {
        KeyTree::Any => "{}".to_string(),
        KeyTree::Object(fields) => render_object(fields),
        KeyTree::Array(items) => render_array(items),
    }
}

fn render_object(fields: &IndexMap<String, KeyTree>) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|(key, sub)| match sub {
            KeyTree::Any => quote(key),
            KeyTree::Object(f) => format!("{}:{}", quote(key), render_object(f)),
            KeyTree::Array(i) => format!("{}:{}", quote(key), render_array(i)),
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn render_array(items: &[KeyTree]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|sub| match sub {
            KeyTree::Any => String::new(),
            KeyTree::Object(f) => render_object(f),
            KeyTree::Array(i) => render_array(i),
        })
        .collect();
    format!("[{}]", parts.join(","))
}

/// Encode one record against a key-tree node. A record whose shape
/// disagrees with the node, at any depth, is an error.
pub(crate) fn encode_record(tree: &KeyTree, value: &Value) -> Result<String, EncodeError> {
    match tree {
        KeyTree::Any => Ok(serde_json::to_string(value)?),
        KeyTree::Object(fields) => encode_object(fields, value),
        KeyTree::Array(items) => encode_array(items, value),
    }
}

fn encode_object(
    fields: &IndexMap<String, KeyTree>,
    value: &Value,
) -> Result<String, EncodeError> {
    let Value::Object(record) = value else {
        return Err(EncodeError::ExpectingObject);
    };
    let mut slots = vec![String::new(); fields.len()];
    let mut extras = Vec::new();
    for (key, sub_value) in record {
        match fields.get_full(key) {
            Some((slot, _, sub_tree)) => {
                slots[slot] = encode_record(sub_tree, sub_value)?;
            }
            None => extras.push(format!("{}:{}", quote(key), serde_json::to_string(sub_value)?)),
        }
    }
    slots.extend(extras);
    Ok(format!("{{{}}}", slots.join(",")))
}

fn encode_array(items: &[KeyTree], value: &Value) -> Result<String, EncodeError> {
    let Value::Array(elements) = value else {
        return Err(EncodeError::ExpectingArray);
    };
    let mut parts = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let sub_tree = match items.get(i) {
            Some(sub) => sub,
            None => items.last().unwrap_or(&WILDCARD),
        };
        parts.push(encode_record(sub_tree, element)?);
    }
    Ok(format!("[{}]", parts.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use serde_json::json;

    fn encode(template: &str, record: Value) -> String {
        Template::compile(template).unwrap().encode(&record).unwrap()
    }

    #[test]
    fn test_encode_elides_keys() {
        assert_eq!(encode("[{\"key_1\"}]", json!([{"key_1": 1}])), "[{1}]");
        assert_eq!(
            encode(
                "{\"key_1\",\"key_2\",\"key_3\",\"key_4\"}",
                json!({"key_1": 1, "key_2": 2, "key_3": 3, "key_4": 4})
            ),
            "{1,2,3,4}"
        );
    }

    #[test]
    fn test_encode_repeats_last_element() {
        assert_eq!(
            encode(
                "[{\"key_1\"}]",
                json!([{"key_1": 1}, {"key_1": "two"}, {"key_1": 3.0}])
            ),
            "[{1},{\"two\"},{3.0}]"
        );
    }

    #[test]
    fn test_encode_absent_field_leaves_slot_empty() {
        assert_eq!(
            encode(
                "{\"key_1\",\"key_2\",\"key_3\",\"key_4\"}",
                json!({"key_1": 1, "key_3": 3})
            ),
            "{1,,3,}"
        );
    }

    #[test]
    fn test_encode_appends_extra_keys() {
        assert_eq!(
            encode(
                "{\"key_1\",\"key_2\",\"key_3\",\"key_4\"}",
                json!({"key_1": 1, "key_2": 2, "key_3": 3, "key_4": 4, "key_5": 5})
            ),
            "{1,2,3,4,\"key_5\":5}"
        );
    }

    #[test]
    fn test_encode_opaque_slot_takes_any_json() {
        assert_eq!(
            encode(
                "[{\"key_1\"},]",
                json!([{"key_1": "value_1"}, 3, {"key_2": "value_2"}])
            ),
            "[{\"value_1\"},3,{\"key_2\":\"value_2\"}]"
        );
    }

    #[test]
    fn test_encode_shape_mismatch() {
        let t = Template::compile("{\"key_1\"}").unwrap();
        let err = t.encode(&json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "Expecting a dictionary");

        let t = Template::compile("[{\"key_1\"}]").unwrap();
        let err = t.encode(&json!({"key_1": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Expecting a list");
    }

    #[test]
    fn test_encode_deep_shape_mismatch() {
        let t = Template::compile("{\"key_1\":[{\"key_2\"}]}").unwrap();
        let err = t.encode(&json!({"key_1": {"key_2": 1}})).unwrap_err();
        assert_eq!(err.to_string(), "Expecting a list");
    }

    #[test]
    fn test_render_canonicalizes() {
        let t = Template::compile("[ {  \"key_1\" \t}\n]").unwrap();
        assert_eq!(t.to_string(), "[{\"key_1\"}]");
        let t = Template::compile("{\"key_1\":{\"key_1_1\"},\"key_2\"}").unwrap();
        assert_eq!(t.to_string(), "{\"key_1\":{\"key_1_1\"},\"key_2\"}");
    }
}
