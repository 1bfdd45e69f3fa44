//! Field decoders that degrade undecodable nested nodes to "absent".
//!
//! Used as `deserialize_with` targets on world types so a single unknown or
//! malformed occupant, item or quest does not fail a whole save load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub(crate) fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        if value.is_null() {
            None
        } else {
            decode_node(value)
        }
    }))
}

pub(crate) fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.into_iter().filter_map(decode_node).collect())
}

pub(crate) fn decode_node<T: DeserializeOwned>(value: Value) -> Option<T> {
    let tag = node_tag(&value).unwrap_or("<missing>").to_string();
    match serde_json::from_value::<T>(value) {
        Ok(node) => Some(node),
        Err(error) => {
            warn!(node_type = %tag, error = %error, "save_node_dropped");
            None
        }
    }
}

fn node_tag(value: &Value) -> Option<&str> {
    value
        .get("type")
        .or_else(|| value.get("kind"))
        .or_else(|| value.get("body").and_then(|body| body.get("type")))
        .or_else(|| value.get("effect").and_then(|effect| effect.get("kind")))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(tag = "type")]
    enum Node {
        Known { value: u32 },
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "vec")]
        nodes: Vec<Node>,
        #[serde(default, deserialize_with = "option")]
        single: Option<Node>,
    }

    #[test]
    fn unknown_tags_are_dropped_and_rest_survives() {
        let holder: Holder = serde_json::from_value(json!({
            "nodes": [
                {"type": "Known", "value": 1},
                {"type": "Ghost", "value": 2},
                {"value": 3},
                {"type": "Known", "value": 4}
            ],
            "single": {"type": "Ghost"}
        }))
        .expect("holder");

        assert_eq!(
            holder.nodes,
            vec![Node::Known { value: 1 }, Node::Known { value: 4 }]
        );
        assert!(holder.single.is_none());
    }

    #[test]
    fn null_and_missing_fields_are_absent() {
        let holder: Holder = serde_json::from_value(json!({ "single": null })).expect("holder");
        assert!(holder.nodes.is_empty());
        assert!(holder.single.is_none());
    }
}
