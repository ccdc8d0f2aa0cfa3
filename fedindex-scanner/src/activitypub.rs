//! The slice of the ActivityPub collection format the crawler relies on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    #[serde(default)]
    pub ordered_items: Vec<CollectionItem>,
}

/// A collection member: a full object, or just its id in link form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionItem {
    Link(String),
    Object(ObjectRef),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CollectionItem {
    pub fn id(&self) -> &str {
        match self {
            CollectionItem::Link(id) => id,
            CollectionItem::Object(obj) => &obj.id,
        }
    }
}

impl Collection {
    /// Decode a collection body. The body must be a JSON object; the derived
    /// `Deserialize` alone would also take an array and fill in defaults.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "collection body is not a JSON object",
            ));
        }
        serde_json::from_value(value)
    }

    /// Member ids, `items` first then `orderedItems`, as listed. Entries
    /// without an id come back as empty strings.
    pub fn identifiers(&self) -> Vec<String> {
        self.items
            .iter()
            .chain(self.ordered_items.iter())
            .map(|item| item.id().to_string())
            .collect()
    }
}
