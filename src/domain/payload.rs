//! Shape detection over an untyped export document.

use crate::domain::entity::EntityKind;
use crate::domain::mapper::JsonMap;
use serde_json::Value as JsonValue;

/// One export document as fetched from a source. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload(JsonMap);

impl ExportPayload {
    /// `None` when the document is not a JSON object.
    pub fn from_value(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// An index document advertises `endpoints` and carries no `subtypes` of its own.
    pub fn is_index_document(&self) -> bool {
        self.0.contains_key("endpoints") && !self.0.contains_key("subtypes")
    }

    /// `endpoints.all`, when the index names it explicitly.
    pub fn all_data_link(&self) -> Option<&str> {
        self.0.get("endpoints")?.get("all")?.as_str()
    }

    /// Records for `kind`, flattened from whichever shape the source used.
    ///
    /// Arrays are taken as-is. Kinds with a group hint also accept a map of
    /// `group label -> array`; each flattened object record gets the label written to the
    /// hint column, replacing any value it already had. Anything else is skipped.
    pub fn collection(&self, kind: EntityKind) -> Vec<JsonValue> {
        let descriptor = kind.descriptor();
        match (self.0.get(descriptor.payload_key), descriptor.group_hint) {
            (None, _) | (Some(JsonValue::Null), _) => Vec::new(),
            (Some(JsonValue::Array(items)), _) => items.clone(),
            (Some(JsonValue::Object(groups)), Some(hint)) => {
                let mut records = Vec::new();
                for (group, items) in groups {
                    let Some(items) = items.as_array() else {
                        tracing::warn!(
                            collection = descriptor.payload_key,
                            group = %group,
                            "skipping group that is not an array"
                        );
                        continue;
                    };
                    for item in items {
                        let mut record = item.clone();
                        if let Some(obj) = record.as_object_mut() {
                            obj.insert(hint.to_string(), JsonValue::String(group.clone()));
                        }
                        records.push(record);
                    }
                }
                records
            }
            (Some(_), _) => {
                tracing::warn!(
                    collection = descriptor.payload_key,
                    "skipping collection with unsupported shape"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: JsonValue) -> ExportPayload {
        ExportPayload::from_value(value).unwrap()
    }

    #[test]
    fn grouped_subtypes_are_flattened_with_season_hint() {
        let p = payload(json!({
            "subtypes": {
                "Autumn": [{ "id": "auburn-autumn", "name": "Auburn Autumn" }],
                "Winter": [
                    { "id": "deep-winter", "name": "Deep Winter", "season": "stale" },
                    { "id": "icy-winter", "name": "Icy Winter" }
                ]
            }
        }));
        let records = p.collection(EntityKind::Subtype);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["season"], json!("Autumn"));
        assert_eq!(records[1]["season"], json!("Winter"));
        assert_eq!(records[2]["id"], json!("icy-winter"));
    }

    #[test]
    fn flat_and_grouped_colors_carry_the_same_records() {
        let flat = payload(json!({
            "colors": [
                { "name": "Ruby Red", "hex": "#E0115F", "category": "accent" },
                { "name": "Olive", "hex": "#808000", "category": "neutral" }
            ]
        }));
        let grouped = payload(json!({
            "colors": {
                "accent": [{ "name": "Ruby Red", "hex": "#E0115F" }],
                "neutral": [{ "name": "Olive", "hex": "#808000" }]
            }
        }));
        assert_eq!(
            flat.collection(EntityKind::Color),
            grouped.collection(EntityKind::Color)
        );
    }

    #[test]
    fn ungrouped_kinds_only_accept_arrays() {
        let p = payload(json!({
            "fabrics": { "silky": [{ "name": "Silk" }] },
            "artists": [{ "name": "Titian" }],
            "seasons": null
        }));
        assert!(p.collection(EntityKind::Fabric).is_empty());
        assert_eq!(p.collection(EntityKind::Artist).len(), 1);
        assert!(p.collection(EntityKind::Season).is_empty());
        assert!(p.collection(EntityKind::Painting).is_empty());
    }

    #[test]
    fn index_document_detection() {
        let index = payload(json!({ "endpoints": { "all": "/api/export/all" } }));
        assert!(index.is_index_document());
        assert_eq!(index.all_data_link(), Some("/api/export/all"));

        let full = payload(json!({ "endpoints": {}, "subtypes": [] }));
        assert!(!full.is_index_document());
        assert_eq!(full.all_data_link(), None);

        assert!(ExportPayload::from_value(json!([1, 2])).is_none());
    }
}
