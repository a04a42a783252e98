//! Field mapping: one raw external record -> canonical column map.
//!
//! Each canonical column accepts an ordered alias list; the first alias present with a
//! non-null value wins. A column whose aliases are all absent is left out of the output
//! entirely, so an upsert never overwrites stored values the source did not send. An
//! explicit `null` from the source is kept as `null`.

use crate::domain::entity::{EntityKind, KeyFallback, ReferenceSpec};
use serde_json::Value as JsonValue;

pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Natural-key inputs for one foreign-key column as supplied by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceInput {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
}

impl ReferenceInput {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.slug.is_none() && self.name.is_none()
    }

    /// The most specific value supplied, for log and error messages.
    pub fn describe(&self) -> &str {
        self.id
            .as_deref()
            .or(self.slug.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

/// A record normalised to canonical columns, with its unresolved reference inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub kind: EntityKind,
    pub fields: JsonMap,
    pub references: Vec<(&'static ReferenceSpec, ReferenceInput)>,
}

impl MappedRecord {
    /// The natural-key value, if present and non-null.
    pub fn natural_key(&self) -> Option<String> {
        self.fields
            .get(self.kind.descriptor().natural_key)
            .and_then(scalar_text)
    }

    /// Key shown in per-record error messages; falls back to the display name.
    pub fn display_key(&self) -> String {
        let descriptor = self.kind.descriptor();
        self.natural_key()
            .or_else(|| self.fields.get(descriptor.name_column).and_then(scalar_text))
            .unwrap_or_else(|| format!("(missing {})", descriptor.natural_key))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("record is not a JSON object")]
    NotAnObject,
}

pub fn map_record(kind: EntityKind, raw: &JsonValue) -> Result<MappedRecord, MapError> {
    let raw = raw.as_object().ok_or(MapError::NotAnObject)?;
    let descriptor = kind.descriptor();

    let mut fields = JsonMap::new();
    for spec in descriptor.fields {
        if let Some(value) = pick(raw, spec.aliases) {
            fields.insert(spec.column.to_string(), value);
        }
    }

    if let Some(post_map) = descriptor.post_map {
        post_map(raw, &mut fields);
    }

    let key_missing = fields
        .get(descriptor.natural_key)
        .map_or(true, JsonValue::is_null);
    if key_missing && descriptor.key_fallback == KeyFallback::SlugFromName {
        let derived = fields
            .get(descriptor.name_column)
            .and_then(JsonValue::as_str)
            .map(slugify)
            .filter(|s| !s.is_empty());
        if let Some(slug) = derived {
            fields.insert(descriptor.natural_key.to_string(), JsonValue::String(slug));
        }
    }

    let references = descriptor
        .references
        .iter()
        .map(|spec| {
            let input = ReferenceInput {
                id: pick_text(raw, spec.id_aliases),
                slug: pick_text(raw, spec.slug_aliases),
                name: pick_text(raw, spec.name_aliases),
            };
            (spec, input)
        })
        .collect();

    Ok(MappedRecord {
        kind,
        fields,
        references,
    })
}

/// First alias present with a non-null value; `Some(Null)` if only nulls were present.
fn pick(raw: &JsonMap, aliases: &[&str]) -> Option<JsonValue> {
    let mut saw_null = false;
    for alias in aliases {
        match raw.get(*alias) {
            Some(JsonValue::Null) => saw_null = true,
            Some(value) => return Some(value.clone()),
            None => {}
        }
    }
    saw_null.then_some(JsonValue::Null)
}

fn pick_text(raw: &JsonMap, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| raw.get(*alias))
        .find_map(scalar_text)
        .filter(|s| !s.is_empty())
}

/// Strings verbatim, numbers and booleans stringified; everything else is not a key.
pub fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lowercase, alphanumeric runs joined by single dashes: `"Ruby Red"` -> `"ruby-red"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Colors may carry HSL as a nested `hsl` triple; scalar columns take precedence.
pub(crate) fn color_hsl_fallback(raw: &JsonMap, out: &mut JsonMap) {
    let Some(hsl) = raw.get("hsl") else {
        return;
    };
    let components: [(&str, usize, [&str; 2]); 3] = [
        ("hue", 0, ["h", "hue"]),
        ("saturation", 1, ["s", "saturation"]),
        ("lightness", 2, ["l", "lightness"]),
    ];
    for (column, index, keys) in components {
        if out.get(column).is_some_and(|v| !v.is_null()) {
            continue;
        }
        let nested = match hsl {
            JsonValue::Array(items) => items.get(index).cloned(),
            JsonValue::Object(obj) => keys.iter().find_map(|k| obj.get(*k).cloned()),
            _ => None,
        };
        if let Some(value) = nested.filter(|v| !v.is_null()) {
            out.insert(column.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subtype_aliases_map_to_canonical_columns() {
        let raw = json!({
            "id": "auburn-autumn",
            "name": "Auburn Autumn",
            "beautyStatement": "Warm and rich",
            "uniqueFeatures": ["copper hair"],
            "palette": ["rust", "olive"],
            "artists": ["Titian"],
            "unrelated": 42
        });
        let mapped = map_record(EntityKind::Subtype, &raw).unwrap();
        assert_eq!(mapped.fields["slug"], json!("auburn-autumn"));
        assert_eq!(mapped.fields["beauty_statement"], json!("Warm and rich"));
        assert_eq!(mapped.fields["unique_features"], json!(["copper hair"]));
        assert_eq!(mapped.fields["color_combinations"], json!(["rust", "olive"]));
        assert_eq!(mapped.fields["art_references"], json!(["Titian"]));
        assert!(!mapped.fields.contains_key("unrelated"));
        assert!(!mapped.fields.contains_key("description"));
    }

    #[test]
    fn canonical_name_beats_alias() {
        let raw = json!({
            "name": "x",
            "beauty_statement": "canonical",
            "beautyStatement": "alias"
        });
        let mapped = map_record(EntityKind::Subtype, &raw).unwrap();
        assert_eq!(mapped.fields["beauty_statement"], json!("canonical"));
    }

    #[test]
    fn explicit_null_is_kept_but_absent_is_omitted() {
        let raw = json!({ "name": "Ruby Red", "description": null });
        let mapped = map_record(EntityKind::Color, &raw).unwrap();
        assert_eq!(mapped.fields.get("description"), Some(&JsonValue::Null));
        assert!(!mapped.fields.contains_key("undertone"));
    }

    #[test]
    fn later_alias_value_wins_over_earlier_null() {
        let raw = json!({ "name": "Ruby", "hex": null, "hexCode": "#E0115F" });
        let mapped = map_record(EntityKind::Color, &raw).unwrap();
        assert_eq!(mapped.fields["hex"], json!("#E0115F"));
    }

    #[test]
    fn color_slug_is_derived_from_name() {
        let raw = json!({ "name": "Ruby Red", "hex": "#E0115F" });
        let mapped = map_record(EntityKind::Color, &raw).unwrap();
        assert_eq!(mapped.natural_key().as_deref(), Some("ruby-red"));
    }

    #[test]
    fn hsl_scalars_take_precedence_over_nested_triple() {
        let raw = json!({ "name": "Teal", "hue": 180, "hsl": [10, 50, 40] });
        let mapped = map_record(EntityKind::Color, &raw).unwrap();
        assert_eq!(mapped.fields["hue"], json!(180));
        assert_eq!(mapped.fields["saturation"], json!(50));
        assert_eq!(mapped.fields["lightness"], json!(40));
    }

    #[test]
    fn hsl_object_form_is_read() {
        let raw = json!({ "name": "Teal", "hsl": { "h": 180, "s": 60, "l": 35 } });
        let mapped = map_record(EntityKind::Color, &raw).unwrap();
        assert_eq!(mapped.fields["hue"], json!(180));
        assert_eq!(mapped.fields["saturation"], json!(60));
        assert_eq!(mapped.fields["lightness"], json!(35));
    }

    #[test]
    fn painting_reference_inputs_are_collected() {
        let raw = json!({ "title": "Flaming June", "artist": "Frederic Leighton" });
        let mapped = map_record(EntityKind::Painting, &raw).unwrap();
        assert_eq!(mapped.references.len(), 1);
        let (spec, input) = &mapped.references[0];
        assert_eq!(spec.column, "artist_id");
        assert_eq!(input.name.as_deref(), Some("Frederic Leighton"));
        assert!(input.id.is_none());
        assert!(!mapped.fields.contains_key("artist_id"));
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert_eq!(
            map_record(EntityKind::Fabric, &json!("silk")),
            Err(MapError::NotAnObject)
        );
    }

    #[test]
    fn display_key_falls_back_when_natural_key_missing() {
        let mapped = map_record(EntityKind::Painting, &json!({ "year": 1895 })).unwrap();
        assert_eq!(mapped.display_key(), "(missing title)");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Ruby Red"), "ruby-red");
        assert_eq!(slugify("  Deep -- Winter!! "), "deep-winter");
        assert_eq!(slugify("Soft Summer 2"), "soft-summer-2");
        assert_eq!(slugify("***"), "");
    }
}
