//! Foreign-key resolution against lookup tables loaded once per syncer pass.

use crate::domain::entity::EntityKind;
use crate::domain::mapper::ReferenceInput;
use crate::storage::{LookupEntry, SyncStore};
use std::collections::HashMap;

/// id/slug/name index over one entity kind's stored rows.
#[derive(Debug, Default)]
pub struct LookupTable {
    by_slug: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl LookupTable {
    /// Builds the index; on duplicate slugs or names the first entry wins.
    pub fn from_entries(entries: Vec<LookupEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            if let Some(slug) = entry.slug {
                table.by_slug.entry(slug).or_insert_with(|| entry.id.clone());
            }
            if let Some(name) = entry.name {
                table
                    .by_name
                    .entry(name.to_lowercase())
                    .or_insert_with(|| entry.id.clone());
            }
        }
        table
    }

    pub fn by_slug(&self, slug: &str) -> Option<&str> {
        self.by_slug.get(slug).map(String::as_str)
    }

    /// Case-insensitive exact name match.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.to_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The source sent nothing for this reference.
    NotSupplied,
    Resolved(String),
    /// Inputs were supplied but matched no stored row; carries the value tried.
    Unresolved(String),
}

/// Lookup tables for every kind a syncer references.
pub struct ReferenceResolver {
    tables: HashMap<EntityKind, LookupTable>,
}

impl ReferenceResolver {
    /// Loads one table per distinct target of `kind`'s references.
    ///
    /// A lookup that cannot be read is left empty, so its references resolve as unmatched.
    pub async fn load(store: &dyn SyncStore, kind: EntityKind) -> Self {
        let mut tables = HashMap::new();
        for target in kind.descriptor().reference_targets() {
            let entries = match store.load_lookup(target).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        kind = ?kind,
                        lookup = target.table_name(),
                        error = %e,
                        "reference lookup unavailable, resolving against an empty table"
                    );
                    Vec::new()
                }
            };
            tracing::debug!(
                kind = ?kind,
                lookup = target.table_name(),
                rows = entries.len(),
                "loaded reference lookup"
            );
            tables.insert(target, LookupTable::from_entries(entries));
        }
        Self { tables }
    }

    pub fn from_tables(tables: HashMap<EntityKind, LookupTable>) -> Self {
        Self { tables }
    }

    /// id verbatim, then slug, then case-insensitive name.
    pub fn resolve(&self, target: EntityKind, input: &ReferenceInput) -> Resolution {
        if input.is_empty() {
            return Resolution::NotSupplied;
        }
        if let Some(id) = &input.id {
            return Resolution::Resolved(id.clone());
        }
        let table = self.tables.get(&target);
        let by_slug = input
            .slug
            .as_deref()
            .and_then(|slug| table.and_then(|t| t.by_slug(slug)));
        let by_name = || {
            input
                .name
                .as_deref()
                .and_then(|name| table.and_then(|t| t.by_name(name)))
        };
        match by_slug.or_else(by_name) {
            Some(id) => Resolution::Resolved(id.to_string()),
            None => Resolution::Unresolved(input.describe().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, slug: Option<&str>, name: &str) -> LookupEntry {
        LookupEntry {
            id: id.to_string(),
            slug: slug.map(str::to_string),
            name: Some(name.to_string()),
        }
    }

    fn artists() -> ReferenceResolver {
        let table = LookupTable::from_entries(vec![
            entry("a-1", Some("frederic-leighton"), "Frederic Leighton"),
            entry("a-2", Some("john-singer-sargent"), "John Singer Sargent"),
            entry("a-3", Some("leighton-copy"), "frederic leighton"),
        ]);
        ReferenceResolver::from_tables(HashMap::from([(EntityKind::Artist, table)]))
    }

    fn input(id: Option<&str>, slug: Option<&str>, name: Option<&str>) -> ReferenceInput {
        ReferenceInput {
            id: id.map(str::to_string),
            slug: slug.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn supplied_id_is_used_verbatim() {
        let r = artists();
        assert_eq!(
            r.resolve(EntityKind::Artist, &input(Some("raw-id"), Some("john-singer-sargent"), None)),
            Resolution::Resolved("raw-id".into())
        );
    }

    #[test]
    fn slug_beats_name_and_is_case_sensitive() {
        let r = artists();
        assert_eq!(
            r.resolve(
                EntityKind::Artist,
                &input(None, Some("john-singer-sargent"), Some("Frederic Leighton"))
            ),
            Resolution::Resolved("a-2".into())
        );
        // Unknown slug falls through to the name.
        assert_eq!(
            r.resolve(
                EntityKind::Artist,
                &input(None, Some("John-Singer-Sargent"), Some("Frederic Leighton"))
            ),
            Resolution::Resolved("a-1".into())
        );
    }

    #[test]
    fn name_match_ignores_case_and_first_entry_wins() {
        let r = artists();
        assert_eq!(
            r.resolve(EntityKind::Artist, &input(None, None, Some("FREDERIC LEIGHTON"))),
            Resolution::Resolved("a-1".into())
        );
    }

    #[test]
    fn unknown_and_absent_inputs() {
        let r = artists();
        assert_eq!(
            r.resolve(EntityKind::Artist, &input(None, None, Some("Nobody"))),
            Resolution::Unresolved("Nobody".into())
        );
        assert_eq!(
            r.resolve(EntityKind::Artist, &ReferenceInput::default()),
            Resolution::NotSupplied
        );
        // No table loaded for the target at all.
        assert_eq!(
            r.resolve(EntityKind::Season, &input(None, None, Some("Autumn"))),
            Resolution::Unresolved("Autumn".into())
        );
    }
}
