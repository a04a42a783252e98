//! Entity kinds handled by the sync engine and their static descriptors.
//!
//! Every per-kind difference (table, conflict target, field aliases, foreign keys)
//! lives in the descriptor table below, so the mapper, resolver, syncer and stores
//! stay generic over [`EntityKind`].

use crate::domain::mapper::{color_hsl_fallback, JsonMap};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the fixed categories of canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Subtype,
    Color,
    Fabric,
    Artist,
    Season,
    Painting,
    NaturePhoto,
    TrainingSample,
}

impl EntityKind {
    /// Order in which the coordinator dispatches collections and reports results.
    pub const DISPATCH_ORDER: [EntityKind; 8] = [
        EntityKind::Subtype,
        EntityKind::Color,
        EntityKind::Fabric,
        EntityKind::Artist,
        EntityKind::TrainingSample,
        EntityKind::Season,
        EntityKind::Painting,
        EntityKind::NaturePhoto,
    ];

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityKind::Subtype => &SUBTYPE,
            EntityKind::Color => &COLOR,
            EntityKind::Fabric => &FABRIC,
            EntityKind::Artist => &ARTIST,
            EntityKind::Season => &SEASON,
            EntityKind::Painting => &PAINTING,
            EntityKind::NaturePhoto => &NATURE_PHOTO,
            EntityKind::TrainingSample => &TRAINING_SAMPLE,
        }
    }

    pub fn table_name(self) -> &'static str {
        self.descriptor().table
    }
}

/// Storage type of a canonical column; drives casts and binding in the Postgres store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
    Jsonb,
    Uuid,
    Timestamptz,
}

impl ColumnType {
    pub fn sql_cast(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Int => "int4",
            ColumnType::Float => "float8",
            ColumnType::Bool => "bool",
            ColumnType::Jsonb => "jsonb",
            ColumnType::Uuid => "uuid",
            ColumnType::Timestamptz => "timestamptz",
        }
    }
}

/// A canonical column and the source field names accepted for it, in priority order.
#[derive(Debug)]
pub struct FieldSpec {
    pub column: &'static str,
    pub aliases: &'static [&'static str],
    pub col_type: ColumnType,
}

/// A foreign-key column resolved against another entity kind's lookup table.
#[derive(Debug, PartialEq, Eq)]
pub struct ReferenceSpec {
    pub column: &'static str,
    pub target: EntityKind,
    pub id_aliases: &'static [&'static str],
    pub slug_aliases: &'static [&'static str],
    pub name_aliases: &'static [&'static str],
}

/// How a record's natural key is obtained when no alias supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFallback {
    None,
    SlugFromName,
}

pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub table: &'static str,
    /// Collection key inside an export payload.
    pub payload_key: &'static str,
    /// Human label used in per-record error strings.
    pub label: &'static str,
    /// Natural key used as the upsert conflict target.
    pub natural_key: &'static str,
    /// Column stamped with the group label when the collection arrives grouped.
    pub group_hint: Option<&'static str>,
    pub key_fallback: KeyFallback,
    /// Column holding the slug in lookup tables, if the kind has one.
    pub slug_column: Option<&'static str>,
    /// Column holding the display name in lookup tables.
    pub name_column: &'static str,
    pub fields: &'static [FieldSpec],
    pub references: &'static [ReferenceSpec],
    /// Columns that must be non-null on write.
    pub required: &'static [&'static str],
    pub post_map: Option<fn(&JsonMap, &mut JsonMap)>,
}

pub const SOURCE_APP_COLUMN: &str = "source_app";
pub const SYNCED_AT_COLUMN: &str = "synced_at";

impl EntityDescriptor {
    /// Column type for any column this kind may write, including provenance columns.
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        if column == SOURCE_APP_COLUMN {
            return Some(ColumnType::Text);
        }
        if column == SYNCED_AT_COLUMN {
            return Some(ColumnType::Timestamptz);
        }
        if let Some(field) = self.fields.iter().find(|f| f.column == column) {
            return Some(field.col_type);
        }
        self.references
            .iter()
            .find(|r| r.column == column)
            .map(|_| ColumnType::Uuid)
    }

    /// Distinct entity kinds this kind references, in declaration order.
    pub fn reference_targets(&self) -> Vec<EntityKind> {
        let mut targets = Vec::new();
        for reference in self.references {
            if !targets.contains(&reference.target) {
                targets.push(reference.target);
            }
        }
        targets
    }
}

const fn field(
    column: &'static str,
    aliases: &'static [&'static str],
    col_type: ColumnType,
) -> FieldSpec {
    FieldSpec {
        column,
        aliases,
        col_type,
    }
}

const SEASON_REF: ReferenceSpec = ReferenceSpec {
    column: "season_id",
    target: EntityKind::Season,
    id_aliases: &["season_id", "seasonId"],
    slug_aliases: &[],
    name_aliases: &["season", "season_name", "seasonName"],
};

const SUBTYPE_REF: ReferenceSpec = ReferenceSpec {
    column: "subtype_id",
    target: EntityKind::Subtype,
    id_aliases: &["subtype_id", "subtypeId"],
    slug_aliases: &["subtype_slug", "subtypeSlug"],
    name_aliases: &["subtype", "subtype_name", "subtypeName"],
};

static SUBTYPE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Subtype,
    table: "subtypes",
    payload_key: "subtypes",
    label: "Subtype",
    natural_key: "slug",
    group_hint: Some("season"),
    key_fallback: KeyFallback::SlugFromName,
    slug_column: Some("slug"),
    name_column: "name",
    fields: &[
        field("slug", &["slug", "id"], ColumnType::Text),
        field("name", &["name"], ColumnType::Text),
        field("season", &["season", "seasonName"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
        field("characteristics", &["characteristics"], ColumnType::Jsonb),
        field(
            "beauty_statement",
            &["beauty_statement", "beautyStatement"],
            ColumnType::Text,
        ),
        field(
            "unique_features",
            &["unique_features", "uniqueFeatures"],
            ColumnType::Jsonb,
        ),
        field(
            "color_combinations",
            &["color_combinations", "palette", "colorCombinations"],
            ColumnType::Jsonb,
        ),
        field(
            "art_references",
            &["art_references", "artists", "artReferences"],
            ColumnType::Jsonb,
        ),
        field("key_colors", &["key_colors", "keyColors"], ColumnType::Jsonb),
        field("avoid_colors", &["avoid_colors", "avoidColors"], ColumnType::Jsonb),
    ],
    references: &[SEASON_REF],
    required: &["slug", "name"],
    post_map: None,
};

static COLOR: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Color,
    table: "colors",
    payload_key: "colors",
    label: "Color",
    natural_key: "slug",
    group_hint: Some("category"),
    key_fallback: KeyFallback::SlugFromName,
    slug_column: Some("slug"),
    name_column: "name",
    fields: &[
        field("slug", &["slug", "id"], ColumnType::Text),
        field("name", &["name"], ColumnType::Text),
        field("hex", &["hex", "hexCode", "hex_code"], ColumnType::Text),
        field("category", &["category"], ColumnType::Text),
        field("hue", &["hue", "h"], ColumnType::Float),
        field("saturation", &["saturation", "s"], ColumnType::Float),
        field("lightness", &["lightness", "l"], ColumnType::Float),
        field("undertone", &["undertone"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
    ],
    references: &[],
    required: &["slug", "name"],
    post_map: Some(color_hsl_fallback),
};

static FABRIC: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Fabric,
    table: "fabrics",
    payload_key: "fabrics",
    label: "Fabric",
    natural_key: "slug",
    group_hint: None,
    key_fallback: KeyFallback::SlugFromName,
    slug_column: Some("slug"),
    name_column: "name",
    fields: &[
        field("slug", &["slug", "id"], ColumnType::Text),
        field("name", &["name"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
        field("texture", &["texture"], ColumnType::Text),
        field("sheen", &["sheen"], ColumnType::Text),
        field("weight", &["weight"], ColumnType::Text),
        field("drape", &["drape"], ColumnType::Text),
        field(
            "best_seasons",
            &["best_seasons", "bestSeasons", "seasons"],
            ColumnType::Jsonb,
        ),
        field("image_url", &["image_url", "imageUrl"], ColumnType::Text),
    ],
    references: &[],
    required: &["slug", "name"],
    post_map: None,
};

static ARTIST: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Artist,
    table: "artists",
    payload_key: "artists",
    label: "Artist",
    natural_key: "slug",
    group_hint: None,
    key_fallback: KeyFallback::SlugFromName,
    slug_column: Some("slug"),
    name_column: "name",
    fields: &[
        field("slug", &["slug", "id"], ColumnType::Text),
        field("name", &["name"], ColumnType::Text),
        field("bio", &["bio", "biography"], ColumnType::Text),
        field("movement", &["movement", "style"], ColumnType::Text),
        field("nationality", &["nationality"], ColumnType::Text),
        field("lifespan", &["lifespan", "years"], ColumnType::Text),
        field("image_url", &["image_url", "imageUrl"], ColumnType::Text),
    ],
    references: &[],
    required: &["slug", "name"],
    post_map: None,
};

static SEASON: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Season,
    table: "seasons",
    payload_key: "seasons",
    label: "Season",
    natural_key: "name",
    group_hint: None,
    key_fallback: KeyFallback::None,
    slug_column: None,
    name_column: "name",
    fields: &[
        field("name", &["name"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
        field("undertone", &["undertone"], ColumnType::Text),
        field("value", &["value", "depth"], ColumnType::Text),
        field("chroma", &["chroma", "clarity"], ColumnType::Text),
        field("characteristics", &["characteristics"], ColumnType::Jsonb),
    ],
    references: &[],
    required: &["name"],
    post_map: None,
};

static PAINTING: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Painting,
    table: "paintings",
    payload_key: "paintings",
    label: "Painting",
    natural_key: "title",
    group_hint: None,
    key_fallback: KeyFallback::None,
    slug_column: None,
    name_column: "title",
    fields: &[
        field("title", &["title"], ColumnType::Text),
        field("year", &["year"], ColumnType::Int),
        field("image_url", &["image_url", "imageUrl", "image"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
        field(
            "dominant_colors",
            &["dominant_colors", "dominantColors", "palette"],
            ColumnType::Jsonb,
        ),
        field("museum", &["museum"], ColumnType::Text),
    ],
    references: &[ReferenceSpec {
        column: "artist_id",
        target: EntityKind::Artist,
        id_aliases: &["artist_id", "artistId"],
        slug_aliases: &["artist_slug", "artistSlug"],
        name_aliases: &["artist_name", "artistName", "artist"],
    }],
    required: &["title"],
    post_map: None,
};

static NATURE_PHOTO: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::NaturePhoto,
    table: "nature_photos",
    payload_key: "nature_photos",
    label: "Nature photo",
    natural_key: "image_url",
    group_hint: None,
    key_fallback: KeyFallback::None,
    slug_column: None,
    name_column: "title",
    fields: &[
        field("image_url", &["image_url", "imageUrl", "url"], ColumnType::Text),
        field("title", &["title"], ColumnType::Text),
        field("description", &["description"], ColumnType::Text),
        field("photographer", &["photographer"], ColumnType::Text),
        field(
            "color_tags",
            &["color_tags", "colorTags", "colors"],
            ColumnType::Jsonb,
        ),
    ],
    references: &[SEASON_REF, SUBTYPE_REF],
    required: &["image_url"],
    post_map: None,
};

static TRAINING_SAMPLE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::TrainingSample,
    table: "training_samples",
    payload_key: "training_samples",
    label: "Training sample",
    natural_key: "photo_url",
    group_hint: None,
    key_fallback: KeyFallback::None,
    slug_column: None,
    name_column: "photo_url",
    fields: &[
        field(
            "photo_url",
            &["photo_url", "photoUrl", "image_url", "imageUrl"],
            ColumnType::Text,
        ),
        field("notes", &["notes"], ColumnType::Text),
        field("confidence", &["confidence"], ColumnType::Float),
        field("verified", &["verified"], ColumnType::Bool),
        field("skin_tone", &["skin_tone", "skinTone"], ColumnType::Text),
        field("hair_color", &["hair_color", "hairColor"], ColumnType::Text),
        field("eye_color", &["eye_color", "eyeColor"], ColumnType::Text),
    ],
    references: &[SEASON_REF, SUBTYPE_REF],
    required: &["photo_url"],
    post_map: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_order_covers_every_kind_once() {
        let mut tables: Vec<&str> = EntityKind::DISPATCH_ORDER
            .iter()
            .map(|k| k.table_name())
            .collect();
        assert_eq!(
            tables,
            vec![
                "subtypes",
                "colors",
                "fabrics",
                "artists",
                "training_samples",
                "seasons",
                "paintings",
                "nature_photos"
            ]
        );
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), 8);
    }

    #[test]
    fn natural_keys_match_conflict_targets() {
        let keys: Vec<(&str, &str)> = EntityKind::DISPATCH_ORDER
            .iter()
            .map(|k| (k.descriptor().table, k.descriptor().natural_key))
            .collect();
        assert!(keys.contains(&("seasons", "name")));
        assert!(keys.contains(&("paintings", "title")));
        assert!(keys.contains(&("nature_photos", "image_url")));
        assert!(keys.contains(&("training_samples", "photo_url")));
        assert!(keys.contains(&("colors", "slug")));
    }

    #[test]
    fn every_descriptor_knows_its_natural_key_and_provenance_columns() {
        for kind in EntityKind::DISPATCH_ORDER {
            let d = kind.descriptor();
            assert_eq!(d.kind, kind);
            assert!(d.column_type(d.natural_key).is_some(), "{}", d.table);
            assert_eq!(d.column_type(SOURCE_APP_COLUMN), Some(ColumnType::Text));
            assert_eq!(
                d.column_type(SYNCED_AT_COLUMN),
                Some(ColumnType::Timestamptz)
            );
        }
        assert_eq!(
            EntityKind::TrainingSample.descriptor().reference_targets(),
            vec![EntityKind::Season, EntityKind::Subtype]
        );
    }
}
