//! Table contracts the sync engine writes to.
//!
//! Statements are idempotent and run on every connect. Tables created by the dashboard
//! beforehand only gain the provenance columns.

use crate::domain::entity::{EntityKind, SOURCE_APP_COLUMN, SYNCED_AT_COLUMN};

pub const CREATE_TABLE_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sync_sources (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        app_name TEXT UNIQUE NOT NULL,
        app_url TEXT NOT NULL,
        export_endpoint TEXT NOT NULL DEFAULT '/api/export',
        last_sync_at TIMESTAMPTZ,
        status TEXT NOT NULL DEFAULT 'registered',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS seasons (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT UNIQUE NOT NULL,
        description TEXT,
        undertone TEXT,
        value TEXT,
        chroma TEXT,
        characteristics JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS subtypes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slug TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        season TEXT,
        season_id UUID REFERENCES seasons(id) ON DELETE SET NULL,
        description TEXT,
        characteristics JSONB,
        beauty_statement TEXT,
        unique_features JSONB,
        color_combinations JSONB,
        art_references JSONB,
        key_colors JSONB,
        avoid_colors JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS colors (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slug TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        hex TEXT,
        category TEXT,
        hue DOUBLE PRECISION,
        saturation DOUBLE PRECISION,
        lightness DOUBLE PRECISION,
        undertone TEXT,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS fabrics (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slug TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        texture TEXT,
        sheen TEXT,
        weight TEXT,
        drape TEXT,
        best_seasons JSONB,
        image_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS artists (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        slug TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        bio TEXT,
        movement TEXT,
        nationality TEXT,
        lifespan TEXT,
        image_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS paintings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT UNIQUE NOT NULL,
        artist_id UUID REFERENCES artists(id) ON DELETE SET NULL,
        year INTEGER,
        image_url TEXT,
        description TEXT,
        dominant_colors JSONB,
        museum TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS nature_photos (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        image_url TEXT UNIQUE NOT NULL,
        title TEXT,
        description TEXT,
        photographer TEXT,
        color_tags JSONB,
        season_id UUID REFERENCES seasons(id) ON DELETE SET NULL,
        subtype_id UUID REFERENCES subtypes(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS training_samples (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        photo_url TEXT UNIQUE NOT NULL,
        notes TEXT,
        confidence DOUBLE PRECISION,
        verified BOOLEAN,
        skin_tone TEXT,
        hair_color TEXT,
        eye_color TEXT,
        season_id UUID REFERENCES seasons(id) ON DELETE SET NULL,
        subtype_id UUID REFERENCES subtypes(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

/// `ALTER TABLE` statements adding the provenance columns to every entity table.
pub fn provenance_column_statements() -> Vec<String> {
    EntityKind::DISPATCH_ORDER
        .iter()
        .flat_map(|kind| {
            let table = kind.table_name();
            [
                format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} TEXT",
                    table, SOURCE_APP_COLUMN
                ),
                format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} TIMESTAMPTZ",
                    table, SYNCED_AT_COLUMN
                ),
            ]
        })
        .collect()
}
