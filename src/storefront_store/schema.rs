//! SQLite schema for the storefront database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

// =============================================================================
// Version 1 - Reviews and display configuration
// =============================================================================

const REVIEWS_TABLE_V1: Table = Table {
    name: "reviews",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("username", &SqlType::Text, non_null = true),
        // Kept untyped-tolerant: rows edited by hand may hold NULL or text.
        sqlite_column!("rating", &SqlType::Integer),
        sqlite_column!("text", &SqlType::Text, non_null = true),
        sqlite_column!("service", &SqlType::Text),
        sqlite_column!(
            "approved",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "likes_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("photo_url", &SqlType::Text),
        sqlite_column!("avatar_url", &SqlType::Text),
    ],
    indices: &[("idx_reviews_approved_created", "approved, created_at DESC")],
    primary_key: &[],
};

/// Single-row key/value documents, `settings` -> `public` holds the JSON
/// settings document.
const CONFIG_DOCUMENTS_TABLE_V1: Table = Table {
    name: "config_documents",
    columns: &[
        sqlite_column!("collection", &SqlType::Text, non_null = true),
        sqlite_column!("document_id", &SqlType::Text, non_null = true),
        sqlite_column!("body", &SqlType::Text, non_null = true), // JSON
    ],
    indices: &[],
    primary_key: &["collection", "document_id"],
};

const PLATFORMS_TABLE_V1: Table = Table {
    name: "platforms",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("logo_url", &SqlType::Text, non_null = true),
        sqlite_column!("whatsapp_url", &SqlType::Text),
        sqlite_column!("sort_order", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
    ],
    indices: &[("idx_platforms_active_order", "active, sort_order")],
    primary_key: &[],
};

const SCREENS_TABLE_V1: Table = Table {
    name: "screens",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("image_url", &SqlType::Text, non_null = true),
        sqlite_column!("sort_order", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
    ],
    indices: &[("idx_screens_active_order", "active, sort_order")],
    primary_key: &[],
};

// =============================================================================
// Version 2 - Per-visitor like records
// =============================================================================

const REVIEW_LIKES_TABLE_V2: Table = Table {
    name: "review_likes",
    columns: &[
        sqlite_column!("review_id", &SqlType::Text, non_null = true),
        sqlite_column!("anonymous_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    primary_key: &["review_id", "anonymous_id"],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    REVIEW_LIKES_TABLE_V2.create(conn)
}

// =============================================================================
// Version 3 - Legacy avatar field and imported like base
// =============================================================================

const REVIEWS_TABLE_V3: Table = Table {
    name: "reviews",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("username", &SqlType::Text, non_null = true),
        sqlite_column!("rating", &SqlType::Integer),
        sqlite_column!("text", &SqlType::Text, non_null = true),
        sqlite_column!("service", &SqlType::Text),
        sqlite_column!(
            "approved",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "likes_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("photo_url", &SqlType::Text),
        sqlite_column!("avatar_url", &SqlType::Text),
        sqlite_column!("avatar", &SqlType::Text),
        // Likes carried over from counter-only data, with no like records.
        sqlite_column!(
            "legacy_likes",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_reviews_approved_created", "approved, created_at DESC")],
    primary_key: &[],
};

fn migrate_v2_to_v3(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute("ALTER TABLE reviews ADD COLUMN avatar TEXT", [])?;
    conn.execute(
        "ALTER TABLE reviews ADD COLUMN legacy_likes INTEGER NOT NULL DEFAULT 0",
        [],
    )?;
    // Whatever the counter holds beyond the recorded likes predates them.
    conn.execute(
        "UPDATE reviews SET legacy_likes = MAX(likes_count - (
            SELECT COUNT(*) FROM review_likes WHERE review_likes.review_id = reviews.id
        ), 0)",
        [],
    )?;
    Ok(())
}

/// Version 1: reviews, config documents, platforms, screens
/// Version 2: review like records
/// Version 3: reviews.avatar and reviews.legacy_likes
pub const STOREFRONT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[
            REVIEWS_TABLE_V1,
            CONFIG_DOCUMENTS_TABLE_V1,
            PLATFORMS_TABLE_V1,
            SCREENS_TABLE_V1,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[
            REVIEWS_TABLE_V1,
            CONFIG_DOCUMENTS_TABLE_V1,
            PLATFORMS_TABLE_V1,
            SCREENS_TABLE_V1,
            REVIEW_LIKES_TABLE_V2,
        ],
        migration: Some(migrate_v1_to_v2),
    },
    VersionedSchema {
        version: 3,
        tables: &[
            REVIEWS_TABLE_V3,
            CONFIG_DOCUMENTS_TABLE_V1,
            PLATFORMS_TABLE_V1,
            SCREENS_TABLE_V1,
            REVIEW_LIKES_TABLE_V2,
        ],
        migration: Some(migrate_v2_to_v3),
    },
];
