//! Shared test utilities for compiler, command and output tests.

use std::io::Write;

use tempfile::NamedTempFile;

use crate::commands::Execute;
use crate::config::Config;
use crate::schema::{
    Column, ColumnType, Entity, ForeignKey, JunctionTable, ReferentialAction, RelationType,
    Relationship, Table,
};

/// Create a temporary file containing the given content.
///
/// Used to hand entity JSON to commands.
pub fn create_temp_json_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

/// Execute a command with the default configuration.
pub fn execute_cmd<C: Execute>(cmd: C) -> Result<C::Output, Box<dyn std::error::Error>> {
    cmd.execute(&Config::default())
}

// =============================================================================
// Entity fixtures
// =============================================================================

/// `user(id uuid primary, email varchar(255) unique)`.
pub fn user_entity() -> Entity {
    let table = Table::new("user")
        .with_column("id", Column::new(ColumnType::uuid()).primary())
        .with_column("email", Column::new(ColumnType::string(255)).unique())
        .with_primary_key(["id"]);
    Entity::new("user", "user", "users", table)
}

/// `post(id uuid primary, title text, authorId uuid)` with a many-to-one
/// `author` relationship to `user`.
pub fn post_entity() -> Entity {
    let table = Table::new("post")
        .with_column("id", Column::new(ColumnType::uuid()).primary())
        .with_column("title", Column::new(ColumnType::text()))
        .with_column("authorId", Column::new(ColumnType::uuid()))
        .with_primary_key(["id"]);
    Entity::new("post", "post", "posts", table).with_relationship(Relationship::new(
        "author",
        RelationType::ManyToOne,
        "post",
        "user",
        ForeignKey::new("authorId", "id")
            .on_delete(ReferentialAction::Cascade)
            .indexed(),
    ))
}

/// `tag(id integer primary, name text)`.
pub fn tag_entity() -> Entity {
    let table = Table::new("tag")
        .with_column("id", Column::new(ColumnType::integer()).primary())
        .with_column("name", Column::new(ColumnType::text()))
        .with_primary_key(["id"]);
    Entity::new("tag", "tag", "tags", table)
}

/// Many-to-many `post` <-> `tag` through `post_tags(postId, tagId)`.
pub fn post_tags_relationship() -> Relationship {
    Relationship::new(
        "tags",
        RelationType::ManyToMany,
        "post",
        "tag",
        ForeignKey::new("id", "id"),
    )
    .with_junction(JunctionTable::new("post_tags", "postId", "tagId"))
}

// =============================================================================
// JSON fixtures
// =============================================================================

/// A single entity object.
pub const USER_JSON: &str = r#"
{
    "id": "user",
    "name": {"singular": "user", "plural": "users"},
    "table": {
        "name": "user",
        "columns": {
            "id": {"type": "uuid", "primary": true, "default": {"generator": "random_uuid"}},
            "email": {"type": "string", "max_length": 255, "unique": true},
            "bio": {"type": "string", "nullable": true}
        },
        "primary_key": ["id"]
    }
}
"#;

/// An array of three related entities.
pub const BLOG_JSON: &str = r#"
[
    {
        "id": "user",
        "name": {"singular": "user", "plural": "users"},
        "table": {
            "name": "user",
            "columns": {
                "id": {"type": "uuid", "primary": true},
                "email": {"type": "string", "max_length": 255, "unique": true}
            },
            "primary_key": ["id"]
        }
    },
    {
        "id": "post",
        "name": {"singular": "post", "plural": "posts"},
        "table": {
            "name": "post",
            "columns": {
                "id": {"type": "uuid", "primary": true},
                "title": {"type": "string"},
                "authorId": {"type": "uuid"}
            },
            "primary_key": ["id"]
        },
        "relationships": [
            {
                "name": "author",
                "relation_type": "many-to-one",
                "local": "post",
                "foreign": "user",
                "foreign_key": {
                    "local_column": "authorId",
                    "foreign_column": "id",
                    "on_delete": "cascade",
                    "indexed": true
                }
            },
            {
                "name": "tags",
                "relation_type": "many-to-many",
                "local": "post",
                "foreign": "tag",
                "foreign_key": {"local_column": "id", "foreign_column": "id"},
                "junction": {"name": "post_tags", "local_column": "postId", "foreign_column": "tagId"}
            }
        ],
        "indexes": [
            {"name": "idx_post_title", "table_name": "post", "columns": ["title"]}
        ]
    },
    {
        "id": "tag",
        "name": {"singular": "tag", "plural": "tags"},
        "table": {
            "name": "tag",
            "columns": {
                "id": {"type": "integer", "primary": true, "auto_increment": true},
                "name": {"type": "string", "max_length": 64, "unique": true}
            },
            "primary_key": ["id"]
        }
    }
]
"#;

/// An entity whose table has no primary key.
pub const BROKEN_JSON: &str = r#"
{
    "id": "broken",
    "name": {"singular": "broken", "plural": "brokens"},
    "table": {
        "name": "broken",
        "columns": {"x": {"type": "integer"}}
    }
}
"#;

/// A valid user and tag around a post whose relationship type is unknown.
pub const SIDEWAYS_JSON: &str = r#"
[
    {
        "id": "user",
        "name": {"singular": "user", "plural": "users"},
        "table": {"name": "user", "columns": {"id": {"type": "uuid", "primary": true}}}
    },
    {
        "id": "post",
        "name": {"singular": "post", "plural": "posts"},
        "table": {
            "name": "post",
            "columns": {"id": {"type": "uuid", "primary": true}, "authorId": {"type": "uuid"}}
        },
        "relationships": [{
            "name": "author",
            "relation_type": "sideways",
            "local": "post",
            "foreign": "user",
            "foreign_key": {"local_column": "authorId", "foreign_column": "id"}
        }]
    },
    {
        "id": "tag",
        "name": {"singular": "tag", "plural": "tags"},
        "table": {"name": "tag", "columns": {"id": {"type": "integer", "primary": true}}}
    }
]
"#;
