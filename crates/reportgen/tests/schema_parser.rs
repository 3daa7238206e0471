use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use reportgen::schema::{ForeignKeyRef, SchemaCache, SchemaSource, parse, render};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

const USERS_DDL: &str =
    "CREATE TABLE users (id uuid PRIMARY KEY, email text NOT NULL, org_id uuid REFERENCES orgs(id))";

#[test]
fn parses_single_table_definition_without_terminator() {
    let schema = parse(USERS_DDL);
    let users = schema.table("users").expect("users table should parse");
    assert_eq!(users.columns.len(), 3);

    let id = users.column("id").expect("id column");
    assert!(id.is_primary_key);
    assert!(!id.nullable);
    assert_eq!(id.data_type, "uuid");

    let email = users.column("email").expect("email column");
    assert!(!email.nullable);
    assert!(!email.is_primary_key);

    let org_id = users.column("org_id").expect("org_id column");
    assert!(org_id.nullable);
    assert_eq!(
        org_id.foreign_key,
        Some(ForeignKeyRef {
            table: "orgs".to_string(),
            column: "id".to_string(),
        })
    );
}

#[test]
fn renders_tables_and_relationships() {
    let rendered = render(&parse(USERS_DDL));
    insta::assert_snapshot!(rendered.trim_end(), @r"
    ## Database Schema

    ### Tables

    #### users
    | Column | Type | Nullable | Notes |
    |--------|------|----------|-------|
    | id | uuid | no | PK |
    | email | text | no |  |
    | org_id | uuid | yes | FK → orgs.id |

    ### Relationships
    - users.org_id → orgs.id
    ");
}

#[test]
fn renders_enums_before_tables() {
    let schema = parse(
        "CREATE TYPE public.plan_tier AS ENUM ('free', 'pro', 'enterprise');\n\
         CREATE TABLE orgs (\n\
           id uuid PRIMARY KEY,\n\
           tier plan_tier NOT NULL DEFAULT 'free',\n\
           seats integer\n\
         );",
    );
    assert_eq!(schema.enums.len(), 1);
    assert_eq!(schema.enums[0].name, "plan_tier");
    assert_eq!(schema.enums[0].values, vec!["free", "pro", "enterprise"]);

    let rendered = render(&schema);
    let enums_at = rendered.find("### Enums").expect("enums section");
    let tables_at = rendered.find("### Tables").expect("tables section");
    assert!(enums_at < tables_at);
    assert!(rendered.contains("- **plan_tier**: 'free', 'pro', 'enterprise'\n"));
    assert!(rendered.contains("| tier | plan_tier | no | default: 'free' |"));
    assert!(!rendered.contains("### Relationships"));
}

#[test]
fn relationships_follow_table_then_column_order() {
    let schema = parse(
        "CREATE TABLE events (\n\
           id bigint PRIMARY KEY,\n\
           user_id uuid REFERENCES users(id),\n\
           org_id uuid REFERENCES orgs(id)\n\
         );\n\
         CREATE TABLE users (id uuid PRIMARY KEY, org_id uuid REFERENCES orgs(id));",
    );
    let edges = schema
        .relationships()
        .iter()
        .map(|edge| format!("{}.{}>{}.{}", edge.from_table, edge.from_column, edge.to_table, edge.to_column))
        .collect::<Vec<_>>();
    assert_eq!(
        edges,
        vec![
            "events.user_id>users.id",
            "events.org_id>orgs.id",
            "users.org_id>orgs.id",
        ]
    );
}

#[test]
fn ddl_file_source_is_read_lazily_and_cached() {
    let temp = unique_temp_dir("reportgen-schema-file");
    std::fs::create_dir_all(&temp).expect("temp dir should be creatable");
    let path = temp.join("schema.sql");
    std::fs::write(&path, USERS_DDL).expect("schema file should be writable");

    let cache = SchemaCache::new(SchemaSource::DdlFile(path.clone()));
    let rendered = cache.get().expect("schema should load");
    assert!(rendered.contains("#### users"));

    std::fs::write(&path, "CREATE TABLE accounts (id integer);")
        .expect("schema file should be rewritable");
    assert!(cache.get().expect("cached schema").contains("#### users"));

    cache.invalidate();
    assert!(cache.get().expect("reloaded schema").contains("#### accounts"));

    std::fs::remove_dir_all(&temp).expect("temp dir should be removable");
}

#[test]
fn sqlite_source_introspects_live_tables() {
    let temp = unique_temp_dir("reportgen-schema-sqlite");
    std::fs::create_dir_all(&temp).expect("temp dir should be creatable");
    let db_path = temp.join("analytics.db");
    {
        let connection = rusqlite::Connection::open(&db_path).expect("db should open");
        connection
            .execute_batch(
                "CREATE TABLE orgs (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 CREATE TABLE users (
                   id INTEGER PRIMARY KEY,
                   org_id INTEGER REFERENCES orgs(id),
                   plan TEXT DEFAULT 'free'
                 );",
            )
            .expect("fixture schema should apply");
    }

    let schema = SchemaSource::Sqlite(db_path)
        .load()
        .expect("sqlite schema should load");
    let names = schema
        .tables
        .iter()
        .map(|table| table.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["orgs", "users"]);

    let users = schema.table("users").expect("users table");
    let org_id = users.column("org_id").expect("org_id column");
    assert_eq!(org_id.data_type, "INTEGER");
    assert_eq!(
        org_id.foreign_key.as_ref().map(|reference| reference.table.as_str()),
        Some("orgs")
    );
    assert_eq!(
        users.column("plan").and_then(|column| column.default_value.as_deref()),
        Some("'free'")
    );
    assert!(render(&schema).contains("- users.org_id → orgs.id"));

    std::fs::remove_dir_all(&temp).expect("temp dir should be removable");
}
