//! Integration tests against a real Postgres.
//!
//! Run with `--features test-postgres`. Uses the server named by
//! `POSTGRES_HOST`/`POSTGRES_PORT` when set, otherwise starts one with
//! testcontainers (requires docker).

#![cfg(feature = "test-postgres")]

use pgenum::schema::{Column, ColumnType, EnumType, Schema, Table};
use pgenum::{
    AutogenContext, Config, NameFilter, Operation, Operations, UpgradeOps,
    compare_enums_for_additions, compare_enums_for_additions_with_config, defined_enums,
    set_configuration,
};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

struct TestDb {
    client: Client,
    schema: String,
    host: String,
    port: u16,
    user: String,
    password: String,
    _container: Option<ContainerAsync<Postgres>>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Connect and give the test a fresh schema of its own, first on `search_path`.
async fn test_db(schema: &str) -> TestDb {
    init_tracing();

    let (container, host, port) = match std::env::var("POSTGRES_HOST") {
        Ok(host) => {
            let port = std::env::var("POSTGRES_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432);
            (None, host, port)
        }
        Err(_) => {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap().to_string();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            (Some(container), host, port)
        }
    };

    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let (client, connection) = tokio_postgres::connect(
        &format!("host={host} port={port} user={user} password={password} dbname=postgres"),
        NoTls,
    )
    .await
    .unwrap();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {e}");
        }
    });

    let quoted = pgenum::sql::quote_ident(schema);
    client
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {quoted} CASCADE; CREATE SCHEMA {quoted}; SET search_path TO {quoted}"
        ))
        .await
        .unwrap();

    TestDb {
        client,
        schema: schema.to_string(),
        host,
        port,
        user,
        password,
        _container: container,
    }
}

fn enum_schema(enum_types: impl IntoIterator<Item = EnumType>) -> Schema {
    let mut table = Table::new("things");
    for (i, enum_type) in enum_types.into_iter().enumerate() {
        table = table.with_column(Column::new(format!("c{i}"), ColumnType::Enum(enum_type)));
    }
    Schema::new().with_table(table)
}

async fn compare(db: &TestDb, model: &Schema, config: &Config) -> UpgradeOps {
    let ctx = AutogenContext::postgres(&db.client, [model]);
    let mut ops = UpgradeOps::new();
    compare_enums_for_additions_with_config(&ctx, config, &mut ops, &[Some(db.schema.as_str())])
        .await
        .unwrap();
    ops
}

async fn apply(db: &TestDb, ops: &UpgradeOps) {
    for op in ops {
        op.execute(&db.client).await.unwrap();
    }
}

async fn labels(db: &TestDb, name: &str) -> Vec<String> {
    let defined = defined_enums(&db.client, &db.schema, None).await.unwrap();
    defined.get(name).cloned().unwrap_or_default()
}

fn added_values(ops: &UpgradeOps) -> Vec<String> {
    ops.iter()
        .map(|op| match op {
            Operation::AddEnumValue(op) => op.value.clone(),
        })
        .collect()
}

#[tokio::test]
async fn test_adds_missing_values_and_is_idempotent() {
    let db = test_db("pgenum_adds").await;
    db.client
        .batch_execute("CREATE TYPE user_status AS ENUM ('active', 'inactive')")
        .await
        .unwrap();

    let model = enum_schema([EnumType::new(
        "user_status",
        ["active", "inactive", "pending", "suspended"],
    )]);

    let ops = compare(&db, &model, &Config::default()).await;
    assert_eq!(added_values(&ops), vec!["pending", "suspended"]);

    apply(&db, &ops).await;
    assert_eq!(
        labels(&db, "user_status").await,
        vec!["active", "inactive", "pending", "suspended"]
    );

    let again = compare(&db, &model, &Config::default()).await;
    assert!(again.is_empty(), "second pass generated {again}");
}

#[tokio::test]
async fn test_single_added_value() {
    let db = test_db("pgenum_single").await;
    db.client
        .batch_execute("CREATE TYPE user_status AS ENUM ('active', 'inactive')")
        .await
        .unwrap();

    let model = enum_schema([EnumType::new(
        "user_status",
        ["active", "inactive", "pending"],
    )]);

    let ops = compare(&db, &model, &Config::default()).await;
    assert_eq!(ops.len(), 1);
    assert_eq!(
        ops.to_sql(),
        "ALTER TYPE \"pgenum_single\".\"user_status\" ADD VALUE 'pending';\n"
    );
}

#[tokio::test]
async fn test_enum_missing_from_database_is_skipped() {
    let db = test_db("pgenum_missing").await;

    let model = enum_schema([EnumType::new("new_enum", ["a", "b"])]);
    let ops = compare(&db, &model, &Config::default()).await;
    assert!(ops.is_empty());
}

#[tokio::test]
async fn test_zero_label_enum() {
    let db = test_db("pgenum_empty").await;
    db.client
        .batch_execute("CREATE TYPE empty_enum AS ENUM ()")
        .await
        .unwrap();
    assert!(labels(&db, "empty_enum").await.is_empty());

    let model = enum_schema([EnumType::new("empty_enum", ["first", "second"])]);
    let ops = compare(&db, &model, &Config::default()).await;
    assert_eq!(added_values(&ops), vec!["first", "second"]);

    apply(&db, &ops).await;
    assert_eq!(labels(&db, "empty_enum").await, vec!["first", "second"]);
}

#[tokio::test]
async fn test_quoted_names_outside_search_path() {
    let db = test_db("Pg Enum Quoted").await;
    db.client
        .batch_execute(
            r#"CREATE TYPE "Pg Enum Quoted"."UserStatus" AS ENUM ('Active');
               SET search_path TO public"#,
        )
        .await
        .unwrap();

    // Off the search path, the catalog reports the qualified, quoted name.
    let row = db
        .client
        .query_one(
            "SELECT format_type('\"Pg Enum Quoted\".\"UserStatus\"'::regtype, NULL)",
            &[],
        )
        .await
        .unwrap();
    let display: String = row.get(0);
    assert_eq!(display, r#""Pg Enum Quoted"."UserStatus""#);
    assert_eq!(labels(&db, "UserStatus").await, vec!["Active"]);

    let model = enum_schema([EnumType::new("UserStatus", ["Active", "Pending"])
        .in_schema("Pg Enum Quoted")]);
    let ops = compare(&db, &model, &Config::default()).await;
    assert_eq!(added_values(&ops), vec!["Pending"]);

    apply(&db, &ops).await;
    assert_eq!(labels(&db, "UserStatus").await, vec!["Active", "Pending"]);
}

#[tokio::test]
async fn test_special_characters_round_trip_through_rendering() {
    let db = test_db("pgenum_special").await;
    db.client
        .batch_execute("CREATE TYPE mood AS ENUM ('ok')")
        .await
        .unwrap();

    let wanted = ["ok", "it's", r"back\slash", r#"say "hi""#, "o''clock"];
    let model = enum_schema([EnumType::new("mood", wanted)]);

    let ops = compare(&db, &model, &Config::default()).await;
    assert_eq!(ops.len(), 4);

    // Apply the migration as the rendered script would.
    let script = ops.render_migration("migrate");
    let handle = Operations::new(&db.client);
    for line in script.lines().map(str::trim).filter(|l| l.starts_with("op.")) {
        let op = Operation::parse_rendered(line).unwrap();
        handle.invoke(&op).await.unwrap();
    }

    assert_eq!(labels(&db, "mood").await, wanted);
    assert!(compare(&db, &model, &Config::default()).await.is_empty());
}

#[tokio::test]
async fn test_operations_handle() {
    let db = test_db("pgenum_handle").await;
    db.client
        .batch_execute("CREATE TYPE mood AS ENUM ('ok')")
        .await
        .unwrap();

    let op = Operations::new(&db.client);
    op.add_enum_value(Some("pgenum_handle"), "mood", "great")
        .await
        .unwrap();
    // Resolved through search_path.
    op.add_enum_value(None, "mood", "meh").await.unwrap();

    assert_eq!(labels(&db, "mood").await, vec!["ok", "great", "meh"]);

    // Adding an existing label is a database error, passed through as-is.
    let err = op
        .add_enum_value(Some("pgenum_handle"), "mood", "ok")
        .await
        .unwrap_err();
    assert!(matches!(err, pgenum::Error::Postgres(_)));
}

#[tokio::test]
async fn test_include_name_filter() {
    let db = test_db("pgenum_filter").await;
    db.client
        .batch_execute(
            "CREATE TYPE user_status AS ENUM ('active');
             CREATE TYPE user_role AS ENUM ('admin')",
        )
        .await
        .unwrap();

    let model = enum_schema([
        EnumType::new("user_status", ["active", "pending"]),
        EnumType::new("user_role", ["admin", "editor"]),
    ]);

    let config = Config::new().include_name(NameFilter::suffix("_status"));
    let ops = compare(&db, &model, &config).await;
    assert_eq!(added_values(&ops), vec!["pending"]);

    let all = compare(&db, &model, &Config::default()).await;
    assert_eq!(added_values(&all), vec!["pending", "editor"]);
}

#[tokio::test]
async fn test_default_schema_candidate() {
    let db = test_db("pgenum_default").await;
    db.client
        .batch_execute("CREATE TYPE mood AS ENUM ('ok')")
        .await
        .unwrap();

    // The enum carries no schema of its own, so it follows the default.
    let model = enum_schema([EnumType::new("mood", ["ok", "good"])]);

    let explicit = compare(&db, &model, &Config::default()).await;

    let ctx = AutogenContext::postgres(&db.client, [&model]);
    let mut from_current = UpgradeOps::new();
    compare_enums_for_additions_with_config(&ctx, &Config::default(), &mut from_current, &[None])
        .await
        .unwrap();
    assert_eq!(from_current, explicit);

    let ctx = AutogenContext::postgres(&db.client, [&model]).with_default_schema("pgenum_default");
    let mut from_context = UpgradeOps::new();
    compare_enums_for_additions_with_config(&ctx, &Config::default(), &mut from_context, &[None])
        .await
        .unwrap();
    assert_eq!(from_context, explicit);
    assert_eq!(added_values(&explicit), vec!["good"]);
}

#[tokio::test]
async fn test_schemas_are_compared_independently() {
    let db = test_db("pgenum_multi_a").await;
    db.client
        .batch_execute(
            "DROP SCHEMA IF EXISTS pgenum_multi_b CASCADE;
             CREATE SCHEMA pgenum_multi_b;
             CREATE TYPE pgenum_multi_a.mood AS ENUM ('ok');
             CREATE TYPE pgenum_multi_b.mood AS ENUM ('ok', 'good')",
        )
        .await
        .unwrap();

    let model = enum_schema([
        EnumType::new("mood", ["ok", "good"]).in_schema("pgenum_multi_a"),
        EnumType::new("mood", ["ok", "good", "great"]).in_schema("pgenum_multi_b"),
    ]);

    let ctx = AutogenContext::postgres(&db.client, [&model]);
    let mut ops = UpgradeOps::new();
    compare_enums_for_additions_with_config(
        &ctx,
        &Config::default(),
        &mut ops,
        &[Some("pgenum_multi_a"), Some("pgenum_multi_b")],
    )
    .await
    .unwrap();

    assert_eq!(
        ops.to_sql(),
        "ALTER TYPE \"pgenum_multi_a\".\"mood\" ADD VALUE 'good';\n\
         ALTER TYPE \"pgenum_multi_b\".\"mood\" ADD VALUE 'great';\n"
    );
}

#[tokio::test]
async fn test_inside_transaction() {
    let mut db = test_db("pgenum_tx").await;
    db.client
        .batch_execute("CREATE TYPE mood AS ENUM ('ok')")
        .await
        .unwrap();

    let model = enum_schema([EnumType::new("mood", ["ok", "fine"])]);

    let tx = db.client.transaction().await.unwrap();
    let ctx = AutogenContext::postgres(&tx, [&model]);
    let mut ops = UpgradeOps::new();
    compare_enums_for_additions_with_config(&ctx, &Config::default(), &mut ops, &[Some("pgenum_tx")])
        .await
        .unwrap();
    for op in &ops {
        op.execute(&tx).await.unwrap();
    }
    tx.commit().await.unwrap();

    assert_eq!(labels(&db, "mood").await, vec!["ok", "fine"]);
}

#[tokio::test]
async fn test_pooled_connection() {
    let db = test_db("pgenum_pool").await;
    db.client
        .batch_execute("CREATE TYPE mood AS ENUM ('ok')")
        .await
        .unwrap();

    let pool = deadpool_postgres::Config {
        host: Some(db.host.clone()),
        port: Some(db.port),
        user: Some(db.user.clone()),
        password: Some(db.password.clone()),
        dbname: Some("postgres".to_string()),
        ..Default::default()
    }
    .create_pool(Some(deadpool_postgres::Runtime::Tokio1), NoTls)
    .unwrap();
    let conn = pool.get().await.unwrap();

    let model = enum_schema([EnumType::new("mood", ["ok", "pooled"]).in_schema("pgenum_pool")]);
    let ctx = AutogenContext::postgres(&conn, [&model]);
    let mut ops = UpgradeOps::new();
    compare_enums_for_additions_with_config(&ctx, &Config::default(), &mut ops, &[Some("pgenum_pool")])
        .await
        .unwrap();
    assert_eq!(added_values(&ops), vec!["pooled"]);

    for op in &ops {
        op.execute(&conn).await.unwrap();
    }
    assert_eq!(labels(&db, "mood").await, vec!["ok", "pooled"]);
}

// The only test touching the process-wide configuration.
#[tokio::test]
async fn test_process_wide_configuration() {
    let db = test_db("pgenum_global").await;
    db.client
        .batch_execute(
            "CREATE TYPE user_status AS ENUM ('active');
             CREATE TYPE user_role AS ENUM ('admin')",
        )
        .await
        .unwrap();

    let model = enum_schema([
        EnumType::new("user_status", ["active", "pending"]),
        EnumType::new("user_role", ["admin", "editor"]),
    ]);

    set_configuration(Config::new().include_name(NameFilter::only(["user_role"])));
    let ctx = AutogenContext::postgres(&db.client, [&model]);
    let mut ops = UpgradeOps::new();
    let result = compare_enums_for_additions(&ctx, &mut ops, &[Some("pgenum_global")]).await;
    set_configuration(Config::default());

    result.unwrap();
    assert_eq!(added_values(&ops), vec!["editor"]);
}
