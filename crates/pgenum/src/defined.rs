//! Enums currently defined in the database catalog.

use crate::config::NameFilter;
use crate::sql::{Ident, unquote_ident};
use crate::{Connection, ConnectionExt, EnumValuesByName, Result};

/// Every enum type in a schema with its labels in `enumsortorder` order.
///
/// `format_type` renders the name the way `search_path` would need it
/// spelled, so it may come back schema-qualified and/or quoted.
const ENUMS_IN_SCHEMA_SQL: &str = r#"
SELECT
    pg_catalog.format_type(t.oid, NULL)::text,
    ARRAY(
        SELECT e.enumlabel::text
        FROM pg_catalog.pg_enum e
        WHERE e.enumtypid = t.oid
        ORDER BY e.enumsortorder
    )
FROM pg_catalog.pg_type t
LEFT JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE t.typtype = 'e'
  AND n.nspname = $1
"#;

/// Query the enum types defined in `schema`.
///
/// Returns a map like `{"user_status": ["active", "inactive"]}`. An enum with
/// no labels maps to an empty list. Query failures are returned as-is.
pub async fn defined_enums<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    include_name: Option<&NameFilter>,
) -> Result<EnumValuesByName> {
    let rows = conn.traced().query(ENUMS_IN_SCHEMA_SQL, &[&schema]).await?;

    let mut raw = Vec::with_capacity(rows.len());
    for row in rows {
        let display_name: String = row.try_get(0)?;
        let labels: Vec<String> = row.try_get(1)?;
        raw.push((display_name, labels));
    }

    Ok(enums_from_rows(raw, schema, include_name))
}

/// Build the defined-enum map from catalog rows of `(display name, labels)`.
pub fn enums_from_rows(
    rows: impl IntoIterator<Item = (String, Vec<String>)>,
    schema: &str,
    include_name: Option<&NameFilter>,
) -> EnumValuesByName {
    rows.into_iter()
        .map(|(display_name, labels)| (extract_enum_name(&display_name, schema), labels))
        .filter(|(name, _)| include_name.is_none_or(|f| f.matches(name)))
        .collect()
}

/// Reduce a catalog display name to the bare type name.
///
/// A leading `schema.` prefix, or the quoted form `format_type` writes for
/// names needing quotes (`"my schema".`, `"we""ird".`), is removed only when
/// it names `schema` exactly; anything else is left alone. Then one layer of double
/// quotes is removed.
///
/// ```
/// use pgenum::extract_enum_name;
///
/// assert_eq!(extract_enum_name("app.user_status", "app"), "user_status");
/// assert_eq!(extract_enum_name("\"My App\".\"Status\"", "My App"), "Status");
/// assert_eq!(extract_enum_name("other.user_status", "app"), "other.user_status");
/// ```
pub fn extract_enum_name(display_name: &str, schema: &str) -> String {
    let schema_prefix = format!("{schema}.");
    let quoted_schema_prefix = format!("{}.", Ident(schema));

    let name = if let Some(rest) = display_name.strip_prefix(&schema_prefix) {
        rest
    } else if let Some(rest) = display_name.strip_prefix(&quoted_schema_prefix) {
        rest
    } else {
        display_name
    };

    unquote_ident(name)
}
