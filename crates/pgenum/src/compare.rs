//! Comparing declared enums against the database and generating additions.

use pgenum_schema::Schema;

use crate::config::{Config, get_configuration};
use crate::declared::declared_enums;
use crate::defined::defined_enums;
use crate::op::AddEnumValue;
use crate::upgrade::UpgradeOps;
use crate::{Connection, ConnectionExt, EnumValuesByName, Result};

/// Dialect name of the only database engine with native enums we handle.
pub const POSTGRES_DIALECT: &str = "postgresql";

/// Everything a comparison pass needs to know about its environment.
pub struct AutogenContext<'a, C: Connection + ?Sized> {
    /// Live connection to inspect. Without one, nothing is compared.
    pub connection: Option<&'a C>,
    /// Engine name; anything but [`POSTGRES_DIALECT`] makes passes no-ops.
    pub dialect: String,
    /// The application's schema models, in registration order.
    pub metadata: Vec<&'a Schema>,
    /// Schema used for enums and candidates without one. When `None`, the
    /// connection's `current_schema()` is used.
    pub default_schema: Option<String>,
}

impl<'a, C: Connection + ?Sized> AutogenContext<'a, C> {
    pub fn new(
        connection: Option<&'a C>,
        dialect: impl Into<String>,
        metadata: impl IntoIterator<Item = &'a Schema>,
    ) -> Self {
        Self {
            connection,
            dialect: dialect.into(),
            metadata: metadata.into_iter().collect(),
            default_schema: None,
        }
    }

    /// A Postgres context over `conn`.
    pub fn postgres(conn: &'a C, metadata: impl IntoIterator<Item = &'a Schema>) -> Self {
        Self::new(Some(conn), POSTGRES_DIALECT, metadata)
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }
}

/// Append an [`AddEnumValue`] to `upgrade_ops` for every declared enum value
/// missing from the database.
///
/// Uses the process-wide configuration, read once at the start of the pass.
/// See [`compare_enums_for_additions_with_config`].
pub async fn compare_enums_for_additions<C: Connection + ?Sized>(
    ctx: &AutogenContext<'_, C>,
    upgrade_ops: &mut UpgradeOps,
    schema_names: &[Option<&str>],
) -> Result<()> {
    let config = get_configuration();
    compare_enums_for_additions_with_config(ctx, &config, upgrade_ops, schema_names).await
}

/// Append an [`AddEnumValue`] to `upgrade_ops` for every declared enum value
/// missing from the database.
///
/// Each entry of `schema_names` is compared independently; `None` stands for
/// the default schema. Enums that do not exist in the database yet are left
/// alone, as are all enums when the context is not a Postgres one.
/// Existing contents of `upgrade_ops` are kept.
pub async fn compare_enums_for_additions_with_config<C: Connection + ?Sized>(
    ctx: &AutogenContext<'_, C>,
    config: &Config,
    upgrade_ops: &mut UpgradeOps,
    schema_names: &[Option<&str>],
) -> Result<()> {
    if ctx.dialect != POSTGRES_DIALECT {
        tracing::debug!(dialect = %ctx.dialect, "dialect has no native enums, skipping");
        return Ok(());
    }
    let Some(conn) = ctx.connection else {
        tracing::debug!("no connection, skipping enum comparison");
        return Ok(());
    };

    let default_schema = match &ctx.default_schema {
        Some(schema) => schema.clone(),
        None => {
            let row = conn
                .traced()
                .query_one("SELECT current_schema()", &[])
                .await?;
            match row.try_get::<_, Option<String>>(0)? {
                Some(schema) => schema,
                None => {
                    tracing::debug!("no current schema, skipping enum comparison");
                    return Ok(());
                }
            }
        }
    };

    let include_name = config.include_name.as_ref();

    for candidate in schema_names {
        let schema = candidate.unwrap_or(&default_schema);

        let declared = declared_enums(
            ctx.metadata.iter().copied(),
            schema,
            &default_schema,
            include_name,
        );
        let defined = defined_enums(conn, schema, include_name).await?;

        tracing::debug!(
            schema,
            declared = declared.len(),
            defined = defined.len(),
            "comparing enums"
        );

        for op in diff_enum_values(&declared, &defined, schema) {
            tracing::info!(
                schema,
                enum_name = %op.enum_name,
                value = %op.value,
                "detected added enum value"
            );
            upgrade_ops.push(op);
        }
    }

    Ok(())
}

/// The additions turning `defined` into a superset of `declared`.
///
/// One operation per declared value missing from the defined list, per enum
/// present in both maps, in declared order. Enums missing from `defined` are
/// skipped.
pub fn diff_enum_values(
    declared: &EnumValuesByName,
    defined: &EnumValuesByName,
    schema: &str,
) -> Vec<AddEnumValue> {
    let mut ops = Vec::new();

    for (name, declared_values) in declared {
        let Some(defined_values) = defined.get(name) else {
            tracing::debug!(schema, enum_name = %name, "enum not in database yet, skipping");
            continue;
        };

        let mut added: Vec<&str> = Vec::new();
        for value in declared_values {
            if defined_values.contains(value) || added.contains(&value.as_str()) {
                continue;
            }
            added.push(value);
            ops.push(AddEnumValue::new(Some(schema), name.as_str(), value.as_str()));
        }
    }

    ops
}
