//! Enums declared in the application's schema model.

use pgenum_schema::Schema;

use crate::EnumValuesByName;
use crate::config::NameFilter;

/// Collect the native enum types declared in `schemas` that live in `schema`.
///
/// Tables and columns are walked in registration order. Array columns count
/// for their element type and decorated types for the type they wrap.
/// Enums without an explicit schema belong to `default_schema`. When the
/// same enum type appears on several columns, the first occurrence wins.
///
/// Returns a map like `{"user_status": ["active", "inactive"]}`.
pub fn declared_enums<'a>(
    schemas: impl IntoIterator<Item = &'a Schema>,
    schema: &str,
    default_schema: &str,
    include_name: Option<&NameFilter>,
) -> EnumValuesByName {
    let mut enums = EnumValuesByName::new();

    for declared in schemas {
        for table in declared.iter_tables() {
            for column in &table.columns {
                let Some(enum_type) = column.column_type.as_enum() else {
                    continue;
                };

                if !enum_type.native {
                    tracing::trace!(
                        table_schema = ?table.schema,
                        table = %table.name,
                        column = %column.name,
                        enum_name = %enum_type.name,
                        "skipping emulated enum",
                    );
                    continue;
                }

                if let Some(filter) = include_name
                    && !filter.matches(&enum_type.name)
                {
                    continue;
                }

                let enum_schema = enum_type.schema.as_deref().unwrap_or(default_schema);
                if enum_schema != schema {
                    continue;
                }

                if !enums.contains_key(&enum_type.name) {
                    enums.insert(enum_type.name.clone(), enum_type.values());
                }
            }
        }
    }

    enums
}
