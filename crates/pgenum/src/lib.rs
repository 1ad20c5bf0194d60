//! Additive migrations for Postgres enum types.
//!
//! This crate provides:
//! - Extraction of the enums declared in a [`schema::Schema`] model
//! - Introspection of the enums defined in a live database
//! - A comparator emitting one `ALTER TYPE ... ADD VALUE` operation per
//!   declared value the database is missing
//! - Rendering of those operations as SQL or as a Rust migration function
//!
//! Only additions are ever generated. Removing, reordering or renaming enum
//! values is out of scope, and enums that do not exist in the database yet
//! are left to whatever creates types.
//!
//! # Comparing
//!
//! ```ignore
//! let ctx = AutogenContext::postgres(&client, [&schema]);
//! let mut ops = UpgradeOps::new();
//! compare_enums_for_additions_with_config(&ctx, &Config::default(), &mut ops, &[None]).await?;
//!
//! println!("{}", ops.render_migration("migrate"));
//! ```
//!
//! # Applying
//!
//! Generated migrations call into [`Operations`]:
//!
//! ```ignore
//! let op = Operations::new(&client);
//! op.add_enum_value(Some("public"), "user_status", "pending").await?;
//! ```

pub mod config;
mod compare;
mod declared;
mod defined;
mod error;
mod op;
mod render;
pub mod sql;
mod traced;
mod upgrade;

pub use compare::{
    AutogenContext, POSTGRES_DIALECT, compare_enums_for_additions,
    compare_enums_for_additions_with_config, diff_enum_values,
};
pub use config::{Config, NameFilter, get_configuration, set_configuration};
pub use declared::declared_enums;
pub use defined::{defined_enums, enums_from_rows, extract_enum_name};
pub use error::Error;
pub use op::{AddEnumValue, Operation, Operations};
pub use traced::{Connection, ConnectionExt, TracedConn};
pub use upgrade::UpgradeOps;

/// The schema model enums are declared in.
pub use pgenum_schema as schema;

/// Result type for pgenum operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum type names mapped to their values, in discovery order.
pub type EnumValuesByName = indexmap::IndexMap<String, Vec<String>>;
