//! Schema model types for pgenum.
//!
//! This crate describes tables, columns and column types the way the
//! application declares them. It performs no I/O: the embedding migration
//! framework builds a [`Schema`] and hands it to `pgenum` for comparison
//! against a live database.
//!
//! ```
//! use pgenum_schema::{Column, ColumnType, EnumType, Schema, Table};
//!
//! let schema = Schema::new().with_table(
//!     Table::new("users").with_column(Column::new(
//!         "status",
//!         ColumnType::Enum(EnumType::new("user_status", ["active", "inactive"])),
//!     )),
//! );
//! assert_eq!(schema.tables.len(), 1);
//! ```

use indexmap::IndexMap;

/// Postgres scalar column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC (arbitrary precision)
    Numeric,
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMPTZ
    Timestamptz,
    /// DATE
    Date,
    /// UUID
    Uuid,
    /// JSONB
    Jsonb,
}

/// A Rust enum that is stored as a Postgres enum.
///
/// The database label of each variant is [`PgEnum::value`], which may differ
/// from the variant's Rust name.
///
/// ```
/// use pgenum_schema::PgEnum;
///
/// #[derive(Clone, Copy)]
/// enum OrderStatus {
///     Draft,
///     Shipped,
/// }
///
/// impl PgEnum for OrderStatus {
///     const TYPE_NAME: &'static str = "order_status";
///
///     fn variants() -> &'static [Self] {
///         &[OrderStatus::Draft, OrderStatus::Shipped]
///     }
///
///     fn variant_name(&self) -> &'static str {
///         match self {
///             OrderStatus::Draft => "Draft",
///             OrderStatus::Shipped => "Shipped",
///         }
///     }
///
///     fn value(&self) -> &'static str {
///         match self {
///             OrderStatus::Draft => "draft",
///             OrderStatus::Shipped => "shipped",
///         }
///     }
/// }
/// ```
pub trait PgEnum: Sized + 'static {
    /// Name of the Postgres enum type.
    const TYPE_NAME: &'static str;

    /// All variants, in declaration order.
    fn variants() -> &'static [Self];

    /// The Rust-side name of this variant.
    fn variant_name(&self) -> &'static str;

    /// The label stored in the database for this variant.
    fn value(&self) -> &'static str;
}

/// One member of a Rust enum mapped to a Postgres enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Rust variant name
    pub name: String,
    /// Database label
    pub value: String,
}

/// The Rust enum a Postgres enum type was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustEnum {
    /// Members in declaration order
    pub members: Vec<EnumMember>,
}

/// An enum column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Type name, unqualified
    pub name: String,
    /// Owning schema, `None` means the connection's default schema
    pub schema: Option<String>,
    /// Labels carried by the type itself (variant names for Rust enums)
    pub labels: Vec<String>,
    /// Source Rust enum, if the type was built from one
    pub rust_enum: Option<RustEnum>,
    /// Whether the type is a native Postgres enum. Emulated enums (a text
    /// column with a CHECK constraint) set this to false.
    pub native: bool,
}

impl EnumType {
    /// Create a native enum type from a list of labels.
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            schema: None,
            labels: labels.into_iter().map(Into::into).collect(),
            rust_enum: None,
            native: true,
        }
    }

    /// Create a native enum type from a Rust enum.
    pub fn from_rust<T: PgEnum>() -> Self {
        let members: Vec<EnumMember> = T::variants()
            .iter()
            .map(|v| EnumMember {
                name: v.variant_name().to_string(),
                value: v.value().to_string(),
            })
            .collect();

        Self {
            name: T::TYPE_NAME.to_string(),
            schema: None,
            labels: members.iter().map(|m| m.name.clone()).collect(),
            rust_enum: Some(RustEnum { members }),
            native: true,
        }
    }

    /// Place this type in an explicit schema.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Mark this type as emulated rather than a native Postgres enum.
    pub fn non_native(mut self) -> Self {
        self.native = false;
        self
    }

    /// The values this type stores in the database, in declaration order.
    ///
    /// For types built from a Rust enum these are the members' values,
    /// otherwise the type's own labels.
    pub fn values(&self) -> Vec<String> {
        match &self.rust_enum {
            Some(rust_enum) => rust_enum.members.iter().map(|m| m.value.clone()).collect(),
            None => self.labels.clone(),
        }
    }
}

/// The declared type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// A plain scalar type
    Builtin(PgType),
    /// An enum type
    Enum(EnumType),
    /// An array of some element type
    Array(Box<ColumnType>),
    /// An application-level wrapper around another type. Storage is `inner`.
    Decorated {
        /// Wrapper name
        name: String,
        /// Wrapped type
        inner: Box<ColumnType>,
    },
}

impl ColumnType {
    /// Wrap a type in an array.
    pub fn array_of(element: ColumnType) -> Self {
        ColumnType::Array(Box::new(element))
    }

    /// Wrap a type in a named decorator.
    pub fn decorated(name: impl Into<String>, inner: ColumnType) -> Self {
        ColumnType::Decorated {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    /// Strip every decorator layer and return the storage type.
    pub fn underlying(&self) -> &ColumnType {
        let mut ty = self;
        while let ColumnType::Decorated { inner, .. } = ty {
            ty = inner;
        }
        ty
    }

    /// The enum type stored by this column, looking through decorators and
    /// one level of array.
    pub fn as_enum(&self) -> Option<&EnumType> {
        let ty = match self.underlying() {
            ColumnType::Array(element) => element.underlying(),
            other => other,
        };
        match ty {
            ColumnType::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Owning schema, if explicit. Tables named alike in different schemas
    /// are distinct.
    pub schema: Option<String>,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
        }
    }

    /// Place this table in an explicit schema.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Append a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}

/// Identifies a table within a [`Schema`]: its explicit schema, if any, and
/// its name.
pub type TableKey = (Option<String>, String);

/// A complete declared schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Tables in registration order
    pub tables: IndexMap<TableKey, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. Registering the same schema and name again replaces
    /// the earlier table in place.
    pub fn with_table(mut self, table: Table) -> Self {
        let key = (table.schema.clone(), table.name.clone());
        self.tables.insert(key, table);
        self
    }

    /// Iterate over all tables in registration order.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}
