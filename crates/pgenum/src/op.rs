//! Schema change operations.
//!
//! The set of operations is closed: [`Operation`] lists every kind of change
//! pgenum generates. Each one can be executed against a connection, rendered
//! as a line of a generated migration script, and turned into SQL.

use std::fmt;

use crate::render::{self, Cursor};
use crate::sql::{Lit, qualified_type_name};
use crate::{Connection, ConnectionExt, Error, Result};

/// Append one label to an existing enum type.
///
/// Executes `ALTER TYPE "schema"."name" ADD VALUE 'value'`, which neither
/// rewrites the type's data nor takes an exclusive lock on tables using it.
///
/// Postgres does not let a transaction use a label added in that same
/// transaction, so a migration runner that inserts rows with the new value
/// must commit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddEnumValue {
    /// Schema owning the enum type. `None` resolves through `search_path`.
    pub schema: Option<String>,
    /// Enum type name, unqualified and unquoted
    pub enum_name: String,
    /// The label to append
    pub value: String,
}

impl AddEnumValue {
    /// Method name used in rendered migration scripts.
    pub const RENDER_METHOD: &'static str = "add_enum_value";

    pub fn new(schema: Option<&str>, enum_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            enum_name: enum_name.into(),
            value: value.into(),
        }
    }

    /// The statement this operation executes.
    ///
    /// ```
    /// use pgenum::AddEnumValue;
    ///
    /// let op = AddEnumValue::new(Some("public"), "user_status", "o'neil");
    /// assert_eq!(
    ///     op.to_sql(),
    ///     r#"ALTER TYPE "public"."user_status" ADD VALUE 'o''neil'"#
    /// );
    /// ```
    pub fn to_sql(&self) -> String {
        format!(
            "ALTER TYPE {} ADD VALUE {}",
            qualified_type_name(self.schema.as_deref(), &self.enum_name),
            Lit(&self.value)
        )
    }

    /// Run the statement on `conn`.
    pub async fn execute<C: Connection + ?Sized>(&self, conn: &C) -> Result<()> {
        conn.traced().execute(&self.to_sql(), &[]).await?;
        Ok(())
    }

    /// Enum labels cannot be removed, so this always fails.
    pub fn reverse(&self) -> Result<Operation> {
        Err(Error::Irreversible {
            operation: self.to_string(),
        })
    }

    /// Render as one line of a generated migration script.
    ///
    /// ```
    /// use pgenum::AddEnumValue;
    ///
    /// let op = AddEnumValue::new(Some("public"), "user_status", "pending");
    /// assert_eq!(
    ///     op.render(),
    ///     r#"op.add_enum_value(Some("public"), "user_status", "pending").await?;"#
    /// );
    /// ```
    pub fn render(&self) -> String {
        let schema = match &self.schema {
            Some(schema) => format!("Some({})", render::string_literal(schema)),
            None => "None".to_string(),
        };
        format!(
            "op.{}({}, {}, {}).await?;",
            Self::RENDER_METHOD,
            schema,
            render::string_literal(&self.enum_name),
            render::string_literal(&self.value)
        )
    }

    /// Parse a line produced by [`AddEnumValue::render`].
    ///
    /// Surrounding whitespace and whitespace between tokens are ignored.
    pub fn parse_rendered(line: &str) -> Result<Self> {
        let mut cur = Cursor::new(line)?;

        cur.ident("op")?;
        cur.punct('.')?;
        cur.ident(Self::RENDER_METHOD)?;

        let mut args = cur.parens()?;
        let schema = if args.eat_ident("None") {
            None
        } else {
            args.ident("Some")?;
            let mut inner = args.parens()?;
            let schema = inner.string_literal()?;
            inner.finish()?;
            Some(schema)
        };
        args.punct(',')?;
        let enum_name = args.string_literal()?;
        args.punct(',')?;
        let value = args.string_literal()?;
        args.eat_punct(',');
        args.finish()?;

        cur.punct('.')?;
        cur.ident("await")?;
        cur.punct('?')?;
        cur.eat_punct(';');
        cur.finish()?;

        Ok(Self {
            schema,
            enum_name,
            value,
        })
    }
}

impl fmt::Display for AddEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(
                f,
                "+ enum value {}.{}: {}",
                schema,
                self.enum_name,
                Lit(&self.value)
            ),
            None => write!(f, "+ enum value {}: {}", self.enum_name, Lit(&self.value)),
        }
    }
}

/// A single generated schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Append a label to an enum type.
    AddEnumValue(AddEnumValue),
}

impl Operation {
    /// The SQL statement for this change.
    pub fn to_sql(&self) -> String {
        match self {
            Operation::AddEnumValue(op) => op.to_sql(),
        }
    }

    /// Apply this change on `conn`.
    pub async fn execute<C: Connection + ?Sized>(&self, conn: &C) -> Result<()> {
        match self {
            Operation::AddEnumValue(op) => op.execute(conn).await,
        }
    }

    /// The change undoing this one, if there is one.
    pub fn reverse(&self) -> Result<Operation> {
        match self {
            Operation::AddEnumValue(op) => op.reverse(),
        }
    }

    /// One line of Rust for a generated migration script.
    pub fn render(&self) -> String {
        match self {
            Operation::AddEnumValue(op) => op.render(),
        }
    }

    /// Parse a line produced by [`Operation::render`].
    pub fn parse_rendered(line: &str) -> Result<Self> {
        let mut cur = Cursor::new(line)?;
        cur.ident("op")?;
        cur.punct('.')?;
        match cur.any_ident()?.as_str() {
            AddEnumValue::RENDER_METHOD => {
                AddEnumValue::parse_rendered(line).map(Operation::AddEnumValue)
            }
            _ => Err(Error::Parse {
                input: line.to_string(),
                reason: "unknown operation".to_string(),
            }),
        }
    }
}

impl From<AddEnumValue> for Operation {
    fn from(op: AddEnumValue) -> Self {
        Operation::AddEnumValue(op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AddEnumValue(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// The handle generated migration scripts call into.
///
/// A rendered script contains lines such as
/// `op.add_enum_value(Some("public"), "user_status", "pending").await?;`,
/// where `op` is an `Operations` wrapping the migration's connection.
pub struct Operations<'a, C: Connection + ?Sized> {
    conn: &'a C,
}

impl<'a, C: Connection + ?Sized> Operations<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Append `value` to the enum type `enum_name`.
    pub async fn add_enum_value(
        &self,
        schema: Option<&str>,
        enum_name: &str,
        value: &str,
    ) -> Result<()> {
        self.invoke(&AddEnumValue::new(schema, enum_name, value).into())
            .await
    }

    /// Apply an already-built operation.
    pub async fn invoke(&self, op: &Operation) -> Result<()> {
        op.execute(self.conn).await
    }
}
