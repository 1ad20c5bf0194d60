//! SQL quoting.
//!
//! `ALTER TYPE ... ADD VALUE` is a utility statement and does not accept bind
//! parameters, so labels and type names are spliced into the statement text
//! through these wrappers.

use std::fmt;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value quoted with single quotes and embedded quotes
/// doubled. Values containing a backslash are written as an escape string
/// (`E'...'`) with backslashes doubled, so the result means the same thing
/// whatever `standard_conforming_strings` is set to.
///
/// # Example
/// ```
/// use pgenum::sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// assert_eq!(format!("{}", Lit(r"a\b")), r"E'a\\b'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.as_ref();
        if s.contains('\\') {
            write!(f, "E")?;
        }
        write!(f, "'")?;
        for c in s.chars() {
            match c {
                '\'' => write!(f, "''")?,
                '\\' => write!(f, "\\\\")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value quoted with double quotes, doubling any embedded
/// double quote.
///
/// # Example
/// ```
/// use pgenum::sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
pub fn quote_ident(name: &str) -> String {
    Ident(name).to_string()
}

/// Quote a type name, qualified by its schema when one is given.
pub fn qualified_type_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", Ident(schema), Ident(name)),
        None => Ident(name).to_string(),
    }
}

/// Remove one layer of identifier quoting, undoing doubled quotes inside.
///
/// Unquoted input is returned unchanged.
pub fn unquote_ident(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        let inner = &s[1..s.len() - 1];
        return inner.replace("\"\"", "\"");
    }
    s.to_string()
}
