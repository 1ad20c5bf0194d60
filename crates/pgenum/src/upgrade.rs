//! The ordered list of operations produced by a comparison pass.

use codegen::{Function, Scope};

use crate::op::Operation;

/// Operations to apply, in order.
///
/// Comparison passes only ever append to this list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOps {
    pub ops: Vec<Operation>,
}

impl UpgradeOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: impl Into<Operation>) {
        self.ops.push(op.into());
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    /// One `;`-terminated statement per line.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for op in &self.ops {
            sql.push_str(&op.to_sql());
            sql.push_str(";\n");
        }
        sql
    }

    /// Render a migration function applying every operation in order.
    ///
    /// The generated function takes an [`crate::Operations`] handle named `op`:
    ///
    /// ```text
    /// use pgenum::Connection;
    /// use pgenum::Operations;
    ///
    /// pub async fn migrate<C: Connection + ?Sized>(op: &Operations<'_, C>) -> pgenum::Result<()> {
    ///     op.add_enum_value(Some("public"), "user_status", "pending").await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn render_migration(&self, fn_name: &str) -> String {
        let mut scope = Scope::new();
        scope.import("pgenum", "Connection");
        scope.import("pgenum", "Operations");

        let mut func = Function::new(fn_name);
        func.vis("pub");
        func.set_async(true);
        func.generic("C: Connection + ?Sized");
        func.arg("op", "&Operations<'_, C>");
        func.ret("pgenum::Result<()>");
        for op in &self.ops {
            func.line(op.render());
        }
        func.line("Ok(())");
        scope.push_fn(func);

        scope.to_string()
    }
}

impl Extend<Operation> for UpgradeOps {
    fn extend<T: IntoIterator<Item = Operation>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}

impl<'a> IntoIterator for &'a UpgradeOps {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl std::fmt::Display for UpgradeOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes detected.")?;
        } else {
            writeln!(f, "Changes detected:\n")?;
            for op in &self.ops {
                writeln!(f, "  {}", op)?;
            }
        }
        Ok(())
    }
}
