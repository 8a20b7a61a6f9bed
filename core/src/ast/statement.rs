use crate::ast::{
    Expr, FromClause, LockingClause, LockingEntry, OrderBy, SelectItem, SetOp, WithClause,
};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Root of a statement tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Select(Select),
    Update(Update),
    Delete(Delete),
    Insert(Insert),
}

impl Statement {
    /// Attach a locking entry. Only SELECT statements can lock rows.
    pub fn add_locking(&mut self, entry: LockingEntry) -> CoreResult<()> {
        match self {
            Statement::Select(select) => {
                select.locking.entries.push(entry);
                Ok(())
            }
            other => Err(CoreError::invalid(format!(
                "locking clause cannot be attached to {}",
                other.keyword()
            ))),
        }
    }

    /// Check required sub-parts. Dialect support is checked by the resolver.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            Statement::Select(s) => s.validate(),
            Statement::Update(u) => u.validate(),
            Statement::Delete(d) => d.validate(),
            Statement::Insert(i) => i.validate(),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::Insert(_) => "INSERT",
        }
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Statement::Select(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Select> for Statement {
    fn from(s: Select) -> Self {
        Statement::Select(s)
    }
}

impl From<Update> for Statement {
    fn from(u: Update) -> Self {
        Statement::Update(u)
    }
}

impl From<Delete> for Statement {
    fn from(d: Delete) -> Self {
        Statement::Delete(d)
    }
}

impl From<Insert> for Statement {
    fn from(i: Insert) -> Self {
        Statement::Insert(i)
    }
}

/// Target of UPDATE / DELETE / INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Name other clauses use to reference the target.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self, keyword: &str) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid(format!("{} without target table", keyword)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    #[serde(default)]
    pub with: WithClause,
    #[serde(default)]
    pub distinct: bool,
    /// Empty means `*`
    #[serde(default)]
    pub columns: Vec<SelectItem>,
    #[serde(default)]
    pub from: FromClause,
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub group_by: Vec<Expr>,
    #[serde(default)]
    pub having: Option<Expr>,
    #[serde(default)]
    pub set_ops: Vec<(SetOp, Box<Select>)>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub locking: LockingClause,
}

impl Select {
    pub fn validate(&self) -> CoreResult<()> {
        self.with.validate()?;
        self.from.validate()?;
        for (_, operand) in &self.set_ops {
            if !operand.locking.is_empty() {
                return Err(CoreError::invalid(
                    "locking clause inside a set operation operand",
                ));
            }
            operand.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub with: WithClause,
    pub target: TableRef,
    pub assignments: Vec<(String, Expr)>,
    /// Extra sources (`UPDATE ... FROM`)
    #[serde(default)]
    pub from: FromClause,
    #[serde(default)]
    pub filter: Option<Expr>,
}

impl Update {
    pub fn validate(&self) -> CoreResult<()> {
        self.target.validate("UPDATE")?;
        if self.assignments.is_empty() {
            return Err(CoreError::invalid("UPDATE without assignments"));
        }
        self.with.validate()?;
        self.from.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    #[serde(default)]
    pub with: WithClause,
    pub target: TableRef,
    /// Extra sources (`DELETE ... USING`)
    #[serde(default)]
    pub using: FromClause,
    #[serde(default)]
    pub filter: Option<Expr>,
}

impl Delete {
    pub fn validate(&self) -> CoreResult<()> {
        self.target.validate("DELETE")?;
        self.with.validate()?;
        self.using.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<Select>),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    #[serde(default)]
    pub with: WithClause,
    pub target: TableRef,
    #[serde(default)]
    pub columns: Vec<String>,
    pub source: InsertSource,
}

impl Insert {
    pub fn validate(&self) -> CoreResult<()> {
        self.target.validate("INSERT")?;
        self.with.validate()?;
        match &self.source {
            InsertSource::Values(rows) => {
                if rows.is_empty() {
                    return Err(CoreError::invalid("INSERT without rows"));
                }
                if self.columns.is_empty() {
                    return Err(CoreError::invalid("INSERT VALUES without column names"));
                }
                if let Some(row) = rows.iter().find(|r| r.len() != self.columns.len()) {
                    return Err(CoreError::invalid(format!(
                        "INSERT row has {} values for {} columns",
                        row.len(),
                        self.columns.len()
                    )));
                }
                Ok(())
            }
            InsertSource::Select(query) => query.validate(),
            InsertSource::DefaultValues => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{LockMode, col, lit};

    #[test]
    fn test_locking_only_on_select() {
        let mut stmt: Statement = Select::from_table("t").into();
        assert!(stmt.add_locking(LockingEntry::new(LockMode::Update)).is_ok());

        let mut stmt: Statement = Update::table("t").set("a", lit(1)).into();
        let err = stmt
            .add_locking(LockingEntry::new(LockMode::Update))
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::invalid("locking clause cannot be attached to UPDATE")
        );
    }

    #[test]
    fn test_validate_required_parts() {
        let stmt: Statement = Update::table("t").into();
        assert!(stmt.validate().is_err());

        let stmt: Statement = Delete::from_table("").into();
        assert!(stmt.validate().is_err());

        let stmt: Statement = Insert::into("t")
            .columns(["a", "b"])
            .values([lit(1)])
            .into();
        assert!(stmt.validate().is_err());

        let stmt: Statement = Insert::into("t")
            .columns(["a", "b"])
            .values([lit(1), lit(2)])
            .into();
        assert!(stmt.validate().is_ok());

        let stmt: Statement = Delete::from_table("t").filter(col("id").eq(1)).into();
        assert!(stmt.validate().is_ok());
    }
}
