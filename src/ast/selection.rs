use crate::ast::{Expr, col};

/// One entry of a node's selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selectable {
    /// `alias.*`
    AllColumns,
    /// Every declared column of the schema except the listed ones.
    AllColumnsExcluding(Vec<String>),
    /// `alias."rowid"`
    RowId,
    /// `alias."name"`
    Column(String),
    /// Any expression, optionally with an output name (`AS "name"`).
    Expr { expr: Expr, name: Option<String> },
}

impl Selectable {
    pub fn all_excluding<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selectable::AllColumnsExcluding(
            columns.into_iter().map(|c| c.as_ref().to_string()).collect(),
        )
    }

    pub fn column(name: &str) -> Self {
        Selectable::Column(name.to_string())
    }
}

impl From<Expr> for Selectable {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Column(c) if c.alias.is_none() => Selectable::Column(c.name),
            other => Selectable::Expr {
                expr: other,
                name: None,
            },
        }
    }
}

impl From<&str> for Selectable {
    fn from(name: &str) -> Self {
        match name {
            "*" => Selectable::AllColumns,
            _ => col(name).into(),
        }
    }
}
