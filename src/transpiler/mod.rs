//! SQL transpiler for request trees.
//!
//! Compilation is a pure function of the request: plan the tree, allocate
//! aliases, then write SELECT, FROM, JOIN, WHERE, ORDER BY and LIMIT in
//! that order through a single writer so arguments line up with their
//! placeholders.

mod expr;
mod joins;
mod order;
mod plan;
mod selection;
mod writer;

#[cfg(test)]
mod tests;

pub use writer::{count_placeholders, quote_identifier};

use crate::ast::Value;
use crate::error::QueryResult;
use crate::request::Request;
use expr::{Operand, Scope};
use plan::Plan;
use serde::{Deserialize, Serialize};
use writer::SqlWriter;

/// A compiled statement: SQL text plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub arguments: Vec<Value>,
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Trait for converting requests to SQL.
pub trait ToSql {
    fn to_sql(&self) -> QueryResult<Statement>;
}

impl ToSql for Request {
    fn to_sql(&self) -> QueryResult<Statement> {
        compile(self)
    }
}

/// Compile a request into one SELECT statement.
pub fn compile(request: &Request) -> QueryResult<Statement> {
    let plan = Plan::new(request.root())?;
    let root = request.root();
    let mut w = SqlWriter::new();

    w.push_str("SELECT ");
    selection::write_columns(&plan, &mut w)?;

    w.push_str(" FROM ");
    w.push_table(root.schema().table(), plan.alias(0));

    joins::write_joins(&plan, &mut w)?;

    // Root filters see every alias of the tree
    if !root.filters().is_empty() {
        w.push_str(" WHERE ");
        let operands: Vec<Operand<'_>> = root.filters().iter().map(Operand::Expr).collect();
        Scope::new(&plan, 0).write_conjunction(&mut w, &operands)?;
    }

    order::write_order_by(&plan, &mut w)?;

    if let Some(limit) = request.row_limit() {
        w.push_str(&format!(" LIMIT {}", limit.count));
        if let Some(offset) = limit.offset {
            w.push_str(&format!(" OFFSET {}", offset));
        }
    }

    let statement = w.finish();
    tracing::debug!(
        nodes = plan.len(),
        arguments = statement.arguments.len(),
        sql = %statement.sql,
        "compiled request"
    );
    Ok(statement)
}
