//! Expression rendering against an allocated alias table.

use crate::ast::{BinaryOp, ColumnRef, Expr, UnaryOp, Value};
use crate::error::{QueryError, QueryResult};
use crate::transpiler::plan::Plan;
use crate::transpiler::writer::{SqlWriter, count_placeholders};

/// Precedence of atoms: never parenthesized.
const ATOM: u8 = 10;
/// Precedence of IS NULL / IN, on par with equality.
const COMPARISON: u8 = 4;

/// The node an expression was authored against.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'p, 'a> {
    pub plan: &'p Plan<'a>,
    pub current: usize,
}

/// An operand of a top-level AND list.
#[derive(Clone, Copy)]
pub(crate) enum Operand<'e> {
    Expr(&'e Expr),
    /// `"child"."destination" = "parent"."origin"`
    KeyEquality {
        child: &'e str,
        destination: &'e str,
        parent: &'e str,
        origin: &'e str,
    },
}

impl<'p, 'a> Scope<'p, 'a> {
    pub fn new(plan: &'p Plan<'a>, current: usize) -> Self {
        Self { plan, current }
    }

    fn path(&self) -> &str {
        &self.plan.nodes[self.current].path
    }

    fn resolve(&self, column: &ColumnRef) -> QueryResult<&'p str> {
        match &column.alias {
            None => Ok(self.plan.alias(self.current)),
            Some(handle) => self
                .plan
                .aliases
                .resolve(handle)
                .ok_or_else(|| QueryError::unresolved(self.path(), handle.to_string())),
        }
    }

    /// Render a standalone expression.
    pub fn write(&self, w: &mut SqlWriter, expr: &Expr) -> QueryResult<()> {
        self.write_operand(w, expr, 0)
    }

    /// Render operands joined by AND. A single operand renders bare; with
    /// several, each is parenthesized.
    pub fn write_conjunction(
        &self,
        w: &mut SqlWriter,
        operands: &[Operand<'_>],
    ) -> QueryResult<()> {
        let mut flat: Vec<Operand<'_>> = Vec::with_capacity(operands.len());
        for operand in operands {
            match *operand {
                Operand::Expr(expr) => {
                    let mut parts = Vec::new();
                    flatten(expr, BinaryOp::And, &mut parts);
                    flat.extend(parts.into_iter().map(Operand::Expr));
                }
                key @ Operand::KeyEquality { .. } => flat.push(key),
            }
        }

        let wrap = flat.len() > 1;
        for (i, operand) in flat.iter().enumerate() {
            if i > 0 {
                w.push_str(" AND ");
            }
            if wrap {
                w.push_str("(");
            }
            match operand {
                Operand::Expr(expr) => self.write(w, expr)?,
                Operand::KeyEquality {
                    child,
                    destination,
                    parent,
                    origin,
                } => {
                    w.push_column(child, destination);
                    w.push_str(" = ");
                    w.push_column(parent, origin);
                }
            }
            if wrap {
                w.push_str(")");
            }
        }
        Ok(())
    }

    fn write_operand(
        &self,
        w: &mut SqlWriter,
        expr: &Expr,
        parent_precedence: u8,
    ) -> QueryResult<()> {
        let wrap = precedence(expr) < parent_precedence;
        if wrap {
            w.push_str("(");
        }
        self.write_bare(w, expr)?;
        if wrap {
            w.push_str(")");
        }
        Ok(())
    }

    fn write_bare(&self, w: &mut SqlWriter, expr: &Expr) -> QueryResult<()> {
        match expr {
            Expr::Column(column) => {
                let alias = self.resolve(column)?;
                w.push_column(alias, &column.name);
            }
            Expr::Literal(value) => w.push_str(&value.to_sql_literal()),
            Expr::Param(value) => w.push_argument(value),
            Expr::Binary { op, .. } if op.is_logical() => {
                let mut parts = Vec::new();
                flatten(expr, *op, &mut parts);
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        w.push_str(&format!(" {} ", op));
                    }
                    w.push_str("(");
                    self.write(w, part)?;
                    w.push_str(")");
                }
            }
            Expr::Binary { op, left, right } => {
                if let Expr::Literal(Value::Null) = right.as_ref() {
                    match op {
                        BinaryOp::Eq => return self.write_is_null(w, left, false),
                        BinaryOp::Ne => return self.write_is_null(w, left, true),
                        _ => {}
                    }
                }
                let p = op.precedence();
                self.write_operand(w, left, p)?;
                w.push_str(&format!(" {} ", op));
                let right_precedence = if is_associative(*op) { p } else { p + 1 };
                self.write_operand(w, right, right_precedence)?;
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => {
                    w.push_str("NOT ");
                    self.write_operand(w, operand, 3)?;
                }
                UnaryOp::Neg => {
                    w.push_str("-");
                    // `--` would open a line comment
                    if starts_with_minus(operand) {
                        w.push_str("(");
                        self.write_bare(w, operand)?;
                        w.push_str(")");
                    } else {
                        self.write_operand(w, operand, ATOM)?;
                    }
                }
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                self.write_operand(w, expr, COMPARISON + 1)?;
                w.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        w.push_str(", ");
                    }
                    self.write(w, item)?;
                }
                w.push_str(")");
            }
            Expr::IsNull { expr, negated } => self.write_is_null(w, expr, *negated)?,
            Expr::Raw { sql, arguments } => {
                let placeholders = count_placeholders(sql);
                if placeholders != arguments.len() {
                    return Err(QueryError::Arguments {
                        path: self.path().to_string(),
                        placeholders,
                        arguments: arguments.len(),
                    });
                }
                w.push_fragment(sql, arguments);
            }
        }
        Ok(())
    }

    fn write_is_null(&self, w: &mut SqlWriter, expr: &Expr, negated: bool) -> QueryResult<()> {
        self.write_operand(w, expr, COMPARISON + 1)?;
        w.push_str(if negated { " IS NOT NULL" } else { " IS NULL" });
        Ok(())
    }
}

/// Whether `expr` renders with a leading `-` when not parenthesized.
fn starts_with_minus(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Value::Int(n)) => *n < 0,
        Expr::Literal(Value::Float(n)) => n.is_sign_negative() && !n.is_nan(),
        Expr::Unary {
            op: UnaryOp::Neg, ..
        } => true,
        Expr::Raw { sql, .. } => sql.trim_start().starts_with('-'),
        _ => false,
    }
}

fn is_associative(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Concat)
}

/// Collect the operands of a chain of `op`, left to right.
fn flatten<'e>(expr: &'e Expr, op: BinaryOp, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::Binary {
            op: inner,
            left,
            right,
        } if *inner == op => {
            flatten(left, op, out);
            flatten(right, op, out);
        }
        other => out.push(other),
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Column(_) | Expr::Literal(_) | Expr::Param(_) => ATOM,
        Expr::Binary { op, right, .. } => match (op, right.as_ref()) {
            (BinaryOp::Eq | BinaryOp::Ne, Expr::Literal(Value::Null)) => COMPARISON,
            _ => op.precedence(),
        },
        Expr::Unary {
            op: UnaryOp::Not, ..
        } => 3,
        Expr::Unary {
            op: UnaryOp::Neg, ..
        } => 9,
        Expr::InList { .. } | Expr::IsNull { .. } => COMPARISON,
        Expr::Raw { .. } => 0,
    }
}
