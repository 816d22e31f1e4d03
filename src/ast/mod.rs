//! Request-level AST: values, expressions, order terms and selections.

pub mod expr;
pub mod operators;
pub mod order;
pub mod selection;
pub mod values;

pub use expr::{ColumnRef, Expr, and_all, bind, col, lit, or_any, sql};
pub use operators::{BinaryOp, Direction, UnaryOp};
pub use order::{OrderTerm, Ordering};
pub use selection::Selectable;
pub use values::{Value, parse_value};
