use crate::alias::TableAlias;
use crate::ast::{BinaryOp, Direction, OrderTerm, Selectable, UnaryOp, Value};

/// A reference to a column of one table instance.
///
/// Without an alias the reference belongs to the node it was authored
/// against. With an alias handle it belongs to whichever node carries that
/// handle, anywhere in the request tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub alias: Option<TableAlias>,
    pub name: String,
}

/// SQL-level values and predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    /// Inlined into the SQL text.
    Literal(Value),
    /// Rendered as `?` and appended to the argument list.
    Param(Value),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    /// Literal SQL text with positional `?` arguments.
    Raw { sql: String, arguments: Vec<Value> },
}

/// Create an unqualified column reference.
///
/// # Example
/// ```
/// use assoc_sql::ast::col;
/// let predicate = col("name").is_not_null();
/// ```
pub fn col(name: &str) -> Expr {
    Expr::Column(ColumnRef {
        alias: None,
        name: name.to_string(),
    })
}

/// Create a bound parameter (`?`).
pub fn bind(value: impl Into<Value>) -> Expr {
    Expr::Param(value.into())
}

/// Create an inline literal.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Create a raw SQL fragment. Each `?` consumes one argument, in order.
pub fn sql<I, V>(fragment: &str, arguments: I) -> Expr
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Expr::Raw {
        sql: fragment.to_string(),
        arguments: arguments.into_iter().map(Into::into).collect(),
    }
}

/// Conjoin expressions with AND. Returns `None` for an empty input.
pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.and(e))
}

/// Disjoin expressions with OR. Returns `None` for an empty input.
pub fn or_any(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.or(e))
}

impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    pub fn ne(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    pub fn lte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lte, other)
    }

    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    pub fn gte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gte, other)
    }

    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Like, pattern)
    }

    pub fn concat(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Concat, other)
    }

    pub fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// `self IN (values...)`
    pub fn is_in<I, E>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `self NOT IN (values...)`
    pub fn not_in<I, E>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::InList {
            expr: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// Ascending order term, rendered with an explicit `ASC`.
    pub fn asc(self) -> OrderTerm {
        OrderTerm::new(self, Some(Direction::Asc))
    }

    /// Descending order term.
    pub fn desc(self) -> OrderTerm {
        OrderTerm::new(self, Some(Direction::Desc))
    }

    /// Select this expression under an output name (`expr AS "name"`).
    pub fn named(self, name: &str) -> Selectable {
        Selectable::Expr {
            expr: self,
            name: Some(name.to_string()),
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Expr::Column(c)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::Literal(Value::from(v))
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, u32, f64, &str, String);

impl<T: Into<Expr>> std::ops::Add<T> for Expr {
    type Output = Expr;
    fn add(self, rhs: T) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl<T: Into<Expr>> std::ops::Sub<T> for Expr {
    type Output = Expr;
    fn sub(self, rhs: T) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl<T: Into<Expr>> std::ops::Mul<T> for Expr {
    type Output = Expr;
    fn mul(self, rhs: T) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl<T: Into<Expr>> std::ops::Div<T> for Expr {
    type Output = Expr;
    fn div(self, rhs: T) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }
}
