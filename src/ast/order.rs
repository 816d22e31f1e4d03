//! Order terms and the per-node ordering state.

use crate::ast::{Direction, Expr};

/// One `ORDER BY` term.
///
/// `direction` is `None` for a bare expression: it sorts ascending and
/// renders without a keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub expr: Expr,
    pub direction: Option<Direction>,
}

impl OrderTerm {
    pub fn new(expr: Expr, direction: Option<Direction>) -> Self {
        Self { expr, direction }
    }

    /// The term with its direction flipped once.
    ///
    /// An implicit ascending term becomes `DESC`; a descending term becomes
    /// an explicit `ASC`, so it stays distinguishable from a term that was
    /// never reversed.
    pub fn reversed(&self) -> OrderTerm {
        let direction = match self.direction {
            None | Some(Direction::Asc) => Direction::Desc,
            Some(Direction::Desc) => Direction::Asc,
        };
        OrderTerm::new(self.expr.clone(), Some(direction))
    }
}

impl From<Expr> for OrderTerm {
    fn from(expr: Expr) -> Self {
        OrderTerm::new(expr, None)
    }
}

/// Accumulated order terms of one node plus its reversal parity.
///
/// Reversal is recorded, never applied eagerly: toggling twice is a no-op
/// and terms appended after a toggle are reversed with the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ordering {
    terms: Vec<OrderTerm>,
    reversed: bool,
}

impl Ordering {
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn append(&mut self, terms: impl IntoIterator<Item = OrderTerm>) {
        self.terms.extend(terms);
    }

    /// Replace all terms and clear the reversal flag.
    pub fn replace(&mut self, terms: impl IntoIterator<Item = OrderTerm>) {
        self.terms = terms.into_iter().collect();
        self.reversed = false;
    }

    pub fn toggle(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Effective terms under the given parity (already combined with this
    /// node's own flag by the caller).
    pub fn effective(&self, parity: bool) -> Vec<OrderTerm> {
        if parity {
            self.terms.iter().map(OrderTerm::reversed).collect()
        } else {
            self.terms.clone()
        }
    }
}
