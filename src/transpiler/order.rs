//! ORDER BY composition.
//!
//! Each node contributes its effective terms in depth-first pre-order: the
//! root's first, then each included association followed by its own
//! subtree. A node's parity combines its reversal flag with those of its
//! ancestors and is applied to each term once.

use crate::ast::{Direction, OrderTerm};
use crate::error::QueryResult;
use crate::transpiler::expr::Scope;
use crate::transpiler::plan::Plan;
use crate::transpiler::writer::SqlWriter;

/// Effective terms of every node, each paired with its node index.
pub(crate) fn compose(plan: &Plan<'_>) -> Vec<(usize, OrderTerm)> {
    plan.nodes
        .iter()
        .enumerate()
        .flat_map(|(index, planned)| {
            planned
                .node
                .ordering
                .effective(planned.parity)
                .into_iter()
                .map(move |term| (index, term))
        })
        .collect()
}

/// Write ` ORDER BY ...`, or nothing when no node is ordered.
pub(crate) fn write_order_by(plan: &Plan<'_>, w: &mut SqlWriter) -> QueryResult<()> {
    let terms = compose(plan);
    if terms.is_empty() {
        return Ok(());
    }

    w.push_str(" ORDER BY ");
    for (i, (index, term)) in terms.iter().enumerate() {
        if i > 0 {
            w.push_str(", ");
        }
        Scope::new(plan, *index).write(w, &term.expr)?;
        match term.direction {
            None => {}
            Some(Direction::Asc) => w.push_str(" ASC"),
            Some(Direction::Desc) => w.push_str(" DESC"),
        }
    }
    Ok(())
}
