//! JOIN clauses.

use crate::error::QueryResult;
use crate::transpiler::expr::{Operand, Scope};
use crate::transpiler::plan::Plan;
use crate::transpiler::writer::SqlWriter;

/// Write ` JOIN "table" ["alias"] ON ...` for every non-root node.
///
/// The ON clause starts with the foreign-key equalities, then the child's
/// own filters. Nested joins follow their parent, depth first.
pub(crate) fn write_joins(plan: &Plan<'_>, w: &mut SqlWriter) -> QueryResult<()> {
    for (index, planned) in plan.nodes.iter().enumerate() {
        let (Some(join), Some(parent)) = (planned.join, planned.parent) else {
            continue;
        };

        let child_alias = plan.alias(index);
        let parent_alias = plan.alias(parent);

        w.push_str(if join.required { " JOIN " } else { " LEFT JOIN " });
        w.push_table(planned.node.schema.table(), child_alias);
        w.push_str(" ON ");

        let mut operands: Vec<Operand<'_>> = join
            .association
            .mapping()
            .iter()
            .map(|pair| Operand::KeyEquality {
                child: child_alias,
                destination: &pair.destination,
                parent: parent_alias,
                origin: &pair.origin,
            })
            .collect();
        operands.extend(planned.node.filters.iter().map(Operand::Expr));

        Scope::new(plan, index).write_conjunction(w, &operands)?;
    }
    Ok(())
}
