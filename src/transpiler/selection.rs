//! SELECT list: each selected node's columns, qualified by its alias, in
//! plan order.

use crate::ast::Selectable;
use crate::error::{QueryError, QueryResult};
use crate::transpiler::expr::Scope;
use crate::transpiler::plan::Plan;
use crate::transpiler::writer::SqlWriter;

pub(crate) fn write_columns(plan: &Plan<'_>, w: &mut SqlWriter) -> QueryResult<()> {
    let mut written = 0usize;
    for (index, planned) in plan.nodes.iter().enumerate() {
        if !planned.is_selected() {
            continue;
        }
        let node = planned.node;
        let selection = node
            .selection
            .as_deref()
            .unwrap_or_else(|| node.schema.default_selection());
        let scope = Scope::new(plan, index);
        let alias = plan.alias(index);

        for item in selection {
            match item {
                Selectable::AllColumns => {
                    separate(w, &mut written);
                    w.push_identifier(alias);
                    w.push_str(".*");
                }
                Selectable::AllColumnsExcluding(excluded) => {
                    let columns = node.schema.declared_columns().iter().filter(|column| {
                        !excluded.iter().any(|e| e.eq_ignore_ascii_case(column))
                    });
                    for column in columns {
                        separate(w, &mut written);
                        w.push_column(alias, column);
                    }
                }
                Selectable::RowId => {
                    separate(w, &mut written);
                    w.push_column(alias, crate::schema::ROWID);
                }
                Selectable::Column(name) => {
                    separate(w, &mut written);
                    w.push_column(alias, name);
                }
                Selectable::Expr { expr, name } => {
                    separate(w, &mut written);
                    scope.write(w, expr)?;
                    if let Some(name) = name {
                        w.push_str(" AS ");
                        w.push_identifier(name);
                    }
                }
            }
        }
    }

    if written == 0 {
        return Err(QueryError::schema(
            &plan.nodes[0].path,
            "request selects no columns",
        ));
    }
    Ok(())
}

fn separate(w: &mut SqlWriter, written: &mut usize) {
    if *written > 0 {
        w.push_str(", ");
    }
    *written += 1;
}
