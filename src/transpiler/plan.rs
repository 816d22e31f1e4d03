//! Flattened view of a request tree for one compilation.

use crate::alias::{AliasSlot, AliasTable};
use crate::error::QueryResult;
use crate::request::{Join, Node};

/// One table instance, in depth-first pre-order.
#[derive(Debug)]
pub(crate) struct PlannedNode<'a> {
    pub node: &'a Node,
    /// `None` for the root.
    pub join: Option<&'a Join>,
    pub parent: Option<usize>,
    /// `Entity.assoc.assoc`, for error messages.
    pub path: String,
    /// Reversal parity inherited from ancestors, combined with the node's own.
    pub parity: bool,
}

impl PlannedNode<'_> {
    pub fn is_selected(&self) -> bool {
        self.join.is_none_or(|join| join.selected)
    }
}

#[derive(Debug)]
pub(crate) struct Plan<'a> {
    pub nodes: Vec<PlannedNode<'a>>,
    pub aliases: AliasTable,
}

impl<'a> Plan<'a> {
    pub fn new(root: &'a Node) -> QueryResult<Self> {
        let mut nodes = Vec::new();
        visit(
            root,
            None,
            None,
            root.schema.entity().to_string(),
            false,
            &mut nodes,
        );

        let slots: Vec<AliasSlot<'_>> = nodes
            .iter()
            .map(|planned| AliasSlot {
                path: &planned.path,
                table: planned.node.schema.table(),
                handle: planned.node.alias.as_ref(),
            })
            .collect();
        let aliases = AliasTable::allocate(&slots)?;

        Ok(Self { nodes, aliases })
    }

    pub fn alias(&self, index: usize) -> &str {
        self.aliases.alias(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn visit<'a>(
    node: &'a Node,
    join: Option<&'a Join>,
    parent: Option<usize>,
    path: String,
    inherited_parity: bool,
    out: &mut Vec<PlannedNode<'a>>,
) {
    let parity = inherited_parity ^ node.ordering.is_reversed();
    let index = out.len();
    out.push(PlannedNode {
        node,
        join,
        parent,
        path: path.clone(),
        parity,
    });
    for child in &node.children {
        let child_path = format!("{}.{}", path, child.association.name());
        visit(&child.node, Some(child), Some(index), child_path, parity, out);
    }
}
