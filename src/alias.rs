//! Table alias handles and per-compilation alias allocation.
//!
//! A [`TableAlias`] is an opaque identity: attach it to a node with
//! `aliased()`, capture it in predicates authored anywhere in the tree, and
//! the compiler resolves it to whatever SQL identifier that node receives.
//! Identities are only compared, never looked up in any global registry.

use crate::ast::{ColumnRef, Expr};
use crate::error::{QueryError, QueryResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ALIAS_ID: AtomicU64 = AtomicU64::new(1);

/// Handle on one table instance of a request.
#[derive(Debug, Clone)]
pub struct TableAlias {
    id: u64,
    name: Option<Arc<str>>,
}

impl TableAlias {
    /// An anonymous alias. The node it is attached to keeps its default
    /// (table-derived) SQL name.
    pub fn new() -> Self {
        Self {
            id: NEXT_ALIAS_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
        }
    }

    /// An alias rendered verbatim as `name`.
    pub fn named(name: &str) -> Self {
        Self {
            id: NEXT_ALIAS_ID.fetch_add(1, Ordering::Relaxed),
            name: Some(Arc::from(name)),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// A column of the table instance this alias is attached to.
    pub fn column(&self, name: &str) -> Expr {
        Expr::Column(ColumnRef {
            alias: Some(self.clone()),
            name: name.to_string(),
        })
    }
}

impl Default for TableAlias {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TableAlias {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableAlias {}

impl std::hash::Hash for TableAlias {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TableAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "'{}'", name),
            None => write!(f, "TableAlias#{}", self.id),
        }
    }
}

/// What the allocator needs to know about one table instance.
#[derive(Debug, Clone, Copy)]
pub struct AliasSlot<'a> {
    pub path: &'a str,
    pub table: &'a str,
    pub handle: Option<&'a TableAlias>,
}

/// Aliases assigned during one compilation, indexed like the slots they
/// were allocated from.
#[derive(Debug)]
pub struct AliasTable {
    aliases: Vec<String>,
    by_handle: HashMap<TableAlias, usize>,
}

impl AliasTable {
    /// Assign one SQL identifier per slot.
    ///
    /// Explicitly named aliases are used verbatim and reserved up front.
    /// Every other slot takes its table name, or the first free `table1`,
    /// `table2`, ... variant. Identifier comparison is case-insensitive.
    pub fn allocate(slots: &[AliasSlot<'_>]) -> QueryResult<Self> {
        let mut by_handle: HashMap<TableAlias, usize> = HashMap::new();
        let mut explicit: HashMap<String, usize> = HashMap::new();

        for (index, slot) in slots.iter().enumerate() {
            let Some(handle) = slot.handle else { continue };
            if let Some(&first) = by_handle.get(handle) {
                return Err(QueryError::Ambiguity {
                    alias: handle.to_string(),
                    first: slots[first].path.to_string(),
                    second: slot.path.to_string(),
                });
            }
            by_handle.insert(handle.clone(), index);

            if let Some(name) = handle.name() {
                if let Some(&first) = explicit.get(&name.to_lowercase()) {
                    return Err(QueryError::Ambiguity {
                        alias: name.to_string(),
                        first: slots[first].path.to_string(),
                        second: slot.path.to_string(),
                    });
                }
                explicit.insert(name.to_lowercase(), index);
            }
        }

        let mut used: HashSet<String> = explicit.keys().cloned().collect();
        let mut aliases = Vec::with_capacity(slots.len());

        for slot in slots {
            if let Some(name) = slot.handle.and_then(TableAlias::name) {
                aliases.push(name.to_string());
                continue;
            }

            let mut candidate = slot.table.to_string();
            let mut suffix = 0usize;
            while used.contains(&candidate.to_lowercase()) {
                suffix += 1;
                candidate = format!("{}{}", slot.table, suffix);
            }
            if suffix > 0 {
                tracing::trace!(
                    path = slot.path,
                    alias = %candidate,
                    "disambiguated default alias"
                );
            }
            used.insert(candidate.to_lowercase());
            aliases.push(candidate);
        }

        Ok(Self { aliases, by_handle })
    }

    /// Alias of the slot at `index`.
    pub fn alias(&self, index: usize) -> &str {
        &self.aliases[index]
    }

    /// Alias of the node carrying `handle`, if that node was allocated.
    pub fn resolve(&self, handle: &TableAlias) -> Option<&str> {
        self.by_handle
            .get(handle)
            .map(|&index| self.aliases[index].as_str())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
