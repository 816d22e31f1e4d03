//! Request trees: a root entity plus recursively included associations.
//!
//! Every combinator consumes the receiver and returns the derived request,
//! so a request value is never mutated once handed out. Clone a request to
//! derive several variants from it.
//!
//! ```
//! use assoc_sql::prelude::*;
//!
//! let registry = Registry::builder()
//!     .register(Schema::new("A", "a").columns(["id", "bid"]).primary_key(["id"])
//!         .belongs_to("b", "B", ForeignKey::new(["bid"])))
//!     .register(Schema::new("B", "b").columns(["id", "name"]).primary_key(["id"]))
//!     .build()?;
//!
//! let request = registry.all("A")?
//!     .including_required(registry.association("A", "b")?.filter_key(1)?)?;
//!
//! assert_eq!(
//!     request.build()?.sql,
//!     r#"SELECT "a".*, "b".* FROM "a" JOIN "b" ON ("b"."id" = "a"."bid") AND ("b"."id" = 1)"#
//! );
//! # Ok::<(), QueryError>(())
//! ```

use crate::alias::TableAlias;
use crate::ast::{Expr, OrderTerm, Ordering, Selectable, Value, and_all, col, lit, or_any, sql};
use crate::error::{QueryError, QueryResult};
use crate::schema::{Association, Schema};
use crate::transpiler::{self, Statement};
use std::sync::Arc;

/// One table instance of a request tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) schema: Arc<Schema>,
    pub(crate) alias: Option<TableAlias>,
    pub(crate) selection: Option<Vec<Selectable>>,
    pub(crate) filters: Vec<Expr>,
    pub(crate) ordering: Ordering,
    pub(crate) children: Vec<Join>,
}

impl Node {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            alias: None,
            selection: None,
            filters: Vec::new(),
            ordering: Ordering::default(),
            children: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn alias(&self) -> Option<&TableAlias> {
        self.alias.as_ref()
    }

    /// The selection override, if any. `None` means the schema default.
    pub fn selection(&self) -> Option<&[Selectable]> {
        self.selection.as_deref()
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    pub fn children(&self) -> &[Join] {
        &self.children
    }
}

/// An association attached to its parent node.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) association: Association,
    pub(crate) required: bool,
    /// `false` for `joining_*`: the join is emitted but its columns are not
    /// selected.
    pub(crate) selected: bool,
    pub(crate) node: Node,
}

impl Join {
    pub fn association(&self) -> &Association {
        &self.association
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn node(&self) -> &Node {
        &self.node
    }
}

/// Combinators shared by root requests and association requests.
pub trait Derivable: Sized {
    fn node(&self) -> &Node;
    fn node_mut(&mut self) -> &mut Node;

    /// Attach an alias handle to this table instance.
    fn aliased(mut self, alias: &TableAlias) -> Self {
        self.node_mut().alias = Some(alias.clone());
        self
    }

    /// Replace the selection. Never appends to the schema default.
    fn select<I, S>(mut self, selection: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Selectable>,
    {
        let selection: Vec<Selectable> = selection.into_iter().map(Into::into).collect();
        self.node().schema.validate_selection(&selection)?;
        self.node_mut().selection = Some(selection);
        Ok(self)
    }

    /// Append a predicate. Unqualified columns refer to this table instance.
    fn filter(mut self, predicate: Expr) -> Self {
        self.node_mut().filters.push(predicate);
        self
    }

    /// Append a literal SQL predicate with positional arguments.
    fn filter_sql<I, V>(self, fragment: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter(sql(fragment, arguments))
    }

    /// Filter on a single-column primary key: `pk = key`.
    fn filter_key(self, key: impl Into<Value>) -> QueryResult<Self> {
        let column = single_primary_key(self.node().schema())?;
        let predicate = col(&column).eq(lit(key));
        Ok(self.filter(predicate))
    }

    /// Filter on a set of single-column primary keys: `pk IN (...)`.
    fn filter_keys<I, V>(self, keys: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = single_primary_key(self.node().schema())?;
        let mut keys: Vec<Expr> = keys.into_iter().map(|key| lit(key)).collect();
        let predicate = match keys.len() {
            0 => lit(false),
            1 => col(&column).eq(keys.remove(0)),
            _ => col(&column).is_in(keys),
        };
        Ok(self.filter(predicate))
    }

    /// Filter on one key given as column/value pairs.
    fn filter_key_map<I, K, V>(self, key: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let predicate = key_map_predicate(self.node().schema(), key)?;
        Ok(self.filter(predicate))
    }

    /// Filter on several keys given as column/value pairs: an `OR` of
    /// per-key conjunctions.
    fn filter_key_maps<I, M, K, V>(self, keys: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let candidates = keys
            .into_iter()
            .map(|key| key_map_predicate(self.node().schema(), key))
            .collect::<QueryResult<Vec<_>>>()?;
        let predicate = or_any(candidates).unwrap_or_else(|| lit(false));
        Ok(self.filter(predicate))
    }

    /// Append order terms. Successive calls accumulate.
    fn order<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        self.node_mut().ordering.append(terms.into_iter().map(Into::into));
        self
    }

    /// Replace all order terms and clear reversal.
    fn reorder<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        self.node_mut().ordering.replace(terms.into_iter().map(Into::into));
        self
    }

    fn unordered(mut self) -> Self {
        self.node_mut().ordering = Ordering::default();
        self
    }

    /// Toggle reversal of this node's ordering and of everything ordered
    /// below it.
    fn reversed(mut self) -> Self {
        self.node_mut().ordering.toggle();
        self
    }

    /// Include an association with its declared default join semantics.
    fn including(self, association: AssociationRequest) -> QueryResult<Self> {
        let required = association.association.is_required_by_default();
        self.attach(association, required, true)
    }

    /// Include an association with an inner join: rows without a match are
    /// dropped.
    fn including_required(self, association: AssociationRequest) -> QueryResult<Self> {
        self.attach(association, true, true)
    }

    /// Include an association with a left join.
    fn including_optional(self, association: AssociationRequest) -> QueryResult<Self> {
        self.attach(association, false, true)
    }

    /// Inner join an association without selecting its columns.
    fn joining_required(self, association: AssociationRequest) -> QueryResult<Self> {
        self.attach(association, true, false)
    }

    /// Left join an association without selecting its columns.
    fn joining_optional(self, association: AssociationRequest) -> QueryResult<Self> {
        self.attach(association, false, false)
    }

    #[doc(hidden)]
    fn attach(
        mut self,
        association: AssociationRequest,
        required: bool,
        selected: bool,
    ) -> QueryResult<Self> {
        let entity = self.node().schema.entity();
        if association.origin != entity {
            return Err(QueryError::schema(
                entity,
                format!(
                    "association '{}' is declared on {}, not {}",
                    association.association.name(),
                    association.origin,
                    entity
                ),
            ));
        }
        self.node_mut().children.push(Join {
            association: association.association,
            required,
            selected,
            node: association.node,
        });
        Ok(self)
    }
}

fn single_primary_key(schema: &Schema) -> QueryResult<String> {
    match schema.primary_key_columns() {
        [column] => Ok(column.clone()),
        columns => Err(QueryError::schema(
            schema.entity(),
            format!(
                "primary key has {} columns; filter with column/value pairs instead",
                columns.len()
            ),
        )),
    }
}

fn key_map_predicate<I, K, V>(schema: &Schema, key: I) -> QueryResult<Expr>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut equalities = Vec::new();
    for (column, value) in key {
        let column = column.as_ref();
        if !schema.has_column(column) {
            return Err(QueryError::schema(
                schema.entity(),
                format!("unknown key column '{}'", column),
            ));
        }
        equalities.push(col(column).eq(lit(value)));
    }
    and_all(equalities).ok_or_else(|| QueryError::schema(schema.entity(), "empty key"))
}

/// Row limit of a root request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: usize,
    pub offset: Option<usize>,
}

/// A request rooted at one entity. The root is never a join target.
#[derive(Debug, Clone)]
pub struct Request {
    root: Node,
    limit: Option<Limit>,
}

impl Request {
    pub(crate) fn new(root: Node) -> Self {
        Self { root, limit: None }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(Limit {
            count,
            offset: None,
        });
        self
    }

    pub fn limit_offset(mut self, count: usize, offset: usize) -> Self {
        self.limit = Some(Limit {
            count,
            offset: Some(offset),
        });
        self
    }

    pub fn row_limit(&self) -> Option<Limit> {
        self.limit
    }

    /// Compile into SQL text and positional arguments.
    pub fn build(&self) -> QueryResult<Statement> {
        transpiler::compile(self)
    }
}

impl Derivable for Request {
    fn node(&self) -> &Node {
        &self.root
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.root
    }
}

/// An association of a given origin entity, refined before inclusion.
#[derive(Debug, Clone)]
pub struct AssociationRequest {
    origin: String,
    association: Association,
    node: Node,
}

impl AssociationRequest {
    pub(crate) fn new(origin: &str, association: Association, node: Node) -> Self {
        Self {
            origin: origin.to_string(),
            association,
            node,
        }
    }

    /// Entity the association is declared on.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn association(&self) -> &Association {
        &self.association
    }
}

impl Derivable for AssociationRequest {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}
