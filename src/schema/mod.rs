//! Schema descriptors and the association registry.
//!
//! Schemas are declared once at startup, validated together by
//! [`RegistryBuilder::build`], then shared read-only behind `Arc` by every
//! request built from the [`Registry`].

pub mod config;

use crate::ast::Selectable;
use crate::error::{QueryError, QueryResult};
use crate::request::{AssociationRequest, Node, Request};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The hidden primary key of tables without an explicit one.
pub const ROWID: &str = "rowid";

/// Kind of foreign-key relationship, seen from the origin entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// The origin table holds the foreign key.
    BelongsTo,
    /// The destination table holds the foreign key; at most one match.
    HasOne,
    /// The destination table holds the foreign key.
    HasMany,
}

impl AssociationKind {
    pub fn is_to_one(self) -> bool {
        !matches!(self, AssociationKind::HasMany)
    }

    /// True when the foreign key columns live in the origin table.
    pub fn origin_holds_key(self) -> bool {
        matches!(self, AssociationKind::BelongsTo)
    }
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationKind::BelongsTo => write!(f, "belongs_to"),
            AssociationKind::HasOne => write!(f, "has_one"),
            AssociationKind::HasMany => write!(f, "has_many"),
        }
    }
}

/// Foreign key as declared: columns of the table holding the key, and the
/// columns they reference (the referenced primary key when omitted).
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub references: Option<Vec<String>>,
}

impl ForeignKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            columns: columns.into_iter().map(|c| c.as_ref().to_string()).collect(),
            references: None,
        }
    }

    pub fn references<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.references = Some(columns.into_iter().map(|c| c.as_ref().to_string()).collect());
        self
    }
}

/// One column pair of a join condition: `destination = origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub origin: String,
    pub destination: String,
}

/// A named association declared on an origin entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    name: String,
    kind: AssociationKind,
    destination: String,
    foreign_key: ForeignKey,
    required: bool,
    mapping: Vec<ColumnMapping>,
}

impl Association {
    pub fn new(
        name: &str,
        kind: AssociationKind,
        destination: &str,
        foreign_key: ForeignKey,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            destination: destination.to_string(),
            foreign_key,
            required: false,
            mapping: Vec::new(),
        }
    }

    /// Make `including()` use an inner join by default.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    /// Entity name of the destination schema.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn foreign_key(&self) -> &ForeignKey {
        &self.foreign_key
    }

    pub fn is_required_by_default(&self) -> bool {
        self.required
    }

    /// Resolved column pairs. Empty until the registry is built.
    pub fn mapping(&self) -> &[ColumnMapping] {
        &self.mapping
    }
}

/// Static metadata of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entity: String,
    table: String,
    columns: Vec<String>,
    primary_key: Vec<String>,
    selection: Vec<Selectable>,
    associations: Vec<Association>,
}

impl Schema {
    /// A schema selecting all columns, keyed by the rowid pseudo-column.
    pub fn new(entity: &str, table: &str) -> Self {
        Self {
            entity: entity.to_string(),
            table: table.to_string(),
            columns: Vec::new(),
            primary_key: vec![ROWID.to_string()],
            selection: vec![Selectable::AllColumns],
            associations: Vec::new(),
        }
    }

    /// Declare the table columns. Enables column validation.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = columns.into_iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.primary_key = columns.into_iter().map(|c| c.as_ref().to_string()).collect();
        if self.primary_key.is_empty() {
            self.primary_key.push(ROWID.to_string());
        }
        self
    }

    /// Default selection used when a request does not override it.
    pub fn selection(mut self, selection: impl IntoIterator<Item = Selectable>) -> Self {
        self.selection = selection.into_iter().collect();
        self
    }

    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn belongs_to(self, name: &str, destination: &str, foreign_key: ForeignKey) -> Self {
        self.association(Association::new(
            name,
            AssociationKind::BelongsTo,
            destination,
            foreign_key,
        ))
    }

    pub fn has_one(self, name: &str, destination: &str, foreign_key: ForeignKey) -> Self {
        self.association(Association::new(
            name,
            AssociationKind::HasOne,
            destination,
            foreign_key,
        ))
    }

    pub fn has_many(self, name: &str, destination: &str, foreign_key: ForeignKey) -> Self {
        self.association(Association::new(
            name,
            AssociationKind::HasMany,
            destination,
            foreign_key,
        ))
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn declared_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key
    }

    pub fn default_selection(&self) -> &[Selectable] {
        &self.selection
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn find_association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Whether `name` is a known column. Always true when no columns were
    /// declared; the rowid pseudo-column is always known.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.is_empty()
            || name.eq_ignore_ascii_case(ROWID)
            || self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Check a selection against this schema.
    pub fn validate_selection(&self, selection: &[Selectable]) -> QueryResult<()> {
        if selection.is_empty() {
            return Err(QueryError::schema(&self.entity, "selection is empty"));
        }
        for item in selection {
            match item {
                Selectable::Column(name) if !self.has_column(name) => {
                    return Err(QueryError::schema(
                        &self.entity,
                        format!("unknown column '{}' in selection", name),
                    ));
                }
                Selectable::AllColumnsExcluding(excluded) => {
                    if self.columns.is_empty() {
                        return Err(QueryError::schema(
                            &self.entity,
                            "all-columns-excluding selection needs declared columns",
                        ));
                    }
                    if let Some(name) = excluded.iter().find(|n| !self.has_column(n)) {
                        return Err(QueryError::schema(
                            &self.entity,
                            format!("unknown column '{}' in excluded set", name),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn require_columns(&self, columns: &[String], role: &str) -> QueryResult<()> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(QueryError::schema(
                &self.entity,
                format!("{} column '{}' is not declared on table '{}'", role, missing, self.table),
            ));
        }
        Ok(())
    }
}

/// Read-only set of schemas, keyed by entity name.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn schema(&self, entity: &str) -> QueryResult<&Arc<Schema>> {
        self.schemas
            .get(entity)
            .ok_or_else(|| QueryError::schema(entity, "unknown entity"))
    }

    /// Schemas in entity-name order.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// A request for all rows of `entity`.
    pub fn all(&self, entity: &str) -> QueryResult<Request> {
        let schema = self.schema(entity)?;
        Ok(Request::new(Node::new(Arc::clone(schema))))
    }

    /// The association `name` declared on `entity`, ready to be refined and
    /// included into a request on that entity.
    pub fn association(&self, entity: &str, name: &str) -> QueryResult<AssociationRequest> {
        let origin = self.schema(entity)?;
        let association = origin.find_association(name).ok_or_else(|| {
            QueryError::schema(entity, format!("unknown association '{}'", name))
        })?;
        let destination = self.schema(association.destination())?;
        Ok(AssociationRequest::new(
            entity,
            association.clone(),
            Node::new(Arc::clone(destination)),
        ))
    }
}

/// Collects schemas and validates them as a whole.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: Vec<Schema>,
}

impl RegistryBuilder {
    pub fn register(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Resolve every foreign key and validate columns and selections.
    pub fn build(self) -> QueryResult<Registry> {
        let mut by_entity: BTreeMap<String, Schema> = BTreeMap::new();
        for schema in self.schemas {
            if by_entity.contains_key(&schema.entity) {
                return Err(QueryError::schema(&schema.entity, "entity registered twice"));
            }
            by_entity.insert(schema.entity.clone(), schema);
        }

        let mut resolved: BTreeMap<String, Vec<Vec<ColumnMapping>>> = BTreeMap::new();
        for schema in by_entity.values() {
            schema.validate_selection(&schema.selection)?;
            schema.require_columns(&schema.primary_key, "primary key")?;

            let mut mappings = Vec::with_capacity(schema.associations.len());
            for association in &schema.associations {
                let destination = by_entity.get(&association.destination).ok_or_else(|| {
                    QueryError::schema(
                        &schema.entity,
                        format!(
                            "association '{}' targets unknown entity '{}'",
                            association.name, association.destination
                        ),
                    )
                })?;
                mappings.push(resolve_mapping(schema, association, destination)?);
            }
            resolved.insert(schema.entity.clone(), mappings);
        }

        let mut schemas = BTreeMap::new();
        for (entity, mut schema) in by_entity {
            let mappings = resolved.remove(&entity).unwrap_or_default();
            for (association, mapping) in schema.associations.iter_mut().zip(mappings) {
                association.mapping = mapping;
            }
            tracing::debug!(
                entity = %entity,
                table = %schema.table,
                associations = schema.associations.len(),
                "registered schema"
            );
            schemas.insert(entity, Arc::new(schema));
        }

        Ok(Registry { schemas })
    }
}

fn resolve_mapping(
    origin: &Schema,
    association: &Association,
    destination: &Schema,
) -> QueryResult<Vec<ColumnMapping>> {
    let (holder, referenced) = if association.kind.origin_holds_key() {
        (origin, destination)
    } else {
        (destination, origin)
    };

    let columns = &association.foreign_key.columns;
    let references = association
        .foreign_key
        .references
        .as_deref()
        .unwrap_or(referenced.primary_key.as_slice());

    if columns.is_empty() || columns.len() != references.len() {
        return Err(QueryError::schema(
            &origin.entity,
            format!(
                "association '{}' maps {} column(s) onto {} referenced column(s)",
                association.name,
                columns.len(),
                references.len()
            ),
        ));
    }
    holder.require_columns(columns, "foreign key")?;
    referenced.require_columns(references, "referenced")?;

    Ok(columns
        .iter()
        .zip(references)
        .map(|(column, reference)| {
            if association.kind.origin_holds_key() {
                ColumnMapping {
                    origin: column.clone(),
                    destination: reference.clone(),
                }
            } else {
                ColumnMapping {
                    origin: reference.clone(),
                    destination: column.clone(),
                }
            }
        })
        .collect())
}
