//! Schema configuration loaded from TOML.
//!
//! ```toml
//! [[entity]]
//! name = "A"
//! table = "a"
//! columns = ["id", "bid"]
//! primary_key = ["id"]
//!
//! [[entity.association]]
//! name = "b"
//! kind = "belongs_to"
//! destination = "B"
//! columns = ["bid"]
//! ```

use crate::ast::Selectable;
use crate::error::{QueryError, QueryResult};
use crate::schema::{Association, AssociationKind, ForeignKey, Registry, ROWID, Schema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root of a schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityConfig>,
}

/// One `[[entity]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub selection: Option<Vec<SelectableConfig>>,
    #[serde(default, rename = "association")]
    pub associations: Vec<AssociationConfig>,
}

/// A selection entry: `"*"`, `"rowid"`, a column name, or
/// `{ all_except = [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectableConfig {
    Name(String),
    AllExcept { all_except: Vec<String> },
}

/// One `[[entity.association]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    pub name: String,
    pub kind: AssociationKind,
    pub destination: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub references: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

impl From<&SelectableConfig> for Selectable {
    fn from(config: &SelectableConfig) -> Self {
        match config {
            SelectableConfig::Name(name) if name == "*" => Selectable::AllColumns,
            SelectableConfig::Name(name) if name.eq_ignore_ascii_case(ROWID) => Selectable::RowId,
            SelectableConfig::Name(name) => Selectable::Column(name.clone()),
            SelectableConfig::AllExcept { all_except } => {
                Selectable::AllColumnsExcluding(all_except.clone())
            }
        }
    }
}

impl EntityConfig {
    fn to_schema(&self) -> Schema {
        let mut schema = Schema::new(&self.name, &self.table)
            .columns(&self.columns)
            .primary_key(&self.primary_key);
        if let Some(selection) = &self.selection {
            schema = schema.selection(selection.iter().map(Selectable::from));
        }
        for assoc in &self.associations {
            let mut foreign_key = ForeignKey::new(&assoc.columns);
            if let Some(references) = &assoc.references {
                foreign_key = foreign_key.references(references);
            }
            let mut association =
                Association::new(&assoc.name, assoc.kind, &assoc.destination, foreign_key);
            if assoc.required {
                association = association.required();
            }
            schema = schema.association(association);
        }
        schema
    }
}

impl SchemaConfig {
    pub fn parse(content: &str) -> QueryResult<Self> {
        toml::from_str(content)
            .map_err(|e| QueryError::Config(format!("Failed to parse schema: {}", e)))
    }

    pub fn into_registry(self) -> QueryResult<Registry> {
        self.entities
            .iter()
            .fold(Registry::builder(), |builder, entity| {
                builder.register(entity.to_schema())
            })
            .build()
    }
}

impl Registry {
    /// Build a registry from TOML text.
    pub fn from_toml_str(content: &str) -> QueryResult<Registry> {
        SchemaConfig::parse(content)?.into_registry()
    }

    /// Load a registry from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> QueryResult<Registry> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded {} entity schemas from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }
}

/// `<config dir>/assoc-sql/schema.toml`, if the platform has a config dir.
pub fn default_schema_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("assoc-sql").join("schema.toml"))
}
