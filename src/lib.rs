//! # assoc-sql
//!
//! Compiles a root entity plus a tree of included associations into one
//! SQL `SELECT` statement with its bound arguments.
//!
//! ## Quick Example
//!
//! ```
//! use assoc_sql::prelude::*;
//!
//! let registry = Registry::builder()
//!     .register(
//!         Schema::new("A", "a")
//!             .columns(["id", "bid"])
//!             .primary_key(["id"])
//!             .belongs_to("b", "B", ForeignKey::new(["bid"])),
//!     )
//!     .register(Schema::new("B", "b").columns(["id", "name"]).primary_key(["id"]))
//!     .build()?;
//!
//! let request = registry
//!     .all("A")?
//!     .order([col("id")])
//!     .including_required(registry.association("A", "b")?.order([col("name")]).reversed())?;
//!
//! let statement = request.build()?;
//! assert_eq!(
//!     statement.sql,
//!     r#"SELECT "a".*, "b".* FROM "a" JOIN "b" ON "b"."id" = "a"."bid" ORDER BY "a"."id", "b"."name" DESC"#
//! );
//! # Ok::<(), QueryError>(())
//! ```
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`schema::Registry`] | entity schemas and their associations, read-only once built |
//! | [`request::Derivable`] | `including_*`, `select`, `filter*`, `order`, `reversed`, `aliased` |
//! | [`alias::TableAlias`] | handle for referencing another table instance in a predicate |
//! | [`transpiler::Statement`] | the compiled `(sql, arguments)` pair |

pub mod alias;
pub mod ast;
pub mod error;
pub mod request;
pub mod schema;
pub mod transpiler;

pub mod prelude {
    pub use crate::alias::TableAlias;
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::request::{AssociationRequest, Derivable, Request};
    pub use crate::schema::{Association, AssociationKind, ForeignKey, Registry, Schema};
    pub use crate::transpiler::{Statement, ToSql};
}
