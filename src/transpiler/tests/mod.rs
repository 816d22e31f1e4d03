//! Transpiler tests against a small fixed registry.

mod aliases;

use crate::ast::Selectable;
use crate::schema::{ForeignKey, Registry, Schema};

/// `A -> B` in both directions, restricted views of `b`, a self-referencing
/// `Person`, and `Pair -> Point` over a two-column foreign key.
pub(super) fn registry() -> Registry {
    Registry::builder()
        .register(
            Schema::new("A", "a")
                .columns(["id", "bid"])
                .primary_key(["id"])
                .belongs_to("b", "B", ForeignKey::new(["bid"]))
                .belongs_to("restrictedB", "RestrictedB", ForeignKey::new(["bid"])),
        )
        .register(
            Schema::new("B", "b")
                .columns(["id", "name"])
                .primary_key(["id"])
                .has_one("a", "A", ForeignKey::new(["bid"]))
                .has_many("as", "A", ForeignKey::new(["bid"])),
        )
        .register(
            Schema::new("RestrictedB", "b")
                .columns(["id", "name"])
                .primary_key(["id"])
                .selection([Selectable::column("name")]),
        )
        .register(
            Schema::new("Person", "person")
                .columns(["id", "parent_id", "name"])
                .primary_key(["id"])
                .belongs_to("parent", "Person", ForeignKey::new(["parent_id"]))
                .has_many("children", "Person", ForeignKey::new(["parent_id"])),
        )
        .register(
            Schema::new("Pair", "pair")
                .columns(["x", "y", "label"])
                .primary_key(["x", "y"])
                .belongs_to(
                    "point",
                    "Point",
                    ForeignKey::new(["x", "y"]).references(["px", "py"]),
                ),
        )
        .register(
            Schema::new("Point", "p")
                .columns(["px", "py"])
                .primary_key(["px", "py"])
                .has_many(
                    "pairs",
                    "Pair",
                    ForeignKey::new(["x", "y"]).references(["px", "py"]),
                ),
        )
        .build()
        .expect("fixture registry is valid")
}
