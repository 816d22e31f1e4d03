//! Alias allocation and cross-node references.

use super::registry;
use crate::alias::TableAlias;
use crate::ast::col;
use crate::error::QueryError;
use crate::request::Derivable;
use crate::transpiler::ToSql;

#[test]
fn test_self_join_aliases_are_suffixed() {
    let registry = registry();
    let grandparent = registry.association("Person", "parent").unwrap();
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .including_optional(grandparent)
        .unwrap();
    let request = registry
        .all("Person")
        .unwrap()
        .including_required(parent)
        .unwrap();
    assert_eq!(
        request.to_sql().unwrap().sql,
        r#"SELECT "person".*, "person1".*, "person2".* FROM "person" JOIN "person" "person1" ON "person1"."id" = "person"."parent_id" LEFT JOIN "person" "person2" ON "person2"."id" = "person1"."parent_id""#
    );
}

#[test]
fn test_nested_filter_references_root() {
    let registry = registry();
    let root = TableAlias::new();
    let grandparent = registry
        .association("Person", "parent")
        .unwrap()
        .filter(col("name").eq(root.column("name")));
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .including_required(grandparent)
        .unwrap();
    let request = registry
        .all("Person")
        .unwrap()
        .aliased(&root)
        .including_required(parent)
        .unwrap();
    assert_eq!(
        request.to_sql().unwrap().sql,
        r#"SELECT "person".*, "person1".*, "person2".* FROM "person" JOIN "person" "person1" ON "person1"."id" = "person"."parent_id" JOIN "person" "person2" ON ("person2"."id" = "person1"."parent_id") AND ("person2"."name" = "person"."name")"#
    );
}

#[test]
fn test_explicit_name_wins_over_default() {
    let registry = registry();
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .aliased(&TableAlias::named("person"));
    let request = registry
        .all("Person")
        .unwrap()
        .including_required(parent)
        .unwrap();
    assert_eq!(
        request.to_sql().unwrap().sql,
        r#"SELECT "person1".*, "person".* FROM "person" "person1" JOIN "person" ON "person"."id" = "person1"."parent_id""#
    );
}

#[test]
fn test_explicit_name_comparison_ignores_case() {
    let registry = registry();
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .aliased(&TableAlias::named("PERSON"));
    let request = registry
        .all("Person")
        .unwrap()
        .including_required(parent)
        .unwrap();
    assert_eq!(
        request.to_sql().unwrap().sql,
        r#"SELECT "person1".*, "PERSON".* FROM "person" "person1" JOIN "person" "PERSON" ON "PERSON"."id" = "person1"."parent_id""#
    );
}

#[test]
fn test_detached_alias_is_an_error() {
    let registry = registry();
    let stray = TableAlias::new();
    let b = registry
        .association("A", "b")
        .unwrap()
        .filter(col("id").eq(stray.column("id")));
    let request = registry.all("A").unwrap().including_required(b).unwrap();
    match request.to_sql() {
        Err(QueryError::AliasResolution { path, .. }) => assert_eq!(path, "A.b"),
        other => panic!("expected alias resolution error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_explicit_names_are_ambiguous() {
    let registry = registry();
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .aliased(&TableAlias::named("p"));
    let request = registry
        .all("Person")
        .unwrap()
        .aliased(&TableAlias::named("P"))
        .including_required(parent)
        .unwrap();
    match request.to_sql() {
        Err(QueryError::Ambiguity { first, second, .. }) => {
            assert_eq!(first, "Person");
            assert_eq!(second, "Person.parent");
        }
        other => panic!("expected ambiguity error, got {:?}", other),
    }
}

#[test]
fn test_one_handle_on_two_nodes_is_ambiguous() {
    let registry = registry();
    let shared = TableAlias::new();
    let parent = registry
        .association("Person", "parent")
        .unwrap()
        .aliased(&shared);
    let request = registry
        .all("Person")
        .unwrap()
        .aliased(&shared)
        .including_required(parent)
        .unwrap();
    assert!(matches!(
        request.to_sql(),
        Err(QueryError::Ambiguity { .. })
    ));
}

#[test]
fn test_compilation_is_reproducible() {
    let registry = registry();
    let alias = TableAlias::new();
    let request = registry
        .all("A")
        .unwrap()
        .including_required(registry.association("A", "b").unwrap().aliased(&alias))
        .unwrap()
        .filter(alias.column("name").eq("x"))
        .order([alias.column("name")]);
    assert_eq!(request.to_sql().unwrap(), request.to_sql().unwrap());
}
