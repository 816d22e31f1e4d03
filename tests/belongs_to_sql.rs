//! SQL derivation for a belongs-to association `A -> B`, through the public
//! API only.

use assoc_sql::prelude::*;
use pretty_assertions::assert_eq;

fn registry() -> Registry {
    let b_schema = |entity: &str| {
        Schema::new(entity, "b")
            .columns(["id", "name"])
            .primary_key(["id"])
    };
    Registry::builder()
        .register(
            Schema::new("A", "a")
                .columns(["id", "bid"])
                .primary_key(["id"])
                .belongs_to("b", "B", ForeignKey::new(["bid"]))
                .belongs_to("restrictedB1", "RestrictedB1", ForeignKey::new(["bid"]))
                .belongs_to("restrictedB2", "RestrictedB2", ForeignKey::new(["bid"]))
                .belongs_to("extendedB", "ExtendedB", ForeignKey::new(["bid"])),
        )
        .register(b_schema("B").has_one("a", "A", ForeignKey::new(["bid"])))
        .register(b_schema("RestrictedB1").selection([Selectable::column("name")]))
        .register(b_schema("RestrictedB2").selection([Selectable::all_excluding(["id"])]))
        .register(b_schema("ExtendedB").selection([Selectable::AllColumns, Selectable::RowId]))
        .build()
        .expect("registry")
}

fn sql(request: &Request) -> String {
    request.build().expect("compiles").sql
}

fn including(registry: &Registry, association: &str) -> String {
    let request = registry
        .all("A")
        .unwrap()
        .including_required(registry.association("A", association).unwrap())
        .unwrap();
    sql(&request)
}

#[test]
fn default_selection() {
    let registry = registry();
    assert_eq!(
        including(&registry, "b"),
        r#"SELECT "a".*, "b".* FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );
    assert_eq!(
        including(&registry, "restrictedB1"),
        r#"SELECT "a".*, "b"."name" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );
    assert_eq!(
        including(&registry, "restrictedB2"),
        r#"SELECT "a".*, "b"."name" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );
    assert_eq!(
        including(&registry, "extendedB"),
        r#"SELECT "a".*, "b".*, "b"."rowid" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );
}

#[test]
fn custom_selection() {
    let registry = registry();
    let b = || registry.association("A", "b").unwrap();

    let request = registry
        .all("A")
        .unwrap()
        .including_required(b().select([col("name")]).unwrap())
        .unwrap();
    assert_eq!(
        sql(&request),
        r#"SELECT "a".*, "b"."name" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );

    let request = registry
        .all("A")
        .unwrap()
        .including_required(
            b().select([Selectable::AllColumns, Selectable::RowId])
                .unwrap(),
        )
        .unwrap();
    assert_eq!(
        sql(&request),
        r#"SELECT "a".*, "b".*, "b"."rowid" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );

    let a_alias = TableAlias::new();
    let request = registry
        .all("A")
        .unwrap()
        .aliased(&a_alias)
        .including_required(
            b().select([
                Selectable::column("name"),
                (col("id") + a_alias.column("id")).named("foo"),
            ])
            .unwrap(),
        )
        .unwrap();
    assert_eq!(
        sql(&request),
        r#"SELECT "a".*, "b"."name", "b"."id" + "a"."id" AS "foo" FROM "a" JOIN "b" ON "b"."id" = "a"."bid""#
    );
}

#[test]
fn filter_association_in_where_clause() {
    let registry = registry();
    let b_alias = TableAlias::new();
    let request = registry
        .all("A")
        .unwrap()
        .including_required(registry.association("A", "b").unwrap().aliased(&b_alias))
        .unwrap()
        .filter(b_alias.column("name").is_not_null());
    assert_eq!(
        sql(&request),
        r#"SELECT "a".*, "b".* FROM "a" JOIN "b" ON "b"."id" = "a"."bid" WHERE "b"."name" IS NOT NULL"#
    );
}

type Transform<T> = fn(T) -> T;

#[test]
fn association_order_bubble_up() {
    let registry = registry();
    let a_base = registry
        .all("A")
        .unwrap()
        .aliased(&TableAlias::named("a"));
    let ab_base = registry
        .association("A", "b")
        .unwrap()
        .aliased(&TableAlias::named("ab"));
    let aba_base = registry
        .association("B", "a")
        .unwrap()
        .aliased(&TableAlias::named("aba"));

    let a_transforms: [Transform<Request>; 3] = [
        |r| r,
        |r| r.order([col("id")]),
        |r| r.order([col("id")]).reversed(),
    ];
    let ab_transforms: [Transform<AssociationRequest>; 5] = [
        |r| r,
        |r| r.order([col("name").into(), col("id").desc()]),
        |r| r.order([col("name")]).order([col("id").desc()]),
        |r| r.order([col("name")]).reversed(),
        |r| r.reversed(),
    ];
    let aba_transforms: [Transform<AssociationRequest>; 3] = [
        |r| r,
        |r| r.order([col("id")]),
        |r| r.order([col("id")]).reversed(),
    ];

    let prefix = r#"SELECT "a".*, "ab".*, "aba".* FROM "a" JOIN "b" "ab" ON "ab"."id" = "a"."bid" JOIN "a" "aba" ON "aba"."bid" = "ab"."id""#;

    let mut clauses = Vec::new();
    for a in &a_transforms {
        for ab in &ab_transforms {
            for aba in &aba_transforms {
                let request = a(a_base.clone())
                    .including_required(
                        ab(ab_base.clone())
                            .including_required(aba(aba_base.clone()))
                            .unwrap(),
                    )
                    .unwrap();
                let sql = sql(&request);
                let clause = sql
                    .strip_prefix(prefix)
                    .unwrap_or_else(|| panic!("unexpected statement: {}", sql))
                    .to_string();
                clauses.push(clause);
            }
        }
    }

    let expected = [
        // a: unordered
        r#""#,
        r#" ORDER BY "aba"."id""#,
        r#" ORDER BY "aba"."id" DESC"#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC"#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC, "aba"."id""#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC"#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC, "aba"."id""#,
        r#" ORDER BY "ab"."name", "ab"."id" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "ab"."name" DESC"#,
        r#" ORDER BY "ab"."name" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "ab"."name" DESC, "aba"."id""#,
        r#""#,
        r#" ORDER BY "aba"."id" DESC"#,
        r#" ORDER BY "aba"."id""#,
        // a: order(id)
        r#" ORDER BY "a"."id""#,
        r#" ORDER BY "a"."id", "aba"."id""#,
        r#" ORDER BY "a"."id", "aba"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC, "aba"."id""#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC, "aba"."id""#,
        r#" ORDER BY "a"."id", "ab"."name", "ab"."id" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id", "ab"."name" DESC, "aba"."id""#,
        r#" ORDER BY "a"."id""#,
        r#" ORDER BY "a"."id", "aba"."id" DESC"#,
        r#" ORDER BY "a"."id", "aba"."id""#,
        // a: order(id).reversed()
        r#" ORDER BY "a"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC, "aba"."id""#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC"#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC, "aba"."id""#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC"#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC, "aba"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC, "ab"."name" DESC, "ab"."id" ASC, "aba"."id""#,
        r#" ORDER BY "a"."id" DESC, "ab"."name""#,
        r#" ORDER BY "a"."id" DESC, "ab"."name", "aba"."id""#,
        r#" ORDER BY "a"."id" DESC, "ab"."name", "aba"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC"#,
        r#" ORDER BY "a"."id" DESC, "aba"."id""#,
        r#" ORDER BY "a"."id" DESC, "aba"."id" DESC"#,
    ];

    assert_eq!(clauses.len(), expected.len());
    for (i, (clause, expected)) in clauses.iter().zip(expected).enumerate() {
        let (a, ab, aba) = (i / 15, (i / 3) % 5, i % 3);
        assert_eq!(clause, expected, "a#{} ab#{} aba#{}", a, ab, aba);
    }
}

#[test]
fn statement_serializes_to_json() {
    let registry = registry();
    let request = registry
        .all("A")
        .unwrap()
        .filter(col("id").eq(bind(3)));
    let statement = request.build().unwrap();
    let json = serde_json::to_value(&statement).unwrap();
    assert_eq!(json["sql"], r#"SELECT "a".* FROM "a" WHERE "a"."id" = ?"#);
    assert_eq!(json["arguments"][0], serde_json::json!({ "Int": 3 }));
}
