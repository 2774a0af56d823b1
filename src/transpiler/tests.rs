//! Translator and builder tests (WHERE, ORDER BY, projection, DML shapes).

use pretty_assertions::assert_eq;

use crate::ast::{SortOrder, Value, ValueKind, member};
use crate::entity::{Entity, EntityDescriptor, MemberDescriptor, descriptor_of};
use crate::error::{RelqError, RelqResult};
use crate::transpiler::{
    Dialect, ParamContext, dml, translate, translate_order_by, translate_projection,
};

#[derive(Debug, Default)]
struct User {
    id: i64,
    name: String,
    age: i64,
    active: bool,
}

impl Entity for User {
    fn table() -> &'static str {
        "users"
    }

    fn members() -> &'static [MemberDescriptor] {
        &[
            MemberDescriptor {
                member: "id",
                column: "id",
                kind: ValueKind::Int,
                key: true,
            },
            MemberDescriptor {
                member: "name",
                column: "name",
                kind: ValueKind::Text,
                key: false,
            },
            MemberDescriptor {
                member: "age",
                column: "age",
                kind: ValueKind::Int,
                key: false,
            },
            MemberDescriptor {
                member: "active",
                column: "active",
                kind: ValueKind::Bool,
                key: false,
            },
        ]
    }

    fn get(&self, member: &str) -> RelqResult<Value> {
        match member {
            "id" => Ok(Value::Int(self.id)),
            "name" => Ok(Value::Text(self.name.clone())),
            "age" => Ok(Value::Int(self.age)),
            "active" => Ok(Value::Bool(self.active)),
            _ => Err(RelqError::unknown_member(member, Self::table())),
        }
    }

    fn set(&mut self, member: &str, value: Value) -> RelqResult<()> {
        match (member, value) {
            ("id", Value::Int(n)) => self.id = n,
            ("name", Value::Text(s)) => self.name = s,
            ("age", Value::Int(n)) => self.age = n,
            ("active", Value::Bool(b)) => self.active = b,
            (m, v) => {
                return Err(RelqError::InvalidValue(format!(
                    "user member {m} rejects {v}"
                )));
            }
        }
        Ok(())
    }
}

fn users() -> &'static EntityDescriptor {
    descriptor_of::<User>().unwrap()
}

fn compile(expr: &crate::ast::Expr) -> (String, Vec<Value>) {
    let dialect = Dialect::default();
    let mut ctx = ParamContext::new(&dialect);
    let sql = translate(expr, users(), &mut ctx).unwrap();
    let params = ctx.into_params().into_iter().map(|p| p.value).collect();
    (sql, params)
}

#[test]
fn test_simple_comparison() {
    let (sql, params) = compile(&member("age").gt(18));
    assert_eq!(sql, "age > @p1");
    assert_eq!(params, vec![Value::Int(18)]);
}

#[test]
fn test_and_composition() {
    let (sql, params) = compile(&member("age").gt(18).and(member("name").eq("A")));
    assert_eq!(sql, "(age > @p1 AND name = @p2)");
    assert_eq!(params, vec![Value::Int(18), Value::Text("A".to_string())]);
}

#[test]
fn test_or_group_is_parenthesized() {
    let (sql, _) = compile(&member("age").lt(13).or(member("age").gt(64)));
    assert_eq!(sql, "(age < @p1 OR age > @p2)");
}

#[test]
fn test_translation_is_deterministic() {
    let expr = member("age").gt(18).and(member("name").eq("A"));
    let first = compile(&expr);
    let second = compile(&expr);
    assert_eq!(first, second);
}

#[test]
fn test_not_wraps_inner() {
    let (sql, _) = compile(&member("active").eq(true).not());
    assert_eq!(sql, "NOT (active = @p1)");
}

#[test]
fn test_string_match_patterns() {
    let (sql, params) = compile(&member("name").contains("li"));
    assert_eq!(sql, "name LIKE @p1");
    assert_eq!(params, vec![Value::Text("%li%".to_string())]);

    let (_, params) = compile(&member("name").starts_with("A"));
    assert_eq!(params, vec![Value::Text("A%".to_string())]);

    let (_, params) = compile(&member("name").ends_with("z"));
    assert_eq!(params, vec![Value::Text("%z".to_string())]);
}

#[test]
fn test_null_comparisons_use_is_null() {
    let (sql, params) = compile(&member("name").is_null());
    assert_eq!(sql, "name IS NULL");
    assert!(params.is_empty());

    let (sql, _) = compile(&member("name").is_not_null());
    assert_eq!(sql, "name IS NOT NULL");
}

#[test]
fn test_bare_boolean_member() {
    let (sql, params) = compile(&member("active"));
    assert_eq!(sql, "active = @p1");
    assert_eq!(params, vec![Value::Bool(true)]);
}

#[test]
fn test_member_to_member_comparison() {
    let (sql, params) = compile(&member("age").gte(member("id")));
    assert_eq!(sql, "age >= id");
    assert!(params.is_empty());
}

#[test]
fn test_unknown_member_is_named() {
    let dialect = Dialect::default();
    let mut ctx = ParamContext::new(&dialect);
    let err = translate(&member("aeg").gt(1), users(), &mut ctx).unwrap_err();
    match err {
        RelqError::UnknownMember { member, entity } => {
            assert_eq!(member, "aeg");
            assert_eq!(entity, "users");
        }
        other => panic!("expected UnknownMember, got {other}"),
    }
}

#[test]
fn test_bare_constant_is_rejected() {
    let dialect = Dialect::default();
    let mut ctx = ParamContext::new(&dialect);
    let err = translate(&crate::ast::value(1), users(), &mut ctx).unwrap_err();
    assert!(matches!(err, RelqError::Unsupported(_)));
}

#[test]
fn test_order_by() {
    let dialect = Dialect::default();
    let pairs = vec![
        ("age".to_string(), SortOrder::Desc),
        ("name".to_string(), SortOrder::Asc),
    ];
    let sql = translate_order_by(&pairs, users(), &dialect).unwrap();
    assert_eq!(sql, "age DESC, name ASC");
}

#[test]
fn test_projection_resolves_columns() {
    let dialect = Dialect::default();
    let cols = translate_projection(
        &["id".to_string(), "name".to_string()],
        users(),
        &dialect,
    )
    .unwrap();
    assert_eq!(cols, vec!["id".to_string(), "name".to_string()]);

    let err =
        translate_projection(&["nope".to_string()], users(), &dialect).unwrap_err();
    assert!(matches!(err, RelqError::UnknownMember { .. }));
}

#[test]
fn test_select_skeleton() {
    let dialect = Dialect::default();
    let sql = dml::build_select(
        "users",
        &["id".to_string(), "name".to_string()],
        Some("age > @p1"),
        Some("age DESC"),
        Some(10),
        Some(20),
        &dialect,
    );
    assert_eq!(
        sql,
        "SELECT id, name FROM users WHERE age > @p1 ORDER BY age DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_select_star_without_filter() {
    let dialect = Dialect::default();
    let sql = dml::build_select("users", &[], None, None, None, None, &dialect);
    assert_eq!(sql, "SELECT * FROM users");
}

#[test]
fn test_insert_skeleton() {
    let dialect = Dialect::default();
    let sql = dml::build_insert(
        "users",
        &["name".to_string(), "age".to_string()],
        &["@p1".to_string(), "@p2".to_string()],
        &dialect,
    );
    assert_eq!(sql, "INSERT INTO users (name, age) VALUES (@p1, @p2)");
}

#[test]
fn test_update_skeleton() {
    let dialect = Dialect::default();
    let sql = dml::build_update(
        "users",
        &["name = @p1".to_string()],
        Some("id = @p2"),
        &dialect,
    );
    assert_eq!(sql, "UPDATE users SET name = @p1 WHERE id = @p2");
}

#[test]
fn test_delete_skeleton() {
    let dialect = Dialect::default();
    assert_eq!(
        dml::build_delete("users", Some("id = @p1"), &dialect),
        "DELETE FROM users WHERE id = @p1"
    );
    assert_eq!(
        dml::build_delete("users", None, &dialect),
        "DELETE FROM users"
    );
}
