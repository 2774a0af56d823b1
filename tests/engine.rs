//! Engine tests against a scripted connection: command text, parameter
//! order, transaction sequencing, and row mapping.

mod common;

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use relq::prelude::*;

use common::{Canned, Op, ScriptedConnection, User};

fn user(name: &str, age: i64) -> User {
    User {
        id: 0,
        name: name.to_string(),
        age,
    }
}

#[test]
fn insert_then_lookup_round_trip() {
    let mut conn = ScriptedConnection::scripted([
        Canned::Affected(1),
        Canned::Rows(vec!["lastval"], vec![vec![Value::Int(7)]]),
        Canned::Rows(
            vec!["id", "name", "age"],
            vec![vec![Value::Int(7), Value::Text("A".to_string()), Value::Int(20)]],
        ),
    ]);
    let mut session = Session::new(&mut conn);

    let id = session
        .insert_with(
            &user("A", 20),
            &InsertOptions {
                id_query: Some("SELECT lastval()"),
                columns: None,
            },
        )
        .unwrap();
    assert_eq!(id, Some(Value::Int(7)));

    let found: Vec<User> = session
        .fetch(&Query::new().filter(member("id").eq(7i64)))
        .unwrap();
    assert_eq!(found, vec![User { id: 7, name: "A".to_string(), age: 20 }]);

    assert_eq!(
        conn.log,
        vec![
            Op::Execute(
                "INSERT INTO users (name, age) VALUES (@p1, @p2)".to_string(),
                vec![Value::Text("A".to_string()), Value::Int(20)],
            ),
            Op::Query("SELECT lastval()".to_string(), vec![]),
            Op::Query(
                "SELECT id, name, age FROM users WHERE id = @p1".to_string(),
                vec![Value::Int(7)],
            ),
        ]
    );
}

#[test]
fn select_carries_projection_order_and_window() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let _: Vec<User> = session
        .fetch(
            &Query::new()
                .filter(member("age").gte(18))
                .order_by("age", SortOrder::Desc)
                .limit(10)
                .offset(20),
        )
        .unwrap();

    assert_eq!(
        conn.statements(),
        vec!["SELECT id, name, age FROM users WHERE age >= @p1 ORDER BY age DESC LIMIT 10 OFFSET 20"]
    );
}

#[test]
fn projection_selects_named_members_only() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let _: Vec<User> = session.fetch(&Query::new().select(&["id", "name"])).unwrap();
    assert_eq!(conn.statements(), vec!["SELECT id, name FROM users"]);
}

#[test]
fn insert_range_failure_rolls_back_everything() {
    let entities = vec![
        user("a", 1),
        user("b", 2),
        user("c", 3),
        user("d", 4),
        user("e", 5),
    ];
    let mut conn = ScriptedConnection::scripted([
        Canned::Affected(1),
        Canned::Affected(1),
        Canned::Fail("unique constraint violated"),
    ]);
    let mut session = Session::new(&mut conn);

    let err = session.insert_range(&entities).unwrap_err();
    assert!(matches!(err, RelqError::Execution(_)));

    // Three statements attempted, nothing after the failure, one rollback.
    assert_eq!(conn.statements().len(), 3);
    assert_eq!(conn.log.first(), Some(&Op::Begin(IsolationLevel::ReadCommitted)));
    assert_eq!(conn.log.last(), Some(&Op::Rollback));
    assert!(!conn.log.contains(&Op::Commit));
}

#[test]
fn insert_range_commits_on_success() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let affected = session.insert_range(&[user("a", 1), user("b", 2)]).unwrap();
    assert_eq!(affected, 2);
    assert_eq!(conn.log.first(), Some(&Op::Begin(IsolationLevel::ReadCommitted)));
    assert_eq!(conn.log.last(), Some(&Op::Commit));
}

#[test]
fn insert_range_reuses_caller_transaction() {
    let mut conn = ScriptedConnection::scripted([Canned::Affected(1), Canned::Fail("boom")]);
    Connection::begin(&mut conn, IsolationLevel::Serializable).unwrap();

    let mut session = Session::new(&mut conn);
    let err = session.insert_range(&[user("a", 1), user("b", 2)]).unwrap_err();
    assert!(matches!(err, RelqError::Execution(_)));

    // The batch neither commits nor rolls back a transaction it did not open.
    assert_eq!(
        conn.log
            .iter()
            .filter(|op| matches!(op, Op::Begin(_)))
            .count(),
        1
    );
    assert!(!conn.log.contains(&Op::Rollback));
    assert!(!conn.log.contains(&Op::Commit));
}

#[test]
fn update_by_key_uses_entity_key_values() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let entity = User {
        id: 5,
        name: "B".to_string(),
        age: 31,
    };
    session.update(&entity).unwrap();

    assert_eq!(
        conn.log,
        vec![Op::Execute(
            "UPDATE users SET name = @p1, age = @p2 WHERE id = @p3".to_string(),
            vec![Value::Text("B".to_string()), Value::Int(31), Value::Int(5)],
        )]
    );
}

#[test]
fn update_matching_nothing_is_not_an_error() {
    let mut conn = ScriptedConnection::scripted([Canned::Affected(0)]);
    let mut session = Session::new(&mut conn);
    assert_eq!(session.update(&user("ghost", 1)).unwrap(), 0);
}

#[test]
fn update_columns_restricts_the_set_list() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    session.update_columns(&user("B", 31), &["name"]).unwrap();
    assert_eq!(
        conn.statements(),
        vec!["UPDATE users SET name = @p1 WHERE id = @p2"]
    );
}

#[test]
fn scoped_writes_spell_out_all_rows() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    session
        .delete_where::<User>(&Scope::Rows(member("age").lt(13)))
        .unwrap();
    session.delete_where::<User>(&Scope::AllRows).unwrap();
    session
        .update_where(&user("x", 0), &Scope::AllRows, Some(&["age"]))
        .unwrap();

    assert_eq!(
        conn.statements(),
        vec![
            "DELETE FROM users WHERE age < @p1",
            "DELETE FROM users",
            "UPDATE users SET age = @p1",
        ]
    );
}

#[test]
fn delete_by_key() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let entity = User {
        id: 9,
        ..User::default()
    };
    session.delete(&entity).unwrap();
    assert_eq!(
        conn.log,
        vec![Op::Execute(
            "DELETE FROM users WHERE id = @p1".to_string(),
            vec![Value::Int(9)],
        )]
    );
}

#[test]
fn null_columns_map_to_member_defaults() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["id", "name", "age"],
        vec![vec![Value::Int(1), Value::Null, Value::Null]],
    )]);
    let mut session = Session::new(&mut conn);

    let found: Vec<User> = session.fetch(&Query::new()).unwrap();
    assert_eq!(
        found,
        vec![User {
            id: 1,
            name: String::new(),
            age: 0
        }]
    );
}

#[test]
fn mapping_failure_names_column_and_member() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["id", "name", "age"],
        vec![vec![Value::Int(1), Value::Text("A".to_string()), Value::Text("x".to_string())]],
    )]);
    let mut session = Session::new(&mut conn);

    let err = session.fetch::<User>(&Query::new()).unwrap_err();
    match err {
        RelqError::Mapping { column, member, .. } => {
            assert_eq!(column, "age");
            assert_eq!(member, "age");
        }
        other => panic!("expected Mapping error, got {other}"),
    }
}

#[test]
fn fetch_first_defaults_on_empty_result() {
    let mut conn = ScriptedConnection::scripted([
        Canned::Rows(vec!["id", "name", "age"], vec![]),
        Canned::Rows(vec!["id", "name", "age"], vec![]),
    ]);
    let mut session = Session::new(&mut conn);

    let first: User = session
        .fetch_first(&Query::new().filter(member("name").eq("nobody")))
        .unwrap();
    assert_eq!(first, User::default());

    let optional: Option<User> = session
        .fetch_optional(&Query::new().filter(member("name").eq("nobody")))
        .unwrap();
    assert_eq!(optional, None);
}

#[test]
fn column_override_takes_priority() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["id", "full_name"],
        vec![vec![Value::Int(1), Value::Text("Ada".to_string())]],
    )]);
    let mut session = Session::new(&mut conn);

    let overrides: HashMap<String, String> =
        [("full_name".to_string(), "name".to_string())].into();
    let opts = MapOptions {
        overrides: Some(&overrides),
        ..MapOptions::default()
    };
    let found: Vec<User> = session.fetch_with(&Query::new(), &opts).unwrap();
    assert_eq!(found[0].name, "Ada");
}

#[test]
fn item_factory_bypasses_member_setting() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["id", "name", "age"],
        vec![vec![Value::Int(1), Value::Text("A".to_string()), Value::Int(2)]],
    )]);
    let mut session = Session::new(&mut conn);

    let factory = |columns: &[String], values: &[Value]| -> RelqResult<User> {
        assert_eq!(columns.len(), values.len());
        Ok(User {
            id: 99,
            name: "factory".to_string(),
            age: 0,
        })
    };
    let opts = MapOptions {
        factory: Some(&factory),
        ..MapOptions::default()
    };
    let found: Vec<User> = session.fetch_with(&Query::new(), &opts).unwrap();
    assert_eq!(found[0].id, 99);
}

#[test]
fn broken_connection_is_reopened_once() {
    let mut conn =
        ScriptedConnection::scripted([Canned::Disconnect("socket reset"), Canned::Affected(1)]);
    let mut session = Session::new(&mut conn);

    assert_eq!(session.insert(&user("a", 1)).unwrap(), 1);

    let executes = conn
        .log
        .iter()
        .filter(|op| matches!(op, Op::Execute(..)))
        .count();
    assert_eq!(executes, 2);
    assert!(conn.log.contains(&Op::Close));
    assert!(conn.log.contains(&Op::Open));
}

#[test]
fn second_connection_failure_surfaces() {
    let mut conn = ScriptedConnection::scripted([
        Canned::Disconnect("socket reset"),
        Canned::Disconnect("still down"),
    ]);
    let mut session = Session::new(&mut conn);

    let err = session.insert(&user("a", 1)).unwrap_err();
    assert!(matches!(err, RelqError::Connection(_)));
}

#[test]
fn no_reopen_retry_inside_a_transaction() {
    let mut conn = ScriptedConnection::scripted([Canned::Disconnect("socket reset")]);
    Connection::begin(&mut conn, IsolationLevel::ReadCommitted).unwrap();

    let mut session = Session::new(&mut conn);
    let err = session.insert(&user("a", 1)).unwrap_err();
    assert!(matches!(err, RelqError::Connection(_)));
    assert!(!conn.log.contains(&Op::Open));
}

#[test]
fn count_compiles_count_star() {
    let mut conn =
        ScriptedConnection::scripted([Canned::Rows(vec!["count"], vec![vec![Value::Int(95)]])]);
    let mut session = Session::new(&mut conn);

    assert_eq!(session.count::<User>(None).unwrap(), 95);
    assert_eq!(conn.statements(), vec!["SELECT COUNT(*) FROM users"]);
}

#[test]
fn paging_splits_the_remainder() {
    let mut conn = ScriptedConnection::scripted([
        Canned::Rows(vec!["count"], vec![vec![Value::Int(95)]]),
        Canned::Rows(vec!["count"], vec![vec![Value::Int(95)]]),
    ]);
    let mut session = Session::new(&mut conn);

    assert_eq!(session.pages_count::<User>(20).unwrap(), 5);

    let pages = session.pages::<User>(20).unwrap();
    assert_eq!(pages.len(), 5);
    assert_eq!(
        pages[4],
        PageInfo {
            number: 4,
            offset: 80,
            count: 15
        }
    );
}

#[test]
fn aggregate_maps_columns_to_values() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["sum"],
        vec![vec![Value::Int(1234)]],
    )]);
    let mut session = Session::new(&mut conn);

    let sums = session.aggregate::<User>("sum", &["age"]).unwrap();
    assert_eq!(conn.statements(), vec!["SELECT SUM(age) FROM users"]);
    assert_eq!(sums.get("age"), Some(&Value::Int(1234)));
}

#[test]
fn aggregate_all_groups_by_column() {
    let mut conn = ScriptedConnection::scripted([Canned::Rows(
        vec!["min", "max"],
        vec![vec![Value::Int(13), Value::Int(64)]],
    )]);
    let mut session = Session::new(&mut conn);

    let stats = session
        .aggregate_all::<User>(&["min", "max"], &["age"])
        .unwrap();
    assert_eq!(conn.statements(), vec!["SELECT MIN(age), MAX(age) FROM users"]);
    assert_eq!(
        stats.get("age"),
        Some(&vec![Value::Int(13), Value::Int(64)])
    );
}

#[test]
fn unknown_aggregate_fails_before_any_sql() {
    let mut conn = ScriptedConnection::new();
    let mut session = Session::new(&mut conn);

    let err = session.aggregate::<User>("median", &["age"]).unwrap_err();
    assert!(matches!(err, RelqError::UnknownAggregate(_)));
    assert!(conn.log.is_empty());
}
