//! Scripted in-memory connection used by the engine tests.
//!
//! Commands are logged verbatim; results come from a queue of canned
//! responses. An empty queue answers executes with 1 affected row and
//! queries with an empty row set.

#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use relq::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Open,
    Close,
    Begin(IsolationLevel),
    Commit,
    Rollback,
    Execute(String, Vec<Value>),
    Query(String, Vec<Value>),
}

#[derive(Debug, Clone)]
pub enum Canned {
    Affected(u64),
    Rows(Vec<&'static str>, Vec<Vec<Value>>),
    Fail(&'static str),
    Disconnect(&'static str),
}

#[derive(Debug, Default)]
pub struct ScriptedConnection {
    pub log: Vec<Op>,
    script: VecDeque<Canned>,
    closed: bool,
    broken: bool,
    depth: u32,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, canned: Canned) {
        self.script.push_back(canned);
    }

    pub fn scripted(results: impl IntoIterator<Item = Canned>) -> Self {
        Self {
            script: results.into_iter().collect(),
            ..Self::default()
        }
    }

    /// The SQL texts of every executed/queried command, in order.
    pub fn statements(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|op| match op {
                Op::Execute(sql, _) | Op::Query(sql, _) => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }

    fn next_execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        self.log.push(Op::Execute(
            cmd.text.clone(),
            cmd.params.iter().map(|p| p.value.clone()).collect(),
        ));
        match self.script.pop_front() {
            None => Ok(1),
            Some(Canned::Affected(n)) => Ok(n),
            Some(Canned::Rows(..)) => Err(RelqError::Execution(
                "scripted rows in execute position".to_string(),
            )),
            Some(Canned::Fail(msg)) => Err(RelqError::Execution(msg.to_string())),
            Some(Canned::Disconnect(msg)) => {
                self.broken = true;
                Err(RelqError::Connection(msg.to_string()))
            }
        }
    }

    fn next_query(&mut self, cmd: &SqlCommand) -> RelqResult<Rows> {
        self.log.push(Op::Query(
            cmd.text.clone(),
            cmd.params.iter().map(|p| p.value.clone()).collect(),
        ));
        match self.script.pop_front() {
            None => Ok(Rows::default()),
            Some(Canned::Rows(columns, rows)) => Ok(Rows::new(
                columns.iter().map(|c| c.to_string()).collect(),
                rows,
            )),
            Some(Canned::Affected(_)) => Err(RelqError::Execution(
                "scripted affected-count in query position".to_string(),
            )),
            Some(Canned::Fail(msg)) => Err(RelqError::Execution(msg.to_string())),
            Some(Canned::Disconnect(msg)) => {
                self.broken = true;
                Err(RelqError::Connection(msg.to_string()))
            }
        }
    }

    fn current_state(&self) -> ConnectionState {
        if self.broken {
            ConnectionState::Broken
        } else if self.closed {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    fn do_open(&mut self) {
        self.log.push(Op::Open);
        self.closed = false;
        self.broken = false;
        self.depth = 0;
    }

    fn do_close(&mut self) {
        self.log.push(Op::Close);
        self.closed = true;
        self.depth = 0;
    }
}

impl Connection for ScriptedConnection {
    fn state(&self) -> ConnectionState {
        self.current_state()
    }

    fn open(&mut self) -> RelqResult<()> {
        self.do_open();
        Ok(())
    }

    fn close(&mut self) -> RelqResult<()> {
        self.do_close();
        Ok(())
    }

    fn execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        self.next_execute(cmd)
    }

    fn query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn RowCursor + Send>> {
        Ok(Box::new(self.next_query(cmd)?))
    }

    fn begin(&mut self, isolation: IsolationLevel) -> RelqResult<()> {
        self.log.push(Op::Begin(isolation));
        self.depth += 1;
        Ok(())
    }

    fn commit(&mut self) -> RelqResult<()> {
        self.log.push(Op::Commit);
        self.depth = 0;
        Ok(())
    }

    fn rollback(&mut self) -> RelqResult<()> {
        self.log.push(Op::Rollback);
        self.depth = 0;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.depth > 0
    }
}

#[async_trait]
impl AsyncConnection for ScriptedConnection {
    fn state(&self) -> ConnectionState {
        self.current_state()
    }

    async fn open(&mut self) -> RelqResult<()> {
        self.do_open();
        Ok(())
    }

    async fn close(&mut self) -> RelqResult<()> {
        self.do_close();
        Ok(())
    }

    async fn execute(&mut self, cmd: &SqlCommand) -> RelqResult<u64> {
        self.next_execute(cmd)
    }

    async fn query(&mut self, cmd: &SqlCommand) -> RelqResult<Box<dyn AsyncRowCursor>> {
        Ok(Box::new(self.next_query(cmd)?))
    }

    async fn begin(&mut self, isolation: IsolationLevel) -> RelqResult<()> {
        self.log.push(Op::Begin(isolation));
        self.depth += 1;
        Ok(())
    }

    async fn commit(&mut self) -> RelqResult<()> {
        self.log.push(Op::Commit);
        self.depth = 0;
        Ok(())
    }

    async fn rollback(&mut self) -> RelqResult<()> {
        self.log.push(Op::Rollback);
        self.depth = 0;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.depth > 0
    }
}

/// The entity used across the engine tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i64,
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
        ]
    }

    fn get(&self, member: &str) -> RelqResult<Value> {
        match member {
            "id" => Ok(Value::Int(self.id)),
            "name" => Ok(Value::Text(self.name.clone())),
            "age" => Ok(Value::Int(self.age)),
            _ => Err(RelqError::UnknownMember {
                member: member.to_string(),
                entity: Self::table(),
            }),
        }
    }

    fn set(&mut self, member: &str, value: Value) -> RelqResult<()> {
        match (member, value) {
            ("id", Value::Int(n)) => self.id = n,
            ("name", Value::Text(s)) => self.name = s,
            ("age", Value::Int(n)) => self.age = n,
            (m, v) => {
                return Err(RelqError::InvalidValue(format!(
                    "user member {m} rejects {v}"
                )));
            }
        }
        Ok(())
    }
}
