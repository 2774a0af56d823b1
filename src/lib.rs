//! # relq — Runtime SQL-Compiling Object Mapper
//!
//! > **Stop concatenating strings. Compile your predicates.**
//!
//! relq turns typed predicate trees and plain entity values into
//! parameterized SQL, runs it on a connection you own, and maps the rows
//! back into your types through cached per-type metadata.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use relq::prelude::*;
//!
//! let mut session = AsyncSession::new(&mut conn);
//!
//! // Compile a predicate and fetch
//! let adults: Vec<User> = session
//!     .fetch(&Query::new()
//!         .filter(member("age").gte(18).and(member("name").starts_with("A")))
//!         .order_by("age", SortOrder::Desc)
//!         .limit(10))
//!     .await?;
//!
//! // Writes are entity-driven; touching every row is spelled out
//! session.insert(&user).await?;
//! session.delete_where::<User>(&Scope::Rows(member("age").lt(13))).await?;
//! ```
//!
//! Constants are always bound as parameters, never inlined. The only way
//! to update or delete without a predicate is the explicit
//! [`session::Scope::AllRows`].

pub mod ast;
pub mod conn;
pub mod convert;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod postgres;
pub mod session;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::{
        AggregateFunc, BinaryOp, Expr, SortOrder, StrFunc, Value, ValueKind, member, value,
    };
    pub use crate::conn::{
        AsyncConnection, AsyncRowCursor, Connection, ConnectionState, IsolationLevel, RowCursor,
        Rows,
    };
    pub use crate::convert::{Converter, convert_default};
    pub use crate::entity::{Entity, EntityDescriptor, MemberDescriptor, descriptor_of};
    pub use crate::error::{RelqError, RelqResult};
    pub use crate::mapper::{MapOptions, map_rows, map_rows_async};
    pub use crate::postgres::SqlxConnection;
    pub use crate::session::{
        AsyncSession, InsertOptions, PageInfo, Query, Scope, Session, SessionConfig,
    };
    pub use crate::transpiler::{Dialect, Parameter, SqlCommand};
}
