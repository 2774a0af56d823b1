//! Entity metadata: the member cache behind translation and mapping.

pub mod descriptor;
pub mod registry;

pub use self::descriptor::{EntityDescriptor, MemberDescriptor};
pub use self::registry::descriptor_of;

use crate::ast::Value;
use crate::error::RelqResult;

/// A type mapped to a table.
///
/// Implementations declare their table, their member/column metadata, and
/// typed accessors; everything else (descriptors, SQL, mapping) is derived
/// from those. `Default` provides the blank instance the mapper fills in.
///
/// # Example
///
/// ```ignore
/// impl Entity for User {
///     fn table() -> &'static str { "users" }
///     fn members() -> &'static [MemberDescriptor] {
///         &[
///             MemberDescriptor { member: "id", column: "id", kind: ValueKind::Int, key: true },
///             MemberDescriptor { member: "name", column: "name", kind: ValueKind::Text, key: false },
///         ]
///     }
///     fn get(&self, member: &str) -> RelqResult<Value> { ... }
///     fn set(&mut self, member: &str, value: Value) -> RelqResult<()> { ... }
/// }
/// ```
pub trait Entity: Default + Send + 'static {
    /// Mapped table name.
    fn table() -> &'static str;

    /// Member/column metadata, in declaration order.
    fn members() -> &'static [MemberDescriptor];

    /// Read a member value by member name.
    fn get(&self, member: &str) -> RelqResult<Value>;

    /// Write a member value by member name.
    fn set(&mut self, member: &str, value: Value) -> RelqResult<()>;
}
