use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::ValueKind;
use crate::entity::Entity;
use crate::error::{RelqError, RelqResult};

/// One member of an entity: its column mapping and declared kind.
///
/// Accessor logic lives on the entity type itself ([`Entity::get`] /
/// [`Entity::set`]); the descriptor carries metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Member (field) name, as used in predicate trees.
    pub member: &'static str,
    /// Column name in the mapped table.
    pub column: &'static str,
    /// Declared kind, used by value conversion.
    pub kind: ValueKind,
    /// Whether this column is part of the table key.
    pub key: bool,
}

/// Cached per-type metadata: table name, member list, key subset, lookups.
///
/// Built once per entity type on first use and frozen afterward; obtain
/// through [`crate::entity::descriptor_of`].
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Mapped table name.
    pub table: &'static str,
    /// All mapped members, in declaration order.
    pub members: &'static [MemberDescriptor],
    keys: Vec<usize>,
    by_column: HashMap<String, usize>,
    by_member: HashMap<&'static str, usize>,
}

impl EntityDescriptor {
    pub(crate) fn build<T: Entity>() -> RelqResult<Self> {
        let table = T::table();
        let members = T::members();
        if members.is_empty() {
            return Err(RelqError::InvalidValue(format!(
                "entity '{table}' declares no members"
            )));
        }

        let mut by_column = HashMap::with_capacity(members.len());
        let mut by_member = HashMap::with_capacity(members.len());
        let mut keys = Vec::new();
        for (idx, m) in members.iter().enumerate() {
            if by_column.insert(m.column.to_lowercase(), idx).is_some() {
                return Err(RelqError::InvalidValue(format!(
                    "entity '{table}' maps column '{}' twice",
                    m.column
                )));
            }
            if by_member.insert(m.member, idx).is_some() {
                return Err(RelqError::InvalidValue(format!(
                    "entity '{table}' declares member '{}' twice",
                    m.member
                )));
            }
            if m.key {
                keys.push(idx);
            }
        }

        Ok(Self {
            table,
            members,
            keys,
            by_column,
            by_member,
        })
    }

    /// Look up a member by member name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.by_member.get(name).map(|&i| &self.members[i])
    }

    /// Look up a member by member name, failing with a translation error
    /// that names the offender.
    pub fn require_member(&self, name: &str) -> RelqResult<&MemberDescriptor> {
        self.member(name)
            .ok_or_else(|| RelqError::unknown_member(name, self.table))
    }

    /// Resolve a result-set column to a member, case-insensitively.
    pub fn resolve_column(&self, column: &str) -> Option<&MemberDescriptor> {
        self.by_column
            .get(&column.to_lowercase())
            .map(|&i| &self.members[i])
    }

    /// The key-column subset, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.keys.iter().map(|&i| &self.members[i])
    }

    /// Members outside the key subset.
    pub fn non_keys(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.key)
    }

    /// The key subset, or [`RelqError::MissingKey`] if the entity has none.
    /// By-entity update/delete must refuse to run without keys.
    pub fn require_keys(&self) -> RelqResult<Vec<&MemberDescriptor>> {
        let keys: Vec<_> = self.keys().collect();
        if keys.is_empty() {
            return Err(RelqError::MissingKey(self.table));
        }
        Ok(keys)
    }
}
