//! Row-to-entity materialization.

use std::collections::HashMap;

use crate::ast::Value;
use crate::conn::{AsyncRowCursor, RowCursor};
use crate::convert::{Converter, convert_default};
use crate::entity::{Entity, MemberDescriptor, descriptor_of};
use crate::error::{RelqError, RelqResult};

/// Caller-supplied row factory: receives the column-name array and the raw
/// value array and returns a fully constructed item, bypassing
/// descriptor-driven member setting entirely.
pub type ItemFactory<T> = dyn Fn(&[String], &[Value]) -> RelqResult<T> + Send + Sync;

/// Mapping knobs, all optional.
pub struct MapOptions<'a, T> {
    /// Explicit column→member mapping; takes priority over name matching.
    pub overrides: Option<&'a HashMap<String, String>>,
    /// Per-call value converter (default: [`convert_default`]).
    pub converter: Option<&'a Converter>,
    /// Item factory bypass.
    pub factory: Option<&'a ItemFactory<T>>,
    /// Stop after this many rows; `None` is unbounded. The cursor is not
    /// drained past the limit.
    pub max_rows: Option<usize>,
}

impl<T> Default for MapOptions<'_, T> {
    fn default() -> Self {
        Self {
            overrides: None,
            converter: None,
            factory: None,
            max_rows: None,
        }
    }
}

impl<'a, T> MapOptions<'a, T> {
    /// Options that stop after the first row.
    pub fn first() -> Self {
        Self {
            max_rows: Some(1),
            ..Self::default()
        }
    }
}

/// Resolve each result column to a member slot. Explicit overrides must
/// resolve; unmatched columns without an override are skipped.
fn resolve_slots<T: Entity>(
    columns: &[String],
    overrides: Option<&HashMap<String, String>>,
) -> RelqResult<Vec<Option<&'static MemberDescriptor>>> {
    let descriptor = descriptor_of::<T>()?;
    columns
        .iter()
        .map(|column| {
            if let Some(member) = overrides.and_then(|map| map.get(column)) {
                return descriptor.require_member(member).map(Some);
            }
            let slot = descriptor.resolve_column(column);
            if slot.is_none() {
                tracing::trace!(column = %column, table = descriptor.table, "unmatched result column");
            }
            Ok(slot)
        })
        .collect()
}

fn map_one<T: Entity>(
    columns: &[String],
    slots: &[Option<&'static MemberDescriptor>],
    row: Vec<Value>,
    opts: &MapOptions<'_, T>,
) -> RelqResult<T> {
    if let Some(factory) = opts.factory {
        return factory(columns, &row);
    }

    let mut item = T::default();
    for (idx, value) in row.into_iter().enumerate() {
        let Some(member) = slots.get(idx).copied().flatten() else {
            continue;
        };
        let column = &columns[idx];
        let shown = value.to_string();
        let converted = match opts.converter {
            Some(converter) => converter(value, member.kind),
            None => convert_default(value, member.kind),
        }
        .map_err(|e| RelqError::mapping(column, member.member, &shown, e.to_string()))?;
        item.set(member.member, converted)
            .map_err(|e| RelqError::mapping(column, member.member, &shown, e.to_string()))?;
    }
    Ok(item)
}

/// Materialize entities from a cursor.
pub fn map_rows<T: Entity>(
    cursor: &mut dyn RowCursor,
    opts: &MapOptions<'_, T>,
) -> RelqResult<Vec<T>> {
    let columns = cursor.columns().to_vec();
    let slots = resolve_slots::<T>(&columns, opts.overrides)?;

    let mut out = Vec::new();
    loop {
        if opts.max_rows.is_some_and(|max| out.len() >= max) {
            break;
        }
        let Some(row) = cursor.advance()? else {
            break;
        };
        out.push(map_one(&columns, &slots, row, opts)?);
    }
    Ok(out)
}

/// Async form of [`map_rows`]; suspends only at cursor advances.
pub async fn map_rows_async<T: Entity>(
    cursor: &mut dyn AsyncRowCursor,
    opts: &MapOptions<'_, T>,
) -> RelqResult<Vec<T>> {
    let columns = cursor.columns().to_vec();
    let slots = resolve_slots::<T>(&columns, opts.overrides)?;

    let mut out = Vec::new();
    loop {
        if opts.max_rows.is_some_and(|max| out.len() >= max) {
            break;
        }
        let Some(row) = cursor.advance().await? else {
            break;
        };
        out.push(map_one(&columns, &slots, row, opts)?);
    }
    Ok(out)
}
