//! Command planning shared by the sync and async engines.
//!
//! Every operation compiles here into a [`SqlCommand`]; the session types
//! only differ in how they execute the plans.

use crate::ast::{AggregateFunc, Expr};
use crate::entity::{Entity, EntityDescriptor, MemberDescriptor, descriptor_of};
use crate::error::{RelqError, RelqResult};
use crate::session::{Query, Scope, SessionConfig};
use crate::transpiler::{
    ParamContext, SqlCommand, dml, translate, translate_order_by, translate_projection,
};

fn command(text: String, ctx: ParamContext<'_>, config: &SessionConfig) -> SqlCommand {
    SqlCommand {
        text,
        params: ctx.into_params(),
        timeout: config.timeout,
    }
}

/// The member set an insert/update writes: an explicit list, or every
/// non-key member. Entities that are all key (association tables) fall
/// back to the full member list for inserts.
fn write_members<'d>(
    descriptor: &'d EntityDescriptor,
    columns: Option<&[&str]>,
    allow_all_keys: bool,
) -> RelqResult<Vec<&'d MemberDescriptor>> {
    let members: Vec<&MemberDescriptor> = match columns {
        Some(cols) => cols
            .iter()
            .map(|name| descriptor.require_member(name))
            .collect::<RelqResult<_>>()?,
        None => {
            let non_keys: Vec<_> = descriptor.non_keys().collect();
            if non_keys.is_empty() && allow_all_keys {
                descriptor.members.iter().collect()
            } else {
                non_keys
            }
        }
    };
    if members.is_empty() {
        return Err(RelqError::InvalidValue(format!(
            "no writable columns for entity '{}'",
            descriptor.table
        )));
    }
    Ok(members)
}

/// WHERE fragment matching the entity's key values.
fn key_filter<T: Entity>(
    entity: &T,
    descriptor: &EntityDescriptor,
    ctx: &mut ParamContext<'_>,
) -> RelqResult<String> {
    let keys = descriptor.require_keys()?;
    let parts: Vec<String> = keys
        .iter()
        .map(|key| -> RelqResult<String> {
            let column = ctx.dialect().quote_identifier(key.column);
            let placeholder = ctx.push(entity.get(key.member)?);
            Ok(format!("{column} = {placeholder}"))
        })
        .collect::<RelqResult<_>>()?;
    Ok(parts.join(" AND "))
}

fn set_assignments<T: Entity>(
    entity: &T,
    members: &[&MemberDescriptor],
    ctx: &mut ParamContext<'_>,
) -> RelqResult<Vec<String>> {
    members
        .iter()
        .map(|m| -> RelqResult<String> {
            let column = ctx.dialect().quote_identifier(m.column);
            let placeholder = ctx.push(entity.get(m.member)?);
            Ok(format!("{column} = {placeholder}"))
        })
        .collect()
}

pub(crate) fn plan_insert<T: Entity>(
    entity: &T,
    columns: Option<&[&str]>,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;
    let members = write_members(descriptor, columns, true)?;

    let mut ctx = ParamContext::new(&config.dialect);
    let mut cols = Vec::with_capacity(members.len());
    let mut placeholders = Vec::with_capacity(members.len());
    for m in &members {
        cols.push(config.dialect.quote_identifier(m.column));
        placeholders.push(ctx.push(entity.get(m.member)?));
    }

    let text = dml::build_insert(descriptor.table, &cols, &placeholders, &config.dialect);
    Ok(command(text, ctx, config))
}

pub(crate) fn plan_update_by_key<T: Entity>(
    entity: &T,
    columns: Option<&[&str]>,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;
    let members = write_members(descriptor, columns, false)?;

    let mut ctx = ParamContext::new(&config.dialect);
    let assignments = set_assignments(entity, &members, &mut ctx)?;
    let where_sql = key_filter(entity, descriptor, &mut ctx)?;

    let text = dml::build_update(
        descriptor.table,
        &assignments,
        Some(&where_sql),
        &config.dialect,
    );
    Ok(command(text, ctx, config))
}

pub(crate) fn plan_update_where<T: Entity>(
    entity: &T,
    scope: &Scope,
    columns: Option<&[&str]>,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;
    let members = write_members(descriptor, columns, false)?;

    let mut ctx = ParamContext::new(&config.dialect);
    let assignments = set_assignments(entity, &members, &mut ctx)?;
    let where_sql = match scope {
        Scope::Rows(expr) => Some(translate(expr, descriptor, &mut ctx)?),
        Scope::AllRows => None,
    };

    let text = dml::build_update(
        descriptor.table,
        &assignments,
        where_sql.as_deref(),
        &config.dialect,
    );
    Ok(command(text, ctx, config))
}

pub(crate) fn plan_delete_by_key<T: Entity>(
    entity: &T,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;
    let mut ctx = ParamContext::new(&config.dialect);
    let where_sql = key_filter(entity, descriptor, &mut ctx)?;

    let text = dml::build_delete(descriptor.table, Some(&where_sql), &config.dialect);
    Ok(command(text, ctx, config))
}

pub(crate) fn plan_delete_where<T: Entity>(
    scope: &Scope,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;
    let mut ctx = ParamContext::new(&config.dialect);
    let where_sql = match scope {
        Scope::Rows(expr) => Some(translate(expr, descriptor, &mut ctx)?),
        Scope::AllRows => None,
    };

    let text = dml::build_delete(descriptor.table, where_sql.as_deref(), &config.dialect);
    Ok(command(text, ctx, config))
}

pub(crate) fn plan_select<T: Entity>(
    query: &Query,
    config: &SessionConfig,
) -> RelqResult<SqlCommand> {
    let descriptor = descriptor_of::<T>()?;

    let columns = match &query.columns {
        Some(members) => translate_projection(members, descriptor, &config.dialect)?,
        None => descriptor
            .members
            .iter()
            .map(|m| config.dialect.quote_identifier(m.column))
            .collect(),
    };

    let mut ctx = ParamContext::new(&config.dialect);
    let where_sql = query
        .filter
        .as_ref()
        .map(|f| translate(f, descriptor, &mut ctx))
        .transpose()?;
    let order_sql = if query.order.is_empty() {
        None
    } else {
        Some(translate_order_by(&query.order, descriptor, &config.dialect)?)
    };

    let text = dml::build_select(
        descriptor.table,
        &columns,
        where_sql.as_deref(),
        order_sql.as_deref(),
        query.limit,
        query.offset,
        &config.dialect,
    );
    Ok(command(text, ctx, config))
}

/// Aggregate plan: one SELECT carrying every `func(column)` call, plus the
/// result labels in call order.
pub(crate) fn plan_aggregate<T: Entity>(
    calls: &[(AggregateFunc, Option<&str>)],
    filter: Option<&Expr>,
    config: &SessionConfig,
) -> RelqResult<(SqlCommand, Vec<String>)> {
    let descriptor = descriptor_of::<T>()?;

    let mut columns = Vec::with_capacity(calls.len());
    let mut labels = Vec::with_capacity(calls.len());
    for (func, selector) in calls {
        match selector {
            Some(name) => {
                let member = descriptor.require_member(name)?;
                columns.push(format!(
                    "{}({})",
                    func,
                    config.dialect.quote_identifier(member.column)
                ));
                labels.push(member.column.to_string());
            }
            None => {
                columns.push(format!("{func}(*)"));
                labels.push("*".to_string());
            }
        }
    }

    let mut ctx = ParamContext::new(&config.dialect);
    let where_sql = filter
        .map(|f| translate(f, descriptor, &mut ctx))
        .transpose()?;

    let text = dml::build_select(
        descriptor.table,
        &columns,
        where_sql.as_deref(),
        None,
        None,
        None,
        &config.dialect,
    );
    Ok((command(text, ctx, config), labels))
}
