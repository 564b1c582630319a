use super::errors::{LoweringError, OpContext};
use funcflow_core::{FuncCursor, FunctionSignature, Type, Value};
use tracing::trace;

/// Brings `value` to `formal`, inserting a `tensor_cast` at the cursor when
/// the types differ but are compatible.
pub fn coerce_value(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    site: &str,
    value: Value,
    formal: &Type,
) -> Result<Value, LoweringError> {
    let actual = cursor.body().value_type(value)?.clone();
    if &actual == formal {
        return Ok(value);
    }
    if !actual.is_cast_compatible(formal) {
        return Err(ctx.type_mismatch(site, formal, &actual));
    }
    trace!("casting {} from {} to {} for {}", value, actual, formal, site);
    Ok(cursor.ins().tensor_cast(value, formal.clone())?)
}

/// Emits a call to `callee` at the cursor, passing `args` positionally and
/// casting each one to the callee's declared parameter type where needed.
pub fn emit_call(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    callee: &FunctionSignature,
    args: &[Value],
) -> Result<Vec<Value>, LoweringError> {
    let site = format!("call to @{}", callee.name);
    if args.len() != callee.params.len() {
        return Err(ctx.arity_mismatch(site, callee.params.len(), args.len()));
    }

    let mut operands = Vec::with_capacity(args.len());
    for (arg, formal) in args.iter().zip(&callee.params) {
        operands.push(coerce_value(cursor, ctx, &site, *arg, formal)?);
    }

    Ok(cursor
        .ins()
        .call(callee.name.clone(), operands, callee.returns.clone())?)
}
