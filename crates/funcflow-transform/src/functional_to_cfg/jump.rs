use super::call::coerce_value;
use super::errors::{LoweringError, OpContext};
use funcflow_core::{BlockId, FuncCursor, IrError, Value};

/// Coerces `values` to the parameter types of `target`, inserting casts at
/// the cursor, and returns the argument list for an edge into `target`.
pub fn prepare_jump_args(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    target: BlockId,
    values: &[Value],
) -> Result<Vec<Value>, LoweringError> {
    let param_types = cursor.body().block(target)?.param_types();
    if values.len() != param_types.len() {
        return Err(IrError::BuilderError(format!(
            "{}: {} takes {} arguments, got {}",
            ctx.op,
            target,
            param_types.len(),
            values.len()
        ))
        .into());
    }

    let site = format!("edge to {}", target);

    values
        .iter()
        .zip(&param_types)
        .map(|(value, formal)| coerce_value(cursor, ctx, &site, *value, formal))
        .collect()
}

/// Terminates the cursor's block with a jump to `target` carrying `values`.
pub fn jump_to_block(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    target: BlockId,
    values: &[Value],
) -> Result<(), LoweringError> {
    let args = prepare_jump_args(cursor, ctx, target, values)?;
    cursor.ins().jump(target, args)?;
    Ok(())
}
