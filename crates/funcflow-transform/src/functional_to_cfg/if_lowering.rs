use super::call::emit_call;
use super::condition::{check_condition_type, lower_condition};
use super::errors::{LoweringError, OpContext};
use super::jump::jump_to_block;
use super::rewire::replace_results_with_block_params;
use funcflow_core::{
    BlockId, FuncCursor, FunctionBody, FunctionSignature, InstId, Instruction, InstructionKind,
    IrError, SourceLocation, SymbolResolver, Type, Value,
};
use tracing::debug;

/// A functional `if` picked out of the instruction stream.
#[derive(Debug, Clone, PartialEq)]
pub struct IfOp {
    pub id: InstId,
    pub location: Option<SourceLocation>,
    pub condition: Value,
    pub then_branch: String,
    pub else_branch: String,
    pub args: Vec<Value>,
    pub results: Vec<Value>,
}

impl IfOp {
    pub fn from_inst(inst: &Instruction) -> Option<Self> {
        match &inst.kind {
            InstructionKind::If {
                condition,
                then_branch,
                else_branch,
                args,
            } => Some(Self {
                id: inst.id,
                location: inst.location.clone(),
                condition: *condition,
                then_branch: then_branch.clone(),
                else_branch: else_branch.clone(),
                args: args.clone(),
                results: inst.results.clone(),
            }),
            _ => None,
        }
    }
}

struct IfPlan<'s> {
    then_sig: &'s FunctionSignature,
    else_sig: &'s FunctionSignature,
    result_types: Vec<Type>,
}

/// Every check that can fail runs here, against the untouched IR.
fn plan<'s>(
    body: &FunctionBody,
    ctx: &OpContext,
    op: &IfOp,
    symbols: &'s dyn SymbolResolver,
) -> Result<IfPlan<'s>, LoweringError> {
    let then_sig = symbols
        .resolve(&op.then_branch)
        .ok_or_else(|| ctx.unresolved(&op.then_branch))?;
    let else_sig = symbols
        .resolve(&op.else_branch)
        .ok_or_else(|| ctx.unresolved(&op.else_branch))?;

    check_condition_type(ctx, body.value_type(op.condition)?)?;

    let arg_types = value_types(body, &op.args)?;
    let result_types = value_types(body, &op.results)?;

    for sig in [then_sig, else_sig] {
        ctx.check_coercible(&format!("call to @{}", sig.name), &sig.params, &arg_types)?;
        ctx.check_coercible(
            &format!("results of @{}", sig.name),
            &result_types,
            &sig.returns,
        )?;
    }

    Ok(IfPlan {
        then_sig,
        else_sig,
        result_types,
    })
}

/// Replaces a functional `if` with a conditional branch into two blocks that
/// call the branch functions and rejoin at a merge block.
///
/// The block holding the op is split at the op. The merge block takes the
/// op's results as parameters and receives everything that followed it.
/// Layout afterwards is predecessor, then, else, merge. Returns the merge
/// block, where scanning should resume.
pub fn lower_if(
    body: &mut FunctionBody,
    op: &IfOp,
    symbols: &dyn SymbolResolver,
) -> Result<BlockId, LoweringError> {
    let ctx = OpContext::new(op.id, op.location.clone());
    let plan = plan(body, &ctx, op, symbols)?;

    let (pred, index) = body
        .find_inst(op.id)
        .ok_or(IrError::InstructionNotFound(op.id))?;
    let merge = body.split_block(pred, index)?;
    for ty in &plan.result_types {
        body.add_block_param(merge, ty.clone())?;
    }

    let mut cursor = FuncCursor::new(body)
        .with_location(op.location.clone())
        .at_top(merge);
    replace_results_with_block_params(&mut cursor, &ctx, &op.results, merge)?;

    let then_block = cursor.body_mut().create_block_before(merge)?;
    cursor.goto_bottom(then_block);
    let then_results = emit_call(&mut cursor, &ctx, plan.then_sig, &op.args)?;
    jump_to_block(&mut cursor, &ctx, merge, &then_results)?;

    let else_block = cursor.body_mut().create_block_before(merge)?;
    cursor.goto_bottom(else_block);
    let else_results = emit_call(&mut cursor, &ctx, plan.else_sig, &op.args)?;
    jump_to_block(&mut cursor, &ctx, merge, &else_results)?;

    cursor.goto_bottom(pred);
    let condition = lower_condition(&mut cursor, &ctx, op.condition)?;
    cursor
        .ins()
        .branch(condition, then_block, Vec::new(), else_block, Vec::new())?;

    cursor.body_mut().erase_inst(op.id)?;

    debug!(
        "lowered {} into {} -> {{{}, {}}} -> {}",
        op.id, pred, then_block, else_block, merge
    );
    Ok(merge)
}

pub(super) fn value_types(body: &FunctionBody, values: &[Value]) -> Result<Vec<Type>, IrError> {
    values
        .iter()
        .map(|v| body.value_type(*v).cloned())
        .collect()
}
