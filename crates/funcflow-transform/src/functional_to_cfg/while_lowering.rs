use super::call::emit_call;
use super::condition::{check_condition_type, lower_condition};
use super::errors::{LoweringError, OpContext};
use super::if_lowering::value_types;
use super::jump::{jump_to_block, prepare_jump_args};
use super::rewire::replace_results_with_block_params;
use funcflow_core::{
    BlockId, FuncCursor, FunctionBody, FunctionSignature, InstId, Instruction, InstructionKind,
    IrError, SourceLocation, SymbolResolver, Value,
};
use tracing::debug;

/// A functional `while` picked out of the instruction stream.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileOp {
    pub id: InstId,
    pub location: Option<SourceLocation>,
    pub cond: String,
    pub body: String,
    pub args: Vec<Value>,
    pub results: Vec<Value>,
}

impl WhileOp {
    pub fn from_inst(inst: &Instruction) -> Option<Self> {
        match &inst.kind {
            InstructionKind::While { cond, body, args } => Some(Self {
                id: inst.id,
                location: inst.location.clone(),
                cond: cond.clone(),
                body: body.clone(),
                args: args.clone(),
                results: inst.results.clone(),
            }),
            _ => None,
        }
    }
}

struct WhilePlan<'s> {
    cond_sig: &'s FunctionSignature,
    body_sig: &'s FunctionSignature,
}

/// Checks the loop's types before anything is rewritten.
///
/// Values flow init -> cond params -> body/tail params -> (body call) ->
/// cond params, and the tail params finally replace the op's results.
/// Cast compatibility is not transitive, so every pair among the operand,
/// predicate parameter, body parameter, body result and op result types is
/// checked, not only the pairs joined by an edge.
fn plan<'s>(
    body: &FunctionBody,
    ctx: &OpContext,
    op: &WhileOp,
    symbols: &'s dyn SymbolResolver,
) -> Result<WhilePlan<'s>, LoweringError> {
    let cond_sig = symbols
        .resolve(&op.cond)
        .ok_or_else(|| ctx.unresolved(&op.cond))?;
    let body_sig = symbols
        .resolve(&op.body)
        .ok_or_else(|| ctx.unresolved(&op.body))?;

    let cond_site = format!("results of @{}", cond_sig.name);
    match cond_sig.returns.as_slice() {
        [flag] => check_condition_type(ctx, flag)?,
        other => return Err(ctx.arity_mismatch(cond_site, 1, other.len())),
    }

    let init_types = value_types(body, &op.args)?;
    let result_types = value_types(body, &op.results)?;

    let entry_cond = format!("entry into @{}", cond_sig.name);
    let entry_body = format!("entry into @{}", body_sig.name);
    let carried = format!("values carried into @{}", body_sig.name);
    let body_results = format!("results of @{}", body_sig.name);

    ctx.check_coercible("loop results", &result_types, &init_types)?;
    ctx.check_coercible(&entry_cond, &cond_sig.params, &init_types)?;
    ctx.check_coercible(&entry_body, &body_sig.params, &init_types)?;
    ctx.check_coercible(&carried, &body_sig.params, &cond_sig.params)?;
    ctx.check_coercible(&body_results, &init_types, &body_sig.returns)?;
    ctx.check_coercible(&body_results, &cond_sig.params, &body_sig.returns)?;
    ctx.check_coercible(&body_results, &body_sig.params, &body_sig.returns)?;
    ctx.check_coercible("loop results", &result_types, &cond_sig.params)?;
    ctx.check_coercible("loop results", &result_types, &body_sig.params)?;
    ctx.check_coercible("loop results", &result_types, &body_sig.returns)?;

    Ok(WhilePlan { cond_sig, body_sig })
}

/// Replaces a functional `while` with a loop of blocks.
///
/// The block holding the op is split into a head and a tail at the op. Two
/// blocks are placed between them: a condition block that calls the
/// predicate and branches, and a body block that calls the body function
/// and jumps back. Condition parameters take the predicate's parameter
/// types; body and tail parameters take the body function's. Layout
/// afterwards is head, cond, body, tail. Returns the tail block, where
/// scanning should resume.
pub fn lower_while(
    body: &mut FunctionBody,
    op: &WhileOp,
    symbols: &dyn SymbolResolver,
) -> Result<BlockId, LoweringError> {
    let ctx = OpContext::new(op.id, op.location.clone());
    let plan = plan(body, &ctx, op, symbols)?;

    let (head, index) = body
        .find_inst(op.id)
        .ok_or(IrError::InstructionNotFound(op.id))?;
    let tail = body.split_block(head, index)?;
    let cond_block = body.create_block_before(tail)?;
    let body_block = body.create_block_before(tail)?;

    let mut cond_params = Vec::with_capacity(plan.cond_sig.params.len());
    for ty in &plan.cond_sig.params {
        cond_params.push(body.add_block_param(cond_block, ty.clone())?);
    }
    let mut body_params = Vec::with_capacity(plan.body_sig.params.len());
    for ty in &plan.body_sig.params {
        body_params.push(body.add_block_param(body_block, ty.clone())?);
        body.add_block_param(tail, ty.clone())?;
    }

    let mut cursor = FuncCursor::new(body)
        .with_location(op.location.clone())
        .at_bottom(head);
    jump_to_block(&mut cursor, &ctx, cond_block, &op.args)?;

    cursor.goto_bottom(cond_block);
    let flag = emit_call(&mut cursor, &ctx, plan.cond_sig, &cond_params)?;
    let condition = lower_condition(&mut cursor, &ctx, flag[0])?;
    // tail params mirror the body params, so one argument list serves both edges
    let carried = prepare_jump_args(&mut cursor, &ctx, body_block, &cond_params)?;
    cursor
        .ins()
        .branch(condition, body_block, carried.clone(), tail, carried)?;

    cursor.goto_bottom(body_block);
    let next = emit_call(&mut cursor, &ctx, plan.body_sig, &body_params)?;
    jump_to_block(&mut cursor, &ctx, cond_block, &next)?;

    cursor.goto_top(tail);
    replace_results_with_block_params(&mut cursor, &ctx, &op.results, tail)?;

    cursor.body_mut().erase_inst(op.id)?;

    debug!(
        "lowered {} into {} -> {} <-> {} -> {}",
        op.id, head, cond_block, body_block, tail
    );
    Ok(tail)
}
