use super::call::coerce_value;
use super::errors::{LoweringError, OpContext};
use funcflow_core::{BlockId, FuncCursor, Value};

/// Replaces every use of `results` with the matching parameter of `block`.
///
/// When a parameter's type differs from the result it stands in for, a cast
/// back to the result type is inserted at the cursor and that cast is used
/// instead. Returns the number of operands rewritten.
pub fn replace_results_with_block_params(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    results: &[Value],
    block: BlockId,
) -> Result<usize, LoweringError> {
    let params = cursor.body().block(block)?.param_values();
    if params.len() != results.len() {
        return Err(ctx.arity_mismatch(
            format!("results carried by {}", block),
            results.len(),
            params.len(),
        ));
    }

    let site = format!("results carried by {}", block);
    let mut rewritten = 0;
    for (result, param) in results.iter().zip(params) {
        let result_ty = cursor.body().value_type(*result)?.clone();
        let replacement = coerce_value(cursor, ctx, &site, param, &result_ty)?;
        rewritten += cursor.body_mut().replace_all_uses(*result, replacement);
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcflow_core::{
        Dim, ElementType, Function, FunctionSignature, InstId, InstructionKind, Terminator, Type,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_uses_move_to_block_param() {
        let mut func = Function::new(FunctionSignature::new("f", vec![], vec![Type::int(32)]));
        let entry = func.entry_block();
        let mut cursor = FuncCursor::new(&mut func.body).at_bottom(entry);
        let produced = cursor.ins().generic("produce", vec![], vec![Type::int(32)]).unwrap()[0];
        cursor.ins().return_values(vec![produced]).unwrap();

        let merge = func.body.create_block();
        let param = func.body.add_block_param(merge, Type::int(32)).unwrap();

        let ctx = OpContext::new(InstId(0), None);
        let mut cursor = FuncCursor::new(&mut func.body).at_top(merge);
        let rewritten =
            replace_results_with_block_params(&mut cursor, &ctx, &[produced], merge).unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(
            func.body.block(entry).unwrap().terminator,
            Terminator::Return(vec![param])
        );
    }

    #[test]
    fn test_differently_typed_param_is_cast_back() {
        let fixed = Type::tensor(ElementType::Float(32), vec![Dim::Fixed(2)]);
        let dynamic = Type::tensor(ElementType::Float(32), vec![Dim::Dynamic]);
        let mut func = Function::new(FunctionSignature::new("f", vec![], vec![fixed.clone()]));
        let entry = func.entry_block();
        let merge = func.body.create_block();
        let param = func.body.add_block_param(merge, dynamic).unwrap();

        let mut cursor = FuncCursor::new(&mut func.body).at_bottom(entry);
        let produced = cursor.ins().generic("produce", vec![], vec![fixed.clone()]).unwrap()[0];
        cursor.goto_bottom(merge);
        cursor.ins().return_values(vec![produced]).unwrap();

        let ctx = OpContext::new(InstId(0), None);
        let mut cursor = FuncCursor::new(&mut func.body).at_top(merge);
        replace_results_with_block_params(&mut cursor, &ctx, &[produced], merge).unwrap();

        let block = func.body.block(merge).unwrap();
        assert_eq!(block.instructions[0].kind, InstructionKind::TensorCast { value: param });
        let cast = block.instructions[0].results[0];
        assert_eq!(func.body.value_type(cast).unwrap(), &fixed);
        assert_eq!(block.terminator, Terminator::Return(vec![cast]));
    }
}
