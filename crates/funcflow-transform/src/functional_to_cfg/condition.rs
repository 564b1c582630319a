//! Reduces a branch condition to a strict `i1`.
//!
//! Only rank-0 boolean values are handled. The general truthiness rule
//! (numeric scalars are true when nonzero, string scalars when non-empty,
//! other tensors when their leading dimension is non-empty) is not
//! implemented; such conditions are rejected.

use super::errors::{LoweringError, OpContext};
use funcflow_core::{ElementType, FuncCursor, Type, Value};

pub fn is_supported_condition(ty: &Type) -> bool {
    ty.is_bool_scalar()
        || (ty.is_tensor() && ty.element_type() == ElementType::Bool && ty.rank() == Some(0))
}

/// Type check for a condition, run before the IR is touched.
pub fn check_condition_type(ctx: &OpContext, ty: &Type) -> Result<(), LoweringError> {
    if is_supported_condition(ty) {
        Ok(())
    } else {
        Err(ctx.unsupported_condition(ty))
    }
}

pub fn lower_condition(
    cursor: &mut FuncCursor<'_>,
    ctx: &OpContext,
    value: Value,
) -> Result<Value, LoweringError> {
    let ty = cursor.body().value_type(value)?.clone();
    check_condition_type(ctx, &ty)?;

    if ty.is_bool_scalar() {
        return Ok(value);
    }

    Ok(cursor.ins().extract_element(value, Vec::new(), Type::i1())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcflow_core::{Constant, Dim, FunctionBody, InstId, InstructionKind};

    fn ctx() -> OpContext {
        OpContext::new(InstId(9), None)
    }

    #[test]
    fn test_supported_types() {
        assert!(is_supported_condition(&Type::i1()));
        assert!(is_supported_condition(&Type::scalar_tensor(ElementType::Bool)));
        assert!(!is_supported_condition(&Type::tensor(
            ElementType::Bool,
            vec![Dim::Fixed(1)]
        )));
        assert!(!is_supported_condition(&Type::unranked_tensor(ElementType::Bool)));
        assert!(!is_supported_condition(&Type::scalar_tensor(ElementType::Int(32))));
        assert!(!is_supported_condition(&Type::int(32)));
    }

    #[test]
    fn test_tensor_condition_is_extracted() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let mut cursor = FuncCursor::new(&mut body).at_bottom(entry);
        let c = cursor
            .ins()
            .constant(Constant::bool_tensor(true), Type::scalar_tensor(ElementType::Bool))
            .unwrap();

        let lowered = lower_condition(&mut cursor, &ctx(), c).unwrap();

        assert_ne!(lowered, c);
        assert_eq!(body.value_type(lowered).unwrap(), &Type::i1());
        let last = body.block(entry).unwrap().instructions.last().unwrap();
        assert!(matches!(
            &last.kind,
            InstructionKind::ExtractElement { tensor, indices }
                if *tensor == c && indices.is_empty()
        ));
    }

    #[test]
    fn test_rejection_names_the_type() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let mut cursor = FuncCursor::new(&mut body).at_bottom(entry);
        let c = cursor
            .ins()
            .constant(
                Constant::Splat(
                    Box::new(Constant::Bool(true)),
                    funcflow_core::Shape::Ranked(vec![Dim::Fixed(2)]),
                ),
                Type::tensor(ElementType::Bool, vec![Dim::Fixed(2)]),
            )
            .unwrap();

        let err = lower_condition(&mut cursor, &ctx(), c).unwrap_err();

        assert!(matches!(err, LoweringError::UnsupportedConditionType { .. }));
        assert!(err.to_string().contains("tensor<2xi1>"));
        assert_eq!(body.block(entry).unwrap().instructions.len(), 1);
    }
}
