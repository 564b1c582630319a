use crate::block::Terminator;
use crate::function::Function;
use crate::types::{format_type_list, Type};
use crate::values::{Value, ValueDef};
use crate::{IrError, Result};
use std::collections::HashSet;

/// Checks the structural invariants every function must satisfy:
/// each block is terminated, branch targets exist, every predecessor passes
/// exactly the argument types its target declares, and every operand refers
/// to a value defined somewhere in the function.
pub fn verify_function(function: &Function) -> Result<()> {
    let body = &function.body;
    let name = function.name();
    let mut defined: HashSet<Value> = HashSet::new();

    for block in body.blocks.values() {
        for (index, param) in block.params.iter().enumerate() {
            let data = body.value_data(param.value)?;
            let expected_def = ValueDef::BlockParam {
                block: block.id,
                index: index as u32,
            };
            if data.def != expected_def || data.ty != param.param_type {
                return Err(fail(name, format!(
                    "parameter {} of {} disagrees with the value table",
                    param.value, block.id
                )));
            }
            defined.insert(param.value);
        }
        for inst in &block.instructions {
            for (index, result) in inst.results.iter().enumerate() {
                let data = body.value_data(*result)?;
                let expected_def = ValueDef::InstResult {
                    inst: inst.id,
                    index: index as u32,
                };
                if data.def != expected_def {
                    return Err(fail(name, format!(
                        "result {} of {} disagrees with the value table",
                        result, inst.id
                    )));
                }
                if !defined.insert(*result) {
                    return Err(fail(name, format!("{} is defined more than once", result)));
                }
            }
        }
    }

    for block in body.blocks.values() {
        for inst in &block.instructions {
            for operand in inst.operands() {
                if !defined.contains(&operand) {
                    return Err(fail(name, format!(
                        "{} in {} uses undefined value {}",
                        inst.kind.mnemonic(),
                        block.id,
                        operand
                    )));
                }
            }
        }

        if !block.is_terminated() {
            return Err(fail(name, format!("{} has no terminator", block.id)));
        }

        for operand in block.terminator.operands() {
            if !defined.contains(&operand) {
                return Err(fail(name, format!(
                    "terminator of {} uses undefined value {}",
                    block.id, operand
                )));
            }
        }

        if let Terminator::Branch { condition, .. } = &block.terminator {
            let ty = body.value_type(*condition)?;
            if !ty.is_bool_scalar() {
                return Err(fail(name, format!(
                    "branch condition {} in {} has type {}, expected i1",
                    condition, block.id, ty
                )));
            }
        }

        for (target, args) in block.terminator.edges() {
            let target_block = body.get_block(target).ok_or_else(|| {
                fail(name, format!("{} branches to missing {}", block.id, target))
            })?;
            let arg_types = args
                .iter()
                .map(|v| body.value_type(*v).cloned())
                .collect::<Result<Vec<Type>>>()?;
            let param_types = target_block.param_types();
            if arg_types != param_types {
                return Err(fail(name, format!(
                    "{} passes ({}) to {} which expects ({})",
                    block.id,
                    format_type_list(&arg_types),
                    target,
                    format_type_list(&param_types)
                )));
            }
        }
    }

    Ok(())
}

fn fail(function: &str, message: String) -> IrError {
    IrError::VerifierError(format!("in @{}: {}", function, message))
}
