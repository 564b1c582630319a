use crate::{
    block::{BasicBlock, BlockId, Terminator},
    function::{Function, FunctionBody},
    instructions::{Instruction, InstructionKind},
    module::Module,
    types::format_type_list,
    values::Value,
};
use std::fmt::Write;

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();

    writeln!(&mut output, "; module {}", module.name).unwrap();

    for function in module.functions.values() {
        writeln!(&mut output).unwrap();
        write!(&mut output, "{}", format_function(function)).unwrap();
    }

    output
}

pub fn format_function(function: &Function) -> String {
    let mut output = String::new();
    let signature = &function.signature;

    writeln!(
        &mut output,
        "func @{}({}) -> ({}) {{",
        signature.name,
        format_type_list(&signature.params),
        format_type_list(&signature.returns)
    )
    .unwrap();

    for block in function.body.blocks.values() {
        write!(&mut output, "{}", format_block(&function.body, block)).unwrap();
    }

    writeln!(&mut output, "}}").unwrap();

    output
}

pub fn format_block(body: &FunctionBody, block: &BasicBlock) -> String {
    let mut output = String::new();

    write!(&mut output, "{}", block.id).unwrap();
    if !block.params.is_empty() {
        let params = block
            .params
            .iter()
            .map(|p| format!("{}: {}", p.value, p.param_type))
            .collect::<Vec<_>>()
            .join(", ");
        write!(&mut output, "({})", params).unwrap();
    }
    writeln!(&mut output, ":").unwrap();

    for inst in &block.instructions {
        writeln!(&mut output, "    {}", format_instruction(body, inst)).unwrap();
    }

    writeln!(&mut output, "    {}", format_terminator(&block.terminator)).unwrap();

    output
}

pub fn format_instruction(body: &FunctionBody, inst: &Instruction) -> String {
    let mut line = String::new();

    if !inst.results.is_empty() {
        write!(&mut line, "{} = ", format_values(&inst.results)).unwrap();
    }

    let result_types = format_result_types(body, &inst.results);
    match &inst.kind {
        InstructionKind::Constant(constant) => {
            write!(&mut line, "constant {} : {}", constant, result_types).unwrap();
        }
        InstructionKind::Call { callee, args } => {
            write!(
                &mut line,
                "call @{}({}) : ({})",
                callee,
                format_values(args),
                result_types
            )
            .unwrap();
        }
        InstructionKind::TensorCast { value } => {
            write!(
                &mut line,
                "tensor_cast {} : {} to {}",
                value,
                type_of(body, *value),
                result_types
            )
            .unwrap();
        }
        InstructionKind::ExtractElement { tensor, indices } => {
            write!(
                &mut line,
                "extract_element {}[{}] : {}",
                tensor,
                format_values(indices),
                type_of(body, *tensor)
            )
            .unwrap();
        }
        InstructionKind::If {
            condition,
            then_branch,
            else_branch,
            args,
        } => {
            write!(
                &mut line,
                "if {} then @{} else @{}({}) : ({})",
                condition,
                then_branch,
                else_branch,
                format_values(args),
                result_types
            )
            .unwrap();
        }
        InstructionKind::While { cond, body: loop_body, args } => {
            write!(
                &mut line,
                "while cond @{} body @{}({}) : ({})",
                cond,
                loop_body,
                format_values(args),
                result_types
            )
            .unwrap();
        }
        InstructionKind::Generic { name, operands } => {
            write!(
                &mut line,
                "\"{}\"({}) : ({})",
                name,
                format_values(operands),
                result_types
            )
            .unwrap();
        }
    }

    if let Some(loc) = &inst.location {
        write!(&mut line, "  ; {}", loc).unwrap();
    }

    line
}

pub fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Jump(target, args) => format!("jump {}", format_target(*target, args)),
        Terminator::Branch {
            condition,
            then_block,
            then_args,
            else_block,
            else_args,
        } => format!(
            "branch {}, {}, {}",
            condition,
            format_target(*then_block, then_args),
            format_target(*else_block, else_args)
        ),
        Terminator::Return(values) if values.is_empty() => "return".to_string(),
        Terminator::Return(values) => format!("return {}", format_values(values)),
        Terminator::Unreachable => "unreachable".to_string(),
        Terminator::Invalid => "<unterminated>".to_string(),
    }
}

fn format_target(block: BlockId, args: &[Value]) -> String {
    if args.is_empty() {
        block.to_string()
    } else {
        format!("{}({})", block, format_values(args))
    }
}

fn format_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_result_types(body: &FunctionBody, results: &[Value]) -> String {
    results
        .iter()
        .map(|v| type_of(body, *v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn type_of(body: &FunctionBody, value: Value) -> String {
    body.value_type(value)
        .map(|t| t.to_string())
        .unwrap_or_else(|_| "<?>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FuncCursor;
    use crate::function::FunctionSignature;
    use crate::types::{ElementType, Type};
    use crate::values::Constant;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_function_with_if() {
        let mut func = Function::new(FunctionSignature::new(
            "main",
            vec![Type::int(32)],
            vec![Type::int(32)],
        ));
        let entry = func.entry_block();
        let x = func.params()[0];

        let mut cursor = FuncCursor::new(&mut func.body).at_bottom(entry);
        let c = cursor
            .ins()
            .constant(Constant::bool_tensor(true), Type::scalar_tensor(ElementType::Bool))
            .unwrap();
        let r = cursor
            .ins()
            .if_op(c, "addOne", "subOne", vec![x], vec![Type::int(32)])
            .unwrap();
        cursor.ins().return_values(r).unwrap();

        let expected = "\
func @main(i32) -> (i32) {
block0(%0: i32):
    %1 = constant dense<true> : tensor<i1>
    %2 = if %1 then @addOne else @subOne(%0) : (i32)
    return %2
}
";
        assert_eq!(format_function(&func), expected);
    }

    #[test]
    fn test_format_terminators() {
        assert_eq!(
            format_terminator(&Terminator::Branch {
                condition: Value(4),
                then_block: BlockId(1),
                then_args: vec![Value(2)],
                else_block: BlockId(3),
                else_args: vec![],
            }),
            "branch %4, block1(%2), block3"
        );
        assert_eq!(format_terminator(&Terminator::Return(vec![])), "return");
        assert_eq!(
            format_terminator(&Terminator::Jump(BlockId(2), vec![Value(0), Value(1)])),
            "jump block2(%0, %1)"
        );
    }
}
