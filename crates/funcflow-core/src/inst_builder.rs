use crate::{
    block::{BlockId, Terminator},
    cursor::FuncCursor,
    instructions::{Instruction, InstructionKind},
    types::Type,
    values::{Constant, Value, ValueDef},
    Result,
};

/// Builds one instruction or terminator at the cursor's position.
pub struct InstBuilder<'b, 'a: 'b> {
    cursor: &'b mut FuncCursor<'a>,
}

impl<'b, 'a> InstBuilder<'b, 'a> {
    pub fn new(cursor: &'b mut FuncCursor<'a>) -> Self {
        Self { cursor }
    }

    pub fn constant(self, value: Constant, ty: Type) -> Result<Value> {
        let results = self.build(InstructionKind::Constant(value), vec![ty])?;
        Ok(results[0])
    }

    pub fn call(
        self,
        callee: impl Into<String>,
        args: Vec<Value>,
        result_types: Vec<Type>,
    ) -> Result<Vec<Value>> {
        self.build(
            InstructionKind::Call {
                callee: callee.into(),
                args,
            },
            result_types,
        )
    }

    pub fn tensor_cast(self, value: Value, to: Type) -> Result<Value> {
        let results = self.build(InstructionKind::TensorCast { value }, vec![to])?;
        Ok(results[0])
    }

    pub fn extract_element(self, tensor: Value, indices: Vec<Value>, ty: Type) -> Result<Value> {
        let results = self.build(InstructionKind::ExtractElement { tensor, indices }, vec![ty])?;
        Ok(results[0])
    }

    pub fn generic(
        self,
        name: impl Into<String>,
        operands: Vec<Value>,
        result_types: Vec<Type>,
    ) -> Result<Vec<Value>> {
        self.build(
            InstructionKind::Generic {
                name: name.into(),
                operands,
            },
            result_types,
        )
    }

    pub fn if_op(
        self,
        condition: Value,
        then_branch: impl Into<String>,
        else_branch: impl Into<String>,
        args: Vec<Value>,
        result_types: Vec<Type>,
    ) -> Result<Vec<Value>> {
        self.build(
            InstructionKind::If {
                condition,
                then_branch: then_branch.into(),
                else_branch: else_branch.into(),
                args,
            },
            result_types,
        )
    }

    pub fn while_op(
        self,
        cond: impl Into<String>,
        body: impl Into<String>,
        args: Vec<Value>,
        result_types: Vec<Type>,
    ) -> Result<Vec<Value>> {
        self.build(
            InstructionKind::While {
                cond: cond.into(),
                body: body.into(),
                args,
            },
            result_types,
        )
    }

    pub fn jump(self, target: BlockId, args: Vec<Value>) -> Result<()> {
        self.cursor.set_terminator(Terminator::Jump(target, args))
    }

    pub fn branch(
        self,
        condition: Value,
        then_block: BlockId,
        then_args: Vec<Value>,
        else_block: BlockId,
        else_args: Vec<Value>,
    ) -> Result<()> {
        self.cursor.set_terminator(Terminator::Branch {
            condition,
            then_block,
            then_args,
            else_block,
            else_args,
        })
    }

    pub fn return_values(self, values: Vec<Value>) -> Result<()> {
        self.cursor.set_terminator(Terminator::Return(values))
    }

    pub fn unreachable(self) -> Result<()> {
        self.cursor.set_terminator(Terminator::Unreachable)
    }

    fn build(self, kind: InstructionKind, result_types: Vec<Type>) -> Result<Vec<Value>> {
        let body = self.cursor.body_mut();
        let id = body.next_inst_id();
        let results: Vec<Value> = result_types
            .into_iter()
            .enumerate()
            .map(|(index, ty)| {
                body.make_value(
                    ty,
                    ValueDef::InstResult {
                        inst: id,
                        index: index as u32,
                    },
                )
            })
            .collect();

        self.cursor
            .insert_inst(Instruction::new(id, kind, results.clone()))?;
        Ok(results)
    }
}
