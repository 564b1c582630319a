use crate::block::{BasicBlock, BlockId, BlockParam, Terminator};
use crate::instructions::{InstId, Instruction};
use crate::types::{format_type_list, Type};
use crate::values::{Value, ValueData, ValueDef};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub signature: FunctionSignature,
    pub body: FunctionBody,
}

impl Function {
    /// Creates a function whose entry block takes the signature's parameters.
    pub fn new(signature: FunctionSignature) -> Self {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        for ty in &signature.params {
            // the entry block was just created, so this cannot fail
            let _ = body.add_block_param(entry, ty.clone());
        }
        Self { signature, body }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block()
    }

    pub fn params(&self) -> Vec<Value> {
        self.body
            .get_block(self.body.entry_block())
            .map(|b| b.param_values())
            .unwrap_or_default()
    }

    pub fn has_structured_ops(&self) -> bool {
        self.body
            .blocks
            .values()
            .flat_map(|block| &block.instructions)
            .any(|inst| inst.is_structured())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, params: Vec<Type>, returns: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }
}

impl std::fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "@{}({}) -> ({})",
            self.name,
            format_type_list(&self.params),
            format_type_list(&self.returns)
        )
    }
}

/// Blocks in layout order plus the table every value handle points into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    pub values: Vec<ValueData>,
    next_block_id: u32,
    next_inst_id: u32,
}

impl FunctionBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            entry_block,
            blocks,
            values: Vec::new(),
            next_block_id: 1,
            next_inst_id: 0,
        }
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn block(&self, id: BlockId) -> Result<&BasicBlock> {
        self.blocks.get(&id).ok_or(IrError::BlockNotFound(id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut BasicBlock> {
        self.blocks.get_mut(&id).ok_or(IrError::BlockNotFound(id))
    }

    pub fn layout_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.get_index_of(&id)
    }

    pub fn block_at(&self, index: usize) -> Option<BlockId> {
        self.blocks.get_index(index).map(|(id, _)| *id)
    }

    pub fn block_order(&self) -> Vec<BlockId> {
        self.blocks.keys().copied().collect()
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = self.fresh_block_id();
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    /// Creates an empty block placed immediately before `anchor` in layout order.
    pub fn create_block_before(&mut self, anchor: BlockId) -> Result<BlockId> {
        let index = self
            .layout_index(anchor)
            .ok_or(IrError::BlockNotFound(anchor))?;
        let id = self.fresh_block_id();
        self.blocks.shift_insert(index, id, BasicBlock::new(id));
        Ok(id)
    }

    pub fn create_block_after(&mut self, anchor: BlockId) -> Result<BlockId> {
        let index = self
            .layout_index(anchor)
            .ok_or(IrError::BlockNotFound(anchor))?;
        let id = self.fresh_block_id();
        self.blocks.shift_insert(index + 1, id, BasicBlock::new(id));
        Ok(id)
    }

    /// Moves the instructions from `at` onward, together with the terminator,
    /// into a new block placed right after `block`. The original block is left
    /// unterminated.
    pub fn split_block(&mut self, block: BlockId, at: usize) -> Result<BlockId> {
        let len = self.block(block)?.instructions.len();
        if at > len {
            return Err(IrError::BuilderError(format!(
                "cannot split {} at {}: block has {} instructions",
                block, at, len
            )));
        }

        let new_block = self.create_block_after(block)?;
        let old = self.block_mut(block)?;
        let tail = old.instructions.split_off(at);
        let terminator = std::mem::replace(&mut old.terminator, Terminator::Invalid);

        let new = self.block_mut(new_block)?;
        new.instructions = tail;
        new.terminator = terminator;
        Ok(new_block)
    }

    pub fn add_block_param(&mut self, block: BlockId, ty: Type) -> Result<Value> {
        let index = self.block(block)?.params.len() as u32;
        let value = self.make_value(ty.clone(), ValueDef::BlockParam { block, index });
        self.block_mut(block)?.params.push(BlockParam::new(value, ty));
        Ok(value)
    }

    pub fn make_value(&mut self, ty: Type, def: ValueDef) -> Value {
        let value = Value(self.values.len() as u32);
        self.values.push(ValueData { ty, def });
        value
    }

    pub fn next_inst_id(&mut self) -> InstId {
        let id = InstId(self.next_inst_id);
        self.next_inst_id += 1;
        id
    }

    pub fn value_data(&self, value: Value) -> Result<&ValueData> {
        self.values
            .get(value.0 as usize)
            .ok_or(IrError::ValueNotFound(value))
    }

    pub fn value_type(&self, value: Value) -> Result<&Type> {
        self.value_data(value).map(|data| &data.ty)
    }

    pub fn find_inst(&self, inst: InstId) -> Option<(BlockId, usize)> {
        self.blocks.iter().find_map(|(id, block)| {
            block.position_of(inst).map(|index| (*id, index))
        })
    }

    pub fn inst(&self, inst: InstId) -> Result<&Instruction> {
        let (block, index) = self
            .find_inst(inst)
            .ok_or(IrError::InstructionNotFound(inst))?;
        Ok(&self.block(block)?.instructions[index])
    }

    /// Removes an instruction. Its results must already be unused.
    pub fn erase_inst(&mut self, inst: InstId) -> Result<Instruction> {
        let (block, index) = self
            .find_inst(inst)
            .ok_or(IrError::InstructionNotFound(inst))?;
        for result in &self.block(block)?.instructions[index].results {
            let uses = self.uses_of(*result);
            if !uses.is_empty() {
                return Err(IrError::BuilderError(format!(
                    "cannot erase {}: {} still has {} use(s)",
                    inst,
                    result,
                    uses.len()
                )));
            }
        }
        Ok(self.block_mut(block)?.instructions.remove(index))
    }

    /// Redirects every operand equal to `old`, in instructions and
    /// terminators alike, to `new`.
    pub fn replace_all_uses(&mut self, old: Value, new: Value) -> usize {
        let mut replaced = 0;
        for block in self.blocks.values_mut() {
            let inst_operands = block
                .instructions
                .iter_mut()
                .flat_map(|inst| inst.operands_mut());
            for operand in inst_operands.chain(block.terminator.operands_mut()) {
                if *operand == old {
                    *operand = new;
                    replaced += 1;
                }
            }
        }
        replaced
    }

    pub fn uses_of(&self, value: Value) -> Vec<Use> {
        let mut uses = Vec::new();
        for (block_id, block) in &self.blocks {
            for inst in &block.instructions {
                if inst.uses(value) {
                    uses.push(Use::Instruction(inst.id));
                }
            }
            if block.terminator.operands().contains(&value) {
                uses.push(Use::Terminator(*block_id));
            }
        }
        uses
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(|b| b.instructions.len()).sum()
    }

    fn fresh_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Use {
    Instruction(InstId),
    Terminator(BlockId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::InstructionKind;

    fn generic(body: &mut FunctionBody, name: &str, operands: Vec<Value>) -> Instruction {
        let id = body.next_inst_id();
        let result = body.make_value(Type::int(32), ValueDef::InstResult { inst: id, index: 0 });
        Instruction::new(
            id,
            InstructionKind::Generic {
                name: name.into(),
                operands,
            },
            vec![result],
        )
    }

    #[test]
    fn test_split_block_moves_tail_and_terminator() {
        let mut func = Function::new(FunctionSignature::new("f", vec![Type::int(32)], vec![]));
        let entry = func.entry_block();
        let x = func.params()[0];

        let a = generic(&mut func.body, "a", vec![x]);
        let b = generic(&mut func.body, "b", vec![x]);
        let b_id = b.id;
        {
            let block = func.body.block_mut(entry).unwrap();
            block.add_instruction(a);
            block.add_instruction(b);
            block.set_terminator(Terminator::Return(vec![]));
        }

        let tail = func.body.split_block(entry, 1).unwrap();

        assert_eq!(func.body.block_order(), vec![entry, tail]);
        assert_eq!(func.body.block(entry).unwrap().instructions.len(), 1);
        assert!(!func.body.block(entry).unwrap().is_terminated());
        assert_eq!(func.body.block(tail).unwrap().instructions[0].id, b_id);
        assert!(func.body.block(tail).unwrap().terminator.is_return());
    }

    #[test]
    fn test_create_block_before_respects_layout() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let last = body.create_block();
        let middle = body.create_block_before(last).unwrap();

        assert_eq!(body.block_order(), vec![entry, middle, last]);
        assert_eq!(body.layout_index(middle), Some(1));
    }

    #[test]
    fn test_replace_all_uses_covers_terminators() {
        let mut func = Function::new(FunctionSignature::new(
            "f",
            vec![Type::int(32), Type::int(32)],
            vec![Type::int(32)],
        ));
        let entry = func.entry_block();
        let params = func.params();
        let inst = generic(&mut func.body, "use", vec![params[0]]);
        let inst_id = inst.id;
        {
            let block = func.body.block_mut(entry).unwrap();
            block.add_instruction(inst);
            block.set_terminator(Terminator::Return(vec![params[0]]));
        }

        assert_eq!(func.body.uses_of(params[0]).len(), 2);
        let replaced = func.body.replace_all_uses(params[0], params[1]);

        assert_eq!(replaced, 2);
        assert!(func.body.uses_of(params[0]).is_empty());
        assert_eq!(
            func.body.uses_of(params[1]),
            vec![Use::Instruction(inst_id), Use::Terminator(entry)]
        );
    }

    #[test]
    fn test_erase_refuses_used_results() {
        let mut func = Function::new(FunctionSignature::new("f", vec![], vec![Type::int(32)]));
        let entry = func.entry_block();
        let inst = generic(&mut func.body, "produce", vec![]);
        let (inst_id, result) = (inst.id, inst.results[0]);
        {
            let block = func.body.block_mut(entry).unwrap();
            block.add_instruction(inst);
            block.set_terminator(Terminator::Return(vec![result]));
        }

        assert!(matches!(
            func.body.erase_inst(inst_id),
            Err(IrError::BuilderError(_))
        ));
        assert_eq!(func.body.block(entry).unwrap().instructions.len(), 1);

        func.body.block_mut(entry).unwrap().set_terminator(Terminator::Return(vec![]));
        assert_eq!(func.body.erase_inst(inst_id).unwrap().id, inst_id);
        assert_eq!(func.body.instruction_count(), 0);
    }

    #[test]
    fn test_erase_missing_instruction_fails() {
        let mut body = FunctionBody::new();
        assert!(matches!(
            body.erase_inst(InstId(42)),
            Err(IrError::InstructionNotFound(InstId(42)))
        ));
    }
}
