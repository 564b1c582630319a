use crate::{
    block::{BasicBlock, BlockId, Terminator},
    function::FunctionBody,
    inst_builder::InstBuilder,
    instructions::Instruction,
    values::SourceLocation,
    IrError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPosition {
    #[default]
    Nowhere,
    Before(BlockId),
    After(BlockId),
    At(BlockId, usize),
}

impl CursorPosition {
    pub fn block(&self) -> Option<BlockId> {
        match *self {
            CursorPosition::Before(b) | CursorPosition::After(b) | CursorPosition::At(b, _) => {
                Some(b)
            }
            CursorPosition::Nowhere => None,
        }
    }
}

/// Edit point into a function body. Instructions are inserted at the current
/// position and the cursor moves past them, so consecutive inserts keep
/// program order.
pub struct FuncCursor<'a> {
    position: CursorPosition,
    location: Option<SourceLocation>,
    body: &'a mut FunctionBody,
}

impl<'a> FuncCursor<'a> {
    pub fn new(body: &'a mut FunctionBody) -> Self {
        Self {
            position: CursorPosition::Nowhere,
            location: None,
            body,
        }
    }

    /// Every instruction built through this cursor carries `location`.
    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.position.block()
    }

    pub fn goto_top(&mut self, block: BlockId) {
        self.position = CursorPosition::Before(block);
    }

    pub fn goto_bottom(&mut self, block: BlockId) {
        self.position = CursorPosition::After(block);
    }

    pub fn goto_inst(&mut self, block: BlockId, index: usize) {
        self.position = CursorPosition::At(block, index);
    }

    pub fn body(&self) -> &FunctionBody {
        &*self.body
    }

    pub fn body_mut(&mut self) -> &mut FunctionBody {
        &mut *self.body
    }

    pub fn insert_inst(&mut self, inst: Instruction) -> Result<()> {
        let inst = inst.with_location(self.location.clone());
        match self.position {
            CursorPosition::Nowhere => {
                return Err(IrError::BuilderError(
                    "Cannot insert at Nowhere position".into(),
                ));
            }
            CursorPosition::Before(block) => {
                self.get_block_mut(block)?.instructions.insert(0, inst);
                self.position = CursorPosition::At(block, 1);
            }
            CursorPosition::At(block, idx) => {
                let block_data = self.get_block_mut(block)?;
                if idx > block_data.instructions.len() {
                    return Err(IrError::BuilderError(format!(
                        "Cursor index {} out of range in {}",
                        idx, block
                    )));
                }
                block_data.instructions.insert(idx, inst);
                self.position = CursorPosition::At(block, idx + 1);
            }
            CursorPosition::After(block) => {
                self.get_block_mut(block)?.instructions.push(inst);
            }
        }
        Ok(())
    }

    pub fn set_terminator(&mut self, term: Terminator) -> Result<()> {
        let block_id = self
            .current_block()
            .ok_or_else(|| IrError::BuilderError("No current block".into()))?;

        let block = self.get_block_mut(block_id)?;
        if block.is_terminated() {
            return Err(IrError::BuilderError(format!(
                "Block {} already has terminator",
                block_id
            )));
        }

        block.terminator = term;
        Ok(())
    }

    pub fn is_terminated(&self) -> bool {
        self.current_block()
            .and_then(|b| self.body.get_block(b))
            .map(|b| b.is_terminated())
            .unwrap_or(false)
    }

    fn get_block_mut(&mut self, block_id: BlockId) -> Result<&mut BasicBlock> {
        self.body.block_mut(block_id)
    }

    pub fn ins(&mut self) -> InstBuilder<'_, 'a> {
        InstBuilder::new(self)
    }
}

impl<'a> FuncCursor<'a> {
    pub fn at_bottom(mut self, block: BlockId) -> Self {
        self.goto_bottom(block);
        self
    }

    pub fn at_top(mut self, block: BlockId) -> Self {
        self.goto_top(block);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;
    use crate::values::Constant;

    #[test]
    fn test_inserts_keep_program_order() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let mut cursor = FuncCursor::new(&mut body).at_top(entry);

        let first = cursor.ins().constant(Constant::Int(1), Type::int(32)).unwrap();
        let second = cursor.ins().constant(Constant::Int(2), Type::int(32)).unwrap();
        cursor.goto_inst(entry, 1);
        let middle = cursor.ins().constant(Constant::Int(3), Type::int(32)).unwrap();

        let results: Vec<_> = body
            .block(entry)
            .unwrap()
            .instructions
            .iter()
            .map(|i| i.results[0])
            .collect();
        assert_eq!(results, vec![first, middle, second]);
    }

    #[test]
    fn test_location_is_stamped() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let loc = SourceLocation::new("m.ir", 3, 7);
        let mut cursor = FuncCursor::new(&mut body)
            .with_location(Some(loc.clone()))
            .at_bottom(entry);

        cursor.ins().constant(Constant::Bool(true), Type::i1()).unwrap();

        assert_eq!(
            body.block(entry).unwrap().instructions[0].location,
            Some(loc)
        );
    }

    #[test]
    fn test_double_terminator_rejected() {
        let mut body = FunctionBody::new();
        let entry = body.entry_block();
        let mut cursor = FuncCursor::new(&mut body).at_bottom(entry);

        cursor.ins().return_values(vec![]).unwrap();
        assert!(cursor.is_terminated());
        assert!(cursor.ins().return_values(vec![]).is_err());
    }

    #[test]
    fn test_insert_nowhere_fails() {
        let mut body = FunctionBody::new();
        let mut cursor = FuncCursor::new(&mut body);
        assert!(cursor
            .ins()
            .constant(Constant::Bool(true), Type::i1())
            .is_err());
    }
}
