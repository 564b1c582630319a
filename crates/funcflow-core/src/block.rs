use crate::instructions::{InstId, Instruction};
use crate::types::Type;
use crate::values::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub params: Vec<BlockParam>,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            params: Vec::new(),
            instructions: Vec::new(),
            terminator: Terminator::Invalid,
        }
    }

    pub fn add_instruction(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = term;
    }

    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, Terminator::Invalid)
    }

    pub fn param_values(&self) -> Vec<Value> {
        self.params.iter().map(|p| p.value).collect()
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.param_type.clone()).collect()
    }

    pub fn position_of(&self, inst: InstId) -> Option<usize> {
        self.instructions.iter().position(|i| i.id == inst)
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator.successors()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockParam {
    pub value: Value,
    pub param_type: Type,
}

impl BlockParam {
    pub fn new(value: Value, param_type: Type) -> Self {
        Self { value, param_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminator {
    Jump(BlockId, Vec<Value>),
    Branch {
        condition: Value,
        then_block: BlockId,
        then_args: Vec<Value>,
        else_block: BlockId,
        else_args: Vec<Value>,
    },

    Return(Vec<Value>),

    Unreachable,

    Invalid,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(target, _) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable | Terminator::Invalid => vec![],
        }
    }

    /// Each outgoing edge paired with the arguments passed along it.
    pub fn edges(&self) -> Vec<(BlockId, &[Value])> {
        match self {
            Terminator::Jump(target, args) => vec![(*target, args.as_slice())],
            Terminator::Branch {
                then_block,
                then_args,
                else_block,
                else_args,
                ..
            } => vec![
                (*then_block, then_args.as_slice()),
                (*else_block, else_args.as_slice()),
            ],
            _ => vec![],
        }
    }

    pub fn operands(&self) -> Vec<Value> {
        match self {
            Terminator::Jump(_, args) => args.clone(),
            Terminator::Branch {
                condition,
                then_args,
                else_args,
                ..
            } => std::iter::once(*condition)
                .chain(then_args.iter().copied())
                .chain(else_args.iter().copied())
                .collect(),
            Terminator::Return(values) => values.clone(),
            Terminator::Unreachable | Terminator::Invalid => vec![],
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Terminator::Jump(_, args) => args.iter_mut().collect(),
            Terminator::Branch {
                condition,
                then_args,
                else_args,
                ..
            } => std::iter::once(condition)
                .chain(then_args.iter_mut())
                .chain(else_args.iter_mut())
                .collect(),
            Terminator::Return(values) => values.iter_mut().collect(),
            Terminator::Unreachable | Terminator::Invalid => vec![],
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Terminator::Return(_))
    }
}
