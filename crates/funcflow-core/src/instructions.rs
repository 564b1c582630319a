use crate::values::{Constant, SourceLocation, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inst{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub kind: InstructionKind,
    pub results: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    Constant(Constant),

    Call {
        callee: String,
        args: Vec<Value>,
    },

    /// Converts a value to a cast-compatible type, the type of the result.
    TensorCast {
        value: Value,
    },

    ExtractElement {
        tensor: Value,
        indices: Vec<Value>,
    },

    /// Functional conditional: calls `then_branch` or `else_branch` with
    /// `args` depending on `condition`.
    If {
        condition: Value,
        then_branch: String,
        else_branch: String,
        args: Vec<Value>,
    },

    /// Functional loop: feeds the loop-carried `args` through `body` while
    /// `cond` holds.
    While {
        cond: String,
        body: String,
        args: Vec<Value>,
    },

    Generic {
        name: String,
        operands: Vec<Value>,
    },
}

impl InstructionKind {
    pub fn mnemonic(&self) -> &str {
        match self {
            InstructionKind::Constant(_) => "constant",
            InstructionKind::Call { .. } => "call",
            InstructionKind::TensorCast { .. } => "tensor_cast",
            InstructionKind::ExtractElement { .. } => "extract_element",
            InstructionKind::If { .. } => "if",
            InstructionKind::While { .. } => "while",
            InstructionKind::Generic { name, .. } => name,
        }
    }
}

impl Instruction {
    pub fn new(id: InstId, kind: InstructionKind, results: Vec<Value>) -> Self {
        Self {
            id,
            kind,
            results,
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn operands(&self) -> Vec<Value> {
        match &self.kind {
            InstructionKind::Constant(_) => vec![],
            InstructionKind::Call { args, .. } | InstructionKind::While { args, .. } => {
                args.clone()
            }
            InstructionKind::TensorCast { value } => vec![*value],
            InstructionKind::ExtractElement { tensor, indices } => std::iter::once(*tensor)
                .chain(indices.iter().copied())
                .collect(),
            InstructionKind::If {
                condition, args, ..
            } => std::iter::once(*condition)
                .chain(args.iter().copied())
                .collect(),
            InstructionKind::Generic { operands, .. } => operands.clone(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match &mut self.kind {
            InstructionKind::Constant(_) => vec![],
            InstructionKind::Call { args, .. } | InstructionKind::While { args, .. } => {
                args.iter_mut().collect()
            }
            InstructionKind::TensorCast { value } => vec![value],
            InstructionKind::ExtractElement { tensor, indices } => std::iter::once(tensor)
                .chain(indices.iter_mut())
                .collect(),
            InstructionKind::If {
                condition, args, ..
            } => std::iter::once(condition).chain(args.iter_mut()).collect(),
            InstructionKind::Generic { operands, .. } => operands.iter_mut().collect(),
        }
    }

    pub fn uses(&self, value: Value) -> bool {
        self.operands().contains(&value)
    }

    /// Functional control flow that still has to be expanded into blocks.
    pub fn is_structured(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::If { .. } | InstructionKind::While { .. }
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, InstructionKind::Call { .. })
    }

    pub fn is_cast(&self) -> bool {
        matches!(self.kind, InstructionKind::TensorCast { .. })
    }

    pub fn callee(&self) -> Option<&str> {
        match &self.kind {
            InstructionKind::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_operands_lead_with_condition() {
        let inst = Instruction::new(
            InstId(0),
            InstructionKind::If {
                condition: Value(0),
                then_branch: "then".into(),
                else_branch: "else".into(),
                args: vec![Value(1), Value(2)],
            },
            vec![Value(3)],
        );

        assert_eq!(inst.operands(), vec![Value(0), Value(1), Value(2)]);
        assert!(inst.is_structured());
        assert!(inst.uses(Value(2)));
        assert!(!inst.uses(Value(3)));
    }

    #[test]
    fn test_operands_mut_rewrites_in_place() {
        let mut inst = Instruction::new(
            InstId(0),
            InstructionKind::Generic {
                name: "add".into(),
                operands: vec![Value(1), Value(1)],
            },
            vec![Value(2)],
        );

        for operand in inst.operands_mut() {
            *operand = Value(7);
        }

        assert_eq!(inst.operands(), vec![Value(7), Value(7)]);
        assert_eq!(inst.kind.mnemonic(), "add");
    }
}
