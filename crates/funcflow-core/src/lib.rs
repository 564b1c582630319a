/*! Core IR types and builders for control-flow lowering.
 *
 * Functions are ordered lists of basic blocks whose parameters carry values across edges. This
 * crate provides the IR itself, an edit cursor for splicing new instructions and blocks into it,
 * a verifier for the block-parameter invariants, a textual printer, and the pass plumbing that
 * transformations plug into.
 */

pub mod analysis;
pub mod block;
pub mod cursor;
pub mod diagnostics;
pub mod format;
pub mod function;
pub mod inst_builder;
pub mod instructions;
pub mod module;
pub mod types;
pub mod values;
pub mod verifier;

pub use analysis::{ControlFlowGraph, Pass, PassManager};
pub use block::{BasicBlock, BlockId, BlockParam, Terminator};
pub use cursor::{CursorPosition, FuncCursor};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink, Severity};
pub use function::{Function, FunctionBody, FunctionSignature};
pub use instructions::{InstId, Instruction, InstructionKind};
pub use module::{Module, SymbolResolver, SymbolTable};
pub use types::{Dim, ElementType, Shape, Type};
pub use values::{Constant, SourceLocation, Value, ValueData, ValueDef};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),
    #[error("Instruction not found: {0}")]
    InstructionNotFound(InstId),
    #[error("Value not found: {0}")]
    ValueNotFound(Value),
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Verifier error: {0}")]
    VerifierError(String),
}

pub type Result<T> = std::result::Result<T, IrError>;
