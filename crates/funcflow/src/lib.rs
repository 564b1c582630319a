/*! Unified interface for functional control-flow lowering.
 *
 * One import for building IR, lowering functional `if`/`while` into blocks,
 * verifying the result and printing it.
 */

pub use funcflow_core as core;
pub use funcflow_transform as transform;

pub use funcflow_core::{
    block::{BasicBlock, BlockId, Terminator},
    format::{format_function, format_module},
    function::{Function, FunctionSignature},
    instructions::{Instruction, InstructionKind},
    module::Module,
    types::Type,
    values::Value,
    verifier::verify_function,
    FuncCursor, PassManager,
};

pub use funcflow_transform::{
    lower_function, lower_module, FunctionalControlFlowToCfg, LoweringConfig, LoweringError,
    LoweringReport,
};
