/*! Transformations over the funcflow IR.
 *
 * Frontends that think in regions and callees produce functional `if`/`while` operations: the
 * branches and loop pieces are separate functions and data moves through arguments. Analyses and
 * backends want a plain control-flow graph instead. This crate rewrites the former into the latter
 * so that downstream code only ever sees blocks, branches and calls.
 */

pub mod functional_to_cfg;

pub use functional_to_cfg::{
    lower_function, lower_module, FunctionOutcome, FunctionalControlFlowToCfg, LoweringConfig,
    LoweringError, LoweringReport, LoweringStats, StructuredOp, PASS_DESCRIPTION, PASS_NAME,
};
