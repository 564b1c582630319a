/*! Control-flow queries and pass scheduling.
 *
 * Lowering rewrites block structure, so callers need a cheap way to ask what the graph looks like
 * afterwards and a place to register passes that run over whole modules.
 */

pub mod cfg;
pub mod pass;

pub use cfg::ControlFlowGraph;
pub use pass::{Pass, PassManager, PassStatistics};
