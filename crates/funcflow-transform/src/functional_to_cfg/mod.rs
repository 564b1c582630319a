/*! Lower functional `if`/`while` operations into explicit basic blocks.
 *
 * A functional op names its branches or loop pieces as callees and passes values in and out by
 * argument. After lowering, the same computation is spelled with block parameters, jumps and
 * conditional branches, and every callee is invoked through an ordinary `call`. Functions are
 * lowered independently; a failure in one leaves it as it was before the failing op and does not
 * stop its siblings unless the config says so.
 */

mod call;
mod condition;
mod errors;
mod if_lowering;
mod jump;
mod rewire;
mod while_lowering;


use anyhow::{bail, Result};
use funcflow_core::{
    verifier::verify_function, BlockId, Diagnostic, DiagnosticSink, Function, FunctionBody,
    InstId, Instruction, Module, Pass, Severity, SymbolResolver,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub use call::{coerce_value, emit_call};
pub use condition::{check_condition_type, is_supported_condition, lower_condition};
pub use errors::{LoweringError, OpContext};
pub use if_lowering::{lower_if, IfOp};
pub use jump::{jump_to_block, prepare_jump_args};
pub use rewire::replace_results_with_block_params;
pub use while_lowering::{lower_while, WhileOp};

pub const PASS_NAME: &str = "functional-control-flow-to-cfg";
pub const PASS_DESCRIPTION: &str =
    "Lower functional if/while operations into basic blocks, branches and calls";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Run the IR verifier on each function after it is lowered.
    pub verify_after: bool,
    /// Skip the remaining functions once one has failed.
    pub stop_on_first_failure: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            verify_after: true,
            stop_on_first_failure: false,
        }
    }
}

/// Structured control-flow ops this pass knows how to lower.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOp {
    If(IfOp),
    While(WhileOp),
}

impl StructuredOp {
    pub fn match_inst(inst: &Instruction) -> Option<Self> {
        IfOp::from_inst(inst)
            .map(StructuredOp::If)
            .or_else(|| WhileOp::from_inst(inst).map(StructuredOp::While))
    }

    pub fn id(&self) -> InstId {
        match self {
            StructuredOp::If(op) => op.id,
            StructuredOp::While(op) => op.id,
        }
    }

    /// Rewrites the op in place and returns the block holding whatever
    /// followed it.
    pub fn lower(
        &self,
        body: &mut FunctionBody,
        symbols: &dyn SymbolResolver,
    ) -> Result<BlockId, LoweringError> {
        match self {
            StructuredOp::If(op) => lower_if(body, op, symbols),
            StructuredOp::While(op) => lower_while(body, op, symbols),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoweringStats {
    pub ifs: usize,
    pub loops: usize,
}

impl LoweringStats {
    fn record(&mut self, op: &StructuredOp) {
        match op {
            StructuredOp::If(_) => self.ifs += 1,
            StructuredOp::While(_) => self.loops += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ifs + self.loops
    }
}

/// Lowers every structured op in `function`, in layout order.
///
/// Blocks created by a lowering that hold only generated code are skipped;
/// scanning continues at the first instruction of the block that received
/// the rest of the original block. On error the ops already lowered stay
/// lowered and the failing op is untouched.
pub fn lower_function(
    function: &mut Function,
    symbols: &dyn SymbolResolver,
) -> Result<LoweringStats, LoweringError> {
    let body = &mut function.body;
    let mut stats = LoweringStats::default();
    let mut layout_index = 0;

    while let Some(block) = body.block_at(layout_index) {
        let next_op = body
            .block(block)?
            .instructions
            .iter()
            .find_map(StructuredOp::match_inst);

        let Some(op) = next_op else {
            layout_index += 1;
            continue;
        };

        trace!("lowering {} in {} of @{}", op.id(), block, function.signature.name);
        let continuation = op.lower(body, symbols)?;
        stats.record(&op);

        layout_index = body
            .layout_index(continuation)
            .ok_or(funcflow_core::IrError::BlockNotFound(continuation))?;
    }

    Ok(stats)
}

#[derive(Debug)]
pub struct FunctionOutcome {
    pub function: String,
    pub result: Result<LoweringStats, LoweringError>,
}

/// Per-function results of one run over a module.
#[derive(Debug, Default)]
pub struct LoweringReport {
    pub outcomes: Vec<FunctionOutcome>,
}

impl LoweringReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &LoweringError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.function.as_str(), e)))
    }

    pub fn totals(&self) -> LoweringStats {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .fold(LoweringStats::default(), |acc, s| LoweringStats {
                ifs: acc.ifs + s.ifs,
                loops: acc.loops + s.loops,
            })
    }

    pub fn outcome(&self, function: &str) -> Option<&FunctionOutcome> {
        self.outcomes.iter().find(|o| o.function == function)
    }
}

/// Lowers every function of `module`, reporting each failure to `diagnostics`.
pub fn lower_module(
    module: &mut Module,
    config: &LoweringConfig,
    diagnostics: &mut dyn DiagnosticSink,
) -> LoweringReport {
    let symbols = module.symbol_table();
    let mut report = LoweringReport::default();

    for (name, function) in module.functions.iter_mut() {
        // functions without structured ops are left as they are, declarations included
        let result = lower_function(function, &symbols).and_then(|stats| {
            if config.verify_after && stats.total() > 0 {
                verify_function(function)?;
            }
            Ok(stats)
        });

        match &result {
            Ok(stats) => debug!(
                "@{}: lowered {} if(s) and {} loop(s)",
                name, stats.ifs, stats.loops
            ),
            Err(err) => {
                warn!("@{}: {}", name, err);
                diagnostics.report(Diagnostic {
                    severity: Severity::Error,
                    location: err.location().cloned(),
                    message: format!("in @{}: {}", name, err),
                });
            }
        }

        let failed = result.is_err();
        report.outcomes.push(FunctionOutcome {
            function: name.clone(),
            result,
        });
        if failed && config.stop_on_first_failure {
            break;
        }
    }

    report
}

/// Pipeline wrapper around [`lower_module`]. The report of the latest run is
/// kept for inspection.
#[derive(Debug, Default)]
pub struct FunctionalControlFlowToCfg {
    config: LoweringConfig,
    last_report: Option<LoweringReport>,
}

impl FunctionalControlFlowToCfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoweringConfig) -> Self {
        Self {
            config,
            last_report: None,
        }
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }

    pub fn last_report(&self) -> Option<&LoweringReport> {
        self.last_report.as_ref()
    }

    pub fn take_report(&mut self) -> Option<LoweringReport> {
        self.last_report.take()
    }
}

impl Pass for FunctionalControlFlowToCfg {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        PASS_DESCRIPTION
    }

    fn run_on_module(
        &mut self,
        module: &mut Module,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        let report = lower_module(module, &self.config, diagnostics);
        let failed = report.failures().count();
        self.last_report = Some(report);

        if failed > 0 {
            bail!("{} function(s) in module '{}' could not be lowered", failed, module.name);
        }
        Ok(())
    }

    fn modifies_ir(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
