use crate::diagnostics::{DiagnosticCollector, DiagnosticSink};
use crate::module::Module;
use anyhow::Result;
use std::time::{Duration, Instant};

pub trait Pass {
    /// Identifier used when registering the pass in a pipeline.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn run_on_module(
        &mut self,
        module: &mut Module,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<()>;

    fn modifies_ir(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub name: String,
    pub duration: Duration,
    pub succeeded: bool,
}

#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    statistics: Vec<PassStatistics>,
    collect_stats: bool,
    diagnostics: DiagnosticCollector,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_statistics(&mut self) {
        self.collect_stats = true;
    }

    pub fn register_pass<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Runs every registered pass in order, stopping at the first failure.
    pub fn run_all(&mut self, module: &mut Module) -> Result<()> {
        for pass in &mut self.passes {
            let start = self.collect_stats.then(Instant::now);

            tracing::debug!(pass = pass.name(), module = %module.name, "running pass");
            let outcome = pass.run_on_module(module, &mut self.diagnostics);

            if let Some(start) = start {
                self.statistics.push(PassStatistics {
                    name: pass.name().to_string(),
                    duration: start.elapsed(),
                    succeeded: outcome.is_ok(),
                });
            }

            outcome.map_err(|e| e.context(format!("pass '{}' failed", pass.name())))?;
        }

        Ok(())
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticCollector {
        &mut self.diagnostics
    }

    pub fn get_pass_mut<P: Pass + 'static>(&mut self) -> Option<&mut P> {
        self.passes
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<P>())
    }

    pub fn get_pass<P: Pass + 'static>(&self) -> Option<&P> {
        self.passes
            .iter()
            .find_map(|p| p.as_any().downcast_ref::<P>())
    }
}
