// This module implements SourceMapPass, the correlation pass that maps IR constructs back
// to source line ranges. A run over a module has an explicit begin (the session and all
// maps are reset), two phases and an end. Phase one visits every defined function in
// module order: it traces instruction locations (diagnostics only), aggregates one range
// per basic block, merges block ranges into loop ranges for the loop nest handed out by
// the LoopNestProvider while recording trip counts from the TripCountOracle, and finally
// merges everything into the function range, cross-checked with the debug subprogram.
// Phase two starts only when every function is done: it reconciles the loop labels
// retained by the subprograms with the module-wide loop table. The maps are final once
// the run returns successfully; a run that fails on corrupt debug info leaves them
// unfinalized.

//! Source correlation pass and its outputs.

pub mod block;
pub mod function;
pub mod labels;
pub mod loop_ranges;
pub mod maps;
pub mod range;
pub mod report;
pub mod resolve;
pub mod trace;

pub use maps::{BlockRecord, FunctionRecord, LoopRecord, SourceMaps};
pub use range::{LoopKey, SourceRange};
pub use report::ReportSection;
pub use resolve::{resolve_location, SourceLocation};
pub use trace::{render_trace, trace_function, InstructionTrace};

use log::{debug, log_enabled, warn, Level};

use crate::core::{
    AnalysisSession, CorrelationConfig, CorrelationResult, Demangler, IrAdaptor,
    LoopNestProvider, SessionStats, SymbolDemangler, TripCountOracle,
};

/// Correlates IR constructs with source line ranges.
pub struct SourceMapPass<A: IrAdaptor> {
    config: CorrelationConfig,
    demangler: Box<dyn Demangler>,
    session: AnalysisSession,
    maps: SourceMaps<A::FuncRef, A::BlockRef>,
    finalized: bool,
}

impl<A: IrAdaptor> SourceMapPass<A> {
    /// Create a pass demangling with [`SymbolDemangler`].
    pub fn new(config: CorrelationConfig) -> Self {
        Self::with_demangler(config, Box::new(SymbolDemangler))
    }

    pub fn with_demangler(config: CorrelationConfig, demangler: Box<dyn Demangler>) -> Self {
        Self {
            config,
            demangler,
            session: AnalysisSession::new(),
            maps: SourceMaps::new(),
            finalized: false,
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Maps of the last successful run.
    pub fn maps(&self) -> Option<&SourceMaps<A::FuncRef, A::BlockRef>> {
        self.finalized.then_some(&self.maps)
    }

    /// Run the pass over every function of the module.
    ///
    /// The adaptor is left switched to the last analyzed function.
    pub fn run_on_module(
        &mut self,
        adaptor: &mut A,
        loops: &mut dyn LoopNestProvider<A>,
        trips: &dyn TripCountOracle<A>,
    ) -> CorrelationResult<&SourceMaps<A::FuncRef, A::BlockRef>> {
        self.begin();

        let funcs: Vec<_> = adaptor.funcs().collect();
        debug!("correlating {} functions", funcs.len());
        for func in funcs {
            self.analyze_function(adaptor, loops, trips, func)?;
        }
        self.session.clear_current_function();

        labels::reconcile_labels(&*adaptor, &self.config, &mut self.maps, &self.session)?;

        self.finalized = true;
        Ok(&self.maps)
    }

    fn begin(&mut self) {
        self.finalized = false;
        self.maps.clear();
        self.session.reset();
    }

    fn analyze_function(
        &mut self,
        adaptor: &mut A,
        loops: &mut dyn LoopNestProvider<A>,
        trips: &dyn TripCountOracle<A>,
        func: A::FuncRef,
    ) -> CorrelationResult<()> {
        let link_name = adaptor.func_link_name(func).to_string();
        if adaptor.func_extern(func) {
            debug!("skipping declaration {}", link_name);
            self.session.record_function_skipped();
            return Ok(());
        }
        if self.config.skip_intrinsic_functions && self.config.is_intrinsic(&link_name) {
            debug!("skipping intrinsic {}", link_name);
            self.session.record_function_skipped();
            return Ok(());
        }
        if !adaptor.switch_func(func) {
            warn!("adaptor refused to switch to {}, skipping it", link_name);
            self.session.record_function_skipped();
            return Ok(());
        }

        debug!("analyzing function {}", link_name);
        self.session.set_current_function(&link_name);
        self.session.record_function_analyzed();
        let adaptor = &*adaptor;

        if log_enabled!(Level::Trace) {
            trace::trace_function(adaptor, self.config.max_inline_depth)?;
        }

        let mut blocks = Vec::new();
        for block in adaptor.blocks() {
            let range = block::aggregate_block(adaptor, block, &self.config, &self.session)?;
            debug!("block {}: {}", adaptor.block_name(block), range);
            self.maps.insert_block(block, adaptor.block_name(block), range);
            self.session.record_block();
            blocks.push(block);
        }

        let demangled = self.demangler.demangle(&link_name);
        let nest = loops.loops_in_preorder(adaptor);
        loop_ranges::aggregate_loops(
            adaptor,
            func,
            &link_name,
            &demangled,
            &nest,
            trips,
            &mut self.maps,
            &self.session,
        );

        function::aggregate_function(adaptor, func, link_name, demangled, blocks, &mut self.maps)
    }
}
