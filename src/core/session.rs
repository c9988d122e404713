// This module provides the analysis session of the correlation pass. AnalysisSession tracks
// which function is being analyzed and gathers statistics for the whole module run: how
// many functions were analyzed or skipped (declarations, intrinsics), how many blocks and
// instructions were traced, how many instructions carried no location, how many intrinsic
// and indirect calls were met, how many loops were discovered, and how the label
// reconciliation went (matched, unmatched, conflicting). The statistics live behind a
// RefCell so the aggregation routines can record through a shared reference. SessionStats
// renders a human-readable summary for the CLI and the FileCheck runner.

//! Analysis session state and statistics.

use std::cell::RefCell;
use std::fmt;

/// Per-run bookkeeping of the correlation pass.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    stats: RefCell<SessionStats>,

    /// Link name of the function currently analyzed.
    current_function: RefCell<Option<String>>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all statistics; called at the start of every module run.
    pub fn reset(&self) {
        *self.stats.borrow_mut() = SessionStats::default();
        *self.current_function.borrow_mut() = None;
    }

    pub fn set_current_function(&self, name: &str) {
        *self.current_function.borrow_mut() = Some(name.to_string());
    }

    pub fn clear_current_function(&self) {
        *self.current_function.borrow_mut() = None;
    }

    pub fn current_function(&self) -> Option<String> {
        self.current_function.borrow().clone()
    }

    pub fn record_function_analyzed(&self) {
        self.stats.borrow_mut().functions_analyzed += 1;
    }

    /// Record a function that was not analyzed (declaration or intrinsic).
    pub fn record_function_skipped(&self) {
        self.stats.borrow_mut().functions_skipped += 1;
    }

    pub fn record_block(&self) {
        self.stats.borrow_mut().blocks_analyzed += 1;
    }

    /// Record a traced instruction and whether it resolved to a location.
    pub fn record_instruction(&self, located: bool) {
        let mut stats = self.stats.borrow_mut();
        stats.instructions_traced += 1;
        if !located {
            stats.instructions_without_location += 1;
        }
    }

    pub fn record_intrinsic_skipped(&self) {
        self.stats.borrow_mut().intrinsic_calls_skipped += 1;
    }

    pub fn record_indirect_call(&self) {
        self.stats.borrow_mut().indirect_calls += 1;
    }

    pub fn record_loop(&self) {
        self.stats.borrow_mut().loops_discovered += 1;
    }

    pub fn record_label_matched(&self) {
        self.stats.borrow_mut().labels_matched += 1;
    }

    pub fn record_label_unmatched(&self) {
        self.stats.borrow_mut().labels_unmatched += 1;
    }

    /// Record a label dropped because its loop was already labelled.
    pub fn record_label_conflict(&self) {
        self.stats.borrow_mut().labels_conflicting += 1;
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Analysis session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub functions_analyzed: usize,
    pub functions_skipped: usize,
    pub blocks_analyzed: usize,
    pub instructions_traced: usize,
    pub instructions_without_location: usize,
    pub intrinsic_calls_skipped: usize,
    pub indirect_calls: usize,
    pub loops_discovered: usize,
    pub labels_matched: usize,
    pub labels_unmatched: usize,
    pub labels_conflicting: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Session Statistics:")?;
        writeln!(f, "  Functions analyzed: {}", self.functions_analyzed)?;
        writeln!(f, "  Functions skipped: {}", self.functions_skipped)?;
        writeln!(f, "  Blocks analyzed: {}", self.blocks_analyzed)?;
        writeln!(f, "  Instructions traced: {}", self.instructions_traced)?;
        writeln!(
            f,
            "  Instructions without location: {}",
            self.instructions_without_location
        )?;
        writeln!(f, "  Intrinsic calls skipped: {}", self.intrinsic_calls_skipped)?;
        writeln!(f, "  Indirect calls: {}", self.indirect_calls)?;
        writeln!(f, "  Loops discovered: {}", self.loops_discovered)?;
        writeln!(f, "  Labels matched: {}", self.labels_matched)?;
        writeln!(f, "  Labels unmatched: {}", self.labels_unmatched)?;
        writeln!(f, "  Labels conflicting: {}", self.labels_conflicting)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = AnalysisSession::new();
        let stats = session.stats();
        assert_eq!(stats, SessionStats::default());
        assert_eq!(session.current_function(), None);
    }

    #[test]
    fn test_session_statistics() {
        let session = AnalysisSession::new();
        session.set_current_function("foo");
        session.record_function_analyzed();
        session.record_function_skipped();
        session.record_block();
        session.record_instruction(true);
        session.record_instruction(false);
        session.record_intrinsic_skipped();
        session.record_loop();
        session.record_label_matched();
        session.record_label_conflict();

        let stats = session.stats();
        assert_eq!(stats.functions_analyzed, 1);
        assert_eq!(stats.functions_skipped, 1);
        assert_eq!(stats.instructions_traced, 2);
        assert_eq!(stats.instructions_without_location, 1);
        assert_eq!(stats.labels_conflicting, 1);
        assert_eq!(session.current_function().as_deref(), Some("foo"));

        let display = format!("{}", stats);
        assert!(display.contains("Functions analyzed: 1"));
        assert!(display.contains("Instructions without location: 1"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let session = AnalysisSession::new();
        session.set_current_function("bar");
        session.record_loop();
        session.reset();
        assert_eq!(session.stats().loops_discovered, 0);
        assert_eq!(session.current_function(), None);
    }
}
