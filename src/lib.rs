//! ir2src - Source correlation for SSA-based IRs.
//!
//! ir2src maps the instructions, basic blocks, natural loops and functions of
//! an SSA IR back to the source line ranges recorded in their debug metadata,
//! and attaches user-authored loop labels to the loops the compiler found.
//!
//! # Primary Usage
//!
//! ```ignore
//! use ir2src::core::{Analyzer, CorrelationConfig};
//! use ir2src::srcmap::{ReportSection, SourceMapPass};
//! use ir2src::test_ir::{AnnotatedTripCounts, TestIR, TestIRAdaptor};
//!
//! let ir = TestIR::parse(&text)?;
//! let mut adaptor = TestIRAdaptor::new(&ir);
//! let mut pass = SourceMapPass::new(CorrelationConfig::default());
//! let maps = pass.run_on_module(&mut adaptor, &mut Analyzer::new(), &AnnotatedTripCounts)?;
//! println!("{}", maps.render(ReportSection::Loops));
//! ```
//!
//! # Architecture
//!
//! - [`core`] - IR adaptor seam, metadata model, loop analysis, configuration
//! - [`srcmap`] - The correlation pass and the maps it produces
//! - [`test_ir`] - Textual test IR with debug metadata and a FileCheck-style runner

pub mod core;
pub mod srcmap;
pub mod test_ir;

pub use core::{
    // Framework traits
    IrAdaptor, LoopNestProvider, TripCountOracle,
    // Analysis
    Analyzer, Loop,
    // Configuration and errors
    CorrelationConfig, CorrelationError, CorrelationResult,
    // Session management
    AnalysisSession, SessionStats,
};
pub use srcmap::{LoopKey, SourceMapPass, SourceMaps, SourceRange};
