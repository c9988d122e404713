// This module serves as the central hub for the infrastructure the correlation pass is
// built on, shared by every IR that can be plugged into it. It exports and organizes the
// key subsystems: the IrAdaptor trait (how the pass sees functions, blocks, instructions
// and their metadata attachments), the debug metadata model (MetadataTable and the closed
// MetadataNode enum), the Analyzer (RPO, dominators and the natural loop nest), the loop
// and trip-count seams consumed by the pass, name demangling, configuration, the analysis
// session with its statistics, and the error types. Nothing in here knows about source
// ranges; the aggregation itself lives in the srcmap module.

//! Core infrastructure of the correlation pass.
//!
//! # Key Components
//!
//! ## IR access (`adaptor`, `metadata`)
//! - [`IrAdaptor`] abstracts over any SSA IR with debug metadata
//! - [`MetadataTable`] holds `DIFile`/`DISubprogram`/`DILocation`/`DILabel` nodes
//!
//! ## Analyses (`analyzer`, `loops`)
//! - [`Analyzer`] computes reverse post-order, dominators and natural loops
//! - [`LoopNestProvider`] and [`TripCountOracle`] are the seams the pass consumes
//!
//! ## Ambient (`config`, `demangle`, `session`, `error`)
//! - [`CorrelationConfig`] tunables
//! - [`Demangler`] implementations for readable function names
//! - [`AnalysisSession`] statistics
//! - [`CorrelationError`] for corrupt debug info

pub mod adaptor;
pub mod analyzer;
pub mod config;
pub mod demangle;
pub mod error;
pub mod loops;
pub mod metadata;
pub mod session;

pub use adaptor::{CallTarget, IrAdaptor};
pub use analyzer::Analyzer;
pub use config::{CorrelationConfig, IntrinsicPolicy, LabelTieBreak};
pub use demangle::{Demangler, IdentityDemangler, SymbolDemangler};
pub use error::{CorrelationError, CorrelationResult};
pub use loops::{Loop, LoopNestProvider, NoTripCounts, TripCountOracle};
pub use metadata::{
    DIFile, DILabel, DILexicalBlock, DILocation, DISubprogram, MdRef, MetadataNode,
    MetadataTable,
};
pub use session::{AnalysisSession, SessionStats};
