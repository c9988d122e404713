//! Loop nest and trip-count seams.
//!
//! Loop discovery and trip-count estimation are analyses in their own right; the
//! correlation pass consumes their results through [`LoopNestProvider`] and
//! [`TripCountOracle`]. [`Analyzer`](super::Analyzer) is the built-in provider.

use super::adaptor::IrAdaptor;

/// A natural loop of the current function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop<B> {
    pub header: B,
    /// Member blocks, header first.
    pub blocks: Vec<B>,
    /// Nesting depth, 1 for outermost loops.
    pub depth: u32,
    /// Position of the enclosing loop in the preorder list.
    pub parent: Option<usize>,
}

impl<B: PartialEq> Loop<B> {
    pub fn contains(&self, block: &B) -> bool {
        self.blocks.contains(block)
    }
}

/// Supplies the loop nest of the function currently selected in the adaptor.
pub trait LoopNestProvider<A: IrAdaptor> {
    /// Loops in preorder: every loop precedes the loops nested in it.
    fn loops_in_preorder(&mut self, adaptor: &A) -> Vec<Loop<A::BlockRef>>;
}

/// Supplies small constant upper bounds on loop iteration counts.
pub trait TripCountOracle<A: IrAdaptor> {
    /// Maximum trip count when it is a known small constant, `None` otherwise.
    fn small_constant_max_trip_count(&self, adaptor: &A, lp: &Loop<A::BlockRef>) -> Option<u32>;
}

/// Oracle that never knows a trip count.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTripCounts;

impl<A: IrAdaptor> TripCountOracle<A> for NoTripCounts {
    fn small_constant_max_trip_count(&self, _adaptor: &A, _lp: &Loop<A::BlockRef>) -> Option<u32> {
        None
    }
}
