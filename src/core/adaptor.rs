// This module defines the IrAdaptor trait, the bridge between the correlation pass and
// any SSA-based intermediate representation that carries debug metadata. The trait
// exposes the minimal structure the pass needs: functions (link names, declarations,
// switching the current function), basic blocks (iteration, successors, names), and
// instructions (opcode names for diagnostics, call-target classification). On top of
// that it exposes the metadata attachments of instructions and functions and the
// module's MetadataTable. The pass never mutates the IR through the adaptor; switching
// the current function is the only state change it requests.

//! IrAdaptor responsibilities.
//!
//! The adaptor is the glue between the pass and the user's IR. The framework
//! assumes:
//! - Each defined function has a single entry block.
//! - Basic blocks hold an ordered list of instructions (phis included).
//! - Instructions and functions may carry any number of metadata attachments;
//!   the pass picks out the node kinds it understands.
//!
//! Implementations may preprocess data in `switch_func` to speed up later calls.

use core::fmt::Debug;
use core::hash::Hash;

use super::metadata::{MdRef, MetadataTable};

/// Callee of a call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget<'a> {
    /// Statically known callee, by link name.
    Direct(&'a str),
    /// Indirect call, or a callee that cannot be determined statically.
    Indirect,
}

/// Bridge between an SSA IR and the correlation pass.
///
/// Block and instruction queries refer to the function selected with
/// [`switch_func`](IrAdaptor::switch_func); function-level queries accept any
/// function of the module.
pub trait IrAdaptor {
    type InstRef: Copy + Eq + Hash + Debug;
    type BlockRef: Copy + Eq + Hash + Debug;
    type FuncRef: Copy + Eq + Hash + Debug;

    /// Iterator over all functions in module order.
    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_>;

    /// Linkage (mangled) name of the function.
    fn func_link_name(&self, func: Self::FuncRef) -> &str;

    /// Whether the function is only declared (has no body).
    fn func_extern(&self, func: Self::FuncRef) -> bool;

    /// Metadata nodes attached to the function (its subprogram, typically).
    fn func_attachments(&self, func: Self::FuncRef) -> Box<dyn Iterator<Item = MdRef> + '_>;

    /// Select the function subsequent block queries refer to.
    fn switch_func(&mut self, func: Self::FuncRef) -> bool;

    /// Entry block of the current function.
    fn entry_block(&self) -> Self::BlockRef;

    /// Blocks of the current function in layout order.
    fn blocks(&self) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// Instructions of the given block in order.
    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_>;

    /// Successor blocks of a given block.
    fn block_succs(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// Name of a block.
    fn block_name(&self, block: Self::BlockRef) -> &str;

    /// Opcode mnemonic of an instruction, for diagnostics.
    fn inst_opcode(&self, _inst: Self::InstRef) -> &str {
        "<inst>"
    }

    /// Callee of the instruction, or `None` when it is not a call.
    fn inst_call_target(&self, inst: Self::InstRef) -> Option<CallTarget<'_>>;

    /// Metadata nodes attached to the instruction, in attachment order.
    fn inst_attachments(&self, inst: Self::InstRef) -> Box<dyn Iterator<Item = MdRef> + '_>;

    /// Metadata nodes of the module.
    fn metadata(&self) -> &MetadataTable;
}
