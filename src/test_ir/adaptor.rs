//! TestIR adaptor implementation for the correlation pass.
//!
//! This adaptor lets the pass run over TestIR, so correlation behavior can be
//! tested with small handwritten modules.

use super::{Callee, TestIR, ValueType};
use crate::core::{CallTarget, IrAdaptor, Loop, MdRef, MetadataTable, TripCountOracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u32);

/// Adaptor that implements IrAdaptor for TestIR
pub struct TestIRAdaptor<'ir> {
    ir: &'ir TestIR,
    cur_func: u32,
}

impl<'ir> TestIRAdaptor<'ir> {
    pub fn new(ir: &'ir TestIR) -> Self {
        Self { ir, cur_func: 0 }
    }

    /// Get the current function index
    pub fn cur_func(&self) -> u32 {
        self.cur_func
    }

    pub fn value_name(&self, inst: InstRef) -> &str {
        &self.ir.values[inst.0 as usize].name
    }

    /// `maxtrip(N)` annotation of a block.
    pub fn block_max_trip(&self, block: BlockRef) -> Option<u32> {
        self.ir.blocks[block.0 as usize].max_trip
    }

    fn attachments(&self, begin: u32, end: u32) -> Box<dyn Iterator<Item = MdRef> + '_> {
        Box::new(self.ir.attachments[begin as usize..end as usize].iter().copied())
    }
}

impl<'ir> IrAdaptor for TestIRAdaptor<'ir> {
    type InstRef = InstRef;
    type BlockRef = BlockRef;
    type FuncRef = FuncRef;

    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_> {
        Box::new((0..self.ir.functions.len()).map(|i| FuncRef(i as u32)))
    }

    fn func_link_name(&self, func: Self::FuncRef) -> &str {
        &self.ir.functions[func.0 as usize].name
    }

    fn func_extern(&self, func: Self::FuncRef) -> bool {
        self.ir.functions[func.0 as usize].declaration
    }

    fn func_attachments(&self, func: Self::FuncRef) -> Box<dyn Iterator<Item = MdRef> + '_> {
        let info = &self.ir.functions[func.0 as usize];
        self.attachments(info.attach_begin_idx, info.attach_end_idx)
    }

    fn switch_func(&mut self, func: Self::FuncRef) -> bool {
        if func.0 as usize >= self.ir.functions.len() {
            return false;
        }
        self.cur_func = func.0;
        true
    }

    fn entry_block(&self) -> Self::BlockRef {
        BlockRef(self.ir.functions[self.cur_func as usize].block_begin_idx)
    }

    fn blocks(&self) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        let func = &self.ir.functions[self.cur_func as usize];
        Box::new((func.block_begin_idx..func.block_end_idx).map(BlockRef))
    }

    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_> {
        let block_info = &self.ir.blocks[block.0 as usize];
        Box::new((block_info.inst_begin_idx..block_info.inst_end_idx).map(InstRef))
    }

    fn block_succs(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        let block_info = &self.ir.blocks[block.0 as usize];
        Box::new(
            (block_info.succ_begin_idx..block_info.succ_end_idx)
                .map(move |idx| BlockRef(self.ir.value_operands[idx as usize])),
        )
    }

    fn block_name(&self, block: Self::BlockRef) -> &str {
        &self.ir.blocks[block.0 as usize].name
    }

    fn inst_opcode(&self, inst: Self::InstRef) -> &str {
        let value = &self.ir.values[inst.0 as usize];
        if value.value_type == ValueType::Phi {
            "phi"
        } else {
            value.op.info().name
        }
    }

    fn inst_call_target(&self, inst: Self::InstRef) -> Option<CallTarget<'_>> {
        match &self.ir.values[inst.0 as usize].callee {
            Some(Callee::Direct(name)) => Some(CallTarget::Direct(name.as_str())),
            Some(Callee::Indirect(_)) => Some(CallTarget::Indirect),
            None => None,
        }
    }

    fn inst_attachments(&self, inst: Self::InstRef) -> Box<dyn Iterator<Item = MdRef> + '_> {
        let value = &self.ir.values[inst.0 as usize];
        self.attachments(value.attach_begin_idx, value.attach_end_idx)
    }

    fn metadata(&self) -> &MetadataTable {
        &self.ir.metadata
    }
}

/// Trip counts taken from `maxtrip(N)` annotations on loop headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotatedTripCounts;

impl<'ir> TripCountOracle<TestIRAdaptor<'ir>> for AnnotatedTripCounts {
    fn small_constant_max_trip_count(
        &self,
        adaptor: &TestIRAdaptor<'ir>,
        lp: &Loop<BlockRef>,
    ) -> Option<u32> {
        adaptor.block_max_trip(lp.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"
!0 = DIFile(filename: "a.c", directory: "/src")
!1 = DISubprogram(name: "foo", file: !0, line: 3)
!2 = DILocation(line: 4, column: 1, scope: !1)
ext()!
foo(%f) !dbg !1 {
entry:
  %x = !dbg !2
  call @ext
  call %f
  br ^loop
loop: maxtrip(7)
  %p = phi [^entry, %x], [^loop, %p]
  condbr %p, ^loop, ^exit
exit:
  terminate
}
"#;

    #[test]
    fn test_functions_and_attachments() {
        let ir = TestIR::parse(MODULE).unwrap();
        let mut adaptor = TestIRAdaptor::new(&ir);

        assert_eq!(adaptor.funcs().count(), 2);
        assert!(adaptor.func_extern(FuncRef(0)));
        assert_eq!(adaptor.func_link_name(FuncRef(1)), "foo");
        assert_eq!(adaptor.func_attachments(FuncRef(1)).collect::<Vec<_>>(), vec![MdRef(1)]);
        assert!(!adaptor.switch_func(FuncRef(5)));
        assert!(adaptor.switch_func(FuncRef(1)));
        assert_eq!(adaptor.cur_func(), 1);
        assert_eq!(adaptor.block_name(adaptor.entry_block()), "entry");
    }

    #[test]
    fn test_instructions() {
        let ir = TestIR::parse(MODULE).unwrap();
        let mut adaptor = TestIRAdaptor::new(&ir);
        adaptor.switch_func(FuncRef(1));

        let entry = adaptor.entry_block();
        let insts: Vec<_> = adaptor.block_insts(entry).collect();
        assert_eq!(insts.len(), 4);
        assert_eq!(adaptor.value_name(insts[0]), "x");
        assert_eq!(adaptor.inst_attachments(insts[0]).collect::<Vec<_>>(), vec![MdRef(2)]);
        assert_eq!(adaptor.inst_call_target(insts[0]), None);
        assert_eq!(adaptor.inst_call_target(insts[1]), Some(CallTarget::Direct("ext")));
        assert_eq!(adaptor.inst_call_target(insts[2]), Some(CallTarget::Indirect));
        assert_eq!(adaptor.inst_opcode(insts[3]), "br");

        let blocks: Vec<_> = adaptor.blocks().collect();
        let phi = adaptor.block_insts(blocks[1]).next().unwrap();
        assert_eq!(adaptor.inst_opcode(phi), "phi");
        assert_eq!(adaptor.block_max_trip(blocks[1]), Some(7));
        assert_eq!(adaptor.block_succs(blocks[1]).count(), 2);
    }
}
