//! Test IR (TIR) parser and data structures for testing the correlation pass.
//!
//! This module provides a simple IR format with LLVM-style debug metadata for
//! writing correlation tests without depending on LLVM. The format is designed
//! to be:
//! - Human-readable and writable
//! - Easy to parse
//! - Rich enough to express inlining chains, subprograms and loop labels
//!
//! # TIR Format
//!
//! ```text
//! ; Comments start with semicolon
//! !0 = DIFile(filename: "a.c", directory: "/src")
//! !1 = distinct DISubprogram(name: "foo", file: !0, line: 8, retainedNodes: [!9])
//! !2 = DILocation(line: 10, column: 3, scope: !1)
//! !9 = DILabel(scope: !1, name: "L1", file: !0, line: 13)
//! ext(%p)!
//! foo(%n) !dbg !1 {
//! entry:
//!     %a = add %n, %n !dbg !2
//!     br ^loop
//! loop: maxtrip(16)
//!     %i = phi [^entry, %a], [^loop, %i]
//!     call @llvm.dbg.value, %i !dbg !2
//!     call %n
//!     condbr %i, ^loop, ^exit
//! exit:
//!     terminate
//! }
//! ```

use crate::core::{MdRef, MetadataNode, MetadataTable};

pub mod adaptor;
pub mod check;
pub mod parser;

pub use adaptor::{AnnotatedTripCounts, TestIRAdaptor};
pub use check::{CheckDirective, TestRunner, TestSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct TestIR {
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub values: Vec<Value>,
    pub value_operands: Vec<u32>,
    /// Metadata attachments of functions and values, flattened.
    pub attachments: Vec<MdRef>,
    pub metadata: MetadataTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub declaration: bool,
    pub block_begin_idx: u32,
    pub block_end_idx: u32,
    pub arg_begin_idx: u32,
    pub arg_end_idx: u32,
    pub attach_begin_idx: u32,
    pub attach_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub succ_begin_idx: u32,
    pub succ_end_idx: u32,
    pub inst_begin_idx: u32,
    pub phi_end_idx: u32,
    pub inst_end_idx: u32,
    /// `maxtrip(N)` annotation of a loop header.
    pub max_trip: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub name: String,
    pub value_type: ValueType,
    pub op: Operation,
    /// For call only: the callee.
    pub callee: Option<Callee>,
    /// Number of value operands
    pub op_count: u32,
    /// Operand indices into value_operands array
    pub op_begin_idx: u32,
    pub op_end_idx: u32,
    pub attach_begin_idx: u32,
    pub attach_end_idx: u32,
}

/// Target of a `call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `call @name`
    Direct(String),
    /// `call %value`
    Indirect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Normal,
    Arg,
    Phi,
    Terminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    None,
    Any,
    Add,
    Sub,
    Alloca,
    Terminate,
    Ret,
    Br,
    CondBr,
    Jump,
    Call,
}

impl Operation {
    pub const fn info(self) -> OpInfo {
        use Operation::*;
        match self {
            None => OpInfo { name: "<none>", is_terminator: false, is_def: false, op_count: 0, succ_count: 0, imm_count: 0 },
            Any => OpInfo { name: "any", is_terminator: false, is_def: true, op_count: !0, succ_count: 0, imm_count: 0 },
            Add => OpInfo { name: "add", is_terminator: false, is_def: true, op_count: 2, succ_count: 0, imm_count: 0 },
            Sub => OpInfo { name: "sub", is_terminator: false, is_def: true, op_count: 2, succ_count: 0, imm_count: 0 },
            Alloca => OpInfo { name: "alloca", is_terminator: false, is_def: true, op_count: 0, succ_count: 0, imm_count: 2 },
            Terminate => OpInfo { name: "terminate", is_terminator: true, is_def: false, op_count: 0, succ_count: 0, imm_count: 0 },
            Ret => OpInfo { name: "ret", is_terminator: true, is_def: false, op_count: 1, succ_count: 0, imm_count: 0 },
            Br => OpInfo { name: "br", is_terminator: true, is_def: false, op_count: 0, succ_count: 1, imm_count: 0 },
            CondBr => OpInfo { name: "condbr", is_terminator: true, is_def: false, op_count: 1, succ_count: 2, imm_count: 0 },
            Jump => OpInfo { name: "jump", is_terminator: true, is_def: false, op_count: 0, succ_count: !0, imm_count: 0 },
            Call => OpInfo { name: "call", is_terminator: false, is_def: true, op_count: !0, succ_count: 0, imm_count: 0 },
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Operation::Add),
            "sub" => Some(Operation::Sub),
            "alloca" => Some(Operation::Alloca),
            "terminate" => Some(Operation::Terminate),
            "ret" => Some(Operation::Ret),
            "br" => Some(Operation::Br),
            "condbr" => Some(Operation::CondBr),
            "jump" => Some(Operation::Jump),
            "call" => Some(Operation::Call),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    pub name: &'static str,
    pub is_terminator: bool,
    pub is_def: bool,
    pub op_count: u32,
    pub succ_count: u32,
    pub imm_count: u32,
}

impl TestIR {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            blocks: Vec::new(),
            values: Vec::new(),
            value_operands: Vec::new(),
            attachments: Vec::new(),
            metadata: MetadataTable::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        parser::parse_ir(text)
    }

    fn attachments_of(&self, begin: u32, end: u32) -> &[MdRef] {
        &self.attachments[begin as usize..end as usize]
    }

    fn push_attachments(&self, output: &mut String, begin: u32, end: u32) {
        for md in self.attachments_of(begin, end) {
            output.push_str(&format!("\nAttach {}", md));
        }
    }

    pub fn print(&self) -> String {
        let mut output = String::new();
        output.push_str("Printing IR\n");

        for (md, node) in self.metadata.iter() {
            output.push_str(&format!("Metadata {} = {}\n", md, describe_node(node)));
        }

        for func in &self.functions {
            if func.declaration {
                output.push_str(&format!("Extern function {}", func.name));
            } else {
                output.push_str(&format!("Function {}", func.name));
            }
            self.push_attachments(&mut output, func.attach_begin_idx, func.attach_end_idx);

            for arg_idx in func.arg_begin_idx..func.arg_end_idx {
                let arg = &self.values[arg_idx as usize];
                output.push_str(&format!("\nArgument {}", arg.name));
            }

            for block_idx in func.block_begin_idx..func.block_end_idx {
                let block = &self.blocks[block_idx as usize];
                output.push_str(&format!("\nBlock {}", block.name));
                if let Some(trip) = block.max_trip {
                    output.push_str(&format!("\nMaxTrip {}", trip));
                }

                for succ_idx in block.succ_begin_idx..block.succ_end_idx {
                    let succ_block_idx = self.value_operands[succ_idx as usize];
                    let succ_block = &self.blocks[succ_block_idx as usize];
                    output.push_str(&format!("\nSucc {}", succ_block.name));
                }

                for inst_idx in block.inst_begin_idx..block.phi_end_idx {
                    let phi = &self.values[inst_idx as usize];
                    output.push_str(&format!("\nPHI {}", phi.name));

                    let incoming_count = phi.op_count;
                    for i in 0..incoming_count {
                        let val_idx = self.value_operands[(phi.op_begin_idx + i) as usize];
                        let block_idx =
                            self.value_operands[(phi.op_begin_idx + incoming_count + i) as usize];
                        let val = &self.values[val_idx as usize];
                        let from_block = &self.blocks[block_idx as usize];
                        output.push_str(&format!("\n{} from {}", val.name, from_block.name));
                    }
                    self.push_attachments(&mut output, phi.attach_begin_idx, phi.attach_end_idx);
                }

                for inst_idx in block.phi_end_idx..block.inst_end_idx {
                    let inst = &self.values[inst_idx as usize];
                    let info = inst.op.info();

                    if info.is_def && !inst.name.is_empty() {
                        output.push_str(&format!("\nValue {} ({})", inst.name, info.name));
                    } else {
                        output.push_str(&format!("\nValue ({})", info.name));
                    }

                    match &inst.callee {
                        Some(Callee::Direct(name)) => {
                            output.push_str(&format!("\nTarget @{}", name));
                        }
                        Some(Callee::Indirect(name)) => {
                            output.push_str(&format!("\nTarget indirect %{}", name));
                        }
                        None => {}
                    }

                    for op_idx in 0..inst.op_count {
                        let operand_idx =
                            self.value_operands[(inst.op_begin_idx + op_idx) as usize];
                        let operand = &self.values[operand_idx as usize];
                        output.push_str(&format!("\nOp {}", operand.name));
                    }

                    let block_op_start = inst.op_begin_idx + inst.op_count;
                    let block_op_end = if info.succ_count == !0 {
                        inst.op_end_idx
                    } else {
                        block_op_start + info.succ_count
                    };
                    for i in block_op_start..block_op_end {
                        let block_idx = self.value_operands[i as usize];
                        let target_block = &self.blocks[block_idx as usize];
                        output.push_str(&format!("\nOp ^{}", target_block.name));
                    }

                    for i in 0..info.imm_count {
                        let imm = self.value_operands[(block_op_end + i) as usize];
                        output.push_str(&format!("\nOp ${}", imm));
                    }

                    self.push_attachments(&mut output, inst.attach_begin_idx, inst.attach_end_idx);
                }
            }
            output.push('\n');
        }

        output
    }
}

fn describe_node(node: &MetadataNode) -> String {
    match node {
        MetadataNode::File(file) => format!("DIFile {}", file.path()),
        MetadataNode::Subprogram(sp) => {
            format!("DISubprogram {} line {} file {}", sp.name, sp.line, sp.file)
        }
        MetadataNode::LexicalBlock(lb) => {
            format!("DILexicalBlock line {} scope {}", lb.line, lb.scope)
        }
        MetadataNode::Location(loc) => match loc.inlined_at {
            Some(parent) => format!(
                "DILocation line {} scope {} inlinedAt {}",
                loc.line, loc.scope, parent
            ),
            None => format!("DILocation line {} scope {}", loc.line, loc.scope),
        },
        MetadataNode::Label(label) => format!("DILabel {} line {}", label.name, label.line),
        MetadataNode::Other { tag } => format!("opaque {}", tag),
    }
}

impl Default for TestIR {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TestIR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.print())
    }
}
