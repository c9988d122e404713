//! Instruction tracer.
//!
//! Resolves the locations of every instruction of a function. The result is
//! diagnostic only: the pass emits it at `trace` level and the report layer
//! prints it on request, but nothing is aggregated from it.

use std::fmt;

use log::trace;

use super::resolve::{resolve_location, SourceLocation};
use crate::core::{CorrelationConfig, CorrelationResult, IrAdaptor};

/// Resolved locations of one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTrace {
    pub block: String,
    pub opcode: String,
    pub locations: Vec<SourceLocation>,
}

impl fmt::Display for InstructionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.block, self.opcode)?;
        if self.locations.is_empty() {
            return write!(f, " ==> <no location>");
        }
        for loc in &self.locations {
            write!(f, " ==> {}", loc)?;
        }
        Ok(())
    }
}

/// Trace every instruction of the function currently selected in `adaptor`.
pub fn trace_function<A: IrAdaptor>(
    adaptor: &A,
    max_inline_depth: usize,
) -> CorrelationResult<Vec<InstructionTrace>> {
    let md = adaptor.metadata();
    let mut traces = Vec::new();
    for block in adaptor.blocks() {
        for inst in adaptor.block_insts(block) {
            let mut locations = Vec::new();
            for attachment in adaptor.inst_attachments(inst) {
                if let Some(loc) = resolve_location(md, attachment, max_inline_depth)? {
                    locations.push(loc);
                }
            }
            let entry = InstructionTrace {
                block: adaptor.block_name(block).to_string(),
                opcode: adaptor.inst_opcode(inst).to_string(),
                locations,
            };
            trace!("{}", entry);
            traces.push(entry);
        }
    }
    Ok(traces)
}

/// Trace all defined functions of the module into a text report.
///
/// Intrinsic definitions are left out when the pass would skip them.
pub fn render_trace<A: IrAdaptor>(
    adaptor: &mut A,
    config: &CorrelationConfig,
) -> CorrelationResult<String> {
    let funcs: Vec<_> = adaptor.funcs().collect();
    let mut lines = Vec::new();
    for func in funcs {
        if adaptor.func_extern(func) {
            continue;
        }
        if config.skip_intrinsic_functions && config.is_intrinsic(adaptor.func_link_name(func)) {
            continue;
        }
        if !adaptor.switch_func(func) {
            continue;
        }
        lines.push(format!("Trace for {}", adaptor.func_link_name(func)));
        for entry in trace_function(adaptor, config.max_inline_depth)? {
            lines.push(format!("  {}", entry));
        }
        lines.push("End trace".to_string());
    }
    Ok(lines.join("\n"))
}
