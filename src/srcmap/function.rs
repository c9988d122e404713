//! Function range aggregation.

use log::debug;

use super::maps::{FunctionRecord, SourceMaps};
use super::range::SourceRange;
use super::resolve::{file_node, find_subprogram};
use crate::core::{CorrelationResult, IrAdaptor};

/// Merge the block ranges of `func` and cross-check them with its subprogram.
///
/// Begin-line candidates are appended in a fixed order: the subprogram line
/// (even when unknown), then the final begin line.
pub(crate) fn aggregate_function<A: IrAdaptor>(
    adaptor: &A,
    func: A::FuncRef,
    link_name: String,
    demangled: String,
    blocks: Vec<A::BlockRef>,
    maps: &mut SourceMaps<A::FuncRef, A::BlockRef>,
) -> CorrelationResult<()> {
    let md = adaptor.metadata();

    let mut range = SourceRange::for_scope();
    for block in &blocks {
        if let Some(member) = maps.block_range(*block) {
            range.merge(member);
        }
    }

    let mut subprogram = None;
    if let Some((sp_md, sp)) = find_subprogram(md, adaptor.func_attachments(func))? {
        let file = file_node(md, sp_md, sp.file)?;
        debug!(
            "function {}: subprogram {} declared at {}:{}",
            link_name,
            sp.name,
            file.path(),
            sp.line
        );
        maps.push_begin_line(&demangled, sp.line);
        range.lower_begin(sp.line);
        range.record_path(&file.path());
        subprogram = Some(sp_md);
    }

    if range.is_resolved() {
        maps.push_begin_line(&demangled, range.begin_line);
    }
    debug!("function {}: {}", link_name, range);

    maps.insert_function(FunctionRecord {
        func,
        link_name,
        demangled,
        blocks,
        range,
        subprogram,
    });
    Ok(())
}
