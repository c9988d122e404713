//! Block range aggregation.

use log::trace;

use super::range::SourceRange;
use super::resolve::resolve_location;
use crate::core::{
    AnalysisSession, CallTarget, CorrelationConfig, CorrelationResult, IntrinsicPolicy, IrAdaptor,
};

/// Compute the source range of one block of the current function.
///
/// The first resolved path wins. Every resolved line extends the end, lines
/// above zero may lower the begin. Calls to intrinsics still provide the path
/// but no line; with [`IntrinsicPolicy::TruncateBlock`] nothing after them
/// counts either.
pub(crate) fn aggregate_block<A: IrAdaptor>(
    adaptor: &A,
    block: A::BlockRef,
    config: &CorrelationConfig,
    session: &AnalysisSession,
) -> CorrelationResult<SourceRange> {
    let md = adaptor.metadata();
    let mut range = SourceRange::for_block();

    for inst in adaptor.block_insts(block) {
        let intrinsic = match adaptor.inst_call_target(inst) {
            Some(CallTarget::Direct(callee)) => config.is_intrinsic(callee),
            Some(CallTarget::Indirect) => {
                session.record_indirect_call();
                false
            }
            None => false,
        };

        let mut located = false;
        let mut truncate = false;
        for attachment in adaptor.inst_attachments(inst) {
            let Some(loc) = resolve_location(md, attachment, config.max_inline_depth)? else {
                continue;
            };
            located = true;
            range.record_path(&loc.path());

            if intrinsic {
                session.record_intrinsic_skipped();
                truncate = config.intrinsic_policy == IntrinsicPolicy::TruncateBlock;
                trace!(
                    "{}: skipping intrinsic call at {}",
                    adaptor.block_name(block),
                    loc
                );
                break;
            }
            range.record_line(loc.line);
        }
        session.record_instruction(located);

        if truncate {
            break;
        }
    }

    Ok(range)
}
