//! Loop range aggregation.

use log::debug;

use super::maps::{LoopRecord, SourceMaps};
use super::range::{LoopKey, SourceRange};
use crate::core::{AnalysisSession, IrAdaptor, Loop, TripCountOracle};

/// Merge member block ranges of every loop of the current function.
///
/// `nest` must be in preorder; parent indices are rebased onto the module-wide
/// loop table. Block ranges of the function must already be recorded.
pub(crate) fn aggregate_loops<A: IrAdaptor>(
    adaptor: &A,
    func: A::FuncRef,
    link_name: &str,
    demangled: &str,
    nest: &[Loop<A::BlockRef>],
    trips: &dyn TripCountOracle<A>,
    maps: &mut SourceMaps<A::FuncRef, A::BlockRef>,
    session: &AnalysisSession,
) {
    let base = maps.loops().len();

    for lp in nest {
        let mut range = SourceRange::for_scope();
        for block in &lp.blocks {
            if let Some(member) = maps.block_range(*block) {
                range.merge(member);
            }
        }

        let key = LoopKey::new(link_name, adaptor.block_name(lp.header));
        let trip = trips.small_constant_max_trip_count(adaptor, lp);
        debug!(
            "loop {} (depth {}, {} blocks): {} max trip {:?}",
            key,
            lp.depth,
            lp.blocks.len(),
            range,
            trip
        );

        if range.is_resolved() {
            maps.push_begin_line(demangled, range.begin_line);
        }
        maps.set_trip_count(key.clone(), trip);
        maps.insert_loop(LoopRecord {
            func,
            header: lp.header,
            key,
            depth: lp.depth,
            parent: lp.parent.map(|p| base + p),
            blocks: lp.blocks.clone(),
            range,
        });
        session.record_loop();
    }
}
