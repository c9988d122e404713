// This module implements the loop-label reconciler. User-authored loop labels survive
// compilation as DILabel nodes retained by the function's subprogram. Once every function
// has been aggregated, each label is matched against the module-wide loop table: a loop
// matches when its begin line equals the label line and its path equals the subprogram's
// file. Several matching loops are resolved by the configured tie-break, and a loop that
// already carries a label keeps it. Unmatched labels are not an error.

use log::{debug, warn};

use super::maps::{LoopRecord, SourceMaps};
use super::resolve::{file_node, find_subprogram};
use crate::core::{
    AnalysisSession, CorrelationConfig, CorrelationError, CorrelationResult, IrAdaptor,
    LabelTieBreak,
};

/// Attach the retained labels of every function to discovered loops.
pub(crate) fn reconcile_labels<A: IrAdaptor>(
    adaptor: &A,
    config: &CorrelationConfig,
    maps: &mut SourceMaps<A::FuncRef, A::BlockRef>,
    session: &AnalysisSession,
) -> CorrelationResult<()> {
    let md = adaptor.metadata();

    for func in adaptor.funcs() {
        let Some((sp_md, sp)) = find_subprogram(md, adaptor.func_attachments(func))? else {
            continue;
        };
        let path = file_node(md, sp_md, sp.file)?.path();

        for &retained in &sp.retained_nodes {
            let node = md.get(retained).ok_or(CorrelationError::DanglingMetadata {
                node: sp_md,
                missing: retained,
            })?;
            let Some(label) = node.as_label() else {
                continue;
            };

            let Some(idx) = select_loop(maps.loops(), label.line, &path, config.label_tie_break)
            else {
                debug!(
                    "label {} at {}:{} matches no loop",
                    label.name, path, label.line
                );
                session.record_label_unmatched();
                continue;
            };

            let key = maps.loops()[idx].key.clone();
            match maps.set_label(key.clone(), &label.name) {
                Ok(()) => {
                    debug!("label {} -> loop {}", label.name, key);
                    session.record_label_matched();
                }
                Err(existing) => {
                    warn!(
                        "loop {} is already labelled {}, dropping label {}",
                        key, existing, label.name
                    );
                    session.record_label_conflict();
                }
            }
        }
    }
    Ok(())
}

/// Index of the loop a label at `path:line` belongs to.
fn select_loop<F, B>(
    loops: &[LoopRecord<F, B>],
    line: u32,
    path: &str,
    tie_break: LabelTieBreak,
) -> Option<usize> {
    let mut candidates = loops
        .iter()
        .enumerate()
        .filter(|(_, l)| l.range.is_resolved() && l.range.begin_line == line && l.range.path == path);

    match tie_break {
        LabelTieBreak::FirstDiscovered => candidates.next().map(|(idx, _)| idx),
        LabelTieBreak::Innermost => candidates
            .fold(None, |best: Option<(usize, u32)>, (idx, l)| match best {
                Some((_, depth)) if depth >= l.depth => best,
                _ => Some((idx, l.depth)),
            })
            .map(|(idx, _)| idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srcmap::range::{LoopKey, SourceRange};

    fn record(header: u32, depth: u32, begin: u32) -> LoopRecord<u32, u32> {
        LoopRecord {
            func: 0,
            header,
            key: LoopKey::new("foo", format!("bb{}", header)),
            depth,
            parent: None,
            blocks: vec![header],
            range: SourceRange {
                path: "/src/a.c".to_string(),
                begin_line: begin,
                end_line: begin + 5,
            },
        }
    }

    #[test]
    fn test_innermost_wins() {
        let loops = vec![record(1, 1, 15), record(2, 2, 15), record(3, 2, 15)];
        assert_eq!(
            select_loop(&loops, 15, "/src/a.c", LabelTieBreak::Innermost),
            Some(1)
        );
        assert_eq!(
            select_loop(&loops, 15, "/src/a.c", LabelTieBreak::FirstDiscovered),
            Some(0)
        );
    }

    #[test]
    fn test_path_and_line_must_match() {
        let loops = vec![record(1, 1, 15)];
        assert_eq!(select_loop(&loops, 16, "/src/a.c", LabelTieBreak::Innermost), None);
        assert_eq!(select_loop(&loops, 15, "/src/b.c", LabelTieBreak::Innermost), None);
    }
}
