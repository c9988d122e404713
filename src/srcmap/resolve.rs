// This module implements the location resolver. An instruction's location may be the
// innermost record of an inlining chain; the authoritative source position is the
// outermost record, reached by following `inlinedAt` links. The walk is iterative and
// bounded by the configured maximum inlining depth so a cyclic chain is reported as
// corrupt debug info instead of looping forever. The file of a location comes from its
// scope: a subprogram or a lexical block, each pointing at a DIFile node.

use std::fmt;

use crate::core::metadata::{join_path, DIFile, DISubprogram, MdRef, MetadataNode, MetadataTable};
use crate::core::{CorrelationError, CorrelationResult};

/// Outermost source position of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub directory: String,
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.filename)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path(), self.line)
    }
}

/// Resolve the metadata node `start` to its outermost source position.
///
/// Returns `Ok(None)` when `start` is not a location node. Chains longer than
/// `max_depth` links, dangling references and scopes of the wrong kind are
/// errors.
pub fn resolve_location(
    md: &MetadataTable,
    start: MdRef,
    max_depth: usize,
) -> CorrelationResult<Option<SourceLocation>> {
    let node = md.get(start).ok_or(CorrelationError::DanglingMetadata {
        node: start,
        missing: start,
    })?;
    let Some(mut loc) = node.as_location() else {
        return Ok(None);
    };

    let mut current = start;
    let mut depth = 0;
    while let Some(parent) = loc.inlined_at {
        depth += 1;
        if depth > max_depth {
            return Err(CorrelationError::InliningChainTooDeep {
                start,
                limit: max_depth,
            });
        }
        let node = md.get(parent).ok_or(CorrelationError::DanglingMetadata {
            node: current,
            missing: parent,
        })?;
        loc = node
            .as_location()
            .ok_or(CorrelationError::UnexpectedMetadataKind {
                node: parent,
                expected: "DILocation",
                found: node.kind_name(),
            })?;
        current = parent;
    }

    let file = scope_file(md, current, loc.scope)?;
    Ok(Some(SourceLocation {
        directory: file.directory.clone(),
        filename: file.filename.clone(),
        line: loc.line,
        column: loc.column,
    }))
}

/// File of a subprogram or lexical block scope.
pub fn scope_file(md: &MetadataTable, user: MdRef, scope: MdRef) -> CorrelationResult<&DIFile> {
    let node = md.get(scope).ok_or(CorrelationError::DanglingMetadata {
        node: user,
        missing: scope,
    })?;
    let file = match node {
        MetadataNode::Subprogram(sp) => sp.file,
        MetadataNode::LexicalBlock(lb) => lb.file,
        other => {
            return Err(CorrelationError::UnexpectedMetadataKind {
                node: scope,
                expected: "scope",
                found: other.kind_name(),
            })
        }
    };
    file_node(md, scope, file)
}

/// The DIFile node `file`, referenced from `user`.
pub fn file_node(md: &MetadataTable, user: MdRef, file: MdRef) -> CorrelationResult<&DIFile> {
    let node = md.get(file).ok_or(CorrelationError::DanglingMetadata {
        node: user,
        missing: file,
    })?;
    node.as_file().ok_or(CorrelationError::UnexpectedMetadataKind {
        node: file,
        expected: "DIFile",
        found: node.kind_name(),
    })
}

/// First subprogram among a function's attachments.
pub fn find_subprogram(
    md: &MetadataTable,
    attachments: impl IntoIterator<Item = MdRef>,
) -> CorrelationResult<Option<(MdRef, &DISubprogram)>> {
    for attachment in attachments {
        let node = md.get(attachment).ok_or(CorrelationError::DanglingMetadata {
            node: attachment,
            missing: attachment,
        })?;
        if let Some(sp) = node.as_subprogram() {
            return Ok(Some((attachment, sp)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{DILexicalBlock, DILocation};

    fn table() -> MetadataTable {
        let mut md = MetadataTable::new();
        md.insert(
            MdRef(0),
            MetadataNode::File(DIFile {
                filename: "a.c".to_string(),
                directory: "/src".to_string(),
            }),
        );
        md.insert(
            MdRef(1),
            MetadataNode::File(DIFile {
                filename: "util.h".to_string(),
                directory: "/inc".to_string(),
            }),
        );
        md.insert(
            MdRef(2),
            MetadataNode::Subprogram(DISubprogram {
                name: "foo".to_string(),
                linkage_name: None,
                file: MdRef(0),
                line: 8,
                retained_nodes: Vec::new(),
            }),
        );
        md.insert(
            MdRef(3),
            MetadataNode::LexicalBlock(DILexicalBlock {
                scope: MdRef(2),
                file: MdRef(1),
                line: 2,
                column: 1,
            }),
        );
        md
    }

    fn location(line: u32, scope: u32, inlined_at: Option<u32>) -> MetadataNode {
        MetadataNode::Location(DILocation {
            line,
            column: 1,
            scope: MdRef(scope),
            inlined_at: inlined_at.map(MdRef),
        })
    }

    #[test]
    fn test_plain_location() {
        let mut md = table();
        md.insert(MdRef(10), location(12, 2, None));
        let loc = resolve_location(&md, MdRef(10), 8).unwrap().unwrap();
        assert_eq!(loc.path(), "/src/a.c");
        assert_eq!(loc.line, 12);
    }

    #[test]
    fn test_inlined_chain_resolves_to_outermost() {
        let mut md = table();
        md.insert(MdRef(10), location(3, 3, Some(11)));
        md.insert(MdRef(11), location(40, 3, Some(12)));
        md.insert(MdRef(12), location(15, 2, None));
        let loc = resolve_location(&md, MdRef(10), 8).unwrap().unwrap();
        assert_eq!(loc.to_string(), "/src/a.c:15");
    }

    #[test]
    fn test_cycle_is_corrupt() {
        let mut md = table();
        md.insert(MdRef(10), location(3, 2, Some(11)));
        md.insert(MdRef(11), location(4, 2, Some(10)));
        let err = resolve_location(&md, MdRef(10), 16).unwrap_err();
        assert!(err.is_corrupt_debug_info());
        assert!(matches!(err, CorrelationError::InliningChainTooDeep { limit: 16, .. }));
    }

    #[test]
    fn test_non_location_attachment_is_absent() {
        let md = table();
        assert_eq!(resolve_location(&md, MdRef(2), 8).unwrap(), None);
    }

    #[test]
    fn test_bad_scope_kind() {
        let mut md = table();
        md.insert(MdRef(10), location(3, 0, None));
        let err = resolve_location(&md, MdRef(10), 8).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::UnexpectedMetadataKind {
                node: MdRef(0),
                expected: "scope",
                found: "DIFile",
            }
        );
    }

    #[test]
    fn test_lexical_block_file() {
        let mut md = table();
        md.insert(MdRef(10), location(5, 3, None));
        let loc = resolve_location(&md, MdRef(10), 8).unwrap().unwrap();
        assert_eq!(loc.path(), "/inc/util.h");
    }
}
