// This module defines the debug metadata model the correlation pass inspects. Metadata
// nodes live in a MetadataTable keyed by MdRef (the `!N` number of the textual form) and
// are a closed tagged enum: files, subprograms, lexical blocks, locations and labels each
// expose only the fields relevant to their kind, and any other node is kept as an opaque
// tag. Locations point at a scope (subprogram or lexical block) that provides the source
// file, and optionally at the location they were inlined into. Subprograms carry the
// retained nodes where loop labels are recorded.

//! Debug metadata nodes.
//!
//! The layout mirrors LLVM's `DI*` node family closely enough that an adaptor over a
//! real LLVM module can fill a [`MetadataTable`] one node at a time.

use std::collections::BTreeMap;
use std::fmt;

/// Reference to a metadata node (`!N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MdRef(pub u32);

impl fmt::Display for MdRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// A source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DIFile {
    pub filename: String,
    pub directory: String,
}

impl DIFile {
    /// Full path of the file: `directory/filename`, or just the filename when no
    /// directory was recorded.
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.filename)
    }
}

/// Debug description of a function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DISubprogram {
    pub name: String,
    pub linkage_name: Option<String>,
    pub file: MdRef,
    /// Declaration line. `0` when unknown.
    pub line: u32,
    /// Auxiliary nodes kept alive by the subprogram (labels, variables).
    pub retained_nodes: Vec<MdRef>,
}

/// A nested lexical scope inside a subprogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DILexicalBlock {
    pub scope: MdRef,
    pub file: MdRef,
    pub line: u32,
    pub column: u32,
}

/// Source position of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DILocation {
    pub line: u32,
    pub column: u32,
    pub scope: MdRef,
    /// Call site this location was inlined into.
    pub inlined_at: Option<MdRef>,
}

/// A user-authored label, such as a named loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DILabel {
    pub scope: Option<MdRef>,
    pub name: String,
    pub file: MdRef,
    pub line: u32,
}

/// One metadata node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataNode {
    File(DIFile),
    Subprogram(DISubprogram),
    LexicalBlock(DILexicalBlock),
    Location(DILocation),
    Label(DILabel),
    /// Any node kind the pass does not interpret (loop properties, types, ...).
    Other { tag: String },
}

impl MetadataNode {
    /// Kind name as written in the textual form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MetadataNode::File(_) => "DIFile",
            MetadataNode::Subprogram(_) => "DISubprogram",
            MetadataNode::LexicalBlock(_) => "DILexicalBlock",
            MetadataNode::Location(_) => "DILocation",
            MetadataNode::Label(_) => "DILabel",
            MetadataNode::Other { .. } => "opaque node",
        }
    }

    pub fn as_location(&self) -> Option<&DILocation> {
        match self {
            MetadataNode::Location(loc) => Some(loc),
            _ => None,
        }
    }

    pub fn as_subprogram(&self) -> Option<&DISubprogram> {
        match self {
            MetadataNode::Subprogram(sp) => Some(sp),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&DILabel> {
        match self {
            MetadataNode::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&DIFile> {
        match self {
            MetadataNode::File(file) => Some(file),
            _ => None,
        }
    }

    /// Every node this node refers to.
    pub fn references(&self) -> Vec<MdRef> {
        match self {
            MetadataNode::File(_) | MetadataNode::Other { .. } => Vec::new(),
            MetadataNode::Subprogram(sp) => {
                let mut refs = vec![sp.file];
                refs.extend(sp.retained_nodes.iter().copied());
                refs
            }
            MetadataNode::LexicalBlock(lb) => vec![lb.scope, lb.file],
            MetadataNode::Location(loc) => {
                let mut refs = vec![loc.scope];
                refs.extend(loc.inlined_at);
                refs
            }
            MetadataNode::Label(label) => {
                let mut refs = vec![label.file];
                refs.extend(label.scope);
                refs
            }
        }
    }
}

/// All metadata nodes of a module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    nodes: BTreeMap<MdRef, MetadataNode>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning the node previously stored under `md`.
    pub fn insert(&mut self, md: MdRef, node: MetadataNode) -> Option<MetadataNode> {
        self.nodes.insert(md, node)
    }

    pub fn get(&self, md: MdRef) -> Option<&MetadataNode> {
        self.nodes.get(&md)
    }

    pub fn contains(&self, md: MdRef) -> bool {
        self.nodes.contains_key(&md)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in ascending `!N` order.
    pub fn iter(&self) -> impl Iterator<Item = (MdRef, &MetadataNode)> {
        self.nodes.iter().map(|(md, node)| (*md, node))
    }

    /// First reference in the table that points at a missing node, as
    /// `(referencing node, missing node)`.
    pub fn find_dangling(&self) -> Option<(MdRef, MdRef)> {
        self.iter().find_map(|(md, node)| {
            node.references()
                .into_iter()
                .find(|r| !self.contains(*r))
                .map(|missing| (md, missing))
        })
    }
}

pub(crate) fn join_path(directory: &str, filename: &str) -> String {
    if directory.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", directory, filename)
    }
}
