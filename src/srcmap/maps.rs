// This module defines SourceMaps, the output of the correlation pass. It owns every derived
// map of a module run: block, loop and function ranges (the range carries the path, so
// the path maps are views of the same records), the begin-line candidates per demangled
// function name, the estimated maximum trip counts and the loop labels, both keyed by
// LoopKey. Besides the keyed lookups it records discovery order (functions in module
// order, their blocks in layout order, loops in preorder) so every report and every scan
// over the loop table is deterministic. The pass clears the maps at the start of a run;
// nothing outside the srcmap module mutates them.

use std::collections::BTreeMap;
use std::hash::Hash;

use hashbrown::HashMap;

use super::range::{LoopKey, SourceRange};
use crate::core::{CorrelationError, CorrelationResult, MdRef};

/// Range of one basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub name: String,
    pub range: SourceRange,
}

/// One analyzed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord<F, B> {
    pub func: F,
    pub link_name: String,
    pub demangled: String,
    /// Blocks in layout order.
    pub blocks: Vec<B>,
    pub range: SourceRange,
    pub subprogram: Option<MdRef>,
}

/// One discovered loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopRecord<F, B> {
    pub func: F,
    pub header: B,
    pub key: LoopKey,
    /// Nesting depth, 1 for outermost loops.
    pub depth: u32,
    /// Index of the enclosing loop in [`SourceMaps::loops`].
    pub parent: Option<usize>,
    /// Member blocks, header first.
    pub blocks: Vec<B>,
    pub range: SourceRange,
}

/// Every map produced by one run of the correlation pass.
#[derive(Debug, Clone)]
pub struct SourceMaps<F, B> {
    functions: Vec<FunctionRecord<F, B>>,
    function_index: HashMap<F, usize>,
    blocks: HashMap<B, BlockRecord>,
    loops: Vec<LoopRecord<F, B>>,
    loop_index: HashMap<B, usize>,
    begin_lines: BTreeMap<String, Vec<u32>>,
    trip_counts: BTreeMap<LoopKey, Option<u32>>,
    labels: BTreeMap<LoopKey, String>,
}

impl<F, B> Default for SourceMaps<F, B> {
    fn default() -> Self {
        Self {
            functions: Vec::new(),
            function_index: HashMap::new(),
            blocks: HashMap::new(),
            loops: Vec::new(),
            loop_index: HashMap::new(),
            begin_lines: BTreeMap::new(),
            trip_counts: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }
}

impl<F, B> SourceMaps<F, B>
where
    F: Copy + Eq + Hash,
    B: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
        self.function_index.clear();
        self.blocks.clear();
        self.loops.clear();
        self.loop_index.clear();
        self.begin_lines.clear();
        self.trip_counts.clear();
        self.labels.clear();
    }

    // -------- block level ---------

    pub(crate) fn insert_block(&mut self, block: B, name: &str, range: SourceRange) {
        self.blocks.insert(
            block,
            BlockRecord {
                name: name.to_string(),
                range,
            },
        );
    }

    pub fn block(&self, block: B) -> Option<&BlockRecord> {
        self.blocks.get(&block)
    }

    pub fn block_range(&self, block: B) -> Option<&SourceRange> {
        self.blocks.get(&block).map(|b| &b.range)
    }

    pub fn block_path(&self, block: B) -> Option<&str> {
        self.block_range(block).map(|r| r.path.as_str())
    }

    // -------- loop level ---------

    /// Register a loop; returns its index in discovery order.
    pub(crate) fn insert_loop(&mut self, record: LoopRecord<F, B>) -> usize {
        let idx = self.loops.len();
        self.loop_index.insert(record.header, idx);
        self.loops.push(record);
        idx
    }

    /// All loops of the module in discovery order (preorder per function).
    pub fn loops(&self) -> &[LoopRecord<F, B>] {
        &self.loops
    }

    pub fn loop_by_header(&self, header: B) -> Option<&LoopRecord<F, B>> {
        self.loop_index.get(&header).map(|&idx| &self.loops[idx])
    }

    pub fn loop_by_key(&self, key: &LoopKey) -> Option<&LoopRecord<F, B>> {
        self.loops.iter().find(|l| &l.key == key)
    }

    pub fn loop_range(&self, header: B) -> Option<&SourceRange> {
        self.loop_by_header(header).map(|l| &l.range)
    }

    pub fn loop_path(&self, header: B) -> Option<&str> {
        self.loop_range(header).map(|r| r.path.as_str())
    }

    pub(crate) fn set_trip_count(&mut self, key: LoopKey, trip: Option<u32>) {
        self.trip_counts.insert(key, trip);
    }

    /// Small constant maximum trip count of the loop, when known.
    pub fn trip_count(&self, key: &LoopKey) -> Option<u32> {
        self.trip_counts.get(key).copied().flatten()
    }

    pub fn trip_counts(&self) -> impl Iterator<Item = (&LoopKey, Option<u32>)> {
        self.trip_counts.iter().map(|(k, v)| (k, *v))
    }

    /// Attach `name` to the loop unless it already carries a label. Returns
    /// the label already present on conflict.
    pub(crate) fn set_label(&mut self, key: LoopKey, name: &str) -> Result<(), &str> {
        use std::collections::btree_map::Entry;
        match self.labels.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(name.to_string());
                Ok(())
            }
            Entry::Occupied(slot) => Err(slot.into_mut().as_str()),
        }
    }

    pub fn label(&self, key: &LoopKey) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn label_for_header(&self, header: B) -> Option<&str> {
        self.loop_by_header(header).and_then(|l| self.label(&l.key))
    }

    pub fn labels(&self) -> impl Iterator<Item = (&LoopKey, &str)> {
        self.labels.iter().map(|(k, v)| (k, v.as_str()))
    }

    // -------- function level ---------

    pub(crate) fn insert_function(&mut self, record: FunctionRecord<F, B>) {
        self.function_index.insert(record.func, self.functions.len());
        self.functions.push(record);
    }

    /// Analyzed functions in module order.
    pub fn functions(&self) -> &[FunctionRecord<F, B>] {
        &self.functions
    }

    pub fn function(&self, func: F) -> Option<&FunctionRecord<F, B>> {
        self.function_index.get(&func).map(|&idx| &self.functions[idx])
    }

    pub fn function_by_name(&self, link_name: &str) -> CorrelationResult<&FunctionRecord<F, B>> {
        self.functions
            .iter()
            .find(|f| f.link_name == link_name)
            .ok_or_else(|| CorrelationError::FunctionNotFound {
                name: link_name.to_string(),
            })
    }

    pub fn function_range(&self, func: F) -> Option<&SourceRange> {
        self.function(func).map(|f| &f.range)
    }

    pub fn function_path(&self, func: F) -> Option<&str> {
        self.function_range(func).map(|r| r.path.as_str())
    }

    /// Loops of one function in preorder.
    pub fn function_loops(&self, func: F) -> impl Iterator<Item = &LoopRecord<F, B>> {
        self.loops.iter().filter(move |l| l.func == func)
    }

    pub(crate) fn push_begin_line(&mut self, demangled: &str, line: u32) {
        self.begin_lines
            .entry(demangled.to_string())
            .or_default()
            .push(line);
    }

    /// Begin-line candidates of a function, by demangled name, in the order
    /// they were found: loop begins in preorder, the subprogram line, then the
    /// function begin.
    ///
    /// Loops and functions without any located instruction contribute no
    /// candidate; their `u32::MAX` begin is left out. The subprogram line is
    /// always present, even when it is 0.
    pub fn begin_lines(&self, demangled: &str) -> Option<&[u32]> {
        self.begin_lines.get(demangled).map(Vec::as_slice)
    }

    pub fn all_begin_lines(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.begin_lines
            .iter()
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }
}
