// This module implements the Analyzer component that computes the block layout and the
// natural loop nest of a function. It performs three steps: 1) Reverse Post-Order (RPO)
// traversal from the entry block, 2) immediate dominators with the iterative
// Cooper-Harvey-Kennedy algorithm over RPO indices, and 3) natural loop discovery: every
// edge n -> h where h dominates n is a back edge, the loop body is collected by walking
// predecessors backwards from the latch until the header, loops sharing a header are
// merged, and nesting follows from header containment. The loops are handed out in
// preorder (outer before inner, siblings by header RPO index), which is the order the
// correlation pass aggregates them in. The analyzer works with any IR through the
// IrAdaptor trait.

use super::adaptor::IrAdaptor;
use super::loops::{Loop, LoopNestProvider};
use core::marker::PhantomData;
use std::collections::{BTreeSet, HashMap, HashSet};

const UNDEFINED: usize = usize::MAX;

/// Computes block layout, dominators and loops for a function.
///
/// The analyzer walks the IR provided by [`IrAdaptor`] in reverse post-order;
/// blocks unreachable from the entry are not part of the layout and belong to
/// no loop.
pub struct Analyzer<A: IrAdaptor> {
    order: Vec<A::BlockRef>,
    block_map: HashMap<A::BlockRef, usize>,
    preds: Vec<Vec<usize>>,
    idom: Vec<usize>,
    loops: Vec<Loop<A::BlockRef>>,
    _marker: PhantomData<A>,
}

impl<A: IrAdaptor> Default for Analyzer<A> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            block_map: HashMap::new(),
            preds: Vec::new(),
            idom: Vec::new(),
            loops: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<A: IrAdaptor> Analyzer<A> {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of blocks in reverse post order.
    pub fn order(&self) -> &[A::BlockRef] {
        &self.order
    }

    /// Loops of the last analyzed function, in preorder.
    pub fn loops(&self) -> &[Loop<A::BlockRef>] {
        &self.loops
    }

    /// Immediate dominator of a block; `None` for the entry and unreachable blocks.
    pub fn idom(&self, block: A::BlockRef) -> Option<A::BlockRef> {
        let idx = *self.block_map.get(&block)?;
        if idx == 0 {
            return None;
        }
        self.order.get(self.idom[idx]).copied()
    }

    /// Whether `a` dominates `b`. Every block dominates itself.
    pub fn dominates(&self, a: A::BlockRef, b: A::BlockRef) -> bool {
        match (self.block_map.get(&a), self.block_map.get(&b)) {
            (Some(&a), Some(&b)) => self.dominates_idx(a, b),
            _ => false,
        }
    }

    /// Switch the adaptor to `func` and analyze it.
    pub fn switch_func(&mut self, adaptor: &mut A, func: A::FuncRef) {
        self.clear();
        if !adaptor.switch_func(func) {
            return;
        }
        self.analyze(adaptor);
    }

    /// Analyze the function currently selected in the adaptor.
    pub fn analyze(&mut self, adaptor: &A) {
        self.clear();
        if adaptor.blocks().next().is_none() {
            return;
        }

        self.compute_rpo(adaptor);
        self.compute_preds(adaptor);
        self.compute_dominators();
        self.compute_loops(adaptor);
    }

    fn clear(&mut self) {
        self.order.clear();
        self.block_map.clear();
        self.preds.clear();
        self.idom.clear();
        self.loops.clear();
    }

    fn compute_rpo(&mut self, adaptor: &A) {
        let entry = adaptor.entry_block();
        let mut post = Vec::new();
        let mut stack = vec![(entry, false)];
        let mut visited = HashSet::new();
        while let Some((block, processed)) = stack.pop() {
            if processed {
                post.push(block);
                continue;
            }
            if !visited.insert(block) {
                continue;
            }
            stack.push((block, true));
            for succ in adaptor.block_succs(block) {
                stack.push((succ, false));
            }
        }
        post.reverse();
        self.order = post;
        for (idx, b) in self.order.iter().enumerate() {
            self.block_map.insert(*b, idx);
        }
    }

    fn compute_preds(&mut self, adaptor: &A) {
        self.preds = vec![Vec::new(); self.order.len()];
        for (idx, block) in self.order.iter().enumerate() {
            for succ in adaptor.block_succs(*block) {
                if let Some(&succ_idx) = self.block_map.get(&succ) {
                    if !self.preds[succ_idx].contains(&idx) {
                        self.preds[succ_idx].push(idx);
                    }
                }
            }
        }
    }

    fn compute_dominators(&mut self) {
        let n = self.order.len();
        self.idom = vec![UNDEFINED; n];
        self.idom[0] = 0;

        let mut changed = true;
        while changed {
            changed = false;
            for b in 1..n {
                let mut new_idom = UNDEFINED;
                for &p in &self.preds[b] {
                    if self.idom[p] == UNDEFINED {
                        continue;
                    }
                    new_idom = if new_idom == UNDEFINED {
                        p
                    } else {
                        self.intersect(p, new_idom)
                    };
                }
                if new_idom != UNDEFINED && self.idom[b] != new_idom {
                    self.idom[b] = new_idom;
                    changed = true;
                }
            }
        }
    }

    fn intersect(&self, mut a: usize, mut b: usize) -> usize {
        while a != b {
            while a > b {
                a = self.idom[a];
            }
            while b > a {
                b = self.idom[b];
            }
        }
        a
    }

    fn dominates_idx(&self, a: usize, mut b: usize) -> bool {
        loop {
            if a == b {
                return true;
            }
            if b == 0 || self.idom[b] == UNDEFINED {
                return false;
            }
            b = self.idom[b];
        }
    }

    fn compute_loops(&mut self, adaptor: &A) {
        // -------- collect bodies per header ---------
        let mut bodies: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        for latch in 0..self.order.len() {
            for succ in adaptor.block_succs(self.order[latch]) {
                let Some(&header) = self.block_map.get(&succ) else {
                    continue;
                };
                if !self.dominates_idx(header, latch) {
                    continue;
                }
                let body = bodies.entry(header).or_insert_with(|| BTreeSet::from([header]));
                let mut worklist = vec![latch];
                while let Some(block) = worklist.pop() {
                    if body.insert(block) {
                        worklist.extend(self.preds[block].iter().copied());
                    }
                }
            }
        }
        if bodies.is_empty() {
            return;
        }

        // -------- nesting ---------
        let mut headers: Vec<usize> = bodies.keys().copied().collect();
        headers.sort_unstable();

        let mut parent_of: HashMap<usize, usize> = HashMap::new();
        for &h in &headers {
            let parent = headers
                .iter()
                .copied()
                .filter(|&other| other != h && bodies[&other].contains(&h))
                .min_by_key(|other| bodies[other].len());
            if let Some(parent) = parent {
                parent_of.insert(h, parent);
            }
        }

        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for &h in &headers {
            match parent_of.get(&h) {
                Some(&p) => children.entry(p).or_default().push(h),
                None => roots.push(h),
            }
        }

        // -------- preorder ---------
        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut stack: Vec<(usize, u32)> = roots.iter().rev().map(|&h| (h, 1)).collect();
        while let Some((h, depth)) = stack.pop() {
            let parent = parent_of.get(&h).and_then(|p| position.get(p)).copied();
            position.insert(h, self.loops.len());
            self.loops.push(Loop {
                header: self.order[h],
                blocks: bodies[&h].iter().map(|&idx| self.order[idx]).collect(),
                depth,
                parent,
            });
            if let Some(kids) = children.get(&h) {
                stack.extend(kids.iter().rev().map(|&k| (k, depth + 1)));
            }
        }
    }
}

impl<A: IrAdaptor> LoopNestProvider<A> for Analyzer<A> {
    fn loops_in_preorder(&mut self, adaptor: &A) -> Vec<Loop<A::BlockRef>> {
        self.analyze(adaptor);
        self.loops.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_ir::{TestIR, TestIRAdaptor};

    fn loop_headers(ir: &TestIR) -> Vec<(String, u32, Vec<String>)> {
        let mut adaptor = TestIRAdaptor::new(ir);
        let mut analyzer = Analyzer::new();
        let func = adaptor.funcs().next().unwrap();
        analyzer.switch_func(&mut adaptor, func);
        analyzer
            .loops()
            .iter()
            .map(|l| {
                (
                    adaptor.block_name(l.header).to_string(),
                    l.depth,
                    l.blocks.iter().map(|b| adaptor.block_name(*b).to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_rpo_and_dominators() {
        let ir = TestIR::parse(
            r#"
diamond() {
entry:
  %c =
  condbr %c, ^left, ^right
left:
  br ^join
right:
  br ^join
join:
  terminate
}
"#,
        )
        .unwrap();

        let mut adaptor = TestIRAdaptor::new(&ir);
        let mut analyzer = Analyzer::new();
        let func = adaptor.funcs().next().unwrap();
        analyzer.switch_func(&mut adaptor, func);

        let names: Vec<_> = analyzer.order().iter().map(|b| adaptor.block_name(*b)).collect();
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], "entry");
        assert_eq!(names[3], "join");

        let entry = analyzer.order()[0];
        let join = analyzer.order()[3];
        assert_eq!(analyzer.idom(join), Some(entry));
        assert!(analyzer.dominates(entry, join));
        assert!(!analyzer.dominates(analyzer.order()[1], join));
        assert!(analyzer.loops().is_empty());
    }

    #[test]
    fn test_nested_loops_in_preorder() {
        let ir = TestIR::parse(
            r#"
nest() {
entry:
  br ^outer
outer:
  %i =
  br ^inner
inner:
  %j =
  condbr %j, ^inner, ^latch
latch:
  condbr %i, ^outer, ^exit
exit:
  terminate
}
"#,
        )
        .unwrap();

        let loops = loop_headers(&ir);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].0, "outer");
        assert_eq!(loops[0].1, 1);
        assert_eq!(loops[0].2, vec!["outer", "inner", "latch"]);
        assert_eq!(loops[1].0, "inner");
        assert_eq!(loops[1].1, 2);
        assert_eq!(loops[1].2, vec!["inner"]);
    }

    #[test]
    fn test_back_edges_to_same_header_merge() {
        let ir = TestIR::parse(
            r#"
twolatch() {
entry:
  br ^head
head:
  %c =
  condbr %c, ^a, ^b
a:
  jump ^head, ^exit
b:
  br ^head
exit:
  terminate
}
"#,
        )
        .unwrap();

        let loops = loop_headers(&ir);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].0, "head");
        assert_eq!(loops[0].2.len(), 3);
        assert!(loops[0].2.contains(&"a".to_string()));
        assert!(loops[0].2.contains(&"b".to_string()));
    }

    #[test]
    fn test_unreachable_blocks_ignored() {
        let ir = TestIR::parse(
            r#"
dead() {
entry:
  terminate
island:
  br ^island
}
"#,
        )
        .unwrap();

        let loops = loop_headers(&ir);
        assert!(loops.is_empty());
    }
}
