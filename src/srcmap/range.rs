//! Source line ranges and loop keys.

use std::fmt;

/// Begin line of a range no instruction contributed to.
pub const UNRESOLVED_BEGIN: u32 = u32::MAX;

/// End line of a block range no instruction contributed to.
pub const BLOCK_END_SENTINEL: u32 = 0;

/// End line of a loop or function range before any block is merged in.
pub const SCOPE_END_SENTINEL: u32 = 1;

/// A contiguous range of source lines in one file.
///
/// Ranges start in a sentinel state (`begin_line == UNRESOLVED_BEGIN`) and
/// only become meaningful once a located instruction contributes to them;
/// [`is_resolved`](SourceRange::is_resolved) tells the two apart.
///
/// A function range whose begin comes only from its subprogram keeps the
/// scope end sentinel, so `end_line` can be smaller than `begin_line`
/// (`/src/a.c:8--1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub path: String,
    pub begin_line: u32,
    pub end_line: u32,
}

impl SourceRange {
    /// Empty range of a basic block.
    pub fn for_block() -> Self {
        Self {
            path: String::new(),
            begin_line: UNRESOLVED_BEGIN,
            end_line: BLOCK_END_SENTINEL,
        }
    }

    /// Empty range of a loop or function.
    pub fn for_scope() -> Self {
        Self {
            path: String::new(),
            begin_line: UNRESOLVED_BEGIN,
            end_line: SCOPE_END_SENTINEL,
        }
    }

    /// Whether a begin line was recorded, from a located instruction or a
    /// subprogram. A resolved range is not necessarily ordered.
    pub fn is_resolved(&self) -> bool {
        self.begin_line != UNRESOLVED_BEGIN
    }

    /// Adopt `path` unless a path was already recorded.
    pub fn record_path(&mut self, path: &str) {
        if self.path.is_empty() && !path.is_empty() {
            self.path = path.to_string();
        }
    }

    /// Account for one source line. Line 0 only extends the end.
    pub fn record_line(&mut self, line: u32) {
        self.end_line = self.end_line.max(line);
        if line > 0 {
            self.begin_line = self.begin_line.min(line);
        }
    }

    /// Lower the begin line to `line` when it is earlier, line 0 included.
    pub fn lower_begin(&mut self, line: u32) {
        if line < self.begin_line {
            self.begin_line = line;
        }
    }

    /// Fold a member range into this one.
    pub fn merge(&mut self, other: &SourceRange) {
        self.record_path(&other.path);
        self.end_line = self.end_line.max(other.end_line);
        self.begin_line = self.begin_line.min(other.begin_line);
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "{}:{}--{}", self.path, self.begin_line, self.end_line)
        } else {
            write!(f, "<no debug info>")
        }
    }
}

/// Module-wide identity of a loop: owning function and header block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoopKey {
    /// Link name of the function.
    pub function: String,
    /// Name of the header block.
    pub header: String,
}

impl LoopKey {
    pub fn new(function: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            header: header.into(),
        }
    }
}

impl fmt::Display for LoopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.function, self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_range_ignores_line_zero_for_begin() {
        let mut range = SourceRange::for_block();
        range.record_line(0);
        assert!(!range.is_resolved());
        assert_eq!(range.end_line, 0);

        range.record_line(14);
        range.record_line(12);
        range.record_line(0);
        assert_eq!((range.begin_line, range.end_line), (12, 14));
    }

    #[test]
    fn test_first_path_wins() {
        let mut range = SourceRange::for_block();
        range.record_path("");
        range.record_path("/src/a.c");
        range.record_path("/src/b.h");
        assert_eq!(range.path, "/src/a.c");
    }

    #[test]
    fn test_merge_skips_sentinels() {
        let mut scope = SourceRange::for_scope();
        scope.merge(&SourceRange::for_block());
        assert!(!scope.is_resolved());
        assert_eq!(scope.end_line, SCOPE_END_SENTINEL);

        let mut block = SourceRange::for_block();
        block.record_path("/src/a.c");
        block.record_line(13);
        block.record_line(20);
        scope.merge(&block);
        assert_eq!(scope.to_string(), "/src/a.c:13--20");
    }

    #[test]
    fn test_lower_begin() {
        let mut range = SourceRange::for_scope();
        range.record_line(10);
        range.lower_begin(8);
        assert_eq!(range.begin_line, 8);
        range.lower_begin(9);
        assert_eq!(range.begin_line, 8);
        range.lower_begin(0);
        assert_eq!(range.begin_line, 0);
    }

    #[test]
    fn test_loop_key_display() {
        assert_eq!(LoopKey::new("foo", "for.body").to_string(), "foo-for.body");
        assert_eq!(SourceRange::for_scope().to_string(), "<no debug info>");
    }
}
