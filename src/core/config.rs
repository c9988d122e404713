//! Configuration of the correlation pass.

use std::fmt;
use std::str::FromStr;

/// What happens to a block's aggregation when an intrinsic call is met.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntrinsicPolicy {
    /// The intrinsic call contributes nothing; later instructions still count.
    #[default]
    SkipInstruction,
    /// Stop aggregating the block at the intrinsic call.
    TruncateBlock,
}

impl FromStr for IntrinsicPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(IntrinsicPolicy::SkipInstruction),
            "truncate" => Ok(IntrinsicPolicy::TruncateBlock),
            _ => Err(format!("unknown intrinsic policy '{}' (expected skip or truncate)", s)),
        }
    }
}

impl fmt::Display for IntrinsicPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrinsicPolicy::SkipInstruction => write!(f, "skip"),
            IntrinsicPolicy::TruncateBlock => write!(f, "truncate"),
        }
    }
}

/// Which loop a label is attached to when several loops start on its line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelTieBreak {
    /// Deepest loop in the nest; equal depths fall back to discovery order.
    #[default]
    Innermost,
    /// First loop in discovery order (outer loops come first).
    FirstDiscovered,
}

impl FromStr for LabelTieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "innermost" => Ok(LabelTieBreak::Innermost),
            "first" => Ok(LabelTieBreak::FirstDiscovered),
            _ => Err(format!("unknown tie-break '{}' (expected innermost or first)", s)),
        }
    }
}

impl fmt::Display for LabelTieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelTieBreak::Innermost => write!(f, "innermost"),
            LabelTieBreak::FirstDiscovered => write!(f, "first"),
        }
    }
}

/// Tunables of [`SourceMapPass`](crate::srcmap::SourceMapPass).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationConfig {
    /// Link-name prefix of compiler intrinsics.
    pub intrinsic_prefix: String,
    pub intrinsic_policy: IntrinsicPolicy,
    /// Do not analyze functions whose link name carries `intrinsic_prefix`.
    pub skip_intrinsic_functions: bool,
    /// Longest inlining chain accepted before the metadata is declared corrupt.
    pub max_inline_depth: usize,
    pub label_tie_break: LabelTieBreak,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            intrinsic_prefix: "llvm.".to_string(),
            intrinsic_policy: IntrinsicPolicy::default(),
            skip_intrinsic_functions: true,
            max_inline_depth: 256,
            label_tie_break: LabelTieBreak::default(),
        }
    }
}

impl CorrelationConfig {
    /// Whether `name` follows the intrinsic naming convention.
    pub fn is_intrinsic(&self, name: &str) -> bool {
        !self.intrinsic_prefix.is_empty() && name.starts_with(&self.intrinsic_prefix)
    }
}
