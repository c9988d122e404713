//! Text reports over [`SourceMaps`].
//!
//! The layout is line oriented so FileCheck-style tests can match it; it is
//! not a stable interchange format.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use super::maps::SourceMaps;

/// A section of the text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    Blocks,
    Loops,
    Functions,
    Labels,
    BeginLines,
}

impl ReportSection {
    /// Every section, in the order a full report prints them.
    pub const ALL: [ReportSection; 5] = [
        ReportSection::Blocks,
        ReportSection::Loops,
        ReportSection::Functions,
        ReportSection::Labels,
        ReportSection::BeginLines,
    ];
}

impl FromStr for ReportSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(ReportSection::Blocks),
            "loops" => Ok(ReportSection::Loops),
            "functions" => Ok(ReportSection::Functions),
            "labels" => Ok(ReportSection::Labels),
            "begin-lines" => Ok(ReportSection::BeginLines),
            _ => Err(format!("unknown report section '{}'", s)),
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportSection::Blocks => "blocks",
            ReportSection::Loops => "loops",
            ReportSection::Functions => "functions",
            ReportSection::Labels => "labels",
            ReportSection::BeginLines => "begin-lines",
        };
        f.write_str(name)
    }
}

impl<F, B> SourceMaps<F, B>
where
    F: Copy + Eq + Hash,
    B: Copy + Eq + Hash,
{
    /// Render one report section.
    pub fn render(&self, section: ReportSection) -> String {
        let mut lines = Vec::new();
        match section {
            ReportSection::Blocks => self.render_blocks(&mut lines),
            ReportSection::Loops => self.render_loops(&mut lines),
            ReportSection::Functions => self.render_functions(&mut lines),
            ReportSection::Labels => self.render_labels(&mut lines),
            ReportSection::BeginLines => self.render_begin_lines(&mut lines),
        }
        lines.join("\n")
    }

    fn render_blocks(&self, lines: &mut Vec<String>) {
        for func in self.functions() {
            lines.push(format!("Block ranges for {}", func.link_name));
            for block in &func.blocks {
                if let Some(record) = self.block(*block) {
                    lines.push(format!("  {}: {}", record.name, record.range));
                }
            }
            lines.push("End block ranges".to_string());
        }
    }

    fn render_loops(&self, lines: &mut Vec<String>) {
        for func in self.functions() {
            lines.push(format!("Loops for {}", func.link_name));
            for lp in self.function_loops(func.func) {
                let trip = match self.trip_count(&lp.key) {
                    Some(n) => n.to_string(),
                    None => "unknown".to_string(),
                };
                let members: Vec<&str> = lp
                    .blocks
                    .iter()
                    .filter_map(|b| self.block(*b).map(|r| r.name.as_str()))
                    .collect();
                lines.push(format!(
                    "  {} depth {}: {} trip {} blocks {}",
                    lp.key,
                    lp.depth,
                    lp.range,
                    trip,
                    members.join(", ")
                ));
            }
            lines.push("End loops".to_string());
        }
    }

    fn render_functions(&self, lines: &mut Vec<String>) {
        for func in self.functions() {
            if func.demangled == func.link_name {
                lines.push(format!("Function {}: {}", func.link_name, func.range));
            } else {
                lines.push(format!(
                    "Function {} ({}): {}",
                    func.link_name, func.demangled, func.range
                ));
            }
        }
    }

    fn render_labels(&self, lines: &mut Vec<String>) {
        for (key, name) in self.labels() {
            lines.push(format!("Label {} -> {}", name, key));
        }
    }

    fn render_begin_lines(&self, lines: &mut Vec<String>) {
        for (name, candidates) in self.all_begin_lines() {
            let candidates: Vec<String> = candidates.iter().map(u32::to_string).collect();
            lines.push(format!("Begin lines for {}: {}", name, candidates.join(", ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names_round_trip() {
        for section in ReportSection::ALL {
            assert_eq!(section.to_string().parse::<ReportSection>(), Ok(section));
        }
        assert!("rpo".parse::<ReportSection>().is_err());
    }
}
