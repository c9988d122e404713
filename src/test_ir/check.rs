//! FileCheck-style test validation for TIR files.
//!
//! This module provides functionality to parse CHECK directives from TIR files
//! and validate the correlation report against expected patterns, similar to
//! LLVM's FileCheck tool but implemented in a Rust-native way.

use super::{AnnotatedTripCounts, TestIR, TestIRAdaptor};
use crate::core::{Analyzer, CorrelationConfig, IntrinsicPolicy, LabelTieBreak};
use crate::srcmap::{render_trace, ReportSection, SourceMapPass};

/// A CHECK directive extracted from a TIR file
#[derive(Debug, Clone)]
pub enum CheckDirective {
    /// CHECK: pattern - Match exact pattern
    Check(String),
    /// CHECK-LABEL: pattern - Label for a section
    CheckLabel(String),
    /// CHECK-NEXT: pattern - Match on the next line
    CheckNext(String),
    /// CHECK-EMPTY - Match empty line
    CheckEmpty,
    /// COM: comment - Comment, ignored
    Comment(String),
}

/// A RUN directive specifying how to execute the test
#[derive(Debug, Clone)]
pub struct RunDirective {
    pub command: String,
    pub args: Vec<String>,
}

/// Test specification extracted from a TIR file
#[derive(Debug)]
pub struct TestSpec {
    pub run_directives: Vec<RunDirective>,
    pub check_directives: Vec<CheckDirective>,
    pub tir_content: String,
}

impl TestSpec {
    /// Parse a TIR file to extract test specifications
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut run_directives = Vec::new();
        let mut check_directives = Vec::new();
        let mut tir_lines = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();

            if let Some(run_cmd) = trimmed.strip_prefix("; RUN:") {
                let mut parts = run_cmd.split_whitespace();
                if let Some(command) = parts.next() {
                    run_directives.push(RunDirective {
                        command: command.to_string(),
                        args: parts.map(str::to_string).collect(),
                    });
                }
            } else if let Some(pattern) = trimmed.strip_prefix("; CHECK-LABEL:") {
                check_directives.push(CheckDirective::CheckLabel(pattern.trim().to_string()));
            } else if let Some(pattern) = trimmed.strip_prefix("; CHECK-NEXT:") {
                check_directives.push(CheckDirective::CheckNext(pattern.trim().to_string()));
            } else if trimmed.starts_with("; CHECK-EMPTY") {
                check_directives.push(CheckDirective::CheckEmpty);
            } else if let Some(pattern) = trimmed.strip_prefix("; CHECK:") {
                check_directives.push(CheckDirective::Check(pattern.trim().to_string()));
            } else if let Some(comment) = trimmed.strip_prefix("; COM:") {
                check_directives.push(CheckDirective::Comment(comment.trim().to_string()));
            } else {
                // Regular TIR content
                tir_lines.push(line);
            }
        }

        Ok(TestSpec {
            run_directives,
            check_directives,
            tir_content: tir_lines.join("\n"),
        })
    }
}

/// What a RUN line asks for.
#[derive(Debug, Default)]
struct RunOptions {
    print_ir: bool,
    print_trace: bool,
    print_stats: bool,
    sections: Vec<ReportSection>,
    config: CorrelationConfig,
}

impl RunOptions {
    fn from_args(args: &[String]) -> Result<Self, String> {
        let mut options = RunOptions::default();
        let mut args = args.iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--print-ir" => options.print_ir = true,
                "--print-trace" => options.print_trace = true,
                "--print-stats" => options.print_stats = true,
                "--print-blocks" => options.sections.push(ReportSection::Blocks),
                "--print-loops" => options.sections.push(ReportSection::Loops),
                "--print-functions" => options.sections.push(ReportSection::Functions),
                "--print-labels" => options.sections.push(ReportSection::Labels),
                "--print-begin-lines" => options.sections.push(ReportSection::BeginLines),
                "--truncate-on-intrinsic" => {
                    options.config.intrinsic_policy = IntrinsicPolicy::TruncateBlock
                }
                "--tie-break" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "--tie-break requires a value".to_string())?;
                    options.config.label_tie_break = value.parse::<LabelTieBreak>()?;
                }
                // Input placeholders such as %s
                _ => {}
            }
        }

        Ok(options)
    }

    fn runs_pass(&self) -> bool {
        self.print_stats || !self.sections.is_empty()
    }
}

/// Test runner that executes TIR tests
pub struct TestRunner {
    verbose: bool,
}

impl TestRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run a TIR test and validate output
    pub fn run_test(&self, spec: &TestSpec) -> Result<(), String> {
        // Parse the TIR content
        let ir = TestIR::parse(&spec.tir_content)?;

        // Execute based on run directives
        for run_dir in &spec.run_directives {
            let output = self.execute_command(&ir, run_dir)?;
            if self.verbose {
                println!("{}", output);
            }
            self.validate_output(&output, &spec.check_directives)?;
        }

        Ok(())
    }

    /// Execute a test command and return the output
    ///
    /// A failing correlation run is reported as an `error: ...` line so that
    /// tests can check for it.
    fn execute_command(&self, ir: &TestIR, run_dir: &RunDirective) -> Result<String, String> {
        let options = RunOptions::from_args(&run_dir.args)?;
        let mut output = Vec::new();

        if options.print_ir {
            output.push(ir.print());
        }

        if options.print_trace {
            let mut adaptor = TestIRAdaptor::new(ir);
            match render_trace(&mut adaptor, &options.config) {
                Ok(trace) => output.push(trace),
                Err(e) => output.push(format!("error: {}", e)),
            }
        }

        if options.runs_pass() {
            let mut adaptor = TestIRAdaptor::new(ir);
            let mut analyzer = Analyzer::<TestIRAdaptor>::new();
            let mut pass = SourceMapPass::new(options.config.clone());

            match pass.run_on_module(&mut adaptor, &mut analyzer, &AnnotatedTripCounts) {
                Ok(maps) => {
                    for section in &options.sections {
                        output.push(maps.render(*section));
                    }
                }
                Err(e) => output.push(format!("error: {}", e)),
            }

            if options.print_stats {
                output.push(pass.stats().to_string());
            }
        }

        Ok(output.join("\n"))
    }

    /// Validate output against CHECK directives
    pub fn validate_output(
        &self,
        output: &str,
        directives: &[CheckDirective],
    ) -> Result<(), String> {
        let output_lines: Vec<_> = output.lines().collect();
        let mut line_idx = 0;

        for directive in directives {
            match directive {
                CheckDirective::Comment(_) => continue,

                CheckDirective::Check(pattern) | CheckDirective::CheckLabel(pattern) => {
                    let kind = if matches!(directive, CheckDirective::Check(_)) {
                        "CHECK"
                    } else {
                        "CHECK-LABEL"
                    };
                    let found = output_lines
                        .iter()
                        .skip(line_idx)
                        .position(|line| line.contains(pattern.as_str()));

                    match found {
                        Some(idx) => {
                            line_idx += idx + 1; // Move to the next line after the match
                            if self.verbose {
                                println!("{}: '{}' found at line {}", kind, pattern, line_idx - 1);
                            }
                        }
                        None => {
                            return Err(format!("{}: pattern '{}' not found in output", kind, pattern));
                        }
                    }
                }

                CheckDirective::CheckNext(pattern) => {
                    let Some(line) = output_lines.get(line_idx) else {
                        return Err(format!("CHECK-NEXT: no more lines, expected '{}'", pattern));
                    };

                    if !line.contains(pattern.as_str()) {
                        return Err(format!(
                            "CHECK-NEXT: expected '{}' but got '{}'",
                            pattern, line
                        ));
                    }

                    if self.verbose {
                        println!("CHECK-NEXT: '{}' matches at line {}", pattern, line_idx);
                    }
                    line_idx += 1;
                }

                CheckDirective::CheckEmpty => {
                    let Some(line) = output_lines.get(line_idx) else {
                        continue; // End of output counts as empty
                    };

                    if !line.trim().is_empty() {
                        return Err(format!(
                            "CHECK-EMPTY: expected empty line but got '{}'",
                            line
                        ));
                    }

                    if self.verbose {
                        println!("CHECK-EMPTY: matches at line {}", line_idx);
                    }
                    line_idx += 1;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let content = r#"; RUN: %ir2src_test --print-ir %s
; CHECK: Printing IR
; CHECK-LABEL: Function test
; CHECK-NEXT: Block entry
; COM: This is a comment
test() {
  entry:
    terminate
}"#;

        let spec = TestSpec::parse(content).unwrap();
        assert_eq!(spec.run_directives.len(), 1);
        assert_eq!(spec.run_directives[0].args, vec!["--print-ir", "%s"]);
        assert_eq!(spec.check_directives.len(), 4);
        assert!(spec.tir_content.contains("test()"));
    }

    #[test]
    fn test_check_matching() {
        let runner = TestRunner::new(false);
        let output = "Printing IR\nFunction test\nBlock entry\n";

        let directives = vec![
            CheckDirective::Check("Printing IR".to_string()),
            CheckDirective::CheckLabel("Function test".to_string()),
            CheckDirective::CheckNext("Block entry".to_string()),
        ];

        runner.validate_output(output, &directives).unwrap();
    }

    #[test]
    fn test_check_next_failure() {
        let runner = TestRunner::new(false);
        let output = "Line 1\nLine 2\nLine 3\n";

        let directives = vec![
            CheckDirective::Check("Line 1".to_string()),
            CheckDirective::CheckNext("Line 3".to_string()), // Should fail
        ];

        let result = runner.validate_output(output, &directives);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("CHECK-NEXT"));
    }

    #[test]
    fn test_run_options() {
        let args: Vec<String> = ["--print-loops", "--tie-break", "first", "--truncate-on-intrinsic", "%s"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let options = RunOptions::from_args(&args).unwrap();
        assert_eq!(options.sections, vec![ReportSection::Loops]);
        assert_eq!(options.config.label_tie_break, LabelTieBreak::FirstDiscovered);
        assert_eq!(options.config.intrinsic_policy, IntrinsicPolicy::TruncateBlock);
        assert!(options.runs_pass());

        let missing = vec!["--tie-break".to_string()];
        assert!(RunOptions::from_args(&missing).is_err());
    }

    #[test]
    fn test_run_reports_blocks() {
        let spec = TestSpec::parse(
            r#"; RUN: %ir2src_test --print-blocks --print-stats %s
; CHECK-LABEL: Block ranges for foo
; CHECK-NEXT: entry: /src/a.c:4--4
; CHECK: End block ranges
; CHECK: Functions analyzed: 1
!0 = DIFile(filename: "a.c", directory: "/src")
!1 = DISubprogram(name: "foo", file: !0, line: 3)
!2 = DILocation(line: 4, column: 1, scope: !1)
foo() !dbg !1 {
entry:
  terminate !dbg !2
}"#,
        )
        .unwrap();

        TestRunner::new(false).run_test(&spec).unwrap();
    }
}
