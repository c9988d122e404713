//! Integration tests for TIR (Test IR) files.
//!
//! These tests parse the modules under tests/filetest and inspect the parsed
//! structure and its printed form directly, without the FileCheck runner.

use std::fs;
use std::path::Path;

use ir2src::core::{MdRef, MetadataNode};
use ir2src::test_ir::{Callee, Operation, TestIR, ValueType};

/// Helper to load and parse a TIR file from the test directory
fn load_tir_file(filename: &str) -> TestIR {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/filetest")
        .join(filename);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    TestIR::parse(&contents).unwrap_or_else(|e| panic!("Failed to parse {filename}: {e}"))
}

/// Helper to check if output contains expected patterns
fn check_output_contains(output: &str, patterns: &[&str]) {
    for pattern in patterns {
        assert!(
            output.contains(pattern),
            "Output missing expected pattern: '{pattern}'\nFull output:\n{output}"
        );
    }
}

#[test]
fn test_single_loop_tir() {
    let ir = load_tir_file("single_loop.tir");
    let output = ir.print();

    check_output_contains(
        &output,
        &[
            "Metadata !1 = DISubprogram foo line 8 file !0",
            "Metadata !9 = DILabel L1 line 13",
            "Extern function llvm.dbg.value",
            "Function foo",
            "Attach !1",
            "Block loop",
            "MaxTrip 16",
            "PHI i",
            "a from entry",
            "i from loop",
            "Target @llvm.dbg.value",
            "Value (condbr)",
            "Op ^loop",
            "Op ^exit",
            "Value (ret)",
            "Op c",
        ],
    );

    // Verify structure
    assert_eq!(ir.functions.len(), 2);
    assert!(ir.functions[0].declaration);
    assert_eq!(ir.blocks.len(), 3);
    assert_eq!(ir.metadata.len(), 7);
    assert_eq!(ir.blocks[1].max_trip, Some(16));

    let sp = ir.metadata.get(MdRef(1)).and_then(MetadataNode::as_subprogram).unwrap();
    assert_eq!(sp.retained_nodes, vec![MdRef(9)]);
}

#[test]
fn test_nested_labels_tir() {
    let ir = load_tir_file("nested_labels.tir");

    let labels: Vec<_> = ir
        .metadata
        .iter()
        .filter_map(|(md, node)| node.as_label().map(|l| (md, l.name.clone(), l.line)))
        .collect();
    assert_eq!(
        labels,
        vec![
            (MdRef(9), "L1".to_string(), 13),
            (MdRef(10), "L2".to_string(), 13)
        ]
    );

    let names: Vec<_> = ir.blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["entry", "outer", "inner", "latch", "exit"]);
}

#[test]
fn test_trace_tir_calls() {
    let ir = load_tir_file("trace.tir");

    let callees: Vec<_> = ir.values.iter().filter_map(|v| v.callee.clone()).collect();
    assert_eq!(callees, vec![Callee::Indirect("fp".to_string())]);

    let call = ir.values.iter().find(|v| v.op == Operation::Call).unwrap();
    assert_eq!(call.op_count, 1);
    assert_eq!(call.value_type, ValueType::Normal);

    let inlined = ir.metadata.get(MdRef(5)).and_then(MetadataNode::as_location).unwrap();
    assert_eq!(inlined.inlined_at, Some(MdRef(2)));
}

#[test]
fn test_alloca_tir() {
    let ir = TestIR::parse(
        r#"
test() {
entry:
  %a = alloca 8, 1
  %b = alloca 16, 8
  terminate
}
"#,
    )
    .unwrap();
    let output = ir.print();

    check_output_contains(
        &output,
        &[
            "Value a (alloca)",
            "Op $8",
            "Op $1",
            "Value b (alloca)",
            "Op $16",
            "Op $8",
            "Value (terminate)",
        ],
    );
}

#[test]
fn test_parse_errors() {
    let cases = [
        ("f() {\nentry:\n  br ^nowhere\n}\n", "Undefined block reference: nowhere"),
        ("f() {\nentry:\n  call %g\n}\n", "Undefined value reference: g"),
        ("!0 = DIFile(directory: \"/src\")\n", "DIFile is missing field 'filename'"),
        (
            "!0 = DIFile(filename: \"a.c\")\n!0 = DIFile(filename: \"b.c\")\n",
            "Duplicate metadata definition: !0",
        ),
        ("f()!\nf()!\n", "Duplicate function definition: 'f'"),
        ("f() {\nentry:\n  %x = frobnicate\n}\n", "Unknown operation: frobnicate"),
    ];

    for (text, expected) in cases {
        let err = TestIR::parse(text).unwrap_err();
        assert!(err.contains(expected), "expected '{expected}' in '{err}'");
    }
}
