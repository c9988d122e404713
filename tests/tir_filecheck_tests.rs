//! FileCheck-style tests for TIR files
//!
//! This test suite validates the correlation report of the TIR files under
//! tests/filetest against their CHECK directives, similar to how LLVM's
//! FileCheck works but implemented in Rust.

use std::fs;
use std::path::{Path, PathBuf};

use ir2src::test_ir::{TestRunner, TestSpec};

fn filetest_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/filetest")
}

/// Test helper that runs a TIR file through FileCheck validation
fn run_filecheck_test(tir_file: &str) {
    let _ = env_logger::builder().is_test(true).try_init();

    let path = filetest_dir().join(tir_file);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    let spec = TestSpec::parse(&contents)
        .unwrap_or_else(|e| panic!("Failed to parse test spec from {}: {}", tir_file, e));
    assert!(
        !spec.run_directives.is_empty(),
        "{} has no RUN directive",
        tir_file
    );

    let runner = TestRunner::new(false);
    runner
        .run_test(&spec)
        .unwrap_or_else(|e| panic!("Test {} failed: {}", tir_file, e));
}

#[test]
fn test_single_loop_filecheck() {
    run_filecheck_test("single_loop.tir");
}

#[test]
fn test_nested_labels_filecheck() {
    run_filecheck_test("nested_labels.tir");
}

#[test]
fn test_label_first_discovered_filecheck() {
    run_filecheck_test("label_first.tir");
}

#[test]
fn test_truncate_on_intrinsic_filecheck() {
    run_filecheck_test("truncate.tir");
}

#[test]
fn test_trace_filecheck() {
    run_filecheck_test("trace.tir");
}

#[test]
fn test_cycle_filecheck() {
    run_filecheck_test("cycle.tir");
}

#[test]
fn test_print_ir_filecheck() {
    run_filecheck_test("print_ir.tir");
}

/// Every .tir file in the directory must pass, including ones without a
/// dedicated test above.
#[test]
fn test_all_filetests() {
    let mut files: Vec<_> = fs::read_dir(filetest_dir())
        .expect("filetest directory")
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("tir"))
        .collect();
    files.sort();
    assert!(!files.is_empty());

    for path in files {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        run_filecheck_test(name);
    }
}
