//! Stress tests: large programs, deep recursion, heavy memory churn

use legv8_assembler::assemble;
use legv8_runtime::{OutputSink, Status, Vm, VmConfig};

#[test]
fn test_thousands_of_instructions_assemble_and_run() {
    // 4000 increments followed by a print; exercises long straight-
    // line programs and the tag cache.
    let mut source = String::from("MOVZ X1, #0\n");
    for _ in 0..4000 {
        source.push_str("ADDI X1, X1, #1\n");
    }
    source.push_str("PRNT X1\nHALT\n");

    let program = assemble(&source).expect("assembly failed");
    assert_eq!(program.len(), 4003);

    let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    vm.run();
    assert_eq!(vm.output(), Some("X1: 0x0000000000000FA0 (4000)\n"));
}

#[test]
fn test_many_forward_references_to_one_label() {
    // Every branch in the file waits on the same yet-undefined label.
    let mut source = String::new();
    for _ in 0..500 {
        source.push_str("B end\n");
    }
    source.push_str("end: HALT\n");

    let program = assemble(&source).expect("assembly failed");
    for (index, &word) in program.code.iter().enumerate().take(500) {
        assert_eq!(legv8_isa::encoding::br_address(word), (500 - index) as i64);
    }
}

#[test]
fn test_many_labels_resolve_in_order() {
    let mut source = String::new();
    for i in 0..300 {
        source.push_str(&format!("l{i}: ADDI X1, X1, #1\n"));
    }
    let program = assemble(&source).expect("assembly failed");
    assert_eq!(program.labels.len(), 300);
    for (i, (name, at)) in program.labels.iter().enumerate() {
        assert_eq!(name, &format!("l{i}"));
        assert_eq!(*at, i);
    }
}

#[test]
fn test_deep_call_chain() {
    // fib(20) through the recursive path touches a few hundred
    // frames' worth of stack traffic.
    let source = "\
    MOVZ X0, #20
    BL fib
    PRNT X0
    HALT
fib:
    CMPI X0, #2
    B.LT leaf
    SUBI SP, SP, #24
    STUR X30, [SP, #16]
    STUR X0, [SP, #8]
    SUBI X0, X0, #1
    BL fib
    STUR X0, [SP]
    LDUR X0, [SP, #8]
    SUBI X0, X0, #2
    BL fib
    LDUR X9, [SP]
    ADD X0, X0, X9
    LDUR X30, [SP, #16]
    ADDI SP, SP, #24
leaf:
    BR X30
";
    let program = assemble(source).expect("assembly failed");
    let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    vm.run();
    assert_eq!(vm.output(), Some("X0: 0x0000000000001A6D (6765)\n"));
}

#[test]
fn test_memory_walk_across_many_pages() {
    // Store one byte every 512 addresses over 64 KB of the dynamic
    // segment, then sum them back: allocates a run of pages and
    // exercises lazy zero-fill in between.
    let source = "\
    MOVZ X1, #1, LSL #32
    MOVZ X2, #0
store:
    STURB X2, [X1]
    ADDI X1, X1, #512
    ADDI X2, X2, #1
    SUBIS XZR, X2, #128
    B.NE store
    MOVZ X1, #1, LSL #32
    MOVZ X2, #0
    MOVZ X3, #0
load:
    LDURB X4, [X1]
    ADD X3, X3, X4
    ADDI X1, X1, #512
    ADDI X2, X2, #1
    SUBIS XZR, X2, #128
    B.NE load
    PRNT X3
    HALT
";
    let program = assemble(source).expect("assembly failed");
    let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    vm.run();
    assert_eq!(vm.status(), Status::Faulted);
    // Sum 0..=127 is 8128.
    assert_eq!(vm.output(), Some("X3: 0x0000000000001FC0 (8128)\n"));
    assert!(vm.memory().page_count() >= 16);
}
