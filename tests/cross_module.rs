//! Cross-module consistency tests
//!
//! The assembler, disassembler, and VM all lean on the same codec
//! catalogue; these tests check the contracts between them: emitted
//! words re-decode to the same tag, listings mirror the source, the
//! binary image round-trips, and the side tables carry what the
//! surrounding tooling (LSP, debugger) consumes.

use legv8_assembler::assemble;
use legv8_disassembler::{decode, disassemble, format};
use legv8_isa::{Program, TEXT_START};
use legv8_runtime::{OutputSink, Status, Vm, VmConfig};

#[test]
fn test_every_emitted_word_redecodes_to_its_annotation() {
    let source = "\
start:
    ADDI X1, XZR, #100
    SUBIS XZR, X1, #100
    B.EQ skip
    PRNT X1
skip:
    MOVZ X2, #7, LSL #16
    MOVK X2, #9
    LSL X3, X2, #4
    MUL X4, X3, X3
    SDIV X5, X4, X3
    UDIV X6, X4, X3
    SMULH X7, X4, X4
    FADDS S1, S2, S3
    FCMPD D1, D2
    STUR X1, [SP, #8]
    LDURSW X8, [SP, #8]
    STXR X9, X1, [SP]
    CBZ X5, start
    BL start
    HALT
";
    let program = assemble(source).expect("assembly failed");
    for (index, &word) in program.code.iter().enumerate() {
        let decoded = decode(word).expect("emitted word must decode");
        assert_eq!(
            decoded, program.annotations[index].tag,
            "instruction {index} decoded to a different tag"
        );
    }
}

#[test]
fn test_assemble_format_assemble_fixed_point() {
    // Formatting an emitted word and re-assembling the line (labels
    // replaced by raw offsets aside) must produce the same word for
    // label-free instructions.
    let source = "\
ADD X1, X2, X3
ADDI X4, X5, #-100
LDUR X6, [X7, #24]
STXR X8, X9, [X10]
MOVZ X11, #513, LSL #32
PRNT D14
TIME X15
HALT
";
    let program = assemble(source).expect("assembly failed");
    for (index, &word) in program.code.iter().enumerate() {
        let tag = decode(word).expect("decodes");
        let text = format(tag, word);
        let reassembled = assemble(&text).expect("formatted line must assemble");
        assert_eq!(
            reassembled.code[0], word,
            "instruction {index} ({text}) did not round-trip"
        );
    }
}

#[test]
fn test_binary_image_round_trip_runs_identically() {
    let source = "MOVZ X0, #42\nPRNT X0\nHALT\n";
    let program = assemble(source).expect("assembly failed");

    let image = program.to_bytes();
    assert_eq!(image.len(), program.len() * 4);
    let reloaded = Program::from_bytes(&image).expect("image must load");
    assert_eq!(reloaded.code, program.code);

    // The reloaded image has no annotations; the VM decodes at load
    // time instead and behaves the same.
    let mut from_source = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    from_source.run();
    let mut from_image = Vm::with_sink(reloaded, VmConfig::default(), OutputSink::capture());
    from_image.run();
    assert_eq!(from_source.output(), from_image.output());
    assert_eq!(from_source.exception(), from_image.exception());
}

#[test]
fn test_label_table_for_symbol_consumers() {
    // The LSP front-end reads the label table and per-instruction
    // source offsets; both must be in definition order and accurate.
    let source = "first:\nADDI X1, XZR, #1\nsecond:\nB first\n";
    let program = assemble(source).expect("assembly failed");

    assert_eq!(
        program.labels,
        vec![("first".to_string(), 0), ("second".to_string(), 1)]
    );
    // The B instruction's annotation points back at its target label.
    assert_eq!(program.annotations[1].label_ref, Some(0));
    // Source offsets land on the mnemonics.
    assert_eq!(&source[program.annotations[0].source_offset..][..4], "ADDI");
    assert_eq!(&source[program.annotations[1].source_offset..][..1], "B");
}

#[test]
fn test_listing_round_trips_through_vm_addresses() {
    let source = "top:\nADDI X1, X1, #1\nCBNZ X1, top\nHALT\n";
    let program = assemble(source).expect("assembly failed");
    let listing = disassemble(&program);

    assert!(listing.contains("top:"));
    assert!(listing.contains(&format!("{:#010x}", TEXT_START)));
    assert!(listing.contains("ADDI X1, X1, #1"));
    assert!(listing.contains("CBNZ X1, #-1"));

    let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    vm.run();
    assert_eq!(vm.status(), Status::Faulted);
}

#[test]
fn test_branch_offsets_are_instruction_units() {
    let program = assemble("B fwd\nHALT\nHALT\nfwd: HALT\n").expect("assembly failed");
    // Offset 3 instructions, not 12 bytes.
    assert_eq!(legv8_isa::encoding::br_address(program.code[0]), 3);

    let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
    vm.step();
    assert_eq!(vm.pc(), 3);
}

#[test]
fn test_catalogue_is_the_single_source_of_mnemonics() {
    // Every alias in the catalogue assembles to a word that decodes
    // back to its own tag (operand lists synthesized per style).
    use legv8_isa::codec::{OperandStyle, CODECS};

    for info in CODECS {
        for &mnemonic in info.mnemonics {
            let operands = match info.style {
                OperandStyle::XXX => " X1, X2, X3",
                OperandStyle::XXShamt => " X1, X2, #3",
                OperandStyle::X => " X1",
                OperandStyle::Sss => " S1, S2, S3",
                OperandStyle::Ddd => " D1, D2, D3",
                OperandStyle::Ss => " S1, S2",
                OperandStyle::Dd => " D1, D2",
                OperandStyle::Empty => "",
                OperandStyle::Time => " X1",
                OperandStyle::Prnt => " X1",
                OperandStyle::XXImm => " X1, X2, #4",
                OperandStyle::MemX => " X1, [X2, #4]",
                OperandStyle::MemS => " S1, [X2, #4]",
                OperandStyle::MemD => " D1, [X2, #4]",
                OperandStyle::StoreExclusive => " X1, X2, [X3]",
                OperandStyle::Label | OperandStyle::CondLabel => " here",
                OperandStyle::RegLabel => " X1, here",
                OperandStyle::MovImm => " X1, #9",
            };
            let line = format!("here: {mnemonic}{operands}\n");
            let program = assemble(&line)
                .unwrap_or_else(|failure| panic!("{mnemonic} failed: {failure:?}"));
            assert_eq!(decode(program.code[0]), Ok(info.tag), "{mnemonic}");
        }
    }
}
