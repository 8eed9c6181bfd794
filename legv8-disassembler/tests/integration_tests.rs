//! Integration tests for the disassembler

use legv8_assembler::assemble;
use legv8_disassembler::{decode, disassemble, format, DisassemblerError};
use legv8_isa::codec::CODECS;
use legv8_isa::Codec;

#[test]
fn test_assembled_program_decodes_line_by_line() {
    let source = "\
ADDI X1, XZR, #10
LSL X2, X1, #3
STUR X2, [SP, #8]
LDUR X3, [SP, #8]
PRNT X3
HALT
";
    let program = assemble(source).expect("assembly failed");
    let expected = [
        "ADDI X1, X31, #10",
        "LSL X2, X1, #3",
        "STUR X2, [X28, #8]",
        "LDUR X3, [X28, #8]",
        "PRNT X3",
        "HALT",
    ];
    for (index, &word) in program.code.iter().enumerate() {
        let tag = decode(word).expect("decodes");
        assert_eq!(format(tag, word), expected[index]);
    }
}

#[test]
fn test_decode_agrees_with_assembler_annotations() {
    // One line for every codec in the catalogue, via the alias list.
    for info in CODECS {
        let line = match info.tag {
            Codec::B | Codec::Bl => format!("here: {} here\n", info.mnemonics[0]),
            Codec::Cbz | Codec::Cbnz => format!("here: {} X1, here\n", info.mnemonics[0]),
            Codec::Beq
            | Codec::Bne
            | Codec::Bhs
            | Codec::Blo
            | Codec::Bmi
            | Codec::Bpl
            | Codec::Bvs
            | Codec::Bvc
            | Codec::Bhi
            | Codec::Bls
            | Codec::Bge
            | Codec::Blt
            | Codec::Bgt
            | Codec::Ble => format!("here: {} here\n", info.mnemonics[0]),
            _ => continue,
        };
        let program = assemble(&line).expect("branch line assembles");
        assert_eq!(decode(program.code[0]), Ok(info.tag));
    }
}

#[test]
fn test_unknown_words_report_prefix() {
    assert_eq!(decode(0), Err(DisassemblerError::UnknownOpcode(0)));
    assert_eq!(
        decode(u32::MAX & !(0x7FFu32 << 21) | (0x001 << 21)),
        Err(DisassemblerError::UnknownOpcode(0x001))
    );
}

#[test]
fn test_listing_of_fibonacci_kernel() {
    let source = "\
fib:
    CMPI X0, #2
    B.LT leaf
    SUBI SP, SP, #24
    STUR X30, [SP, #16]
leaf:
    BR X30
";
    let program = assemble(source).expect("assembly failed");
    let listing = disassemble(&program);
    assert!(listing.contains("fib:\n"));
    assert!(listing.contains("leaf:\n"));
    assert!(listing.contains("SUBIS X31, X0, #2"));
    assert!(listing.contains("B.LT #3"));
    assert!(listing.contains("BR X30"));
    // One address per instruction.
    assert_eq!(listing.matches("0x00400").count(), program.len());
}
