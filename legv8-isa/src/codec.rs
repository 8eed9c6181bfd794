//! # Instruction Codec Table
//!
//! The static catalogue at the heart of the toolchain: one entry per
//! instruction family, carrying its packed format, inclusive 11-bit
//! opcode range, optional discriminator, flag-setting discipline,
//! accepted mnemonics, and a short description.
//!
//! Two indices are derived lazily on first use:
//! - a mnemonic map (exact, uppercase, all aliases), and
//! - a 2048-slot lookup over the 11-bit prefix where each slot is
//!   either a unique tag or an ambiguity sentinel.
//!
//! Ambiguous slots are limited to the FP families (single/double
//! sharing a prefix, split by the fixed `shamt`) and the
//! conditional-branch family (split by the condition code in `rt`).
//! Any other overlap is a construction bug, and building the lookup
//! panics on it.

use crate::condition::Condition;
use crate::encoding::{self, PREFIX_SLOTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Stable tag for one codec entry. The ordinal indexes [`CODECS`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    // Arithmetic
    Add = 0,
    Adds,
    Addi,
    Addis,
    Sub,
    Subs,
    Subi,
    Subis,
    // Logical
    And,
    Ands,
    Andi,
    Andis,
    Orr,
    Orri,
    Eor,
    Eori,
    // Shifts
    Lsl,
    Lsr,
    // Wide moves
    Movz,
    Movk,
    // Multiply / divide
    Mul,
    Sdiv,
    Udiv,
    Smulh,
    Umulh,
    // Unconditional branches
    B,
    Bl,
    Br,
    // Conditional branches
    Beq,
    Bne,
    Bhs,
    Blo,
    Bmi,
    Bpl,
    Bvs,
    Bvc,
    Bhi,
    Bls,
    Bge,
    Blt,
    Bgt,
    Ble,
    Cbz,
    Cbnz,
    // Integer loads / stores
    Ldur,
    Ldurb,
    Ldurh,
    Ldursw,
    Ldxr,
    Stur,
    Sturb,
    Sturh,
    Sturw,
    Stxr,
    // Floating point
    Fadds,
    Faddd,
    Fsubs,
    Fsubd,
    Fmuls,
    Fmuld,
    Fdivs,
    Fdivd,
    Fcmps,
    Fcmpd,
    Ldurs,
    Ldurd,
    Sturs,
    Sturd,
    // Emulator extensions
    Halt,
    Dump,
    Prnt,
    Prnl,
    Time,
}

/// Instruction format selecting the bit-field layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    D,
    B,
    Cb,
    Iw,
}

impl Format {
    /// Width of the opcode field in this format.
    #[inline]
    pub const fn opcode_bits(self) -> u32 {
        match self {
            Format::R | Format::D => 11,
            Format::I => 10,
            Format::B => 6,
            Format::Cb => 8,
            Format::Iw => 9,
        }
    }
}

/// Assembly operand shape, driving the assembler's per-line parser
/// and the disassembler's formatter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandStyle {
    /// `Xd, Xn, Xm`
    XXX,
    /// `Xd, Xn, #shamt` (0-63)
    XXShamt,
    /// `Xn` (branch-to-register)
    X,
    /// `Sd, Sn, Sm`
    Sss,
    /// `Dd, Dn, Dm`
    Ddd,
    /// `Sn, Sm` (compare)
    Ss,
    /// `Dn, Dm` (compare)
    Dd,
    /// no operands
    Empty,
    /// optional `Xn`, default X0
    Time,
    /// one register of any file; the file is encoded in `rn`
    Prnt,
    /// `Xd, Xn, #imm12`
    XXImm,
    /// `Xt, [Xn]` or `Xt, [Xn, #imm9]`
    MemX,
    /// `St, [Xn]` or `St, [Xn, #imm9]`
    MemS,
    /// `Dt, [Xn]` or `Dt, [Xn, #imm9]`
    MemD,
    /// `Xs, Xt, [Xn]` (status, data, base)
    StoreExclusive,
    /// one label
    Label,
    /// one label, condition fixed by the codec
    CondLabel,
    /// `Xt, label`
    RegLabel,
    /// `Xd, #imm16 [, LSL #s]` with s in {0, 16, 32, 48}
    MovImm,
}

/// One row of the codec catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CodecInfo {
    pub tag: Codec,
    pub format: Format,
    pub style: OperandStyle,
    /// Inclusive range of 11-bit opcode prefixes.
    pub opcode_start: u16,
    pub opcode_end: u16,
    /// Fixed `shamt` (R) or fixed `rt` (CB) splitting a shared range.
    pub discriminant: Option<u8>,
    pub sets_flags: bool,
    pub mnemonics: &'static [&'static str],
    pub description: &'static str,
}

impl CodecInfo {
    /// The value written into the format's opcode field when encoding.
    #[inline]
    pub const fn opcode_value(&self) -> u16 {
        self.opcode_start >> (encoding::PREFIX_BITS - self.format.opcode_bits())
    }

    /// Does this entry's opcode range cover the given 11-bit prefix?
    #[inline]
    pub const fn covers(&self, prefix: u16) -> bool {
        self.opcode_start <= prefix && prefix <= self.opcode_end
    }

    /// Does this entry's discriminator accept the given word?
    /// Entries without a discriminator accept everything in range.
    #[inline]
    pub fn matches_discriminant(&self, word: u32) -> bool {
        match self.discriminant {
            None => true,
            Some(expected) => {
                let field = match self.format {
                    Format::R => encoding::shamt(word),
                    Format::Cb => encoding::rd(word),
                    _ => return false,
                };
                field == expected
            }
        }
    }
}

/// One slot of the fast prefix lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// No codec claims this prefix.
    Empty,
    /// Exactly one codec claims this prefix.
    Unique(Codec),
    /// Several codecs share this prefix; consult the discriminators.
    Ambiguous,
}

const fn r(
    tag: Codec,
    style: OperandStyle,
    opcode: u16,
    discriminant: Option<u8>,
    sets_flags: bool,
    mnemonics: &'static [&'static str],
    description: &'static str,
) -> CodecInfo {
    CodecInfo {
        tag,
        format: Format::R,
        style,
        opcode_start: opcode,
        opcode_end: opcode,
        discriminant,
        sets_flags,
        mnemonics,
        description,
    }
}

const fn i(
    tag: Codec,
    opcode_start: u16,
    sets_flags: bool,
    mnemonics: &'static [&'static str],
    description: &'static str,
) -> CodecInfo {
    CodecInfo {
        tag,
        format: Format::I,
        style: OperandStyle::XXImm,
        opcode_start,
        opcode_end: opcode_start + 1,
        discriminant: None,
        sets_flags,
        mnemonics,
        description,
    }
}

const fn d(
    tag: Codec,
    style: OperandStyle,
    opcode: u16,
    mnemonics: &'static [&'static str],
    description: &'static str,
) -> CodecInfo {
    CodecInfo {
        tag,
        format: Format::D,
        style,
        opcode_start: opcode,
        opcode_end: opcode,
        discriminant: None,
        sets_flags: false,
        mnemonics,
        description,
    }
}

const fn cond(
    tag: Codec,
    code: u8,
    mnemonics: &'static [&'static str],
    description: &'static str,
) -> CodecInfo {
    CodecInfo {
        tag,
        format: Format::Cb,
        style: OperandStyle::CondLabel,
        opcode_start: 0x2A0,
        opcode_end: 0x2A7,
        discriminant: Some(code),
        sets_flags: false,
        mnemonics,
        description,
    }
}

/// The codec catalogue. Order matches the [`Codec`] ordinals.
pub const CODECS: &[CodecInfo] = &[
    r(Codec::Add, OperandStyle::XXX, 0x458, None, false, &["ADD"], "Add"),
    r(Codec::Adds, OperandStyle::XXX, 0x558, None, true, &["ADDS"], "Add and set flags"),
    i(Codec::Addi, 0x488, false, &["ADDI"], "Add immediate"),
    i(Codec::Addis, 0x588, true, &["ADDIS"], "Add immediate and set flags"),
    r(Codec::Sub, OperandStyle::XXX, 0x658, None, false, &["SUB"], "Subtract"),
    r(Codec::Subs, OperandStyle::XXX, 0x758, None, true, &["SUBS"], "Subtract and set flags"),
    i(Codec::Subi, 0x688, false, &["SUBI"], "Subtract immediate"),
    i(Codec::Subis, 0x788, true, &["SUBIS"], "Subtract immediate and set flags"),
    r(Codec::And, OperandStyle::XXX, 0x450, None, false, &["AND"], "Bitwise and"),
    r(Codec::Ands, OperandStyle::XXX, 0x750, None, true, &["ANDS"], "Bitwise and, set flags"),
    i(Codec::Andi, 0x490, false, &["ANDI"], "Bitwise and immediate"),
    i(Codec::Andis, 0x790, true, &["ANDIS"], "Bitwise and immediate, set flags"),
    r(Codec::Orr, OperandStyle::XXX, 0x550, None, false, &["ORR"], "Bitwise inclusive or"),
    i(Codec::Orri, 0x590, false, &["ORRI"], "Bitwise inclusive or immediate"),
    r(Codec::Eor, OperandStyle::XXX, 0x650, None, false, &["EOR"], "Bitwise exclusive or"),
    i(Codec::Eori, 0x690, false, &["EORI"], "Bitwise exclusive or immediate"),
    r(Codec::Lsl, OperandStyle::XXShamt, 0x69B, None, false, &["LSL"], "Logical shift left"),
    r(Codec::Lsr, OperandStyle::XXShamt, 0x69A, None, false, &["LSR"], "Logical shift right"),
    CodecInfo {
        tag: Codec::Movz,
        format: Format::Iw,
        style: OperandStyle::MovImm,
        opcode_start: 0x694,
        opcode_end: 0x697,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["MOVZ"],
        description: "Move 16-bit immediate, zeroing the rest",
    },
    CodecInfo {
        tag: Codec::Movk,
        format: Format::Iw,
        style: OperandStyle::MovImm,
        opcode_start: 0x794,
        opcode_end: 0x797,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["MOVK"],
        description: "Move 16-bit immediate, keeping the rest",
    },
    r(Codec::Mul, OperandStyle::XXX, 0x4D8, Some(0x1F), false, &["MUL"], "Multiply"),
    r(Codec::Sdiv, OperandStyle::XXX, 0x4D6, Some(0x02), false, &["SDIV"], "Signed divide"),
    r(Codec::Udiv, OperandStyle::XXX, 0x4D6, Some(0x03), false, &["UDIV"], "Unsigned divide"),
    r(Codec::Smulh, OperandStyle::XXX, 0x4DA, None, false, &["SMULH"], "Signed multiply high"),
    r(Codec::Umulh, OperandStyle::XXX, 0x4DE, None, false, &["UMULH"], "Unsigned multiply high"),
    CodecInfo {
        tag: Codec::B,
        format: Format::B,
        style: OperandStyle::Label,
        opcode_start: 0x0A0,
        opcode_end: 0x0BF,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["B"],
        description: "Branch",
    },
    CodecInfo {
        tag: Codec::Bl,
        format: Format::B,
        style: OperandStyle::Label,
        opcode_start: 0x4A0,
        opcode_end: 0x4BF,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["BL"],
        description: "Branch with link",
    },
    r(Codec::Br, OperandStyle::X, 0x6B0, None, false, &["BR"], "Branch to register"),
    cond(Codec::Beq, 0x0, &["B.EQ", "BEQ"], "Branch if equal"),
    cond(Codec::Bne, 0x1, &["B.NE", "BNE"], "Branch if not equal"),
    cond(Codec::Bhs, 0x2, &["B.HS", "BHS"], "Branch if unsigned higher or same"),
    cond(Codec::Blo, 0x3, &["B.LO", "BLO"], "Branch if unsigned lower"),
    cond(Codec::Bmi, 0x4, &["B.MI", "BMI"], "Branch if minus"),
    cond(Codec::Bpl, 0x5, &["B.PL", "BPL"], "Branch if plus or zero"),
    cond(Codec::Bvs, 0x6, &["B.VS", "BVS"], "Branch if overflow set"),
    cond(Codec::Bvc, 0x7, &["B.VC", "BVC"], "Branch if overflow clear"),
    cond(Codec::Bhi, 0x8, &["B.HI", "BHI"], "Branch if unsigned higher"),
    cond(Codec::Bls, 0x9, &["B.LS", "BLS"], "Branch if unsigned lower or same"),
    cond(Codec::Bge, 0xA, &["B.GE", "BGE"], "Branch if signed greater or equal"),
    cond(Codec::Blt, 0xB, &["B.LT", "BLT"], "Branch if signed less"),
    cond(Codec::Bgt, 0xC, &["B.GT", "BGT"], "Branch if signed greater"),
    cond(Codec::Ble, 0xD, &["B.LE", "BLE"], "Branch if signed less or equal"),
    CodecInfo {
        tag: Codec::Cbz,
        format: Format::Cb,
        style: OperandStyle::RegLabel,
        opcode_start: 0x5A0,
        opcode_end: 0x5A7,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["CBZ"],
        description: "Compare and branch if zero",
    },
    CodecInfo {
        tag: Codec::Cbnz,
        format: Format::Cb,
        style: OperandStyle::RegLabel,
        opcode_start: 0x5A8,
        opcode_end: 0x5AF,
        discriminant: None,
        sets_flags: false,
        mnemonics: &["CBNZ"],
        description: "Compare and branch if not zero",
    },
    d(Codec::Ldur, OperandStyle::MemX, 0x7C2, &["LDUR"], "Load doubleword"),
    d(Codec::Ldurb, OperandStyle::MemX, 0x1C2, &["LDURB"], "Load byte, zero-extended"),
    d(Codec::Ldurh, OperandStyle::MemX, 0x3C2, &["LDURH"], "Load halfword, zero-extended"),
    d(Codec::Ldursw, OperandStyle::MemX, 0x5C4, &["LDURSW"], "Load word, sign-extended"),
    d(Codec::Ldxr, OperandStyle::MemX, 0x642, &["LDXR"], "Load exclusive (plain load in this dialect)"),
    d(Codec::Stur, OperandStyle::MemX, 0x7C0, &["STUR"], "Store doubleword"),
    d(Codec::Sturb, OperandStyle::MemX, 0x1C0, &["STURB"], "Store byte"),
    d(Codec::Sturh, OperandStyle::MemX, 0x3C0, &["STURH"], "Store halfword"),
    d(Codec::Sturw, OperandStyle::MemX, 0x5C0, &["STURW"], "Store word"),
    d(Codec::Stxr, OperandStyle::StoreExclusive, 0x640, &["STXR"], "Store exclusive (plain store in this dialect)"),
    r(Codec::Fadds, OperandStyle::Sss, 0x0F1, Some(0x0A), false, &["FADDS"], "Float add, single"),
    r(Codec::Faddd, OperandStyle::Ddd, 0x0F3, Some(0x0A), false, &["FADDD"], "Float add, double"),
    r(Codec::Fsubs, OperandStyle::Sss, 0x0F1, Some(0x0E), false, &["FSUBS"], "Float subtract, single"),
    r(Codec::Fsubd, OperandStyle::Ddd, 0x0F3, Some(0x0E), false, &["FSUBD"], "Float subtract, double"),
    r(Codec::Fmuls, OperandStyle::Sss, 0x0F1, Some(0x02), false, &["FMULS"], "Float multiply, single"),
    r(Codec::Fmuld, OperandStyle::Ddd, 0x0F3, Some(0x02), false, &["FMULD"], "Float multiply, double"),
    r(Codec::Fdivs, OperandStyle::Sss, 0x0F1, Some(0x06), false, &["FDIVS"], "Float divide, single"),
    r(Codec::Fdivd, OperandStyle::Ddd, 0x0F3, Some(0x06), false, &["FDIVD"], "Float divide, double"),
    r(Codec::Fcmps, OperandStyle::Ss, 0x0F1, Some(0x08), true, &["FCMPS"], "Float compare, single"),
    r(Codec::Fcmpd, OperandStyle::Dd, 0x0F3, Some(0x08), true, &["FCMPD"], "Float compare, double"),
    d(Codec::Ldurs, OperandStyle::MemS, 0x5E2, &["LDURS"], "Load single-precision float"),
    d(Codec::Ldurd, OperandStyle::MemD, 0x7E2, &["LDURD"], "Load double-precision float"),
    d(Codec::Sturs, OperandStyle::MemS, 0x5E0, &["STURS"], "Store single-precision float"),
    d(Codec::Sturd, OperandStyle::MemD, 0x7E0, &["STURD"], "Store double-precision float"),
    r(Codec::Halt, OperandStyle::Empty, 0x7FF, None, false, &["HALT"], "Stop execution"),
    r(Codec::Dump, OperandStyle::Empty, 0x7FE, None, false, &["DUMP"], "Log a dump marker"),
    r(Codec::Prnt, OperandStyle::Prnt, 0x7FD, None, false, &["PRNT"], "Print a register"),
    r(Codec::Prnl, OperandStyle::Empty, 0x7FC, None, false, &["PRNL"], "Print a newline"),
    r(Codec::Time, OperandStyle::Time, 0x7FB, None, false, &["TIME"], "Read wall-clock milliseconds"),
];

impl Codec {
    /// Catalogue row for this tag.
    #[inline]
    pub fn info(self) -> &'static CodecInfo {
        &CODECS[self as usize]
    }

    /// Primary mnemonic.
    #[inline]
    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonics[0]
    }

    /// Exact-match mnemonic lookup over all aliases.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        mnemonic_map().get(mnemonic).copied()
    }

    /// The fixed condition of a conditional-branch codec.
    pub fn condition(self) -> Option<Condition> {
        let info = self.info();
        if info.style == OperandStyle::CondLabel {
            Condition::from_u8(info.discriminant?)
        } else {
            None
        }
    }

    /// Branch-family instructions set the PC themselves; everything
    /// else increments it and rewrites X31 to zero.
    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Codec::B
                | Codec::Bl
                | Codec::Br
                | Codec::Beq
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
                | Codec::Ble
                | Codec::Cbz
                | Codec::Cbnz
        )
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

static MNEMONIC_MAP: LazyLock<HashMap<&'static str, Codec>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for info in CODECS {
        for &mnemonic in info.mnemonics {
            let previous = map.insert(mnemonic, info.tag);
            assert!(
                previous.is_none(),
                "mnemonic {mnemonic} claimed by two codecs"
            );
        }
    }
    map
});

/// Exact-string map from every accepted mnemonic to its codec tag.
pub fn mnemonic_map() -> &'static HashMap<&'static str, Codec> {
    &MNEMONIC_MAP
}

static OPCODE_LOOKUP: LazyLock<Vec<Slot>> = LazyLock::new(|| {
    verify_table();
    let mut slots = vec![Slot::Empty; PREFIX_SLOTS];
    for info in CODECS {
        for prefix in info.opcode_start..=info.opcode_end {
            let slot = &mut slots[prefix as usize];
            *slot = match *slot {
                Slot::Empty => Slot::Unique(info.tag),
                Slot::Unique(_) | Slot::Ambiguous => Slot::Ambiguous,
            };
        }
    }
    slots
});

/// The 2048-slot fast lookup over the 11-bit opcode prefix.
pub fn opcode_lookup() -> &'static [Slot] {
    &OPCODE_LOOKUP
}

/// Catalogue consistency check: entries may share opcode prefixes
/// only when both carry discriminators of the same format and the
/// values differ. Violations abort at startup.
fn verify_table() {
    for (index, info) in CODECS.iter().enumerate() {
        assert_eq!(
            info.tag as usize, index,
            "catalogue row {index} is out of order"
        );
        for other in &CODECS[index + 1..] {
            let overlaps =
                info.opcode_start <= other.opcode_end && other.opcode_start <= info.opcode_end;
            if !overlaps {
                continue;
            }
            let compatible = info.format == other.format
                && info.discriminant.is_some()
                && other.discriminant.is_some()
                && info.discriminant != other.discriminant;
            assert!(
                compatible,
                "codecs {} and {} overlap without distinct discriminators",
                info.mnemonics[0], other.mnemonics[0]
            );
        }
    }
}
