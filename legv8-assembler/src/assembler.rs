//! Main assembler logic
//!
//! Line-oriented: each line is empty, a label definition, or one
//! instruction (a label may be followed by an instruction on the same
//! line). Mnemonics resolve through the codec table first, then the
//! pseudo-instructions MOV, LDA, CMP, and CMPI. Forward references
//! are parked in a pending list and patched when their label appears.
//!
//! On any syntax error the line is abandoned up to its newline and
//! the diagnostic recorded; assembly continues with the next line.

use crate::error::{AssembleError, AssembleFailure, ErrorKind, Result};
use crate::lexer::{Lexer, Token};
use legv8_isa::codec::OperandStyle;
use legv8_isa::encoding;
use legv8_isa::program::{Annotation, BranchKind};
use legv8_isa::{Codec, Program, Register, TEXT_START};
use std::collections::HashMap;
use std::ops::Range;

/// Assemble source text into a program.
///
/// All diagnostics are accumulated; the run fails if any were
/// recorded, with errors sorted in source order.
pub fn assemble(source: &str) -> std::result::Result<Program, AssembleFailure> {
    Assembler::new(source).run()
}

/// A reference to a label the assembler has not seen yet.
struct Pending<'a> {
    name: &'a str,
    span: Range<usize>,
    index: usize,
    kind: BranchKind,
}

struct Assembler<'a> {
    text: &'a str,
    lexer: Lexer<'a>,
    token: Token,
    span: Range<usize>,
    program: Program,
    /// name -> (instruction index, label-table index)
    labels: HashMap<&'a str, (usize, usize)>,
    pending: Vec<Pending<'a>>,
    errors: Vec<AssembleError>,
}

impl<'a> Assembler<'a> {
    fn new(text: &'a str) -> Self {
        let mut lexer = Lexer::new(text);
        let token = lexer.next_token();
        let span = lexer.span();
        Self {
            text,
            lexer,
            token,
            span,
            program: Program::new(),
            labels: HashMap::new(),
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> std::result::Result<Program, AssembleFailure> {
        loop {
            match self.token {
                Token::Eof => break,
                Token::Newline => self.bump(),
                _ => {
                    if let Err(error) = self.statement() {
                        self.errors.push(error);
                        self.recover();
                    }
                }
            }
        }

        for pending in &self.pending {
            self.errors
                .push(AssembleError::new(ErrorKind::UndefinedLabel, pending.span.clone()));
        }

        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            self.errors.sort_by_key(|error| error.span.start);
            Err(AssembleFailure {
                errors: self.errors,
            })
        }
    }

    fn bump(&mut self) {
        self.token = self.lexer.next_token();
        self.span = self.lexer.span();
    }

    fn slice(&self) -> &'a str {
        &self.text[self.span.clone()]
    }

    /// Consume through the next newline.
    fn recover(&mut self) {
        loop {
            match self.token {
                Token::Eof => return,
                Token::Newline => {
                    self.bump();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) -> Result<()> {
        match self.token {
            Token::Identifier => {
                let name = self.slice();
                let span = self.span.clone();
                self.bump();
                if self.token == Token::Colon {
                    self.bump();
                    self.define_label(name, span)?;
                    return match self.token {
                        Token::Newline => {
                            self.bump();
                            Ok(())
                        }
                        Token::Eof => Ok(()),
                        _ => self.statement(),
                    };
                }
                self.instruction(name, span)
            }
            Token::DotIdentifier => {
                let name = self.slice();
                let span = self.span.clone();
                self.bump();
                if self.token == Token::Colon {
                    return Err(AssembleError::new(ErrorKind::DotLabel, span));
                }
                self.instruction(name, span)
            }
            Token::Colon => Err(AssembleError::new(ErrorKind::EmptyLabel, self.span.clone())),
            _ => Err(AssembleError::new(
                ErrorKind::UnexpectedToken,
                self.span.clone(),
            )),
        }
    }

    fn define_label(&mut self, name: &'a str, span: Range<usize>) -> Result<()> {
        if self.labels.contains_key(name) {
            return Err(AssembleError::new(ErrorKind::DuplicateLabelName, span));
        }
        let target = self.program.code.len();
        let table_index = self.program.labels.len();
        self.labels.insert(name, (target, table_index));
        self.program.labels.push((name.to_string(), target));

        // Patch everything that was waiting for this name.
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].name != name {
                i += 1;
                continue;
            }
            let pending = self.pending.remove(i);
            if let Err(error) = self.patch(&pending, target, table_index) {
                self.errors.push(error);
            }
        }
        Ok(())
    }

    fn patch(&mut self, pending: &Pending<'a>, target: usize, table_index: usize) -> Result<()> {
        match pending.kind {
            BranchKind::B | BranchKind::Cb => {
                let offset = target as i64 - pending.index as i64;
                let word = self.program.code[pending.index];
                self.program.code[pending.index] = match pending.kind {
                    BranchKind::B => {
                        if !encoding::fits_br_address(offset) {
                            return self.far_jump(pending);
                        }
                        encoding::patch_br_address(word, offset)
                    }
                    _ => {
                        if !encoding::fits_cond_br_address(offset) {
                            return self.far_jump(pending);
                        }
                        encoding::patch_cond_br_address(word, offset)
                    }
                };
                self.program.annotations[pending.index].label_ref = Some(table_index);
            }
            BranchKind::Lda => {
                let address = TEXT_START + 4 * target as u64;
                let low = self.program.code[pending.index];
                let high = self.program.code[pending.index + 1];
                self.program.code[pending.index] =
                    encoding::patch_mov_immediate(low, address as u16);
                self.program.code[pending.index + 1] =
                    encoding::patch_mov_immediate(high, (address >> 16) as u16);
                self.program.annotations[pending.index].label_ref = Some(table_index);
            }
        }
        Ok(())
    }

    fn far_jump(&mut self, pending: &Pending<'a>) -> Result<()> {
        self.program.needs_relocations = true;
        Err(AssembleError::new(
            ErrorKind::UnimplementedFarJump,
            pending.span.clone(),
        ))
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    fn instruction(&mut self, mnemonic: &'a str, span: Range<usize>) -> Result<()> {
        if let Some(tag) = Codec::from_mnemonic(mnemonic) {
            self.operands(tag, span)?;
            return self.expect_line_end();
        }
        match mnemonic {
            "MOV" => self.pseudo_mov(span)?,
            "LDA" => self.pseudo_lda(span)?,
            "CMP" => self.pseudo_cmp(span)?,
            "CMPI" => self.pseudo_cmpi(span)?,
            _ => return Err(AssembleError::new(ErrorKind::UnknownMnemonic, span)),
        }
        self.expect_line_end()
    }

    fn operands(&mut self, tag: Codec, span: Range<usize>) -> Result<()> {
        let info = tag.info();
        let opcode = info.opcode_value();
        let offset = span.start;
        let fixed_shamt = info.discriminant.unwrap_or(0);

        match info.style {
            OperandStyle::XXX => {
                let rd = self.expect_x()?;
                self.expect_comma()?;
                let rn = self.expect_x()?;
                self.expect_comma()?;
                let rm = self.expect_x()?;
                self.emit(encoding::encode_r(opcode, rm, fixed_shamt, rn, rd), tag, offset);
            }
            OperandStyle::XXShamt => {
                let rd = self.expect_x()?;
                self.expect_comma()?;
                let rn = self.expect_x()?;
                self.expect_comma()?;
                let shamt = self.expect_integer_in(0, 63, ErrorKind::ShiftAmountOverflow)?;
                self.emit(encoding::encode_r(opcode, 0, shamt as u8, rn, rd), tag, offset);
            }
            OperandStyle::X => {
                let rn = self.expect_x()?;
                self.emit(encoding::encode_r(opcode, 0, 0, rn, 0), tag, offset);
            }
            OperandStyle::Sss | OperandStyle::Ddd => {
                let rd = self.expect_fp(info.style == OperandStyle::Sss)?;
                self.expect_comma()?;
                let rn = self.expect_fp(info.style == OperandStyle::Sss)?;
                self.expect_comma()?;
                let rm = self.expect_fp(info.style == OperandStyle::Sss)?;
                self.emit(encoding::encode_r(opcode, rm, fixed_shamt, rn, rd), tag, offset);
            }
            OperandStyle::Ss | OperandStyle::Dd => {
                let rn = self.expect_fp(info.style == OperandStyle::Ss)?;
                self.expect_comma()?;
                let rm = self.expect_fp(info.style == OperandStyle::Ss)?;
                self.emit(encoding::encode_r(opcode, rm, fixed_shamt, rn, 0), tag, offset);
            }
            OperandStyle::Empty => {
                self.emit(encoding::encode_r(opcode, 0, 0, 0, 0), tag, offset);
            }
            OperandStyle::Time => {
                let rd = match self.token {
                    Token::XReg(index) => {
                        self.bump();
                        index
                    }
                    _ => Register::X0.index() as u8,
                };
                self.emit(encoding::encode_r(opcode, 0, 0, 0, rd), tag, offset);
            }
            OperandStyle::Prnt => {
                let (register, file) = match self.token {
                    Token::XReg(index) => (index, 0),
                    Token::SReg(index) => (index, 1),
                    Token::DReg(index) => (index, 2),
                    got => {
                        return Err(self.expected("register", got));
                    }
                };
                self.bump();
                self.emit(encoding::encode_r(opcode, 0, 0, file, register), tag, offset);
            }
            OperandStyle::XXImm => {
                let rd = self.expect_x()?;
                self.expect_comma()?;
                let rn = self.expect_x()?;
                self.expect_comma()?;
                let imm = self.expect_integer_in(-2048, 2047, ErrorKind::ImmediateOverflow)?;
                self.emit(encoding::encode_i(opcode, imm, rn, rd), tag, offset);
            }
            OperandStyle::MemX | OperandStyle::MemS | OperandStyle::MemD => {
                let rt = match info.style {
                    OperandStyle::MemX => self.expect_x()?,
                    OperandStyle::MemS => self.expect_fp(true)?,
                    _ => self.expect_fp(false)?,
                };
                self.expect_comma()?;
                let (rn, dt) = self.address_operand()?;
                self.emit(encoding::encode_d(opcode, dt, 0, rn, rt), tag, offset);
            }
            OperandStyle::StoreExclusive => {
                let status = self.expect_x()?;
                self.expect_comma()?;
                let rt = self.expect_x()?;
                self.expect_comma()?;
                self.expect_token(Token::LBracket, "'['")?;
                let rn = self.expect_x()?;
                self.expect_token(Token::RBracket, "']'")?;
                self.emit(encoding::encode_d(opcode, status as u16, 0, rn, rt), tag, offset);
            }
            OperandStyle::Label => {
                let (name, name_span) = self.expect_label()?;
                let word = encoding::encode_b(opcode, 0);
                self.emit_branch(tag, word, BranchKind::B, name, name_span, offset)?;
            }
            OperandStyle::CondLabel => {
                let (name, name_span) = self.expect_label()?;
                let word = encoding::encode_cb(opcode, 0, fixed_shamt);
                self.emit_branch(tag, word, BranchKind::Cb, name, name_span, offset)?;
            }
            OperandStyle::RegLabel => {
                let rt = self.expect_x()?;
                self.expect_comma()?;
                let (name, name_span) = self.expect_label()?;
                let word = encoding::encode_cb(opcode, 0, rt);
                self.emit_branch(tag, word, BranchKind::Cb, name, name_span, offset)?;
            }
            OperandStyle::MovImm => {
                let rd = self.expect_x()?;
                self.expect_comma()?;
                let imm = self.expect_integer_in(0, 0xFFFF, ErrorKind::MovImmediateOverflow)?;
                let shift = self.mov_shift()?;
                self.emit(encoding::encode_iw(opcode, shift, imm as u16, rd), tag, offset);
            }
        }
        Ok(())
    }

    /// Optional `, LSL #s` tail of a wide move; `s` in {0, 16, 32, 48}.
    fn mov_shift(&mut self) -> Result<u8> {
        if self.token != Token::Comma {
            return Ok(0);
        }
        self.bump();
        if self.token != Token::Identifier || self.slice() != "LSL" {
            return Err(AssembleError::new(ErrorKind::MovNoLsl, self.span.clone()));
        }
        self.bump();
        let span = self.span.clone();
        let shift = self.expect_integer()?;
        match shift {
            0 | 16 | 32 | 48 => Ok((shift / 16) as u8),
            _ => Err(AssembleError::new(ErrorKind::MovShiftOverflow, span)),
        }
    }

    /// `[Xn]` or `[Xn, #imm9]`.
    fn address_operand(&mut self) -> Result<(u8, u16)> {
        self.expect_token(Token::LBracket, "'['")?;
        let rn = self.expect_x()?;
        let dt = if self.token == Token::Comma {
            self.bump();
            self.expect_integer_in(0, 511, ErrorKind::LoadStoreOffsetOverflow)? as u16
        } else {
            0
        };
        self.expect_token(Token::RBracket, "']'")?;
        Ok((rn, dt))
    }

    // ========================================================================
    // Pseudo-instructions
    // ========================================================================

    /// `MOV Xd, Xn` -> `ADD Xd, Xn, XZR`
    fn pseudo_mov(&mut self, span: Range<usize>) -> Result<()> {
        let rd = self.expect_x()?;
        self.expect_comma()?;
        let rn = self.expect_x()?;
        let opcode = Codec::Add.info().opcode_value();
        let xzr = Register::XZR.index() as u8;
        self.emit(encoding::encode_r(opcode, xzr, 0, rn, rd), Codec::Add, span.start);
        Ok(())
    }

    /// `CMP Xn, Xm` -> `SUBS XZR, Xn, Xm`
    fn pseudo_cmp(&mut self, span: Range<usize>) -> Result<()> {
        let rn = self.expect_x()?;
        self.expect_comma()?;
        let rm = self.expect_x()?;
        let opcode = Codec::Subs.info().opcode_value();
        let xzr = Register::XZR.index() as u8;
        self.emit(encoding::encode_r(opcode, rm, 0, rn, xzr), Codec::Subs, span.start);
        Ok(())
    }

    /// `CMPI Xn, #imm` -> `SUBIS XZR, Xn, #imm`
    fn pseudo_cmpi(&mut self, span: Range<usize>) -> Result<()> {
        let rn = self.expect_x()?;
        self.expect_comma()?;
        let imm = self.expect_integer_in(-2048, 2047, ErrorKind::ImmediateOverflow)?;
        let opcode = Codec::Subis.info().opcode_value();
        let xzr = Register::XZR.index() as u8;
        self.emit(encoding::encode_i(opcode, imm, rn, xzr), Codec::Subis, span.start);
        Ok(())
    }

    /// `LDA Xd, label` -> MOVZ/MOVK sequence loading the label's
    /// absolute byte address, trailing zero halves omitted.
    fn pseudo_lda(&mut self, span: Range<usize>) -> Result<()> {
        let rd = self.expect_x()?;
        self.expect_comma()?;
        let (name, name_span) = self.expect_label()?;
        let movz = Codec::Movz.info().opcode_value();
        let movk = Codec::Movk.info().opcode_value();
        let offset = span.start;

        if let Some(&(target, table_index)) = self.labels.get(name) {
            let address = TEXT_START + 4 * target as u64;
            let index = self.program.code.len();
            self.emit(encoding::encode_iw(movz, 0, address as u16, rd), Codec::Movz, offset);
            self.program.annotations[index].label_ref = Some(table_index);
            for half in 1..4 {
                let imm = (address >> (16 * half)) as u16;
                if imm != 0 {
                    self.emit(
                        encoding::encode_iw(movk, half as u8, imm, rd),
                        Codec::Movk,
                        offset,
                    );
                }
            }
        } else {
            // Forward reference: reserve a MOVZ/MOVK pair (any text
            // address fits in 32 bits) and patch both immediates when
            // the label is defined.
            let index = self.program.code.len();
            self.emit(encoding::encode_iw(movz, 0, 0, rd), Codec::Movz, offset);
            self.emit(encoding::encode_iw(movk, 1, 0, rd), Codec::Movk, offset);
            self.pending.push(Pending {
                name,
                span: name_span,
                index,
                kind: BranchKind::Lda,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Emission
    // ========================================================================

    fn emit(&mut self, word: u32, tag: Codec, source_offset: usize) {
        self.program.code.push(word);
        self.program.annotations.push(Annotation {
            source_offset,
            tag,
            label_ref: None,
        });
    }

    fn emit_branch(
        &mut self,
        tag: Codec,
        word: u32,
        kind: BranchKind,
        name: &'a str,
        name_span: Range<usize>,
        source_offset: usize,
    ) -> Result<()> {
        let index = self.program.code.len();
        self.emit(word, tag, source_offset);

        if let Some(&(target, table_index)) = self.labels.get(name) {
            let pending = Pending {
                name,
                span: name_span,
                index,
                kind,
            };
            self.patch(&pending, target, table_index)
        } else {
            self.pending.push(Pending {
                name,
                span: name_span,
                index,
                kind,
            });
            Ok(())
        }
    }

    // ========================================================================
    // Token expectations
    // ========================================================================

    fn expected(&self, expected: &'static str, got: Token) -> AssembleError {
        AssembleError::new(
            ErrorKind::ExpectedToken {
                expected,
                got: got.describe(),
            },
            self.span.clone(),
        )
    }

    fn expect_token(&mut self, token: Token, name: &'static str) -> Result<()> {
        if self.token == token {
            self.bump();
            Ok(())
        } else {
            Err(self.expected(name, self.token))
        }
    }

    fn expect_comma(&mut self) -> Result<()> {
        self.expect_token(Token::Comma, "','")
    }

    fn expect_x(&mut self) -> Result<u8> {
        match self.token {
            Token::XReg(index) => {
                self.bump();
                Ok(index)
            }
            got => Err(self.expected("X register", got)),
        }
    }

    fn expect_fp(&mut self, single: bool) -> Result<u8> {
        match (self.token, single) {
            (Token::SReg(index), true) | (Token::DReg(index), false) => {
                self.bump();
                Ok(index)
            }
            (got, true) => Err(self.expected("S register", got)),
            (got, false) => Err(self.expected("D register", got)),
        }
    }

    fn expect_integer(&mut self) -> Result<i64> {
        match self.token {
            Token::Integer(value) => {
                self.bump();
                Ok(value)
            }
            got => Err(self.expected("integer", got)),
        }
    }

    fn expect_integer_in(&mut self, min: i64, max: i64, overflow: ErrorKind) -> Result<i64> {
        let span = self.span.clone();
        let value = self.expect_integer()?;
        if value < min || value > max {
            return Err(AssembleError::new(overflow, span));
        }
        Ok(value)
    }

    fn expect_label(&mut self) -> Result<(&'a str, Range<usize>)> {
        match self.token {
            Token::Identifier => {
                let name = self.slice();
                let span = self.span.clone();
                self.bump();
                Ok((name, span))
            }
            Token::DotIdentifier => Err(AssembleError::new(ErrorKind::DotLabel, self.span.clone())),
            got => Err(self.expected("label", got)),
        }
    }

    fn expect_line_end(&mut self) -> Result<()> {
        match self.token {
            Token::Newline => {
                self.bump();
                Ok(())
            }
            Token::Eof => Ok(()),
            got => Err(self.expected("newline", got)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legv8_isa::encoding as enc;

    fn assemble_one(line: &str) -> u32 {
        let program = assemble(line).expect("assembly failed");
        assert_eq!(program.code.len(), 1, "expected one instruction");
        program.code[0]
    }

    fn first_error(source: &str) -> ErrorKind {
        assemble(source).unwrap_err().errors[0].kind.clone()
    }

    #[test]
    fn test_empty_program() {
        let program = assemble("").unwrap();
        assert!(program.is_empty());
        let program = assemble("\n\n// comment only\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_r_type() {
        let word = assemble_one("ADD X1, X2, X3");
        assert_eq!(enc::prefix(word), 0x458);
        assert_eq!(enc::rd(word), 1);
        assert_eq!(enc::rn(word), 2);
        assert_eq!(enc::rm(word), 3);
    }

    #[test]
    fn test_register_keywords() {
        let word = assemble_one("ADD SP, FP, XZR");
        assert_eq!(enc::rd(word), 28);
        assert_eq!(enc::rn(word), 29);
        assert_eq!(enc::rm(word), 31);
    }

    #[test]
    fn test_shift_operand() {
        let word = assemble_one("LSL X1, X2, #3");
        assert_eq!(enc::prefix(word), 0x69B);
        assert_eq!(enc::shamt(word), 3);
        assert_eq!(first_error("LSL X1, X2, #64"), ErrorKind::ShiftAmountOverflow);
    }

    #[test]
    fn test_i_type_signed_range() {
        let word = assemble_one("ADDI X1, XZR, #-2048");
        assert_eq!(enc::alu_immediate(word), -2048);
        assert_eq!(
            first_error("ADDI X1, XZR, #2048"),
            ErrorKind::ImmediateOverflow
        );
    }

    #[test]
    fn test_d_type_offset() {
        let word = assemble_one("LDUR X1, [X2, #8]");
        assert_eq!(enc::prefix(word), 0x7C2);
        assert_eq!(enc::dt_address(word), 8);

        let word = assemble_one("LDUR X1, [X2]");
        assert_eq!(enc::dt_address(word), 0);

        assert_eq!(
            first_error("LDUR X1, [X2, #512]"),
            ErrorKind::LoadStoreOffsetOverflow
        );
    }

    #[test]
    fn test_store_exclusive() {
        let word = assemble_one("STXR X5, X6, [X7]");
        assert_eq!(enc::prefix(word), 0x640);
        assert_eq!(enc::dt_address(word), 5);
        assert_eq!(enc::rd(word), 6);
        assert_eq!(enc::rn(word), 7);
    }

    #[test]
    fn test_movz_with_shift() {
        let word = assemble_one("MOVZ X1, #42, LSL #16");
        assert_eq!(enc::mov_immediate(word), 42);
        assert_eq!(enc::mov_shift(word), 1);

        let word = assemble_one("MOVZ X1, #42");
        assert_eq!(enc::mov_shift(word), 0);
    }

    #[test]
    fn test_mov_shift_errors() {
        assert_eq!(first_error("MOVZ X1, #70000"), ErrorKind::MovImmediateOverflow);
        assert_eq!(first_error("MOVZ X1, #1, LSL #8"), ErrorKind::MovShiftOverflow);
        assert_eq!(first_error("MOVZ X1, #1, #16"), ErrorKind::MovNoLsl);
    }

    #[test]
    fn test_backward_branch() {
        let program = assemble("top:\nADD X1, X1, X2\nB top\n").unwrap();
        assert_eq!(enc::br_address(program.code[1]), -1);
        assert_eq!(program.annotations[1].label_ref, Some(0));
    }

    #[test]
    fn test_forward_branch() {
        let program = assemble("B end\nADD X1, X1, X2\nend: HALT\n").unwrap();
        assert_eq!(enc::br_address(program.code[0]), 2);
        assert_eq!(program.labels, vec![("end".to_string(), 2)]);
    }

    #[test]
    fn test_conditional_branch_aliases() {
        let dotted = assemble("loop: B.EQ loop\n").unwrap();
        let plain = assemble("loop: BEQ loop\n").unwrap();
        assert_eq!(dotted.code, plain.code);
        assert_eq!(enc::rd(dotted.code[0]), 0x0);
    }

    #[test]
    fn test_cbz_operands() {
        let program = assemble("top: CBNZ X9, top\n").unwrap();
        assert_eq!(enc::prefix(program.code[0]) >> 3, 0xB5);
        assert_eq!(enc::rd(program.code[0]), 9);
    }

    #[test]
    fn test_pseudo_mov_expands_to_add() {
        let word = assemble_one("MOV X3, X4");
        assert_eq!(enc::prefix(word), 0x458);
        assert_eq!(enc::rd(word), 3);
        assert_eq!(enc::rn(word), 4);
        assert_eq!(enc::rm(word), 31);
    }

    #[test]
    fn test_pseudo_cmp_expands_to_subs() {
        let word = assemble_one("CMP X1, X2");
        assert_eq!(enc::prefix(word), 0x758);
        assert_eq!(enc::rd(word), 31);

        let word = assemble_one("CMPI X1, #5");
        assert_eq!(enc::prefix(word) >> 1, 0x3C4);
        assert_eq!(enc::rd(word), 31);
        assert_eq!(enc::alu_immediate(word), 5);
    }

    #[test]
    fn test_lda_backward_minimal_sequence() {
        // Label at index 0: address 0x40_0000 needs halves 0 and 1.
        let program = assemble("start:\nLDA X1, start\n").unwrap();
        assert_eq!(program.code.len(), 2);
        assert_eq!(program.annotations[0].tag, Codec::Movz);
        assert_eq!(enc::mov_immediate(program.code[0]), 0x0000);
        assert_eq!(enc::mov_shift(program.code[0]), 0);
        assert_eq!(program.annotations[1].tag, Codec::Movk);
        assert_eq!(enc::mov_immediate(program.code[1]), 0x0040);
        assert_eq!(enc::mov_shift(program.code[1]), 1);
    }

    #[test]
    fn test_lda_forward_pair() {
        let program = assemble("LDA X1, end\nend: HALT\n").unwrap();
        assert_eq!(program.code.len(), 3);
        // end is at index 2 -> 0x40_0008.
        assert_eq!(enc::mov_immediate(program.code[0]), 0x0008);
        assert_eq!(enc::mov_immediate(program.code[1]), 0x0040);
        assert_eq!(program.annotations[0].label_ref, Some(0));
    }

    #[test]
    fn test_prnt_register_files() {
        let x = assemble_one("PRNT X3");
        assert_eq!((enc::rd(x), enc::rn(x)), (3, 0));
        let s = assemble_one("PRNT S4");
        assert_eq!((enc::rd(s), enc::rn(s)), (4, 1));
        let d = assemble_one("PRNT D5");
        assert_eq!((enc::rd(d), enc::rn(d)), (5, 2));
    }

    #[test]
    fn test_time_default_register() {
        let word = assemble_one("TIME");
        assert_eq!(enc::rd(word), 0);
        let word = assemble_one("TIME X7");
        assert_eq!(enc::rd(word), 7);
    }

    #[test]
    fn test_fp_operands() {
        let word = assemble_one("FADDS S1, S2, S3");
        assert_eq!(enc::prefix(word), 0x0F1);
        assert_eq!(enc::shamt(word), 0x0A);

        let word = assemble_one("FCMPD D1, D2");
        assert_eq!(enc::prefix(word), 0x0F3);
        assert_eq!(enc::shamt(word), 0x08);
        assert_eq!(enc::rn(word), 1);
        assert_eq!(enc::rm(word), 2);

        assert!(matches!(
            first_error("FADDS S1, D2, S3"),
            ErrorKind::ExpectedToken { expected: "S register", .. }
        ));
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert_eq!(first_error("BOGUS X0, X0"), ErrorKind::UnknownMnemonic);
    }

    #[test]
    fn test_duplicate_label() {
        assert_eq!(
            first_error("dup: HALT\ndup: HALT\n"),
            ErrorKind::DuplicateLabelName
        );
    }

    #[test]
    fn test_undefined_label() {
        assert_eq!(first_error("B nowhere\n"), ErrorKind::UndefinedLabel);
    }

    #[test]
    fn test_dot_label_rejected() {
        assert_eq!(first_error("a.b: HALT\n"), ErrorKind::DotLabel);
        assert_eq!(first_error("B a.b\n"), ErrorKind::DotLabel);
    }

    #[test]
    fn test_empty_label() {
        assert_eq!(first_error(": HALT\n"), ErrorKind::EmptyLabel);
    }

    #[test]
    fn test_missing_newline() {
        assert!(matches!(
            first_error("HALT HALT"),
            ErrorKind::ExpectedToken { expected: "newline", .. }
        ));
    }

    #[test]
    fn test_error_recovery_continues() {
        let failure = assemble("BOGUS\nADD X1 X2\nHALT\n").unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        assert_eq!(failure.errors[0].kind, ErrorKind::UnknownMnemonic);
    }

    #[test]
    fn test_errors_sorted_in_source_order() {
        let failure = assemble("B missing\nBOGUS\n").unwrap_err();
        assert_eq!(failure.errors[0].kind, ErrorKind::UndefinedLabel);
        assert_eq!(failure.errors[1].kind, ErrorKind::UnknownMnemonic);
    }

    #[test]
    fn test_label_with_instruction_on_same_line() {
        let program = assemble("go: PRNL\n").unwrap();
        assert_eq!(program.code.len(), 1);
        assert_eq!(program.labels, vec![("go".to_string(), 0)]);
    }
}
