//! Instruction execution
//!
//! One instruction per call: the VM's run loop and the debugger's
//! single-step both come through here. Dispatch is a jump table over
//! the cached codec tag, so the per-iteration decode cost is one
//! array read done at load time.
//!
//! Register values are signed 64-bit and reinterpreted as unsigned
//! for shifts, bitwise operations, and addresses. After every
//! non-branch instruction the PC advances by one and X31 is rewritten
//! to zero; branch-family instructions set the PC themselves.

use crate::exception::{BreakpointCause, Exception, FpeCause, Result};
use crate::memory::Memory;
use crate::output::OutputSink;
use crate::state::VmState;
use legv8_isa::condition::Condition;
use legv8_isa::{encoding as enc, Codec, TEXT_END, TEXT_START};
use std::time::{SystemTime, UNIX_EPOCH};

/// Execute one instruction.
pub fn execute_one(
    tag: Codec,
    word: u32,
    state: &mut VmState,
    memory: &mut Memory,
    sink: &mut OutputSink,
) -> Result<()> {
    let rd = enc::rd(word) as usize;
    let rn = enc::rn(word) as usize;
    let rm = enc::rm(word) as usize;

    match tag {
        // ========== Integer arithmetic ==========
        Codec::Add => {
            state.x[rd] = state.x[rn].wrapping_add(state.x[rm]);
        }
        Codec::Adds => {
            let (a, b) = (state.x[rn], state.x[rm]);
            state.x[rd] = add_set_flags(state, a, b);
        }
        Codec::Addi => {
            state.x[rd] = state.x[rn].wrapping_add(enc::alu_immediate(word));
        }
        Codec::Addis => {
            let a = state.x[rn];
            state.x[rd] = add_set_flags(state, a, enc::alu_immediate(word));
        }
        Codec::Sub => {
            state.x[rd] = state.x[rn].wrapping_sub(state.x[rm]);
        }
        Codec::Subs => {
            let (a, b) = (state.x[rn], state.x[rm]);
            state.x[rd] = sub_set_flags(state, a, b);
        }
        Codec::Subi => {
            state.x[rd] = state.x[rn].wrapping_sub(enc::alu_immediate(word));
        }
        Codec::Subis => {
            let a = state.x[rn];
            state.x[rd] = sub_set_flags(state, a, enc::alu_immediate(word));
        }

        // ========== Bitwise ==========
        Codec::And => {
            state.x[rd] = state.x[rn] & state.x[rm];
        }
        Codec::Ands => {
            let result = state.x[rn] & state.x[rm];
            state.x[rd] = logic_set_flags(state, result);
        }
        Codec::Andi => {
            state.x[rd] = state.x[rn] & enc::alu_immediate(word);
        }
        Codec::Andis => {
            let result = state.x[rn] & enc::alu_immediate(word);
            state.x[rd] = logic_set_flags(state, result);
        }
        Codec::Orr => {
            state.x[rd] = state.x[rn] | state.x[rm];
        }
        Codec::Orri => {
            state.x[rd] = state.x[rn] | enc::alu_immediate(word);
        }
        Codec::Eor => {
            state.x[rd] = state.x[rn] ^ state.x[rm];
        }
        Codec::Eori => {
            state.x[rd] = state.x[rn] ^ enc::alu_immediate(word);
        }

        // ========== Shifts ==========
        Codec::Lsl => {
            state.x[rd] = ((state.x[rn] as u64) << enc::shamt(word)) as i64;
        }
        Codec::Lsr => {
            state.x[rd] = ((state.x[rn] as u64) >> enc::shamt(word)) as i64;
        }

        // ========== Wide moves ==========
        Codec::Movz => {
            let shift = 16 * enc::mov_shift(word) as u32;
            state.x[rd] = (enc::mov_immediate(word) as i64) << shift;
        }
        Codec::Movk => {
            let shift = 16 * enc::mov_shift(word) as u32;
            let kept = state.x[rd] & !(0xFFFFi64 << shift);
            state.x[rd] = kept | ((enc::mov_immediate(word) as i64) << shift);
        }

        // ========== Multiply / divide ==========
        Codec::Mul => {
            state.x[rd] = state.x[rn].wrapping_mul(state.x[rm]);
        }
        Codec::Sdiv => {
            let divisor = state.x[rm];
            if divisor == 0 {
                return Err(Exception::FloatingPoint(FpeCause::DivisionByZero));
            }
            state.x[rd] = state.x[rn].wrapping_div(divisor);
        }
        Codec::Udiv => {
            let divisor = state.x[rm] as u64;
            if divisor == 0 {
                return Err(Exception::FloatingPoint(FpeCause::DivisionByZero));
            }
            state.x[rd] = ((state.x[rn] as u64) / divisor) as i64;
        }
        Codec::Smulh => {
            let product = state.x[rn] as i128 * state.x[rm] as i128;
            state.x[rd] = (product >> 64) as i64;
        }
        Codec::Umulh => {
            let product = (state.x[rn] as u64 as u128) * (state.x[rm] as u64 as u128);
            state.x[rd] = ((product >> 64) as u64) as i64;
        }

        // ========== Branches ==========
        Codec::B => {
            let target = state.pc as i64 + enc::br_address(word);
            return branch_to(state, target);
        }
        Codec::Bl => {
            state.x[30] = (TEXT_START + (state.pc as u64 + 1) * 4) as i64;
            let target = state.pc as i64 + enc::br_address(word);
            return branch_to(state, target);
        }
        Codec::Br => {
            let target = state.x[rn] as u64;
            if target < TEXT_START || target >= TEXT_END || target % 4 != 0 {
                return Err(Exception::Pc);
            }
            state.pc = ((target - TEXT_START) / 4) as usize;
            return Ok(());
        }
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
        | Codec::Ble => {
            let condition = tag
                .info()
                .discriminant
                .and_then(Condition::from_u8)
                .ok_or(Exception::Instruction)?;
            return if condition.holds(state.flags) {
                let target = state.pc as i64 + enc::cond_br_address(word);
                branch_to(state, target)
            } else {
                state.pc += 1;
                Ok(())
            };
        }
        Codec::Cbz | Codec::Cbnz => {
            let taken = (state.x[rd] == 0) == (tag == Codec::Cbz);
            return if taken {
                let target = state.pc as i64 + enc::cond_br_address(word);
                branch_to(state, target)
            } else {
                state.pc += 1;
                Ok(())
            };
        }

        // ========== Integer loads ==========
        Codec::Ldur => {
            state.x[rd] = memory.read_u64(effective_address(state, rn, word))? as i64;
        }
        Codec::Ldurb => {
            state.x[rd] = memory.read_u8(effective_address(state, rn, word))? as i64;
        }
        Codec::Ldurh => {
            state.x[rd] = memory.read_u16(effective_address(state, rn, word))? as i64;
        }
        Codec::Ldursw => {
            state.x[rd] = memory.read_u32(effective_address(state, rn, word))? as i32 as i64;
        }
        Codec::Ldxr => {
            // Plain aligned load in this dialect; no exclusivity.
            state.x[rd] = memory.read_u64(effective_address(state, rn, word))? as i64;
        }

        // ========== Integer stores ==========
        Codec::Stur => {
            memory.write_u64(effective_address(state, rn, word), state.x[rd] as u64)?;
        }
        Codec::Sturb => {
            memory.write_u8(effective_address(state, rn, word), state.x[rd] as u8)?;
        }
        Codec::Sturh => {
            memory.write_u16(effective_address(state, rn, word), state.x[rd] as u16)?;
        }
        Codec::Sturw => {
            memory.write_u32(effective_address(state, rn, word), state.x[rd] as u32)?;
        }
        Codec::Stxr => {
            // Plain store; the status register named by dt_address is
            // then cleared to signal success.
            let status = enc::dt_address(word) as usize;
            if status >= state.x.len() {
                return Err(Exception::Instruction);
            }
            memory.write_u64(state.x[rn] as u64, state.x[rd] as u64)?;
            state.x[status] = 0;
        }

        // ========== Floating point ==========
        Codec::Fadds => {
            state.s[rd] = state.s[rn] + state.s[rm];
        }
        Codec::Faddd => {
            state.d[rd] = state.d[rn] + state.d[rm];
        }
        Codec::Fsubs => {
            state.s[rd] = state.s[rn] - state.s[rm];
        }
        Codec::Fsubd => {
            state.d[rd] = state.d[rn] - state.d[rm];
        }
        Codec::Fmuls => {
            state.s[rd] = state.s[rn] * state.s[rm];
        }
        Codec::Fmuld => {
            state.d[rd] = state.d[rn] * state.d[rm];
        }
        Codec::Fdivs => {
            if state.s[rm] == 0.0 {
                return Err(Exception::FloatingPoint(FpeCause::DivisionByZero));
            }
            state.s[rd] = state.s[rn] / state.s[rm];
        }
        Codec::Fdivd => {
            if state.d[rm] == 0.0 {
                return Err(Exception::FloatingPoint(FpeCause::DivisionByZero));
            }
            state.d[rd] = state.d[rn] / state.d[rm];
        }
        Codec::Fcmps => {
            let (a, b) = (state.s[rn], state.s[rm]);
            compare_set_flags(state, a.partial_cmp(&b));
        }
        Codec::Fcmpd => {
            let (a, b) = (state.d[rn], state.d[rm]);
            compare_set_flags(state, a.partial_cmp(&b));
        }
        Codec::Ldurs => {
            state.s[rd] = memory.read_f32(effective_address(state, rn, word))?;
        }
        Codec::Ldurd => {
            state.d[rd] = memory.read_f64(effective_address(state, rn, word))?;
        }
        Codec::Sturs => {
            memory.write_f32(effective_address(state, rn, word), state.s[rd])?;
        }
        Codec::Sturd => {
            memory.write_f64(effective_address(state, rn, word), state.d[rd])?;
        }

        // ========== Emulator extensions ==========
        Codec::Halt => {
            return Err(Exception::Breakpoint(BreakpointCause::Halt));
        }
        Codec::Dump => {
            sink.write("dump!\n");
            sink.flush();
            return Err(Exception::Breakpoint(BreakpointCause::Dump));
        }
        Codec::Prnt => {
            let line = match rn {
                0 => {
                    let value = state.x[rd];
                    format!("X{rd}: 0x{:016X} ({value})\n", value as u64)
                }
                1 => {
                    let value = state.s[rd];
                    format!("S{rd}: {value:e} ({value})\n")
                }
                2 => {
                    let value = state.d[rd];
                    format!("D{rd}: {value:e} ({value})\n")
                }
                _ => return Err(Exception::Instruction),
            };
            sink.write(&line);
            sink.flush();
        }
        Codec::Prnl => {
            sink.write("\n");
            sink.flush();
        }
        Codec::Time => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as i64)
                .unwrap_or(0);
            state.x[rd] = millis;
        }
    }

    state.pc += 1;
    state.x[31] = 0;
    Ok(())
}

/// D-type effective address: base register plus unsigned 9-bit offset.
#[inline]
fn effective_address(state: &VmState, rn: usize, word: u32) -> u64 {
    (state.x[rn] as u64).wrapping_add(enc::dt_address(word) as u64)
}

/// Redirect the PC, faulting if the target leaves the text segment.
fn branch_to(state: &mut VmState, target: i64) -> Result<()> {
    if target < 0 {
        return Err(Exception::Pc);
    }
    let byte_address = TEXT_START + (target as u64) * 4;
    if byte_address >= TEXT_END {
        return Err(Exception::Pc);
    }
    state.pc = target as usize;
    Ok(())
}

fn add_set_flags(state: &mut VmState, a: i64, b: i64) -> i64 {
    let (result, overflow) = a.overflowing_add(b);
    let (_, carry) = (a as u64).overflowing_add(b as u64);
    state.flags.n = result < 0;
    state.flags.z = result == 0;
    state.flags.c = carry;
    state.flags.v = overflow;
    result
}

fn sub_set_flags(state: &mut VmState, a: i64, b: i64) -> i64 {
    let (result, overflow) = a.overflowing_sub(b);
    let (_, borrow) = (a as u64).overflowing_sub(b as u64);
    state.flags.n = result < 0;
    state.flags.z = result == 0;
    // Carry means "no borrow", so unsigned HS/LO predicates read
    // straight off the flag.
    state.flags.c = !borrow;
    state.flags.v = overflow;
    result
}

/// Bitwise flag variants touch only N and Z.
fn logic_set_flags(state: &mut VmState, result: i64) -> i64 {
    state.flags.n = result < 0;
    state.flags.z = result == 0;
    result
}

/// FP compares pack the outcome into NZCV: equal (0,1,1,0), less
/// (1,0,0,0), greater (0,0,1,0), unordered (0,0,1,1).
fn compare_set_flags(state: &mut VmState, ordering: Option<std::cmp::Ordering>) {
    use std::cmp::Ordering;
    let (n, z, c, v) = match ordering {
        Some(Ordering::Equal) => (false, true, true, false),
        Some(Ordering::Less) => (true, false, false, false),
        Some(Ordering::Greater) => (false, false, true, false),
        None => (false, false, true, true),
    };
    state.flags.n = n;
    state.flags.z = z;
    state.flags.c = c;
    state.flags.v = v;
}
