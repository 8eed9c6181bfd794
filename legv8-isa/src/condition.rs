//! Condition codes and NZCV flags
//!
//! The conditional-branch family shares one opcode range; the 4-bit
//! condition lives in the `rt` field and discriminates the members.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four condition flags: Negative, Zero, Carry, oVerflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nzcv {
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
}

impl Nzcv {
    pub const fn new(n: bool, z: bool, c: bool, v: bool) -> Self {
        Self { n, z, c, v }
    }
}

impl fmt::Display for Nzcv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |b| if b { '1' } else { '0' };
        write!(
            f,
            "N={} Z={} C={} V={}",
            bit(self.n),
            bit(self.z),
            bit(self.c),
            bit(self.v)
        )
    }
}

/// Branch condition (4-bit encoding in the CB `rt` field)
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Eq = 0x0,
    Ne = 0x1,
    Hs = 0x2,
    Lo = 0x3,
    Mi = 0x4,
    Pl = 0x5,
    Vs = 0x6,
    Vc = 0x7,
    Hi = 0x8,
    Ls = 0x9,
    Ge = 0xA,
    Lt = 0xB,
    Gt = 0xC,
    Le = 0xD,
}

impl Condition {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Condition::Eq),
            0x1 => Some(Condition::Ne),
            0x2 => Some(Condition::Hs),
            0x3 => Some(Condition::Lo),
            0x4 => Some(Condition::Mi),
            0x5 => Some(Condition::Pl),
            0x6 => Some(Condition::Vs),
            0x7 => Some(Condition::Vc),
            0x8 => Some(Condition::Hi),
            0x9 => Some(Condition::Ls),
            0xA => Some(Condition::Ge),
            0xB => Some(Condition::Lt),
            0xC => Some(Condition::Gt),
            0xD => Some(Condition::Le),
            _ => None,
        }
    }

    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Evaluate the branch predicate against the current flags.
    #[inline]
    pub fn holds(self, f: Nzcv) -> bool {
        match self {
            Condition::Eq => f.z,
            Condition::Ne => !f.z,
            Condition::Hs => f.c,
            Condition::Lo => !f.c,
            Condition::Mi => f.n,
            Condition::Pl => !f.n,
            Condition::Vs => f.v,
            Condition::Vc => !f.v,
            Condition::Hi => !f.z && f.c,
            Condition::Ls => !(!f.z && f.c),
            Condition::Ge => f.n == f.v,
            Condition::Lt => f.n != f.v,
            Condition::Gt => !f.z && f.n == f.v,
            Condition::Le => !(!f.z && f.n == f.v),
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Condition::Eq => "EQ",
            Condition::Ne => "NE",
            Condition::Hs => "HS",
            Condition::Lo => "LO",
            Condition::Mi => "MI",
            Condition::Pl => "PL",
            Condition::Vs => "VS",
            Condition::Vc => "VC",
            Condition::Hi => "HI",
            Condition::Ls => "LS",
            Condition::Ge => "GE",
            Condition::Lt => "LT",
            Condition::Gt => "GT",
            Condition::Le => "LE",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}
