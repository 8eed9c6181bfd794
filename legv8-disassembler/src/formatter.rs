//! Instruction formatting to assembly text

use legv8_isa::codec::OperandStyle;
use legv8_isa::{encoding, Codec};

/// Format one decoded instruction as assembly text. Branch targets
/// render as signed instruction-unit offsets.
pub fn format(tag: Codec, word: u32) -> String {
    let info = tag.info();
    let mnemonic = tag.mnemonic();
    match info.style {
        OperandStyle::XXX => format!(
            "{mnemonic} X{}, X{}, X{}",
            encoding::rd(word),
            encoding::rn(word),
            encoding::rm(word)
        ),
        OperandStyle::XXShamt => format!(
            "{mnemonic} X{}, X{}, #{}",
            encoding::rd(word),
            encoding::rn(word),
            encoding::shamt(word)
        ),
        OperandStyle::X => format!("{mnemonic} X{}", encoding::rn(word)),
        OperandStyle::Sss => format!(
            "{mnemonic} S{}, S{}, S{}",
            encoding::rd(word),
            encoding::rn(word),
            encoding::rm(word)
        ),
        OperandStyle::Ddd => format!(
            "{mnemonic} D{}, D{}, D{}",
            encoding::rd(word),
            encoding::rn(word),
            encoding::rm(word)
        ),
        OperandStyle::Ss => {
            format!("{mnemonic} S{}, S{}", encoding::rn(word), encoding::rm(word))
        }
        OperandStyle::Dd => {
            format!("{mnemonic} D{}, D{}", encoding::rn(word), encoding::rm(word))
        }
        OperandStyle::Empty => mnemonic.to_string(),
        OperandStyle::Time => format!("{mnemonic} X{}", encoding::rd(word)),
        OperandStyle::Prnt => {
            let file = match encoding::rn(word) {
                1 => 'S',
                2 => 'D',
                _ => 'X',
            };
            format!("{mnemonic} {file}{}", encoding::rd(word))
        }
        OperandStyle::XXImm => format!(
            "{mnemonic} X{}, X{}, #{}",
            encoding::rd(word),
            encoding::rn(word),
            encoding::alu_immediate(word)
        ),
        OperandStyle::MemX | OperandStyle::MemS | OperandStyle::MemD => {
            let file = match info.style {
                OperandStyle::MemS => 'S',
                OperandStyle::MemD => 'D',
                _ => 'X',
            };
            format!(
                "{mnemonic} {file}{}, [X{}, #{}]",
                encoding::rd(word),
                encoding::rn(word),
                encoding::dt_address(word)
            )
        }
        OperandStyle::StoreExclusive => format!(
            "{mnemonic} X{}, X{}, [X{}]",
            encoding::dt_address(word),
            encoding::rd(word),
            encoding::rn(word)
        ),
        OperandStyle::Label => format!("{mnemonic} #{}", encoding::br_address(word)),
        OperandStyle::CondLabel => format!("{mnemonic} #{}", encoding::cond_br_address(word)),
        OperandStyle::RegLabel => format!(
            "{mnemonic} X{}, #{}",
            encoding::rd(word),
            encoding::cond_br_address(word)
        ),
        OperandStyle::MovImm => {
            let shift = encoding::mov_shift(word) as u32 * 16;
            if shift == 0 {
                format!("{mnemonic} X{}, #{}", encoding::rd(word), encoding::mov_immediate(word))
            } else {
                format!(
                    "{mnemonic} X{}, #{}, LSL #{}",
                    encoding::rd(word),
                    encoding::mov_immediate(word),
                    shift
                )
            }
        }
    }
}
