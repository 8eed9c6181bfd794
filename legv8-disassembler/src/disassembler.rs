//! Program listings
//!
//! Renders an assembled program back to text, one line per word,
//! with byte addresses and label definitions interleaved. This is
//! the listing the debugger shows around the current PC.

use crate::decoder::decode;
use crate::formatter::format;
use legv8_isa::Program;

/// Disassemble a whole program into a listing.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    for (index, &word) in program.code.iter().enumerate() {
        for (name, at) in &program.labels {
            if *at == index {
                out.push_str(name);
                out.push_str(":\n");
            }
        }
        let text = match decode(word) {
            Ok(tag) => format(tag, word),
            Err(_) => format!(".word {word:#010x}"),
        };
        out.push_str(&format!("{:#010x}:  {}\n", program.address_of(index), text));
    }
    out
}
