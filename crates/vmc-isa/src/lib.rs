//! MIPS instruction model for the vmc compatibility analyzer.
//!
//! Decodes 32-bit MIPS words (as found in objdump listings) into R/I/J
//! forms and exposes the instruction record the rest of the analyzer
//! works with. Covers MIPS32 and MIPS64 encodings; the decoder only
//! distinguishes the fields the analysis needs.

mod decode;
mod encode;
mod instruction;

pub use decode::{DecodedWord, decode};
pub use encode::{encode_i, encode_j, encode_r};
pub use instruction::{Instruction, InstructionForm, Operands};

/// `$zero` register index.
pub const REG_ZERO: u8 = 0;
/// `$v0` register index (syscall number on entry to `syscall`).
pub const REG_V0: u8 = 2;
/// `$sp` register index (stack pointer).
pub const REG_SP: u8 = 29;

/// Opcode of `j`.
pub const OPCODE_J: u8 = 0x02;
/// Opcode of `jal`.
pub const OPCODE_JAL: u8 = 0x03;
