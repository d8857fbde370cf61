//! Instruction record shared by the parser and the analyzers.

use std::fmt;

use crate::decode::DecodedWord;

/// MIPS instruction form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionForm {
    R,
    I,
    J,
}

impl fmt::Display for InstructionForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::R => write!(f, "R-Type"),
            Self::I => write!(f, "I-Type"),
            Self::J => write!(f, "J-Type"),
        }
    }
}

/// Form-specific operand fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    /// R-form: register indices plus shift amount and function code.
    R { rs: u8, rt: u8, rd: u8, shamt: u8, funct: u8 },
    /// I-form: registers plus 16-bit immediate, sign-extended.
    I { rs: u8, rt: u8, imm: i64 },
    /// J-form: byte-addressed jump target.
    J { target: u64 },
}

/// A decoded instruction positioned in a disassembly listing.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Program counter.
    pub address: u64,
    /// Primary opcode (bits [31:26]).
    pub opcode: u8,
    /// Operand fields for the instruction's form.
    pub operands: Operands,
    /// Mnemonic as printed by the disassembler (lowercase).
    pub mnemonic: String,
    /// 1-based line number in the source listing.
    pub line: usize,
}

impl Instruction {
    /// Build an instruction from a decoded word and its listing context.
    pub fn new(decoded: DecodedWord, address: u64, mnemonic: String, line: usize) -> Self {
        Self {
            address,
            opcode: decoded.opcode,
            operands: decoded.operands,
            mnemonic,
            line,
        }
    }

    /// The instruction's form, implied by its operands.
    pub fn form(&self) -> InstructionForm {
        match self.operands {
            Operands::R { .. } => InstructionForm::R,
            Operands::I { .. } => InstructionForm::I,
            Operands::J { .. } => InstructionForm::J,
        }
    }

    /// True for the `syscall` instruction, matched case-insensitively.
    pub fn is_syscall(&self) -> bool {
        self.mnemonic.eq_ignore_ascii_case("syscall")
    }

    /// True for direct jumps (`j`, `jal`).
    pub fn is_jump(&self) -> bool {
        self.opcode == crate::OPCODE_J || self.opcode == crate::OPCODE_JAL
    }

    /// Jump target for J-form instructions.
    pub fn jump_target(&self) -> Option<u64> {
        match self.operands {
            Operands::J { target } => Some(target),
            _ => None,
        }
    }

    /// Opcode as lowercase hex, e.g. `0x19`.
    pub fn opcode_hex(&self) -> String {
        format!("{:#x}", self.opcode)
    }

    /// Funct as lowercase hex for R-form instructions, empty otherwise.
    pub fn funct_hex(&self) -> String {
        match self.operands {
            Operands::R { funct, .. } => format!("{funct:#x}"),
            _ => String::new(),
        }
    }

    /// Address as lowercase hex, e.g. `0x11004`.
    pub fn address_hex(&self) -> String {
        format!("{:#x}", self.address)
    }
}
