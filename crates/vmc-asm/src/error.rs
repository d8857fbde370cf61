use thiserror::Error;

/// Errors from parsing a disassembly or resolving syscall numbers.
#[derive(Error, Debug)]
pub enum AsmError {
    #[error("instruction before any segment header at line {line}")]
    OrphanInstruction { line: usize },
    #[error("invalid address at line {line}: {text}")]
    InvalidAddress { line: usize, text: String },
    #[error("invalid instruction word at line {line}: {text}")]
    InvalidWord { line: usize, text: String },
    #[error("unhandled write to tracked register in R-form instruction at {address:#x}")]
    UnhandledRTypeWrite { address: u64 },
    #[error("unhandled immediate operation on tracked register at {address:#x}")]
    UnhandledIReg { address: u64 },
    #[error("unhandled opcode touching tracked register at {address:#x}")]
    UnhandledOpcode { address: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AsmError>;
