use thiserror::Error;

/// Analyzer errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("assembly analysis error: {0}")]
    Asm(#[from] vmc_asm::AsmError),
    #[error("HLIR analysis error: {0}")]
    Hlir(#[from] vmc_hlir::HlirError),
    #[error("failed to parse profile: {0}")]
    Profile(#[from] serde_yaml::Error),
    #[error("unsupported goarch: {0}")]
    UnsupportedArch(String),
    #[error("could not find {function} in {path}")]
    FunctionNotFound { function: String, path: String },
    #[error("no trace found to an entry point for {function}")]
    TraceNotFound { function: String },
    #[error("disassembler failed: {0}")]
    Disasm(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
