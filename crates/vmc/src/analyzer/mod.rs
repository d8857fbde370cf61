//! Analyzers: each scans one aspect of the program against the profile.

mod asm_syscall;
mod hlir_syscall;
mod opcode;

pub use asm_syscall::AsmSyscallAnalyzer;
pub use hlir_syscall::HlirSyscallAnalyzer;
pub use opcode::OpcodeAnalyzer;

use std::path::Path;

use crate::profile::VmProfile;
use crate::{CallStack, Issue, Result};

/// Common analyzer capability set.
pub trait Analyzer {
    /// Scan the program at `path` and return the findings. `with_trace`
    /// keeps full call chains on each issue; otherwise only the origin
    /// frame is reported.
    fn analyze(&self, path: &Path, with_trace: bool) -> Result<Vec<Issue>>;

    /// Build the call chain for a named function, for debugging.
    fn trace_stack(&self, path: &Path, function: &str) -> Result<CallStack>;
}

/// Parse the disassembly at `path` for the profile's architecture.
fn build_call_graph(path: &Path, profile: &VmProfile) -> Result<vmc_asm::CallGraph> {
    profile.arch()?;
    Ok(vmc_asm::parse_file(path)?)
}

/// Absolute form of `path` for reporting.
fn absolute(path: &Path) -> std::path::PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
