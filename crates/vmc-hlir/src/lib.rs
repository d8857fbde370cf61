//! High-level IR substrate for the vmc compatibility analyzer.
//!
//! Models a compiled program's SSA-form intermediate representation just
//! deeply enough to find calls into known syscall APIs and trace their
//! first argument (the syscall number) backwards through constants,
//! parameters, phi nodes, globals and inter-procedural flows.
//!
//! The module itself is produced externally: either built through
//! [`ModuleBuilder`] by an embedding toolchain, or loaded from the JSON
//! interchange form via [`Module::from_json_file`].

mod builder;
mod graph;
mod module;
mod resolver;

pub use builder::ModuleBuilder;
pub use graph::{CallEdge, CallGraph, EdgeId};
pub use module::{
    Block, FuncId, Function, Global, GlobalId, Instr, Module, SourcePos, Value, ValueId,
};
pub use resolver::{SyscallFinding, SyscallResolver, DEFAULT_SYSCALL_APIS};

use thiserror::Error;

/// Errors from loading or walking an HLIR module.
#[derive(Error, Debug)]
pub enum HlirError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed HLIR module: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("function not found in module: {0}")]
    UnknownFunction(String),
}

pub type Result<T> = std::result::Result<T, HlirError>;
