//! VMC - compatibility analyzer for MIPS programs targeting restricted VMs.
//!
//! Given a compiled program and a VM profile (allowed opcodes, allowed
//! syscalls, NOOP syscalls, ignored call-graph roots), reports potential
//! incompatibilities: instructions outside the VM's ISA subset and
//! syscalls outside its allowed set, each with a call chain back to a
//! program entry point.
//!
//! # Example
//!
//! ```ignore
//! use vmc::{analyzer::OpcodeAnalyzer, Analyzer, VmProfile};
//!
//! let profile = VmProfile::load("profiles/example.yaml")?;
//! let issues = OpcodeAnalyzer::new(&profile).analyze("program.dump".as_ref(), true)?;
//! ```

pub mod analyzer;
pub mod disasm;
pub mod issue;
pub mod profile;
pub mod renderer;
pub mod trace;

mod error;

pub use analyzer::Analyzer;
pub use error::{Error, Result};
pub use issue::{CallStack, Issue, Severity};
pub use profile::{Arch, OpcodeSpec, VmProfile};
