//! VM profile: the configuration record every analyzer consumes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Target architecture of the analyzed program.
///
/// Tags are matched case-sensitively; `mips` and `mips32` name the same
/// 32-bit target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    Mips32,
    Mips64,
}

impl Arch {
    /// Parse a `goarch` value.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "mips" | "mips32" => Some(Self::Mips32),
            "mips64" => Some(Self::Mips64),
            _ => None,
        }
    }

    /// True when `function` is a recognised program entry point for this
    /// architecture: the terminal of every reported trace.
    pub fn is_entry_point(self, function: &str) -> bool {
        match self {
            // rt0_go itself is skipped on 32-bit: it contains portions
            // the runtime never reaches.
            Self::Mips32 => {
                function == "runtime.check"
                    || function == "runtime.args"
                    || function == "runtime.osinit"
                    || function == "runtime.schedinit"
                    || function == "runtime.newproc"
                    || function == "runtime.mstart"
                    || function == "main.main"
                    || function.contains(".init.")
                    || function.ends_with(".init")
            }
            Self::Mips64 => {
                function == "runtime.rt0_go"
                    || function == "main.main"
                    || function.contains(".init.")
                    || function.ends_with(".init")
            }
        }
    }
}

/// One allowed opcode, optionally narrowed to specific funct codes.
#[derive(Clone, Debug, Deserialize)]
pub struct OpcodeSpec {
    /// Opcode as a hex string, e.g. `"0x1c"`.
    pub opcode: String,
    /// Allowed funct codes; empty means any funct (or none at all).
    #[serde(default)]
    pub funct: Vec<String>,
}

/// Configuration for a specific VM.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VmProfile {
    #[serde(rename = "vm", default)]
    pub vm_name: String,
    #[serde(default)]
    pub goos: String,
    #[serde(default)]
    pub goarch: String,
    #[serde(default)]
    pub allowed_opcodes: Vec<OpcodeSpec>,
    #[serde(default)]
    pub allowed_syscalls: Vec<i64>,
    /// Syscalls the VM accepts but ignores; findings demote to warnings.
    #[serde(default)]
    pub noop_syscalls: Vec<i64>,
    /// Functions whose presence anywhere in a call chain demotes a
    /// finding from critical to warning.
    #[serde(default)]
    pub ignored_functions: Vec<String>,
}

impl VmProfile {
    /// Load a profile from a YAML file and apply defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut profile: Self = serde_yaml::from_reader(BufReader::new(file))?;
        profile.set_defaults();
        Ok(profile)
    }

    /// Fill in defaults for absent fields.
    pub fn set_defaults(&mut self) {
        if self.goos.is_empty() {
            self.goos = "linux".to_string();
        }
        if self.goarch.is_empty() {
            self.goarch = "mips".to_string();
        }
    }

    /// The profile's architecture, or an error for unsupported tags.
    pub fn arch(&self) -> Result<Arch> {
        Arch::parse(&self.goarch).ok_or_else(|| Error::UnsupportedArch(self.goarch.clone()))
    }

    /// Whether an (opcode, funct) pair is inside the VM's ISA subset.
    ///
    /// Hex strings compare case-insensitively. An entry without funct
    /// codes matches the opcode regardless of funct, including I/J-form
    /// instructions that have none.
    pub fn is_opcode_allowed(&self, opcode: &str, funct: &str) -> bool {
        self.allowed_opcodes.iter().any(|spec| {
            if !spec.opcode.eq_ignore_ascii_case(opcode) {
                return false;
            }
            spec.funct.is_empty() || spec.funct.iter().any(|f| f.eq_ignore_ascii_case(funct))
        })
    }

    pub fn is_syscall_allowed(&self, number: i64) -> bool {
        self.allowed_syscalls.contains(&number)
    }

    pub fn is_syscall_noop(&self, number: i64) -> bool {
        self.noop_syscalls.contains(&number)
    }
}
