//! Opcode checker: every decoded instruction against the allowed set.

use std::path::Path;

use tracing::debug;

use crate::analyzer::{absolute, build_call_graph, Analyzer};
use crate::profile::VmProfile;
use crate::trace::{should_ignore, trace_asm_caller};
use crate::{CallStack, Issue, Result, Severity};

/// Flags instructions whose (opcode, funct) pair the VM does not
/// implement.
pub struct OpcodeAnalyzer<'p> {
    profile: &'p VmProfile,
}

impl<'p> OpcodeAnalyzer<'p> {
    pub fn new(profile: &'p VmProfile) -> Self {
        Self { profile }
    }
}

impl Analyzer for OpcodeAnalyzer<'_> {
    fn analyze(&self, path: &Path, with_trace: bool) -> Result<Vec<Issue>> {
        let arch = self.profile.arch()?;
        let graph = build_call_graph(path, self.profile)?;
        let abs_path = absolute(path);

        let mut issues = Vec::new();
        for segment in graph.segments() {
            for instruction in &segment.instructions {
                let opcode = instruction.opcode_hex();
                let funct = instruction.funct_hex();
                if self.profile.is_opcode_allowed(&opcode, &funct) {
                    continue;
                }

                let Ok(mut source) = trace_asm_caller(&abs_path, &graph, &segment.label, arch)
                else {
                    // No path to an entry point: dead code, not reported.
                    debug!(segment = %segment.label, %opcode, "dropping unreachable opcode finding");
                    continue;
                };
                if !with_trace {
                    source.call_stack = None;
                }

                let severity = if should_ignore(&source, &self.profile.ignored_functions) {
                    Severity::Warning
                } else {
                    Severity::Critical
                };

                issues.push(Issue {
                    severity,
                    message: format!(
                        "Potential Incompatible Opcode Detected: Opcode: {opcode}, Funct: {funct}"
                    ),
                    impact: None,
                    reference: None,
                    call_stack: Some(source),
                });
            }
        }
        Ok(issues)
    }

    fn trace_stack(&self, path: &Path, function: &str) -> Result<CallStack> {
        let arch = self.profile.arch()?;
        let graph = build_call_graph(path, self.profile)?;
        trace_asm_caller(&absolute(path), &graph, function, arch)
    }
}
