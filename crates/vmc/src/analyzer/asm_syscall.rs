//! Syscall analyzer over the assembly pipeline.

use std::path::Path;

use tracing::debug;

use crate::analyzer::{absolute, build_call_graph, Analyzer};
use crate::profile::VmProfile;
use crate::trace::{should_ignore, trace_asm_caller};
use crate::{CallStack, Issue, Result, Severity};

pub(crate) const SYSCALL_IMPACT: &str = "This syscall is present in the program, but its \
     execution depends on the actual runtime behavior. If the execution path does not reach \
     this syscall, it may not affect execution.";

pub(crate) const SYSCALL_REFERENCE: &str = "README.md#how-it-works";

/// Resolves the number behind every `syscall` instruction and checks it
/// against the allowed and NOOP sets.
pub struct AsmSyscallAnalyzer<'p> {
    profile: &'p VmProfile,
}

impl<'p> AsmSyscallAnalyzer<'p> {
    pub fn new(profile: &'p VmProfile) -> Self {
        Self { profile }
    }
}

impl Analyzer for AsmSyscallAnalyzer<'_> {
    fn analyze(&self, path: &Path, with_trace: bool) -> Result<Vec<Issue>> {
        let arch = self.profile.arch()?;
        let graph = build_call_graph(path, self.profile)?;
        let abs_path = absolute(path);

        let mut issues = Vec::new();
        for segment in graph.segments() {
            for instruction in &segment.instructions {
                if !instruction.is_syscall() {
                    continue;
                }
                for site in graph.resolve_syscalls(segment, instruction)? {
                    // Allowed wins over NOOP when a number is in both sets.
                    if self.profile.is_syscall_allowed(site.number) {
                        continue;
                    }

                    let Ok(mut source) =
                        trace_asm_caller(&abs_path, &graph, &site.segment_label, arch)
                    else {
                        debug!(
                            number = site.number,
                            segment = %site.segment_label,
                            "dropping unreachable syscall finding"
                        );
                        continue;
                    };
                    if !with_trace {
                        source.call_stack = None;
                    }

                    let (mut severity, message) = if self.profile.is_syscall_noop(site.number) {
                        (
                            Severity::Warning,
                            format!("Potential NOOP Syscall Detected: {}", site.number),
                        )
                    } else {
                        (
                            Severity::Critical,
                            format!("Potential Incompatible Syscall Detected: {}", site.number),
                        )
                    };
                    if severity == Severity::Critical
                        && should_ignore(&source, &self.profile.ignored_functions)
                    {
                        severity = Severity::Warning;
                    }

                    issues.push(Issue {
                        severity,
                        message,
                        impact: Some(SYSCALL_IMPACT.to_string()),
                        reference: Some(SYSCALL_REFERENCE.to_string()),
                        call_stack: Some(source),
                    });
                }
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
