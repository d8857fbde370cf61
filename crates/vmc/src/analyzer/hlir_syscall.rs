//! Syscall analyzer over the compiled program's high-level IR.
//!
//! The IR module comes from an external provider; this analyzer accepts
//! its JSON interchange form on disk or an in-memory [`Module`].

use std::path::Path;

use vmc_hlir::{CallGraph, EdgeId, HlirError, Module, SyscallResolver};

use crate::analyzer::Analyzer;
use crate::analyzer::asm_syscall::{SYSCALL_IMPACT, SYSCALL_REFERENCE};
use crate::profile::VmProfile;
use crate::{CallStack, Error, Issue, Result, Severity};

/// Detects calls into known syscall APIs in the program IR and resolves
/// their first argument backwards to concrete numbers.
pub struct HlirSyscallAnalyzer<'p> {
    profile: &'p VmProfile,
}

impl<'p> HlirSyscallAnalyzer<'p> {
    pub fn new(profile: &'p VmProfile) -> Self {
        Self { profile }
    }

    /// Analyze an already-loaded module.
    pub fn analyze_module(&self, module: &Module, with_trace: bool) -> Result<Vec<Issue>> {
        let resolver = SyscallResolver::new(module);

        let mut issues = Vec::new();
        for finding in resolver.findings() {
            if self.profile.is_syscall_allowed(finding.number) {
                continue;
            }

            let mut source = path_to_call_stack(module, resolver.graph(), &finding.path);
            if !with_trace {
                if let Some(source) = source.as_mut() {
                    source.call_stack = None;
                }
            }

            let (severity, message) = if self.profile.is_syscall_noop(finding.number) {
                (
                    Severity::Warning,
                    format!("Potential NOOP Syscall Detected: {}", finding.number),
                )
            } else {
                (
                    Severity::Critical,
                    format!("Potential Incompatible Syscall Detected: {}", finding.number),
                )
            };

            issues.push(Issue {
                severity,
                message,
                impact: Some(SYSCALL_IMPACT.to_string()),
                reference: Some(SYSCALL_REFERENCE.to_string()),
                call_stack: source,
            });
        }
        Ok(issues)
    }
}

impl Analyzer for HlirSyscallAnalyzer<'_> {
    fn analyze(&self, path: &Path, with_trace: bool) -> Result<Vec<Issue>> {
        let module = Module::from_json_file(path)?;
        self.analyze_module(&module, with_trace)
    }

    fn trace_stack(&self, path: &Path, function: &str) -> Result<CallStack> {
        let module = Module::from_json_file(path)?;
        if module.find_function(function).is_none() {
            return Err(HlirError::UnknownFunction(function.to_string()).into());
        }
        let resolver = SyscallResolver::new(&module);
        let edges = resolver
            .find_path(function)
            .ok_or_else(|| Error::TraceNotFound {
                function: function.to_string(),
            })?;
        path_to_call_stack(&module, resolver.graph(), &edges).ok_or_else(|| Error::TraceNotFound {
            function: function.to_string(),
        })
    }
}

/// Convert an entry-to-site edge path into a frame chain. The head frame
/// is the entry-most call site; parameter-resolved findings may carry an
/// empty path and produce no chain.
fn path_to_call_stack(module: &Module, graph: &CallGraph, path: &[EdgeId]) -> Option<CallStack> {
    let mut chain: Option<CallStack> = None;
    for &id in path.iter().rev() {
        let edge = graph.edge(id);
        let caller = module.function(edge.caller);
        chain = Some(CallStack {
            file: edge.pos.file.clone(),
            line: edge.pos.line,
            function: caller.name.clone(),
            abs_path: edge.pos.file.clone(),
            call_stack: chain.map(Box::new),
        });
    }
    chain
}
