//! Call-stack reconstruction over the assembly call graph.

use std::collections::HashSet;
use std::path::Path;

use vmc_asm::{CallGraph, Segment};

use crate::profile::Arch;
use crate::{CallStack, Error, Result};

/// Build the call chain from `function` up to an entry point of `arch`.
///
/// Depth-first over reverse edges; the first branch whose leaf satisfies
/// the entry predicate wins. The head frame is the target function, the
/// tail frame the entry point. Unreachable functions yield
/// [`Error::TraceNotFound`]; callers drop such findings.
pub fn trace_asm_caller(
    file_path: &Path,
    graph: &CallGraph,
    function: &str,
    arch: Arch,
) -> Result<CallStack> {
    let segment = graph
        .find_by_label(function)
        .ok_or_else(|| Error::FunctionNotFound {
            function: function.to_string(),
            path: file_path.display().to_string(),
        })?;

    let mut seen = HashSet::new();
    visit(file_path, graph, segment, arch, &mut seen).ok_or_else(|| Error::TraceNotFound {
        function: function.to_string(),
    })
}

fn visit(
    file_path: &Path,
    graph: &CallGraph,
    segment: &Segment,
    arch: Arch,
    seen: &mut HashSet<u64>,
) -> Option<CallStack> {
    if !seen.insert(segment.address) {
        return None;
    }

    let mut source = CallStack {
        file: file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        line: segment.line,
        function: segment.label.clone(),
        abs_path: file_path.display().to_string(),
        call_stack: None,
    };

    if arch.is_entry_point(&segment.label) {
        return Some(source);
    }

    for parent in graph.parents_of(segment) {
        if let Some(chain) = visit(file_path, graph, parent, arch, seen) {
            source.append(chain);
            return Some(source);
        }
    }
    None
}

/// True when any frame of the chain names an ignored function.
pub fn should_ignore(call_stack: &CallStack, ignored: &[String]) -> bool {
    call_stack
        .frames()
        .any(|frame| ignored.iter().any(|name| name == &frame.function))
}
