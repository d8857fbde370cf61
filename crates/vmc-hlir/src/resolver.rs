//! Syscall-number resolution over the HLIR call graph.
//!
//! A depth-first walk from the program's entry points keeps the current
//! edge stack; whenever an edge lands on a known syscall API the stack
//! *is* the call path from entry to that site. The first argument of the
//! call site is then traced backwards through the value shapes in
//! [`Value`](crate::Value). Value shapes outside that set resolve to
//! nothing: a dynamically computed number is legal and simply not
//! reportable.
//!
//! Nodes are guarded per path (marked on entry, cleared on exit) so the
//! same function can be reached through alternative paths; total work is
//! bounded by `MAX_VISITS_MULTIPLIER * edges` to keep diamond-shaped
//! graphs from exploding.

use tracing::trace;

use crate::graph::{CallGraph, EdgeId};
use crate::module::{FuncId, Instr, Module, Value, ValueId};

/// Default syscall APIs: the raw-syscall entry of the Go runtime, the
/// toolchain this analyzer is pointed at in practice.
pub const DEFAULT_SYSCALL_APIS: &[&str] = &["syscall.RawSyscall6"];

/// Per-edge cap on traversal work.
const MAX_VISITS_MULTIPLIER: usize = 64;

/// Cap on backward value-resolution depth (phi cycles and the like).
const MAX_RESOLVE_DEPTH: usize = 64;

/// A resolved syscall number and the call path that reaches its site.
///
/// The path runs from the entry point to the syscall API call. It may be
/// shorter than the full chain when the number was recovered through
/// parameter passing: each parameter hop peels the innermost edge.
#[derive(Clone, Debug)]
pub struct SyscallFinding {
    pub number: i64,
    pub path: Vec<EdgeId>,
}

/// Resolver over one module.
pub struct SyscallResolver<'m> {
    module: &'m Module,
    graph: CallGraph,
    apis: Vec<String>,
}

impl<'m> SyscallResolver<'m> {
    /// Resolver with the default syscall API set.
    pub fn new(module: &'m Module) -> Self {
        Self::with_apis(
            module,
            DEFAULT_SYSCALL_APIS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Resolver intercepting a custom API set.
    pub fn with_apis(module: &'m Module, apis: Vec<String>) -> Self {
        Self {
            module,
            graph: CallGraph::build(module),
            apis,
        }
    }

    /// The derived call graph.
    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    /// All resolvable syscall numbers with their call paths.
    pub fn findings(&self) -> Vec<SyscallFinding> {
        let mut findings = Vec::new();
        for path in self.collect_api_paths() {
            let edge = self.graph.edge(*path.last().expect("recorded paths are non-empty"));
            let Some(&arg0) = edge.args.first() else {
                continue;
            };
            self.resolve(arg0, &path, 0, &mut findings);
        }
        findings
    }

    /// Shortest-found call path from an entry point to any call of the
    /// named function. `None` when the function is never reached.
    pub fn find_path(&self, function: &str) -> Option<Vec<EdgeId>> {
        let target = self.module.find_function(function)?;
        let mut stack = Vec::new();
        let mut seen = vec![false; self.module.functions.len()];
        let mut budget = self.visit_budget();
        let mut found = None;
        for entry in self.module.entry_points() {
            self.search(entry, None, target, &mut stack, &mut seen, &mut budget, &mut found);
            if found.is_some() {
                break;
            }
        }
        found
    }

    fn visit_budget(&self) -> usize {
        MAX_VISITS_MULTIPLIER * self.graph.edge_count().max(1)
    }

    /// Collect the edge stack of every path that reaches a syscall API.
    fn collect_api_paths(&self) -> Vec<Vec<EdgeId>> {
        let mut paths = Vec::new();
        let mut stack = Vec::new();
        let mut seen = vec![false; self.module.functions.len()];
        let mut budget = self.visit_budget();
        for entry in self.module.entry_points() {
            self.visit(entry, None, &mut stack, &mut seen, &mut budget, &mut paths);
        }
        paths
    }

    fn visit(
        &self,
        node: FuncId,
        edge: Option<EdgeId>,
        stack: &mut Vec<EdgeId>,
        seen: &mut [bool],
        budget: &mut usize,
        paths: &mut Vec<Vec<EdgeId>>,
    ) {
        if seen[node.0] || *budget == 0 {
            return;
        }
        *budget -= 1;
        seen[node.0] = true;

        if let Some(edge) = edge {
            stack.push(edge);
            let callee = self.module.function(self.graph.edge(edge).callee);
            if self.apis.iter().any(|api| api == &callee.name) {
                paths.push(stack.clone());
            }
        }

        for &out in self.graph.outgoing(node) {
            let callee = self.graph.edge(out).callee;
            if !seen[callee.0] {
                self.visit(callee, Some(out), stack, seen, budget, paths);
            }
        }

        if edge.is_some() {
            stack.pop();
        }
        // Cleared on exit so other paths may pass through this node.
        seen[node.0] = false;
    }

    fn search(
        &self,
        node: FuncId,
        edge: Option<EdgeId>,
        target: FuncId,
        stack: &mut Vec<EdgeId>,
        seen: &mut [bool],
        budget: &mut usize,
        found: &mut Option<Vec<EdgeId>>,
    ) {
        if found.is_some() || seen[node.0] || *budget == 0 {
            return;
        }
        *budget -= 1;
        seen[node.0] = true;

        if let Some(edge) = edge {
            stack.push(edge);
            if self.graph.edge(edge).callee == target {
                *found = Some(stack.clone());
            }
        }

        if found.is_none() {
            for &out in self.graph.outgoing(node) {
                let callee = self.graph.edge(out).callee;
                if !seen[callee.0] {
                    self.search(callee, Some(out), target, stack, seen, budget, found);
                }
            }
        }

        if edge.is_some() {
            stack.pop();
        }
        seen[node.0] = false;
    }

    /// Backward resolution of one value along one call path.
    fn resolve(
        &self,
        value: ValueId,
        path: &[EdgeId],
        depth: usize,
        findings: &mut Vec<SyscallFinding>,
    ) {
        if depth > MAX_RESOLVE_DEPTH {
            trace!(value = value.0, "resolution depth exhausted");
            return;
        }

        match self.module.value(value) {
            Value::Const(number) => {
                findings.push(SyscallFinding {
                    number: *number,
                    path: path.to_vec(),
                });
            }
            Value::Param { .. } => {
                // Inter-procedural hop: the number arrived as the first
                // argument of the call into this function.
                let mut popped = path.to_vec();
                if let Some(edge) = popped.pop() {
                    if let Some(&arg0) = self.graph.edge(edge).args.first() {
                        self.resolve(arg0, &popped, depth + 1, findings);
                    }
                }
            }
            Value::Phi { incoming } => {
                for &value in incoming {
                    self.resolve(value, path, depth + 1, findings);
                }
            }
            Value::Global(global) => {
                // Any store to the global anywhere in the module may
                // define the number.
                for function in &self.module.functions {
                    for block in &function.blocks {
                        for instr in &block.instrs {
                            if let Instr::Store { addr, value } = instr {
                                if matches!(self.module.value(*addr), Value::Global(g) if g == global)
                                {
                                    self.resolve(*value, path, depth + 1, findings);
                                }
                            }
                        }
                    }
                }
            }
            Value::Unary(operand) | Value::Convert(operand) => {
                self.resolve(*operand, path, depth + 1, findings);
            }
            Value::FieldAddr {
                base,
                field,
                function,
                block,
            } => {
                // The most recent store in the containing block to a
                // field address aliasing the same base and field wins.
                let mut latest = None;
                for instr in &self.module.function(*function).blocks[*block].instrs {
                    if let Instr::Store { addr, value } = instr {
                        if let Value::FieldAddr {
                            base: b, field: f, ..
                        } = self.module.value(*addr)
                        {
                            if b == base && f == field {
                                latest = Some(*value);
                            }
                        }
                    }
                }
                match latest {
                    Some(value) => self.resolve(value, path, depth + 1, findings),
                    None => trace!(value = value.0, "field address without a defining store"),
                }
            }
            Value::CallResult { callee } => {
                // The number flows out of the callee's returns.
                for block in &self.module.function(*callee).blocks {
                    for instr in &block.instrs {
                        if let Instr::Return { values } = instr {
                            for &value in values {
                                self.resolve(value, path, depth + 1, findings);
                            }
                        }
                    }
                }
            }
            Value::Opaque => {
                trace!(value = value.0, "unresolvable value shape");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleBuilder;

    const API: &str = "syscall.RawSyscall6";

    fn numbers(findings: &[SyscallFinding]) -> Vec<i64> {
        let mut numbers: Vec<i64> = findings.iter().map(|f| f.number).collect();
        numbers.sort_unstable();
        numbers
    }

    #[test]
    fn test_constant_argument() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let num = b.constant(5000);
        b.call_site(main, 0, raw, vec![num], "main.go", 10);
        let module = b.finish();

        let resolver = SyscallResolver::new(&module);
        let findings = resolver.findings();
        assert_eq!(numbers(&findings), vec![5000]);
        assert_eq!(findings[0].path.len(), 1);
    }

    #[test]
    fn test_parameter_hop() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let helper = b.function("helper", 1);
        let raw = b.function(API, 7);
        let num = b.constant(4222);
        let param = b.param(helper, 0);
        b.call_site(main, 0, helper, vec![num], "main.go", 4);
        b.call_site(helper, 0, raw, vec![param], "helper.go", 9);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![4222]);
    }

    #[test]
    fn test_phi_yields_every_incoming() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let read = b.constant(5000);
        let write = b.constant(5001);
        let joined = b.phi(vec![read, write]);
        b.call_site(main, 0, raw, vec![joined], "main.go", 21);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![5000, 5001]);
    }

    #[test]
    fn test_global_resolved_through_stores() {
        let mut b = ModuleBuilder::new();
        let init = b.function("init", 0);
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let global = b.global("trapNumber");
        let addr = b.global_ref(global);
        let num = b.constant(4090);
        b.store(init, 0, addr, num);
        let loaded = b.unary(addr);
        b.call_site(main, 0, raw, vec![loaded], "main.go", 33);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![4090]);
    }

    #[test]
    fn test_return_chain() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let pick = b.function("pickNumber", 0);
        let raw = b.function(API, 7);
        let num = b.constant(5555);
        b.ret(pick, 0, vec![num]);
        let result = b.call_result(pick);
        b.call_site(main, 0, raw, vec![result], "main.go", 7);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![5555]);
    }

    #[test]
    fn test_field_addr_takes_latest_store() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let base = b.opaque();
        let first = b.constant(1);
        let second = b.constant(2);
        let slot_a = b.field_addr(base, 0, main, 0);
        let slot_b = b.field_addr(base, 0, main, 0);
        b.store(main, 0, slot_a, first);
        b.store(main, 0, slot_b, second);
        let arg = b.field_addr(base, 0, main, 0);
        b.call_site(main, 0, raw, vec![arg], "main.go", 40);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![2]);
    }

    #[test]
    fn test_convert_unwraps() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let num = b.constant(64);
        let converted = b.convert(num);
        b.call_site(main, 0, raw, vec![converted], "main.go", 2);
        let module = b.finish();

        assert_eq!(numbers(&SyscallResolver::new(&module).findings()), vec![64]);
    }

    #[test]
    fn test_opaque_drops_silently() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let raw = b.function(API, 7);
        let arg = b.opaque();
        b.call_site(main, 0, raw, vec![arg], "main.go", 2);
        let module = b.finish();

        assert!(SyscallResolver::new(&module).findings().is_empty());
    }

    #[test]
    fn test_recursive_call_graph_terminates() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let a = b.function("a", 0);
        let bfn = b.function("b", 0);
        let raw = b.function(API, 7);
        let num = b.constant(3);
        b.call_site(main, 0, a, vec![], "main.go", 1);
        b.call_site(a, 0, bfn, vec![], "a.go", 1);
        b.call_site(bfn, 0, a, vec![], "b.go", 1);
        b.call_site(bfn, 0, raw, vec![num], "b.go", 2);
        let module = b.finish();

        let findings = SyscallResolver::new(&module).findings();
        assert_eq!(numbers(&findings), vec![3]);
    }

    #[test]
    fn test_find_path() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let helper = b.function("helper", 0);
        let raw = b.function(API, 7);
        b.call_site(main, 0, helper, vec![], "main.go", 5);
        b.call_site(helper, 0, raw, vec![], "helper.go", 6);
        let module = b.finish();

        let resolver = SyscallResolver::new(&module);
        let path = resolver.find_path(API).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(resolver.graph().edge(path[0]).caller, main);
        assert!(resolver.find_path("unreached").is_none());
    }
}
