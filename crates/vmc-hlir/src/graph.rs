//! Call graph derived from a module's call sites.

use crate::module::{FuncId, Instr, Module, SourcePos, ValueId};

/// Index of an edge within a call graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub usize);

/// A call edge: caller, callee and the call site's arguments/position.
#[derive(Clone, Debug)]
pub struct CallEdge {
    pub caller: FuncId,
    pub callee: FuncId,
    pub args: Vec<ValueId>,
    pub pos: SourcePos,
}

/// Nodes are the module's functions; edges its call sites.
#[derive(Clone, Debug)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl CallGraph {
    /// Build the graph by scanning every block of every function.
    pub fn build(module: &Module) -> Self {
        let count = module.functions.len();
        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); count];
        let mut incoming = vec![Vec::new(); count];

        for (caller, function) in module.functions.iter().enumerate() {
            for block in &function.blocks {
                for instr in &block.instrs {
                    if let Instr::Call { callee, args, pos } = instr {
                        let id = EdgeId(edges.len());
                        edges.push(CallEdge {
                            caller: FuncId(caller),
                            callee: *callee,
                            args: args.clone(),
                            pos: pos.clone(),
                        });
                        outgoing[caller].push(id);
                        incoming[callee.0].push(id);
                    }
                }
            }
        }

        Self {
            edges,
            outgoing,
            incoming,
        }
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> &CallEdge {
        &self.edges[id.0]
    }

    /// Edges leaving `function`.
    pub fn outgoing(&self, function: FuncId) -> &[EdgeId] {
        &self.outgoing[function.0]
    }

    /// Edges entering `function`.
    pub fn incoming(&self, function: FuncId) -> &[EdgeId] {
        &self.incoming[function.0]
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleBuilder;

    #[test]
    fn test_build_indexes_both_directions() {
        let mut b = ModuleBuilder::new();
        let main = b.function("main", 0);
        let helper = b.function("helper", 1);
        let raw = b.function("syscall.RawSyscall6", 7);
        let num = b.constant(5000);
        b.call_site(main, 0, helper, vec![num], "main.go", 3);
        b.call_site(helper, 0, raw, vec![num], "helper.go", 9);
        let module = b.finish();

        let graph = CallGraph::build(&module);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.outgoing(main).len(), 1);
        assert_eq!(graph.incoming(raw).len(), 1);

        let edge = graph.edge(graph.incoming(raw)[0]);
        assert_eq!(edge.caller, helper);
        assert_eq!(edge.pos.line, 9);
    }
}
