//! Call graph over disassembly segments.
//!
//! Segments reference their parents by address only; the graph resolves
//! those addresses on lookup. This keeps the structure cycle-free even
//! though the underlying call relation is not.

use std::collections::{HashMap, HashSet};

use vmc_isa::Instruction;

use crate::resolver::{self, SyscallSite};
use crate::Result;

/// A labelled block of instructions starting at a fixed address.
#[derive(Clone, Debug)]
pub struct Segment {
    /// Start address (key within the graph).
    pub address: u64,
    /// Symbol label from the segment header; empty for placeholders
    /// created from forward jump references.
    pub label: String,
    /// 1-based line of the segment header in the listing.
    pub line: usize,
    /// Instructions in listing order.
    pub instructions: Vec<Instruction>,
    parents: HashSet<u64>,
}

impl Segment {
    /// Create an empty segment.
    pub fn new(address: u64, label: String, line: usize) -> Self {
        Self {
            address,
            label,
            line,
            instructions: Vec::new(),
            parents: HashSet::new(),
        }
    }

    /// Addresses of segments that jump into this one.
    pub fn parent_addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.parents.iter().copied()
    }

    /// Start address as lowercase hex.
    pub fn address_hex(&self) -> String {
        format!("{:#x}", self.address)
    }
}

/// Mapping from segment address to segment, with inbound-edge indexing.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    segments: HashMap<u64, Segment>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate all segments. Order is unspecified.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Look up a segment by start address.
    pub fn get(&self, address: u64) -> Option<&Segment> {
        self.segments.get(&address)
    }

    /// Find a segment by its label.
    pub fn find_by_label(&self, label: &str) -> Option<&Segment> {
        self.segments.values().find(|seg| seg.label == label)
    }

    /// Segments that jump into `segment`.
    pub fn parents_of(&self, segment: &Segment) -> Vec<&Segment> {
        segment
            .parents
            .iter()
            .filter_map(|addr| self.segments.get(addr))
            .collect()
    }

    /// Number of segments in the graph.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Insert a segment parsed from a header line. Parent edges recorded
    /// for the address before the header was seen are preserved.
    pub(crate) fn add_segment(&mut self, mut segment: Segment) {
        if let Some(existing) = self.segments.get(&segment.address) {
            segment.parents = existing.parents.clone();
        }
        self.segments.insert(segment.address, segment);
    }

    /// Record a jump edge from `parent` into `target`, creating a
    /// placeholder segment for forward references.
    pub(crate) fn add_parent(&mut self, target: u64, parent: u64) {
        self.segments
            .entry(target)
            .or_insert_with(|| Segment::new(target, String::new(), 0))
            .parents
            .insert(parent);
    }

    /// Append an instruction to the segment at `address`.
    pub(crate) fn push_instruction(&mut self, address: u64, instruction: Instruction) {
        if let Some(segment) = self.segments.get_mut(&address) {
            segment.instructions.push(instruction);
        }
    }

    /// Possible syscall numbers in `$v0` when control reaches the given
    /// `syscall` instruction. Empty when the number is runtime-dependent.
    pub fn resolve_syscalls(
        &self,
        segment: &Segment,
        instruction: &Instruction,
    ) -> Result<Vec<SyscallSite>> {
        resolver::resolve_syscalls(self, segment, instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_parents_survive_header() {
        let mut graph = CallGraph::new();
        graph.add_parent(0x2000, 0x1000);
        graph.add_segment(Segment::new(0x2000, "callee".into(), 10));

        let seg = graph.get(0x2000).unwrap();
        assert_eq!(seg.label, "callee");
        assert_eq!(seg.parent_addresses().collect::<Vec<_>>(), vec![0x1000]);
    }

    #[test]
    fn test_duplicate_parent_edges_dedup() {
        let mut graph = CallGraph::new();
        graph.add_parent(0x2000, 0x1000);
        graph.add_parent(0x2000, 0x1000);
        assert_eq!(graph.get(0x2000).unwrap().parent_addresses().count(), 1);
    }
}
