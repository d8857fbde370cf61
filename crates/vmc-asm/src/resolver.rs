//! Backward recovery of the `$v0` value at a `syscall` instruction.
//!
//! The walk maintains a single tracked location, a (register, sp-offset)
//! pair, and scans instructions in reverse. Stores and loads through
//! `$sp` swap the target between register and stack slot; an immediate
//! add from `$zero` is a definition and yields a syscall number. When a
//! segment is exhausted the walk continues in every caller, entering at
//! each jump site that targets the child segment.
//!
//! Cannot trace dynamically computed numbers; those walks end at a
//! parentless segment and contribute nothing.

use std::collections::HashSet;

use vmc_isa::{Instruction, Operands, REG_SP, REG_V0, REG_ZERO};

use crate::graph::{CallGraph, Segment};
use crate::{AsmError, Result};

/// A resolved syscall number and the instruction that defined it.
#[derive(Clone, Debug)]
pub struct SyscallSite {
    /// Value in `$v0` when the `syscall` executes.
    pub number: i64,
    /// Address of the segment containing the defining instruction.
    pub segment_address: u64,
    /// Label of that segment.
    pub segment_label: String,
    /// The defining instruction (an immediate add from `$zero`).
    pub instruction: Instruction,
}

/// Cursor sentinels mirroring the two boundary steps of the walk: -1
/// means the local scan is exhausted, -2 means we just stepped into a
/// caller and still have to locate its jump sites.
const EXHAUSTED: isize = -1;
const ENTER_CALLER: isize = -2;

pub(crate) fn resolve_syscalls(
    graph: &CallGraph,
    segment: &Segment,
    instruction: &Instruction,
) -> Result<Vec<SyscallSite>> {
    let index = segment
        .instructions
        .iter()
        .position(|i| i.address == instruction.address)
        .unwrap_or(0);

    let mut seen = HashSet::new();
    let mut sites = Vec::new();
    resolve(
        graph,
        REG_V0,
        0,
        index as isize - 1,
        segment,
        None,
        &mut seen,
        &mut sites,
    )?;
    Ok(sites)
}

#[allow(clippy::too_many_arguments)]
fn resolve(
    graph: &CallGraph,
    mut reg: u8,
    mut off: i64,
    idx: isize,
    segment: &Segment,
    child: Option<&Segment>,
    seen: &mut HashSet<u64>,
    sites: &mut Vec<SyscallSite>,
) -> Result<()> {
    if idx == ENTER_CALLER {
        // Entered a caller; resume at every jump that targets the child.
        // A caller already visited as an exhausted boundary is skipped.
        if seen.contains(&segment.address) {
            return Ok(());
        }
        let child = child.expect("caller entry requires a child segment");
        for (i, instruction) in segment.instructions.iter().enumerate() {
            if instruction.is_jump() && instruction.jump_target() == Some(child.address) {
                resolve(graph, reg, off, i as isize, segment, Some(child), seen, sites)?;
            }
        }
        return Ok(());
    }

    if idx == EXHAUSTED {
        seen.insert(segment.address);
        let parents = graph.parents_of(segment);
        // No callers: the value is assigned at runtime, nothing to report.
        for parent in parents {
            resolve(graph, reg, off, ENTER_CALLER, parent, Some(segment), seen, sites)?;
        }
        return Ok(());
    }

    let instruction = &segment.instructions[idx as usize];
    match instruction.operands {
        Operands::R { rd, .. } => {
            if rd == reg {
                return Err(AsmError::UnhandledRTypeWrite {
                    address: instruction.address,
                });
            }
        }
        Operands::I { rs, rt, imm } => {
            if rs == reg || rt == reg {
                match instruction.opcode {
                    // Loads: rt <- mem[rs + imm].
                    0x23 | 0x24 | 0x27 | 0x37 => {
                        if reg == rt {
                            if rt == REG_SP && off == imm {
                                reg = rs;
                            }
                            if rs == REG_SP {
                                off = imm;
                                reg = rs;
                            }
                        }
                    }
                    // Stores: mem[rs + imm] <- rt.
                    0x2B | 0x3F | 0x28 => {
                        if reg == rs {
                            if rs == REG_SP && off == imm {
                                reg = rt;
                            }
                            if rt == REG_SP {
                                off = imm;
                                reg = rt;
                            }
                        }
                        return resolve(graph, reg, off, idx - 1, segment, child, seen, sites);
                    }
                    // Immediate adds.
                    0x08 | 0x09 | 0x18 | 0x19 => {
                        if reg == rt {
                            if rs == REG_SP {
                                // Frame shift, e.g. `daddi sp,sp,-88`.
                                return resolve(
                                    graph,
                                    reg,
                                    off + imm,
                                    idx - 1,
                                    segment,
                                    child,
                                    seen,
                                    sites,
                                );
                            }
                            if rs == REG_ZERO {
                                // Direct assignment: the immediate is the number.
                                sites.push(SyscallSite {
                                    number: imm,
                                    segment_address: segment.address,
                                    segment_label: segment.label.clone(),
                                    instruction: instruction.clone(),
                                });
                                return Ok(());
                            }
                            return Err(AsmError::UnhandledIReg {
                                address: instruction.address,
                            });
                        }
                    }
                    _ => {
                        return Err(AsmError::UnhandledOpcode {
                            address: instruction.address,
                        });
                    }
                }
            }
        }
        // Direct jumps carry no register effect here; delay slots are
        // scanned like any other instruction.
        Operands::J { .. } => {}
    }

    resolve(graph, reg, off, idx - 1, segment, child, seen, sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_reader;

    fn first_syscall(graph: &CallGraph) -> Vec<SyscallSite> {
        for segment in graph.segments() {
            for instruction in &segment.instructions {
                if instruction.is_syscall() {
                    return graph.resolve_syscalls(segment, instruction).unwrap();
                }
            }
        }
        Vec::new()
    }

    #[test]
    fn test_direct_immediate() {
        let text = "\
0000000000011000 <runtime.read>:
   11000:\t64 02 13 88 \tdaddiu\tv0,zero,5000
   11004:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let sites = first_syscall(&graph);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].number, 5000);
        assert_eq!(sites[0].segment_label, "runtime.read");
        assert_eq!(sites[0].instruction.address, 0x11000);
    }

    #[test]
    fn test_indirect_through_stack_and_callers() {
        // main stores 2 into its frame, RawSyscall6 shuffles the slot into
        // its own frame, Syscall6 loads it into v0.
        let text = "\
0000000000011000 <main>:
   937e8:\t64 01 00 02 \tdaddiu\tat,zero,2
   937ec:\tff a1 00 08 \tsd\tat,8(sp)
   937f0:\t64 01 00 01 \tdaddiu\tat,zero,1
   937f4:\tff a1 00 10 \tsd\tat,16(sp)
   937f8:\tff a1 00 18 \tsd\tat,24(sp)
   937fc:\tff a1 00 20 \tsd\tat,32(sp)
   93800:\tff a1 00 28 \tsd\tat,40(sp)
   93804:\tff a1 00 30 \tsd\tat,48(sp)
   93808:\tff a1 00 38 \tsd\tat,56(sp)
   9380c:\t0c 00 48 e6 \tjal\t12398 <syscall.RawSyscall6>
0000000000012398 <syscall.RawSyscall6>:
   12398:\tff bf ff a8 \tsd\tra,-88(sp)
   1239c:\t63 bd ff a8 \tdaddi\tsp,sp,-88
   123a0:\tff bf 00 00 \tsd\tra,0(sp)
   123a4:\tdf a1 00 60 \tld\tat,96(sp)
   123a8:\tff a1 00 08 \tsd\tat,8(sp)
   123ac:\tdf a1 00 68 \tld\tat,104(sp)
   123b0:\tff a1 00 10 \tsd\tat,16(sp)
   123b4:\tdf a1 00 70 \tld\tat,112(sp)
   123b8:\tff a1 00 18 \tsd\tat,24(sp)
   123bc:\tdf a1 00 78 \tld\tat,120(sp)
   123c0:\tff a1 00 20 \tsd\tat,32(sp)
   123c4:\tdf a1 00 80 \tld\tat,128(sp)
   123c8:\tff a1 00 28 \tsd\tat,40(sp)
   123cc:\tdf a1 00 88 \tld\tat,136(sp)
   123d0:\tff a1 00 30 \tsd\tat,48(sp)
   123d4:\tdf a1 00 90 \tld\tat,144(sp)
   123d8:\tff a1 00 38 \tsd\tat,56(sp)
   123dc:\t0c 00 49 04 \tjal\t12410 <runtime/internal/syscall.Syscall6>
0000000000012410 <runtime/internal/syscall.Syscall6>:
   12410:\tdf a2 00 08 \tld\tv0,8(sp)
   12414:\tdf a4 00 10 \tld\ta0,16(sp)
   12418:\tdf a5 00 18 \tld\ta1,24(sp)
   1241c:\tdf a6 00 20 \tld\ta2,32(sp)
   12420:\tdf a7 00 28 \tld\ta3,40(sp)
   12424:\tdf a8 00 30 \tld\ta4,48(sp)
   12428:\tdf a9 00 38 \tld\ta5,56(sp)
   1242c:\t00 00 18 25 \tmove\tv1,zero
   12430:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let sites = first_syscall(&graph);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].number, 2);
        assert_eq!(sites[0].segment_label, "main");
    }

    #[test]
    fn test_r_form_write_to_tracked_register_fails() {
        // sltu at,at,sp writes rd=at while at is being tracked after the
        // store swap; tracking v0 directly hits the same contract.
        let text = "\
0000000000011000 <main.main>:
   11000:\t00 3d 10 2b \tsltu\tv0,at,sp
   11004:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let segment = graph.find_by_label("main.main").unwrap();
        let syscall = &segment.instructions[1];
        match graph.resolve_syscalls(segment, syscall) {
            Err(AsmError::UnhandledRTypeWrite { address: 0x11000 }) => {}
            other => panic!("expected UnhandledRTypeWrite, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolvable_returns_empty() {
        // No definition of v0 anywhere and no parents: runtime-dependent.
        let text = "\
0000000000011000 <runtime.helper>:
   11000:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let sites = first_syscall(&graph);
        assert!(sites.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        // a and b call each other; neither defines v0. The walk must
        // terminate with no findings.
        let text = "\
0000000000011000 <a>:
   11000:\t0c 00 44 10 \tjal\t11040 <b>
0000000000011040 <b>:
   11040:\t0c 00 44 00 \tjal\t11000 <a>
   11044:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let sites = first_syscall(&graph);
        assert!(sites.is_empty());
    }

    #[test]
    fn test_two_parents_yield_two_numbers() {
        let text = "\
0000000000011000 <runtime.open>:
   11000:\t64 02 13 88 \tdaddiu\tv0,zero,5000
   11004:\t0c 00 48 00 \tjal\t12000 <runtime.raw>
0000000000011100 <runtime.close>:
   11100:\t64 02 13 89 \tdaddiu\tv0,zero,5001
   11104:\t0c 00 48 00 \tjal\t12000 <runtime.raw>
0000000000012000 <runtime.raw>:
   12000:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let segment = graph.find_by_label("runtime.raw").unwrap();
        let syscall = &segment.instructions[0];
        let mut numbers: Vec<i64> = graph
            .resolve_syscalls(segment, syscall)
            .unwrap()
            .into_iter()
            .map(|s| s.number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![5000, 5001]);
    }
}
