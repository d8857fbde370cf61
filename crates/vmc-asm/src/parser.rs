//! objdump-style disassembly parser.
//!
//! Two line shapes matter; everything else (banners, blank lines,
//! relocation notes) is skipped:
//!
//! ```text
//! 0000000000011000 <runtime.read>:
//!    11004:  64 02 13 88   daddiu  v0,zero,5000
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use vmc_isa::{decode, Instruction};

use crate::graph::{CallGraph, Segment};
use crate::{AsmError, Result};

static HEADER_PATTERN: OnceLock<Regex> = OnceLock::new();
static INSTR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn header_pattern() -> &'static Regex {
    HEADER_PATTERN.get_or_init(|| Regex::new(r"^([0-9a-fA-F]+)\s+<([^>]+)>:$").unwrap())
}

fn instr_pattern() -> &'static Regex {
    INSTR_PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9a-fA-F]+):\s+((?:[0-9a-fA-F]{2}\s*){4})\s*([a-z][a-z0-9.]*)\s*(.*)$")
            .unwrap()
    })
}

/// One recognised line of a listing.
enum Line {
    Header { address: u64, label: String },
    Instr(Instruction),
}

/// Parse a disassembly file into a call graph.
pub fn parse_file(path: impl AsRef<Path>) -> Result<CallGraph> {
    let file = File::open(path.as_ref())?;
    parse_reader(BufReader::new(file))
}

/// Parse disassembly text from any buffered reader.
pub fn parse_reader(reader: impl BufRead) -> Result<CallGraph> {
    let mut graph = CallGraph::new();
    let mut current: Option<u64> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;

        match parse_line(line.trim(), number)? {
            None => {}
            Some(Line::Header { address, label }) => {
                graph.add_segment(Segment::new(address, label, number));
                current = Some(address);
            }
            Some(Line::Instr(instruction)) => {
                let Some(segment) = current else {
                    return Err(AsmError::OrphanInstruction { line: number });
                };
                if instruction.is_jump() {
                    if let Some(target) = instruction.jump_target() {
                        graph.add_parent(target, segment);
                    }
                }
                graph.push_instruction(segment, instruction);
            }
        }
    }

    Ok(graph)
}

/// Classify a single line. Unrecognised lines yield `None`.
fn parse_line(line: &str, number: usize) -> Result<Option<Line>> {
    if let Some(captures) = header_pattern().captures(line) {
        let text = &captures[1];
        let address = u64::from_str_radix(text, 16).map_err(|_| AsmError::InvalidAddress {
            line: number,
            text: text.to_string(),
        })?;
        return Ok(Some(Line::Header {
            address,
            label: captures[2].to_string(),
        }));
    }

    if let Some(captures) = instr_pattern().captures(line) {
        let addr_text = &captures[1];
        let address =
            u64::from_str_radix(addr_text, 16).map_err(|_| AsmError::InvalidAddress {
                line: number,
                text: addr_text.to_string(),
            })?;

        let word_text: String = captures[2].split_whitespace().collect();
        let word = u32::from_str_radix(&word_text, 16).map_err(|_| AsmError::InvalidWord {
            line: number,
            text: word_text.clone(),
        })?;

        let mnemonic = captures[3].to_string();
        return Ok(Some(Line::Instr(Instruction::new(
            decode(word),
            address,
            mnemonic,
            number,
        ))));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vmc_isa::InstructionForm;

    const SAMPLE: &str = "\
/sample: file format elf64-tradbigmips

Disassembly of section .text:

0000000000011000 <internal/abi.Kind.String>:
   11000:\tdf c1 00 10 \tld\tat,16(s8)
   11004:\t00 3d 08 2b \tsltu\tat,at,sp
   11008:\t00 00 00 0c \tsyscall
   1100c:\t0c 02 36 76 \tjal\t8d9d8 <runtime.read>
   11010:\t00 00 00 00 \tnop
000000000008d9d8 <runtime.read>:
   8d9d8:\t8f a4 00 08 \tlw\ta0,8(sp)
   8d9dc:\tdf a5 00 10 \tld\ta1,16(sp)
   8d9e0:\t8f a6 00 18 \tlw\ta2,24(sp)
   8d9e4:\t64 02 13 88 \tdaddiu\tv0,zero,5000
   8d9e8:\t00 00 00 0c \tsyscall
   8d9ec:\t10 e0 00 02 \tbeqz\ta3,8d9f8 <runtime.read+0x20>
   8d9f0:\t00 00 00 0f \tsync
";

    #[test]
    fn test_parse_segments_and_instructions() {
        let graph = parse_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(graph.len(), 2);

        let seg1 = graph.get(0x11000).unwrap();
        assert_eq!(seg1.label, "internal/abi.Kind.String");
        assert_eq!(seg1.instructions.len(), 5);
        assert_eq!(seg1.line, 5);

        let ld = &seg1.instructions[0];
        assert_eq!(ld.address, 0x11000);
        assert_eq!(ld.opcode_hex(), "0x37");
        assert_eq!(ld.form(), InstructionForm::I);
        assert_eq!(ld.mnemonic, "ld");
        assert_eq!(ld.line, 6);

        let sltu = &seg1.instructions[1];
        assert_eq!(sltu.opcode_hex(), "0x0");
        assert_eq!(sltu.funct_hex(), "0x2b");
        assert_eq!(sltu.form(), InstructionForm::R);

        let syscall = &seg1.instructions[2];
        assert!(syscall.is_syscall());
        assert_eq!(syscall.funct_hex(), "0xc");

        let jal = &seg1.instructions[3];
        assert!(jal.is_jump());
        assert_eq!(jal.jump_target(), Some(0x8D9D8));

        let seg2 = graph.get(0x8D9D8).unwrap();
        assert_eq!(seg2.label, "runtime.read");
        assert_eq!(seg2.instructions.len(), 7);
        assert_eq!(seg2.instructions[3].mnemonic, "daddiu");
        assert_eq!(seg2.instructions[3].opcode_hex(), "0x19");
    }

    #[test]
    fn test_parent_consistency() {
        let graph = parse_reader(SAMPLE.as_bytes()).unwrap();
        for segment in graph.segments() {
            for instruction in &segment.instructions {
                if let Some(target) = instruction.jump_target() {
                    let callee = graph.get(target).expect("jump target must exist");
                    assert!(callee.parent_addresses().any(|a| a == segment.address));
                }
            }
        }
    }

    #[test]
    fn test_orphan_instruction_rejected() {
        let text = "   11000:\tdf c1 00 10 \tld\tat,16(s8)\n";
        match parse_reader(text.as_bytes()) {
            Err(AsmError::OrphanInstruction { line: 1 }) => {}
            other => panic!("expected OrphanInstruction, got {other:?}"),
        }
    }

    #[test]
    fn test_forward_reference_placeholder_filled() {
        let text = "\
0000000000011000 <main.main>:
   11000:\t0c 02 36 76 \tjal\t8d9d8 <runtime.read>
000000000008d9d8 <runtime.read>:
   8d9d8:\t00 00 00 0c \tsyscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        let callee = graph.get(0x8D9D8).unwrap();
        assert_eq!(callee.label, "runtime.read");
        assert_eq!(callee.parent_addresses().collect::<Vec<_>>(), vec![0x11000]);
    }

    #[test]
    fn test_unspaced_instruction_words_accepted() {
        let text = "\
0000000000011000 <main.main>:
   11000: 0000000c  syscall
";
        let graph = parse_reader(text.as_bytes()).unwrap();
        assert!(graph.get(0x11000).unwrap().instructions[0].is_syscall());
    }

    #[test]
    fn test_parse_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let graph = parse_file(file.path()).unwrap();
        assert_eq!(graph.len(), 2);
    }
}
