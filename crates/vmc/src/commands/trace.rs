//! `vmc trace` implementation.

use std::path::Path;

use console::Term;

use vmc::analyzer::{AsmSyscallAnalyzer, HlirSyscallAnalyzer};
use vmc::renderer::format_frame;
use vmc::{disasm, Analyzer, CallStack, Result, VmProfile};

use crate::cli::{SourceTypeArg, EXIT_FAILURE, EXIT_SUCCESS};

pub fn cmd_trace(
    input: &Path,
    vm_profile: &Path,
    function: &str,
    source_type: SourceTypeArg,
) -> i32 {
    match run_trace(input, vm_profile, function, source_type) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            EXIT_FAILURE
        }
    }
}

fn run_trace(
    input: &Path,
    vm_profile: &Path,
    function: &str,
    source_type: SourceTypeArg,
) -> Result<()> {
    let profile = VmProfile::load(vm_profile)?;

    let chain = match source_type {
        SourceTypeArg::Go => HlirSyscallAnalyzer::new(&profile).trace_stack(input, function)?,
        SourceTypeArg::Assembly => {
            let listing = disasm::ensure_disassembly(input, None)?;
            AsmSyscallAnalyzer::new(&profile).trace_stack(&listing, function)?
        }
    };

    print_call_stack(&chain);
    Ok(())
}

fn print_call_stack(chain: &CallStack) {
    let hyperlinks = Term::stdout().is_term();
    for frame in chain.frames() {
        println!("-> {}", format_frame(frame, hyperlinks));
    }
}
