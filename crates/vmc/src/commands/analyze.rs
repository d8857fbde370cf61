//! `vmc analyze` implementation.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use console::Term;
use tracing::info;

use vmc::analyzer::{AsmSyscallAnalyzer, HlirSyscallAnalyzer, OpcodeAnalyzer};
use vmc::renderer::{JsonRenderer, Renderer, TextRenderer};
use vmc::{disasm, Analyzer, Error, Issue, Result, VmProfile};

use crate::cli::{AnalysisTypeArg, FormatArg, EXIT_FAILURE, EXIT_SUCCESS};

#[allow(clippy::too_many_arguments)]
pub fn cmd_analyze(
    input: &Path,
    vm_profile: &Path,
    analysis_type: Option<AnalysisTypeArg>,
    disassembly_output: Option<&Path>,
    format: FormatArg,
    report_output: Option<&Path>,
    with_trace: bool,
) -> i32 {
    match run_analyze(
        input,
        vm_profile,
        analysis_type,
        disassembly_output,
        format,
        report_output,
        with_trace,
    ) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            EXIT_FAILURE
        }
    }
}

fn run_analyze(
    input: &Path,
    vm_profile: &Path,
    analysis_type: Option<AnalysisTypeArg>,
    disassembly_output: Option<&Path>,
    format: FormatArg,
    report_output: Option<&Path>,
    with_trace: bool,
) -> Result<()> {
    let profile = VmProfile::load(vm_profile)?;
    let issues = collect_issues(
        input,
        &profile,
        analysis_type,
        disassembly_output,
        with_trace,
    )?;

    let hyperlinks = report_output.is_none() && Term::stdout().is_term();
    let renderer = make_renderer(&profile, format, hyperlinks);
    info!(
        count = issues.len(),
        format = renderer.format(),
        "analysis finished"
    );

    match report_output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            renderer.render(&issues, &mut out)
        }
        None => renderer.render(&issues, &mut io::stdout().lock()),
    }
}

fn collect_issues(
    input: &Path,
    profile: &VmProfile,
    analysis_type: Option<AnalysisTypeArg>,
    disassembly_output: Option<&Path>,
    with_trace: bool,
) -> Result<Vec<Issue>> {
    // An HLIR module ships as JSON; everything else goes through the
    // disassembly pipeline.
    if input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        if matches!(analysis_type, Some(AnalysisTypeArg::Opcode)) {
            return Err(Error::Disasm(
                "opcode analysis requires a binary or disassembly listing".to_string(),
            ));
        }
        return HlirSyscallAnalyzer::new(profile).analyze(input, with_trace);
    }

    let listing = disasm::ensure_disassembly(input, disassembly_output)?;
    match analysis_type {
        Some(AnalysisTypeArg::Opcode) => OpcodeAnalyzer::new(profile).analyze(&listing, with_trace),
        Some(AnalysisTypeArg::Syscall) => {
            AsmSyscallAnalyzer::new(profile).analyze(&listing, with_trace)
        }
        None => {
            let mut issues = OpcodeAnalyzer::new(profile).analyze(&listing, with_trace)?;
            issues.extend(AsmSyscallAnalyzer::new(profile).analyze(&listing, with_trace)?);
            Ok(issues)
        }
    }
}

fn make_renderer<'p>(
    profile: &'p VmProfile,
    format: FormatArg,
    hyperlinks: bool,
) -> Box<dyn Renderer + 'p> {
    match format {
        FormatArg::Text => Box::new(TextRenderer::new(profile).with_hyperlinks(hyperlinks)),
        FormatArg::Json => Box::new(JsonRenderer),
    }
}
